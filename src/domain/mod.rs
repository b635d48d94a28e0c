//! # Domain Layer
//!
//! Chunk and search models, the error taxonomy, and the pure retrieval logic
//! (scope filtering, similarity ranking, prompt assembly).
//! This layer is independent of external frameworks and infrastructure.

pub mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
