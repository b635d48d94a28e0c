//! # Application Layer
//!
//! Ports (traits implemented by connectors), use cases, and the retry policy
//! applied at provider boundaries.

pub mod interfaces;
pub mod retry;
pub mod use_cases;

pub use interfaces::*;
pub use retry::*;
pub use use_cases::*;
