//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Chunk stores (in-memory, DuckDB) and vector indexes (exact, Qdrant)
//! - Embedding providers (OpenAI, deterministic mock)
//! - Chat providers (Anthropic Messages API, offline mock)
//! - Page loading and token-window chunking
//! - The CLI router and the HTTP API

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
