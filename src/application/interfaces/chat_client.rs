use async_trait::async_trait;

use crate::domain::{Completion, DomainError};

/// An interface for sending chat-style prompts to an LLM and receiving text responses.
///
/// Implementors encapsulate transport, serialization, and vendor-specific API
/// details.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a `system` context message followed by a `user` prompt and return
    /// the assistant's response text with token usage.
    async fn complete(&self, system: &str, user: &str) -> Result<Completion, DomainError>;

    fn model_name(&self) -> &str;
}
