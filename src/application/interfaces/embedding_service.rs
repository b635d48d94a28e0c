use async_trait::async_trait;

use crate::domain::{DomainError, EmbeddingConfig};

/// Generates vector embeddings from document text and queries.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embeds texts in order. Implementations split the input into sub-batches of
    /// at most `config().batch_size()` texts.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError>;

    fn config(&self) -> &EmbeddingConfig;
}
