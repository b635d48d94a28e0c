use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Chunk, DomainError, ScopeFilter, SearchOutcome};

/// Similarity search over stored chunks.
///
/// Every implementation guarantees that a search returns at most `top_k` results,
/// never repeats a chunk id, and only returns chunks inside `scope`.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces chunks. Fails the whole batch on the first malformed chunk.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<(), DomainError>;

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        scope: &ScopeFilter,
    ) -> Result<SearchOutcome, DomainError>;

    /// Deletes chunks by id. Deleting an absent id succeeds.
    async fn delete(&self, chunk_ids: &[String]) -> Result<(), DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;

    /// Every stored chunk record, in insertion order.
    async fn snapshot(&self) -> Result<Vec<Arc<Chunk>>, DomainError>;

    /// Short backend label for logs and stats.
    fn backend_name(&self) -> &str;
}

/// Argument checks shared by every backend's `search`.
pub fn validate_search_args(query_vector: &[f32], top_k: usize) -> Result<(), DomainError> {
    if top_k == 0 {
        return Err(DomainError::invalid_input("top_k must be at least 1"));
    }
    if query_vector.is_empty() {
        return Err(DomainError::invalid_input("query vector is empty"));
    }
    if query_vector.iter().any(|v| !v.is_finite()) {
        return Err(DomainError::invalid_input(
            "query vector contains non-finite values",
        ));
    }
    Ok(())
}
