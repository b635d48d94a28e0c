use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Chunk, DomainError};

/// Keyed storage of chunk records.
///
/// Implementations apply a batch atomically: either every chunk of an `upsert` is
/// visible afterwards or none is.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Inserts or replaces chunks by `chunk_id`. A replaced chunk keeps its original
    /// insertion position.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<(), DomainError>;

    /// Point-in-time snapshot of every stored chunk, in insertion order.
    async fn get_all(&self) -> Result<Vec<Arc<Chunk>>, DomainError>;

    /// Chunks for the given ids, in the order of `ids`. Absent ids are omitted.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Arc<Chunk>>, DomainError>;

    /// Removes chunks by id. Absent ids are ignored.
    async fn delete(&self, ids: &[String]) -> Result<(), DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}
