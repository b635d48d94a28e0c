use std::sync::Arc;

use tracing::info;

use crate::application::VectorIndex;
use crate::domain::DomainError;

/// Use case for removing chunks from the index by id.
pub struct DeleteChunksUseCase {
    index: Arc<dyn VectorIndex>,
}

impl DeleteChunksUseCase {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }

    /// Returns how many chunks the index lost. Absent ids are not an error.
    pub async fn execute(&self, chunk_ids: &[String]) -> Result<u64, DomainError> {
        let before = self.index.count().await?;
        self.index.delete(chunk_ids).await?;
        let removed = before.saturating_sub(self.index.count().await?);

        info!(
            "Deleted {} chunks ({} ids requested)",
            removed,
            chunk_ids.len()
        );
        Ok(removed)
    }
}
