use std::sync::Arc;

use tracing::debug;

use crate::application::VectorIndex;
use crate::domain::{CollectionCatalog, CollectionSummary, DomainError};

/// Lists the collections present in the index with per-collection counts.
pub struct ListCollectionsUseCase {
    index: Arc<dyn VectorIndex>,
}

impl ListCollectionsUseCase {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }

    pub async fn execute(&self) -> Result<Vec<CollectionSummary>, DomainError> {
        let snapshot = self.index.snapshot().await?;
        let corpus = CollectionCatalog::summarize(snapshot.iter().map(|c| c.as_ref()));

        debug!(
            "{} collections over {} stored chunks",
            corpus.collections.len(),
            snapshot.len()
        );
        Ok(corpus.collections)
    }
}
