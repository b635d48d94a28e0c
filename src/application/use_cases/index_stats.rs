use std::sync::Arc;

use serde::Serialize;

use crate::application::{EmbeddingService, VectorIndex};
use crate::domain::{CollectionCatalog, DomainError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub backend: String,
    pub chunk_count: u64,
    pub total_documents: usize,
    pub total_pages: usize,
    pub total_collections: usize,
    pub embedding_model: String,
    pub dimensions: usize,
}

pub struct IndexStatsUseCase {
    index: Arc<dyn VectorIndex>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl IndexStatsUseCase {
    pub fn new(index: Arc<dyn VectorIndex>, embedding_service: Arc<dyn EmbeddingService>) -> Self {
        Self {
            index,
            embedding_service,
        }
    }

    pub async fn execute(&self) -> Result<IndexStats, DomainError> {
        let config = self.embedding_service.config();
        let snapshot = self.index.snapshot().await?;
        let corpus = CollectionCatalog::summarize(snapshot.iter().map(|c| c.as_ref()));

        Ok(IndexStats {
            backend: self.index.backend_name().to_string(),
            chunk_count: self.index.count().await?,
            total_documents: corpus.total_documents,
            total_pages: corpus.total_pages,
            total_collections: corpus.collections.len(),
            embedding_model: config.model_name().to_string(),
            dimensions: config.dimensions(),
        })
    }
}
