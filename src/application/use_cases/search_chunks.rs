use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::application::{EmbeddingService, VectorIndex};
use crate::domain::{DomainError, SearchOutcome, SearchQuery};

/// Embeds a natural-language query and runs it against the index.
pub struct SearchChunksUseCase {
    index: Arc<dyn VectorIndex>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl SearchChunksUseCase {
    pub fn new(index: Arc<dyn VectorIndex>, embedding_service: Arc<dyn EmbeddingService>) -> Self {
        Self {
            index,
            embedding_service,
        }
    }

    pub async fn execute(&self, query: &SearchQuery) -> Result<SearchOutcome, DomainError> {
        if query.query().trim().is_empty() {
            return Err(DomainError::invalid_input("query must not be empty"));
        }

        info!("Searching for: {}", query.summary());
        let start_time = Instant::now();

        let query_embedding = self.embedding_service.embed_query(query.query()).await?;
        let outcome = self
            .index
            .search(&query_embedding, query.top_k(), query.scope())
            .await?;

        if outcome.skipped_candidates() > 0 {
            warn!(
                "Skipped {} candidates whose embedding size differs from the query's",
                outcome.skipped_candidates()
            );
        }

        info!(
            "Found {} results in {:?} ({} backend)",
            outcome.len(),
            start_time.elapsed(),
            self.index.backend_name()
        );
        Ok(outcome)
    }
}
