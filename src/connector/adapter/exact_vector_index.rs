use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{validate_search_args, ChunkStore, VectorIndex};
use crate::domain::{
    Chunk, DomainError, MetadataFilter, ScopeFilter, SearchOutcome, SearchResult,
    SimilarityRanker,
};
use crate::connector::adapter::InMemoryChunkStore;

/// Exact linear-scan index over a [`ChunkStore`].
///
/// Search takes a point-in-time snapshot of the store, narrows it by scope and
/// ranks the survivors by cosine similarity. The embedding dimensionality is
/// either configured up front or fixed by the first stored chunk. Upserts are
/// serialised on the dimensions lock.
pub struct ExactVectorIndex {
    store: Arc<dyn ChunkStore>,
    dimensions: Mutex<Option<usize>>,
    name: String,
}

impl ExactVectorIndex {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self {
            store,
            dimensions: Mutex::new(None),
            name: "exact".to_string(),
        }
    }

    /// The in-memory reference backend.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryChunkStore::new())).with_name("memory")
    }

    pub fn with_dimensions(self, dimensions: usize) -> Self {
        Self {
            dimensions: Mutex::new(Some(dimensions)),
            ..self
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn store(&self) -> Arc<dyn ChunkStore> {
        Arc::clone(&self.store)
    }
}

#[async_trait]
impl VectorIndex for ExactVectorIndex {
    async fn upsert(&self, chunks: &[Chunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }

        for chunk in chunks {
            chunk.validate()?;
        }

        // Held through the write: the length check and the commit are one step.
        let mut dimensions = self.dimensions.lock().await;
        if dimensions.is_none() {
            if let Some(first) = self.store.get_all().await?.first() {
                *dimensions = Some(first.dimensions());
            }
        }

        let expected = dimensions.unwrap_or_else(|| chunks[0].dimensions());
        if let Some(bad) = chunks.iter().find(|c| c.dimensions() != expected) {
            debug!(
                "Rejecting batch: chunk {} has {} dimensions, index has {}",
                bad.chunk_id(),
                bad.dimensions(),
                expected
            );
            return Err(DomainError::validation("embedding", bad.chunk_id()));
        }

        self.store.upsert(chunks).await?;
        *dimensions = Some(expected);
        drop(dimensions);

        debug!("Upserted {} chunks into {} index", chunks.len(), self.name);
        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        scope: &ScopeFilter,
    ) -> Result<SearchOutcome, DomainError> {
        validate_search_args(query_vector, top_k)?;

        let snapshot = self.store.get_all().await?;
        let total = snapshot.len();
        let candidates = snapshot
            .into_iter()
            .filter(|chunk| MetadataFilter::matches(chunk, scope));

        let ranking = SimilarityRanker::rank(query_vector, candidates, top_k);

        debug!(
            "Ranked {} stored chunks under scope [{}]: {} hits, {} skipped",
            total,
            scope.summary(),
            ranking.hits.len(),
            ranking.skipped
        );

        let results = ranking
            .hits
            .into_iter()
            .map(|hit| SearchResult::new(hit.candidate.as_ref().clone(), hit.score))
            .collect();

        Ok(SearchOutcome::new(results).with_skipped_candidates(ranking.skipped))
    }

    async fn delete(&self, chunk_ids: &[String]) -> Result<(), DomainError> {
        self.store.delete(chunk_ids).await
    }

    async fn count(&self) -> Result<u64, DomainError> {
        self.store.count().await
    }

    async fn snapshot(&self) -> Result<Vec<Arc<Chunk>>, DomainError> {
        self.store.get_all().await
    }

    fn backend_name(&self) -> &str {
        &self.name
    }
}
