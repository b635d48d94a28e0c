use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::{validate_search_args, ChunkStore, RetryPolicy, VectorIndex};
use crate::domain::{
    Chunk, DomainError, MetadataFilter, ScopeFilter, SearchOutcome, SearchResult,
};

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
pub const DEFAULT_COLLECTION_NAME: &str = "chunks";
const UPSERT_BATCH_SIZE: usize = 256;
/// Extra hits asked of Qdrant so dropped, unjoinable hits do not shorten results.
const SEARCH_OVERFETCH: usize = 10;

/// Connection settings for [`QdrantVectorIndex`].
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
    pub search_timeout: Duration,
    pub upsert_timeout: Duration,
}

impl QdrantConfig {
    pub fn new(url: impl Into<String>, collection: impl Into<String>, dimensions: usize) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key: None,
            dimensions,
            search_timeout: Duration::from_secs(30),
            upsert_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeouts(mut self, search: Duration, upsert: Duration) -> Self {
        self.search_timeout = search;
        self.upsert_timeout = upsert;
        self
    }
}

/// Filter keys stored next to each vector. Everything else lives in the chunk store.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PointPayload {
    chunk_id: String,
    document_id: String,
    collection: String,
}

#[derive(Serialize)]
struct PointStruct<'a> {
    id: String,
    vector: &'a [f32],
    payload: PointPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<Value>,
}

impl ScoredPoint {
    fn chunk_id(&self) -> Option<&str> {
        self.payload.as_ref()?.get("chunk_id")?.as_str()
    }
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct CountResult {
    count: u64,
}

/// Remote approximate index backed by a Qdrant collection over its REST API.
///
/// Qdrant only holds vectors and filter keys. Full chunk records are written to the
/// metadata [`ChunkStore`] first and joined back onto every search hit; hits that
/// cannot be joined are dropped and reported as `unresolved_hits`.
pub struct QdrantVectorIndex {
    client: reqwest::Client,
    config: QdrantConfig,
    store: Arc<dyn ChunkStore>,
    retry: RetryPolicy,
    collection_ready: Mutex<bool>,
}

impl QdrantVectorIndex {
    pub fn new(config: QdrantConfig, store: Arc<dyn ChunkStore>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            config,
            store,
            retry: RetryPolicy::default(),
            collection_ready: Mutex::new(false),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &QdrantConfig {
        &self.config
    }

    /// Stable remote id for a chunk, so that re-upserting the same chunk overwrites.
    pub fn point_id(chunk_id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
    }

    /// Translates a scope into a Qdrant filter clause. `None` means unscoped.
    pub fn build_filter(scope: &ScopeFilter) -> Option<Value> {
        let mut must = Vec::new();
        if let Some(collection) = scope.collection() {
            must.push(json!({ "key": "collection", "match": { "value": collection } }));
        }
        if let Some(ids) = scope.document_ids() {
            must.push(json!({ "key": "document_id", "match": { "any": ids } }));
        }
        if must.is_empty() {
            None
        } else {
            Some(json!({ "must": must }))
        }
    }

    /// Joins raw hits onto stored chunks.
    ///
    /// Hits are expected in descending score order. Duplicates, hits with no chunk
    /// record, and records that no longer satisfy the scope are dropped; the last two
    /// are counted as unresolved.
    pub(crate) fn join_hits(
        hits: Vec<ScoredPoint>,
        records: Vec<Arc<Chunk>>,
        scope: &ScopeFilter,
        top_k: usize,
    ) -> SearchOutcome {
        let by_id: HashMap<&str, &Arc<Chunk>> =
            records.iter().map(|c| (c.chunk_id(), c)).collect();
        let mut seen = HashSet::new();
        let mut unresolved = 0usize;
        let mut results = Vec::with_capacity(hits.len().min(top_k));

        for hit in &hits {
            let Some(chunk_id) = hit.chunk_id() else {
                unresolved += 1;
                continue;
            };
            if !seen.insert(chunk_id) {
                continue;
            }
            match by_id.get(chunk_id) {
                Some(chunk) if MetadataFilter::matches(chunk, scope) => {
                    results.push(SearchResult::new(chunk.as_ref().clone(), hit.score));
                }
                _ => unresolved += 1,
            }
        }

        // Qdrant's order among equal scores is unspecified; chunk id keeps it stable.
        results.sort_by(|a, b| {
            b.score()
                .total_cmp(&a.score())
                .then_with(|| a.chunk().chunk_id().cmp(b.chunk().chunk_id()))
        });
        results.truncate(top_k);

        SearchOutcome::new(results).with_unresolved_hits(unresolved)
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.config.url, self.config.collection)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    /// Sends a request and decodes the `result` field of the response.
    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        builder: reqwest::RequestBuilder,
        timeout: Duration,
        what: &str,
    ) -> Result<T, DomainError> {
        let response = builder.timeout(timeout).send().await.map_err(|e| {
            DomainError::backend_unavailable(format!("Qdrant {} failed: {}", what, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Qdrant {} returned {}: {}", what, status, body);
            return if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
            {
                Err(DomainError::backend_unavailable(message))
            } else {
                Err(DomainError::storage(message))
            };
        }

        let parsed: QdrantResponse<T> = response.json().await.map_err(|e| {
            DomainError::storage(format!("Failed to parse Qdrant {} response: {}", what, e))
        })?;
        Ok(parsed.result)
    }

    /// Creates the collection on first use if it does not exist yet.
    async fn ensure_collection(&self) -> Result<(), DomainError> {
        let mut ready = self.collection_ready.lock().await;
        if *ready {
            return Ok(());
        }

        let probe = self
            .request(reqwest::Method::GET, self.collection_url())
            .timeout(self.config.search_timeout)
            .send()
            .await
            .map_err(|e| {
                DomainError::backend_unavailable(format!("Qdrant collection probe failed: {}", e))
            })?;

        if probe.status() == reqwest::StatusCode::NOT_FOUND {
            info!(
                "Creating Qdrant collection {} ({} dimensions)",
                self.config.collection, self.config.dimensions
            );
            let body = json!({
                "vectors": { "size": self.config.dimensions, "distance": "Cosine" }
            });
            let _: Value = self
                .send(
                    self.request(reqwest::Method::PUT, self.collection_url())
                        .json(&body),
                    self.config.upsert_timeout,
                    "create collection",
                )
                .await?;
        } else if !probe.status().is_success() {
            return Err(DomainError::backend_unavailable(format!(
                "Qdrant collection probe returned {}",
                probe.status()
            )));
        }

        *ready = true;
        Ok(())
    }

    async fn upsert_points(&self, chunks: &[Chunk]) -> Result<(), DomainError> {
        let points: Vec<PointStruct<'_>> = chunks
            .iter()
            .map(|chunk| PointStruct {
                id: Self::point_id(chunk.chunk_id()),
                vector: chunk.embedding(),
                payload: PointPayload {
                    chunk_id: chunk.chunk_id().to_string(),
                    document_id: chunk.document_id().to_string(),
                    collection: chunk.effective_collection().to_string(),
                },
            })
            .collect();
        let body = json!({ "points": points });
        let url = format!("{}/points?wait=true", self.collection_url());

        let _: Value = self
            .send(
                self.request(reqwest::Method::PUT, url).json(&body),
                self.config.upsert_timeout,
                "upsert",
            )
            .await?;
        Ok(())
    }

    async fn search_points(&self, body: &Value) -> Result<Vec<ScoredPoint>, DomainError> {
        let url = format!("{}/points/search", self.collection_url());
        self.send(
            self.request(reqwest::Method::POST, url).json(body),
            self.config.search_timeout,
            "search",
        )
        .await
    }

    async fn delete_points(&self, body: &Value) -> Result<(), DomainError> {
        let url = format!("{}/points/delete?wait=true", self.collection_url());
        let _: Value = self
            .send(
                self.request(reqwest::Method::POST, url).json(body),
                self.config.upsert_timeout,
                "delete",
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn upsert(&self, chunks: &[Chunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }
        for chunk in chunks {
            chunk.validate()?;
            if chunk.dimensions() != self.config.dimensions {
                return Err(DomainError::validation("embedding", chunk.chunk_id()));
            }
        }

        self.retry
            .run("Qdrant collection setup", || self.ensure_collection())
            .await?;

        // Metadata first so that every stored vector can be joined.
        self.store.upsert(chunks).await?;

        for batch in chunks.chunks(UPSERT_BATCH_SIZE) {
            self.retry
                .run("Qdrant upsert", || self.upsert_points(batch))
                .await?;
        }

        debug!(
            "Upserted {} points into Qdrant collection {}",
            chunks.len(),
            self.config.collection
        );
        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        scope: &ScopeFilter,
    ) -> Result<SearchOutcome, DomainError> {
        validate_search_args(query_vector, top_k)?;
        if query_vector.len() != self.config.dimensions {
            // Every stored vector would be skipped as incomparable.
            warn!(
                "Query vector has {} dimensions, collection {} holds {}",
                query_vector.len(),
                self.config.collection,
                self.config.dimensions
            );
            return Ok(SearchOutcome::empty());
        }

        self.retry
            .run("Qdrant collection setup", || self.ensure_collection())
            .await?;

        let mut body = json!({
            "vector": query_vector,
            "limit": top_k.saturating_add(SEARCH_OVERFETCH),
            "with_payload": true,
        });
        if let Some(filter) = Self::build_filter(scope) {
            body["filter"] = filter;
        }

        let hits = self
            .retry
            .run("Qdrant search", || self.search_points(&body))
            .await?;

        let ids: Vec<String> = hits
            .iter()
            .filter_map(|hit| hit.chunk_id().map(String::from))
            .collect();
        let records = self.store.get_many(&ids).await?;
        let outcome = Self::join_hits(hits, records, scope, top_k);

        if outcome.unresolved_hits() > 0 {
            warn!(
                "Dropped {} Qdrant hits with no stored chunk record",
                outcome.unresolved_hits()
            );
        }
        debug!(
            "Qdrant search under scope [{}] returned {} results",
            scope.summary(),
            outcome.len()
        );
        Ok(outcome)
    }

    async fn delete(&self, chunk_ids: &[String]) -> Result<(), DomainError> {
        if chunk_ids.is_empty() {
            return Ok(());
        }

        self.retry
            .run("Qdrant collection setup", || self.ensure_collection())
            .await?;

        let points: Vec<String> = chunk_ids.iter().map(|id| Self::point_id(id)).collect();
        let body = json!({ "points": points });

        // Vectors first, so a failure never leaves a vector without its record.
        self.retry
            .run("Qdrant delete", || self.delete_points(&body))
            .await?;
        self.store.delete(chunk_ids).await
    }

    async fn count(&self) -> Result<u64, DomainError> {
        self.retry
            .run("Qdrant collection setup", || self.ensure_collection())
            .await?;

        let url = format!("{}/points/count", self.collection_url());
        let body = json!({ "exact": true });
        let result: CountResult = self
            .retry
            .run("Qdrant count", || {
                self.send(
                    self.request(reqwest::Method::POST, url.clone()).json(&body),
                    self.config.search_timeout,
                    "count",
                )
            })
            .await?;
        Ok(result.count)
    }

    /// Chunk records come from the metadata store; Qdrant holds vectors only.
    async fn snapshot(&self) -> Result<Vec<Arc<Chunk>>, DomainError> {
        self.store.get_all().await
    }

    fn backend_name(&self) -> &str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(chunk_id: &str, score: f32) -> ScoredPoint {
        ScoredPoint {
            score,
            payload: Some(json!({ "chunk_id": chunk_id })),
        }
    }

    fn record(id: &str, collection: &str) -> Arc<Chunk> {
        Arc::new(Chunk::new(id, "A", format!("text {id}"), 1, vec![1.0, 0.0]).with_collection(collection))
    }

    #[test]
    fn point_ids_are_stable_uuids() {
        let a = QdrantVectorIndex::point_id("chunk-1");
        assert_eq!(a, QdrantVectorIndex::point_id("chunk-1"));
        assert_ne!(a, QdrantVectorIndex::point_id("chunk-2"));
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn unscoped_search_has_no_filter() {
        assert!(QdrantVectorIndex::build_filter(&ScopeFilter::default()).is_none());
        let blank = ScopeFilter::new()
            .with_collection("  ")
            .with_document_ids(Vec::<String>::new());
        assert!(QdrantVectorIndex::build_filter(&blank).is_none());
    }

    #[test]
    fn scoped_filter_matches_collection_and_documents() {
        let scope = ScopeFilter::new()
            .with_collection("medieval")
            .with_document_ids(vec!["A".to_string(), "B".to_string()]);
        let filter = QdrantVectorIndex::build_filter(&scope).unwrap();
        assert_eq!(
            filter,
            json!({ "must": [
                { "key": "collection", "match": { "value": "medieval" } },
                { "key": "document_id", "match": { "any": ["A", "B"] } }
            ]})
        );
    }

    #[test]
    fn unjoined_hits_are_dropped_not_placeholdered() {
        let hits = vec![hit("c1", 0.9), hit("ghost", 0.8), hit("c2", 0.7)];
        let records = vec![record("c2", "medieval"), record("c1", "medieval")];

        let outcome = QdrantVectorIndex::join_hits(hits, records, &ScopeFilter::default(), 10);
        let ids: Vec<&str> = outcome.results().iter().map(|r| r.chunk().chunk_id()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(outcome.unresolved_hits(), 1);
    }

    #[test]
    fn join_drops_records_outside_scope_and_duplicates() {
        let hits = vec![hit("c1", 0.9), hit("c1", 0.9), hit("c2", 0.5)];
        let records = vec![record("c1", "medieval"), record("c2", "notarial")];
        let scope = ScopeFilter::new().with_collection("medieval");

        let outcome = QdrantVectorIndex::join_hits(hits, records, &scope, 10);
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.results()[0].chunk().chunk_id(), "c1");
        assert_eq!(outcome.unresolved_hits(), 1);
    }

    #[test]
    fn equal_scores_are_ordered_by_chunk_id() {
        let hits = vec![hit("c3", 0.5), hit("c1", 0.5), hit("c2", 0.9), hit("c0", 0.5)];
        let records = vec![
            record("c0", "medieval"),
            record("c1", "medieval"),
            record("c2", "medieval"),
            record("c3", "medieval"),
        ];

        let outcome = QdrantVectorIndex::join_hits(hits, records, &ScopeFilter::default(), 3);
        let ids: Vec<&str> = outcome.results().iter().map(|r| r.chunk().chunk_id()).collect();
        assert_eq!(ids, vec!["c2", "c0", "c1"]);
    }

    #[test]
    fn hits_without_payload_count_as_unresolved() {
        let hits = vec![ScoredPoint {
            score: 0.4,
            payload: None,
        }];
        let outcome = QdrantVectorIndex::join_hits(hits, vec![], &ScopeFilter::default(), 5);
        assert!(outcome.is_empty());
        assert_eq!(outcome.unresolved_hits(), 1);
    }
}
