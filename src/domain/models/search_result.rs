use serde::{Deserialize, Serialize};

use super::{Chunk, ScopeFilter};

/// Default number of results for a search.
pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    chunk: Chunk,
    score: f32,
}

impl SearchResult {
    pub fn new(chunk: Chunk, score: f32) -> Self {
        Self { chunk, score }
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn into_chunk(self) -> Chunk {
        self.chunk
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn citation(&self) -> String {
        format!(
            "{} — p. {}",
            self.chunk.display_title(),
            self.chunk.page_number()
        )
    }

    pub fn display_line(&self) -> String {
        format!("{} (score: {:.3})", self.citation(), self.score)
    }
}

/// Flat, citation-ready view of a [`SearchResult`]. Leaves the embedding out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub document_id: String,
    pub title: String,
    pub page_number: u32,
    pub chunk_text: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
}

impl From<&SearchResult> for SearchHit {
    fn from(result: &SearchResult) -> Self {
        let chunk = result.chunk();
        Self {
            chunk_id: chunk.chunk_id().to_string(),
            document_id: chunk.document_id().to_string(),
            title: chunk.display_title().to_string(),
            page_number: chunk.page_number(),
            chunk_text: chunk.chunk_text().to_string(),
            score: result.score(),
            ocr_confidence: chunk.ocr_confidence(),
        }
    }
}

/// Ranked results of one vector search plus what was left out along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    results: Vec<SearchResult>,
    skipped_candidates: usize,
    unresolved_hits: usize,
}

impl SearchOutcome {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            skipped_candidates: 0,
            unresolved_hits: 0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Candidates dropped because their embedding length differed from the query's.
    pub fn with_skipped_candidates(mut self, skipped: usize) -> Self {
        self.skipped_candidates = skipped;
        self
    }

    /// Remote hits dropped because no metadata record could be joined to them.
    pub fn with_unresolved_hits(mut self, unresolved: usize) -> Self {
        self.unresolved_hits = unresolved;
        self
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<SearchResult> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// The "no evidence found" signal. Not an error.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn skipped_candidates(&self) -> usize {
        self.skipped_candidates
    }

    pub fn unresolved_hits(&self) -> usize {
        self.unresolved_hits
    }

    pub fn hits(&self) -> Vec<SearchHit> {
        self.results.iter().map(SearchHit::from).collect()
    }
}

/// A natural-language search request, before the query is embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    query: String,
    top_k: usize,
    scope: ScopeFilter,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            scope: ScopeFilter::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_scope(mut self, scope: ScopeFilter) -> Self {
        self.scope = scope;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn scope(&self) -> &ScopeFilter {
        &self.scope
    }

    pub fn summary(&self) -> String {
        format!(
            "query=\"{}\", top_k={}, scope={}",
            self.query,
            self.top_k,
            self.scope.summary()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_uses_title_fallback() {
        let chunk = Chunk::new("c1", "A", "text", 12, vec![1.0]);
        let result = SearchResult::new(chunk, 0.5);
        assert_eq!(result.citation(), "Untitled document — p. 12");

        let titled = Chunk::new("c2", "A", "text", 3, vec![1.0]).with_title("Protocol Vol. 23");
        assert_eq!(
            SearchResult::new(titled, 0.9).display_line(),
            "Protocol Vol. 23 — p. 3 (score: 0.900)"
        );
    }

    #[test]
    fn empty_outcome_is_no_evidence() {
        let outcome = SearchOutcome::empty().with_skipped_candidates(2);
        assert!(outcome.is_empty());
        assert_eq!(outcome.skipped_candidates(), 2);
    }

    #[test]
    fn query_builder() {
        let query = SearchQuery::new("who was the notary")
            .with_top_k(3)
            .with_scope(ScopeFilter::new().with_collection("notarial"));
        assert_eq!(query.top_k(), 3);
        assert_eq!(
            query.summary(),
            "query=\"who was the notary\", top_k=3, scope=collection=notarial"
        );
    }
}
