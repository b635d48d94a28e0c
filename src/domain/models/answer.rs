use serde::{Deserialize, Serialize};

use super::SearchResult;

/// Answer returned when retrieval finds nothing to ground a response on.
pub const NO_EVIDENCE_ANSWER: &str = "The answer does not appear in the provided documents.";

/// Rough per-token price used for the cost estimate in answer metadata.
pub const ESTIMATED_COST_PER_TOKEN_USD: f64 = 0.00001;

/// A retrieved chunk as cited in an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub chunk_id: String,
    pub document_id: String,
    pub title: String,
    pub page_number: u32,
    pub chunk_text: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
    pub source_url: String,
}

impl From<&SearchResult> for Evidence {
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
            source_url: format!(
                "/viewer/{}?page={}",
                chunk.document_id(),
                chunk.page_number()
            ),
        }
    }
}

/// Token accounting reported by a text-generation provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Text plus usage returned by a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerMetadata {
    pub latency_ms: u64,
    pub results_found: usize,
    pub skipped_candidates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub query_id: String,
    pub query: String,
    pub answer: String,
    /// False when no evidence was found and the language model was not consulted.
    pub grounded: bool,
    pub evidence: Vec<Evidence>,
    pub metadata: AnswerMetadata,
}

impl QueryAnswer {
    pub fn no_evidence(query_id: String, query: String, metadata: AnswerMetadata) -> Self {
        Self {
            query_id,
            query,
            answer: NO_EVIDENCE_ANSWER.to_string(),
            grounded: false,
            evidence: Vec::new(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Chunk;

    #[test]
    fn evidence_links_to_viewer_page() {
        let chunk = Chunk::new("c1", "doc_001", "text", 47, vec![1.0]).with_ocr_confidence(0.8);
        let evidence = Evidence::from(&SearchResult::new(chunk, 0.75));
        assert_eq!(evidence.source_url, "/viewer/doc_001?page=47");
        assert_eq!(evidence.title, "Untitled document");
        assert_eq!(evidence.ocr_confidence, Some(0.8));
    }

    #[test]
    fn usage_total() {
        let usage = TokenUsage {
            input_tokens: 120,
            output_tokens: 30,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn usage_total_saturates() {
        let usage = TokenUsage {
            input_tokens: u32::MAX,
            output_tokens: 7,
        };
        assert_eq!(usage.total(), u32::MAX);
    }
}
