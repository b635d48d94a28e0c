use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use crate::application::{ChatClient, SearchChunksUseCase};
use crate::domain::{
    build_prompt, AnswerMetadata, DomainError, Evidence, QueryAnswer, SearchQuery,
    ESTIMATED_COST_PER_TOKEN_USD,
};

/// The retrieval pipeline: embed, retrieve, and answer from the retrieved evidence.
///
/// When retrieval finds nothing the language model is not consulted and the answer
/// is reported as ungrounded.
pub struct AnswerQuestionUseCase {
    search: Arc<SearchChunksUseCase>,
    chat_client: Arc<dyn ChatClient>,
}

impl AnswerQuestionUseCase {
    pub fn new(search: Arc<SearchChunksUseCase>, chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            search,
            chat_client,
        }
    }

    pub async fn execute(&self, query: &SearchQuery) -> Result<QueryAnswer, DomainError> {
        let query_id = Uuid::new_v4().to_string();
        let start_time = Instant::now();

        let outcome = self.search.execute(query).await?;
        if outcome.is_empty() {
            info!("No evidence found for query {}", query_id);
            let metadata = AnswerMetadata {
                latency_ms: start_time.elapsed().as_millis() as u64,
                results_found: 0,
                skipped_candidates: outcome.skipped_candidates(),
                tokens_used: None,
                estimated_cost_usd: None,
            };
            return Ok(QueryAnswer::no_evidence(
                query_id,
                query.query().to_string(),
                metadata,
            ));
        }

        let (system, user) = build_prompt(query.query(), outcome.results());
        let completion = self.chat_client.complete(system, &user).await?;
        let tokens_used = completion.usage.total();

        let evidence: Vec<Evidence> = outcome.results().iter().map(Evidence::from).collect();
        let metadata = AnswerMetadata {
            latency_ms: start_time.elapsed().as_millis() as u64,
            results_found: outcome.len(),
            skipped_candidates: outcome.skipped_candidates(),
            tokens_used: Some(tokens_used),
            estimated_cost_usd: Some(tokens_used as f64 * ESTIMATED_COST_PER_TOKEN_USD),
        };

        info!(
            "Answered query {} with {} ({} sources, {} tokens, {} ms)",
            query_id,
            self.chat_client.model_name(),
            evidence.len(),
            tokens_used,
            metadata.latency_ms
        );

        Ok(QueryAnswer {
            query_id,
            query: query.query().to_string(),
            answer: completion.text,
            grounded: true,
            evidence,
            metadata,
        })
    }
}
