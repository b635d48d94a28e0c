use anyhow::Result;

use crate::domain::{QueryAnswer, SearchQuery};

use super::super::Container;
use super::scope_from_flags;

pub struct AskController<'a> {
    container: &'a Container,
}

impl<'a> AskController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn ask(
        &self,
        query: String,
        top_k: usize,
        collection: Option<String>,
        documents: Option<Vec<String>>,
        json: bool,
    ) -> Result<String> {
        let search_query = SearchQuery::new(query)
            .with_top_k(top_k)
            .with_scope(scope_from_flags(collection, documents));

        let answer = self.container.answer_use_case().execute(&search_query).await?;

        if json {
            return Ok(serde_json::to_string_pretty(&answer)?);
        }
        Ok(self.format_answer(&answer))
    }

    fn format_answer(&self, answer: &QueryAnswer) -> String {
        let mut output = format!("{}\n", answer.answer);
        if !answer.grounded {
            return output;
        }

        output.push_str("\nSources:\n");
        for (i, evidence) in answer.evidence.iter().enumerate() {
            output.push_str(&format!(
                "  [{}] {} — p. {} (score: {:.3}) {}\n",
                i + 1,
                evidence.title,
                evidence.page_number,
                evidence.score,
                evidence.source_url
            ));
        }

        output.push_str(&format!(
            "\n{} ms, {} tokens",
            answer.metadata.latency_ms,
            answer.metadata.tokens_used.unwrap_or(0)
        ));
        if let Some(cost) = answer.metadata.estimated_cost_usd {
            output.push_str(&format!(", ~${:.4}", cost));
        }
        output
    }
}
