use anyhow::Result;
use serde_json::{json, Value};

use crate::domain::{SearchOutcome, SearchQuery};

use super::super::Container;
use super::scope_from_flags;

pub struct SearchController<'a> {
    container: &'a Container,
}

impl<'a> SearchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn search(
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

        let use_case = self.container.search_use_case();
        let outcome = use_case.execute(&search_query).await?;

        if json {
            return Ok(serde_json::to_string_pretty(&outcome_json(&outcome))?);
        }
        Ok(format_outcome(&outcome))
    }
}

pub(crate) fn outcome_json(outcome: &SearchOutcome) -> Value {
    json!({
        "results": outcome.hits(),
        "skipped_candidates": outcome.skipped_candidates(),
        "unresolved_hits": outcome.unresolved_hits(),
    })
}

pub(crate) fn format_outcome(outcome: &SearchOutcome) -> String {
    if outcome.is_empty() {
        return "No evidence found.".to_string();
    }

    let mut output = format!("Found {} results:\n\n", outcome.len());
    for (i, result) in outcome.results().iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, result.display_line()));
        output.push_str(&format!("   chunk: {}\n", result.chunk().chunk_id()));

        let preview: String = result
            .chunk()
            .chunk_text()
            .lines()
            .take(6)
            .map(|l| format!("   | {}", l))
            .collect::<Vec<_>>()
            .join("\n");
        output.push_str(&preview);
        output.push_str("\n\n");
    }

    if outcome.skipped_candidates() > 0 {
        output.push_str(&format!(
            "({} candidates skipped: embedding size mismatch)\n",
            outcome.skipped_candidates()
        ));
    }
    output
}
