pub mod ask_controller;
pub mod collections_controller;
pub mod delete_controller;
pub mod ingest_controller;
pub mod search_controller;
pub mod stats_controller;

pub use ask_controller::AskController;
pub use collections_controller::CollectionsController;
pub use delete_controller::DeleteController;
pub use ingest_controller::IngestController;
pub use search_controller::SearchController;
pub use stats_controller::StatsController;

use crate::domain::ScopeFilter;

/// Scope from the `--collection` and `--document` flags.
pub(crate) fn scope_from_flags(
    collection: Option<String>,
    documents: Option<Vec<String>>,
) -> ScopeFilter {
    let mut scope = ScopeFilter::new();
    if let Some(collection) = collection {
        scope = scope.with_collection(collection);
    }
    if let Some(documents) = documents {
        scope = scope.with_document_ids(documents);
    }
    scope
}
