mod answer_question;
mod delete_chunks;
mod index_stats;
mod ingest_document;
mod list_collections;
mod search_chunks;

pub use answer_question::*;
pub use delete_chunks::*;
pub use index_stats::*;
pub use ingest_document::*;
pub use list_collections::*;
pub use search_chunks::*;
