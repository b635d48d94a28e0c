use serde::{Deserialize, Serialize};

/// What one collection holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub name: String,
    pub document_count: usize,
    pub page_count: usize,
    pub chunk_count: usize,
}

/// Distinct documents, pages and collections across every stored chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub total_documents: usize,
    pub total_pages: usize,
    /// Ordered by collection name.
    pub collections: Vec<CollectionSummary>,
}
