use serde::{Deserialize, Serialize};

/// Query-time constraints narrowing the candidate chunks of one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection: Option<String>,
    #[serde(
        default,
        alias = "book_ids",
        skip_serializing_if = "Option::is_none"
    )]
    document_ids: Option<Vec<String>>,
}

impl ScopeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_document_ids(mut self, ids: Vec<String>) -> Self {
        self.document_ids = Some(ids);
        self
    }

    /// The collection constraint, if it is usable. Blank values count as absent.
    pub fn collection(&self) -> Option<&str> {
        self.collection
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }

    /// The document allow-list, if it is usable. An empty list counts as absent.
    pub fn document_ids(&self) -> Option<&[String]> {
        self.document_ids.as_deref().filter(|ids| !ids.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.collection().is_none() && self.document_ids().is_none()
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(collection) = self.collection() {
            parts.push(format!("collection={}", collection));
        }
        if let Some(ids) = self.document_ids() {
            parts.push(format!("documents={:?}", ids));
        }
        if parts.is_empty() {
            "unscoped".to_string()
        } else {
            parts.join(", ")
        }
    }
}
