use crate::domain::{Chunk, ScopeFilter};

/// Decides whether a chunk falls inside a search scope.
///
/// Total: unusable constraints (blank collection, empty allow-list) are treated as
/// absent rather than rejected.
pub struct MetadataFilter;

impl MetadataFilter {
    pub fn matches(chunk: &Chunk, scope: &ScopeFilter) -> bool {
        if let Some(collection) = scope.collection() {
            if chunk.effective_collection() != collection {
                return false;
            }
        }

        if let Some(document_ids) = scope.document_ids() {
            if !document_ids.iter().any(|id| id == chunk.document_id()) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(document_id: &str, collection: Option<&str>) -> Chunk {
        let chunk = Chunk::new("c", document_id, "text", 1, vec![1.0]);
        match collection {
            Some(c) => chunk.with_collection(c),
            None => chunk,
        }
    }

    #[test]
    fn empty_scope_matches_everything() {
        let scope = ScopeFilter::new();
        assert!(MetadataFilter::matches(&chunk("A", None), &scope));
        assert!(MetadataFilter::matches(&chunk("B", Some("medieval")), &scope));
    }

    #[test]
    fn collection_is_exact_and_case_sensitive() {
        let scope = ScopeFilter::new().with_collection("medieval");
        assert!(MetadataFilter::matches(&chunk("A", Some("medieval")), &scope));
        assert!(!MetadataFilter::matches(&chunk("A", Some("Medieval")), &scope));
        assert!(!MetadataFilter::matches(&chunk("A", Some("medieval ")), &scope));
        assert!(!MetadataFilter::matches(&chunk("A", None), &scope));
    }

    #[test]
    fn missing_collection_defaults_to_general() {
        let scope = ScopeFilter::new().with_collection("general");
        assert!(MetadataFilter::matches(&chunk("A", None), &scope));
    }

    #[test]
    fn document_allow_list() {
        let scope = ScopeFilter::new().with_document_ids(vec!["A".into(), "C".into()]);
        assert!(MetadataFilter::matches(&chunk("A", None), &scope));
        assert!(!MetadataFilter::matches(&chunk("B", None), &scope));
    }

    #[test]
    fn constraints_combine_with_and() {
        let scope = ScopeFilter::new()
            .with_collection("notarial")
            .with_document_ids(vec!["A".into()]);
        assert!(MetadataFilter::matches(&chunk("A", Some("notarial")), &scope));
        assert!(!MetadataFilter::matches(&chunk("A", Some("medieval")), &scope));
        assert!(!MetadataFilter::matches(&chunk("B", Some("notarial")), &scope));
    }

    #[test]
    fn malformed_constraints_are_ignored() {
        let scope = ScopeFilter::new().with_collection("").with_document_ids(vec![]);
        assert!(MetadataFilter::matches(&chunk("Z", Some("parish")), &scope));
    }
}
