use std::collections::{BTreeMap, HashSet};

use crate::domain::{Chunk, CollectionSummary, CorpusSummary};

#[derive(Default)]
struct Tally<'a> {
    documents: HashSet<&'a str>,
    pages: HashSet<(&'a str, u32)>,
    chunks: usize,
}

/// Groups stored chunks by their effective collection.
///
/// A page is one `(document_id, page_number)` pair, so a page split into several
/// chunks counts once. Chunks without a collection land in the default one.
pub struct CollectionCatalog;

impl CollectionCatalog {
    pub fn summarize<'a, I>(chunks: I) -> CorpusSummary
    where
        I: IntoIterator<Item = &'a Chunk>,
    {
        let mut by_collection: BTreeMap<&str, Tally> = BTreeMap::new();
        let mut documents = HashSet::new();
        let mut pages = HashSet::new();

        for chunk in chunks {
            let page = (chunk.document_id(), chunk.page_number());
            documents.insert(chunk.document_id());
            pages.insert(page);

            let tally = by_collection
                .entry(chunk.effective_collection())
                .or_default();
            tally.documents.insert(chunk.document_id());
            tally.pages.insert(page);
            tally.chunks += 1;
        }

        CorpusSummary {
            total_documents: documents.len(),
            total_pages: pages.len(),
            collections: by_collection
                .into_iter()
                .map(|(name, tally)| CollectionSummary {
                    name: name.to_string(),
                    document_count: tally.documents.len(),
                    page_count: tally.pages.len(),
                    chunk_count: tally.chunks,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_COLLECTION;

    fn chunk(id: &str, document_id: &str, page: u32, collection: Option<&str>) -> Chunk {
        let chunk = Chunk::new(id, document_id, "text", page, vec![1.0]);
        match collection {
            Some(c) => chunk.with_collection(c),
            None => chunk,
        }
    }

    #[test]
    fn counts_distinct_documents_and_pages_per_collection() {
        let chunks = vec![
            chunk("a1", "A", 1, Some("medieval")),
            chunk("a2", "A", 1, Some("medieval")),
            chunk("a3", "A", 2, Some("medieval")),
            chunk("b1", "B", 1, Some("medieval")),
            chunk("c1", "C", 7, Some("notarial")),
            chunk("d1", "D", 1, None),
        ];

        let summary = CollectionCatalog::summarize(&chunks);
        assert_eq!(summary.total_documents, 4);
        assert_eq!(summary.total_pages, 5);

        let names: Vec<&str> = summary.collections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![DEFAULT_COLLECTION, "medieval", "notarial"]);

        let medieval = &summary.collections[1];
        assert_eq!(medieval.document_count, 2);
        assert_eq!(medieval.page_count, 3);
        assert_eq!(medieval.chunk_count, 4);
    }

    #[test]
    fn empty_corpus_has_no_collections() {
        let summary = CollectionCatalog::summarize(&Vec::<Chunk>::new());
        assert_eq!(summary, CorpusSummary::default());
    }
}
