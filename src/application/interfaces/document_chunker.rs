use crate::domain::{Chunk, DocumentMetadata, DomainError, PageText};

/// Splits extracted page text into chunks ready to be embedded.
///
/// Returned chunks carry no embedding yet. Output order follows page order, then
/// position within the page, and the same input always yields the same chunk ids.
pub trait DocumentChunker: Send + Sync {
    fn chunk_document(
        &self,
        pages: &[PageText],
        metadata: &DocumentMetadata,
    ) -> Result<Vec<Chunk>, DomainError>;
}
