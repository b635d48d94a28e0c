use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::application::DocumentChunker;
use crate::domain::{Chunk, DocumentMetadata, DomainError, PageText};

pub const DEFAULT_CHUNK_SIZE: usize = 700;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Splits text into tokens, reported as byte ranges into the input.
pub trait TextTokenizer: Send + Sync {
    fn token_spans(&self, text: &str) -> Result<Vec<(usize, usize)>, DomainError>;

    fn name(&self) -> &str;
}

/// Treats every run of non-whitespace characters as one token.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenizer;

impl TextTokenizer for WhitespaceTokenizer {
    fn token_spans(&self, text: &str) -> Result<Vec<(usize, usize)>, DomainError> {
        let mut spans = Vec::new();
        let mut start: Option<usize> = None;
        for (i, c) in text.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    spans.push((s, i));
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push((s, text.len()));
        }
        Ok(spans)
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

/// Subword tokens from a HuggingFace `tokenizer.json`.
pub struct HfTokenizer {
    tokenizer: tokenizers::Tokenizer,
}

impl HfTokenizer {
    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let tokenizer = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| DomainError::internal(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self { tokenizer })
    }
}

impl TextTokenizer for HfTokenizer {
    fn token_spans(&self, text: &str) -> Result<Vec<(usize, usize)>, DomainError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| DomainError::internal(format!("Tokenization failed: {}", e)))?;
        Ok(encoding
            .get_offsets()
            .iter()
            .copied()
            .filter(|(start, end)| end > start)
            .collect())
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

/// Fixed-size token windows with overlap, one page at a time.
///
/// A window never crosses a page boundary. Its text is the exact source slice
/// between its first and last token, trimmed.
pub struct TokenWindowChunker {
    tokenizer: Arc<dyn TextTokenizer>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TokenWindowChunker {
    pub fn new(
        tokenizer: Arc<dyn TextTokenizer>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, DomainError> {
        if chunk_size == 0 {
            return Err(DomainError::invalid_input("chunk size must be at least 1"));
        }
        if chunk_overlap >= chunk_size {
            return Err(DomainError::invalid_input(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            tokenizer,
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            tokenizer: Arc::new(WhitespaceTokenizer),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    /// Content-derived id, stable across re-ingestion of the same document.
    pub fn chunk_id(document_id: &str, page_number: u32, start_token: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(document_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(page_number.to_be_bytes());
        hasher.update((start_token as u64).to_be_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..32].to_string()
    }

    fn chunk_page(
        &self,
        page: &PageText,
        metadata: &DocumentMetadata,
    ) -> Result<Vec<Chunk>, DomainError> {
        if page.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let spans = self.tokenizer.token_spans(&page.text)?;
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < spans.len() {
            let end = (start + self.chunk_size).min(spans.len());
            let text = page.text[spans[start].0..spans[end - 1].1].trim();

            if !text.is_empty() {
                let mut chunk = Chunk::new(
                    Self::chunk_id(&metadata.document_id, page.page_number, start),
                    metadata.document_id.clone(),
                    text,
                    page.page_number,
                    Vec::new(),
                )
                .with_token_span((end - start) as u32, start as u32, end as u32);
                if let Some(title) = &metadata.title {
                    chunk = chunk.with_title(title.clone());
                }
                if let Some(collection) = &metadata.collection {
                    chunk = chunk.with_collection(collection.clone());
                }
                if let Some(confidence) = page.confidence {
                    chunk = chunk.with_ocr_confidence(confidence);
                }
                chunks.push(chunk);
            }

            if end == spans.len() {
                break;
            }
            start += step;
        }

        Ok(chunks)
    }
}

impl DocumentChunker for TokenWindowChunker {
    fn chunk_document(
        &self,
        pages: &[PageText],
        metadata: &DocumentMetadata,
    ) -> Result<Vec<Chunk>, DomainError> {
        let mut chunks = Vec::new();
        for page in pages {
            chunks.extend(self.chunk_page(page, metadata)?);
        }

        debug!(
            "Chunked {} pages of {} into {} chunks ({} tokenizer, size {}, overlap {})",
            pages.len(),
            metadata.document_id,
            chunks.len(),
            self.tokenizer.name(),
            self.chunk_size,
            self.chunk_overlap
        );
        Ok(chunks)
    }
}
