use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Collection label used when a chunk does not carry one.
pub const DEFAULT_COLLECTION: &str = "general";

/// Citation title used when a chunk's document has no title.
pub const UNTITLED_DOCUMENT: &str = "Untitled document";

/// A bounded span of document text with its embedding and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    chunk_id: String,
    document_id: String,
    embedding: Vec<f32>,
    chunk_text: String,
    page_number: u32,
    title: Option<String>,
    collection: Option<String>,
    ocr_confidence: Option<f32>,
    token_count: Option<u32>,
    start_token: Option<u32>,
    end_token: Option<u32>,
}

impl Chunk {
    pub fn new(
        chunk_id: impl Into<String>,
        document_id: impl Into<String>,
        chunk_text: impl Into<String>,
        page_number: u32,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            document_id: document_id.into(),
            embedding,
            chunk_text: chunk_text.into(),
            page_number,
            title: None,
            collection: None,
            ocr_confidence: None,
            token_count: None,
            start_token: None,
            end_token: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_ocr_confidence(mut self, confidence: f32) -> Self {
        self.ocr_confidence = Some(confidence);
        self
    }

    pub fn with_token_span(mut self, token_count: u32, start_token: u32, end_token: u32) -> Self {
        self.token_count = Some(token_count);
        self.start_token = Some(start_token);
        self.end_token = Some(end_token);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }

    pub fn chunk_text(&self) -> &str {
        &self.chunk_text
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED_DOCUMENT)
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// The collection the chunk belongs to, falling back to [`DEFAULT_COLLECTION`].
    pub fn effective_collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(DEFAULT_COLLECTION)
    }

    pub fn ocr_confidence(&self) -> Option<f32> {
        self.ocr_confidence
    }

    pub fn token_count(&self) -> Option<u32> {
        self.token_count
    }

    pub fn start_token(&self) -> Option<u32> {
        self.start_token
    }

    pub fn end_token(&self) -> Option<u32> {
        self.end_token
    }

    /// Checks the fields every stored chunk must carry.
    ///
    /// Fields are checked in wire order (`chunk_id`, `embedding`, `chunk_text`) and the
    /// first failure is reported.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.chunk_id.trim().is_empty() {
            return Err(DomainError::validation("chunk_id", "<missing>"));
        }
        if self.embedding.is_empty() {
            return Err(DomainError::validation("embedding", &self.chunk_id));
        }
        if self.embedding.iter().any(|v| !v.is_finite()) {
            return Err(DomainError::validation("embedding", &self.chunk_id));
        }
        if self.chunk_text.is_empty() {
            return Err(DomainError::validation("chunk_text", &self.chunk_id));
        }
        Ok(())
    }
}

impl AsRef<Chunk> for Chunk {
    fn as_ref(&self) -> &Chunk {
        self
    }
}

/// Wire form of a chunk as submitted by ingestion collaborators.
///
/// Every field is optional so that a missing field can be reported as a
/// validation error naming it, instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub chunk_id: Option<String>,
    pub document_id: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub chunk_text: Option<String>,
    pub page_number: Option<u32>,
    pub title: Option<String>,
    pub collection: Option<String>,
    pub ocr_confidence: Option<f32>,
    pub token_count: Option<u32>,
    pub start_token: Option<u32>,
    pub end_token: Option<u32>,
}

impl ChunkPayload {
    /// Converts the payload into a [`Chunk`].
    ///
    /// `default_document_id` fills in `document_id` when the payload omits it,
    /// which is how the ingest endpoint attaches the request-level document id.
    pub fn into_chunk(self, default_document_id: Option<&str>) -> Result<Chunk, DomainError> {
        let chunk_id = match self.chunk_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(DomainError::validation("chunk_id", "<missing>")),
        };
        let embedding = self
            .embedding
            .ok_or_else(|| DomainError::validation("embedding", &chunk_id))?;
        let chunk_text = self
            .chunk_text
            .ok_or_else(|| DomainError::validation("chunk_text", &chunk_id))?;
        let page_number = self
            .page_number
            .ok_or_else(|| DomainError::validation("page_number", &chunk_id))?;
        let document_id = self
            .document_id
            .or_else(|| default_document_id.map(String::from))
            .unwrap_or_default();

        let chunk = Chunk {
            chunk_id,
            document_id,
            embedding,
            chunk_text,
            page_number,
            title: self.title,
            collection: self.collection,
            ocr_confidence: self.ocr_confidence,
            token_count: self.token_count,
            start_token: self.start_token,
            end_token: self.end_token,
        };
        chunk.validate()?;
        Ok(chunk)
    }
}

/// Converts a whole batch, failing on the first malformed entry.
pub fn chunks_from_payloads(
    payloads: Vec<ChunkPayload>,
    default_document_id: Option<&str>,
) -> Result<Vec<Chunk>, DomainError> {
    payloads
        .into_iter()
        .map(|p| p.into_chunk(default_document_id))
        .collect()
}
