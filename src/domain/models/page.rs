use serde::{Deserialize, Serialize};

/// Text extracted from one page of a digitised document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
    /// Extraction confidence in [0,1], when the extractor reports one.
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl PageText {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Document-level metadata attached to every chunk of the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_id: String,
    pub title: Option<String>,
    pub collection: Option<String>,
}

impl DocumentMetadata {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            title: None,
            collection: None,
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
}

/// Summary of one document ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: String,
    pub pages_processed: usize,
    pub chunks_created: usize,
    pub avg_ocr_confidence: Option<f32>,
    pub low_confidence_pages: usize,
    pub total_tokens: u64,
}
