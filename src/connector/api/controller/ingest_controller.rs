use std::path::Path;

use anyhow::{anyhow, Result};

use crate::connector::adapter::load_pages;
use crate::domain::DocumentMetadata;

use super::super::Container;

pub struct IngestController<'a> {
    container: &'a Container,
}

impl<'a> IngestController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn ingest(
        &self,
        path: String,
        document_id: Option<String>,
        title: Option<String>,
        collection: Option<String>,
    ) -> Result<String> {
        let path = Path::new(&path);
        let document_id = match document_id {
            Some(id) => id,
            None => path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .ok_or_else(|| anyhow!("Cannot derive a document id from {}", path.display()))?,
        };

        let mut metadata = DocumentMetadata::new(document_id);
        if let Some(title) = title {
            metadata = metadata.with_title(title);
        }
        if let Some(collection) = collection {
            metadata = metadata.with_collection(collection);
        }

        let pages = load_pages(path)?;
        let report = self
            .container
            .ingest_use_case()
            .execute(&pages, &metadata)
            .await?;

        let mut output = format!(
            "Ingested {}: {} chunks from {} pages ({} tokens)",
            report.document_id, report.chunks_created, report.pages_processed, report.total_tokens
        );
        if let Some(avg) = report.avg_ocr_confidence {
            output.push_str(&format!(
                "\nAverage OCR confidence: {:.1}% ({} low-confidence pages)",
                avg * 100.0,
                report.low_confidence_pages
            ));
        }
        Ok(output)
    }
}
