use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::application::{DocumentChunker, EmbeddingService, VectorIndex};
use crate::domain::{
    chunks_from_payloads, ChunkPayload, DocumentMetadata, DomainError, IngestReport, PageText,
};

/// Pages below this extraction confidence are reported as low quality.
pub const DEFAULT_MIN_OCR_CONFIDENCE: f32 = 0.85;

pub struct IngestDocumentUseCase {
    chunker: Arc<dyn DocumentChunker>,
    embedding_service: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    min_ocr_confidence: f32,
    show_progress: bool,
}

impl IngestDocumentUseCase {
    pub fn new(
        chunker: Arc<dyn DocumentChunker>,
        embedding_service: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            chunker,
            embedding_service,
            index,
            min_ocr_confidence: DEFAULT_MIN_OCR_CONFIDENCE,
            show_progress: false,
        }
    }

    pub fn with_min_ocr_confidence(mut self, threshold: f32) -> Self {
        self.min_ocr_confidence = threshold;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar
    }

    /// Chunks, embeds and indexes one document's pages.
    ///
    /// Re-ingesting the same pages replaces the earlier chunks, since chunk ids are
    /// derived from the document id, page and token offset.
    pub async fn execute(
        &self,
        pages: &[PageText],
        metadata: &DocumentMetadata,
    ) -> Result<IngestReport, DomainError> {
        if metadata.document_id.trim().is_empty() {
            return Err(DomainError::invalid_input("document_id must not be empty"));
        }

        info!(
            "Ingesting document {} ({} pages)",
            metadata.document_id,
            pages.len()
        );
        let start_time = Instant::now();

        let confidences: Vec<f32> = pages.iter().filter_map(|p| p.confidence).collect();
        let avg_ocr_confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        };
        let mut low_confidence_pages = 0usize;
        for page in pages {
            if let Some(c) = page.confidence.filter(|c| *c < self.min_ocr_confidence) {
                warn!(
                    "Page {} of {} has low OCR confidence ({:.2})",
                    page.page_number, metadata.document_id, c
                );
                low_confidence_pages += 1;
            }
        }

        let mut chunks = self.chunker.chunk_document(pages, metadata)?;
        let total_tokens: u64 = chunks
            .iter()
            .filter_map(|c| c.token_count())
            .map(u64::from)
            .sum();

        if chunks.is_empty() {
            warn!("Document {} produced no chunks", metadata.document_id);
        } else {
            let batch_size = self.embedding_service.config().batch_size();
            let progress_bar = self.progress_bar(chunks.len() as u64);
            progress_bar.set_message(metadata.document_id.clone());

            let mut embeddings = Vec::with_capacity(chunks.len());
            for batch in chunks.chunks(batch_size) {
                let texts: Vec<String> =
                    batch.iter().map(|c| c.chunk_text().to_string()).collect();
                let vectors = self.embedding_service.embed_texts(&texts).await?;
                if vectors.len() != texts.len() {
                    return Err(DomainError::embedding(format!(
                        "expected {} embeddings, got {}",
                        texts.len(),
                        vectors.len()
                    )));
                }
                embeddings.extend(vectors);
                progress_bar.inc(batch.len() as u64);
            }
            progress_bar.finish_and_clear();

            chunks = chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| chunk.with_embedding(embedding))
                .collect();

            self.index.upsert(&chunks).await?;
        }

        let report = IngestReport {
            document_id: metadata.document_id.clone(),
            pages_processed: pages.len(),
            chunks_created: chunks.len(),
            avg_ocr_confidence,
            low_confidence_pages,
            total_tokens,
        };

        info!(
            "Ingested {}: {} chunks from {} pages in {:?}",
            report.document_id,
            report.chunks_created,
            report.pages_processed,
            start_time.elapsed()
        );
        Ok(report)
    }

    /// Indexes chunks that arrive already embedded.
    ///
    /// The whole batch is validated before anything is written; `document_id`
    /// fills in for chunks that do not name their own document.
    pub async fn ingest_embedded(
        &self,
        document_id: &str,
        payloads: Vec<ChunkPayload>,
    ) -> Result<usize, DomainError> {
        let chunks = chunks_from_payloads(payloads, Some(document_id))?;
        self.index.upsert(&chunks).await?;

        debug!(
            "Indexed {} pre-embedded chunks for {}",
            chunks.len(),
            document_id
        );
        Ok(chunks.len())
    }
}
