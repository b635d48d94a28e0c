use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig};

const MOCK_MODEL_NAME: &str = "mock-embedding";
const MOCK_DIMENSIONS: usize = 384;
const MOCK_BATCH_SIZE: usize = 100;

/// Offline embedding service for tests and `--mock-embeddings`.
///
/// Vectors are unit length and seeded from a SHA-256 of the text, so the same text
/// embeds identically across runs and toolchains, and a query equal to a chunk's
/// text scores 1.0 against it.
pub struct MockEmbedding {
    config: EmbeddingConfig,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(MOCK_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            config: EmbeddingConfig::new(MOCK_MODEL_NAME, dimensions, MOCK_BATCH_SIZE),
        }
    }

    fn seed_for(text: &str) -> u64 {
        let digest = Sha256::digest(text.as_bytes());
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(seed)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(Self::seed_for(text));
        let raw: Vec<f32> = (0..self.config.dimensions())
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect();

        let norm = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            return raw;
        }
        raw.into_iter().map(|x| x / norm).collect()
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size()) {
            vectors.extend(batch.iter().map(|text| self.vector_for(text)));
        }

        debug!(
            "Mock-embedded {} texts ({} dims)",
            vectors.len(),
            self.config.dimensions()
        );
        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        Ok(self.vector_for(query))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}
