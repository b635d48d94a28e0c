use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::{EmbeddingService, RetryPolicy};
use crate::domain::{DomainError, EmbeddingConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "text-embedding-3-large";
const EMBEDDINGS_PATH: &str = "/v1/embeddings";
const DEFAULT_BATCH_SIZE: usize = 100;
const INTER_BATCH_PAUSE: Duration = Duration::from_millis(100);

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct ApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Known output sizes of the OpenAI embedding models.
fn model_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => 1536,
        _ => 3072,
    }
}

/// Embedding service backed by the OpenAI embeddings endpoint.
///
/// Texts are sent in sub-batches of `batch_size` with a short pause between
/// requests. Each sub-batch is retried on throttling and transport failures.
pub struct OpenAiEmbedding {
    client: reqwest::Client,
    api_key: String,
    url: String,
    config: EmbeddingConfig,
    /// Output size asked of the provider; `None` keeps the model's native size.
    requested_dimensions: Option<usize>,
    retry: RetryPolicy,
}

impl OpenAiEmbedding {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let model: String = model.into();
        let base: String = base_url.into();
        let dimensions = model_dimensions(&model);
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            url: format!("{}{}", base.trim_end_matches('/'), EMBEDDINGS_PATH),
            config: EmbeddingConfig::new(model, dimensions, DEFAULT_BATCH_SIZE),
            requested_dimensions: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Construct from environment variables:
    ///
    /// | Variable                 | Default                  |
    /// |--------------------------|--------------------------|
    /// | `OPENAI_API_KEY`         | required                 |
    /// | `OPENAI_BASE_URL`        | `https://api.openai.com` |
    /// | `OPENAI_EMBEDDING_MODEL` | `text-embedding-3-large` |
    pub fn from_env() -> Result<Self, DomainError> {
        let key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            DomainError::embedding("OPENAI_API_KEY is not set (use --mock-embeddings to run offline)")
        })?;
        let base =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(key, model, base))
    }

    /// Asks the provider for shortened vectors of `dimensions` floats. Only the
    /// `text-embedding-3` models honour this.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.config = EmbeddingConfig::new(
            self.config.model_name().to_string(),
            dimensions,
            self.config.batch_size(),
        );
        self.requested_dimensions = Some(dimensions);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let request = ApiRequest {
            model: self.config.model_name(),
            input: batch,
            dimensions: self.requested_dimensions,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::embedding(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("OpenAI embeddings returned {status}: {body}");
            return if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
            {
                Err(DomainError::embedding(format!("OpenAI returned {status}")))
            } else {
                Err(DomainError::invalid_input(format!(
                    "OpenAI rejected the embedding request ({status}): {body}"
                )))
            };
        }

        let mut api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| DomainError::embedding(format!("Failed to parse OpenAI response: {e}")))?;

        if api_response.data.len() != batch.len() {
            return Err(DomainError::embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                api_response.data.len(),
                batch.len()
            )));
        }
        api_response.data.sort_by_key(|d| d.index);

        let expected = self.config.dimensions();
        if let Some(bad) = api_response
            .data
            .iter()
            .find(|d| d.embedding.len() != expected)
        {
            return Err(DomainError::dimension_mismatch(
                format!("input {}", bad.index),
                expected,
                bad.embedding.len(),
            ));
        }
        Ok(api_response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedding {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());
        let batches: Vec<&[String]> = texts.chunks(self.config.batch_size()).collect();

        for (i, batch) in batches.iter().enumerate() {
            let embedded = self
                .retry
                .run("OpenAI embeddings", || self.request_batch(batch))
                .await?;
            vectors.extend(embedded);

            if i + 1 < batches.len() {
                tokio::time::sleep(INTER_BATCH_PAUSE).await;
            }
        }

        debug!(
            "Embedded {} texts in {} requests with {}",
            texts.len(),
            batches.len(),
            self.config.model_name()
        );
        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        let input = [query.to_string()];
        let mut vectors = self
            .retry
            .run("OpenAI query embedding", || self.request_batch(&input))
            .await?;
        vectors
            .pop()
            .ok_or_else(|| DomainError::embedding("OpenAI returned no embedding for the query"))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}
