use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed upsert input. The whole batch is rejected.
    #[error("Validation error: missing or invalid field '{field}' in chunk '{chunk_id}'")]
    Validation { field: String, chunk_id: String },

    /// Query and candidate embeddings disagree on length.
    #[error("Dimension mismatch for chunk '{chunk_id}': expected {expected}, got {actual}")]
    DimensionMismatch {
        chunk_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, chunk_id: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            chunk_id: chunk_id.into(),
        }
    }

    pub fn dimension_mismatch(chunk_id: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            chunk_id: chunk_id.into(),
            expected,
            actual,
        }
    }

    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }

    /// Errors worth another attempt under a [`crate::application::RetryPolicy`].
    ///
    /// Provider-side embedding failures are transient more often than not
    /// (throttling, timeouts), so they are retried alongside backend outages.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::EmbeddingError(_))
    }
}
