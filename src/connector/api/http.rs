use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::application::IndexStats;
use crate::domain::{
    ChunkPayload, CollectionSummary, DomainError, QueryAnswer, ScopeFilter, SearchQuery,
    DEFAULT_TOP_K,
};

use super::Container;

/// Largest `top_k` a client may request.
pub const MAX_TOP_K: usize = 50;

#[derive(Clone)]
pub struct AppState {
    container: Arc<Container>,
}

impl AppState {
    pub fn new(container: Arc<Container>) -> Self {
        Self { container }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub scope: Option<ScopeFilter>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub document_id: String,
    pub chunks: Vec<ChunkPayload>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionsResponse {
    pub collections: Vec<CollectionSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub document_id: String,
    pub chunks_ingested: usize,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub chunk_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub vector_db: String,
    pub embeddings: String,
}

/// A [`DomainError`] rendered as an HTTP error with a `detail` body.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation { .. } | DomainError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            DomainError::BackendUnavailable(_) | DomainError::EmbeddingError(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/query", post(query))
        .route("/ingest", post(ingest))
        .route("/chunks/delete", post(delete_chunks))
        .route("/collections", get(collections))
        .route("/stats", get(stats))
        .with_state(state)
}

pub async fn serve(container: Arc<Container>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(AppState::new(container))).await?;
    Ok(())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        vector_db: state.container.backend_name().to_string(),
        embeddings: state.container.embedding_model().to_string(),
    })
}

pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryAnswer>, ApiError> {
    if !(1..=MAX_TOP_K).contains(&request.top_k) {
        return Err(DomainError::invalid_input(format!(
            "top_k must be between 1 and {}",
            MAX_TOP_K
        ))
        .into());
    }

    let search_query = SearchQuery::new(request.query)
        .with_top_k(request.top_k)
        .with_scope(request.scope.unwrap_or_default());
    let answer = state
        .container
        .answer_use_case()
        .execute(&search_query)
        .await?;
    Ok(Json(answer))
}

pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let count = state
        .container
        .ingest_use_case()
        .ingest_embedded(&request.document_id, request.chunks)
        .await?;

    Ok(Json(IngestResponse {
        success: true,
        document_id: request.document_id,
        chunks_ingested: count,
        message: format!("Successfully ingested {} chunks", count),
    }))
}

pub async fn delete_chunks(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state
        .container
        .delete_use_case()
        .execute(&request.chunk_ids)
        .await?;
    Ok(Json(DeleteResponse { deleted }))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<IndexStats>, ApiError> {
    Ok(Json(state.container.stats_use_case().execute().await?))
}

pub async fn collections(
    State(state): State<AppState>,
) -> Result<Json<CollectionsResponse>, ApiError> {
    let collections = state.container.collections_use_case().execute().await?;
    Ok(Json(CollectionsResponse { collections }))
}
