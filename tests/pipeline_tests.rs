use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use scriptorium::connector::http::{self, AppState, DeleteRequest, IngestRequest, QueryRequest};
use scriptorium::domain::{Completion, TokenUsage, NO_EVIDENCE_ANSWER};
use scriptorium::{
    AnswerQuestionUseCase, ChatClient, ChunkPayload, Container, ContainerConfig, DocumentMetadata,
    DomainError, EmbeddingService, ExactVectorIndex, IngestDocumentUseCase, MockChatClient,
    MockEmbedding, PageText, ScopeFilter, SearchChunksUseCase, SearchQuery, TokenWindowChunker,
    VectorIndex,
};

/// Records how often the language model was consulted.
#[derive(Default)]
struct CountingChatClient {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatClient for CountingChatClient {
    async fn complete(&self, _system: &str, _user: &str) -> Result<Completion, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Completion {
            text: "Juan de Medina [Source: Protocol Vol. 23 — p. 2]".to_string(),
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 10,
            },
        })
    }

    fn model_name(&self) -> &str {
        "counting"
    }
}

struct Pipeline {
    index: Arc<ExactVectorIndex>,
    embedding: Arc<MockEmbedding>,
    ingest: IngestDocumentUseCase,
    search: Arc<SearchChunksUseCase>,
}

fn pipeline() -> Pipeline {
    let index = Arc::new(ExactVectorIndex::in_memory());
    let embedding = Arc::new(MockEmbedding::with_dimensions(64));
    let ingest = IngestDocumentUseCase::new(
        Arc::new(TokenWindowChunker::with_defaults()),
        embedding.clone(),
        index.clone(),
    );
    let search = Arc::new(SearchChunksUseCase::new(index.clone(), embedding.clone()));
    Pipeline {
        index,
        embedding,
        ingest,
        search,
    }
}

fn protocol_pages() -> Vec<PageText> {
    vec![
        PageText::new(1, "Inventory of the estate of Pedro Alvarez").with_confidence(0.95),
        PageText::new(2, "Juan de Medina, public notary of Seville").with_confidence(0.7),
        PageText::new(3, "Witnesses present at the signing of the deed").with_confidence(0.9),
    ]
}

fn protocol_metadata() -> DocumentMetadata {
    DocumentMetadata::new("protocol-23")
        .with_title("Protocol Vol. 23")
        .with_collection("notarial")
}

#[tokio::test]
async fn ingest_then_search_finds_the_matching_page() {
    let p = pipeline();
    let report = p
        .ingest
        .execute(&protocol_pages(), &protocol_metadata())
        .await
        .unwrap();

    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.chunks_created, 3);
    assert_eq!(report.low_confidence_pages, 1);
    assert!(report.total_tokens > 0);
    assert_eq!(p.index.count().await.unwrap(), 3);

    let query = SearchQuery::new("Juan de Medina, public notary of Seville").with_top_k(2);
    let outcome = p.search.execute(&query).await.unwrap();
    assert_eq!(outcome.len(), 2);

    let top = outcome.results()[0].chunk();
    assert_eq!(top.page_number(), 2);
    assert_eq!(top.display_title(), "Protocol Vol. 23");
    assert_eq!(top.ocr_confidence(), Some(0.7));
    assert!((outcome.results()[0].score() - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn reingesting_a_document_replaces_its_chunks() {
    let p = pipeline();
    p.ingest
        .execute(&protocol_pages(), &protocol_metadata())
        .await
        .unwrap();
    p.ingest
        .execute(&protocol_pages(), &protocol_metadata())
        .await
        .unwrap();

    assert_eq!(p.index.count().await.unwrap(), 3);
}

#[tokio::test]
async fn ingest_rejects_blank_document_id() {
    let p = pipeline();
    let err = p
        .ingest
        .execute(&protocol_pages(), &DocumentMetadata::new("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn no_evidence_skips_the_language_model() {
    let p = pipeline();
    p.ingest
        .execute(&protocol_pages(), &protocol_metadata())
        .await
        .unwrap();

    let chat = Arc::new(CountingChatClient::default());
    let answer_use_case = AnswerQuestionUseCase::new(p.search.clone(), chat.clone());

    let query = SearchQuery::new("who was the notary")
        .with_scope(ScopeFilter::new().with_collection("medieval"));
    let answer = answer_use_case.execute(&query).await.unwrap();

    assert!(!answer.grounded);
    assert_eq!(answer.answer, NO_EVIDENCE_ANSWER);
    assert!(answer.evidence.is_empty());
    assert_eq!(answer.metadata.tokens_used, None);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn grounded_answer_carries_evidence_and_usage() {
    let p = pipeline();
    p.ingest
        .execute(&protocol_pages(), &protocol_metadata())
        .await
        .unwrap();

    let chat = Arc::new(CountingChatClient::default());
    let answer_use_case = AnswerQuestionUseCase::new(p.search.clone(), chat.clone());

    let query = SearchQuery::new("Juan de Medina, public notary of Seville")
        .with_top_k(3)
        .with_scope(ScopeFilter::new().with_document_ids(vec!["protocol-23".to_string()]));
    let answer = answer_use_case.execute(&query).await.unwrap();

    assert!(answer.grounded);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
    assert_eq!(answer.evidence.len(), 3);
    assert_eq!(answer.evidence[0].page_number, 2);
    assert_eq!(answer.evidence[0].source_url, "/viewer/protocol-23?page=2");
    assert_eq!(answer.metadata.tokens_used, Some(110));
    assert_eq!(answer.metadata.results_found, 3);
    assert!(!answer.query_id.is_empty());
}

#[tokio::test]
async fn mock_chat_quotes_the_top_citation() {
    let p = pipeline();
    p.ingest
        .execute(&protocol_pages(), &protocol_metadata())
        .await
        .unwrap();

    let answer_use_case =
        AnswerQuestionUseCase::new(p.search.clone(), Arc::new(MockChatClient::new()));
    let query = SearchQuery::new("Witnesses present at the signing of the deed").with_top_k(1);
    let answer = answer_use_case.execute(&query).await.unwrap();

    assert!(answer.grounded);
    assert!(answer.answer.contains("Witnesses present"));
    assert!(answer.answer.contains("Protocol Vol. 23 — p. 3"));
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let p = pipeline();
    let err = p.search.execute(&SearchQuery::new("   ")).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn pre_embedded_chunks_are_validated_as_a_batch() {
    let p = pipeline();
    let vector = p.embedding.embed_query("anno domini").await.unwrap();

    let good = ChunkPayload {
        chunk_id: Some("c1".to_string()),
        embedding: Some(vector.clone()),
        chunk_text: Some("anno domini".to_string()),
        page_number: Some(1),
        ..Default::default()
    };
    let bad = ChunkPayload {
        chunk_id: Some("c2".to_string()),
        embedding: Some(vector),
        page_number: Some(2),
        ..Default::default()
    };

    let err = p
        .ingest
        .ingest_embedded("doc-A", vec![good.clone(), bad])
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(p.index.count().await.unwrap(), 0);

    let count = p.ingest.ingest_embedded("doc-A", vec![good]).await.unwrap();
    assert_eq!(count, 1);
}

fn http_state() -> AppState {
    http_state_for(pipeline())
}

fn http_state_for(p: Pipeline) -> AppState {
    let container = Container::from_parts(
        p.embedding,
        Arc::new(MockChatClient::new()),
        p.index,
        Arc::new(TokenWindowChunker::with_defaults()),
        ContainerConfig::default(),
    );
    AppState::new(Arc::new(container))
}

#[tokio::test]
async fn http_query_rejects_out_of_range_top_k() {
    let state = http_state();
    for top_k in [0, http::MAX_TOP_K + 1] {
        let request = QueryRequest {
            query: "who was the notary".to_string(),
            scope: None,
            top_k,
        };
        let err = http::query(State(state.clone()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn http_ingest_then_query() {
    let state = http_state();
    let embedding = MockEmbedding::with_dimensions(64);
    let vector = embedding.embed_query("charter of the abbey").await.unwrap();

    let response = http::ingest(
        State(state.clone()),
        Json(IngestRequest {
            document_id: "A".to_string(),
            chunks: vec![ChunkPayload {
                chunk_id: Some("A-1".to_string()),
                embedding: Some(vector),
                chunk_text: Some("charter of the abbey".to_string()),
                page_number: Some(4),
                collection: Some("medieval".to_string()),
                ..Default::default()
            }],
        }),
    )
    .await
    .unwrap();
    assert!(response.success);
    assert_eq!(response.chunks_ingested, 1);

    let answer = http::query(
        State(state.clone()),
        Json(QueryRequest {
            query: "charter of the abbey".to_string(),
            scope: Some(ScopeFilter::new().with_collection("medieval")),
            top_k: 5,
        }),
    )
    .await
    .unwrap();
    assert!(answer.grounded);
    assert_eq!(answer.evidence[0].document_id, "A");

    let stats = http::stats(State(state)).await.unwrap();
    assert_eq!(stats.chunk_count, 1);
    assert_eq!(stats.total_documents, 1);
    assert_eq!(stats.total_collections, 1);
    assert_eq!(stats.backend, "memory");
}

#[tokio::test]
async fn http_collections_count_documents_and_pages() {
    let p = pipeline();
    p.ingest
        .execute(&protocol_pages(), &protocol_metadata())
        .await
        .unwrap();
    p.ingest
        .execute(
            &[PageText::new(1, "Charter granting the mill to the abbey")],
            &DocumentMetadata::new("charter-7").with_collection("medieval"),
        )
        .await
        .unwrap();
    p.ingest
        .execute(
            &[PageText::new(9, "Baptism of Maria, daughter of Pedro")],
            &DocumentMetadata::new("register-2"),
        )
        .await
        .unwrap();

    let state = http_state_for(p);
    let listing = http::collections(State(state.clone())).await.unwrap();
    let rows: Vec<(&str, usize, usize)> = listing
        .collections
        .iter()
        .map(|c| (c.name.as_str(), c.document_count, c.page_count))
        .collect();
    assert_eq!(
        rows,
        vec![("general", 1, 1), ("medieval", 1, 1), ("notarial", 1, 3)]
    );

    let stats = http::stats(State(state)).await.unwrap();
    assert_eq!(stats.chunk_count, 5);
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.total_pages, 5);
    assert_eq!(stats.total_collections, 3);
}

#[tokio::test]
async fn http_collections_on_an_empty_index() {
    let listing = http::collections(State(http_state())).await.unwrap();
    assert!(listing.collections.is_empty());
}

#[tokio::test]
async fn http_ingest_reports_missing_fields_as_bad_request() {
    let state = http_state();
    let err = http::ingest(
        State(state),
        Json(IngestRequest {
            document_id: "A".to_string(),
            chunks: vec![ChunkPayload {
                chunk_id: Some("A-1".to_string()),
                ..Default::default()
            }],
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_delete_reports_removed_count() {
    let state = http_state();
    let embedding = MockEmbedding::with_dimensions(64);
    let vector = embedding.embed_query("grant of tithes").await.unwrap();

    http::ingest(
        State(state.clone()),
        Json(IngestRequest {
            document_id: "A".to_string(),
            chunks: vec![ChunkPayload {
                chunk_id: Some("A-2".to_string()),
                embedding: Some(vector),
                chunk_text: Some("grant of tithes".to_string()),
                page_number: Some(2),
                ..Default::default()
            }],
        }),
    )
    .await
    .unwrap();

    let response = http::delete_chunks(
        State(state.clone()),
        Json(DeleteRequest {
            chunk_ids: vec!["A-2".to_string(), "missing".to_string()],
        }),
    )
    .await
    .unwrap();
    assert_eq!(response.deleted, 1);

    let health = http::health(State(state)).await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.vector_db, "memory");
    assert_eq!(health.embeddings, "mock-embedding");
}
