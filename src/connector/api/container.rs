use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::application::{
    AnswerQuestionUseCase, ChatClient, DeleteChunksUseCase, DocumentChunker, EmbeddingService,
    IndexStatsUseCase, IngestDocumentUseCase, ListCollectionsUseCase, SearchChunksUseCase,
    VectorIndex, DEFAULT_MIN_OCR_CONFIDENCE,
};
use crate::connector::adapter::{
    AnthropicClient, DuckdbChunkStore, ExactVectorIndex, HfTokenizer, MockChatClient,
    MockEmbedding, OpenAiEmbedding, QdrantConfig, QdrantVectorIndex, TextTokenizer,
    TokenWindowChunker, WhitespaceTokenizer, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    DEFAULT_COLLECTION_NAME, DEFAULT_QDRANT_URL,
};

const DATABASE_FILE: &str = "scriptorium.duckdb";

/// Where chunk vectors live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Exact search over an in-memory store; nothing survives the process.
    Memory,
    /// Exact search over a DuckDB file under the data directory.
    Duckdb,
    /// Qdrant for vectors, DuckDB for chunk records.
    Qdrant,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Duckdb => "duckdb",
            Backend::Qdrant => "qdrant",
        }
    }
}

pub struct ContainerConfig {
    pub data_dir: String,
    pub backend: Backend,
    pub qdrant_url: Option<String>,
    pub collection_name: String,
    pub mock_embeddings: bool,
    pub mock_chat: bool,
    /// Embedding size override. Mock embeddings default to 384.
    pub dimensions: Option<usize>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// A HuggingFace `tokenizer.json`; whitespace tokens are used when unset.
    pub tokenizer_path: Option<String>,
    pub min_ocr_confidence: f32,
    pub show_progress: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            backend: Backend::Memory,
            qdrant_url: None,
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            mock_embeddings: true,
            mock_chat: true,
            dimensions: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            tokenizer_path: None,
            min_ocr_confidence: DEFAULT_MIN_OCR_CONFIDENCE,
            show_progress: false,
        }
    }
}

/// Builds every adapter once and hands out use cases sharing them.
pub struct Container {
    embedding_service: Arc<dyn EmbeddingService>,
    chat_client: Arc<dyn ChatClient>,
    index: Arc<dyn VectorIndex>,
    chunker: Arc<dyn DocumentChunker>,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        let embedding_service: Arc<dyn EmbeddingService> = if config.mock_embeddings {
            debug!("Using mock embedding service");
            Arc::new(match config.dimensions {
                Some(dimensions) => MockEmbedding::with_dimensions(dimensions),
                None => MockEmbedding::new(),
            })
        } else {
            let mut service = OpenAiEmbedding::from_env()?;
            if let Some(dimensions) = config.dimensions {
                service = service.with_dimensions(dimensions);
            }
            Arc::new(service)
        };

        let chat_client: Arc<dyn ChatClient> = if config.mock_chat {
            debug!("Using mock chat client");
            Arc::new(MockChatClient::new())
        } else {
            Arc::new(AnthropicClient::from_env())
        };

        let dimensions = embedding_service.config().dimensions();
        let index = Self::build_index(&config, dimensions)?;

        let tokenizer: Arc<dyn TextTokenizer> = match config.tokenizer_path.as_deref() {
            Some(path) => Arc::new(HfTokenizer::from_file(&PathBuf::from(path))?),
            None => Arc::new(WhitespaceTokenizer),
        };
        let chunker = Arc::new(TokenWindowChunker::new(
            tokenizer,
            config.chunk_size,
            config.chunk_overlap,
        )?);

        info!(
            "Backend: {} | Embeddings: {} ({} dims) | LLM: {}",
            index.backend_name(),
            embedding_service.config().model_name(),
            dimensions,
            chat_client.model_name()
        );

        Ok(Self {
            embedding_service,
            chat_client,
            index,
            chunker,
            config,
        })
    }

    /// Assembles a container from ready-made adapters.
    pub fn from_parts(
        embedding_service: Arc<dyn EmbeddingService>,
        chat_client: Arc<dyn ChatClient>,
        index: Arc<dyn VectorIndex>,
        chunker: Arc<dyn DocumentChunker>,
        config: ContainerConfig,
    ) -> Self {
        Self {
            embedding_service,
            chat_client,
            index,
            chunker,
            config,
        }
    }

    fn database_path(config: &ContainerConfig) -> Result<PathBuf> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create data directory {}", config.data_dir))?;
        Ok(PathBuf::from(&config.data_dir).join(DATABASE_FILE))
    }

    fn build_index(config: &ContainerConfig, dimensions: usize) -> Result<Arc<dyn VectorIndex>> {
        let index: Arc<dyn VectorIndex> = match config.backend {
            Backend::Memory => {
                debug!("Using in-memory exact index");
                Arc::new(ExactVectorIndex::in_memory().with_dimensions(dimensions))
            }
            Backend::Duckdb => {
                let db_path = Self::database_path(config)?;
                debug!("Using DuckDB exact index at {:?}", db_path);
                let store = Arc::new(DuckdbChunkStore::new(&db_path)?);
                Arc::new(
                    ExactVectorIndex::new(store)
                        .with_name("duckdb")
                        .with_dimensions(dimensions),
                )
            }
            Backend::Qdrant => {
                let db_path = Self::database_path(config)?;
                let url = config.qdrant_url.as_deref().unwrap_or(DEFAULT_QDRANT_URL);
                debug!(
                    "Using Qdrant at {} collection {} (chunk records in {:?})",
                    url, config.collection_name, db_path
                );
                let store = Arc::new(DuckdbChunkStore::new(&db_path)?);
                let mut qdrant_config =
                    QdrantConfig::new(url, &config.collection_name, dimensions);
                if let Ok(key) = std::env::var("QDRANT_API_KEY") {
                    qdrant_config = qdrant_config.with_api_key(key);
                }
                Arc::new(QdrantVectorIndex::new(qdrant_config, store))
            }
        };
        Ok(index)
    }

    pub fn search_use_case(&self) -> SearchChunksUseCase {
        SearchChunksUseCase::new(self.index.clone(), self.embedding_service.clone())
    }

    pub fn answer_use_case(&self) -> AnswerQuestionUseCase {
        AnswerQuestionUseCase::new(Arc::new(self.search_use_case()), self.chat_client.clone())
    }

    pub fn ingest_use_case(&self) -> IngestDocumentUseCase {
        IngestDocumentUseCase::new(
            self.chunker.clone(),
            self.embedding_service.clone(),
            self.index.clone(),
        )
        .with_min_ocr_confidence(self.config.min_ocr_confidence)
        .with_progress(self.config.show_progress)
    }

    pub fn delete_use_case(&self) -> DeleteChunksUseCase {
        DeleteChunksUseCase::new(self.index.clone())
    }

    pub fn stats_use_case(&self) -> IndexStatsUseCase {
        IndexStatsUseCase::new(self.index.clone(), self.embedding_service.clone())
    }

    pub fn collections_use_case(&self) -> ListCollectionsUseCase {
        ListCollectionsUseCase::new(self.index.clone())
    }

    pub fn backend_name(&self) -> &str {
        self.index.backend_name()
    }

    pub fn embedding_model(&self) -> &str {
        self.embedding_service.config().model_name()
    }

    pub fn data_dir(&self) -> &str {
        &self.config.data_dir
    }
}
