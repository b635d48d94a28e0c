pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    AnswerQuestionUseCase, ChatClient, ChunkStore, DeleteChunksUseCase, DocumentChunker,
    EmbeddingService, IndexStats, IndexStatsUseCase, IngestDocumentUseCase,
    ListCollectionsUseCase, RetryPolicy, SearchChunksUseCase, VectorIndex,
};

pub use cli::Commands;

pub use connector::{
    AnthropicClient, Backend, Container, ContainerConfig, DuckdbChunkStore, ExactVectorIndex,
    InMemoryChunkStore, MockChatClient, MockEmbedding, OpenAiEmbedding, QdrantConfig,
    QdrantVectorIndex, TokenWindowChunker, WhitespaceTokenizer,
};

pub use domain::{
    Chunk, ChunkPayload, CollectionCatalog, CollectionSummary, DocumentMetadata, DomainError,
    EmbeddingConfig, IngestReport, MetadataFilter, PageText, QueryAnswer, ScopeFilter, SearchHit,
    SearchOutcome, SearchQuery, SearchResult, SimilarityRanker,
};
