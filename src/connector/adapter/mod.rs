mod anthropic_client;
mod duckdb_chunk_store;
mod exact_vector_index;
mod in_memory_chunk_store;
mod mock_chat_client;
mod mock_embedding;
mod openai_embedding;
mod page_loader;
mod qdrant_vector_index;
mod text_chunker;

pub use anthropic_client::AnthropicClient;
pub use duckdb_chunk_store::*;
pub use exact_vector_index::*;
pub use in_memory_chunk_store::*;
pub use mock_chat_client::*;
pub use mock_embedding::*;
pub use openai_embedding::OpenAiEmbedding;
pub use page_loader::*;
pub use qdrant_vector_index::*;
pub use text_chunker::*;
