mod chat_client;
mod chunk_store;
mod document_chunker;
mod embedding_service;
mod vector_index;

pub use chat_client::*;
pub use chunk_store::*;
pub use document_chunker::*;
pub use embedding_service::*;
pub use vector_index::*;
