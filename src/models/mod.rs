mod chat;
mod config;
mod document;
mod search;

pub use chat::{ChatAnswer, ChatEvent, ChatRequest, Message, Role};
pub use config::{
    CONTEXT_PLACEHOLDER, Config, DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    DEFAULT_COLLECTION, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_GENERATION_MODEL, DEFAULT_K, DEFAULT_PORT, DEFAULT_QDRANT_URL, DEFAULT_SOURCES_LIMIT,
    DEFAULT_SYSTEM_PROMPT, EmbeddingConfig, GenerationConfig, GenerationProvider, IngestionConfig,
    OutputConfig, RetrievalConfig, SearchType, ServerConfig, VectorDriver, VectorStoreConfig,
};
pub use document::{Chunk, Document, DocumentMetadata};
pub use search::{MmrParams, OutputFormat, RetrievedChunk, SearchMode};
