mod chat;
mod chunker;
mod embedding;
mod ingestion;

pub mod generation;
pub mod vector_store;

pub use chat::{ChatEngine, ChatEventStream, PromptTemplate, collect_sources};
pub use chunker::TextChunker;
pub use embedding::{EmbeddingClient, EmbeddingProvider};
pub use generation::{GenerationModel, TokenStream, create_model};
pub use ingestion::{IngestReport, IngestionService};
pub use vector_store::{InMemoryIndex, VectorIndex, create_backend};
