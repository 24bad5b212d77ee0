//! Error types for the document chat assistant.

use std::path::PathBuf;

use thiserror::Error;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to vector index operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("delete error: {0}")]
    DeleteError(String),

    #[error("PostgreSQL error: {0}")]
    PostgresError(String),

    #[error("pgvector extension error: {0}")]
    PgVectorExtensionError(String),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Errors raised by a generation model backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("missing API key for {0}")]
    MissingApiKey(&'static str),

    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("{provider} returned status {status}: {body}")]
    ApiError {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("empty response from {0}")]
    EmptyResponse(&'static str),
}

/// Errors related to reading source documents.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {size} > {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Errors related to ingestion runs.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: LoaderError,
    },

    #[error("vector store error: {0}")]
    Store(#[from] VectorStoreError),
}

/// Errors that abort a single chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] VectorStoreError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Errors raised by the HTTP chat client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("server returned status {status}: {body}")]
    StatusError { status: u16, body: String },

    #[error("malformed stream record: {0}")]
    DecodeError(String),
}

/// Failures starting or running the chat server.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("startup failure: {0}")]
    Startup(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_includes_path() {
        let err = IngestError::NotFound(PathBuf::from("/docs/missing.pdf"));
        assert_eq!(err.to_string(), "not found: /docs/missing.pdf");
    }

    #[test]
    fn test_retrieval_error_wraps_store_error() {
        let err = ChatError::Retrieval(VectorStoreError::SearchError("boom".to_string()));
        assert_eq!(err.to_string(), "retrieval failed: search error: boom");
    }

    #[test]
    fn test_api_error_display() {
        let err = GenerationError::ApiError {
            provider: "gemini",
            status: 429,
            body: "quota".to_string(),
        };
        assert_eq!(err.to_string(), "gemini returned status 429: quota");
    }
}
