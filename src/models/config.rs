use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::search::{MmrParams, OutputFormat, SearchMode};
use crate::error::ConfigError;

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:8080";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-mpnet-base-v2";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 768;
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION: &str = "document_collection";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_DOCUMENTS_DIR: &str = "documents";
pub const DEFAULT_CHUNK_SIZE: u32 = 1500;
pub const DEFAULT_CHUNK_OVERLAP: u32 = 350;
pub const DEFAULT_BATCH_SIZE: u32 = 50;
pub const DEFAULT_K: u32 = 4;
pub const DEFAULT_SOURCES_LIMIT: u32 = 3;
pub const DEFAULT_PORT: u16 = 8001;

/// Placeholder the system prompt must contain.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert assistant for programming and technical documentation. \
Use the following retrieved context to answer the user's question. \
If the answer is not in the context, politely say that you do not have that information. \
Keep the answer concise and technical.\n\n{context}";

const PROJECT_CONFIG_DIR: &str = ".docchat";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub ingestion: IngestionConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("docchat").join(CONFIG_FILE))
    }

    pub fn project_path() -> Option<PathBuf> {
        std::env::current_dir()
            .ok()
            .map(|p| p.join(PROJECT_CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Resolve which config file applies: explicit path, then project, then global.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        [Self::project_path(), Self::global_path()]
            .into_iter()
            .flatten()
            .find(|p| p.exists())
    }

    /// Load configuration, apply environment overrides and validate it.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match Self::resolve_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if explicit.is_some() => {
                return Err(ConfigError::PathError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DOCCHAT_EMBEDDING_URL") {
            self.embedding.url = url;
        }
        if let Some(url) = lookup("DOCCHAT_VECTOR_URL") {
            self.vector_store.url = url;
        }
        if let Some(collection) = lookup("DOCCHAT_COLLECTION") {
            self.vector_store.collection = collection;
        }
        if let Some(dir) = lookup("DOCCHAT_DOCUMENTS_DIR") {
            self.ingestion.documents_dir = PathBuf::from(dir);
        }
        if self.generation.api_key.is_none() {
            let keys: &[&str] = match self.generation.provider {
                GenerationProvider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
                GenerationProvider::OpenAi => &["OPENAI_API_KEY"],
            };
            self.generation.api_key = keys.iter().find_map(|k| lookup(k));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ingestion = &self.ingestion;
        if ingestion.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingestion.chunk_size must be positive".to_string(),
            ));
        }
        if ingestion.chunk_overlap >= ingestion.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "ingestion.chunk_overlap ({}) must be smaller than chunk_size ({})",
                ingestion.chunk_overlap, ingestion.chunk_size
            )));
        }
        if ingestion.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingestion.batch_size must be at least 1".to_string(),
            ));
        }
        if glob::Pattern::new(&ingestion.glob).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "ingestion.glob is not a valid pattern: {}",
                ingestion.glob
            )));
        }

        let retrieval = &self.retrieval;
        if !(1..=50).contains(&retrieval.k) {
            return Err(ConfigError::ValidationError(
                "retrieval.k must be between 1 and 50".to_string(),
            ));
        }
        if retrieval.fetch_k < retrieval.k {
            return Err(ConfigError::ValidationError(
                "retrieval.fetch_k must be >= retrieval.k".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&retrieval.mmr_lambda) {
            return Err(ConfigError::ValidationError(
                "retrieval.mmr_lambda must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !retrieval.system_prompt.contains(CONTEXT_PLACEHOLDER) {
            return Err(ConfigError::ValidationError(format!(
                "retrieval.system_prompt must contain the {CONTEXT_PLACEHOLDER} placeholder"
            )));
        }

        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_model")]
    pub model_id: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: u32,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_dimension() -> u32 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_timeout() -> u64 {
    120
}

fn default_embedding_batch_size() -> u32 {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model_id: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_timeout(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

/// Vector store backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Qdrant,
    #[serde(alias = "postgres", alias = "pgvector")]
    PostgreSQL,
    Memory,
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Qdrant => write!(f, "qdrant"),
            VectorDriver::PostgreSQL => write!(f, "postgresql"),
            VectorDriver::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_pool_max")]
    pub pool_max: u32,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_pool_max() -> u32 {
    5
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            url: default_qdrant_url(),
            collection: default_collection(),
            api_key: None,
            pool_max: default_pool_max(),
        }
    }
}

/// Generation backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    #[default]
    Gemini,
    #[serde(alias = "openai")]
    OpenAi,
}

impl std::fmt::Display for GenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationProvider::Gemini => write!(f, "gemini"),
            GenerationProvider::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub provider: GenerationProvider,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Override for the provider's API base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub temperature: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

fn default_generation_timeout() -> u64 {
    300
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::default(),
            model: default_generation_model(),
            base_url: None,
            api_key: None,
            temperature: 0.0,
            max_output_tokens: None,
            timeout_secs: default_generation_timeout(),
        }
    }
}

/// Retrieval strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Similarity,
    #[default]
    Mmr,
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchType::Similarity => write!(f, "similarity"),
            SearchType::Mmr => write!(f, "mmr"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_k")]
    pub k: u32,

    #[serde(default)]
    pub search_type: SearchType,

    /// Candidates fetched before MMR reranking.
    #[serde(default = "default_fetch_k")]
    pub fetch_k: u32,

    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f32,

    /// Leading chunks considered for source attribution.
    #[serde(default = "default_sources_limit")]
    pub sources_limit: u32,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_k() -> u32 {
    DEFAULT_K
}

fn default_fetch_k() -> u32 {
    20
}

fn default_mmr_lambda() -> f32 {
    0.5
}

fn default_sources_limit() -> u32 {
    DEFAULT_SOURCES_LIMIT
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            search_type: SearchType::default(),
            fetch_k: default_fetch_k(),
            mmr_lambda: default_mmr_lambda(),
            sources_limit: default_sources_limit(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl RetrievalConfig {
    pub fn search_mode(&self) -> SearchMode {
        match self.search_type {
            SearchType::Similarity => SearchMode::Similarity,
            SearchType::Mmr => SearchMode::Mmr(MmrParams {
                fetch_k: self.fetch_k as usize,
                lambda: self.mmr_lambda,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    #[serde(default = "default_glob")]
    pub glob: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: u32,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOCUMENTS_DIR)
}

fn default_glob() -> String {
    "**/*.pdf".to_string()
}

fn default_chunk_size() -> u32 {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> u32 {
    DEFAULT_CHUNK_OVERLAP
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            glob: default_glob(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            batch_size: default_batch_size(),
            max_file_size: default_max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_body_size() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}
