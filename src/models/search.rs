//! Retrieval-related models.

use serde::{Deserialize, Serialize};

use super::document::DocumentMetadata;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Parameters for maximal marginal relevance reranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MmrParams {
    /// Candidates fetched by plain similarity before reranking.
    pub fetch_k: usize,
    /// 1.0 is pure relevance, 0.0 is pure diversity.
    pub lambda: f32,
}

impl Default for MmrParams {
    fn default() -> Self {
        Self {
            fetch_k: 20,
            lambda: 0.5,
        }
    }
}

/// How the index ranks results for a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SearchMode {
    Similarity,
    Mmr(MmrParams),
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::Mmr(MmrParams::default())
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Similarity => write!(f, "similarity"),
            SearchMode::Mmr(p) => write!(f, "mmr(fetch_k={}, lambda={})", p.fetch_k, p.lambda),
        }
    }
}

/// A chunk returned by the index for a query, in ranking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Cosine similarity to the query.
    pub score: f32,
}

impl RetrievedChunk {
    pub fn source(&self) -> Option<&str> {
        self.metadata.source.as_deref()
    }
}
