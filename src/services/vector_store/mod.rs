//! Vector index abstraction layer.
//!
//! Every backend embeds text itself through an [`EmbeddingProvider`], so
//! callers hand over chunks and query strings rather than vectors. The
//! backend is selected by `vector_store.driver` in the configuration.

mod memory;
mod mmr;
mod pgvector;
mod qdrant;

pub use memory::InMemoryIndex;
pub use mmr::{MmrCandidate, cosine_similarity, mmr_rerank};
pub use pgvector::PgVectorIndex;
pub use qdrant::QdrantIndex;

use std::sync::Arc;

use async_trait::async_trait;

use super::embedding::EmbeddingProvider;
use crate::error::VectorStoreError;
use crate::models::{Chunk, RetrievedChunk, SearchMode, VectorDriver, VectorStoreConfig};

/// A named collection of embedded chunks supporting nearest-neighbor queries.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Check if the backing store is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Embed and persist chunks in one call. Returns the number stored.
    ///
    /// Either every chunk is stored or the call fails.
    async fn add(&self, chunks: Vec<Chunk>) -> Result<usize, VectorStoreError>;

    /// Return at most `k` chunks for `text`, best first.
    async fn query(
        &self,
        text: &str,
        k: usize,
        mode: SearchMode,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError>;

    /// Drop the whole collection. A missing collection is not an error.
    async fn delete_collection(&self) -> Result<(), VectorStoreError>;

    /// Number of stored entries; zero when the collection does not exist.
    async fn count(&self) -> Result<u64, VectorStoreError>;

    fn collection(&self) -> &str;

    fn backend(&self) -> &'static str;
}

/// Create a vector index backend based on configuration.
pub async fn create_backend(
    config: &VectorStoreConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn VectorIndex>, VectorStoreError> {
    let index: Arc<dyn VectorIndex> = match config.driver {
        VectorDriver::Qdrant => Arc::new(QdrantIndex::new(config, embedder)?),
        VectorDriver::PostgreSQL => Arc::new(PgVectorIndex::new(config, embedder).await?),
        VectorDriver::Memory => Arc::new(InMemoryIndex::new(&config.collection, embedder)),
    };
    tracing::debug!(
        backend = index.backend(),
        collection = index.collection(),
        "vector index ready"
    );
    Ok(index)
}

/// Pick the final `k` results from candidates sorted by descending score.
pub(crate) fn select_results(
    query: &[f32],
    candidates: Vec<MmrCandidate<RetrievedChunk>>,
    k: usize,
    mode: SearchMode,
) -> Vec<RetrievedChunk> {
    match mode {
        SearchMode::Similarity => candidates.into_iter().take(k).map(|c| c.item).collect(),
        SearchMode::Mmr(params) => mmr_rerank(query, candidates, k, params.lambda)
            .into_iter()
            .map(|c| c.item)
            .collect(),
    }
}

/// Number of candidates to fetch from the store for the given mode.
pub(crate) fn candidate_limit(k: usize, mode: SearchMode) -> usize {
    match mode {
        SearchMode::Similarity => k,
        SearchMode::Mmr(params) => params.fetch_k.max(k),
    }
}
