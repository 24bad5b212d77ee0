//! In-memory vector index using cosine similarity.
//!
//! Entries live in a `Vec` behind a `tokio::sync::RwLock`, with an id map so
//! re-adding a chunk replaces it in place. Nothing is persisted; suitable for
//! tests and one-shot sessions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::mmr::{MmrCandidate, cosine_similarity};
use super::{VectorIndex, candidate_limit, select_results};
use crate::error::VectorStoreError;
use crate::models::{Chunk, DocumentMetadata, RetrievedChunk, SearchMode};
use crate::services::embedding::EmbeddingProvider;

#[derive(Debug, Clone)]
struct Entry {
    vector: Vec<f32>,
    content: String,
    metadata: DocumentMetadata,
}

#[derive(Debug, Default)]
struct Store {
    entries: Vec<Entry>,
    positions: HashMap<String, usize>,
}

pub struct InMemoryIndex {
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
    store: RwLock<Store>,
}

impl InMemoryIndex {
    pub fn new(collection: impl Into<String>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            collection: collection.into(),
            embedder,
            store: RwLock::new(Store::default()),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn add(&self, chunks: Vec<Chunk>) -> Result<usize, VectorStoreError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(texts).await?;
        if vectors.len() != chunks.len() {
            return Err(VectorStoreError::UpsertError(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let count = chunks.len();
        let mut store = self.store.write().await;
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            let entry = Entry {
                vector,
                content: chunk.content,
                metadata: chunk.metadata,
            };
            match store.positions.get(&chunk.id).copied() {
                Some(pos) => store.entries[pos] = entry,
                None => {
                    let pos = store.entries.len();
                    store.entries.push(entry);
                    store.positions.insert(chunk.id, pos);
                }
            }
        }
        Ok(count)
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        mode: SearchMode,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query = self.embedder.embed(text).await?;

        let store = self.store.read().await;
        let mut scored: Vec<MmrCandidate<RetrievedChunk>> = store
            .entries
            .iter()
            .map(|entry| {
                let score = cosine_similarity(&query, &entry.vector);
                MmrCandidate {
                    item: RetrievedChunk {
                        content: entry.content.clone(),
                        metadata: entry.metadata.clone(),
                        score,
                    },
                    score,
                    vector: entry.vector.clone(),
                }
            })
            .collect();
        drop(store);

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(candidate_limit(k, mode));

        Ok(select_results(&query, scored, k, mode))
    }

    async fn delete_collection(&self) -> Result<(), VectorStoreError> {
        let mut store = self.store.write().await;
        *store = Store::default();
        Ok(())
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        Ok(self.store.read().await.entries.len() as u64)
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use crate::models::{Document, MmrParams};
    use std::path::Path;

    /// Embeds text as counts of a few marker words.
    struct KeywordEmbedder;

    const WORDS: [&str; 3] = ["rust", "python", "cooking"];

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let lower = t.to_lowercase();
                    WORDS
                        .iter()
                        .map(|w| lower.matches(w).count() as f32)
                        .collect()
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            WORDS.len()
        }

        fn model_id(&self) -> &str {
            "keyword"
        }
    }

    fn chunk(source: &str, content: &str) -> Chunk {
        let doc = Document::new(
            content.to_string(),
            DocumentMetadata::from_path(Path::new(source)),
        );
        Chunk::from_document(&doc, content.to_string(), 0, 0)
    }

    fn index() -> InMemoryIndex {
        InMemoryIndex::new("test", Arc::new(KeywordEmbedder))
    }

    #[tokio::test]
    async fn test_similarity_query_orders_by_score() {
        let index = index();
        index
            .add(vec![
                chunk("cook.pdf", "cooking cooking"),
                chunk("rust.pdf", "rust rust rust"),
                chunk("mixed.pdf", "rust and python"),
            ])
            .await
            .unwrap();

        let results = index.query("rust", 2, SearchMode::Similarity).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source(), Some("rust.pdf"));
        assert_eq!(results[1].source(), Some("mixed.pdf"));
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_mmr_prefers_diverse_results() {
        let index = index();
        index
            .add(vec![
                chunk("a.pdf", "rust rust rust rust python"),
                chunk("b.pdf", "rust rust rust rust python"),
                chunk("c.pdf", "rust cooking"),
            ])
            .await
            .unwrap();

        let plain = index.query("rust", 2, SearchMode::Similarity).await.unwrap();
        assert!(plain.iter().all(|r| r.source() != Some("c.pdf")));

        let mode = SearchMode::Mmr(MmrParams {
            fetch_k: 10,
            lambda: 0.3,
        });
        let results = index.query("rust", 2, mode).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_ne!(results[0].source(), Some("c.pdf"));
        assert_eq!(results[1].source(), Some("c.pdf"));
    }

    #[tokio::test]
    async fn test_readding_same_chunk_replaces_entry() {
        let index = index();
        let c = chunk("rust.pdf", "rust");
        index.add(vec![c.clone()]).await.unwrap();
        index.add(vec![c]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_collection_empties_index() {
        let index = index();
        index.add(vec![chunk("rust.pdf", "rust")]).await.unwrap();
        index.delete_collection().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(
            index
                .query("rust", 4, SearchMode::Similarity)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
