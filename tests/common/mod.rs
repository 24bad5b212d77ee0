#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use docchat::error::{EmbeddingError, GenerationError, VectorStoreError};
use docchat::models::{Chunk, Document, DocumentMetadata, Message, RetrievedChunk, SearchMode};
use docchat::services::{
    EmbeddingProvider, GenerationModel, InMemoryIndex, TextChunker, TokenStream, VectorIndex,
};

pub const KEYWORDS: &[&str] = &["rust", "python", "cooking", "ownership", "garden"];

/// Embeds text as keyword counts, plus a constant bias dimension.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut vector: Vec<f32> = KEYWORDS
                    .iter()
                    .map(|k| lower.matches(k).count() as f32)
                    .collect();
                vector.push(0.01);
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        KEYWORDS.len() + 1
    }

    fn model_id(&self) -> &str {
        "keyword-test"
    }
}

pub fn memory_index() -> Arc<InMemoryIndex> {
    Arc::new(InMemoryIndex::new("test_collection", Arc::new(KeywordEmbedder)))
}

/// Chunk `content` as if it were page 0 of `source` and store it.
pub async fn add_document(index: &dyn VectorIndex, source: &str, content: &str) -> usize {
    let doc = Document::new(
        content.to_string(),
        DocumentMetadata::from_path(Path::new(source)).with_page(0),
    );
    let chunks = TextChunker::default().chunk(&doc);
    index.add(chunks).await.unwrap()
}

#[derive(Debug, Clone)]
pub enum Script {
    Fragments(Vec<&'static str>),
    FailOnStart,
    FailAfter(Vec<&'static str>),
}

/// Generation model replaying a fixed script and recording its prompts.
pub struct ScriptedModel {
    script: Script,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(fragments: Vec<&'static str>) -> Arc<Self> {
        Self::new(Script::Fragments(fragments))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Vec<Message> {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn record(&self, messages: &[Message]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(messages.to_vec());
    }
}

#[async_trait]
impl GenerationModel for ScriptedModel {
    async fn complete(&self, messages: &[Message]) -> Result<String, GenerationError> {
        self.record(messages);
        match &self.script {
            Script::Fragments(parts) => Ok(parts.concat()),
            Script::FailOnStart | Script::FailAfter(_) => {
                Err(GenerationError::StreamError("model unavailable".to_string()))
            }
        }
    }

    async fn stream(&self, messages: &[Message]) -> Result<TokenStream, GenerationError> {
        self.record(messages);
        let items: Vec<Result<String, GenerationError>> = match &self.script {
            Script::Fragments(parts) => parts.iter().map(|p| Ok(p.to_string())).collect(),
            Script::FailOnStart => {
                return Err(GenerationError::StreamError("model unavailable".to_string()));
            }
            Script::FailAfter(parts) => parts
                .iter()
                .map(|p| Ok(p.to_string()))
                .chain(std::iter::once(Err(GenerationError::StreamError(
                    "connection reset".to_string(),
                ))))
                .collect(),
        };
        Ok(Box::pin(stream::iter(items)))
    }

    fn model_id(&self) -> &str {
        "scripted-test"
    }
}

/// Index whose every operation fails.
pub struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(false)
    }

    async fn add(&self, _chunks: Vec<Chunk>) -> Result<usize, VectorStoreError> {
        Err(VectorStoreError::ConnectionError("store offline".to_string()))
    }

    async fn query(
        &self,
        _text: &str,
        _k: usize,
        _mode: SearchMode,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        Err(VectorStoreError::ConnectionError("store offline".to_string()))
    }

    async fn delete_collection(&self) -> Result<(), VectorStoreError> {
        Err(VectorStoreError::ConnectionError("store offline".to_string()))
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        Err(VectorStoreError::ConnectionError("store offline".to_string()))
    }

    fn collection(&self) -> &str {
        "offline"
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

/// Wraps an index and fails the `fail_on`-th call to `add` (1-based).
pub struct FlakyIndex {
    pub inner: Arc<InMemoryIndex>,
    pub fail_on: usize,
    pub adds: AtomicUsize,
}

impl FlakyIndex {
    pub fn new(fail_on: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: memory_index(),
            fail_on,
            adds: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl VectorIndex for FlakyIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.inner.health_check().await
    }

    async fn add(&self, chunks: Vec<Chunk>) -> Result<usize, VectorStoreError> {
        let call = self.adds.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(VectorStoreError::UpsertError("simulated outage".to_string()));
        }
        self.inner.add(chunks).await
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        mode: SearchMode,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        self.inner.query(text, k, mode).await
    }

    async fn delete_collection(&self) -> Result<(), VectorStoreError> {
        self.inner.delete_collection().await
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        self.inner.count().await
    }

    fn collection(&self) -> &str {
        self.inner.collection()
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}
