//! Batched ingestion of documents into a vector index.
//!
//! Discovery and loading run on a blocking thread and feed a bounded
//! channel. The async side buffers documents and flushes every
//! `batch_size` of them: chunk, then one `VectorIndex::add` call. At most one
//! batch of documents is held in memory at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::mpsc;

use super::chunker::TextChunker;
use super::vector_store::VectorIndex;
use crate::error::{ConfigError, IngestError};
use crate::models::{Document, IngestionConfig};
use crate::sources::{DocumentStream, LoaderRegistry, SourceItem, parse_glob};

/// Outcome of an `ingest_all` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub root: PathBuf,
    pub files_scanned: u64,
    pub files_skipped: u64,
    pub documents: u64,
    pub batches: u64,
    pub failed_batches: u64,
    pub chunks_inserted: u64,
    pub duration_ms: u64,
    /// Discovery stopped before walking the whole tree.
    pub aborted: bool,
    /// One message per failed batch or skipped file.
    pub errors: Vec<String>,
}

impl IngestReport {
    pub fn is_partial(&self) -> bool {
        self.failed_batches > 0 || self.aborted
    }
}

#[derive(Clone)]
pub struct IngestionService {
    index: Arc<dyn VectorIndex>,
    chunker: TextChunker,
    batch_size: usize,
    pattern: Pattern,
    max_file_size: u64,
    progress: ProgressBar,
}

impl IngestionService {
    pub fn new(index: Arc<dyn VectorIndex>, config: &IngestionConfig) -> Result<Self, ConfigError> {
        if config.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingestion.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            index,
            chunker: TextChunker::from_config(config)?,
            batch_size: config.batch_size as usize,
            pattern: parse_glob(&config.glob)?,
            max_file_size: config.max_file_size,
            progress: ProgressBar::hidden(),
        })
    }

    /// Show a spinner on stderr while ingesting.
    pub fn with_progress(mut self) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} files {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        self.progress = pb;
        self
    }

    /// Ingest every matching file under `root`.
    ///
    /// A missing root is created and yields an empty report.
    pub async fn ingest_all(&self, root: &Path) -> Result<IngestReport, IngestError> {
        let start = Instant::now();
        let mut report = IngestReport {
            root: root.to_path_buf(),
            ..Default::default()
        };

        if !root.exists() {
            std::fs::create_dir_all(root).map_err(|source| IngestError::Io {
                path: root.to_path_buf(),
                source,
            })?;
            tracing::info!(root = %root.display(), "created empty documents directory");
            return Ok(report);
        }
        if !root.is_dir() {
            return Err(IngestError::Io {
                path: root.to_path_buf(),
                source: std::io::Error::other("not a directory"),
            });
        }

        let stream = DocumentStream::new(
            root,
            self.pattern.clone(),
            LoaderRegistry::with_defaults(self.max_file_size),
        );
        let (tx, mut rx) = mpsc::channel::<SourceItem>(self.batch_size);
        let producer = tokio::task::spawn_blocking(move || {
            for item in stream {
                if tx.blocking_send(item).is_err() {
                    break;
                }
            }
        });

        let mut buffer: Vec<Document> = Vec::with_capacity(self.batch_size);
        while let Some(item) = rx.recv().await {
            match item {
                SourceItem::File(path) => {
                    report.files_scanned += 1;
                    self.progress.inc(1);
                    self.progress.set_message(display_name(&path));
                }
                SourceItem::Document(doc) => {
                    report.documents += 1;
                    buffer.push(doc);
                    if buffer.len() >= self.batch_size {
                        self.flush(&mut buffer, &mut report).await;
                    }
                }
                SourceItem::Skipped { path, error } => {
                    report.files_scanned += 1;
                    report.files_skipped += 1;
                    self.progress.inc(1);
                    tracing::warn!(path = %path.display(), error = %error, "skipping file");
                    report.errors.push(format!("{}: {}", path.display(), error));
                }
            }
        }
        self.flush(&mut buffer, &mut report).await;

        if let Err(e) = producer.await {
            tracing::error!(root = %root.display(), error = %e, "document discovery aborted");
            report.aborted = true;
            report.errors.push(format!("discovery aborted: {e}"));
        }

        self.progress.finish_and_clear();
        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            files = report.files_scanned,
            documents = report.documents,
            chunks = report.chunks_inserted,
            failed_batches = report.failed_batches,
            "ingestion finished"
        );
        Ok(report)
    }

    /// Ingest a single file in one flush. Returns the number of chunks stored.
    pub async fn ingest_one(&self, path: &Path) -> Result<usize, IngestError> {
        if !path.is_file() {
            return Err(IngestError::NotFound(path.to_path_buf()));
        }

        let owned = path.to_path_buf();
        let max_file_size = self.max_file_size;
        let documents = tokio::task::spawn_blocking(move || {
            LoaderRegistry::with_defaults(max_file_size).load(&owned)
        })
        .await
        .map_err(|e| IngestError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(e.to_string()),
        })?
        .map_err(|source| IngestError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        let chunks = self.chunker.split(&documents);
        let inserted = self.index.add(chunks).await?;
        tracing::info!(path = %path.display(), chunks = inserted, "ingested file");
        Ok(inserted)
    }

    /// Delete the whole collection. Irreversible.
    pub async fn clear(&self) -> Result<(), IngestError> {
        self.index.delete_collection().await?;
        tracing::info!(collection = self.index.collection(), "collection cleared");
        Ok(())
    }

    async fn flush(&self, buffer: &mut Vec<Document>, report: &mut IngestReport) {
        if buffer.is_empty() {
            return;
        }

        let documents = std::mem::take(buffer);
        let chunks = self.chunker.split(&documents);
        let doc_count = documents.len();
        drop(documents);

        report.batches += 1;
        let batch = report.batches;
        if chunks.is_empty() {
            tracing::debug!(batch, "batch produced no chunks");
            return;
        }

        match self.index.add(chunks).await {
            Ok(inserted) => {
                report.chunks_inserted += inserted as u64;
                tracing::debug!(batch, documents = doc_count, chunks = inserted, "batch stored");
            }
            Err(e) => {
                report.failed_batches += 1;
                tracing::error!(batch, documents = doc_count, error = %e, "batch insert failed");
                report.errors.push(format!("batch {batch}: {e}"));
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_batch_size() {
        let config = IngestionConfig {
            batch_size: 0,
            ..Default::default()
        };
        let index = Arc::new(crate::services::vector_store::InMemoryIndex::new(
            "t",
            Arc::new(NullEmbedder),
        ));
        assert!(IngestionService::new(index, &config).is_err());
    }

    struct NullEmbedder;

    #[async_trait::async_trait]
    impl crate::services::EmbeddingProvider for NullEmbedder {
        async fn embed_batch(
            &self,
            texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, crate::error::EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }

        fn dimension(&self) -> usize {
            1
        }

        fn model_id(&self) -> &str {
            "null"
        }
    }

    #[test]
    fn test_report_partial_flag() {
        let mut report = IngestReport::default();
        assert!(!report.is_partial());
        report.failed_batches = 1;
        assert!(report.is_partial());
    }
}
