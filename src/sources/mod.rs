//! Document loaders and lazy discovery of files under an ingestion root.

mod pdf;
mod text;

pub use pdf::PdfLoader;
pub use text::TextLoader;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::error::{ConfigError, LoaderError};
use crate::models::Document;
use crate::utils::relative_path;

/// Reads one file into one or more documents.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<Document>, LoaderError>;

    /// Lower-case extensions without the dot.
    fn supported_extensions(&self) -> &[&str];
}

/// Dispatches files to a loader by extension.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl LoaderRegistry {
    pub fn new(loaders: Vec<Box<dyn DocumentLoader>>) -> Self {
        Self { loaders }
    }

    /// PDF and plain-text loaders with the given size limit.
    pub fn with_defaults(max_file_size: u64) -> Self {
        Self::new(vec![
            Box::new(PdfLoader { max_file_size }),
            Box::new(TextLoader { max_file_size }),
        ])
    }

    pub fn loader_for(&self, path: &Path) -> Option<&dyn DocumentLoader> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        self.loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .map(|l| l.as_ref())
    }

    pub fn load(&self, path: &Path) -> Result<Vec<Document>, LoaderError> {
        match self.loader_for(path) {
            Some(loader) => loader.load(path),
            None => Err(LoaderError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub fn parse_glob(glob: &str) -> Result<Pattern, ConfigError> {
    Pattern::new(glob).map_err(|e| ConfigError::ValidationError(format!("invalid glob {glob}: {e}")))
}

/// One step of a discovery run.
#[derive(Debug)]
pub enum SourceItem {
    /// A matching file was found; its documents follow.
    File(PathBuf),
    Document(Document),
    /// A matching file could not be loaded.
    Skipped { path: PathBuf, error: LoaderError },
}

/// Walks a directory tree and yields documents one at a time.
///
/// Only one file's documents are held at any point.
pub struct DocumentStream {
    root: PathBuf,
    pattern: Pattern,
    walker: walkdir::IntoIter,
    registry: LoaderRegistry,
    pending: VecDeque<Document>,
}

impl DocumentStream {
    pub fn new(root: &Path, pattern: Pattern, registry: LoaderRegistry) -> Self {
        Self {
            root: root.to_path_buf(),
            pattern,
            walker: WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter(),
            registry,
            pending: VecDeque::new(),
        }
    }

    pub fn from_glob(root: &Path, glob: &str, registry: LoaderRegistry) -> Result<Self, ConfigError> {
        Ok(Self::new(root, parse_glob(glob)?, registry))
    }

    fn matches(&self, path: &Path) -> bool {
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        relative_path(&self.root, path)
            .is_some_and(|rel| self.pattern.matches_with(&rel, options))
    }
}

impl Iterator for DocumentStream {
    type Item = SourceItem;

    fn next(&mut self) -> Option<SourceItem> {
        if let Some(doc) = self.pending.pop_front() {
            return Some(SourceItem::Document(doc));
        }

        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !self.matches(path) {
                continue;
            }

            return Some(match self.registry.load(path) {
                Ok(docs) => {
                    self.pending.extend(docs);
                    SourceItem::File(path.to_path_buf())
                }
                Err(error) => SourceItem::Skipped {
                    path: path.to_path_buf(),
                    error,
                },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn collect_docs(stream: DocumentStream) -> (Vec<PathBuf>, Vec<Document>, Vec<PathBuf>) {
        let mut files = Vec::new();
        let mut docs = Vec::new();
        let mut skipped = Vec::new();
        for item in stream {
            match item {
                SourceItem::File(p) => files.push(p),
                SourceItem::Document(d) => docs.push(d),
                SourceItem::Skipped { path, .. } => skipped.push(path),
            }
        }
        (files, docs, skipped)
    }

    #[test]
    fn test_registry_dispatch_by_extension() {
        let registry = LoaderRegistry::with_defaults(1024);
        assert!(registry.loader_for(Path::new("a.PDF")).is_some());
        assert!(registry.loader_for(Path::new("notes.md")).is_some());
        assert!(registry.loader_for(Path::new("image.png")).is_none());
        assert!(matches!(
            registry.load(Path::new("image.png")),
            Err(LoaderError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_stream_matches_glob_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("guides/deep")).unwrap();
        fs::write(dir.path().join("top.txt"), "top level").unwrap();
        fs::write(dir.path().join("guides/deep/nested.txt"), "nested").unwrap();
        fs::write(dir.path().join("guides/readme.md"), "ignored").unwrap();

        let stream = DocumentStream::from_glob(
            dir.path(),
            "**/*.txt",
            LoaderRegistry::with_defaults(1024),
        )
        .unwrap();
        let (files, docs, skipped) = collect_docs(stream);

        assert_eq!(files.len(), 2);
        assert_eq!(docs.len(), 2);
        assert!(skipped.is_empty());
        let contents: Vec<_> = docs.iter().map(|d| d.content.as_str()).collect();
        assert!(contents.contains(&"top level"));
        assert!(contents.contains(&"nested"));
    }

    #[test]
    fn test_stream_reports_unloadable_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.pdf"), "not really a pdf").unwrap();

        let stream = DocumentStream::from_glob(
            dir.path(),
            "**/*.pdf",
            LoaderRegistry::with_defaults(1024),
        )
        .unwrap();
        let (files, docs, skipped) = collect_docs(stream);

        assert!(files.is_empty());
        assert!(docs.is_empty());
        assert_eq!(skipped, vec![dir.path().join("broken.pdf")]);
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DocumentStream::from_glob(dir.path(), "[", LoaderRegistry::with_defaults(1));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
