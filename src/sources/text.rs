use std::path::Path;

use super::DocumentLoader;
use crate::error::LoaderError;
use crate::models::{Document, DocumentMetadata};
use crate::utils::read_file_content;

/// Loads plain text and Markdown files as a single document.
#[derive(Debug, Clone)]
pub struct TextLoader {
    pub max_file_size: u64,
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>, LoaderError> {
        let content = read_file_content(path, self.max_file_size)?;
        Ok(vec![Document::new(content, DocumentMetadata::from_path(path))])
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_sets_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Notes").unwrap();

        let docs = TextLoader {
            max_file_size: 1024,
        }
        .load(&path)
        .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "# Notes");
        assert_eq!(docs[0].metadata.file_name(), Some("notes.md"));
        assert_eq!(docs[0].metadata.page, None);
    }
}
