use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Metadata carried from a document to every chunk cut from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Origin identifier, usually the file path.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,

    /// Zero-based page number for paginated formats.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page: Option<u32>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    pub fn from_path(path: &Path) -> Self {
        Self {
            source: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// File-name component of `source`, without directories.
    pub fn file_name(&self) -> Option<&str> {
        self.source
            .as_deref()
            .and_then(|s| s.rsplit(['/', '\\']).next())
            .filter(|name| !name.is_empty())
    }
}

/// A loaded unit of source text. Pages of a PDF are separate documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn generate_id(metadata: &DocumentMetadata, content: &str) -> String {
        use sha2::{Digest, Sha256};
        let input = format!(
            "{}:{}:{}",
            metadata.source.as_deref().unwrap_or_default(),
            metadata.page.map(|p| p.to_string()).unwrap_or_default(),
            crate::utils::calculate_checksum(content)
        );
        let hash = Sha256::digest(input.as_bytes());
        hex::encode(&hash[..16])
    }

    pub fn new(content: String, metadata: DocumentMetadata) -> Self {
        let id = Self::generate_id(&metadata, &content);
        Self {
            id,
            content,
            metadata,
        }
    }
}

/// A window of a document's text, the unit stored in and returned by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub chunk_index: u32,
    /// Character offset of the window in the document text.
    pub start_offset: u64,
    pub metadata: DocumentMetadata,
}

impl Chunk {
    pub fn generate_id(document_id: &str, chunk_index: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", document_id, chunk_index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn from_document(
        document: &Document,
        content: String,
        chunk_index: u32,
        start_offset: u64,
    ) -> Self {
        Self {
            id: Self::generate_id(&document.id, chunk_index),
            document_id: document.id.clone(),
            content,
            chunk_index,
            start_offset,
            metadata: document.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_generate_id() {
        let meta = DocumentMetadata::from_path(Path::new("/docs/guide.pdf")).with_page(2);
        let id = Document::generate_id(&meta, "hello");
        assert_eq!(id.len(), 32);
        assert_eq!(id, Document::generate_id(&meta, "hello"));
        assert_ne!(id, Document::generate_id(&meta.clone().with_page(3), "hello"));
    }

    #[test]
    fn test_chunk_generate_id() {
        let id = Chunk::generate_id("abc123", 5);
        assert_eq!(id.len(), 36);
        assert!(id.chars().filter(|c| *c == '-').count() == 4);
        assert_eq!(id, Chunk::generate_id("abc123", 5));
        assert_ne!(id, Chunk::generate_id("abc123", 6));
    }

    #[test]
    fn test_file_name_strips_directories() {
        let meta = DocumentMetadata::from_path(Path::new("documents/manuals/rust.pdf"));
        assert_eq!(meta.file_name(), Some("rust.pdf"));

        let windows = DocumentMetadata {
            source: Some(r"C:\docs\intro.pdf".to_string()),
            ..Default::default()
        };
        assert_eq!(windows.file_name(), Some("intro.pdf"));
        assert_eq!(DocumentMetadata::default().file_name(), None);
    }

    #[test]
    fn test_metadata_flattens_extra_fields() {
        let meta = DocumentMetadata::from_path(Path::new("a.pdf"))
            .with_page(0)
            .with_extra("total_pages", 12);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["source"], "a.pdf");
        assert_eq!(json["page"], 0);
        assert_eq!(json["total_pages"], 12);

        let back: DocumentMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }
}
