//! Fixed-window text chunking with overlap.

use crate::error::ConfigError;
use crate::models::{Chunk, Document, IngestionConfig};

/// Splits documents into windows of `chunk_size` characters, each starting
/// `chunk_size - overlap` characters after the previous one.
///
/// Sizes count Unicode scalar values, not bytes, so windows never split a
/// character.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be positive".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunk_overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &IngestionConfig) -> Result<Self, ConfigError> {
        Self::new(config.chunk_size as usize, config.chunk_overlap as usize)
    }

    /// Chunk every document in order.
    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|doc| self.chunk(doc)).collect()
    }

    /// Chunk a single document. Blank documents yield no chunks.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.windows(&document.content)
            .into_iter()
            .enumerate()
            .map(|(idx, (start, content))| {
                Chunk::from_document(document, content, idx as u32, start as u64)
            })
            .collect()
    }

    fn windows(&self, content: &str) -> Vec<(usize, String)> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = content.chars().collect();
        let total = chars.len();
        let step = self.chunk_size - self.overlap;

        let mut windows = Vec::with_capacity(total / step + 1);
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(total);
            windows.push((start, chars[start..end].iter().collect()));
            if end == total {
                break;
            }
            start += step;
        }
        windows
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: crate::models::DEFAULT_CHUNK_SIZE as usize,
            overlap: crate::models::DEFAULT_CHUNK_OVERLAP as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMetadata;
    use std::path::Path;

    fn create_test_document(content: &str) -> Document {
        Document::new(
            content.to_string(),
            DocumentMetadata::from_path(Path::new("/docs/test.pdf")).with_page(0),
        )
    }

    fn expected_count(len: usize, size: usize, overlap: usize) -> usize {
        if len <= size {
            1
        } else {
            (len - overlap).div_ceil(size - overlap)
        }
    }

    #[test]
    fn test_small_document_single_chunk() {
        let chunker = TextChunker::default();
        let doc = create_test_document("Hello, world!");
        let chunks = chunker.chunk(&doc);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Hello, world!");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].metadata, doc.metadata);
    }

    #[test]
    fn test_empty_and_blank_documents() {
        let chunker = TextChunker::default();
        assert!(chunker.chunk(&create_test_document("")).is_empty());
        assert!(chunker.chunk(&create_test_document("  \n\t ")).is_empty());
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_window_count_and_overlap() {
        for (len, size, overlap) in [(10, 4, 1), (1500, 1500, 350), (1501, 1500, 350), (5000, 1500, 350), (37, 10, 3)] {
            let content: String = (0..len).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
            let chunker = TextChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk(&create_test_document(&content));

            assert_eq!(chunks.len(), expected_count(len, size, overlap), "len={len}");
            for chunk in &chunks {
                assert!(chunk.content.chars().count() <= size);
            }
            for pair in chunks.windows(2) {
                let prev: Vec<char> = pair[0].content.chars().collect();
                let next: Vec<char> = pair[1].content.chars().collect();
                assert_eq!(prev[prev.len() - overlap..], next[..overlap]);
            }
            let last = chunks.last().unwrap();
            assert_eq!(last.start_offset as usize + last.content.chars().count(), len);
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let chunks = chunker.chunk(&create_test_document("ñandú café"));

        assert_eq!(chunks[0].content, "ñand");
        assert_eq!(chunks[1].content, "dú c");
        assert_eq!(chunks[2].content, "café");
    }

    #[test]
    fn test_split_is_deterministic() {
        let chunker = TextChunker::new(200, 50).unwrap();
        let docs = vec![
            create_test_document(&"lorem ipsum ".repeat(60)),
            create_test_document(&"dolor sit amet ".repeat(40)),
        ];

        let first = chunker.split(&docs);
        let second = chunker.split(&docs);
        assert_eq!(first, second);
        assert_eq!(
            first.len(),
            chunker.chunk(&docs[0]).len() + chunker.chunk(&docs[1]).len()
        );
    }
}
