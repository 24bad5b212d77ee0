use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use super::DocumentLoader;
use crate::error::LoaderError;
use crate::models::{Document, DocumentMetadata};
use crate::utils::check_file_size;

/// Loads a PDF as one document per page, with a zero-based `page`.
#[derive(Debug, Clone)]
pub struct PdfLoader {
    pub max_file_size: u64,
}

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>, LoaderError> {
        check_file_size(path, self.max_file_size)?;

        let pages = extract_pages(path)?;
        let total = pages.len();
        tracing::debug!(path = %path.display(), pages = total, "extracted pdf");

        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(page, text)| {
                let metadata = DocumentMetadata::from_path(path)
                    .with_page(page as u32)
                    .with_extra("total_pages", total);
                Document::new(text, metadata)
            })
            .collect())
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

/// Text of each page. The extractor panics on some malformed files, such as
/// a page referencing a font missing from its resources.
fn extract_pages(path: &Path) -> Result<Vec<String>, LoaderError> {
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path))) {
        Ok(result) => result.map_err(|e| LoaderError::Pdf(e.to_string())),
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown cause".to_string());
            tracing::warn!(path = %path.display(), reason = %reason, "pdf extraction panicked");
            Err(LoaderError::Pdf(format!("extraction aborted: {reason}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PAGES: &[u8] = include_bytes!("../../tests/fixtures/two_pages.pdf");
    const MISSING_FONT: &[u8] = include_bytes!("../../tests/fixtures/missing_font.pdf");

    #[test]
    fn test_one_document_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.pdf");
        std::fs::write(&path, TWO_PAGES).unwrap();

        let docs = PdfLoader {
            max_file_size: 1024 * 1024,
        }
        .load(&path)
        .unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs[0].content.contains("Alpha"));
        assert!(docs[1].content.contains("Bravo"));
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(doc.metadata.page, Some(i as u32));
            assert_eq!(doc.metadata.source.as_deref(), Some(path.to_string_lossy().as_ref()));
            assert_eq!(doc.metadata.extra["total_pages"], serde_json::json!(2));
        }
        assert_ne!(docs[0].id, docs[1].id);
    }

    #[test]
    fn test_extraction_panic_becomes_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken_font.pdf");
        std::fs::write(&path, MISSING_FONT).unwrap();

        let loader = PdfLoader {
            max_file_size: 1024 * 1024,
        };
        assert!(matches!(loader.load(&path), Err(LoaderError::Pdf(_))));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        std::fs::write(&path, vec![b'%'; 64]).unwrap();

        let loader = PdfLoader { max_file_size: 10 };
        assert!(matches!(
            loader.load(&path),
            Err(LoaderError::FileTooLarge { size: 64, max: 10 })
        ));
    }

    #[test]
    fn test_invalid_pdf_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, "plain text").unwrap();

        let loader = PdfLoader {
            max_file_size: 1024,
        };
        assert!(matches!(loader.load(&path), Err(LoaderError::Pdf(_))));
    }
}
