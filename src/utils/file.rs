//! File helpers shared by the document loaders and the ingestion walk.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::error::LoaderError;

/// Calculate SHA-256 checksum of content.
pub fn calculate_checksum(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hex::encode(hash)
}

/// Fail with `FileTooLarge` when the file exceeds `max_size` bytes.
pub fn check_file_size(path: &Path, max_size: u64) -> Result<u64, LoaderError> {
    let size = fs::metadata(path)?.len();
    if size > max_size {
        return Err(LoaderError::FileTooLarge {
            size,
            max: max_size,
        });
    }
    Ok(size)
}

/// Read file content with size limit.
pub fn read_file_content(path: &Path, max_size: u64) -> Result<String, LoaderError> {
    check_file_size(path, max_size)?;
    Ok(fs::read_to_string(path)?)
}

/// Path of `path` relative to `base`, with `/` separators for glob matching.
pub fn relative_path(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_calculate_checksum() {
        let checksum = calculate_checksum("hello world");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, calculate_checksum("hello world"));
    }

    #[test]
    fn test_read_file_content_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "0123456789").unwrap();

        assert_eq!(read_file_content(&path, 10).unwrap(), "0123456789");
        assert!(matches!(
            read_file_content(&path, 9),
            Err(LoaderError::FileTooLarge { size: 10, max: 9 })
        ));
    }

    #[test]
    fn test_relative_path() {
        let base = PathBuf::from("/docs");
        assert_eq!(
            relative_path(&base, Path::new("/docs/a/b.pdf")).as_deref(),
            Some("a/b.pdf")
        );
        assert_eq!(relative_path(&base, Path::new("/other/b.pdf")), None);
    }
}
