//! Utility modules.

pub mod file;

pub use file::{calculate_checksum, check_file_size, read_file_content, relative_path};
