//! Utility functions for book-chunker
//!
//! This module provides common utility functions used throughout the project.

use crate::error::{ChunkerError, Result};
use std::path::{Path, PathBuf};

/// Get file extension from path
pub fn get_file_extension<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file is a supported document format
pub fn is_supported_document<P: AsRef<Path>>(path: P) -> bool {
    match get_file_extension(path) {
        Some(ext) => matches!(ext.as_str(), "pdf" | "txt"),
        None => false,
    }
}

/// Format file size in human readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Validate and normalize file path
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ChunkerError::Config(format!(
            "File not found: {}",
            path.display()
        )));
    }

    path.canonicalize().map_err(ChunkerError::Io)
}

/// Create directory if it doesn't exist
pub fn ensure_directory<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        std::fs::create_dir_all(path).map_err(ChunkerError::Io)?;
    }

    Ok(())
}

/// Escape special characters for safe file naming
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Default book identifier: the sanitized file stem
pub fn book_id_from_path<P: AsRef<Path>>(path: P) -> String {
    let stem = path
        .as_ref()
        .file_stem()
        .map(|stem| sanitize_filename(&stem.to_string_lossy()))
        .unwrap_or_default();

    if stem.is_empty() {
        "book".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_extension() {
        assert_eq!(get_file_extension("test.pdf"), Some("pdf".to_string()));
        assert_eq!(get_file_extension("test.PDF"), Some("pdf".to_string()));
        assert_eq!(get_file_extension("test"), None);
        assert_eq!(get_file_extension("test.tar.gz"), Some("gz".to_string()));
    }

    #[test]
    fn test_supported_document() {
        assert!(is_supported_document("book.pdf"));
        assert!(is_supported_document("notes.txt"));
        assert!(!is_supported_document("README.md"));
        assert!(!is_supported_document("image.jpg"));
    }

    #[test]
    fn test_file_size_formatting() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_normalize_path() {
        let temp_file = NamedTempFile::new().unwrap();
        let normalized = normalize_path(temp_file.path()).unwrap();
        assert!(normalized.is_absolute());
        assert!(matches!(
            normalize_path("/definitely/not/here.pdf"),
            Err(ChunkerError::Config(_))
        ));
    }

    #[test]
    fn test_filename_sanitization() {
        assert_eq!(sanitize_filename("normal_file.txt"), "normal_file.txt");
        assert_eq!(
            sanitize_filename("file/with\\bad:chars*?.txt"),
            "file_with_bad_chars__.txt"
        );
    }

    #[test]
    fn test_book_id_from_path() {
        assert_eq!(book_id_from_path("/library/rust_in_action.pdf"), "rust_in_action");
        assert_eq!(book_id_from_path("notes.v2.txt"), "notes.v2");
        assert_eq!(book_id_from_path(""), "book");
    }
}
