//! Error types for book-chunker
//!
//! This module provides error handling for every stage of a chunking run,
//! from opening the source document to writing chunk artifacts and indexes.

use thiserror::Error;

/// Main error type for chunking operations
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Configuration errors, raised before any processing starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// PDF processing errors
    #[error("PDF processing error: {0}")]
    Pdf(String),

    /// Outline structure errors
    #[error("Outline error: {0}")]
    Outline(String),

    /// Tokenizer loading or encoding errors
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Per-chunk artifact errors
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Database/storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Text processing errors
    #[error("Text processing error: {0}")]
    TextProcessing(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Built-in regular expression failed to compile
    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(String),
}

/// Result type alias for chunking operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

impl From<lopdf::Error> for ChunkerError {
    fn from(err: lopdf::Error) -> Self {
        ChunkerError::Pdf(err.to_string())
    }
}

impl From<anyhow::Error> for ChunkerError {
    fn from(err: anyhow::Error) -> Self {
        ChunkerError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ChunkerError::Config("min_pages (5) exceeds max_pages (2)".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: min_pages (5) exceeds max_pages (2)"
        );
    }

    #[test]
    fn test_error_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let chunker_error = ChunkerError::from(io_error);

        match chunker_error {
            ChunkerError::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_regex_error_conversion() {
        let err = regex::Regex::new("(unclosed").unwrap_err();
        assert!(matches!(ChunkerError::from(err), ChunkerError::Regex(_)));
    }
}
