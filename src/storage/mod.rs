//! Storage functionality for book-chunker
//!
//! This module persists run results: a JSON report per book and an embedded
//! SQLite index across books.

pub mod database;
pub mod report;
pub mod schema;

// Re-export main types
pub use database::{BookRecord, Database, DatabaseStats};
pub use report::{ChunkReport, ReportMetadata, ReportParameters};
