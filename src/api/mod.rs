//! API layer for book-chunker
//!
//! This module provides the main public interface for turning a structured
//! document into chunks.

pub mod analytics;
pub mod chunker;

// Re-export main API types
pub use analytics::{PageRangeAnalytics, PageRangeEntry};
pub use chunker::{BookChunker, ChunkingOutput, ChunkingPlan, ChunkingSummary};
