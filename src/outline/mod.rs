//! Outline processing for book-chunker
//!
//! This module turns a flat outline into a tree and resolves the page
//! boundaries of every node.

pub mod boundary;
pub mod tree;

// Re-export main types
pub use boundary::{
    FRONT_MATTER_TITLE, FULL_DOCUMENT_TITLE, ResolvedOutline, Section, SectionOrigin,
};
pub use tree::{NodeId, OutlineNode, OutlineTree};
