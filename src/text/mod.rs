//! Text processing for book-chunker
//!
//! This module provides heading location on page text and token counting.

pub mod heading;
pub mod tokens;

// Re-export main types
pub use heading::{HeadingLocator, HeadingMatch, MatchMethod};
pub use tokens::{PageTokenMeter, TokenCounter};
