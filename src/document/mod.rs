//! Document sources for the chunking engine
//!
//! A source exposes three things: the total page count, the flat outline and
//! the text of each page. Pages are numbered from 1 everywhere in this crate.

pub mod pdf;

pub use pdf::PdfDocument;

use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

/// One entry of a document's navigational table of contents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Nesting depth, 1 for top-level entries
    pub depth: u32,

    /// Heading title as stored in the outline
    pub title: String,

    /// 1-indexed page the heading points at
    pub page: u32,
}

impl OutlineEntry {
    pub fn new(depth: u32, title: impl Into<String>, page: u32) -> Self {
        Self {
            depth,
            title: title.into(),
            page,
        }
    }
}

/// Read-only access to a parsed document
///
/// Sources must be shareable across the materialization worker pool.
pub trait DocumentSource: Send + Sync {
    /// Number of pages in the document
    fn total_pages(&self) -> u32;

    /// Outline entries in document order
    fn outline(&self) -> &[OutlineEntry];

    /// Text of a 1-indexed page
    fn page_text(&self, page: u32) -> Result<Cow<'_, str>>;

    /// Path the document was loaded from, if any
    fn source_path(&self) -> Option<&Path> {
        None
    }
}

/// A document held entirely in memory
///
/// Used for plain-text inputs and for driving the engine without a PDF.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<String>,
    outline: Vec<OutlineEntry>,
}

impl MemoryDocument {
    /// Create a document from page texts and an outline
    pub fn new(pages: Vec<String>, outline: Vec<OutlineEntry>) -> Self {
        Self { pages, outline }
    }

    /// Split plain text into pages on form feed characters
    pub fn from_text(text: &str) -> Self {
        let pages = text.split('\x0C').map(str::to_string).collect();
        Self {
            pages,
            outline: Vec::new(),
        }
    }

    /// Read a plain-text file, one page per form-feed separated block
    pub fn from_text_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ChunkerError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Ok(Self::from_text(&text))
    }

    /// Replace the outline
    pub fn with_outline(mut self, outline: Vec<OutlineEntry>) -> Self {
        self.outline = outline;
        self
    }

    /// Replace the outline with entries read from a JSON array file
    ///
    /// Depths and pages are 1-based; an entry with either at zero is rejected.
    pub fn with_outline_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<OutlineEntry> = serde_json::from_str(&content).map_err(|e| {
            ChunkerError::Outline(format!("Invalid outline file {}: {}", path.display(), e))
        })?;

        if let Some((position, entry)) = entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.depth == 0 || entry.page == 0)
        {
            return Err(ChunkerError::Outline(format!(
                "Entry {} ('{}') in {} has depth {} and page {}; both start at 1",
                position,
                entry.title,
                path.display(),
                entry.depth,
                entry.page
            )));
        }

        Ok(self.with_outline(entries))
    }
}

impl DocumentSource for MemoryDocument {
    fn total_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    fn outline(&self) -> &[OutlineEntry] {
        &self.outline
    }

    fn page_text(&self, page: u32) -> Result<Cow<'_, str>> {
        page.checked_sub(1)
            .and_then(|idx| self.pages.get(idx as usize))
            .map(|text| Cow::Borrowed(text.as_str()))
            .ok_or_else(|| {
                ChunkerError::TextProcessing(format!(
                    "Page {} out of range (1..={})",
                    page,
                    self.pages.len()
                ))
            })
    }
}

/// Join the text of an exclusive page range with newlines
pub fn range_text<D: DocumentSource + ?Sized>(
    source: &D,
    start_page: u32,
    end_page_exclusive: u32,
) -> Result<String> {
    let last = end_page_exclusive.min(source.total_pages() + 1);
    let mut parts = Vec::new();
    for page in start_page.max(1)..last {
        parts.push(source.page_text(page)?.into_owned());
    }
    Ok(parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_file_entries_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"[{"depth": 1, "title": "One", "page": 1}]"#).unwrap();
        let doc = MemoryDocument::from_text("one")
            .with_outline_file(&good)
            .unwrap();
        assert_eq!(doc.outline(), &[OutlineEntry::new(1, "One", 1)]);

        let zero_page = dir.path().join("zero.json");
        std::fs::write(&zero_page, r#"[{"depth": 1, "title": "One", "page": 0}]"#).unwrap();
        let err = MemoryDocument::from_text("one")
            .with_outline_file(&zero_page)
            .unwrap_err();
        assert!(matches!(err, ChunkerError::Outline(ref msg) if msg.contains("'One'")));

        let malformed = dir.path().join("bad.json");
        std::fs::write(&malformed, r#"{"title": "One"}"#).unwrap();
        assert!(matches!(
            MemoryDocument::from_text("one").with_outline_file(&malformed),
            Err(ChunkerError::Outline(_))
        ));
    }

    #[test]
    fn test_from_text_splits_on_form_feed() {
        let doc = MemoryDocument::from_text("first page\x0Csecond page\x0Cthird");
        assert_eq!(doc.total_pages(), 3);
        assert_eq!(doc.page_text(2).unwrap(), "second page");
        assert!(doc.outline().is_empty());
    }

    #[test]
    fn test_page_out_of_range() {
        let doc = MemoryDocument::from_text("only page");
        assert!(doc.page_text(0).is_err());
        assert!(doc.page_text(2).is_err());
    }

    #[test]
    fn test_range_text_clamps_to_document() {
        let doc = MemoryDocument::from_text("a\x0Cb\x0Cc");
        assert_eq!(range_text(&doc, 2, 10).unwrap(), "b\nc");
        assert_eq!(range_text(&doc, 3, 3).unwrap(), "");
    }
}
