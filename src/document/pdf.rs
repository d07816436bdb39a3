//! PDF document source
//!
//! The outline and page tree come from `lopdf`; page text comes from
//! `pdf-extract`, falling back to lopdf's own extractor page by page.

use super::{DocumentSource, OutlineEntry};
use crate::error::{ChunkerError, Result};
use lopdf::Document;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A PDF loaded into memory with per-page text extracted up front
pub struct PdfDocument {
    path: PathBuf,
    bytes: Arc<Vec<u8>>,
    outline: Vec<OutlineEntry>,
    pages: Vec<String>,
}

impl PdfDocument {
    /// Open and parse a PDF file
    ///
    /// A missing or unreadable file is a configuration error: nothing has been
    /// processed yet when it is raised.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChunkerError::Config(format!(
                "PDF file not found: {}",
                path.display()
            )));
        }

        let bytes = std::fs::read(path).map_err(|e| {
            ChunkerError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let document = Document::load_mem(&bytes).map_err(|e| {
            ChunkerError::Config(format!("Cannot parse PDF {}: {}", path.display(), e))
        })?;

        let page_count = document.get_pages().len();
        let outline = read_outline(&document);
        let pages = extract_pages(&document, &bytes, page_count);

        log::info!(
            "Opened {}: {} pages, {} outline entries",
            path.display(),
            page_count,
            outline.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            bytes: Arc::new(bytes),
            outline,
            pages,
        })
    }

    /// Raw bytes of the source file, shared with artifact writers
    pub fn bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.bytes)
    }
}

impl DocumentSource for PdfDocument {
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
                ChunkerError::Pdf(format!(
                    "Page {} out of range in {} ({} pages)",
                    page,
                    self.path.display(),
                    self.pages.len()
                ))
            })
    }

    fn source_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

fn read_outline(document: &Document) -> Vec<OutlineEntry> {
    match document.get_toc() {
        Ok(toc) => {
            // Some writers number outline levels from zero.
            let shift = match toc.toc.iter().map(|entry| entry.level).min() {
                Some(0) => 1,
                _ => 0,
            };
            toc.toc
                .into_iter()
                .map(|entry| OutlineEntry {
                    depth: (entry.level + shift) as u32,
                    title: entry.title.trim().to_string(),
                    page: entry.page as u32,
                })
                .collect()
        }
        Err(e) => {
            log::info!("No usable outline ({}), treating document as unstructured", e);
            Vec::new()
        }
    }
}

fn extract_pages(document: &Document, bytes: &[u8], page_count: usize) -> Vec<String> {
    match pdf_extract::extract_text_from_mem_by_pages(bytes) {
        Ok(pages) if pages.len() == page_count => return pages,
        Ok(pages) => log::warn!(
            "pdf-extract returned {} pages for a {}-page document, using lopdf extraction",
            pages.len(),
            page_count
        ),
        Err(e) => log::warn!("pdf-extract failed ({}), using lopdf extraction", e),
    }

    (1..=page_count as u32)
        .map(|page| {
            document.extract_text(&[page]).unwrap_or_else(|e| {
                log::warn!("No text extracted from page {}: {}", page, e);
                String::new()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_configuration_error() {
        let result = PdfDocument::open("/definitely/not/here.pdf");
        assert!(matches!(result, Err(ChunkerError::Config(_))));
    }

    #[test]
    fn test_garbage_is_configuration_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"This is not a PDF").unwrap();
        assert!(matches!(
            PdfDocument::open(file.path()),
            Err(ChunkerError::Config(_))
        ));
    }
}
