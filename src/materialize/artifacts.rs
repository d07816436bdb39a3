//! Per-chunk page-range artifacts

use crate::error::{ChunkerError, Result};
use lopdf::Document;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A page range to persist for one chunk
#[derive(Debug, Clone, Copy)]
pub struct ArtifactRequest<'a> {
    pub book_id: &'a str,
    pub start_page: u32,
    /// Last page, inclusive
    pub end_page: u32,
    /// Last page copied into the artifact, past `end_page` when carried
    /// lead-in text comes from the following page
    pub text_end_page: u32,
}

impl ArtifactRequest<'_> {
    /// Deterministic artifact name for the range
    pub fn name(&self) -> String {
        format!("{}_{}_{}.pdf", self.book_id, self.start_page, self.end_page)
    }
}

/// Where an artifact was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub name: String,
    pub location: String,
}

/// Sink for per-chunk page-range artifacts
///
/// `store` is called concurrently from the materialization pool.
pub trait ArtifactStore: Send + Sync {
    fn init(&mut self) -> Result<()>;

    fn store(&self, request: &ArtifactRequest<'_>) -> Result<Option<ArtifactRef>>;

    fn close(&mut self) -> Result<()>;
}

/// Store that writes nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoArtifacts;

impl ArtifactStore for NoArtifacts {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn store(&self, _request: &ArtifactRequest<'_>) -> Result<Option<ArtifactRef>> {
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each chunk's pages as a standalone PDF cut from the source file
pub struct PageRangePdfWriter {
    source: Arc<Vec<u8>>,
    output_dir: PathBuf,
    written: AtomicUsize,
}

impl PageRangePdfWriter {
    pub fn new(source: Arc<Vec<u8>>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
            written: AtomicUsize::new(0),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl ArtifactStore for PageRangePdfWriter {
    fn init(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            ChunkerError::Artifact(format!(
                "Failed to create artifact directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;
        log::info!("Writing page-range PDFs to {}", self.output_dir.display());
        Ok(())
    }

    fn store(&self, request: &ArtifactRequest<'_>) -> Result<Option<ArtifactRef>> {
        let mut document = Document::load_mem(&self.source)?;
        let total_pages = document.get_pages().len() as u32;
        let last_page = request.text_end_page.max(request.end_page);
        if request.start_page < 1 || last_page > total_pages {
            return Err(ChunkerError::Artifact(format!(
                "Page range {}-{} outside document of {} pages",
                request.start_page, last_page, total_pages
            )));
        }

        let outside: Vec<u32> = (1..=total_pages)
            .filter(|page| *page < request.start_page || *page > last_page)
            .collect();
        document.delete_pages(&outside);
        document.prune_objects();

        let name = request.name();
        let path = self.output_dir.join(&name);
        document.save(&path).map_err(|e| {
            ChunkerError::Artifact(format!("Failed to save {}: {}", path.display(), e))
        })?;

        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(Some(ArtifactRef {
            name,
            location: path.display().to_string(),
        }))
    }

    fn close(&mut self) -> Result<()> {
        log::info!(
            "Wrote {} page-range PDFs",
            self.written.load(Ordering::Relaxed)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_name() {
        let request = ArtifactRequest {
            book_id: "rust_book",
            start_page: 12,
            end_page: 30,
            text_end_page: 31,
        };
        assert_eq!(request.name(), "rust_book_12_30.pdf");
    }

    #[test]
    fn test_no_artifacts() {
        let mut store = NoArtifacts;
        store.init().unwrap();
        let request = ArtifactRequest {
            book_id: "b",
            start_page: 1,
            end_page: 1,
            text_end_page: 1,
        };
        assert!(store.store(&request).unwrap().is_none());
        store.close().unwrap();
    }

    #[test]
    fn test_unparsable_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PageRangePdfWriter::new(Arc::new(b"not a pdf".to_vec()), dir.path());
        store.init().unwrap();
        let request = ArtifactRequest {
            book_id: "b",
            start_page: 1,
            end_page: 2,
            text_end_page: 2,
        };
        assert!(store.store(&request).is_err());
    }
}
