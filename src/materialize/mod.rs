//! Chunk materialization
//!
//! Turns chunk plans into final chunks: extracts text with heading-offset
//! refinement, counts tokens and writes page-range artifacts. Plans are
//! independent of each other and run on a bounded rayon pool; each job fills
//! its own result slot so output order never depends on completion order.

pub mod artifacts;

pub use artifacts::{ArtifactRef, ArtifactRequest, ArtifactStore, NoArtifacts, PageRangePdfWriter};

use crate::document::DocumentSource;
use crate::error::{ChunkerError, Result};
use crate::normalize::ChunkPlan;
use crate::text::{HeadingLocator, TokenCounter};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A finished chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub chunk_id: String,
    pub title: String,
    pub original_titles: Vec<String>,
    pub path: Vec<String>,
    pub breadcrumb: String,
    pub depth: u32,
    /// First page, 1-indexed inclusive
    pub start_page: u32,
    /// Last page, 1-indexed inclusive
    pub end_page: u32,
    /// Last page whose text appears in `text`; `end_page + 1` when the lead-in
    /// above the next section's heading was carried into this chunk
    pub text_end_page: u32,
    pub page_count: u32,
    pub token_count: usize,
    pub text: String,
    pub related_paths: Vec<String>,
    pub artifact: Option<ArtifactRef>,
}

/// A plan whose chunk could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializationFailure {
    pub title: String,
    pub start_page: u32,
    pub end_page: u32,
    pub error: String,
}

/// Result of materializing a batch of plans
#[derive(Debug, Default)]
pub struct MaterializeOutcome {
    pub chunks: Vec<Chunk>,
    pub empty_count: usize,
    pub failures: Vec<MaterializationFailure>,
}

/// Chunk text together with the last page it was taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub text_end_page: u32,
}

enum Slot {
    Done(Chunk),
    Empty,
    Failed(MaterializationFailure),
}

/// Produces chunks from plans on a worker pool
pub struct Materializer<'a> {
    counter: &'a TokenCounter,
    locator: HeadingLocator,
    workers: usize,
    show_progress: bool,
}

impl<'a> Materializer<'a> {
    pub fn new(counter: &'a TokenCounter, workers: usize) -> Result<Self> {
        Ok(Self {
            counter,
            locator: HeadingLocator::new()?,
            workers: workers.max(1),
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Materialize every plan, collecting per-chunk failures
    pub fn run<D: DocumentSource + ?Sized>(
        &self,
        plans: &[ChunkPlan],
        source: &D,
        book_id: &str,
        store: &dyn ArtifactStore,
    ) -> Result<MaterializeOutcome> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| ChunkerError::Generic(format!("Failed to build worker pool: {}", e)))?;

        let progress = self.progress_bar(plans.len());
        let slots: Vec<Slot> = pool.install(|| {
            (0..plans.len())
                .into_par_iter()
                .map(|k| {
                    let slot = self.materialize_one(plans, k, source, book_id, store);
                    progress.inc(1);
                    slot
                })
                .collect()
        });
        progress.finish_and_clear();

        let mut outcome = MaterializeOutcome::default();
        for slot in slots {
            match slot {
                Slot::Done(mut chunk) => {
                    chunk.index = outcome.chunks.len();
                    outcome.chunks.push(chunk);
                }
                Slot::Empty => outcome.empty_count += 1,
                Slot::Failed(failure) => outcome.failures.push(failure),
            }
        }

        log::info!(
            "Materialized {} chunks ({} empty, {} failed)",
            outcome.chunks.len(),
            outcome.empty_count,
            outcome.failures.len()
        );
        Ok(outcome)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} chunks ({eta})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    }

    fn materialize_one<D: DocumentSource + ?Sized>(
        &self,
        plans: &[ChunkPlan],
        k: usize,
        source: &D,
        book_id: &str,
        store: &dyn ArtifactStore,
    ) -> Slot {
        let plan = &plans[k];
        match self.build_chunk(plans, k, source, book_id, store) {
            Ok(Some(chunk)) => Slot::Done(chunk),
            Ok(None) => {
                log::debug!(
                    "Dropping empty chunk '{}' (pages {}-{})",
                    plan.title,
                    plan.start_page,
                    plan.end_page()
                );
                Slot::Empty
            }
            Err(e) => {
                log::warn!(
                    "Failed to materialize '{}' (pages {}-{}): {}",
                    plan.title,
                    plan.start_page,
                    plan.end_page(),
                    e
                );
                Slot::Failed(MaterializationFailure {
                    title: plan.title.clone(),
                    start_page: plan.start_page,
                    end_page: plan.end_page(),
                    error: e.to_string(),
                })
            }
        }
    }

    fn build_chunk<D: DocumentSource + ?Sized>(
        &self,
        plans: &[ChunkPlan],
        k: usize,
        source: &D,
        book_id: &str,
        store: &dyn ArtifactStore,
    ) -> Result<Option<Chunk>> {
        let plan = &plans[k];
        let next = plans
            .get(k + 1)
            .filter(|next| next.start_page == plan.end_page_exclusive);
        let ExtractedText {
            text,
            text_end_page,
        } = self.extract_text(plan, next, source)?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        let token_count = self.counter.count(&text)?;
        let request = ArtifactRequest {
            book_id,
            start_page: plan.start_page,
            end_page: plan.end_page(),
            text_end_page,
        };
        let artifact = store.store(&request)?;

        Ok(Some(Chunk {
            index: k,
            chunk_id: format!("{}_{}_{}", book_id, plan.start_page, plan.end_page()),
            title: plan.title.clone(),
            original_titles: plan.original_titles.clone(),
            path: plan.path.clone(),
            breadcrumb: plan.breadcrumb(),
            depth: plan.depth,
            start_page: plan.start_page,
            end_page: plan.end_page(),
            text_end_page,
            page_count: plan.page_count(),
            token_count,
            text,
            related_paths: plan.related_paths.clone(),
            artifact,
        }))
    }

    /// Text of the plan's pages, starting at its heading on the first page
    /// and carrying the next plan's lead-in from the following page
    pub fn extract_text<D: DocumentSource + ?Sized>(
        &self,
        plan: &ChunkPlan,
        next: Option<&ChunkPlan>,
        source: &D,
    ) -> Result<ExtractedText> {
        let mut pieces: Vec<String> = Vec::with_capacity(plan.page_count() as usize + 1);

        for page in plan.start_page..plan.end_page_exclusive {
            let text = source.page_text(page)?;
            if page == plan.start_page {
                if let Some(offset) = self.heading_offset(plan, &text) {
                    pieces.push(text[offset..].to_string());
                    continue;
                }
            }
            pieces.push(text.into_owned());
        }

        let mut text_end_page = plan.end_page();
        if let Some(next) = next {
            let text = source.page_text(next.start_page)?;
            if let Some(offset) = self.heading_offset(next, &text) {
                let lead_in = &text[..offset];
                if !lead_in.trim().is_empty() {
                    pieces.push(lead_in.to_string());
                    text_end_page = next.start_page;
                }
            }
        }

        Ok(ExtractedText {
            text: pieces.join("\n"),
            text_end_page,
        })
    }

    fn heading_offset(&self, plan: &ChunkPlan, page_text: &str) -> Option<usize> {
        let heading = plan.heading.as_deref()?;
        let found = self.locator.locate(page_text, heading);
        if found.is_none() {
            log::debug!(
                "Heading '{}' not found on page {}, using the whole page",
                heading,
                plan.start_page
            );
        }
        found.map(|m| m.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;

    fn plan(title: &str, start: u32, end: u32) -> ChunkPlan {
        ChunkPlan {
            title: title.to_string(),
            original_titles: vec![title.to_string()],
            path: vec![title.to_string()],
            depth: 1,
            parent: None,
            start_page: start,
            end_page_exclusive: end,
            token_estimate: 0,
            related_paths: Vec::new(),
            heading: Some(title.to_string()),
            members: Vec::new(),
        }
    }

    fn doc() -> MemoryDocument {
        MemoryDocument::from_text(
            "running header\nAlpha\nalpha body one\x0Calpha body two\nBeta\nbeta body\x0Cbeta end\x0C\x0C   \x0Cgamma",
        )
    }

    #[test]
    fn test_heading_refinement_and_carry() {
        let counter = TokenCounter::approximate();
        let materializer = Materializer::new(&counter, 2).unwrap();
        let source = doc();
        let alpha = plan("Alpha", 1, 2);
        let beta = plan("Beta", 2, 4);

        let extracted = materializer.extract_text(&alpha, Some(&beta), &source).unwrap();
        assert!(extracted.text.starts_with("Alpha\nalpha body one"));
        assert!(extracted.text.ends_with("alpha body two\n"));
        assert!(!extracted.text.contains("running header"));
        assert_eq!(extracted.text_end_page, 2);

        let extracted = materializer.extract_text(&beta, None, &source).unwrap();
        assert!(extracted.text.starts_with("Beta\nbeta body"));
        assert!(extracted.text.contains("beta end"));
        assert!(!extracted.text.contains("alpha body two"));
        assert_eq!(extracted.text_end_page, 3);
    }

    #[test]
    fn test_carried_lead_in_is_recorded_on_the_chunk() {
        let counter = TokenCounter::approximate();
        let materializer = Materializer::new(&counter, 1).unwrap();
        let source = MemoryDocument::from_text(
            "Alpha\nalpha one\x0Calpha two\x0Calpha tail\nBeta\nbeta body\x0Cbeta end",
        );
        let plans = vec![plan("Alpha", 1, 3), plan("Beta", 3, 5)];

        let outcome = materializer.run(&plans, &source, "book", &NoArtifacts).unwrap();
        let alpha = &outcome.chunks[0];
        assert!(alpha.text.ends_with("alpha tail\n"));
        assert_eq!((alpha.start_page, alpha.end_page), (1, 2));
        assert_eq!(alpha.text_end_page, 3);
        assert_eq!(alpha.chunk_id, "book_1_2");

        let beta = &outcome.chunks[1];
        assert_eq!((beta.start_page, beta.end_page, beta.text_end_page), (3, 4, 4));
        assert!(!beta.text.contains("alpha tail"));
    }

    #[test]
    fn test_run_orders_and_counts() {
        let counter = TokenCounter::approximate();
        let materializer = Materializer::new(&counter, 3).unwrap();
        let source = doc();
        let plans = vec![
            plan("Alpha", 1, 2),
            plan("Beta", 2, 4),
            plan("Blank", 4, 6),
            plan("Gamma", 6, 7),
        ];

        let outcome = materializer.run(&plans, &source, "book", &NoArtifacts).unwrap();
        assert_eq!(outcome.empty_count, 1);
        assert!(outcome.failures.is_empty());
        let ids: Vec<&str> = outcome.chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["book_1_1", "book_2_3", "book_6_6"]);
        let indices: Vec<usize> = outcome.chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(outcome.chunks[1].page_count, 2);
        assert_eq!(outcome.chunks[2].text, "gamma");
        assert_eq!(outcome.chunks[2].token_count, 1);
    }

    struct FailingStore;

    impl ArtifactStore for FailingStore {
        fn init(&mut self) -> Result<()> {
            Ok(())
        }

        fn store(&self, request: &ArtifactRequest<'_>) -> Result<Option<ArtifactRef>> {
            if request.start_page == 2 {
                return Err(ChunkerError::Artifact("disk full".to_string()));
            }
            Ok(None)
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failure_does_not_abort_siblings() {
        let counter = TokenCounter::approximate();
        let materializer = Materializer::new(&counter, 2).unwrap();
        let source = doc();
        let plans = vec![plan("Alpha", 1, 2), plan("Beta", 2, 4), plan("Gamma", 6, 7)];

        let outcome = materializer.run(&plans, &source, "book", &FailingStore).unwrap();
        assert_eq!(outcome.chunks.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].title, "Beta");
        assert!(outcome.failures[0].error.contains("disk full"));
    }
}
