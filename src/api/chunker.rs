//! BookChunker - Main chunking API
//!
//! This provides the high-level interface that runs the whole pipeline over a
//! document source: outline resolution, classification, size normalization
//! and chunk materialization.

use crate::api::analytics::PageRangeAnalytics;
use crate::classify::{ContentClassifier, ExcludedSection, Verdict};
use crate::config::Config;
use crate::document::DocumentSource;
use crate::error::Result;
use crate::materialize::{ArtifactStore, Chunk, MaterializationFailure, Materializer};
use crate::normalize::{ChunkPlan, MergePolicy, SizeLimits, normalize, policy_for};
use crate::outline::ResolvedOutline;
use crate::text::{PageTokenMeter, TokenCounter};
use serde::{Deserialize, Serialize};

/// Aggregate figures for one chunking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingSummary {
    pub book_id: String,
    pub total_pages: u32,
    pub original_outline_entry_count: usize,
    pub excluded_section_count: usize,
    pub empty_chunk_count: usize,
    pub failed_chunk_count: usize,
    pub final_chunk_count: usize,
    pub average_pages_per_chunk: f64,
    pub average_tokens_per_chunk: f64,
    pub merge_policy: String,
    pub exclusion_policy: String,
    pub token_counter: String,
}

/// Everything a run produces
#[derive(Debug, Clone, Serialize)]
pub struct ChunkingOutput {
    pub summary: ChunkingSummary,
    pub chunks: Vec<Chunk>,
    pub excluded: Vec<ExcludedSection>,
    pub failures: Vec<MaterializationFailure>,
    pub analytics: Option<PageRangeAnalytics>,
}

/// The planning half of a run, before any text is extracted
#[derive(Debug, Clone)]
pub struct ChunkingPlan {
    pub outline: ResolvedOutline,
    pub verdicts: Vec<Verdict>,
    pub plans: Vec<ChunkPlan>,
}

impl ChunkingPlan {
    /// Sections the classifier dropped, in document order
    pub fn excluded_sections(&self) -> Vec<ExcludedSection> {
        self.outline
            .sections
            .iter()
            .zip(&self.verdicts)
            .filter_map(|(section, verdict)| match verdict {
                Verdict::Keep => None,
                Verdict::Exclude(reason) => Some(ExcludedSection {
                    title: section.title.clone(),
                    path: section.breadcrumb(),
                    start_page: section.start_page,
                    reason: reason.to_string(),
                }),
            })
            .collect()
    }
}

/// Structure-aware document chunker
pub struct BookChunker {
    config: Config,
    counter: TokenCounter,
    classifier: ContentClassifier,
    merge_policy: Box<dyn MergePolicy>,
    limits: SizeLimits,
}

impl BookChunker {
    /// Create a chunker, validating the configuration and loading the
    /// tokenizer up front
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let counter = TokenCounter::from_config(&config.tokenizer)?;
        let classifier = ContentClassifier::new(&config.exclusion)?;
        let merge_policy = policy_for(config.chunking.merge_policy);
        let limits = SizeLimits::from(&config.chunking);

        log::info!(
            "Chunker ready: pages {}..={}, tokens {}..={}, {} merge, {} exclusion, {} token counts",
            limits.min_pages,
            limits.max_pages,
            limits.min_tokens,
            limits.max_tokens,
            merge_policy.name(),
            config.exclusion.policy.as_str(),
            counter.name()
        );

        Ok(Self {
            config,
            counter,
            classifier,
            merge_policy,
            limits,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn token_counter(&self) -> &TokenCounter {
        &self.counter
    }

    /// Resolve and classify the document outline
    pub fn classify<D: DocumentSource + ?Sized>(
        &self,
        source: &D,
    ) -> Result<(ResolvedOutline, Vec<Verdict>)> {
        let outline = ResolvedOutline::resolve(source.outline(), source.total_pages());
        log::info!(
            "Resolved {} sections from {} outline entries over {} pages",
            outline.sections.len(),
            source.outline().len(),
            source.total_pages()
        );

        let verdicts = self.classifier.classify(&outline, source)?;
        Ok((outline, verdicts))
    }

    /// Plan chunk page ranges without extracting chunk text
    pub fn plan<D: DocumentSource + ?Sized>(&self, source: &D) -> Result<ChunkingPlan> {
        let (outline, verdicts) = self.classify(source)?;
        let meter = PageTokenMeter::measure(source, &self.counter)?;
        let plans = normalize(
            &outline,
            &verdicts,
            &meter,
            &self.limits,
            self.merge_policy.as_ref(),
        );

        Ok(ChunkingPlan {
            outline,
            verdicts,
            plans,
        })
    }

    /// Run the full pipeline, writing artifacts through `store`
    pub fn chunk_document<D: DocumentSource + ?Sized>(
        &self,
        source: &D,
        book_id: &str,
        store: &mut dyn ArtifactStore,
    ) -> Result<ChunkingOutput> {
        let plan = self.plan(source)?;
        let excluded = plan.excluded_sections();

        let materializer = Materializer::new(&self.counter, self.config.output.workers)?
            .with_progress(self.config.output.show_progress);

        store.init()?;
        let outcome = materializer.run(&plan.plans, source, book_id, &*store);
        store.close()?;
        let outcome = outcome?;

        let summary = self.summarize(
            book_id,
            source,
            &excluded,
            &outcome.chunks,
            outcome.empty_count,
            outcome.failures.len(),
        );
        let analytics = PageRangeAnalytics::from_chunks(&outcome.chunks);
        if let Some(analytics) = &analytics {
            analytics.log();
        }

        Ok(ChunkingOutput {
            summary,
            chunks: outcome.chunks,
            excluded,
            failures: outcome.failures,
            analytics,
        })
    }

    fn summarize<D: DocumentSource + ?Sized>(
        &self,
        book_id: &str,
        source: &D,
        excluded: &[ExcludedSection],
        chunks: &[Chunk],
        empty_chunk_count: usize,
        failed_chunk_count: usize,
    ) -> ChunkingSummary {
        let (average_pages_per_chunk, average_tokens_per_chunk) = if chunks.is_empty() {
            (0.0, 0.0)
        } else {
            let count = chunks.len() as f64;
            let pages: u64 = chunks.iter().map(|c| c.page_count as u64).sum();
            let tokens: u64 = chunks.iter().map(|c| c.token_count as u64).sum();
            (pages as f64 / count, tokens as f64 / count)
        };

        ChunkingSummary {
            book_id: book_id.to_string(),
            total_pages: source.total_pages(),
            original_outline_entry_count: source.outline().len(),
            excluded_section_count: excluded.len(),
            empty_chunk_count,
            failed_chunk_count,
            final_chunk_count: chunks.len(),
            average_pages_per_chunk,
            average_tokens_per_chunk,
            merge_policy: self.merge_policy.name().to_string(),
            exclusion_policy: self.classifier.policy().as_str().to_string(),
            token_counter: self.counter.name().to_string(),
        }
    }
}
