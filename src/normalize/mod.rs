//! Size normalization
//!
//! Turns classified sections into chunk plans: non-overlapping page ranges
//! merged up towards the minimum size and split at structural boundaries
//! when they exceed the token ceiling. Planning is pure and deterministic;
//! no text is extracted here beyond the per-page token estimates.

pub mod merge;
pub mod split;
pub mod units;

pub use merge::{GrowingRunMerge, MergePolicy, PairwiseMerge, policy_for};
pub use split::split_oversized;
pub use units::build_units;

use crate::classify::Verdict;
use crate::config::ChunkingConfig;
use crate::outline::ResolvedOutline;
use crate::text::PageTokenMeter;
use serde::Serialize;

/// Page and token bounds applied while merging and splitting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    pub min_pages: u32,
    pub max_pages: u32,
    pub min_tokens: usize,
    pub max_tokens: usize,
}

impl From<&ChunkingConfig> for SizeLimits {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            min_pages: config.min_pages,
            max_pages: config.max_pages,
            min_tokens: config.min_tokens,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self::from(&ChunkingConfig::default())
    }
}

/// A planned chunk: a page range plus the outline identity it carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkPlan {
    pub title: String,
    /// Titles of every outline entry folded into this plan, in order
    pub original_titles: Vec<String>,
    pub path: Vec<String>,
    pub depth: u32,
    /// Section index of the immediate parent
    #[serde(skip)]
    pub parent: Option<usize>,
    pub start_page: u32,
    pub end_page_exclusive: u32,
    pub token_estimate: usize,
    /// Breadcrumbs of contributing entries whose path differs from `path`
    pub related_paths: Vec<String>,
    /// Title to locate on the first page, if any
    pub heading: Option<String>,
    /// Sections whose ranges start inside this plan
    #[serde(skip)]
    pub members: Vec<usize>,
}

impl ChunkPlan {
    pub fn page_count(&self) -> u32 {
        self.end_page_exclusive.saturating_sub(self.start_page)
    }

    /// Last page, inclusive
    pub fn end_page(&self) -> u32 {
        self.end_page_exclusive.saturating_sub(1).max(self.start_page)
    }

    pub fn breadcrumb(&self) -> String {
        self.path.join(" > ")
    }

    /// Extend this plan over the directly following `next`, keeping this
    /// plan's title and path
    pub fn absorb(&mut self, next: &ChunkPlan) {
        self.end_page_exclusive = self.end_page_exclusive.max(next.end_page_exclusive);
        self.token_estimate += next.token_estimate;
        self.original_titles.extend(next.original_titles.iter().cloned());
        self.members.extend(next.members.iter().copied());
        self.depth = self.depth.min(next.depth);

        if next.path != self.path {
            self.add_related(next.breadcrumb());
        }
        for related in &next.related_paths {
            self.add_related(related.clone());
        }
    }

    fn add_related(&mut self, breadcrumb: String) {
        if breadcrumb != self.breadcrumb() && !self.related_paths.contains(&breadcrumb) {
            self.related_paths.push(breadcrumb);
        }
    }
}

/// Build, merge and split chunk plans for a classified outline
pub fn normalize(
    outline: &ResolvedOutline,
    verdicts: &[Verdict],
    meter: &PageTokenMeter,
    limits: &SizeLimits,
    policy: &dyn MergePolicy,
) -> Vec<ChunkPlan> {
    let units = build_units(outline, verdicts, meter);
    let unit_count = units.len();

    let merged = policy.merge(units, limits);
    let merged_count = merged.len();

    let plans: Vec<ChunkPlan> = merged
        .into_iter()
        .flat_map(|plan| split_oversized(plan, outline, meter, limits.max_tokens))
        .collect();

    log::info!(
        "Planned {} chunks ({} units, {} after {} merge)",
        plans.len(),
        unit_count,
        merged_count,
        policy.name()
    );
    plans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(title: &str, path: &[&str], start: u32, end: u32) -> ChunkPlan {
        ChunkPlan {
            title: title.to_string(),
            original_titles: vec![title.to_string()],
            path: path.iter().map(|s| s.to_string()).collect(),
            depth: path.len() as u32,
            parent: None,
            start_page: start,
            end_page_exclusive: end,
            token_estimate: 10,
            related_paths: Vec::new(),
            heading: Some(title.to_string()),
            members: Vec::new(),
        }
    }

    #[test]
    fn test_page_bounds() {
        let p = plan("A", &["A"], 3, 6);
        assert_eq!(p.page_count(), 3);
        assert_eq!(p.end_page(), 5);
    }

    #[test]
    fn test_absorb_tracks_related_paths() {
        let mut first = plan("1.1", &["Ch1", "1.1"], 1, 2);
        first.absorb(&plan("1.2", &["Ch1", "1.2"], 2, 4));
        first.absorb(&plan("1.1", &["Ch1", "1.1"], 4, 5));

        assert_eq!(first.title, "1.1");
        assert_eq!(first.end_page_exclusive, 5);
        assert_eq!(first.token_estimate, 30);
        assert_eq!(first.original_titles, vec!["1.1", "1.2", "1.1"]);
        assert_eq!(first.related_paths, vec!["Ch1 > 1.2"]);
    }

    #[test]
    fn test_limits_from_config() {
        let limits = SizeLimits::default();
        assert_eq!(limits.min_pages, 2);
        assert_eq!(limits.max_pages, 25);
        assert_eq!(limits.min_tokens, 300);
        assert_eq!(limits.max_tokens, 6000);
    }
}
