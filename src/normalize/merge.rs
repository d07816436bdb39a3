//! Merge strategies for undersized units
//!
//! Both strategies only ever combine page-contiguous units that share an
//! immediate parent.

use super::{ChunkPlan, SizeLimits};
use crate::config::MergePolicyKind;

/// A strategy for combining small adjacent units
pub trait MergePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn merge(&self, units: Vec<ChunkPlan>, limits: &SizeLimits) -> Vec<ChunkPlan>;
}

/// Construct the configured merge strategy
pub fn policy_for(kind: MergePolicyKind) -> Box<dyn MergePolicy> {
    match kind {
        MergePolicyKind::GrowingRun => Box::new(GrowingRunMerge),
        MergePolicyKind::Pairwise => Box::new(PairwiseMerge),
    }
}

fn can_join(current: &ChunkPlan, next: &ChunkPlan) -> bool {
    current.parent == next.parent && current.end_page_exclusive == next.start_page
}

/// Grows a run of siblings until it reaches the minimum size
///
/// A run that ends up over `max_pages` or `max_tokens` is rolled back to its
/// first unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowingRunMerge;

impl MergePolicy for GrowingRunMerge {
    fn name(&self) -> &'static str {
        MergePolicyKind::GrowingRun.as_str()
    }

    fn merge(&self, units: Vec<ChunkPlan>, limits: &SizeLimits) -> Vec<ChunkPlan> {
        let mut merged = Vec::with_capacity(units.len());
        let mut i = 0;

        while i < units.len() {
            let mut current = units[i].clone();
            let mut next = i + 1;

            while next < units.len()
                && (current.page_count() < limits.min_pages
                    || current.token_estimate < limits.min_tokens)
            {
                let candidate = &units[next];
                if !can_join(&current, candidate)
                    || current.page_count() + candidate.page_count() > limits.max_pages
                {
                    break;
                }
                current.absorb(candidate);
                next += 1;
            }

            if next > i + 1 {
                if current.page_count() > limits.max_pages
                    || current.token_estimate > limits.max_tokens
                {
                    log::debug!(
                        "Rolling back merge at '{}': {} pages, {} tokens",
                        units[i].title,
                        current.page_count(),
                        current.token_estimate
                    );
                    current = units[i].clone();
                    next = i + 1;
                } else {
                    current.title = current.original_titles.join(" - ");
                }
            }

            merged.push(current);
            i = next;
        }

        merged
    }
}

/// Folds a single-page unit into the multi-page sibling right after it
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseMerge;

impl MergePolicy for PairwiseMerge {
    fn name(&self) -> &'static str {
        MergePolicyKind::Pairwise.as_str()
    }

    fn merge(&self, units: Vec<ChunkPlan>, _limits: &SizeLimits) -> Vec<ChunkPlan> {
        let mut merged = Vec::with_capacity(units.len());
        let mut iter = units.into_iter().peekable();

        while let Some(mut current) = iter.next() {
            let fold = iter.peek().is_some_and(|next| {
                current.page_count() <= 1 && next.page_count() > 1 && can_join(&current, next)
            });
            if fold {
                if let Some(next) = iter.next() {
                    current.absorb(&next);
                }
            }
            merged.push(current);
        }

        merged
    }
}
