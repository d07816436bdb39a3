//! Unit extraction
//!
//! Every kept section contributes its own content range as one unit, in
//! document order. The units are then settled into a strictly increasing,
//! non-overlapping sequence.

use super::ChunkPlan;
use crate::classify::Verdict;
use crate::outline::{ResolvedOutline, Section, SectionOrigin};
use crate::text::PageTokenMeter;

/// Non-overlapping content units in document order
pub fn build_units(
    outline: &ResolvedOutline,
    verdicts: &[Verdict],
    meter: &PageTokenMeter,
) -> Vec<ChunkPlan> {
    // Sections are stored in pre-order, which is document order
    let raw: Vec<ChunkPlan> = outline
        .sections
        .iter()
        .enumerate()
        .filter(|(index, section)| {
            verdicts.get(*index).is_some_and(Verdict::is_keep)
                && section.end_page_exclusive > section.start_page
        })
        .map(|(index, section)| unit(section, index))
        .collect();

    let mut units = settle(raw);
    for unit in &mut units {
        unit.token_estimate = meter.tokens(unit.start_page, unit.end_page_exclusive);
    }
    units
}

fn unit(section: &Section, index: usize) -> ChunkPlan {
    ChunkPlan {
        title: section.title.clone(),
        original_titles: vec![section.title.clone()],
        path: section.path.clone(),
        depth: section.depth,
        parent: section.parent,
        start_page: section.start_page,
        end_page_exclusive: section.end_page_exclusive,
        token_estimate: 0,
        related_paths: Vec::new(),
        heading: (section.origin == SectionOrigin::Outline).then(|| section.title.clone()),
        members: vec![index],
    }
}

/// Clip each unit at the next one's start and raise starts above the
/// previous end; zero-length units hand their heading to the next unit
fn settle(raw: Vec<ChunkPlan>) -> Vec<ChunkPlan> {
    let mut settled: Vec<ChunkPlan> = Vec::with_capacity(raw.len());
    let mut pending: Option<ChunkPlan> = None;
    let mut floor = 1;

    for k in 0..raw.len() {
        let mut unit = raw[k].clone();

        if unit.start_page < floor {
            unit.start_page = floor;
            unit.heading = None;
        }
        if let Some(next) = raw.get(k + 1) {
            if next.start_page >= unit.start_page && next.start_page < unit.end_page_exclusive {
                unit.end_page_exclusive = next.start_page;
            }
        }

        if unit.end_page_exclusive < unit.start_page {
            log::warn!(
                "Dropping '{}': range {}..{} is behind earlier content",
                unit.breadcrumb(),
                raw[k].start_page,
                raw[k].end_page_exclusive
            );
            continue;
        }

        if let Some(previous) = pending.take() {
            unit = fold_into(previous, unit);
        }

        if unit.end_page_exclusive == unit.start_page {
            pending = Some(unit);
            continue;
        }

        floor = unit.end_page_exclusive;
        settled.push(unit);
    }

    if let Some(orphan) = pending {
        log::warn!(
            "Dropping zero-length section '{}' at page {}",
            orphan.breadcrumb(),
            orphan.start_page
        );
    }
    settled
}

/// Hand a zero-length unit over to the unit that follows it on the same page
fn fold_into(degenerate: ChunkPlan, mut unit: ChunkPlan) -> ChunkPlan {
    if degenerate.start_page == unit.start_page && degenerate.heading.is_some() {
        unit.heading = degenerate.heading.clone();
    }

    let same_parent = degenerate.parent == unit.parent;
    if same_parent {
        let mut titles = degenerate.original_titles.clone();
        titles.append(&mut unit.original_titles);
        unit.title = titles.join(" - ");
        unit.original_titles = titles;
    } else {
        log::warn!(
            "Section '{}' shares page {} with '{}' under a different parent; attributing its text to the latter",
            degenerate.breadcrumb(),
            unit.start_page,
            unit.breadcrumb()
        );
    }

    unit.add_related(degenerate.breadcrumb());
    for related in degenerate.related_paths {
        unit.add_related(related);
    }
    unit.members.splice(0..0, degenerate.members);
    unit
}
