//! Structural splitting of oversized plans
//!
//! A plan over the token ceiling is cut only where one of its sections'
//! direct children begins. Parts still over the ceiling are cut again at
//! their own children's starts; a part with nothing left to cut at is kept
//! whole.

use super::ChunkPlan;
use crate::outline::{ResolvedOutline, Section};
use crate::text::PageTokenMeter;

struct Part {
    start: u32,
    end: u32,
    members: Vec<usize>,
}

/// Split `plan` if its estimate exceeds `max_tokens`
pub fn split_oversized(
    plan: ChunkPlan,
    outline: &ResolvedOutline,
    meter: &PageTokenMeter,
    max_tokens: usize,
) -> Vec<ChunkPlan> {
    if plan.token_estimate <= max_tokens {
        return vec![plan];
    }

    let mut parts = Vec::new();
    cut(
        outline,
        meter,
        max_tokens,
        plan.start_page,
        plan.end_page_exclusive,
        &plan.members,
        &mut parts,
    );

    if parts.len() <= 1 {
        log::info!(
            "'{}' has {} tokens but no inner section boundary; keeping it whole",
            plan.title,
            plan.token_estimate
        );
        return vec![plan];
    }

    log::debug!("Splitting '{}' into {} parts", plan.title, parts.len());
    parts
        .into_iter()
        .enumerate()
        .map(|(n, part)| into_plan(&plan, n + 1, part, outline, meter))
        .collect()
}

fn cut(
    outline: &ResolvedOutline,
    meter: &PageTokenMeter,
    max_tokens: usize,
    start: u32,
    end: u32,
    members: &[usize],
    parts: &mut Vec<Part>,
) {
    let mut candidates: Vec<usize> = Vec::new();
    for &member in members {
        candidates.push(member);
        candidates.extend(outline.sections[member].children.iter().copied());
    }
    candidates.sort_unstable();
    candidates.dedup();

    let mut bounds: Vec<u32> = candidates
        .iter()
        .map(|&index| outline.sections[index].start_page)
        .filter(|&page| page > start && page < end)
        .collect();
    if bounds.is_empty() {
        parts.push(Part {
            start,
            end,
            members: members.to_vec(),
        });
        return;
    }
    bounds.push(start);
    bounds.push(end);
    bounds.sort_unstable();
    bounds.dedup();

    for window in bounds.windows(2) {
        let (a, b) = (window[0], window[1]);
        // The first window also owns sections whose start was clipped upwards
        let lower = if a == start { 0 } else { a };
        let inside: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&index| {
                let page = outline.sections[index].start_page;
                page >= lower && page < b
            })
            .collect();

        if meter.tokens(a, b) > max_tokens {
            cut(outline, meter, max_tokens, a, b, &inside, parts);
        } else {
            parts.push(Part {
                start: a,
                end: b,
                members: inside,
            });
        }
    }
}

fn into_plan(
    plan: &ChunkPlan,
    number: usize,
    part: Part,
    outline: &ResolvedOutline,
    meter: &PageTokenMeter,
) -> ChunkPlan {
    let sections: Vec<&Section> = part
        .members
        .iter()
        .map(|&index| &outline.sections[index])
        .collect();

    let (title, heading) = if number == 1 {
        (plan.title.clone(), plan.heading.clone())
    } else {
        (
            format!("{} (Part {})", plan.title, number),
            sections
                .iter()
                .find(|section| section.start_page == part.start)
                .map(|section| section.title.clone()),
        )
    };

    let mut original_titles: Vec<String> = sections.iter().map(|s| s.title.clone()).collect();
    if original_titles.is_empty() {
        original_titles.push(plan.title.clone());
    }

    let mut related_paths: Vec<String> = Vec::new();
    for section in &sections {
        let breadcrumb = section.breadcrumb();
        if section.path != plan.path && !related_paths.contains(&breadcrumb) {
            related_paths.push(breadcrumb);
        }
    }

    ChunkPlan {
        title,
        original_titles,
        path: plan.path.clone(),
        depth: plan.depth,
        parent: plan.parent,
        start_page: part.start,
        end_page_exclusive: part.end,
        token_estimate: meter.tokens(part.start, part.end),
        related_paths,
        heading,
        members: part.members,
    }
}
