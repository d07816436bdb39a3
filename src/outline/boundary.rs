//! Page boundary resolution
//!
//! Every outline node becomes a [`Section`] carrying two exclusive end pages:
//! where its own prose stops (at its first later-starting child) and where its
//! whole subtree stops (at the next sibling or ancestor's sibling).

use super::tree::{NodeId, OutlineTree};
use crate::document::OutlineEntry;
use serde::Serialize;

/// Title of the section synthesized for documents without an outline
pub const FULL_DOCUMENT_TITLE: &str = "Full Document";

/// Title of the section covering pages before the first outline entry
pub const FRONT_MATTER_TITLE: &str = "Front Matter";

/// Where a section came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionOrigin {
    /// A real outline entry
    Outline,
    /// Pages preceding the first outline entry
    FrontMatter,
    /// The whole document, used when there is no outline
    FullDocument,
}

/// An outline node with resolved page boundaries
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub node: NodeId,
    pub title: String,
    /// Ancestor titles from the top level down to this section
    pub path: Vec<String>,
    pub depth: u32,
    /// First page, 1-indexed inclusive
    pub start_page: u32,
    /// End of the section's own prose, exclusive
    pub end_page_exclusive: u32,
    /// End of the section including all descendants, exclusive
    pub subtree_end_exclusive: u32,
    /// Index of the parent section, `None` for top-level sections
    pub parent: Option<usize>,
    /// Indices of direct child sections in document order
    pub children: Vec<usize>,
    pub origin: SectionOrigin,
}

impl Section {
    /// Path without the last element, i.e. the immediate parent's path
    pub fn parent_path(&self) -> &[String] {
        &self.path[..self.path.len().saturating_sub(1)]
    }

    /// Pages of the section's own prose
    pub fn own_pages(&self) -> u32 {
        self.end_page_exclusive.saturating_sub(self.start_page)
    }

    pub fn breadcrumb(&self) -> String {
        self.path.join(" > ")
    }
}

/// The outline tree together with its flattened, boundary-annotated sections
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedOutline {
    pub tree: OutlineTree,
    /// Sections in document order
    pub sections: Vec<Section>,
    pub total_pages: u32,
}

impl ResolvedOutline {
    /// Build the tree, flatten it and resolve every boundary
    pub fn resolve(entries: &[OutlineEntry], total_pages: u32) -> Self {
        if total_pages == 0 {
            return Self {
                tree: OutlineTree::build(&[]),
                sections: Vec::new(),
                total_pages,
            };
        }

        if entries.is_empty() {
            let tree = OutlineTree::build(&[OutlineEntry::new(1, FULL_DOCUMENT_TITLE, 1)]);
            let mut sections = flatten(&tree, total_pages);
            sections[0].origin = SectionOrigin::FullDocument;
            return Self {
                tree,
                sections,
                total_pages,
            };
        }

        let mut entries = entries.to_vec();
        let has_prelude = entries[0].page > 1;
        if has_prelude {
            let depth = entries[0].depth.max(1);
            entries.insert(0, OutlineEntry::new(depth, FRONT_MATTER_TITLE, 1));
        }

        let tree = OutlineTree::build(&entries);
        let mut sections = flatten(&tree, total_pages);
        if has_prelude {
            sections[0].origin = SectionOrigin::FrontMatter;
        }
        resolve_ends(&mut sections, total_pages);

        Self {
            tree,
            sections,
            total_pages,
        }
    }

    /// True when a section's first child starts on the section's own page,
    /// leaving the section no prose of its own
    pub fn is_container(&self, index: usize) -> bool {
        let section = &self.sections[index];
        section
            .children
            .first()
            .is_some_and(|&child| self.sections[child].start_page <= section.start_page)
    }
}

// Arena order is pre-order, so section `i` is node `i + 1`.
fn flatten(tree: &OutlineTree, total_pages: u32) -> Vec<Section> {
    tree.preorder()
        .map(|(id, node)| Section {
            node: id,
            title: node.title.clone(),
            path: tree.path(id),
            depth: node.depth,
            start_page: node.page.clamp(1, total_pages),
            end_page_exclusive: total_pages + 1,
            subtree_end_exclusive: total_pages + 1,
            parent: node
                .parent
                .filter(|&parent| parent != NodeId::ROOT)
                .map(|parent| parent.index() - 1),
            children: node.children.iter().map(|child| child.index() - 1).collect(),
            origin: SectionOrigin::Outline,
        })
        .collect()
}

fn resolve_ends(sections: &mut [Section], total_pages: u32) {
    let document_end = total_pages + 1;

    for i in 0..sections.len() {
        let start = sections[i].start_page;
        let depth = sections[i].depth;

        let subtree_end = sections[i + 1..]
            .iter()
            .find(|later| later.start_page > start && later.depth <= depth)
            .map(|later| later.start_page)
            .unwrap_or(document_end);

        let own_end = sections[i]
            .children
            .iter()
            .map(|&child| sections[child].start_page)
            .find(|&page| page > start)
            .unwrap_or(subtree_end);

        sections[i].subtree_end_exclusive = subtree_end.max(start);
        sections[i].end_page_exclusive = own_end.max(start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(raw: &[(u32, &str, u32)], total: u32) -> ResolvedOutline {
        let entries: Vec<OutlineEntry> = raw
            .iter()
            .map(|&(depth, title, page)| OutlineEntry::new(depth, title, page))
            .collect();
        ResolvedOutline::resolve(&entries, total)
    }

    fn bounds(outline: &ResolvedOutline) -> Vec<(&str, u32, u32, u32)> {
        outline
            .sections
            .iter()
            .map(|s| {
                (
                    s.title.as_str(),
                    s.start_page,
                    s.end_page_exclusive,
                    s.subtree_end_exclusive,
                )
            })
            .collect()
    }

    #[test]
    fn test_shared_first_page_with_child() {
        let outline = resolve(&[(1, "Ch1", 1), (2, "1.1", 1), (2, "1.2", 5)], 10);
        assert_eq!(
            bounds(&outline),
            vec![("Ch1", 1, 5, 11), ("1.1", 1, 5, 5), ("1.2", 5, 11, 11)]
        );
        assert!(outline.is_container(0));
        assert!(!outline.is_container(1));
    }

    #[test]
    fn test_parent_prose_ends_at_first_child() {
        let outline = resolve(
            &[(1, "Ch1", 3), (2, "1.1", 5), (2, "1.2", 8), (1, "Ch2", 12)],
            20,
        );
        let b = bounds(&outline);
        assert_eq!(b[0], (FRONT_MATTER_TITLE, 1, 3, 3));
        assert_eq!(b[1], ("Ch1", 3, 5, 12));
        assert_eq!(b[2], ("1.1", 5, 8, 8));
        assert_eq!(b[3], ("1.2", 8, 12, 12));
        assert_eq!(b[4], ("Ch2", 12, 21, 21));
        assert_eq!(outline.sections[0].origin, SectionOrigin::FrontMatter);
    }

    #[test]
    fn test_same_page_siblings_extend_past_each_other() {
        let outline = resolve(&[(1, "A", 1), (1, "B", 1), (1, "C", 4)], 6);
        let b = bounds(&outline);
        assert_eq!(b[0], ("A", 1, 4, 4));
        assert_eq!(b[1], ("B", 1, 4, 4));
    }

    #[test]
    fn test_empty_outline_is_full_document() {
        let outline = resolve(&[], 50);
        assert_eq!(outline.sections.len(), 1);
        let section = &outline.sections[0];
        assert_eq!(section.title, FULL_DOCUMENT_TITLE);
        assert_eq!(section.start_page, 1);
        assert_eq!(section.end_page_exclusive, 51);
        assert_eq!(section.origin, SectionOrigin::FullDocument);
    }

    #[test]
    fn test_pages_clamped_to_document() {
        let outline = resolve(&[(1, "A", 1), (1, "Ghost", 99)], 5);
        assert_eq!(bounds(&outline)[1], ("Ghost", 5, 6, 6));
        assert_eq!(bounds(&outline)[0], ("A", 1, 5, 5));
    }

    #[test]
    fn test_parent_links() {
        let outline = resolve(&[(1, "A", 1), (2, "A.1", 2), (2, "A.2", 3)], 4);
        assert_eq!(outline.sections[0].children, vec![1, 2]);
        assert_eq!(outline.sections[2].parent, Some(0));
        assert_eq!(outline.sections[2].parent_path(), ["A".to_string()]);
        assert!(outline.sections[0].parent.is_none());
    }
}
