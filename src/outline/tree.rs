//! Outline tree reconstruction
//!
//! Nodes are stored in an arena and linked by index, so the tree is built once
//! with a single stack pass and never mutated afterwards.

use crate::document::OutlineEntry;
use serde::Serialize;

/// Index of a node in an [`OutlineTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic root
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A heading in the outline tree
#[derive(Debug, Clone, Serialize)]
pub struct OutlineNode {
    pub title: String,
    pub page: u32,
    pub depth: u32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Rooted outline hierarchy
#[derive(Debug, Clone, Serialize)]
pub struct OutlineTree {
    nodes: Vec<OutlineNode>,
}

impl OutlineTree {
    /// Build the tree from outline entries in document order
    ///
    /// An entry's parent is the most recent entry with a strictly smaller
    /// depth. Depth jumps attach to that entry rather than failing.
    pub fn build(entries: &[OutlineEntry]) -> Self {
        let mut nodes = vec![OutlineNode {
            title: "root".to_string(),
            page: 0,
            depth: 0,
            parent: None,
            children: Vec::new(),
        }];
        let mut stack = vec![NodeId::ROOT];
        let mut last_page = 0;

        for (position, entry) in entries.iter().enumerate() {
            let depth = if entry.depth == 0 {
                log::warn!("Outline entry '{}' has depth 0, treating as 1", entry.title);
                1
            } else {
                entry.depth
            };
            let page = entry.page.max(1);

            if page < last_page {
                log::warn!(
                    "Outline entry {} '{}' points at page {} after page {}",
                    position,
                    entry.title,
                    page,
                    last_page
                );
            }
            last_page = last_page.max(page);

            while let Some(&top) = stack.last() {
                if nodes[top.0].depth < depth {
                    break;
                }
                stack.pop();
            }
            // The root has depth 0 and is never popped.
            let parent = stack.last().copied().unwrap_or(NodeId::ROOT);

            if depth > nodes[parent.0].depth + 1 {
                log::warn!(
                    "Outline entry '{}' jumps from depth {} to {}",
                    entry.title,
                    nodes[parent.0].depth,
                    depth
                );
            }

            let id = NodeId(nodes.len());
            nodes.push(OutlineNode {
                title: entry.title.clone(),
                page,
                depth,
                parent: Some(parent),
                children: Vec::new(),
            });
            nodes[parent.0].children.push(id);
            stack.push(id);
        }

        Self { nodes }
    }

    pub fn root(&self) -> &OutlineNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &OutlineNode {
        &self.nodes[id.0]
    }

    /// Number of nodes, excluding the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-root nodes in pre-order
    ///
    /// Nodes are allocated in input order, which is also pre-order, so this is
    /// a plain walk over the arena.
    pub fn preorder(&self) -> impl Iterator<Item = (NodeId, &OutlineNode)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, node)| (NodeId(idx), node))
    }

    /// Titles from the top-level ancestor down to `id`
    pub fn path(&self, id: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == NodeId::ROOT {
                break;
            }
            let node = &self.nodes[node_id.0];
            path.push(node.title.clone());
            current = node.parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(raw: &[(u32, &str, u32)]) -> Vec<OutlineEntry> {
        raw.iter()
            .map(|&(depth, title, page)| OutlineEntry::new(depth, title, page))
            .collect()
    }

    #[test]
    fn test_nested_structure() {
        let tree = OutlineTree::build(&entries(&[
            (1, "Ch1", 1),
            (2, "1.1", 1),
            (2, "1.2", 5),
            (1, "Ch2", 11),
        ]));

        assert_eq!(tree.len(), 4);
        let top: Vec<&str> = tree
            .root()
            .children
            .iter()
            .map(|&id| tree.node(id).title.as_str())
            .collect();
        assert_eq!(top, vec!["Ch1", "Ch2"]);
        assert_eq!(tree.path(NodeId(3)), vec!["Ch1", "1.2"]);
    }

    #[test]
    fn test_preorder_reproduces_input_order() {
        let raw = [
            (1, "A", 1),
            (2, "A.1", 2),
            (3, "A.1.a", 2),
            (2, "A.2", 4),
            (1, "B", 6),
            (3, "B.x", 7),
            (2, "B.1", 8),
        ];
        let tree = OutlineTree::build(&entries(&raw));
        let titles: Vec<&str> = tree.preorder().map(|(_, n)| n.title.as_str()).collect();
        let expected: Vec<&str> = raw.iter().map(|r| r.1).collect();
        assert_eq!(titles, expected);
    }

    #[test]
    fn test_depth_jump_attaches_to_nearest_shallower() {
        let tree = OutlineTree::build(&entries(&[(1, "Part I", 1), (3, "Deep", 2)]));
        let deep = tree.node(NodeId(2));
        assert_eq!(deep.parent, Some(NodeId(1)));
        assert_eq!(tree.path(NodeId(2)), vec!["Part I", "Deep"]);
    }

    #[test]
    fn test_path_grows_by_one_per_level() {
        let tree = OutlineTree::build(&entries(&[(1, "A", 1), (2, "B", 2), (3, "C", 3)]));
        for (id, node) in tree.preorder() {
            for &child in &node.children {
                assert_eq!(tree.path(child).len(), tree.path(id).len() + 1);
            }
        }
    }

    #[test]
    fn test_empty_outline() {
        let tree = OutlineTree::build(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.preorder().count(), 0);
    }
}
