//! Ordered dialog tree reconstructed from a flat export
//!
//! A workspace stores its dialog as a flat list of records linked only by
//! `parent` and `previous_sibling`. [`DialogTree`] rebuilds the hierarchy into
//! an arena: index 0 is a synthetic root with no id and no record, and every
//! other slot owns its record exclusively. Sibling *order* is never taken from
//! the arena's child vectors; it is always recomputed from the pointers (see
//! the `siblings` module).
//!
//! Detached nodes stay in the arena but are unreachable from the root, so
//! indices handed out earlier remain valid for the lifetime of the tree.

mod builder;
pub mod graft;
pub mod jumps;
mod locate;
mod siblings;

pub use graft::InsertMode;
pub use jumps::{resolve_jumps, JumpReport};
pub use locate::{MatchOn, ROOT_IDENTIFIER};

use crate::record::DialogNode;
use std::collections::VecDeque;

/// Index of a node inside a [`DialogTree`]
pub type NodeIdx = usize;

/// One slot in the tree arena
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Node id; `None` only for the synthetic root
    pub id: Option<String>,
    /// Label used when drawing the tree
    pub description: String,
    /// The underlying record; `None` only for the synthetic root
    pub record: Option<DialogNode>,
    parent: Option<NodeIdx>,
    children: Vec<NodeIdx>,
}

impl TreeNode {
    fn from_record(record: DialogNode) -> Self {
        Self {
            id: Some(record.dialog_node.clone()),
            description: record.label(),
            record: Some(record),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Parent id stored on the record (`None` for top-level nodes)
    pub fn parent_id(&self) -> Option<&str> {
        self.record.as_ref().and_then(|r| r.parent.as_deref())
    }

    /// Previous-sibling id stored on the record
    pub fn previous_sibling_id(&self) -> Option<&str> {
        self.record.as_ref().and_then(|r| r.previous_sibling.as_deref())
    }

    pub fn is_catch_all(&self) -> bool {
        self.record.as_ref().map(|r| r.is_catch_all()).unwrap_or(false)
    }

    pub fn jump_target(&self) -> Option<&str> {
        self.record.as_ref().and_then(|r| r.jump_target())
    }
}

/// Arena-backed dialog tree rooted at a synthetic node
#[derive(Debug, Clone)]
pub struct DialogTree {
    nodes: Vec<TreeNode>,
}

impl Default for DialogTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogTree {
    /// Index of the synthetic root
    pub const ROOT: NodeIdx = 0;

    /// An empty tree holding only the synthetic root
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode {
                id: None,
                description: "root".to_string(),
                record: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn node(&self, idx: NodeIdx) -> &TreeNode {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIdx) -> &mut TreeNode {
        &mut self.nodes[idx]
    }

    /// Mutable access to a node's record (`None` for the synthetic root)
    pub fn record_mut(&mut self, idx: NodeIdx) -> Option<&mut DialogNode> {
        self.nodes[idx].record.as_mut()
    }

    pub fn parent(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.nodes[idx].parent
    }

    /// Attached children in arena order (not dialog order)
    pub fn children(&self, idx: NodeIdx) -> &[NodeIdx] {
        &self.nodes[idx].children
    }

    pub fn is_root(&self, idx: NodeIdx) -> bool {
        idx == Self::ROOT
    }

    /// True when `idx` can still be reached from the synthetic root
    pub fn is_attached(&self, idx: NodeIdx) -> bool {
        let mut current = idx;
        loop {
            if current == Self::ROOT {
                return true;
            }
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Number of real (non-root) nodes reachable from the root
    pub fn attached_len(&self) -> usize {
        self.descendants(Self::ROOT).len() - 1
    }

    /// `idx` and everything below it, in level order
    pub fn descendants(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        let mut order = Vec::new();
        let mut queue = VecDeque::from([idx]);
        while let Some(current) = queue.pop_front() {
            order.push(current);
            queue.extend(self.nodes[current].children.iter().copied());
        }
        order
    }

    /// `idx` followed by its ancestors, nearest first, excluding the synthetic root
    pub fn ancestors(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        let mut chain = Vec::new();
        let mut current = Some(idx);
        while let Some(node) = current {
            if node == Self::ROOT {
                break;
            }
            chain.push(node);
            current = self.nodes[node].parent;
        }
        chain
    }

    /// Add `node` under `parent`; returns the new index
    fn attach(&mut self, parent: NodeIdx, mut node: TreeNode) -> NodeIdx {
        let idx = self.nodes.len();
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent].children.push(idx);
        idx
    }

    /// Unlink `idx` from its parent. Sibling pointers are left to the caller.
    fn detach(&mut self, idx: NodeIdx) {
        if let Some(parent) = self.nodes[idx].parent.take() {
            self.nodes[parent].children.retain(|&child| child != idx);
        }
    }

    /// Deep-copy `branch` from `source` (records included) under `parent`
    fn copy_subtree(&mut self, source: &DialogTree, branch: NodeIdx, parent: NodeIdx) -> NodeIdx {
        let mut fresh = source.nodes[branch].clone();
        fresh.children = Vec::new();
        let copy = self.attach(parent, fresh);
        for &child in &source.nodes[branch].children {
            self.copy_subtree(source, child, copy);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DialogTree {
        DialogTree::from_records(&[
            DialogNode::new("a"),
            DialogNode::new("b").after("a"),
            DialogNode::new("a1").with_parent("a"),
            DialogNode::new("a2").with_parent("a").after("a1"),
        ])
    }

    #[test]
    fn test_descendants_are_level_ordered() {
        let tree = sample();
        let ids: Vec<_> = tree
            .descendants(DialogTree::ROOT)
            .into_iter()
            .map(|i| tree.node(i).id.clone())
            .collect();
        assert_eq!(ids[0], None);
        assert_eq!(ids.len(), 5);
        // a and b come before any grandchild
        let pos = |id: &str| ids.iter().position(|x| x.as_deref() == Some(id)).unwrap();
        assert!(pos("b") < pos("a1"));
        assert!(pos("a") < pos("a2"));
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let tree = sample();
        let a2 = tree.find_by_id("a2")[0];
        let chain: Vec<_> = tree
            .ancestors(a2)
            .into_iter()
            .map(|i| tree.node(i).id.clone().unwrap())
            .collect();
        assert_eq!(chain, vec!["a2", "a"]);
    }

    #[test]
    fn test_detach_makes_subtree_unreachable() {
        let mut tree = sample();
        let a = tree.find_by_id("a")[0];
        let a1 = tree.find_by_id("a1")[0];
        tree.detach(a);
        assert!(!tree.is_attached(a));
        assert!(!tree.is_attached(a1));
        assert_eq!(tree.attached_len(), 1);
    }

    #[test]
    fn test_copy_subtree_is_independent() {
        let source = sample();
        let mut dest = DialogTree::new();
        let a = source.find_by_id("a")[0];
        let copy = dest.copy_subtree(&source, a, DialogTree::ROOT);
        dest.record_mut(copy).unwrap().title = Some("changed".to_string());

        assert_eq!(dest.attached_len(), 3);
        assert_eq!(source.node(a).record.as_ref().unwrap().title, None);
    }
}
