//! Breadth-first reconstruction of a tree from flat records

use super::{DialogTree, NodeIdx, TreeNode};
use crate::record::DialogNode;
use std::collections::VecDeque;

impl DialogTree {
    /// Build a tree from a workspace's dialog nodes.
    ///
    /// Children are attached level by level by matching `parent` against the
    /// frontier node's id (`None` for the synthetic root). Attach order is not
    /// dialog order; use [`DialogTree::ordered_children`] for that.
    pub fn from_records(records: &[DialogNode]) -> Self {
        let mut tree = DialogTree::new();
        let mut frontier: VecDeque<NodeIdx> = VecDeque::from([DialogTree::ROOT]);

        while let Some(parent) = frontier.pop_front() {
            // every record placed once; anything more means duplicated ids forming a loop
            if tree.nodes.len() > records.len() {
                break;
            }
            let parent_id = tree.node(parent).id.clone();
            for record in records
                .iter()
                .filter(|r| r.parent.as_deref() == parent_id.as_deref())
            {
                let child = tree.attach(parent, TreeNode::from_record(record.clone()));
                frontier.push_back(child);
            }
        }

        let orphans = records.len().saturating_sub(tree.attached_len());
        if orphans > 0 {
            tracing::warn!(
                "{} dialog node(s) reference a missing parent and were left out of the tree",
                orphans
            );
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_nested_structure() {
        let tree = DialogTree::from_records(&[
            DialogNode::new("child").with_parent("top"),
            DialogNode::new("top").titled("Top"),
            DialogNode::new("grandchild").with_parent("child"),
        ]);

        assert_eq!(tree.attached_len(), 3);
        let top = tree.children(DialogTree::ROOT)[0];
        assert_eq!(tree.node(top).description, "Top");
        let child = tree.children(top)[0];
        assert_eq!(tree.node(child).id.as_deref(), Some("child"));
        assert_eq!(tree.children(child).len(), 1);
    }

    #[test]
    fn test_orphans_are_skipped() {
        let tree = DialogTree::from_records(&[
            DialogNode::new("a"),
            DialogNode::new("lost").with_parent("nowhere"),
        ]);
        assert_eq!(tree.attached_len(), 1);
    }

    #[test]
    fn test_empty_export_is_bare_root() {
        let tree = DialogTree::from_records(&[]);
        assert_eq!(tree.attached_len(), 0);
        assert_eq!(tree.node(DialogTree::ROOT).description, "root");
    }
}
