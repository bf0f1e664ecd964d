//! Finding nodes by id or title

use super::{DialogTree, NodeIdx};
use crate::error::{Error, Result};

/// Identifier that addresses the synthetic root of a tree
pub const ROOT_IDENTIFIER: &str = "root";

/// Which fields an identifier is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOn {
    /// Node id only; used when following references between nodes
    Id,
    /// Node id or title; used for identifiers typed by a person
    IdOrTitle,
}

impl DialogTree {
    /// All attached nodes matching `identifier`, in level order.
    ///
    /// Comparison is case-insensitive. The root sentinel never matches a real node.
    pub fn find(&self, identifier: &str, on: MatchOn) -> Vec<NodeIdx> {
        if identifier == ROOT_IDENTIFIER {
            return Vec::new();
        }
        let wanted = identifier.to_lowercase();
        self.descendants(DialogTree::ROOT)
            .into_iter()
            .filter(|&idx| {
                let node = self.node(idx);
                let Some(id) = node.id.as_deref() else {
                    return false;
                };
                if id.to_lowercase() == wanted {
                    return true;
                }
                on == MatchOn::IdOrTitle
                    && node
                        .record
                        .as_ref()
                        .and_then(|r| r.title.as_deref())
                        .map(|title| title.to_lowercase() == wanted)
                        .unwrap_or(false)
            })
            .collect()
    }

    pub fn find_by_id(&self, id: &str) -> Vec<NodeIdx> {
        self.find(id, MatchOn::Id)
    }

    /// Exactly one node matching `identifier`, or a NotFound/Ambiguous error
    pub fn locate_branch(&self, identifier: &str, on: MatchOn, tree_name: &str) -> Result<NodeIdx> {
        let matches = self.find(identifier, on);
        match matches.as_slice() {
            [] => Err(Error::not_found(identifier, tree_name)),
            [only] => Ok(*only),
            _ => Err(Error::ambiguous(identifier, tree_name)),
        }
    }

    /// Like [`DialogTree::locate_branch`] but `"root"` resolves to the synthetic root
    pub fn resolve_anchor(&self, identifier: &str, tree_name: &str) -> Result<NodeIdx> {
        if identifier == ROOT_IDENTIFIER {
            return Ok(DialogTree::ROOT);
        }
        self.locate_branch(identifier, MatchOn::IdOrTitle, tree_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DialogNode;

    fn sample() -> DialogTree {
        DialogTree::from_records(&[
            DialogNode::new("node_1").titled("Welcome"),
            DialogNode::new("node_2").titled("Order Pizza").after("node_1"),
            DialogNode::new("node_3").titled("Order Pizza").with_parent("node_2"),
            DialogNode::new("node_4").with_parent("node_2").after("node_3"),
        ])
    }

    #[test]
    fn test_find_by_id_is_case_insensitive() {
        let tree = sample();
        assert_eq!(tree.find_by_id("NODE_1").len(), 1);
        assert!(tree.find_by_id("Welcome").is_empty());
    }

    #[test]
    fn test_find_by_title() {
        let tree = sample();
        let found = tree.find("welcome", MatchOn::IdOrTitle);
        assert_eq!(found.len(), 1);
        assert_eq!(tree.node(found[0]).id.as_deref(), Some("node_1"));
    }

    #[test]
    fn test_root_sentinel_never_matches() {
        let tree = DialogTree::from_records(&[DialogNode::new("root_like").titled("root")]);
        assert!(tree.find(ROOT_IDENTIFIER, MatchOn::IdOrTitle).is_empty());
        assert_eq!(tree.resolve_anchor("root", "target").unwrap(), DialogTree::ROOT);
    }

    #[test]
    fn test_locate_branch_errors() {
        let tree = sample();
        assert!(matches!(
            tree.locate_branch("order pizza", MatchOn::IdOrTitle, "source"),
            Err(Error::Ambiguous { .. })
        ));
        assert!(matches!(
            tree.locate_branch("missing", MatchOn::IdOrTitle, "source"),
            Err(Error::NotFound { .. })
        ));
        let idx = tree.locate_branch("node_4", MatchOn::Id, "source").unwrap();
        assert_eq!(tree.node(idx).description, "no label");
    }
}
