//! Repairing jumps that point outside a grafted branch
//!
//! A copied branch may jump to nodes the destination does not have. For each
//! missing destination we find its ancestor chain in the source tree, take the
//! deepest ancestor the destination already has, and graft the next node down
//! that chain (with its whole subtree) as that ancestor's last child. Newly
//! grafted subtrees can carry jumps of their own, so targets go through a work
//! queue until nothing new turns up.

use super::{DialogTree, InsertMode, MatchOn, NodeIdx};
use crate::error::{Error, Result};
use std::collections::{HashSet, VecDeque};

/// What jump resolution had to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JumpReport {
    /// Ids of the source subtrees grafted in, in graft order
    pub grafted: Vec<String>,
    /// Jump targets the destination already contained
    pub already_present: usize,
}

/// Graft whatever the branch at `inserted` needs for its jumps to resolve
pub fn resolve_jumps(dest: &mut DialogTree, source: &DialogTree, inserted: NodeIdx) -> Result<JumpReport> {
    let mut queue: VecDeque<String> = jump_targets(dest, inserted).into();
    let mut seen: HashSet<String> = HashSet::new();
    let mut report = JumpReport::default();

    while let Some(target) = queue.pop_front() {
        if !seen.insert(target.to_lowercase()) {
            continue;
        }
        if !dest.find_by_id(&target).is_empty() {
            report.already_present += 1;
            continue;
        }

        let jump_node = source
            .locate_branch(&target, MatchOn::Id, "source")
            .map_err(|err| match err {
                Error::NotFound { .. } => Error::not_found(target.clone(), "source (jump destination)"),
                other => other,
            })?;

        // [target, parent, grandparent, ...]; the target itself is known missing
        let chain = source.ancestors(jump_node);
        let mut anchor = DialogTree::ROOT;
        let mut graft_from = chain.last().copied().unwrap_or(jump_node);
        for depth in (1..chain.len()).rev() {
            let ancestor_id = source.node(chain[depth]).id.clone().unwrap_or_default();
            match dest.find_by_id(&ancestor_id).as_slice() {
                [] => {}
                [present] => {
                    anchor = *present;
                    graft_from = chain[depth - 1];
                }
                _ => return Err(Error::ambiguous(ancestor_id, "target")),
            }
        }

        let copy = dest.graft(source, graft_from, anchor, InsertMode::LastChild)?;
        let grafted_id = dest.node(copy).id.clone().unwrap_or_default();
        tracing::info!(
            "jump to '{}' resolved by copying '{}' under '{}'",
            target,
            grafted_id,
            dest.node(anchor).description
        );
        report.grafted.push(grafted_id);
        queue.extend(jump_targets(dest, copy));
    }

    Ok(report)
}

/// Jump destinations referenced anywhere in the subtree at `idx`
pub fn jump_targets(tree: &DialogTree, idx: NodeIdx) -> Vec<String> {
    tree.descendants(idx)
        .into_iter()
        .filter_map(|i| tree.node(i).jump_target().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DialogNode;

    fn idx(tree: &DialogTree, id: &str) -> NodeIdx {
        tree.find_by_id(id)[0]
    }

    fn order(tree: &DialogTree, parent: NodeIdx) -> Vec<String> {
        tree.ordered_children(parent)
            .into_iter()
            .map(|i| tree.node(i).id.clone().unwrap())
            .collect()
    }

    /// root -> n (jumps to j); root -> p1 -> p2 -> j; root -> else
    fn source() -> DialogTree {
        DialogTree::from_records(&[
            DialogNode::new("n").titled("Start order").jumping_to("j"),
            DialogNode::new("p1").titled("Ordering").after("n"),
            DialogNode::new("p2").with_parent("p1").titled("Sizes"),
            DialogNode::new("j").with_parent("p2").titled("Ask size"),
            DialogNode::new("else").after("p1").when("anything_else"),
        ])
    }

    fn graft_n(dest: &mut DialogTree, src: &DialogTree) -> NodeIdx {
        dest.graft(src, idx(src, "n"), DialogTree::ROOT, InsertMode::Child)
            .unwrap()
    }

    #[test]
    fn test_grafts_under_deepest_shared_ancestor() {
        let src = source();
        let mut dest = DialogTree::from_records(&[
            DialogNode::new("p1").titled("Ordering"),
            DialogNode::new("p1_a").with_parent("p1"),
        ]);
        let inserted = graft_n(&mut dest, &src);

        let report = resolve_jumps(&mut dest, &src, inserted).unwrap();

        assert_eq!(report.grafted, vec!["p2"]);
        let p1 = idx(&dest, "p1");
        assert_eq!(order(&dest, p1), vec!["p1_a", "p2"]);
        assert_eq!(dest.find_by_id("j").len(), 1);
    }

    #[test]
    fn test_grafts_top_level_ancestor_when_nothing_shared() {
        let src = source();
        let mut dest = DialogTree::from_records(&[
            DialogNode::new("welcome"),
            DialogNode::new("fallback").after("welcome").when("anything_else"),
        ]);
        let inserted = graft_n(&mut dest, &src);

        let report = resolve_jumps(&mut dest, &src, inserted).unwrap();

        assert_eq!(report.grafted, vec!["p1"]);
        assert_eq!(
            order(&dest, DialogTree::ROOT),
            vec!["n", "welcome", "p1", "fallback"]
        );
    }

    #[test]
    fn test_follows_jumps_inside_grafted_subtrees() {
        let src = DialogTree::from_records(&[
            DialogNode::new("n").jumping_to("j"),
            DialogNode::new("p1").after("n"),
            DialogNode::new("j").with_parent("p1").jumping_to("k"),
            DialogNode::new("q").after("p1"),
            DialogNode::new("k").with_parent("q"),
        ]);
        let mut dest = DialogTree::new();
        let inserted = graft_n(&mut dest, &src);

        let report = resolve_jumps(&mut dest, &src, inserted).unwrap();

        assert_eq!(report.grafted, vec!["p1", "q"]);
        assert_eq!(dest.attached_len(), 5);
    }

    #[test]
    fn test_present_targets_are_left_alone() {
        let src = source();
        let mut dest = DialogTree::from_records(&[DialogNode::new("j")]);
        let inserted = graft_n(&mut dest, &src);

        let report = resolve_jumps(&mut dest, &src, inserted).unwrap();

        assert!(report.grafted.is_empty());
        assert_eq!(report.already_present, 1);
        assert_eq!(dest.attached_len(), 2);
    }

    #[test]
    fn test_jump_cycles_terminate() {
        let src = DialogTree::from_records(&[
            DialogNode::new("n").jumping_to("a"),
            DialogNode::new("a").after("n").jumping_to("b"),
            DialogNode::new("b").after("a").jumping_to("a"),
        ]);
        let mut dest = DialogTree::new();
        let inserted = graft_n(&mut dest, &src);

        let report = resolve_jumps(&mut dest, &src, inserted).unwrap();

        assert_eq!(report.grafted, vec!["a", "b"]);
        assert!(report.grafted.len() <= src.attached_len());
    }

    #[test]
    fn test_dangling_jump_is_fatal() {
        let src = DialogTree::from_records(&[DialogNode::new("n").jumping_to("ghost")]);
        let mut dest = DialogTree::new();
        let inserted = graft_n(&mut dest, &src);

        let err = resolve_jumps(&mut dest, &src, inserted).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref identifier, .. } if identifier == "ghost"));
    }
}
