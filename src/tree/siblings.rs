//! Sibling order recovered from `previous_sibling` pointers
//!
//! These are the only functions that decide dialog order. Nothing else may
//! rely on the arena's child vectors or on export array order.

use super::{DialogTree, NodeIdx};

impl DialogTree {
    /// Child of `idx` with no previous sibling
    pub fn first_child(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.children(idx)
            .iter()
            .copied()
            .find(|&child| self.node(child).previous_sibling_id().is_none())
    }

    /// Sibling whose `previous_sibling` points at `idx`
    pub fn next_sibling(&self, idx: NodeIdx) -> Option<NodeIdx> {
        let id = self.node(idx).id.as_deref()?;
        let parent = self.parent(idx)?;
        self.children(parent)
            .iter()
            .copied()
            .find(|&sibling| self.node(sibling).previous_sibling_id() == Some(id))
    }

    /// Sibling named by `idx`'s `previous_sibling`
    pub fn previous_sibling(&self, idx: NodeIdx) -> Option<NodeIdx> {
        let previous = self.node(idx).previous_sibling_id()?;
        let parent = self.parent(idx)?;
        self.children(parent)
            .iter()
            .copied()
            .find(|&sibling| self.node(sibling).id.as_deref() == Some(previous))
    }

    /// Walk forward from `idx`, stopping before the first catch-all sibling
    pub fn last_nonterminal_sibling(&self, idx: NodeIdx) -> NodeIdx {
        let mut last = idx;
        let mut steps = 0;
        while let Some(next) = self.next_sibling(last) {
            if self.node(next).is_catch_all() || steps > self.nodes.len() {
                break;
            }
            last = next;
            steps += 1;
        }
        last
    }

    pub fn last_nonterminal_child(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.first_child(idx)
            .map(|first| self.last_nonterminal_sibling(first))
    }

    /// Children of `idx` in dialog order.
    ///
    /// Bounded by the number of attached children, so a looping chain ends
    /// instead of spinning.
    pub fn ordered_children(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        let limit = self.children(idx).len();
        let mut ordered = Vec::with_capacity(limit);
        let mut current = self.first_child(idx);
        while let Some(child) = current {
            if ordered.len() == limit {
                break;
            }
            ordered.push(child);
            current = self.next_sibling(child);
        }
        ordered
    }
}
