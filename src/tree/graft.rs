//! Grafting a copied branch into a destination tree
//!
//! A graft runs in four steps:
//! 1. purge destination nodes whose ids collide with the incoming branch,
//!    stitching each hole in the sibling chain closed;
//! 2. deep-copy the branch so the source tree is never touched;
//! 3. splice the copy in at the anchor according to [`InsertMode`];
//! 4. clear digression settings unless the copy lands beside a top-level node.

use super::{DialogTree, NodeIdx};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Where a grafted branch goes relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// First child of the anchor
    Child,
    /// Last child of the anchor, ahead of any catch-all child
    LastChild,
    /// Immediately after the anchor, under the same parent
    Sibling,
}

impl InsertMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertMode::Child => "child",
            InsertMode::LastChild => "last_child",
            InsertMode::Sibling => "sibling",
        }
    }

    /// Parse a mode name. With `lenient`, unknown names fall back to `child`.
    pub fn parse(text: &str, lenient: bool) -> Result<Self> {
        match text.parse::<InsertMode>() {
            Ok(mode) => Ok(mode),
            Err(_) if lenient => {
                tracing::warn!("invalid insert mode '{}', defaulting to child", text);
                Ok(InsertMode::Child)
            }
            Err(err) => Err(err),
        }
    }
}

impl FromStr for InsertMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "child" => Ok(InsertMode::Child),
            "last_child" => Ok(InsertMode::LastChild),
            "sibling" => Ok(InsertMode::Sibling),
            other => Err(Error::Validation(format!(
                "insert mode must be one of 'child', 'last_child' or 'sibling', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for InsertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DialogTree {
    /// Remove every attached node whose id is in `ids`.
    ///
    /// The removed node's next sibling is re-pointed at the removed node's own
    /// previous sibling (or made first). Returns the ids actually removed.
    pub fn purge_collisions(&mut self, ids: &[String]) -> Vec<String> {
        let mut removed = Vec::new();
        for id in ids {
            for existing in self.find_by_id(id) {
                let previous = self
                    .previous_sibling(existing)
                    .and_then(|p| self.node(p).id.clone());
                let next = self.next_sibling(existing);
                self.detach(existing);
                if let Some(next) = next {
                    self.set_previous_sibling(next, previous);
                }
                tracing::debug!("removed colliding node '{}'", id);
                if let Some(existing_id) = self.node(existing).id.clone() {
                    removed.push(existing_id);
                }
            }
        }
        removed
    }

    /// Copy `branch` out of `source` and splice it in relative to `target`.
    ///
    /// Returns the index of the copy's top node in this tree.
    pub fn graft(
        &mut self,
        source: &DialogTree,
        branch: NodeIdx,
        target: NodeIdx,
        mode: InsertMode,
    ) -> Result<NodeIdx> {
        let Some(branch_id) = source.node(branch).id.clone() else {
            return Err(Error::Validation(
                "the dialog root cannot be copied; import the whole workspace instead".to_string(),
            ));
        };

        let incoming: Vec<String> = source
            .descendants(branch)
            .into_iter()
            .filter_map(|idx| source.node(idx).id.clone())
            .collect();
        let removed = self.purge_collisions(&incoming);
        if !removed.is_empty() {
            tracing::info!(
                "removed {} existing node(s) that collide with branch '{}'",
                removed.len(),
                branch_id
            );
        }

        if !self.is_attached(target) {
            return Err(Error::AnchorRemoved {
                id: self.node(target).id.clone().unwrap_or_default(),
            });
        }

        let mode = if self.is_root(target) && mode == InsertMode::Sibling {
            tracing::warn!(
                "only 'child' and 'last_child' inserts are possible at the dialog root; using child"
            );
            InsertMode::Child
        } else {
            mode
        };

        let target_id = self.node(target).id.clone();
        let copy = match mode {
            InsertMode::Child => {
                let displaced = self.first_child(target);
                let copy = self.copy_subtree(source, branch, target);
                self.place(copy, target_id, None);
                if let Some(displaced) = displaced {
                    self.set_previous_sibling(displaced, Some(branch_id.clone()));
                }
                copy
            }
            InsertMode::LastChild => {
                let (previous, displaced) = match self.first_child(target) {
                    None => (None, None),
                    // a lone leading catch-all still has to stay last
                    Some(first) if self.node(first).is_catch_all() => (None, Some(first)),
                    Some(first) => {
                        let last = self.last_nonterminal_sibling(first);
                        (Some(last), self.next_sibling(last))
                    }
                };
                let previous_id = previous.and_then(|p| self.node(p).id.clone());
                let copy = self.copy_subtree(source, branch, target);
                self.place(copy, target_id, previous_id);
                if let Some(displaced) = displaced {
                    self.set_previous_sibling(displaced, Some(branch_id.clone()));
                }
                copy
            }
            InsertMode::Sibling => {
                let displaced = self.next_sibling(target);
                let parent = self.parent(target).unwrap_or(DialogTree::ROOT);
                let parent_id = self.node(target).parent_id().map(str::to_string);
                let copy = self.copy_subtree(source, branch, parent);
                self.place(copy, parent_id, target_id);
                if let Some(displaced) = displaced {
                    self.set_previous_sibling(displaced, Some(branch_id.clone()));
                }
                copy
            }
        };

        let beside_top_level = mode == InsertMode::Sibling && self.parent(target) == Some(DialogTree::ROOT);
        if !beside_top_level {
            if let Some(record) = self.record_mut(copy) {
                record.clear_digressions();
            }
        }

        tracing::info!(
            "grafted '{}' as {} of '{}'",
            branch_id,
            mode,
            self.node(target).description
        );
        Ok(copy)
    }

    fn place(&mut self, idx: NodeIdx, parent: Option<String>, previous_sibling: Option<String>) {
        if let Some(record) = self.record_mut(idx) {
            record.parent = parent;
            record.previous_sibling = previous_sibling;
        }
    }

    fn set_previous_sibling(&mut self, idx: NodeIdx, previous_sibling: Option<String>) {
        if let Some(record) = self.record_mut(idx) {
            record.previous_sibling = previous_sibling;
        }
    }
}
