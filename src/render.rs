//! Rendering a dialog tree
//!
//! Two projections of a finished tree: the flat record list handed back to the
//! workspace store, and a box-drawing text diagram for people.

use crate::record::DialogNode;
use crate::tree::{DialogTree, NodeIdx};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Records of every attached node in level order, synthetic root excluded
pub fn flatten(tree: &DialogTree) -> Vec<DialogNode> {
    tree.descendants(DialogTree::ROOT)
        .into_iter()
        .filter_map(|idx| tree.node(idx).record.clone())
        .collect()
}

/// A node's description, plus the label of its jump destination when it has one
pub fn node_label(tree: &DialogTree, idx: NodeIdx) -> String {
    let node = tree.node(idx);
    let mut label = node.description.clone();
    if let Some(target) = node.jump_target() {
        if let [destination] = tree.find_by_id(target).as_slice() {
            label.push_str(&format!(" (jumps to: {})", tree.node(*destination).description));
        }
    }
    label
}

/// Text diagram of the whole tree, children in dialog order.
///
/// ```text
/// root
/// ├── welcome
/// ├── 2
/// │   ├── 2_1
/// │   └── 2_2
/// └── Anything else
/// ```
pub fn render_diagram(tree: &DialogTree) -> String {
    let mut lines = vec![tree.node(DialogTree::ROOT).description.clone()];
    render_children(tree, DialogTree::ROOT, "", &mut lines);
    lines.join("\n")
}

fn render_children(tree: &DialogTree, idx: NodeIdx, prefix: &str, lines: &mut Vec<String>) {
    let children = tree.ordered_children(idx);
    let count = children.len();
    for (position, child) in children.into_iter().enumerate() {
        let is_last = position + 1 == count;
        let (branch, indent) = if is_last { (LAST_BRANCH, SPACE) } else { (BRANCH, PIPE) };
        lines.push(format!("{}{}{}", prefix, branch, node_label(tree, child)));
        render_children(tree, child, &format!("{}{}", prefix, indent), lines);
    }
}
