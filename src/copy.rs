//! Copying a dialog branch between workspaces

use crate::backup::{get_and_backup_workspace, BackupSink};
use crate::error::{require, Error, Result};
use crate::render::{flatten, render_diagram};
use crate::store::WorkspaceStore;
use crate::tree::{resolve_jumps, DialogTree, InsertMode, JumpReport, MatchOn, NodeIdx, ROOT_IDENTIFIER};

/// Where a branch comes from and where it should land
#[derive(Debug, Clone)]
pub struct CopyRequest {
    pub source_workspace: String,
    /// Id or title of the branch root in the source workspace
    pub branch: String,
    pub target_workspace: String,
    /// Id or title of the anchor in the target workspace, or `"root"`
    pub target_node: String,
    pub insert_as: InsertMode,
}

/// Result of a branch copy
#[derive(Debug)]
pub struct CopyOutcome {
    /// The target workspace's dialog after the copy
    pub tree: DialogTree,
    /// Index of the copied branch root inside `tree`
    pub inserted: NodeIdx,
    pub diagram: String,
    pub jumps: JumpReport,
}

/// Copy `request.branch` into the target workspace and push the result.
///
/// The target export is handed to `backup` before anything changes. Jumps out
/// of the copied branch are repaired by pulling in whatever part of the source
/// dialog they need.
pub fn copy_dialog_branch(
    source: &dyn WorkspaceStore,
    target: &dyn WorkspaceStore,
    request: &CopyRequest,
    backup: Option<&dyn BackupSink>,
) -> Result<CopyOutcome> {
    require(&[
        ("source_workspace", &request.source_workspace),
        ("branch", &request.branch),
        ("target_workspace", &request.target_workspace),
        ("target_node", &request.target_node),
    ])?;
    if request.branch == ROOT_IDENTIFIER {
        return Err(Error::Validation(
            "the root of a dialog cannot be copied; name a branch instead".to_string(),
        ));
    }

    let source_export = source.fetch_workspace(&request.source_workspace)?;
    let target_export = get_and_backup_workspace(target, &request.target_workspace, backup)?;

    let source_tree = DialogTree::from_records(&source_export.dialog_nodes);
    let mut tree = DialogTree::from_records(&target_export.dialog_nodes);

    let branch = source_tree.locate_branch(&request.branch, MatchOn::IdOrTitle, "source")?;
    let anchor = tree.resolve_anchor(&request.target_node, "target")?;

    let inserted = tree.graft(&source_tree, branch, anchor, request.insert_as)?;
    let jumps = resolve_jumps(&mut tree, &source_tree, inserted)?;

    target.push_nodes(&request.target_workspace, flatten(&tree), false)?;
    tracing::info!(
        "copied '{}' from {} into {} ({} jump subtree(s) added)",
        request.branch,
        request.source_workspace,
        request.target_workspace,
        jumps.grafted.len()
    );

    let diagram = render_diagram(&tree);
    Ok(CopyOutcome {
        tree,
        inserted,
        diagram,
        jumps,
    })
}
