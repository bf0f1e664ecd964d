//! Deleting dialog branches listed in a CSV file
//!
//! The file has two columns, `action` and `id`. Only `REMOVE` rows do
//! anything; `id` may be a node id or a node title.

use crate::backup::{get_and_backup_workspace, BackupSink};
use crate::error::{require, Result};
use crate::store::WorkspaceStore;
use crate::tree::{DialogTree, MatchOn};
use crate::vocab::REMOVE_ACTION;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct PruneRow {
    #[serde(default)]
    action: String,
    #[serde(default)]
    id: String,
}

/// What happened to each requested identifier
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    /// `(requested identifier, resolved node id)`
    pub removed: Vec<(String, String)>,
    /// Identifiers with no matching node
    pub not_found: Vec<String>,
    /// `(requested identifier, reason)` for nodes that could not be deleted
    pub failed: Vec<(String, String)>,
}

impl PruneReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Identifiers named by the `REMOVE` rows of a CSV file, in file order
pub fn read_remove_rows<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut identifiers = Vec::new();
    for row in csv_reader.deserialize::<PruneRow>() {
        let row = row?;
        if row.action != REMOVE_ACTION {
            if !row.action.is_empty() {
                tracing::debug!("skipping '{}' row for '{}'", row.action, row.id);
            }
            continue;
        }
        if row.id.is_empty() {
            tracing::warn!("REMOVE row without an id; skipping");
            continue;
        }
        identifiers.push(row.id);
    }
    Ok(identifiers)
}

/// Delete every branch named in a CSV file from `workspace`
pub fn delete_branches_from_csv<R: Read>(
    store: &dyn WorkspaceStore,
    workspace: &str,
    csv: R,
    backup: Option<&dyn BackupSink>,
) -> Result<PruneReport> {
    require(&[("workspace", workspace)])?;
    let identifiers = read_remove_rows(csv)?;
    delete_branches(store, workspace, &identifiers, backup)
}

/// Delete the branches named by `identifiers`, continuing past per-row failures.
///
/// Identifiers are resolved against one snapshot taken up front, so a row
/// naming a node already removed along with an earlier branch still counts as
/// removed once the store confirms it is gone.
pub fn delete_branches(
    store: &dyn WorkspaceStore,
    workspace: &str,
    identifiers: &[String],
    backup: Option<&dyn BackupSink>,
) -> Result<PruneReport> {
    require(&[("workspace", workspace)])?;
    let export = get_and_backup_workspace(store, workspace, backup)?;
    let tree = DialogTree::from_records(&export.dialog_nodes);
    let mut report = PruneReport::default();

    for identifier in identifiers {
        let matches = tree.find(identifier, MatchOn::IdOrTitle);
        let id = match matches.as_slice() {
            [] => {
                tracing::warn!("unable to locate node '{}'; it may have already been removed", identifier);
                report.not_found.push(identifier.clone());
                continue;
            }
            [only] => tree.node(*only).id.clone().unwrap_or_default(),
            _ => {
                report
                    .failed
                    .push((identifier.clone(), "matches more than one node".to_string()));
                continue;
            }
        };

        match store.delete_node(workspace, &id) {
            Ok(()) => {
                tracing::info!("removed '{}' ({})", identifier, id);
                report.removed.push((identifier.clone(), id));
            }
            Err(delete_err) => match store.get_node(workspace, &id) {
                Err(probe_err) if probe_err.is_not_found() => {
                    tracing::debug!("'{}' already gone after failed delete: {}", id, delete_err);
                    report.removed.push((identifier.clone(), id));
                }
                _ => {
                    tracing::error!("unable to delete node '{}': {}", identifier, delete_err);
                    report.failed.push((identifier.clone(), delete_err.to_string()));
                }
            },
        }
    }

    Ok(report)
}
