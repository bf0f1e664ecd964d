//! Bookkeeping shared by the intent and entity loaders

use crate::store::StoreResult;

pub const ADD_ACTION: &str = "ADD";
pub const REMOVE_ACTION: &str = "REMOVE";

/// Result of applying vocabulary changes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VocabReport {
    /// Intents or entities that did not exist before
    pub created: Vec<String>,
    /// Existing intents or entities that gained data
    pub updated: Vec<String>,
    /// Items deleted (intents, examples, entities, values, synonyms)
    pub removed: Vec<String>,
    /// Items a REMOVE row named that were not there
    pub missing: Vec<String>,
    /// `(item, reason)` for store calls that failed
    pub failed: Vec<(String, String)>,
    /// Rows that could not be interpreted
    pub invalid: Vec<String>,
}

impl VocabReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.invalid.is_empty()
    }
}

/// Copy one named intent or entity from one workspace into another
#[derive(Debug, Clone)]
pub struct VocabCopy {
    pub name: String,
    pub source_workspace: String,
    pub target_workspace: String,
    /// Delete the target's existing definition before merging
    pub clear_existing: bool,
}

/// `existing` followed by the members of `incoming` it lacks, without duplicates
pub(crate) fn union_in_order(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + incoming.len());
    for item in existing.iter().chain(incoming) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

/// Group `(key, item)` pairs by key in first-seen order
pub(crate) fn group_in_order<'a, I>(pairs: I) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for (key, item) in pairs {
        let position = match groups.iter().position(|(k, _)| k == key) {
            Some(position) => position,
            None => {
                groups.push((key.to_string(), Vec::new()));
                groups.len() - 1
            }
        };
        if !item.is_empty() && !groups[position].1.iter().any(|i| i == item) {
            groups[position].1.push(item.to_string());
        }
    }
    groups
}

/// Turn a lookup into an existence check
pub(crate) fn exists<T>(lookup: StoreResult<T>) -> StoreResult<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

/// Run a delete and file the outcome under `label`.
///
/// A failed delete is probed with `still_there`: if the item is gone it was
/// never there to begin with, otherwise the delete really failed.
pub(crate) fn remove_with_probe(
    report: &mut VocabReport,
    label: String,
    delete: impl FnOnce() -> StoreResult<()>,
    still_there: impl FnOnce() -> StoreResult<bool>,
) {
    match delete() {
        Ok(()) => {
            tracing::info!("'{}' removed", label);
            report.removed.push(label);
        }
        Err(delete_err) => match still_there() {
            Ok(false) => {
                tracing::info!("'{}' does not exist; nothing to remove", label);
                report.missing.push(label);
            }
            Ok(true) => {
                tracing::error!("'{}' failed to remove: {}", label, delete_err);
                report.failed.push((label, delete_err.to_string()));
            }
            Err(probe_err) => {
                tracing::error!("'{}' failed to remove: {}", label, probe_err);
                report.failed.push((label, delete_err.to_string()));
            }
        },
    }
}
