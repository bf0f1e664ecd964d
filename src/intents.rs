//! Loading and copying intent training data
//!
//! CSV layout is `action,intent,example`. REMOVE rows run first: a row with no
//! example deletes the whole intent, otherwise just that example. ADD rows are
//! grouped per intent and merged into whatever the workspace already has.

use crate::backup::{get_and_backup_workspace, BackupSink};
use crate::error::{require, Result};
use crate::record::{Example, Intent};
use crate::store::{StoreError, StoreResult, WorkspaceStore};
use crate::vocab::{
    exists, group_in_order, remove_with_probe, union_in_order, VocabCopy, VocabReport, ADD_ACTION,
    REMOVE_ACTION,
};
use serde::Deserialize;
use std::io::Read;

/// One row of an intent CSV
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IntentRow {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub example: String,
}

impl IntentRow {
    pub fn add(intent: &str, example: &str) -> Self {
        Self {
            action: ADD_ACTION.to_string(),
            intent: intent.to_string(),
            example: example.to_string(),
        }
    }

    pub fn remove(intent: &str, example: &str) -> Self {
        Self {
            action: REMOVE_ACTION.to_string(),
            intent: intent.to_string(),
            example: example.to_string(),
        }
    }
}

pub fn read_intent_rows<R: Read>(reader: R) -> Result<Vec<IntentRow>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize::<IntentRow>() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Apply an intent CSV to `workspace`, backing the workspace up first
pub fn load_csv_as_intent_data<R: Read>(
    store: &dyn WorkspaceStore,
    workspace: &str,
    csv: R,
    clear_existing: bool,
    backup: Option<&dyn BackupSink>,
) -> Result<VocabReport> {
    require(&[("workspace", workspace)])?;
    get_and_backup_workspace(store, workspace, backup)?;
    let rows = read_intent_rows(csv)?;
    load_intent_data(store, workspace, &rows, clear_existing)
}

/// Copy one intent's examples into another workspace, merging with what is there
pub fn copy_intent_data(
    source: &dyn WorkspaceStore,
    target: &dyn WorkspaceStore,
    request: &VocabCopy,
    backup: Option<&dyn BackupSink>,
) -> Result<VocabReport> {
    require(&[
        ("intent", &request.name),
        ("source_workspace", &request.source_workspace),
        ("target_workspace", &request.target_workspace),
    ])?;
    get_and_backup_workspace(target, &request.target_workspace, backup)?;

    let intent = source.get_intent(&request.source_workspace, &request.name)?;
    let rows: Vec<IntentRow> = intent
        .examples
        .iter()
        .map(|example| IntentRow::add(&intent.intent, &example.text))
        .collect();
    load_intent_data(target, &request.target_workspace, &rows, request.clear_existing)
}

/// Apply already-parsed rows to `workspace`
pub fn load_intent_data(
    store: &dyn WorkspaceStore,
    workspace: &str,
    rows: &[IntentRow],
    clear_existing: bool,
) -> Result<VocabReport> {
    let mut report = VocabReport::default();

    if clear_existing {
        clear_intents(store, workspace, rows, &mut report);
    }

    for row in rows.iter().filter(|r| r.action == REMOVE_ACTION) {
        if row.intent.is_empty() {
            report.invalid.push(format!("REMOVE row without an intent ('{}')", row.example));
        } else if row.example.is_empty() {
            remove_with_probe(
                &mut report,
                row.intent.clone(),
                || store.delete_intent(workspace, &row.intent),
                || exists(store.get_intent(workspace, &row.intent)),
            );
        } else {
            remove_with_probe(
                &mut report,
                format!("{}: {}", row.intent, row.example),
                || remove_example(store, workspace, &row.intent, &row.example),
                || has_example(store, workspace, &row.intent, &row.example),
            );
        }
    }

    let additions = group_in_order(
        rows.iter()
            .filter(|r| r.action == ADD_ACTION)
            .map(|r| (r.intent.as_str(), r.example.as_str())),
    );
    for (name, examples) in additions {
        if name.is_empty() {
            report.invalid.push("ADD rows without an intent".to_string());
            continue;
        }
        if examples.is_empty() {
            tracing::warn!("no examples for intent '{}'", name);
            continue;
        }
        merge_examples(store, workspace, &name, &examples, &mut report);
    }

    Ok(report)
}

fn clear_intents(store: &dyn WorkspaceStore, workspace: &str, rows: &[IntentRow], report: &mut VocabReport) {
    let names = group_in_order(rows.iter().map(|r| (r.intent.as_str(), "")));
    for (name, _) in names.into_iter().filter(|(name, _)| !name.is_empty()) {
        match store.delete_intent(workspace, &name) {
            Ok(()) => {
                tracing::info!("intent '{}' cleared", name);
                report.removed.push(name);
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!("intent '{}' does not exist; nothing to clear", name);
            }
            Err(err) => report.failed.push((name, err.to_string())),
        }
    }
}

fn merge_examples(
    store: &dyn WorkspaceStore,
    workspace: &str,
    name: &str,
    examples: &[String],
    report: &mut VocabReport,
) {
    let (intent, created) = match store.get_intent(workspace, name) {
        Ok(mut existing) => {
            let known = existing.examples.len();
            let merged = union_in_order(&existing.example_texts(), examples);
            existing
                .examples
                .extend(merged.into_iter().skip(known).map(Example::new));
            tracing::info!("intent '{}' gains {} example(s)", name, existing.examples.len() - known);
            (existing, false)
        }
        Err(err) if err.is_not_found() => (Intent::new(name, examples), true),
        Err(err) => {
            report.failed.push((name.to_string(), err.to_string()));
            return;
        }
    };

    let count = intent.examples.len();
    match store.put_intent(workspace, intent) {
        Ok(()) if created => {
            tracing::info!("intent '{}' created with {} example(s)", name, count);
            report.created.push(name.to_string());
        }
        Ok(()) => report.updated.push(name.to_string()),
        Err(err) => {
            tracing::error!("intent '{}' failed to save: {}", name, err);
            report.failed.push((name.to_string(), err.to_string()));
        }
    }
}

fn remove_example(store: &dyn WorkspaceStore, workspace: &str, name: &str, text: &str) -> StoreResult<()> {
    let mut intent = store.get_intent(workspace, name)?;
    let before = intent.examples.len();
    intent.examples.retain(|e| e.text != text);
    if intent.examples.len() == before {
        return Err(StoreError::not_found("example", text));
    }
    store.put_intent(workspace, intent)
}

fn has_example(store: &dyn WorkspaceStore, workspace: &str, name: &str, text: &str) -> StoreResult<bool> {
    match store.get_intent(workspace, name) {
        Ok(intent) => Ok(intent.examples.iter().any(|e| e.text == text)),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}
