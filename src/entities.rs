//! Loading and copying entity values
//!
//! CSV layout is `action,entity,value,synonym`. Which REMOVE happens depends on
//! how many columns are filled in: entity only drops the entity, entity and
//! value drop that value, all three drop a single synonym. ADD rows are merged
//! into the existing entity: untouched values stay, new values are appended,
//! and values present on both sides get the union of their synonyms.
//!
//! Only synonym values are handled; pattern values are left as they are.

use crate::backup::{get_and_backup_workspace, BackupSink};
use crate::error::{require, Result};
use crate::record::{Entity, EntityValue, SYNONYMS_VALUE_TYPE};
use crate::store::{StoreError, StoreResult, WorkspaceStore};
use crate::vocab::{
    exists, group_in_order, remove_with_probe, union_in_order, VocabCopy, VocabReport, ADD_ACTION,
    REMOVE_ACTION,
};
use serde::Deserialize;
use std::io::Read;

/// One row of an entity CSV
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EntityRow {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub synonym: String,
}

impl EntityRow {
    pub fn add(entity: &str, value: &str, synonym: &str) -> Self {
        Self {
            action: ADD_ACTION.to_string(),
            entity: entity.to_string(),
            value: value.to_string(),
            synonym: synonym.to_string(),
        }
    }

    pub fn remove(entity: &str, value: &str, synonym: &str) -> Self {
        Self {
            action: REMOVE_ACTION.to_string(),
            entity: entity.to_string(),
            value: value.to_string(),
            synonym: synonym.to_string(),
        }
    }
}

pub fn read_entity_rows<R: Read>(reader: R) -> Result<Vec<EntityRow>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize::<EntityRow>() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Apply an entity CSV to `workspace`, backing the workspace up first
pub fn load_csv_as_entity_data<R: Read>(
    store: &dyn WorkspaceStore,
    workspace: &str,
    csv: R,
    clear_existing: bool,
    backup: Option<&dyn BackupSink>,
) -> Result<VocabReport> {
    require(&[("workspace", workspace)])?;
    get_and_backup_workspace(store, workspace, backup)?;
    let rows = read_entity_rows(csv)?;
    load_entity_data(store, workspace, &rows, clear_existing)
}

/// Copy one entity's values into another workspace, merging with what is there
pub fn copy_entity_data(
    source: &dyn WorkspaceStore,
    target: &dyn WorkspaceStore,
    request: &VocabCopy,
    backup: Option<&dyn BackupSink>,
) -> Result<VocabReport> {
    require(&[
        ("entity", &request.name),
        ("source_workspace", &request.source_workspace),
        ("target_workspace", &request.target_workspace),
    ])?;
    get_and_backup_workspace(target, &request.target_workspace, backup)?;

    let entity = source.get_entity(&request.source_workspace, &request.name)?;
    let mut rows = Vec::new();
    for value in &entity.values {
        if value.value_type != SYNONYMS_VALUE_TYPE {
            tracing::warn!("skipping {} value '{}' of entity '{}'", value.value_type, value.value, entity.entity);
            continue;
        }
        rows.push(EntityRow::add(&entity.entity, &value.value, ""));
        rows.extend(
            value
                .synonyms
                .iter()
                .map(|synonym| EntityRow::add(&entity.entity, &value.value, synonym)),
        );
    }
    load_entity_data(target, &request.target_workspace, &rows, request.clear_existing)
}

/// Apply already-parsed rows to `workspace`
pub fn load_entity_data(
    store: &dyn WorkspaceStore,
    workspace: &str,
    rows: &[EntityRow],
    clear_existing: bool,
) -> Result<VocabReport> {
    let mut report = VocabReport::default();

    if clear_existing {
        clear_entities(store, workspace, rows, &mut report);
    }

    for row in rows.iter().filter(|r| r.action == REMOVE_ACTION) {
        apply_remove(store, workspace, row, &mut report);
    }

    let additions: Vec<&EntityRow> = rows.iter().filter(|r| r.action == ADD_ACTION).collect();
    let names = group_in_order(additions.iter().map(|r| (r.entity.as_str(), "")));
    for (name, _) in names {
        if name.is_empty() {
            report.invalid.push("ADD rows without an entity".to_string());
            continue;
        }
        let values = collect_values(additions.iter().copied().filter(|r| r.entity == name));
        merge_entity(store, workspace, &name, values, &mut report);
    }

    Ok(report)
}

fn clear_entities(store: &dyn WorkspaceStore, workspace: &str, rows: &[EntityRow], report: &mut VocabReport) {
    let names = group_in_order(rows.iter().map(|r| (r.entity.as_str(), "")));
    for (name, _) in names.into_iter().filter(|(name, _)| !name.is_empty()) {
        match store.delete_entity(workspace, &name) {
            Ok(()) => {
                tracing::info!("entity '{}' cleared", name);
                report.removed.push(name);
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!("entity '{}' does not exist; nothing to clear", name);
            }
            Err(err) => report.failed.push((name, err.to_string())),
        }
    }
}

fn apply_remove(store: &dyn WorkspaceStore, workspace: &str, row: &EntityRow, report: &mut VocabReport) {
    let (entity, value, synonym) = (row.entity.as_str(), row.value.as_str(), row.synonym.as_str());
    match (entity.is_empty(), value.is_empty(), synonym.is_empty()) {
        (false, true, true) => remove_with_probe(
            report,
            entity.to_string(),
            || store.delete_entity(workspace, entity),
            || exists(store.get_entity(workspace, entity)),
        ),
        (false, false, true) => remove_with_probe(
            report,
            format!("{}/{}", entity, value),
            || {
                edit_entity(store, workspace, entity, |e| {
                    let before = e.values.len();
                    e.values.retain(|v| v.value != value);
                    e.values.len() != before
                })
            },
            || has_value(store, workspace, entity, value, None),
        ),
        (false, false, false) => remove_with_probe(
            report,
            format!("{}/{}/{}", entity, value, synonym),
            || {
                edit_entity(store, workspace, entity, |e| {
                    match e.values.iter_mut().find(|v| v.value == value) {
                        Some(v) => {
                            let before = v.synonyms.len();
                            v.synonyms.retain(|s| s != synonym);
                            v.synonyms.len() != before
                        }
                        None => false,
                    }
                })
            },
            || has_value(store, workspace, entity, value, Some(synonym)),
        ),
        _ => report.invalid.push(format!(
            "REMOVE row '{},{},{}' must name an entity, then optionally a value and synonym",
            entity, value, synonym
        )),
    }
}

/// Load an entity, let `change` edit it, and save it back if anything changed
fn edit_entity(
    store: &dyn WorkspaceStore,
    workspace: &str,
    name: &str,
    change: impl FnOnce(&mut Entity) -> bool,
) -> StoreResult<()> {
    let mut entity = store.get_entity(workspace, name)?;
    if !change(&mut entity) {
        return Err(StoreError::not_found("entity value", name));
    }
    store.put_entity(workspace, entity)
}

fn has_value(
    store: &dyn WorkspaceStore,
    workspace: &str,
    entity: &str,
    value: &str,
    synonym: Option<&str>,
) -> StoreResult<bool> {
    match store.get_entity(workspace, entity) {
        Ok(e) => Ok(match (e.value(value), synonym) {
            (Some(v), Some(s)) => v.synonyms.iter().any(|x| x == s),
            (found, None) => found.is_some(),
            (None, Some(_)) => false,
        }),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

/// Distinct values named by `rows`, each with its distinct non-empty synonyms
fn collect_values<'a>(rows: impl Iterator<Item = &'a EntityRow>) -> Vec<EntityValue> {
    group_in_order(rows.map(|r| (r.value.as_str(), r.synonym.as_str())))
        .into_iter()
        .filter(|(value, _)| !value.is_empty())
        .map(|(value, synonyms)| EntityValue::new(value, synonyms))
        .collect()
}

fn merge_entity(
    store: &dyn WorkspaceStore,
    workspace: &str,
    name: &str,
    values: Vec<EntityValue>,
    report: &mut VocabReport,
) {
    let (entity, created) = match store.get_entity(workspace, name) {
        Ok(mut existing) => {
            for incoming in values {
                match existing.values.iter_mut().find(|v| v.value == incoming.value) {
                    None => existing.values.push(incoming),
                    Some(current) if current.value_type != SYNONYMS_VALUE_TYPE => {
                        tracing::warn!(
                            "value type mismatch for value '{}' in entity '{}'; leaving it unchanged",
                            current.value,
                            name
                        );
                    }
                    Some(current) => {
                        current.synonyms = union_in_order(&current.synonyms, &incoming.synonyms);
                    }
                }
            }
            (existing, false)
        }
        Err(err) if err.is_not_found() => (Entity::new(name, values), true),
        Err(err) => {
            report.failed.push((name.to_string(), err.to_string()));
            return;
        }
    };

    let count = entity.values.len();
    match store.put_entity(workspace, entity) {
        Ok(()) => {
            tracing::info!("entity '{}' saved with {} value(s)", name, count);
            if created {
                report.created.push(name.to_string());
            } else {
                report.updated.push(name.to_string());
            }
        }
        Err(err) => {
            tracing::error!("entity '{}' failed to save: {}", name, err);
            report.failed.push((name.to_string(), err.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Workspace;
    use crate::store::MemoryStore;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn pattern(value: &str) -> EntityValue {
        let mut v = EntityValue::new(value, Vec::new());
        v.value_type = "patterns".to_string();
        v
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with_workspace(
            "ws",
            Workspace {
                entities: vec![
                    Entity::new(
                        "size",
                        vec![
                            EntityValue::new("small", strings(&["tiny"])),
                            EntityValue::new("large", strings(&["big", "huge"])),
                            pattern("code"),
                        ],
                    ),
                    Entity::new("topping", vec![EntityValue::new("ham", Vec::new())]),
                ],
                ..Default::default()
            },
        )
    }

    fn size(store: &MemoryStore) -> Entity {
        store.get_entity("ws", "size").unwrap()
    }

    #[test]
    fn test_add_rows_merge_values_and_synonyms() {
        let store = store();
        let csv = "action,entity,value,synonym\n\
                   ADD,size,large,massive\n\
                   ADD,size,large,big\n\
                   ADD,size,medium,\n\
                   ADD,size,code,xyz\n\
                   ADD,crust,thin,skinny\n";

        let report = load_csv_as_entity_data(&store, "ws", csv.as_bytes(), false, None).unwrap();

        let size = size(&store);
        let names: Vec<_> = size.values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(names, vec!["small", "large", "code", "medium"]);
        assert_eq!(size.value("large").unwrap().synonyms, strings(&["big", "huge", "massive"]));
        assert!(size.value("code").unwrap().synonyms.is_empty());

        let crust = store.get_entity("ws", "crust").unwrap();
        assert_eq!(crust.value("thin").unwrap().synonyms, strings(&["skinny"]));
        assert_eq!(report.updated, strings(&["size"]));
        assert_eq!(report.created, strings(&["crust"]));
    }

    #[test]
    fn test_remove_rows_by_column_count() {
        let store = store();
        let rows = vec![
            EntityRow::remove("topping", "", ""),
            EntityRow::remove("size", "small", ""),
            EntityRow::remove("size", "large", "huge"),
            EntityRow::remove("size", "large", "enormous"),
            EntityRow::remove("size", "", "orphan"),
        ];

        let report = load_entity_data(&store, "ws", &rows, false).unwrap();

        assert_eq!(report.removed, strings(&["topping", "size/small", "size/large/huge"]));
        assert_eq!(report.missing, strings(&["size/large/enormous"]));
        assert_eq!(report.invalid.len(), 1);
        assert!(store.get_entity("ws", "topping").unwrap_err().is_not_found());
        let size = size(&store);
        assert!(size.value("small").is_none());
        assert_eq!(size.value("large").unwrap().synonyms, strings(&["big"]));
    }

    #[test]
    fn test_copy_entity_skips_patterns() {
        let store = store().with_workspace("other", Workspace::default());
        let request = VocabCopy {
            name: "size".to_string(),
            source_workspace: "ws".to_string(),
            target_workspace: "other".to_string(),
            clear_existing: false,
        };

        let report = copy_entity_data(&store, &store, &request, None).unwrap();

        let copied = store.get_entity("other", "size").unwrap();
        let names: Vec<_> = copied.values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(names, vec!["small", "large"]);
        assert_eq!(copied.value("large").unwrap().synonyms, strings(&["big", "huge"]));
        assert_eq!(report.created, strings(&["size"]));
    }

    #[test]
    fn test_clear_existing_drops_old_values() {
        let store = store();
        let rows = vec![EntityRow::add("topping", "olive", "")];

        load_entity_data(&store, "ws", &rows, true).unwrap();

        let topping = store.get_entity("ws", "topping").unwrap();
        assert_eq!(topping.values.len(), 1);
        assert_eq!(topping.values[0].value, "olive");
    }
}
