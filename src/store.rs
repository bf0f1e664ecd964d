//! Workspace storage
//!
//! [`WorkspaceStore`] is the CRUD surface every operation talks to. Anything
//! that can load and save a whole workspace export ([`WorkspaceBackend`]) gets
//! the full store for free; node deletes cascade to descendants and stitch the
//! sibling chain back together the way the hosted service does.

use crate::record::{DialogNode, Entity, Intent, Workspace};
use lazy_static::lazy_static;
use regex::Regex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref WORKSPACE_ID: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").unwrap();
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid workspace id '{0}'")]
    InvalidWorkspaceId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// CRUD operations against dialog workspaces
pub trait WorkspaceStore {
    /// Full export of a workspace
    fn fetch_workspace(&self, workspace: &str) -> StoreResult<Workspace>;

    fn get_node(&self, workspace: &str, id: &str) -> StoreResult<DialogNode>;

    /// Delete a node and everything below it
    fn delete_node(&self, workspace: &str, id: &str) -> StoreResult<()>;

    /// Replace the dialog (`append = false`) or upsert nodes by id (`append = true`)
    fn push_nodes(&self, workspace: &str, nodes: Vec<DialogNode>, append: bool) -> StoreResult<()>;

    fn get_intent(&self, workspace: &str, intent: &str) -> StoreResult<Intent>;

    /// Create the intent or replace it wholesale
    fn put_intent(&self, workspace: &str, intent: Intent) -> StoreResult<()>;

    fn delete_intent(&self, workspace: &str, intent: &str) -> StoreResult<()>;

    fn get_entity(&self, workspace: &str, entity: &str) -> StoreResult<Entity>;

    /// Create the entity or replace it wholesale
    fn put_entity(&self, workspace: &str, entity: Entity) -> StoreResult<()>;

    fn delete_entity(&self, workspace: &str, entity: &str) -> StoreResult<()>;
}

/// Whole-document persistence for workspace exports
pub trait WorkspaceBackend {
    fn load(&self, workspace: &str) -> StoreResult<Workspace>;
    fn save(&self, workspace: &str, export: &Workspace) -> StoreResult<()>;
}

fn commit<B: WorkspaceBackend + ?Sized>(backend: &B, workspace: &str, mut export: Workspace) -> StoreResult<()> {
    export.updated = Some(chrono::Utc::now().to_rfc3339());
    backend.save(workspace, &export)
}

/// Ids of `id` and all of its descendants, following `parent` pointers
fn subtree_ids(nodes: &[DialogNode], id: &str) -> HashSet<String> {
    let mut doomed = HashSet::from([id.to_string()]);
    let mut frontier = vec![id.to_string()];
    while let Some(current) = frontier.pop() {
        for node in nodes {
            if node.parent.as_deref() == Some(current.as_str()) && doomed.insert(node.dialog_node.clone()) {
                frontier.push(node.dialog_node.clone());
            }
        }
    }
    doomed
}

impl<B: WorkspaceBackend> WorkspaceStore for B {
    fn fetch_workspace(&self, workspace: &str) -> StoreResult<Workspace> {
        self.load(workspace)
    }

    fn get_node(&self, workspace: &str, id: &str) -> StoreResult<DialogNode> {
        self.load(workspace)?
            .dialog_nodes
            .into_iter()
            .find(|node| node.dialog_node == id)
            .ok_or_else(|| StoreError::not_found("dialog node", id))
    }

    fn delete_node(&self, workspace: &str, id: &str) -> StoreResult<()> {
        let mut export = self.load(workspace)?;
        let removed = export
            .dialog_nodes
            .iter()
            .find(|node| node.dialog_node == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("dialog node", id))?;

        let doomed = subtree_ids(&export.dialog_nodes, id);
        export.dialog_nodes.retain(|node| !doomed.contains(&node.dialog_node));

        // The follower inherits the removed node's slot in the chain
        if let Some(follower) = export
            .dialog_nodes
            .iter_mut()
            .find(|node| node.parent == removed.parent && node.previous_sibling.as_deref() == Some(id))
        {
            follower.previous_sibling = removed.previous_sibling.clone();
        }

        tracing::debug!("deleted {} node(s) under '{}' in {}", doomed.len(), id, workspace);
        commit(self, workspace, export)
    }

    fn push_nodes(&self, workspace: &str, nodes: Vec<DialogNode>, append: bool) -> StoreResult<()> {
        let mut export = self.load(workspace)?;
        if append {
            for node in nodes {
                match export
                    .dialog_nodes
                    .iter_mut()
                    .find(|existing| existing.dialog_node == node.dialog_node)
                {
                    Some(existing) => *existing = node,
                    None => export.dialog_nodes.push(node),
                }
            }
        } else {
            export.dialog_nodes = nodes;
        }
        commit(self, workspace, export)
    }

    fn get_intent(&self, workspace: &str, intent: &str) -> StoreResult<Intent> {
        self.load(workspace)?
            .intents
            .into_iter()
            .find(|i| i.intent == intent)
            .ok_or_else(|| StoreError::not_found("intent", intent))
    }

    fn put_intent(&self, workspace: &str, intent: Intent) -> StoreResult<()> {
        let mut export = self.load(workspace)?;
        match export.intents.iter_mut().find(|i| i.intent == intent.intent) {
            Some(existing) => *existing = intent,
            None => export.intents.push(intent),
        }
        commit(self, workspace, export)
    }

    fn delete_intent(&self, workspace: &str, intent: &str) -> StoreResult<()> {
        let mut export = self.load(workspace)?;
        let before = export.intents.len();
        export.intents.retain(|i| i.intent != intent);
        if export.intents.len() == before {
            return Err(StoreError::not_found("intent", intent));
        }
        commit(self, workspace, export)
    }

    fn get_entity(&self, workspace: &str, entity: &str) -> StoreResult<Entity> {
        self.load(workspace)?
            .entities
            .into_iter()
            .find(|e| e.entity == entity)
            .ok_or_else(|| StoreError::not_found("entity", entity))
    }

    fn put_entity(&self, workspace: &str, entity: Entity) -> StoreResult<()> {
        let mut export = self.load(workspace)?;
        match export.entities.iter_mut().find(|e| e.entity == entity.entity) {
            Some(existing) => *existing = entity,
            None => export.entities.push(entity),
        }
        commit(self, workspace, export)
    }

    fn delete_entity(&self, workspace: &str, entity: &str) -> StoreResult<()> {
        let mut export = self.load(workspace)?;
        let before = export.entities.len();
        export.entities.retain(|e| e.entity != entity);
        if export.entities.len() == before {
            return Err(StoreError::not_found("entity", entity));
        }
        commit(self, workspace, export)
    }
}

/// One JSON export per workspace at `<root>/<workspace>.json`
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Export path for a workspace id, rejecting ids that could escape the root
    pub fn path_for(&self, workspace: &str) -> StoreResult<PathBuf> {
        if !WORKSPACE_ID.is_match(workspace) {
            return Err(StoreError::InvalidWorkspaceId(workspace.to_string()));
        }
        Ok(self.root.join(format!("{}.json", workspace)))
    }
}

impl WorkspaceBackend for DirStore {
    fn load(&self, workspace: &str) -> StoreResult<Workspace> {
        let path = self.path_for(workspace)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found("workspace", workspace));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, workspace: &str, export: &Workspace) -> StoreResult<()> {
        let path = self.path_for(workspace)?;
        std::fs::create_dir_all(&self.root)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(export)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Workspaces held in memory; used for dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    workspaces: RefCell<HashMap<String, Workspace>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(self, workspace: &str, export: Workspace) -> Self {
        self.insert(workspace, export);
        self
    }

    pub fn insert(&self, workspace: &str, export: Workspace) {
        self.workspaces.borrow_mut().insert(workspace.to_string(), export);
    }

    /// Current contents of a workspace, if it exists
    pub fn snapshot(&self, workspace: &str) -> Option<Workspace> {
        self.workspaces.borrow().get(workspace).cloned()
    }
}

impl WorkspaceBackend for MemoryStore {
    fn load(&self, workspace: &str) -> StoreResult<Workspace> {
        self.snapshot(workspace)
            .ok_or_else(|| StoreError::not_found("workspace", workspace))
    }

    fn save(&self, workspace: &str, export: &Workspace) -> StoreResult<()> {
        self.insert(workspace, export.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog() -> Vec<DialogNode> {
        vec![
            DialogNode::new("a"),
            DialogNode::new("b").after("a"),
            DialogNode::new("b1").with_parent("b"),
            DialogNode::new("b1x").with_parent("b1"),
            DialogNode::new("c").after("b"),
        ]
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with_workspace(
            "ws",
            Workspace {
                dialog_nodes: dialog(),
                ..Default::default()
            },
        )
    }

    fn ids(store: &MemoryStore) -> Vec<String> {
        store
            .snapshot("ws")
            .unwrap()
            .dialog_nodes
            .into_iter()
            .map(|n| n.dialog_node)
            .collect()
    }

    #[test]
    fn test_delete_cascades_and_repairs_chain() {
        let store = store();
        store.delete_node("ws", "b").unwrap();

        assert_eq!(ids(&store), vec!["a", "c"]);
        let c = store.get_node("ws", "c").unwrap();
        assert_eq!(c.previous_sibling.as_deref(), Some("a"));
    }

    #[test]
    fn test_delete_missing_node() {
        let err = store().delete_node("ws", "zzz").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_workspace() {
        let err = MemoryStore::new().fetch_workspace("nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "workspace", .. }));
    }

    #[test]
    fn test_push_nodes_replace_and_append() {
        let store = store();
        store
            .push_nodes("ws", vec![DialogNode::new("a").titled("A"), DialogNode::new("z")], true)
            .unwrap();
        assert_eq!(ids(&store), vec!["a", "b", "b1", "b1x", "c", "z"]);
        assert_eq!(store.get_node("ws", "a").unwrap().title.as_deref(), Some("A"));

        store.push_nodes("ws", vec![DialogNode::new("only")], false).unwrap();
        assert_eq!(ids(&store), vec!["only"]);
    }

    #[test]
    fn test_saves_stamp_updated() {
        let store = store();
        assert!(store.snapshot("ws").unwrap().updated.is_none());
        store.push_nodes("ws", Vec::new(), true).unwrap();
        let updated = store.snapshot("ws").unwrap().updated.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&updated).is_ok());
    }

    #[test]
    fn test_intent_crud() {
        let store = store();
        store
            .put_intent("ws", Intent::new("greet", &["hi".to_string()]))
            .unwrap();
        assert_eq!(store.get_intent("ws", "greet").unwrap().example_texts(), vec!["hi"]);

        store.delete_intent("ws", "greet").unwrap();
        assert!(store.get_intent("ws", "greet").unwrap_err().is_not_found());
        assert!(store.delete_intent("ws", "greet").unwrap_err().is_not_found());
    }

    #[test]
    fn test_dir_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let export = Workspace {
            name: Some("Pizza".to_string()),
            dialog_nodes: dialog(),
            ..Default::default()
        };
        store.save("pizza", &export).unwrap();

        assert_eq!(store.fetch_workspace("pizza").unwrap(), export);
        store.delete_node("pizza", "b1").unwrap();
        assert_eq!(store.fetch_workspace("pizza").unwrap().dialog_nodes.len(), 3);
    }

    #[test]
    fn test_dir_store_rejects_bad_ids() {
        let store = DirStore::new("/tmp/unused");
        for bad in ["../etc/passwd", "", ".hidden", "a/b"] {
            assert!(matches!(
                store.path_for(bad),
                Err(StoreError::InvalidWorkspaceId(_))
            ));
        }
        assert!(store.path_for("my-ws_2.v1").is_ok());
    }
}
