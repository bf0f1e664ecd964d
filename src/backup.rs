//! Workspace backups taken before a mutating operation

use crate::error::Result;
use crate::record::Workspace;
use crate::store::WorkspaceStore;
use std::path::PathBuf;

/// Somewhere to put a workspace export before it gets changed
pub trait BackupSink {
    fn write(&self, workspace: &str, export: &Workspace) -> Result<()>;
}

/// Writes the pretty-printed export to a fixed path
#[derive(Debug, Clone)]
pub struct FileBackup {
    pub path: PathBuf,
}

impl FileBackup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BackupSink for FileBackup {
    fn write(&self, workspace: &str, export: &Workspace) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(export)?)?;
        tracing::info!("backed up workspace {} to {}", workspace, self.path.display());
        Ok(())
    }
}

/// Fetch a workspace export, handing it to `sink` first when one is given
pub fn get_and_backup_workspace(
    store: &dyn WorkspaceStore,
    workspace: &str,
    sink: Option<&dyn BackupSink>,
) -> Result<Workspace> {
    let export = store.fetch_workspace(workspace)?;
    if let Some(sink) = sink {
        sink.write(workspace, &export)?;
    }
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DialogNode;
    use crate::store::MemoryStore;

    #[test]
    fn test_backup_writes_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backups").join("ws.json");
        let store = MemoryStore::new().with_workspace(
            "ws",
            Workspace {
                dialog_nodes: vec![DialogNode::new("a")],
                ..Default::default()
            },
        );

        let export = get_and_backup_workspace(&store, "ws", Some(&FileBackup::new(&path))).unwrap();

        let written: Workspace =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, export);
    }

    #[test]
    fn test_no_sink_just_fetches() {
        let store = MemoryStore::new().with_workspace("ws", Workspace::default());
        assert!(get_and_backup_workspace(&store, "ws", None).is_ok());
        assert!(get_and_backup_workspace(&store, "missing", None).is_err());
    }
}
