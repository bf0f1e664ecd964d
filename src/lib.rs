//! dialog-graft - tooling for conversational-assistant workspaces
//!
//! Copy dialog branches between workspaces without clobbering what is already
//! there, prune branches listed in a CSV file, merge intent and entity data,
//! and draw a workspace's dialog as a text tree.
//!
//! # Overview
//!
//! A workspace export stores its dialog as a flat list of nodes linked only by
//! `parent` and `previous_sibling`. Every dialog operation rebuilds that list
//! into a [`DialogTree`], works on the tree, and flattens it back.
//!
//! | Operation | Entry point |
//! |-----------|-------------|
//! | Copy a branch | [`copy::copy_dialog_branch`] |
//! | Delete branches from CSV | [`prune::delete_branches_from_csv`] |
//! | Draw the dialog | [`diagram::generate_diagram`] |
//! | Load intents from CSV | [`intents::load_csv_as_intent_data`] |
//! | Load entities from CSV | [`entities::load_csv_as_entity_data`] |
//!
//! # Quick Start
//!
//! ```no_run
//! use dialog_graft::copy::{copy_dialog_branch, CopyRequest};
//! use dialog_graft::{DirStore, InsertMode};
//!
//! let store = DirStore::new("workspaces");
//! let request = CopyRequest {
//!     source_workspace: "pizza-dev".to_string(),
//!     branch: "Order Pizza".to_string(),
//!     target_workspace: "pizza-prod".to_string(),
//!     target_node: "root".to_string(),
//!     insert_as: InsertMode::LastChild,
//! };
//! let outcome = copy_dialog_branch(&store, &store, &request, None).unwrap();
//! println!("{}", outcome.diagram);
//! ```

pub mod backup;
pub mod config;
pub mod copy;
pub mod diagram;
pub mod entities;
pub mod error;
pub mod intents;
pub mod prune;
pub mod record;
pub mod render;
pub mod store;
pub mod tree;
pub mod vocab;

pub use backup::{get_and_backup_workspace, BackupSink, FileBackup};
pub use config::Config;
pub use error::{Error, Result};
pub use record::{DialogNode, Entity, EntityValue, Intent, NextStep, Workspace};
pub use render::{flatten, render_diagram};
pub use store::{DirStore, MemoryStore, StoreError, WorkspaceBackend, WorkspaceStore};
pub use tree::{resolve_jumps, DialogTree, InsertMode, JumpReport, MatchOn, NodeIdx};
pub use vocab::{VocabCopy, VocabReport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Core types are reachable from the crate root
        let tree = DialogTree::new();
        assert_eq!(render_diagram(&tree), "root");
        assert_eq!("last_child".parse::<InsertMode>().unwrap(), InsertMode::LastChild);
    }
}
