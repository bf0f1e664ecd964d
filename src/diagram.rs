//! Text diagram of a stored workspace

use crate::error::{require, Result};
use crate::render::render_diagram;
use crate::store::WorkspaceStore;
use crate::tree::DialogTree;

/// Fetch `workspace` and draw its dialog.
///
/// ```text
/// root
/// ├── welcome
/// ├── 1 (jumps to: 3)
/// ├── 2
/// │   ├── 2_1
/// │   └── 2_2
/// ├── 3
/// │   └── 3_1
/// └── Anything else
/// ```
pub fn generate_diagram(store: &dyn WorkspaceStore, workspace: &str) -> Result<String> {
    require(&[("workspace", workspace)])?;
    let export = store.fetch_workspace(workspace)?;
    let tree = DialogTree::from_records(&export.dialog_nodes);
    Ok(render_diagram(&tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::record::{DialogNode, Workspace};
    use crate::store::MemoryStore;

    #[test]
    fn test_generate_diagram_for_stored_workspace() {
        let store = MemoryStore::new().with_workspace(
            "ws",
            Workspace {
                dialog_nodes: vec![
                    DialogNode::new("w").titled("welcome"),
                    DialogNode::new("f").after("w").of_type("folder"),
                    DialogNode::new("f1").with_parent("f").when("#help"),
                ],
                ..Default::default()
            },
        );

        assert_eq!(
            generate_diagram(&store, "ws").unwrap(),
            "root\n├── welcome\n└── folder\n    └── #help"
        );
    }

    #[test]
    fn test_generate_diagram_errors() {
        let store = MemoryStore::new();
        assert!(matches!(generate_diagram(&store, ""), Err(Error::MissingArgument("workspace"))));
        assert!(matches!(generate_diagram(&store, "nope"), Err(Error::Store(_))));
    }
}
