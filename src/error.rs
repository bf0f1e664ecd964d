//! Error types for dialog-graft operations
//!
//! Every fallible library call returns [`Result`]. Store failures keep their
//! own type ([`StoreError`]) so callers can tell "the service said no" apart
//! from "the request itself was bad".

use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by tree operations and the commands built on them
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument was missing or empty
    #[error("Argument '{0}' requires a value")]
    MissingArgument(&'static str),

    /// The request is well-formed but not allowed (bad insert mode, copying root, ...)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No node matched an identifier that had to resolve
    #[error("No node matching '{identifier}' found in {tree}")]
    NotFound { identifier: String, tree: String },

    /// More than one node matched where exactly one was required
    #[error("Found multiple nodes matching '{identifier}' in {tree}")]
    Ambiguous { identifier: String, tree: String },

    /// The graft anchor was itself removed while purging colliding ids
    #[error("Target node '{id}' was removed while pruning nodes that collide with the copied branch")]
    AnchorRemoved { id: String },

    /// The backing workspace service rejected or failed a call
    #[error("Workspace store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn not_found(identifier: impl Into<String>, tree: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
            tree: tree.into(),
        }
    }

    pub fn ambiguous(identifier: impl Into<String>, tree: impl Into<String>) -> Self {
        Self::Ambiguous {
            identifier: identifier.into(),
            tree: tree.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject empty required arguments, naming the first offender
pub(crate) fn require(args: &[(&'static str, &str)]) -> Result<()> {
    for (name, value) in args {
        if value.trim().is_empty() {
            return Err(Error::MissingArgument(name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_names_first_empty_argument() {
        let err = require(&[("branch", "welcome"), ("target_workspace", "  ")]).unwrap_err();
        assert!(matches!(err, Error::MissingArgument("target_workspace")));
        assert!(require(&[("branch", "welcome")]).is_ok());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::ambiguous("Greeting", "source");
        assert_eq!(err.to_string(), "Found multiple nodes matching 'Greeting' in source");

        let err = Error::not_found("node_9", "target");
        assert!(err.to_string().contains("node_9"));
    }
}
