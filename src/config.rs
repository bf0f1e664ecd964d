//! Configuration file support for dialog-graft
//!
//! Reads from .dialog-graft/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `store.workspace_dir`
pub const WORKSPACE_DIR_ENV: &str = "DIALOG_GRAFT_WORKSPACE_DIR";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Where workspace exports live
    #[serde(default)]
    pub store: StoreConfig,

    /// Branch copy defaults
    #[serde(default)]
    pub copy: CopyConfig,

    /// Log filter used when neither RUST_LOG nor --verbose is given
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// Directory holding one `<workspace>.json` export per workspace
    /// Default: "workspaces"
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CopyConfig {
    /// Insert mode used when --insert-as is not given
    /// Default: "child"
    #[serde(default = "default_insert_as")]
    pub default_insert_as: String,

    /// Treat unknown insert modes as "child" instead of rejecting them
    /// Default: false
    #[serde(default)]
    pub lenient_insert_mode: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// tracing-subscriber filter directive
    /// Default: "warn"
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from("workspaces")
}

fn default_insert_as() -> String {
    "child".to_string()
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace_dir(),
        }
    }
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            default_insert_as: default_insert_as(),
            lenient_insert_mode: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Config {
    /// Load config from .dialog-graft/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        let mut config = Self::find_config_path()
            .and_then(|path| Self::from_file(&path))
            .unwrap_or_default();
        if let Ok(dir) = std::env::var(WORKSPACE_DIR_ENV) {
            if !dir.is_empty() {
                config.store.workspace_dir = PathBuf::from(dir);
            }
        }
        config
    }

    /// Parse a config file; unreadable or invalid files count as absent
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("ignoring invalid config {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".dialog-graft").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }
}
