//! StorageConfig and path resolution for the persistent host store.

use crate::config::xdg;
use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Location of the sled store; defaults to the per-tree XDG data directory
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the store location for the tree rooted at `base_path`.
    pub fn resolve_store_path(&self, base_path: &Path) -> Result<PathBuf, SyncError> {
        match &self.store_path {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(xdg::tree_data_dir(base_path)?.join(path)),
            None => Ok(xdg::tree_data_dir(base_path)?.join("store")),
        }
    }
}
