//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::{xdg, SyncConfig};
use crate::error::SyncError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default location of the configuration file (`$XDG_CONFIG_HOME/notesync/config.toml`)
    pub fn default_config_path() -> Result<PathBuf, SyncError> {
        Ok(xdg::config_home()?.join("notesync").join("config.toml"))
    }

    /// Load configuration from the global file and environment.
    pub fn load() -> Result<SyncConfig, SyncError> {
        Ok(MergeService::load()?)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, SyncError> {
        Ok(MergeService::load_from_file(path)?)
    }

    /// Load from `path` when given, otherwise from the standard sources.
    pub fn load_with_override(path: Option<&Path>) -> Result<SyncConfig, SyncError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    /// Write configuration as TOML, creating parent directories.
    pub fn save(config: &SyncConfig, path: &Path) -> Result<(), SyncError> {
        let text = toml::to_string_pretty(config)
            .map_err(|e| SyncError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        std::fs::write(path, text).map_err(|e| {
            SyncError::ConfigError(format!("Failed to write config {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}
