//! Configuration
//!
//! `SyncConfig` is an explicit value handed to the engine at construction and
//! again on reconfiguration; there is no global settings state.

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod workspace;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::storage_paths::StorageConfig;

use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub(crate) fn default_base_path() -> PathBuf {
    xdg::data_home()
        .map(|home| home.join("notesync").join("notes"))
        .unwrap_or_else(|| PathBuf::from("notes"))
}

pub(crate) fn default_display_name() -> String {
    "Notes".to_string()
}

pub(crate) fn default_ignore_patterns() -> Vec<String> {
    vec!["*.swp".to_string(), "*.tmp".to_string(), "4913".to_string()]
}

pub(crate) fn default_suppression_ttl_ms() -> u64 {
    2000
}

/// Synchronization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory mirrored by the top-level collection
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Block every store-driven write to the directory tree
    #[serde(default)]
    pub read_only: bool,

    /// Display name of the top-level collection
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Warning file written into each managed directory, never treated as an item
    #[serde(default)]
    pub marker_file: Option<String>,

    /// Extra glob patterns for names that are never synchronized
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Lifetime of an unconsumed suppression token
    #[serde(default = "default_suppression_ttl_ms")]
    pub suppression_ttl_ms: u64,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            read_only: false,
            display_name: default_display_name(),
            marker_file: None,
            ignore_patterns: default_ignore_patterns(),
            suppression_ttl_ms: default_suppression_ttl_ms(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Configuration for a given base directory with all other settings defaulted
    pub fn for_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    pub fn suppression_ttl(&self) -> Duration {
        Duration::from_millis(self.suppression_ttl_ms)
    }

    pub fn ignore_filter(&self) -> IgnoreFilter {
        IgnoreFilter::new(self.marker_file.clone(), self.ignore_patterns.clone())
    }

    /// Base path as used for the top-level remote id: absolute, and
    /// canonical when the directory already exists.
    pub fn resolved_base_path(&self) -> PathBuf {
        if let Ok(canonical) = dunce::canonicalize(&self.base_path) {
            return canonical;
        }
        if self.base_path.is_absolute() {
            return self.base_path.clone();
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&self.base_path))
            .unwrap_or_else(|_| self.base_path.clone())
    }

    /// Check the base path.
    ///
    /// An empty path or an existing non-directory is rejected. An existing
    /// directory that is not writable forces the read-only flag on.
    pub fn validate(&mut self) -> Result<(), SyncError> {
        if self.base_path.as_os_str().is_empty() {
            return Err(SyncError::ConfigError("The selected path is empty.".to_string()));
        }
        if let Some(marker) = &self.marker_file {
            if marker.is_empty() || marker.contains('/') {
                return Err(SyncError::ConfigError(format!(
                    "Invalid marker file name '{}'",
                    marker
                )));
            }
        }
        match std::fs::metadata(&self.base_path) {
            Ok(metadata) if !metadata.is_dir() => Err(SyncError::ConfigError(format!(
                "The selected path '{}' is not a directory.",
                self.base_path.display()
            ))),
            Ok(metadata) => {
                if metadata.permissions().readonly() && !self.read_only {
                    warn!(
                        base_path = %self.base_path.display(),
                        "Base directory is not writable, forcing read-only mode"
                    );
                    self.read_only = true;
                }
                Ok(())
            }
            Err(_) => Ok(()),
        }
    }
}
