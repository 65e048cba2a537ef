//! Error types for the synchronization engine.
//!
//! Every store-driven operation that fails is reported back to the host as a
//! cancellation whose reason is the `Display` text of the error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the synchronization engine and its collaborators
#[derive(Debug, Error)]
pub enum SyncError {
    /// Incomplete ancestor chain or a path that does not map to a known collection
    #[error("Not found: {0}")]
    NotFound(String),

    /// The configuration forbids writing to the directory tree
    #[error("Trying to write to a read-only location: '{0}'")]
    ReadOnlyViolation(String),

    /// A content-derived identity normalized to the empty string
    #[error("Unable to set empty id from '{0}'")]
    EmptyIdentity(String),

    /// A content-derived identity names a file or directory that is never synchronized
    #[error("Unable to use reserved name '{0}'")]
    ReservedIdentity(String),

    #[error("Unable to open file '{path}': {source}")]
    IoUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write to '{path}': {source}")]
    WriteUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to remove '{path}': {reason}")]
    DeleteFailed { path: PathBuf, reason: String },

    #[error("Unable to rename '{from}' to '{to}': {reason}")]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Sync session is not running")]
    SessionClosed,
}

impl SyncError {
    /// Build a `RenameFailed` for a destination that is already occupied.
    pub fn destination_exists(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        let to = to.into();
        let reason = format!("'{}' already exists", to.display());
        SyncError::RenameFailed {
            from: from.into(),
            to,
            reason,
        }
    }

    /// True for the per-operation failures the store sees as a cancelled task.
    ///
    /// Ambient failures (configuration, storage backend, watcher setup) are
    /// not part of that taxonomy.
    pub fn is_operation_scoped(&self) -> bool {
        !matches!(
            self,
            SyncError::ConfigError(_)
                | SyncError::StorageError(_)
                | SyncError::WatchError(_)
                | SyncError::SessionClosed
        )
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::ConfigError(err.to_string())
    }
}

impl From<sled::Error> for SyncError {
    fn from(err: sled::Error) -> Self {
        SyncError::StorageError(err.to_string())
    }
}

impl From<bincode::Error> for SyncError {
    fn from(err: bincode::Error) -> Self {
        SyncError::StorageError(format!("Serialization failed: {}", err))
    }
}

impl From<notify::Error> for SyncError {
    fn from(err: notify::Error) -> Self {
        SyncError::WatchError(err.to_string())
    }
}
