//! Change watcher runtime over `notify`.

use super::events::{classify_path, relevant_paths, WatchEvent};
use super::suppression::SuppressionSet;
use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Per-directory watch state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Unwatched,
    Watched,
    /// Watched, with the next notification swallowed
    Suppressed,
}

/// Watches individual directories (non-recursively) and turns raw
/// notifications into classified events.
pub struct ChangeWatcher {
    backend: Option<RecommendedWatcher>,
    watched: BTreeSet<PathBuf>,
    suppression: SuppressionSet,
    filter: IgnoreFilter,
}

impl ChangeWatcher {
    /// Watcher backed by the platform notification facility.
    ///
    /// Every raw notification is handed to `handler` on the notifier's thread.
    pub fn new<F>(filter: IgnoreFilter, suppression_ttl: Duration, handler: F) -> Result<Self, SyncError>
    where
        F: Fn(notify::Result<Event>) + Send + 'static,
    {
        let backend = notify::recommended_watcher(move |res| handler(res))
            .map_err(|e| SyncError::WatchError(format!("Failed to create watcher: {}", e)))?;
        Ok(Self {
            backend: Some(backend),
            watched: BTreeSet::new(),
            suppression: SuppressionSet::new(suppression_ttl),
            filter,
        })
    }

    /// Watcher without an OS backend: tracks state and classifies events that
    /// are fed to it, but never produces notifications itself.
    pub fn detached(filter: IgnoreFilter, suppression_ttl: Duration) -> Self {
        Self {
            backend: None,
            watched: BTreeSet::new(),
            suppression: SuppressionSet::new(suppression_ttl),
            filter,
        }
    }

    /// Start watching `dir`. Idempotent; backend failures are logged, not raised.
    pub fn add_watch(&mut self, dir: &Path) {
        if self.watched.contains(dir) {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.watch(dir, RecursiveMode::NonRecursive) {
                warn!(dir = %dir.display(), error = %e, "Failed to watch directory");
                return;
            }
        }
        debug!(dir = %dir.display(), "Watching directory");
        self.watched.insert(dir.to_path_buf());
    }

    /// Stop watching `dir`. Idempotent.
    pub fn remove_watch(&mut self, dir: &Path) {
        if !self.watched.remove(dir) {
            return;
        }
        self.suppression.release(dir);
        if let Some(backend) = self.backend.as_mut() {
            // The directory may already be gone, in which case the OS dropped the watch.
            if let Err(e) = backend.unwatch(dir) {
                debug!(dir = %dir.display(), error = %e, "Unwatch failed");
            }
        }
        debug!(dir = %dir.display(), "Stopped watching directory");
    }

    /// Stop watching `dir` and every watched directory below it
    pub fn remove_watches_under(&mut self, dir: &Path) {
        let doomed: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|w| w.starts_with(dir))
            .cloned()
            .collect();
        for path in doomed {
            self.remove_watch(&path);
        }
    }

    /// Swallow the next notification addressed to `dir`
    pub fn suppress(&mut self, dir: &Path) {
        self.suppression.suppress(dir);
    }

    pub fn state(&self, dir: &Path) -> WatchState {
        if !self.watched.contains(dir) {
            WatchState::Unwatched
        } else if self.suppression.is_suppressed(dir) {
            WatchState::Suppressed
        } else {
            WatchState::Watched
        }
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }

    pub fn watched(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }

    /// Drop every watch and suppression token
    pub fn clear(&mut self) {
        let all: Vec<PathBuf> = self.watched.iter().cloned().collect();
        for path in all {
            self.remove_watch(&path);
        }
        self.suppression.clear();
    }

    pub fn set_filter(&mut self, filter: IgnoreFilter) {
        self.filter = filter;
    }

    pub fn set_suppression_ttl(&mut self, ttl: Duration) {
        self.suppression.set_ttl(ttl);
    }

    /// Turn a raw notification into classified events.
    ///
    /// Ignored names are dropped, and a live suppression token on the
    /// delivering directory swallows the notification and is consumed.
    pub fn classify(&mut self, event: &Event) -> Vec<WatchEvent> {
        let paths = relevant_paths(event);
        if paths.is_empty() {
            return Vec::new();
        }

        let mut out: Vec<WatchEvent> = Vec::new();
        for path in paths {
            let Some(classified) = classify_path(path, &self.filter) else {
                continue;
            };
            if self.suppression.consume(&classified.watched_dir) {
                debug!(
                    path = %path.display(),
                    dir = %classified.watched_dir.display(),
                    "Suppressed self-inflicted notification"
                );
                continue;
            }
            if !out.contains(&classified) {
                out.push(classified);
            }
        }
        self.suppression.purge_expired();
        out
    }
}
