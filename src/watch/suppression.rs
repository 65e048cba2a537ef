//! Single-shot suppression of self-inflicted notifications.
//!
//! Before the engine writes into a directory it registers a token for that
//! directory; the next notification delivered for it consumes the token and is
//! dropped. Tokens expire after a fixed time-to-live so that a write which
//! produced no notification cannot swallow a later external edit.
//!
//! Known gap: a write that yields several notifications only has the first one
//! suppressed, and an external edit racing the engine's own write may be the
//! one that gets dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Transient set of directories whose next notification is ignored
#[derive(Debug, Clone)]
pub struct SuppressionSet {
    entries: HashMap<PathBuf, Instant>,
    ttl: Duration,
}

impl SuppressionSet {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    /// Arm a token for `dir`, refreshing any existing one
    pub fn suppress(&mut self, dir: &Path) {
        self.entries.insert(dir.to_path_buf(), Instant::now());
    }

    /// Consume the token for `dir`. Returns true if the notification must be dropped.
    pub fn consume(&mut self, dir: &Path) -> bool {
        match self.entries.remove(dir) {
            Some(armed_at) => armed_at.elapsed() <= self.ttl,
            None => false,
        }
    }

    /// True if `dir` holds a live token
    pub fn is_suppressed(&self, dir: &Path) -> bool {
        self.entries
            .get(dir)
            .map(|armed_at| armed_at.elapsed() <= self.ttl)
            .unwrap_or(false)
    }

    /// Drop a token without consuming a notification
    pub fn release(&mut self, dir: &Path) {
        self.entries.remove(dir);
    }

    pub fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, armed_at| armed_at.elapsed() <= ttl);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
