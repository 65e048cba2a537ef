//! Classification of raw filesystem notifications.

use crate::ignore::IgnoreFilter;
use notify::event::ModifyKind;
use notify::{Event, EventKind};
use std::path::{Path, PathBuf};

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    /// A regular file changed; routed to item reconciliation
    File,
    /// A directory changed or an entry vanished; routed to collection reconciliation
    Directory,
}

/// Classified notification
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    /// File or directory the event is about
    pub path: PathBuf,
    /// Directory whose watch delivered the notification
    pub watched_dir: PathBuf,
}

/// Paths carried by the notification kinds the engine reacts to
pub(crate) fn relevant_paths(event: &Event) -> &[PathBuf] {
    match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => &event.paths,
        EventKind::Modify(ModifyKind::Metadata(_)) => &[],
        EventKind::Modify(_) => &event.paths,
        _ => &[],
    }
}

/// Classify one raw path, or `None` if it must be dropped.
///
/// Existing files become file events and existing directories become
/// directory events. A path that no longer exists is reported as a directory
/// event on its containing directory.
pub fn classify_path(path: &Path, filter: &IgnoreFilter) -> Option<WatchEvent> {
    if filter.is_ignored_path(path) {
        return None;
    }
    let watched_dir = path.parent()?.to_path_buf();

    if path.is_dir() {
        Some(WatchEvent {
            kind: WatchEventKind::Directory,
            path: path.to_path_buf(),
            watched_dir,
        })
    } else if path.is_file() {
        Some(WatchEvent {
            kind: WatchEventKind::File,
            path: path.to_path_buf(),
            watched_dir,
        })
    } else {
        Some(WatchEvent {
            kind: WatchEventKind::Directory,
            path: watched_dir.clone(),
            watched_dir,
        })
    }
}
