//! Change watcher: per-directory notifications, classification and self-write suppression.

mod events;
mod runtime;
mod suppression;

pub use events::{classify_path, WatchEvent, WatchEventKind};
pub use runtime::{ChangeWatcher, WatchState};
pub use suppression::SuppressionSet;
