//! Notesync: Directory-Backed Note Synchronization
//!
//! Keeps a hierarchical collection/item store synchronized with a plain
//! directory tree: each collection is a directory, each item a file. Store-side
//! changes are written through to disk and filesystem changes observed by a
//! per-directory watcher are read back into the store.

pub mod config;
pub mod engine;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod payload;
pub mod resource;
pub mod session;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod watch;

pub use config::{ConfigLoader, SyncConfig};
pub use engine::SyncEngine;
pub use error::SyncError;
pub use payload::{ItemPart, NotePayload, PartSet};
pub use resource::ResourceHandler;
pub use session::{SessionCommand, SyncSession};
pub use store::{MemoryStore, SledStore, StoreAdapter};
