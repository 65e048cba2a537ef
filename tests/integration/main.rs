//! Integration tests for the notesync synchronization engine

mod discovery;
mod live_session;
mod properties;
mod store_driven;
mod support;
mod watcher_driven;
