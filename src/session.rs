//! Serialized sync session.
//!
//! One worker thread owns the engine. Store callbacks and raw watcher
//! notifications share a single queue and are applied one at a time, so no two
//! mutations of the tree ever run concurrently.

use crate::config::SyncConfig;
use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::payload::{NotePayload, PartSet};
use crate::resource::ResourceHandler;
use crate::store::StoreAdapter;
use crate::types::{CollectionId, ItemId};
use crate::watch::ChangeWatcher;
use notify::Event;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Store callback queued for the worker
#[derive(Debug, Clone)]
pub enum SessionCommand {
    RetrieveCollections,
    RetrieveItems(CollectionId),
    RetrieveItem {
        item: ItemId,
        parts: PartSet,
    },
    ItemAdded {
        collection: CollectionId,
        payload: NotePayload,
    },
    ItemChanged {
        item: ItemId,
        payload: NotePayload,
        parts: PartSet,
    },
    ItemRemoved(ItemId),
    ItemMoved {
        item: ItemId,
        source: CollectionId,
        destination: CollectionId,
    },
    CollectionAdded {
        parent: CollectionId,
        name: String,
    },
    CollectionChanged {
        collection: CollectionId,
        name: String,
    },
    CollectionRemoved(CollectionId),
    CollectionMoved {
        collection: CollectionId,
        source: CollectionId,
        destination: CollectionId,
    },
    Configure(SyncConfig),
    /// Full resynchronization: every collection and the items of each
    Synchronize,
}

enum SessionMessage {
    Command(SessionCommand),
    Notification(notify::Result<Event>),
    Shutdown,
}

/// Handle to a running sync worker
pub struct SyncSession {
    sender: mpsc::Sender<SessionMessage>,
    running: Arc<RwLock<bool>>,
    worker: Option<JoinHandle<()>>,
}

impl SyncSession {
    /// Start a session watching the configured tree with the platform watcher
    pub fn start<S>(config: SyncConfig, store: S) -> Result<Self, SyncError>
    where
        S: StoreAdapter + 'static,
    {
        Self::start_with_settings(config, store, None)
    }

    /// Like `start`, persisting the configuration to `settings_path` on shutdown
    pub fn start_with_settings<S>(
        config: SyncConfig,
        store: S,
        settings_path: Option<PathBuf>,
    ) -> Result<Self, SyncError>
    where
        S: StoreAdapter + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let notify_tx = tx.clone();
        let watcher = ChangeWatcher::new(
            config.ignore_filter(),
            config.suppression_ttl(),
            move |res| {
                if notify_tx.send(SessionMessage::Notification(res)).is_err() {
                    debug!("Notification arrived after the session stopped");
                }
            },
        )?;

        let mut engine = SyncEngine::new(config, store, watcher)?;
        if let Some(path) = settings_path {
            engine = engine.with_settings_path(path);
        }

        let running = Arc::new(RwLock::new(true));
        let worker_running = Arc::clone(&running);
        let worker = thread::Builder::new()
            .name("notesync-worker".to_string())
            .spawn(move || run_worker(engine, rx, worker_running))
            .map_err(|e| SyncError::WatchError(format!("Failed to spawn sync worker: {}", e)))?;

        info!("Sync session started");
        Ok(Self {
            sender: tx,
            running,
            worker: Some(worker),
        })
    }

    /// Queue a store callback
    pub fn send(&self, command: SessionCommand) -> Result<(), SyncError> {
        if !self.is_running() {
            return Err(SyncError::SessionClosed);
        }
        self.sender
            .send(SessionMessage::Command(command))
            .map_err(|_| SyncError::SessionClosed)
    }

    /// Queue a full resynchronization
    pub fn synchronize(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::Synchronize)
    }

    pub fn is_running(&self) -> bool {
        *self.running.read()
    }

    /// Stop the worker after the queued work and wait for it
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    /// Block until the worker stops; with no other shutdown path this lasts
    /// until the process is interrupted
    pub fn wait(mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Sync worker panicked");
            }
        }
    }

    fn stop_and_join(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = self.sender.send(SessionMessage::Shutdown);
        if worker.join().is_err() {
            error!("Sync worker panicked");
        }
        *self.running.write() = false;
        info!("Sync session stopped");
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run_worker<S: StoreAdapter>(
    mut engine: SyncEngine<S>,
    rx: mpsc::Receiver<SessionMessage>,
    running: Arc<RwLock<bool>>,
) {
    // The watcher backend inside the engine holds a sender of its own, so the
    // channel stays open until an explicit shutdown
    loop {
        match rx.recv() {
            Ok(SessionMessage::Command(command)) => apply(&mut engine, command),
            Ok(SessionMessage::Notification(Ok(event))) => engine.handle_notification(&event),
            Ok(SessionMessage::Notification(Err(e))) => warn!(error = %e, "Watch error"),
            Ok(SessionMessage::Shutdown) => break,
            Err(_) => {
                debug!("Session channel disconnected");
                break;
            }
        }
    }
    *running.write() = false;
    engine.about_to_quit();
}

fn apply<S: StoreAdapter>(engine: &mut SyncEngine<S>, command: SessionCommand) {
    match command {
        SessionCommand::RetrieveCollections => engine.retrieve_collections(),
        SessionCommand::RetrieveItems(collection) => engine.retrieve_items(collection),
        SessionCommand::RetrieveItem { item, parts } => {
            engine.retrieve_item(item, &parts);
        }
        SessionCommand::ItemAdded {
            collection,
            payload,
        } => engine.item_added(collection, payload),
        SessionCommand::ItemChanged {
            item,
            payload,
            parts,
        } => engine.item_changed(item, payload, &parts),
        SessionCommand::ItemRemoved(item) => engine.item_removed(item),
        SessionCommand::ItemMoved {
            item,
            source,
            destination,
        } => engine.item_moved(item, source, destination),
        SessionCommand::CollectionAdded { parent, name } => engine.collection_added(parent, &name),
        SessionCommand::CollectionChanged { collection, name } => {
            engine.collection_changed(collection, &name)
        }
        SessionCommand::CollectionRemoved(collection) => engine.collection_removed(collection),
        SessionCommand::CollectionMoved {
            collection,
            source,
            destination,
        } => engine.collection_moved(collection, source, destination),
        SessionCommand::Configure(config) => {
            if let Err(e) = engine.configure(config) {
                error!(error = %e, "Reconfiguration failed");
            }
        }
        SessionCommand::Synchronize => engine.full_resync(),
    }
}
