//! Synchronization Engine
//!
//! Keeps the host store's collections and items consistent with the directory
//! tree under the configured base path. Store-driven changes are written
//! through to disk; watcher-driven changes are read back into the store.
//!
//! The engine owns the identity arena exclusively. All operations run on one
//! logical worker; see `session` for the serialized queue in front of it.

mod collections;
mod items;
mod reconcile;

use crate::config::{ConfigLoader, SyncConfig};
use crate::error::SyncError;
use crate::payload::{normalize_title, save_flags, NotePayload, PartSet};
use crate::resource::ResourceHandler;
use crate::store::StoreAdapter;
use crate::tree::{checked_path_for, path_for, DirectoryScanner, Hierarchy, ItemNode};
use crate::types::{CollectionId, ItemId};
use crate::watch::ChangeWatcher;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Text written into the optional marker file of each managed directory
pub const MARKER_TEXT: &str = "This directory is managed by notesync.\n\
Every file in it is synchronized as a note; edits made here are picked up automatically.\n";

/// Sync engine bound to one store adapter
pub struct SyncEngine<S: StoreAdapter> {
    config: SyncConfig,
    base: PathBuf,
    hierarchy: Hierarchy,
    scanner: DirectoryScanner,
    watcher: ChangeWatcher,
    store: S,
    settings_path: Option<PathBuf>,
}

impl<S: StoreAdapter> SyncEngine<S> {
    /// Create an engine and initialize the base directory.
    ///
    /// No discovery runs until the host asks for collections.
    pub fn new(config: SyncConfig, store: S, watcher: ChangeWatcher) -> Result<Self, SyncError> {
        let mut config = config;
        config.validate()?;
        create_base_directory(&config)?;

        let base = config.resolved_base_path();
        let scanner = DirectoryScanner::new(config.ignore_filter());
        let mut engine = Self {
            config,
            base: base.clone(),
            hierarchy: Hierarchy::new(),
            scanner,
            watcher,
            store,
            settings_path: None,
        };
        engine.initialize_directory(&base)?;
        info!(base = %base.display(), read_only = engine.config.read_only, "Sync engine ready");
        Ok(engine)
    }

    /// Engine whose watcher has no OS backend
    pub fn detached(config: SyncConfig, store: S) -> Result<Self, SyncError> {
        let watcher = ChangeWatcher::detached(config.ignore_filter(), config.suppression_ttl());
        Self::new(config, store, watcher)
    }

    /// Persist the configuration to `path` on `about_to_quit`
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Canonical base directory; the top-level collection's remote id
    pub fn base_path(&self) -> &Path {
        &self.base
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn watcher(&self) -> &ChangeWatcher {
        &self.watcher
    }

    /// Directory of a collection
    pub fn directory_for(&self, collection: CollectionId) -> Result<PathBuf, SyncError> {
        checked_path_for(&self.hierarchy, collection, &self.base)
    }

    /// Full path of an item's file
    pub fn file_for(&self, item: ItemId) -> Result<PathBuf, SyncError> {
        let node = self
            .hierarchy
            .item(item)
            .ok_or_else(|| SyncError::NotFound(format!("Item {} is unknown", item)))?;
        if node.remote_id.is_empty() {
            return Err(SyncError::NotFound(format!("Item {} has no remote id", item)));
        }
        Ok(self.directory_for(node.parent)?.join(&node.remote_id))
    }

    /// Normalize a declared name into a remote id the scanner will list again
    fn declared_remote_id(&self, declared: &str) -> Result<String, SyncError> {
        let remote_id = normalize_title(declared);
        if remote_id.is_empty() {
            return Err(SyncError::EmptyIdentity(declared.to_string()));
        }
        if self.scanner.is_ignored_name(&remote_id) {
            return Err(SyncError::ReservedIdentity(remote_id));
        }
        Ok(remote_id)
    }

    fn ensure_writable(&self, target: &str) -> Result<(), SyncError> {
        if self.config.read_only {
            return Err(SyncError::ReadOnlyViolation(target.to_string()));
        }
        Ok(())
    }

    /// Create `dir` if missing, watch it and materialize the marker file.
    fn initialize_directory(&mut self, dir: &Path) -> Result<(), SyncError> {
        if !dir.is_dir() {
            fs::create_dir_all(dir).map_err(|e| SyncError::WriteUnavailable {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        self.watcher.add_watch(dir);
        self.place_marker(dir);
        Ok(())
    }

    /// Write the configured marker file into `dir` if it is missing
    fn place_marker(&mut self, dir: &Path) {
        if self.config.read_only {
            return;
        }
        let Some(marker) = self.config.marker_file.clone() else {
            return;
        };
        let marker_path = dir.join(marker);
        // Not suppressed: the ignore filter already drops the marker's own event
        if marker_path.exists() {
            return;
        }
        if let Err(e) = fs::write(&marker_path, MARKER_TEXT) {
            warn!(path = %marker_path.display(), error = %e, "Failed to write marker file");
        }
    }

    /// Watch every directory of a subtree at its current location
    fn watch_subtree(&mut self, collection: CollectionId) {
        for id in self.hierarchy.subtree(collection) {
            match path_for(&self.hierarchy, id) {
                Ok(dir) => self.watcher.add_watch(&dir),
                Err(e) => warn!(collection = %id, error = %e, "Cannot watch collection"),
            }
        }
    }

    /// Report a store-driven result: `on_ok` on success, cancellation otherwise
    fn answer<T>(&mut self, operation: &str, result: Result<T, SyncError>, on_ok: impl FnOnce(&mut S, T)) {
        match result {
            Ok(value) => on_ok(&mut self.store, value),
            Err(e) => {
                warn!(operation, error = %e, "Store-driven operation failed");
                self.store.cancel_task(&e.to_string());
            }
        }
    }

    /// Drop cached identity state and re-run discovery under a new configuration
    pub fn reconfigure(&mut self, config: SyncConfig) -> Result<(), SyncError> {
        let mut config = config;
        config.validate()?;
        create_base_directory(&config)?;

        self.hierarchy.clear();
        self.watcher.clear();
        self.watcher.set_filter(config.ignore_filter());
        self.watcher.set_suppression_ttl(config.suppression_ttl());
        self.scanner = DirectoryScanner::new(config.ignore_filter());
        self.base = config.resolved_base_path();
        self.config = config;

        let base = self.base.clone();
        self.initialize_directory(&base)?;
        info!(base = %base.display(), "Configuration applied, resynchronizing");
        self.full_resync();
        Ok(())
    }
}

/// The payload as the store should hold it: titled with the file name in use
fn committed_payload(node: &ItemNode, payload: NotePayload) -> NotePayload {
    NotePayload {
        title: node.remote_id.clone(),
        ..payload
    }
}

fn create_base_directory(config: &SyncConfig) -> Result<(), SyncError> {
    if config.base_path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(&config.base_path).map_err(|e| SyncError::WriteUnavailable {
        path: config.base_path.clone(),
        source: e,
    })
}

impl<S: StoreAdapter> ResourceHandler for SyncEngine<S> {
    fn retrieve_collections(&mut self) {
        let result = self.discover_collections();
        self.answer("retrieve_collections", result, |store, collections| {
            store.collections_retrieved(collections)
        });
    }

    fn retrieve_items(&mut self, collection: CollectionId) {
        let result = self.discover_items(collection);
        self.answer("retrieve_items", result, |store, items| {
            store.items_retrieved(collection, items)
        });
    }

    fn retrieve_item(&mut self, item: ItemId, parts: &PartSet) -> bool {
        debug!(item = %item, parts = ?parts, "Retrieving item");
        let result = self.fetch_item(item);
        let ok = result.is_ok();
        self.answer("retrieve_item", result, |store, (node, payload)| {
            store.item_retrieved(node, payload)
        });
        ok
    }

    fn item_added(&mut self, collection: CollectionId, payload: NotePayload) {
        let result = self.save_item(None, collection, &payload, true, true);
        self.answer("item_added", result, |store, node| match node {
            Some(node) => {
                let payload = committed_payload(&node, payload);
                store.item_committed(node, Some(payload))
            }
            None => store.change_processed(),
        });
    }

    fn item_changed(&mut self, item: ItemId, payload: NotePayload, parts: &PartSet) {
        let (save_head, save_body) = save_flags(parts);
        let result = match self.hierarchy.item(item) {
            Some(node) => {
                let parent = node.parent;
                self.save_item(Some(item), parent, &payload, save_head, save_body)
            }
            None => Err(SyncError::NotFound(format!("Item {} is unknown", item))),
        };
        self.answer("item_changed", result, |store, node| match node {
            Some(node) => {
                let payload = committed_payload(&node, payload);
                store.item_committed(node, Some(payload))
            }
            None => store.change_processed(),
        });
    }

    fn item_removed(&mut self, item: ItemId) {
        let result = self.remove_item(item);
        self.answer("item_removed", result, |store, _| store.change_processed());
    }

    fn item_moved(&mut self, item: ItemId, source: CollectionId, destination: CollectionId) {
        let result = self.move_item(item, source, destination);
        self.answer("item_moved", result, |store, _| store.change_processed());
    }

    fn collection_added(&mut self, parent: CollectionId, name: &str) {
        let result = self.add_collection(parent, name);
        self.answer("collection_added", result, |store, node| {
            store.collection_committed(node)
        });
    }

    fn collection_changed(&mut self, collection: CollectionId, name: &str) {
        let result = self.rename_collection(collection, name);
        self.answer("collection_changed", result, |store, node| match node {
            Some(node) => store.collection_committed(node),
            None => store.change_processed(),
        });
    }

    fn collection_removed(&mut self, collection: CollectionId) {
        let result = self.remove_collection(collection);
        self.answer("collection_removed", result, |store, _| store.change_processed());
    }

    fn collection_moved(
        &mut self,
        collection: CollectionId,
        source: CollectionId,
        destination: CollectionId,
    ) {
        let result = self.move_collection(collection, source, destination);
        self.answer("collection_moved", result, |store, _| store.change_processed());
    }

    fn configure(&mut self, config: SyncConfig) -> Result<(), SyncError> {
        self.reconfigure(config)
    }

    fn about_to_quit(&mut self) {
        if let Some(path) = self.settings_path.clone() {
            if let Err(e) = ConfigLoader::save(&self.config, &path) {
                warn!(error = %e, "Failed to persist configuration on shutdown");
            }
        }
        info!("Sync engine shutting down");
    }
}
