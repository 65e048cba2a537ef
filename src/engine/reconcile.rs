//! Watcher-origin reconciliation.
//!
//! Everything here is best-effort: failures are logged and dropped, and never
//! reach the store's cancellation channel. Ingestion from disk ignores the
//! read-only flag.

use super::SyncEngine;
use crate::error::SyncError;
use crate::store::StoreAdapter;
use crate::tree::collection_chain_for;
use crate::types::CollectionId;
use crate::watch::{WatchEvent, WatchEventKind};
use notify::Event;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

impl<S: StoreAdapter> SyncEngine<S> {
    /// Classify a raw notification and reconcile each resulting event
    pub fn handle_notification(&mut self, event: &Event) {
        for classified in self.watcher.classify(event) {
            self.dispatch(&classified);
        }
    }

    fn dispatch(&mut self, event: &WatchEvent) {
        match event.kind {
            WatchEventKind::File => self.on_file_changed(&event.path),
            WatchEventKind::Directory => self.on_directory_changed(&event.path),
        }
    }

    /// Report the whole tree again: every collection, then the items of each
    pub fn full_resync(&mut self) {
        let collections = match self.discover_collections() {
            Ok(collections) => collections,
            Err(e) => {
                warn!(error = %e, "Full resynchronization failed");
                return;
            }
        };
        let ids: Vec<CollectionId> = collections.iter().map(|c| c.id).collect();
        self.store.collections_retrieved(collections);
        for id in ids {
            self.report_items(id);
        }
        info!(collections = self.hierarchy.collection_count(), items = self.hierarchy.item_count(), "Full resynchronization done");
    }

    pub fn on_directory_changed(&mut self, dir: &Path) {
        if dir == self.base {
            self.full_resync();
            return;
        }

        let chain = match collection_chain_for(&self.base, dir) {
            Ok(chain) => chain,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Dropping event outside the base directory");
                return;
            }
        };
        if let Some(id) = self.hierarchy.resolve_chain(&chain) {
            self.resync_collection(id);
            return;
        }
        match chain.parent().and_then(|parent| self.hierarchy.resolve_chain(&parent)) {
            Some(parent) => self.resync_collection(parent),
            None => debug!(dir = %dir.display(), "Dropping event for an unknown collection"),
        }
    }

    /// Re-list a collection's subdirectories and files and report the differences
    pub fn resync_collection(&mut self, collection: CollectionId) {
        let dir = match self.directory_for(collection) {
            Ok(dir) => dir,
            Err(e) => {
                debug!(collection = %collection, error = %e, "Dropping resync of unresolved collection");
                return;
            }
        };
        if !dir.is_dir() {
            self.full_resync();
            return;
        }

        match self.reconcile_subdirectories(collection, &dir) {
            Ok((false, _)) => {}
            Ok((true, added)) => {
                let collections = self.tree_nodes();
                self.store.collections_retrieved(collections);
                for id in added {
                    self.report_items(id);
                }
            }
            Err(e) => {
                warn!(collection = %collection, error = %e, "Collection resynchronization failed");
                return;
            }
        }
        self.report_items(collection);
    }

    /// Returns whether the child set changed, and the newly materialized collections
    fn reconcile_subdirectories(
        &mut self,
        collection: CollectionId,
        dir: &Path,
    ) -> Result<(bool, Vec<CollectionId>), SyncError> {
        let on_disk: BTreeSet<String> = self.scanner.list_subdirectories(dir)?.collect();
        let mut changed = false;

        for child in self.hierarchy.children(collection) {
            let Some(remote_id) = self.hierarchy.collection(child).map(|c| c.remote_id.clone()) else {
                continue;
            };
            if !on_disk.contains(&remote_id) {
                self.watcher.remove_watches_under(&dir.join(&remote_id));
                self.hierarchy.remove_subtree(child);
                debug!(collection = %child, "Dropped vanished collection");
                changed = true;
            }
        }

        let mut added = Vec::new();
        for name in on_disk {
            if self
                .hierarchy
                .child_by_remote_id(crate::types::Parent::Collection(collection), &name)
                .is_some()
            {
                continue;
            }
            let child_dir = dir.join(&name);
            let child = self.materialize_child(collection, &name);
            self.watcher.add_watch(&child_dir);
            self.place_marker(&child_dir);
            added.push(child);
            added.extend(self.materialize_below(&child_dir, child)?.into_values());
            debug!(collection = %child, dir = %child_dir.display(), "Materialized new collection");
        }

        Ok((changed || !added.is_empty(), added))
    }

    /// Ingest an externally changed file into the store
    pub fn on_file_changed(&mut self, path: &Path) {
        let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        let name = name.to_string_lossy().to_string();
        let Some(collection) = collection_chain_for(&self.base, dir)
            .ok()
            .and_then(|chain| self.hierarchy.resolve_chain(&chain))
        else {
            debug!(path = %path.display(), "Dropping file event for an unknown collection");
            return;
        };

        let (item, created) = match self.hierarchy.item_by_remote_id(collection, &name) {
            Some(item) => (item, false),
            None => (self.hierarchy.insert_item(name.as_str(), collection), true),
        };
        let previous = self.hierarchy.item(item).and_then(|node| node.content_hash);

        let (node, payload) = match self.fetch_item(item) {
            Ok(fetched) => fetched,
            Err(e) => {
                if created {
                    self.hierarchy.remove_item(item);
                }
                warn!(path = %path.display(), error = %e, "Failed to ingest changed file");
                return;
            }
        };

        if !created && previous.is_some() && previous == node.content_hash {
            debug!(item = %item, "File content matches last synchronized state");
            return;
        }
        if let Some(current) = self.store.fetch_item(item) {
            if current.body == payload.body {
                debug!(item = %item, "Store already holds this content");
                return;
            }
        }

        info!(item = %item, path = %path.display(), new = created, "Ingesting external change");
        self.store.item_retrieved(node, payload);
    }

    fn report_items(&mut self, collection: CollectionId) {
        match self.discover_items(collection) {
            Ok(items) => self.store.items_retrieved(collection, items),
            Err(e) => warn!(collection = %collection, error = %e, "Failed to list items"),
        }
    }

    fn tree_nodes(&self) -> Vec<crate::tree::CollectionNode> {
        let Some(top) = self.hierarchy.top_level() else {
            return Vec::new();
        };
        self.hierarchy
            .subtree(top)
            .into_iter()
            .filter_map(|id| self.hierarchy.collection(id).cloned())
            .collect()
    }
}
