//! Store-origin collection operations: discovery, add, rename, removal and move.

use super::SyncEngine;
use crate::error::SyncError;
use crate::store::StoreAdapter;
use crate::tree::{CollectionNode, CollectionRights};
use crate::types::{CollectionId, Parent};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

impl<S: StoreAdapter> SyncEngine<S> {
    /// Build the full collection tree from the base directory.
    ///
    /// Repeated calls over an unchanged tree yield the same ids. Collections
    /// whose directory vanished are dropped with their subtree.
    pub fn discover_collections(&mut self) -> Result<Vec<CollectionNode>, SyncError> {
        let base = self.base.clone();
        let top = self.ensure_top_level(&base);

        let mut by_path = self.materialize_below(&base, top)?;
        by_path.insert(base.clone(), top);

        let keep: BTreeSet<CollectionId> = by_path.values().copied().collect();
        let stale: Vec<CollectionId> = self
            .hierarchy
            .collections()
            .map(|c| c.id)
            .filter(|id| !keep.contains(id))
            .collect();
        for id in stale {
            self.hierarchy.remove_subtree(id);
        }

        let stale_watches: Vec<PathBuf> = self
            .watcher
            .watched()
            .filter(|dir| !by_path.contains_key(*dir))
            .map(Path::to_path_buf)
            .collect();
        for dir in stale_watches {
            self.watcher.remove_watch(&dir);
        }

        let nodes: Vec<CollectionNode> = self
            .hierarchy
            .subtree(top)
            .into_iter()
            .filter_map(|id| self.hierarchy.collection(id).cloned())
            .collect();
        info!(base = %base.display(), collections = nodes.len(), "Discovered collections");
        Ok(nodes)
    }

    /// The top-level collection for `base`, created or refreshed
    fn ensure_top_level(&mut self, base: &Path) -> CollectionId {
        let remote_id = base.to_string_lossy().to_string();
        let top = match self.hierarchy.top_level() {
            Some(id)
                if self
                    .hierarchy
                    .collection(id)
                    .map(|c| c.remote_id == remote_id)
                    .unwrap_or(false) =>
            {
                id
            }
            Some(old) => {
                self.hierarchy.remove_subtree(old);
                self.hierarchy.insert_collection(remote_id, Parent::Root)
            }
            None => self.hierarchy.insert_collection(remote_id, Parent::Root),
        };
        let rights = CollectionRights::supported(self.config.read_only, true);
        let display_name = self.config.display_name.clone();
        if let Some(node) = self.hierarchy.collection_mut(top) {
            node.name = display_name;
            node.rights = rights;
        }
        top
    }

    /// Materialize and watch every directory below `root`, which maps to `root_id`.
    ///
    /// Returns the discovered directories with their collection ids, `root` excluded.
    pub(super) fn materialize_below(
        &mut self,
        root: &Path,
        root_id: CollectionId,
    ) -> Result<BTreeMap<PathBuf, CollectionId>, SyncError> {
        let found = {
            let watcher = &mut self.watcher;
            self.scanner.discover(root, |dir| watcher.add_watch(dir))?
        };

        let mut by_path: BTreeMap<PathBuf, CollectionId> = BTreeMap::new();
        for directory in &found {
            let parent = if directory.parent == root {
                root_id
            } else {
                match by_path.get(&directory.parent) {
                    Some(&parent) => parent,
                    None => continue,
                }
            };
            let id = self.materialize_child(parent, &directory.name);
            by_path.insert(directory.path.clone(), id);
            self.place_marker(&directory.path);
        }
        Ok(by_path)
    }

    /// Child collection `name` under `parent`, inserted if not yet known
    pub(super) fn materialize_child(&mut self, parent: CollectionId, name: &str) -> CollectionId {
        let id = match self
            .hierarchy
            .child_by_remote_id(Parent::Collection(parent), name)
        {
            Some(id) => id,
            None => self
                .hierarchy
                .insert_collection(name, Parent::Collection(parent)),
        };
        let rights = CollectionRights::supported(self.config.read_only, false);
        if let Some(node) = self.hierarchy.collection_mut(id) {
            node.rights = rights;
        }
        id
    }

    /// Create a child collection and its directory
    pub fn add_collection(
        &mut self,
        parent: CollectionId,
        name: &str,
    ) -> Result<CollectionNode, SyncError> {
        let parent_dir = self.directory_for(parent)?;
        self.ensure_writable(&parent_dir.join(name).to_string_lossy())?;

        let remote_id = self.declared_remote_id(name)?;
        if self
            .hierarchy
            .child_by_remote_id(Parent::Collection(parent), &remote_id)
            .is_some()
        {
            return Err(SyncError::WriteUnavailable {
                path: parent_dir.join(&remote_id),
                source: io::Error::new(io::ErrorKind::AlreadyExists, "a collection with this name already exists"),
            });
        }

        let dir = parent_dir.join(&remote_id);
        self.watcher.suppress(&parent_dir);
        fs::create_dir_all(&dir).map_err(|e| SyncError::WriteUnavailable {
            path: dir.clone(),
            source: e,
        })?;
        self.initialize_directory(&dir)?;

        let id = self.materialize_child(parent, &remote_id);
        info!(collection = %id, dir = %dir.display(), "Added collection");
        self.hierarchy
            .collection(id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("Collection {} is unknown", id)))
    }

    /// Apply a changed declared name.
    ///
    /// Renaming the top-level collection only updates its display name.
    /// Returns `None` when nothing changed on disk.
    pub fn rename_collection(
        &mut self,
        collection: CollectionId,
        name: &str,
    ) -> Result<Option<CollectionNode>, SyncError> {
        let node = self
            .hierarchy
            .collection(collection)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("Collection {} is unknown", collection)))?;
        let from = self.directory_for(collection)?;
        self.ensure_writable(&from.to_string_lossy())?;

        if node.is_top_level() {
            if let Some(top) = self.hierarchy.collection_mut(collection) {
                top.name = name.to_string();
            }
            self.config.display_name = name.to_string();
            debug!(collection = %collection, name, "Top-level display name changed");
            return Ok(None);
        }

        let remote_id = self.declared_remote_id(name)?;
        if remote_id == node.remote_id {
            return Ok(None);
        }

        let parent_dir = match from.parent() {
            Some(dir) => dir.to_path_buf(),
            None => return Err(SyncError::NotFound(format!("Collection {} has no parent directory", collection))),
        };
        let to = parent_dir.join(&remote_id);
        self.relocate_directory(collection, &from, &to, &[parent_dir])?;

        if let Some(node) = self.hierarchy.collection_mut(collection) {
            node.remote_id = remote_id.clone();
            node.name = remote_id;
        }
        self.watch_subtree(collection);
        info!(collection = %collection, from = %from.display(), to = %to.display(), "Renamed collection");
        Ok(self.hierarchy.collection(collection).cloned())
    }

    /// Delete a collection's directory tree.
    ///
    /// A failed deletion aborts the removal and leaves the partially deleted
    /// tree in place.
    pub fn remove_collection(&mut self, collection: CollectionId) -> Result<(), SyncError> {
        let Some(node) = self.hierarchy.collection(collection).cloned() else {
            self.ensure_writable(&collection.to_string())?;
            return Ok(());
        };
        let dir = self.directory_for(collection)?;
        self.ensure_writable(&dir.to_string_lossy())?;
        if node.is_top_level() {
            return Err(SyncError::ReadOnlyViolation(format!(
                "{} (the top-level collection cannot be removed)",
                dir.display()
            )));
        }

        self.watcher.remove_watches_under(&dir);
        if let Some(parent) = dir.parent() {
            self.watcher.suppress(parent);
        }
        if dir.exists() {
            if let Err(e) = delete_tree(&dir) {
                self.watch_subtree(collection);
                return Err(e);
            }
        }

        let (collections, items) = self.hierarchy.remove_subtree(collection);
        info!(
            collection = %collection,
            dir = %dir.display(),
            collections = collections.len(),
            items = items.len(),
            "Removed collection"
        );
        Ok(())
    }

    /// Move a collection's directory under another parent
    pub fn move_collection(
        &mut self,
        collection: CollectionId,
        source: CollectionId,
        destination: CollectionId,
    ) -> Result<(), SyncError> {
        let node = self
            .hierarchy
            .collection(collection)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("Collection {} is unknown", collection)))?;
        let from = self.directory_for(collection)?;
        self.ensure_writable(&from.to_string_lossy())?;
        if node.is_top_level() {
            return Err(SyncError::RenameFailed {
                from: from.clone(),
                to: from,
                reason: "the top-level collection cannot be moved".to_string(),
            });
        }
        if source == destination {
            return Ok(());
        }

        let destination_dir = self.directory_for(destination)?;
        let to = destination_dir.join(&node.remote_id);
        if self.hierarchy.subtree(collection).contains(&destination) {
            return Err(SyncError::RenameFailed {
                from,
                to,
                reason: "cannot move a collection into itself".to_string(),
            });
        }

        let source_dir = self.directory_for(source)?;
        self.relocate_directory(collection, &from, &to, &[source_dir, destination_dir])?;

        if let Some(node) = self.hierarchy.collection_mut(collection) {
            node.parent = Parent::Collection(destination);
        }
        self.watch_subtree(collection);
        info!(collection = %collection, from = %from.display(), to = %to.display(), "Moved collection");
        Ok(())
    }

    /// Rename a directory without overwriting, re-watching the old subtree on failure
    fn relocate_directory(
        &mut self,
        collection: CollectionId,
        from: &Path,
        to: &Path,
        touched: &[PathBuf],
    ) -> Result<(), SyncError> {
        if to.exists() {
            return Err(SyncError::destination_exists(from, to));
        }

        self.watcher.remove_watches_under(from);
        for dir in touched {
            self.watcher.suppress(dir);
        }
        if let Err(e) = fs::rename(from, to) {
            self.watch_subtree(collection);
            return Err(SyncError::RenameFailed {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}

/// Delete files depth-first, then each emptied directory. Symlinks are removed, never followed.
fn delete_tree(dir: &Path) -> Result<(), SyncError> {
    for entry in WalkDir::new(dir).follow_links(false).contents_first(true) {
        let entry = entry.map_err(|e| SyncError::DeleteFailed {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        let result = if entry.file_type().is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Deletion failed, aborting collection removal");
            return Err(SyncError::DeleteFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    }
    Ok(())
}
