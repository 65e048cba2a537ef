//! Store-origin item operations: discovery, fetch, save, removal and move.

use super::SyncEngine;
use crate::error::SyncError;
use crate::payload::NotePayload;
use crate::store::StoreAdapter;
use crate::tree::hasher::{content_hash, short_hex};
use crate::tree::ItemNode;
use crate::types::{CollectionId, ItemId};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

impl<S: StoreAdapter> SyncEngine<S> {
    /// List the files of a collection as item stubs; content stays on disk.
    ///
    /// Known items keep their ids. Items whose file is gone are dropped.
    pub fn discover_items(&mut self, collection: CollectionId) -> Result<Vec<ItemNode>, SyncError> {
        let dir = self.directory_for(collection)?;
        let mut names: Vec<String> = self.scanner.list_items(&dir)?.collect();
        names.sort();

        let mut seen = BTreeSet::new();
        let mut nodes = Vec::with_capacity(names.len());
        for name in names {
            let id = match self.hierarchy.item_by_remote_id(collection, &name) {
                Some(id) => id,
                None => self.hierarchy.insert_item(name.as_str(), collection),
            };
            seen.insert(id);
            let (created, modified) = file_times(&dir.join(&name));
            if let Some(node) = self.hierarchy.item_mut(id) {
                node.modified = modified;
                node.created = created.or(modified);
                nodes.push(node.clone());
            }
        }

        for stale in self.hierarchy.items_in(collection) {
            if !seen.contains(&stale) {
                self.hierarchy.remove_item(stale);
            }
        }

        debug!(collection = %collection, items = nodes.len(), "Discovered items");
        Ok(nodes)
    }

    /// Read an item's file in full.
    ///
    /// The payload's declared title is the remote id, and the file's
    /// modification time is recorded as provenance.
    pub fn fetch_item(&mut self, item: ItemId) -> Result<(ItemNode, NotePayload), SyncError> {
        let path = self.file_for(item)?;
        let body = fs::read(&path).map_err(|e| SyncError::IoUnavailable {
            path: path.clone(),
            source: e,
        })?;
        let (created, modified) = file_times(&path);
        let hash = content_hash(&body);

        let node = self
            .hierarchy
            .item_mut(item)
            .ok_or_else(|| SyncError::NotFound(format!("Item {} is unknown", item)))?;
        node.content_hash = Some(hash);
        node.modified = modified;
        node.created = created.or(modified);
        let node = node.clone();

        let mut payload = NotePayload::new(node.remote_id.clone(), body);
        payload.created = node.created;
        payload.last_modified = modified;
        debug!(item = %item, hash = %short_hex(&hash), "Fetched item");
        Ok((node, payload))
    }

    /// Write an item to disk.
    ///
    /// `existing` is `None` for a store-side add. Returns `None` when there
    /// was nothing to save, otherwise the committed node.
    pub fn save_item(
        &mut self,
        existing: Option<ItemId>,
        collection: CollectionId,
        payload: &NotePayload,
        save_head: bool,
        save_body: bool,
    ) -> Result<Option<ItemNode>, SyncError> {
        if !save_head && !save_body {
            return Ok(None);
        }

        let dir = self.directory_for(collection)?;
        let current = existing
            .and_then(|id| self.hierarchy.item(id))
            .map(|node| node.remote_id.clone())
            .unwrap_or_default();
        let shown = if current.is_empty() { &payload.title } else { &current };
        self.ensure_writable(&dir.join(shown).to_string_lossy())?;

        let remote_id = if save_head || current.is_empty() {
            self.declared_remote_id(&payload.title)?
        } else {
            current.clone()
        };

        let target = dir.join(&remote_id);
        let mut renamed_from = None;
        if !current.is_empty() && current != remote_id {
            let source = dir.join(&current);
            if target.exists() || self.hierarchy.item_by_remote_id(collection, &remote_id).is_some() {
                return Err(SyncError::destination_exists(source, target));
            }
            if source.exists() {
                self.watcher.suppress(&dir);
                fs::rename(&source, &target).map_err(|e| SyncError::RenameFailed {
                    from: source.clone(),
                    to: target.clone(),
                    reason: e.to_string(),
                })?;
                renamed_from = Some(source);
            }
        } else if current.is_empty()
            && (target.exists() || self.hierarchy.item_by_remote_id(collection, &remote_id).is_some())
        {
            return Err(SyncError::WriteUnavailable {
                path: target,
                source: io::Error::new(io::ErrorKind::AlreadyExists, "an item with this name already exists"),
            });
        }

        if save_body {
            self.watcher.suppress(&dir);
            if let Err(e) = write_file(&target, &payload.body) {
                if let Some(source) = &renamed_from {
                    if let Err(undo) = fs::rename(&target, source) {
                        warn!(
                            from = %target.display(),
                            to = %source.display(),
                            error = %undo,
                            "Failed to undo rename after a failed write"
                        );
                        return Err(SyncError::RenameFailed {
                            from: source.clone(),
                            to: target,
                            reason: format!("write failed ({}) and the rename could not be undone ({})", e, undo),
                        });
                    }
                }
                return Err(SyncError::WriteUnavailable {
                    path: target,
                    source: e,
                });
            }
        }

        let id = match existing {
            Some(id) if self.hierarchy.item(id).is_some() => id,
            _ => self.hierarchy.insert_item(remote_id.as_str(), collection),
        };
        let (created, modified) = file_times(&target);
        let node = self
            .hierarchy
            .item_mut(id)
            .ok_or_else(|| SyncError::NotFound(format!("Item {} is unknown", id)))?;
        node.remote_id = remote_id;
        node.modified = modified;
        if node.created.is_none() {
            node.created = created.or(modified);
        }
        if save_body {
            node.content_hash = Some(content_hash(&payload.body));
        }

        info!(
            item = %id,
            file = %target.display(),
            renamed = renamed_from.is_some(),
            "Saved item"
        );
        Ok(Some(node.clone()))
    }

    /// Delete an item's file.
    ///
    /// An item that is unknown, or whose collection is gone, counts as handled.
    pub fn remove_item(&mut self, item: ItemId) -> Result<(), SyncError> {
        let Some(node) = self.hierarchy.item(item).cloned() else {
            self.ensure_writable(&item.to_string())?;
            return Ok(());
        };
        let dir = match self.directory_for(node.parent) {
            Ok(dir) => dir,
            Err(_) => {
                self.ensure_writable(&node.remote_id)?;
                debug!(item = %item, "Parent collection is gone, nothing to remove");
                self.hierarchy.remove_item(item);
                return Ok(());
            }
        };
        let path = dir.join(&node.remote_id);
        self.ensure_writable(&path.to_string_lossy())?;
        if node.remote_id.is_empty() {
            self.hierarchy.remove_item(item);
            return Ok(());
        }

        if path.exists() {
            self.watcher.suppress(&dir);
            fs::remove_file(&path).map_err(|e| SyncError::DeleteFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }
        self.hierarchy.remove_item(item);
        info!(item = %item, file = %path.display(), "Removed item");
        Ok(())
    }

    /// Move an item's file into another collection, keeping its name
    pub fn move_item(
        &mut self,
        item: ItemId,
        source: CollectionId,
        destination: CollectionId,
    ) -> Result<(), SyncError> {
        let node = self
            .hierarchy
            .item(item)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("Item {} is unknown", item)))?;
        let source_dir = self.directory_for(source)?;
        let from = source_dir.join(&node.remote_id);
        self.ensure_writable(&from.to_string_lossy())?;
        if source == destination {
            return Ok(());
        }

        let destination_dir = self.directory_for(destination)?;
        let to = destination_dir.join(&node.remote_id);
        if to.exists() || self.hierarchy.item_by_remote_id(destination, &node.remote_id).is_some() {
            return Err(SyncError::destination_exists(from, to));
        }

        self.watcher.suppress(&source_dir);
        self.watcher.suppress(&destination_dir);
        fs::rename(&from, &to).map_err(|e| SyncError::RenameFailed {
            from: from.clone(),
            to: to.clone(),
            reason: e.to_string(),
        })?;

        if let Some(node) = self.hierarchy.item_mut(item) {
            node.parent = destination;
        }
        info!(item = %item, from = %from.display(), to = %to.display(), "Moved item");
        Ok(())
    }
}

/// Truncate and rewrite `path` in full
fn write_file(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(body)?;
    file.flush()
}

/// Creation and modification times of a file, when the platform reports them
pub(super) fn file_times(path: &Path) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match fs::metadata(path) {
        Ok(metadata) => (
            metadata.created().ok().map(DateTime::<Utc>::from),
            metadata.modified().ok().map(DateTime::<Utc>::from),
        ),
        Err(_) => (None, None),
    }
}
