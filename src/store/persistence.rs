//! Sled-backed host store.
//!
//! Mirrors the engine's reports on disk so the CLI can inspect the last known
//! state of the tree. Values are bincode-encoded nodes keyed by big-endian ids.
//!
//! Ids are assigned per engine run, so a record reported under a known id may
//! denote a different file or directory than last time. A payload is only kept
//! while its item keeps the remote id and parent it was stored under.

use super::StoreAdapter;
use crate::error::SyncError;
use crate::payload::NotePayload;
use crate::tree::{CollectionNode, ItemNode};
use crate::types::{CollectionId, ItemId};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, error, warn};

const COLLECTIONS_TREE: &str = "collections";
const ITEMS_TREE: &str = "items";
const PAYLOADS_TREE: &str = "payloads";

/// Persistent store backed by a sled database
pub struct SledStore {
    db: sled::Db,
    collections: sled::Tree,
    items: sled::Tree,
    payloads: sled::Tree,
}

impl SledStore {
    /// Open (or create) the store at `path`
    pub fn open(path: &Path) -> Result<Self, SyncError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::StorageError(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let db = sled::open(path)?;
        Ok(Self {
            collections: db.open_tree(COLLECTIONS_TREE)?,
            items: db.open_tree(ITEMS_TREE)?,
            payloads: db.open_tree(PAYLOADS_TREE)?,
            db,
        })
    }

    pub fn list_collections(&self) -> Result<Vec<CollectionNode>, SyncError> {
        decode_all(&self.collections)
    }

    pub fn list_items(&self) -> Result<Vec<ItemNode>, SyncError> {
        decode_all(&self.items)
    }

    pub fn payload(&self, id: ItemId) -> Result<Option<NotePayload>, SyncError> {
        match self.payloads.get(id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn flush(&self) -> Result<(), SyncError> {
        self.db.flush()?;
        Ok(())
    }

    fn item_record(&self, id: ItemId) -> Result<Option<ItemNode>, SyncError> {
        match self.items.get(id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_collection(&self, collection: &CollectionNode) -> Result<(), SyncError> {
        let bytes = bincode::serialize(collection)?;
        self.collections.insert(collection.id.0.to_be_bytes(), bytes)?;
        Ok(())
    }

    fn put_item(&self, item: &ItemNode) -> Result<(), SyncError> {
        if let Some(previous) = self.item_record(item.id)? {
            if previous.remote_id != item.remote_id || previous.parent != item.parent {
                debug!(item = %item.id, from = %previous.remote_id, to = %item.remote_id, "Dropping payload of reassigned item id");
                self.payloads.remove(item.id.0.to_be_bytes())?;
            }
        }
        let bytes = bincode::serialize(item)?;
        self.items.insert(item.id.0.to_be_bytes(), bytes)?;
        Ok(())
    }

    fn put_payload(&self, id: ItemId, payload: &NotePayload) -> Result<(), SyncError> {
        let bytes = bincode::serialize(payload)?;
        self.payloads.insert(id.0.to_be_bytes(), bytes)?;
        Ok(())
    }

    fn remove_item(&self, id: ItemId) -> Result<(), SyncError> {
        self.items.remove(id.0.to_be_bytes())?;
        self.payloads.remove(id.0.to_be_bytes())?;
        Ok(())
    }

    fn replace_collections(&self, collections: &[CollectionNode]) -> Result<(), SyncError> {
        let previous = self.list_collections()?;
        let unchanged = |collection: &CollectionNode| {
            previous.iter().any(|p| {
                p.id == collection.id && p.remote_id == collection.remote_id && p.parent == collection.parent
            })
        };
        let kept: Vec<CollectionId> = collections
            .iter()
            .filter(|c| unchanged(*c))
            .map(|c| c.id)
            .collect();

        self.collections.clear()?;
        for collection in collections {
            self.put_collection(collection)?;
        }
        for item in self.list_items()? {
            if !kept.contains(&item.parent) {
                self.remove_item(item.id)?;
            }
        }
        Ok(())
    }

    fn replace_items(&self, collection: CollectionId, items: &[ItemNode]) -> Result<(), SyncError> {
        for existing in self.list_items()? {
            if existing.parent == collection && !items.iter().any(|i| i.id == existing.id) {
                self.remove_item(existing.id)?;
            }
        }
        for item in items {
            self.put_item(item)?;
        }
        Ok(())
    }
}

fn decode_all<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>, SyncError> {
    let mut out = Vec::new();
    for entry in tree.iter() {
        let (_, value) = entry?;
        out.push(bincode::deserialize(&value)?);
    }
    Ok(out)
}

fn log_failure(operation: &str, result: Result<(), SyncError>) {
    if let Err(e) = result {
        error!(operation, error = %e, "Store write failed");
    }
}

impl StoreAdapter for SledStore {
    fn collections_retrieved(&mut self, collections: Vec<CollectionNode>) {
        debug!(count = collections.len(), "Persisting collections");
        log_failure("collections_retrieved", self.replace_collections(&collections));
    }

    fn items_retrieved(&mut self, collection: CollectionId, items: Vec<ItemNode>) {
        debug!(collection = %collection, count = items.len(), "Persisting items");
        log_failure("items_retrieved", self.replace_items(collection, &items));
    }

    fn item_retrieved(&mut self, item: ItemNode, payload: NotePayload) {
        log_failure(
            "item_retrieved",
            self.put_item(&item)
                .and_then(|_| self.put_payload(item.id, &payload)),
        );
    }

    fn item_committed(&mut self, item: ItemNode, payload: Option<NotePayload>) {
        let result = self.put_item(&item).and_then(|_| match &payload {
            Some(payload) => self.put_payload(item.id, payload),
            None => Ok(()),
        });
        log_failure("item_committed", result);
    }

    fn collection_committed(&mut self, collection: CollectionNode) {
        log_failure("collection_committed", self.put_collection(&collection));
    }

    fn change_processed(&mut self) {}

    fn cancel_task(&mut self, reason: &str) {
        warn!(reason, "Task cancelled");
    }

    fn fetch_item(&self, item: ItemId) -> Option<NotePayload> {
        match self.payload(item) {
            Ok(payload) => payload,
            Err(e) => {
                error!(item = %item, error = %e, "Failed to fetch item payload");
                None
            }
        }
    }
}
