//! Host Store Adapter
//!
//! Outbound reporting surface of the engine. The host store owns item and
//! collection persistence; the engine only reports what it found on disk,
//! commits the results of store-driven changes and cancels failed tasks.
//!
//! | host primitive          | method                  |
//! |-------------------------|-------------------------|
//! | fetch-collections result | `collections_retrieved` |
//! | fetch-items result      | `items_retrieved`       |
//! | report item             | `item_retrieved`        |
//! | commit item             | `item_committed`        |
//! | commit collection       | `collection_committed`  |
//! | mark processed          | `change_processed`      |
//! | cancel with reason      | `cancel_task`           |

pub mod memory;
pub mod persistence;

use crate::payload::NotePayload;
use crate::tree::{CollectionNode, ItemNode};
use crate::types::{CollectionId, ItemId};
use parking_lot::Mutex;
use std::sync::Arc;

pub use memory::{MemoryStore, StoreEvent};
pub use persistence::SledStore;

/// Host store interface required by the sync engine.
///
/// Everything except `fetch_item` is fire-and-forget from the engine's side.
pub trait StoreAdapter: Send {
    /// Complete collection set after a full discovery
    fn collections_retrieved(&mut self, collections: Vec<CollectionNode>);

    /// Complete item set (stubs, no content) of one collection
    fn items_retrieved(&mut self, collection: CollectionId, items: Vec<ItemNode>);

    /// Full content of one item
    fn item_retrieved(&mut self, item: ItemNode, payload: NotePayload);

    /// Result of a store-driven item change, possibly with a new remote id
    fn item_committed(&mut self, item: ItemNode, payload: Option<NotePayload>);

    /// Result of a store-driven collection change
    fn collection_committed(&mut self, collection: CollectionNode);

    /// The current change was handled without further data
    fn change_processed(&mut self);

    /// The current task failed; the store keeps its prior state
    fn cancel_task(&mut self, reason: &str);

    /// Current payload the store holds for an item
    fn fetch_item(&self, item: ItemId) -> Option<NotePayload>;
}

impl<S: StoreAdapter> StoreAdapter for Arc<Mutex<S>> {
    fn collections_retrieved(&mut self, collections: Vec<CollectionNode>) {
        self.lock().collections_retrieved(collections)
    }

    fn items_retrieved(&mut self, collection: CollectionId, items: Vec<ItemNode>) {
        self.lock().items_retrieved(collection, items)
    }

    fn item_retrieved(&mut self, item: ItemNode, payload: NotePayload) {
        self.lock().item_retrieved(item, payload)
    }

    fn item_committed(&mut self, item: ItemNode, payload: Option<NotePayload>) {
        self.lock().item_committed(item, payload)
    }

    fn collection_committed(&mut self, collection: CollectionNode) {
        self.lock().collection_committed(collection)
    }

    fn change_processed(&mut self) {
        self.lock().change_processed()
    }

    fn cancel_task(&mut self, reason: &str) {
        self.lock().cancel_task(reason)
    }

    fn fetch_item(&self, item: ItemId) -> Option<NotePayload> {
        self.lock().fetch_item(item)
    }
}
