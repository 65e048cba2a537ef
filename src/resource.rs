//! Inbound callback surface invoked by the host store.
//!
//! Results are never returned directly: every callback answers through the
//! engine's `StoreAdapter` by committing, marking processed or cancelling.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::payload::{NotePayload, PartSet};
use crate::types::{CollectionId, ItemId};

/// Hooks the host store calls on the synchronization engine
pub trait ResourceHandler {
    /// Report the complete collection tree
    fn retrieve_collections(&mut self);

    /// Report the items of one collection, without content
    fn retrieve_items(&mut self, collection: CollectionId);

    /// Report the full content of one item
    fn retrieve_item(&mut self, item: ItemId, parts: &PartSet) -> bool;

    fn item_added(&mut self, collection: CollectionId, payload: NotePayload);

    fn item_changed(&mut self, item: ItemId, payload: NotePayload, parts: &PartSet);

    fn item_removed(&mut self, item: ItemId);

    fn item_moved(&mut self, item: ItemId, source: CollectionId, destination: CollectionId);

    fn collection_added(&mut self, parent: CollectionId, name: &str);

    /// The collection's declared name may differ from its remote id
    fn collection_changed(&mut self, collection: CollectionId, name: &str);

    fn collection_removed(&mut self, collection: CollectionId);

    fn collection_moved(
        &mut self,
        collection: CollectionId,
        source: CollectionId,
        destination: CollectionId,
    );

    /// Apply a new configuration: caches are dropped and discovery re-runs
    fn configure(&mut self, config: SyncConfig) -> Result<(), SyncError>;

    fn about_to_quit(&mut self);
}
