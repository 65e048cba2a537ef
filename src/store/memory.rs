//! In-memory host store that mirrors every report and keeps an event log.

use super::StoreAdapter;
use crate::payload::NotePayload;
use crate::tree::{CollectionNode, ItemNode};
use crate::types::{CollectionId, ItemId};
use std::collections::{BTreeMap, HashMap};

/// One report received from the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    CollectionsRetrieved(usize),
    ItemsRetrieved { collection: CollectionId, count: usize },
    ItemRetrieved(ItemId),
    ItemCommitted(ItemId),
    CollectionCommitted(CollectionId),
    Processed,
    Cancelled(String),
}

/// Mirror of the engine's reports, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: BTreeMap<CollectionId, CollectionNode>,
    items: BTreeMap<ItemId, ItemNode>,
    payloads: HashMap<ItemId, NotePayload>,
    events: Vec<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collections(&self) -> impl Iterator<Item = &CollectionNode> {
        self.collections.values()
    }

    pub fn collection(&self, id: CollectionId) -> Option<&CollectionNode> {
        self.collections.get(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemNode> {
        self.items.values()
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemNode> {
        self.items.get(&id)
    }

    pub fn item_by_remote_id(&self, remote_id: &str) -> Option<&ItemNode> {
        self.items.values().find(|i| i.remote_id == remote_id)
    }

    pub fn payload(&self, id: ItemId) -> Option<&NotePayload> {
        self.payloads.get(&id)
    }

    /// Store-side bookkeeping for a removal the host itself initiated
    pub fn forget_item(&mut self, id: ItemId) {
        self.items.remove(&id);
        self.payloads.remove(&id);
    }

    pub fn events(&self) -> &[StoreEvent] {
        &self.events
    }

    pub fn last_event(&self) -> Option<&StoreEvent> {
        self.events.last()
    }

    pub fn cancellations(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StoreEvent::Cancelled(reason) => Some(reason.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl StoreAdapter for MemoryStore {
    fn collections_retrieved(&mut self, collections: Vec<CollectionNode>) {
        self.events
            .push(StoreEvent::CollectionsRetrieved(collections.len()));
        self.collections = collections.into_iter().map(|c| (c.id, c)).collect();
        let known = &self.collections;
        let orphaned: Vec<ItemId> = self
            .items
            .values()
            .filter(|i| !known.contains_key(&i.parent))
            .map(|i| i.id)
            .collect();
        for id in orphaned {
            self.forget_item(id);
        }
    }

    fn items_retrieved(&mut self, collection: CollectionId, items: Vec<ItemNode>) {
        self.events.push(StoreEvent::ItemsRetrieved {
            collection,
            count: items.len(),
        });
        let stale: Vec<ItemId> = self
            .items
            .values()
            .filter(|i| i.parent == collection && !items.iter().any(|n| n.id == i.id))
            .map(|i| i.id)
            .collect();
        for id in stale {
            self.forget_item(id);
        }
        for item in items {
            self.items.insert(item.id, item);
        }
    }

    fn item_retrieved(&mut self, item: ItemNode, payload: NotePayload) {
        self.events.push(StoreEvent::ItemRetrieved(item.id));
        self.payloads.insert(item.id, payload);
        self.items.insert(item.id, item);
    }

    fn item_committed(&mut self, item: ItemNode, payload: Option<NotePayload>) {
        self.events.push(StoreEvent::ItemCommitted(item.id));
        if let Some(payload) = payload {
            self.payloads.insert(item.id, payload);
        }
        self.items.insert(item.id, item);
    }

    fn collection_committed(&mut self, collection: CollectionNode) {
        self.events
            .push(StoreEvent::CollectionCommitted(collection.id));
        self.collections.insert(collection.id, collection);
    }

    fn change_processed(&mut self) {
        self.events.push(StoreEvent::Processed);
    }

    fn cancel_task(&mut self, reason: &str) {
        self.events.push(StoreEvent::Cancelled(reason.to_string()));
    }

    fn fetch_item(&self, item: ItemId) -> Option<NotePayload> {
        self.payloads.get(&item).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Parent;

    #[test]
    fn test_items_retrieved_replaces_collection_items() {
        let mut store = MemoryStore::new();
        let c = CollectionId(0);
        store.items_retrieved(c, vec![ItemNode::new(ItemId(1), "a", c), ItemNode::new(ItemId(2), "b", c)]);
        store.items_retrieved(c, vec![ItemNode::new(ItemId(2), "b", c)]);
        assert!(store.item(ItemId(1)).is_none());
        assert!(store.item(ItemId(2)).is_some());
    }

    #[test]
    fn test_collections_retrieved_drops_orphaned_items() {
        let mut store = MemoryStore::new();
        let top = CollectionNode::new(CollectionId(0), "/data", Parent::Root);
        let work = CollectionNode::new(CollectionId(1), "Work", Parent::Collection(CollectionId(0)));
        store.collections_retrieved(vec![top.clone(), work]);
        store.items_retrieved(CollectionId(1), vec![ItemNode::new(ItemId(5), "x", CollectionId(1))]);
        store.collections_retrieved(vec![top]);
        assert_eq!(store.items().count(), 0);
    }

    #[test]
    fn test_cancellations_are_recorded() {
        let mut store = MemoryStore::new();
        store.cancel_task("nope");
        store.change_processed();
        assert_eq!(store.cancellations(), vec!["nope"]);
        assert_eq!(store.last_event(), Some(&StoreEvent::Processed));
    }
}
