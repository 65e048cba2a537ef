//! In-memory identity maps for collections and items.
//!
//! Nodes live in an arena keyed by engine-allocated ids; parent links are ids,
//! so the structure is a tree by construction and lookups never borrow across nodes.

use crate::tree::node::{CollectionNode, ItemNode};
use crate::tree::path::CollectionChain;
use crate::types::{CollectionId, ItemId, Parent};
use std::collections::BTreeMap;
use std::path::Path;

/// Arena of collection and item nodes owned by the sync engine
#[derive(Debug, Default, Clone)]
pub struct Hierarchy {
    collections: BTreeMap<CollectionId, CollectionNode>,
    items: BTreeMap<ItemId, ItemNode>,
    next_collection: u64,
    next_item: u64,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every node. Ids are not reused after a clear.
    pub fn clear(&mut self) {
        self.collections.clear();
        self.items.clear();
    }

    pub fn insert_collection(&mut self, remote_id: impl Into<String>, parent: Parent) -> CollectionId {
        let id = CollectionId(self.next_collection);
        self.next_collection += 1;
        self.collections
            .insert(id, CollectionNode::new(id, remote_id, parent));
        id
    }

    pub fn insert_item(&mut self, remote_id: impl Into<String>, parent: CollectionId) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        self.items.insert(id, ItemNode::new(id, remote_id, parent));
        id
    }

    pub fn collection(&self, id: CollectionId) -> Option<&CollectionNode> {
        self.collections.get(&id)
    }

    pub fn collection_mut(&mut self, id: CollectionId) -> Option<&mut CollectionNode> {
        self.collections.get_mut(&id)
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemNode> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut ItemNode> {
        self.items.get_mut(&id)
    }

    pub fn collections(&self) -> impl Iterator<Item = &CollectionNode> {
        self.collections.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemNode> {
        self.items.values()
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// The collection whose parent is the root sentinel
    pub fn top_level(&self) -> Option<CollectionId> {
        self.collections
            .values()
            .find(|c| c.parent == Parent::Root)
            .map(|c| c.id)
    }

    pub fn children(&self, id: CollectionId) -> Vec<CollectionId> {
        self.collections
            .values()
            .filter(|c| c.parent == Parent::Collection(id))
            .map(|c| c.id)
            .collect()
    }

    pub fn child_by_remote_id(&self, parent: Parent, remote_id: &str) -> Option<CollectionId> {
        self.collections
            .values()
            .find(|c| c.parent == parent && c.remote_id == remote_id)
            .map(|c| c.id)
    }

    pub fn items_in(&self, collection: CollectionId) -> Vec<ItemId> {
        self.items
            .values()
            .filter(|i| i.parent == collection)
            .map(|i| i.id)
            .collect()
    }

    pub fn item_by_remote_id(&self, collection: CollectionId, remote_id: &str) -> Option<ItemId> {
        self.items
            .values()
            .find(|i| i.parent == collection && i.remote_id == remote_id)
            .map(|i| i.id)
    }

    /// The collection and all of its descendants, parents before children
    pub fn subtree(&self, id: CollectionId) -> Vec<CollectionId> {
        let mut out = Vec::new();
        if !self.collections.contains_key(&id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Remove a collection with all descendant collections and their items
    pub fn remove_subtree(&mut self, id: CollectionId) -> (Vec<CollectionNode>, Vec<ItemNode>) {
        let ids = self.subtree(id);
        let mut removed_items = Vec::new();
        for collection in &ids {
            for item in self.items_in(*collection) {
                if let Some(node) = self.items.remove(&item) {
                    removed_items.push(node);
                }
            }
        }
        let removed = ids
            .iter()
            .filter_map(|c| self.collections.remove(c))
            .collect();
        (removed, removed_items)
    }

    pub fn remove_item(&mut self, id: ItemId) -> Option<ItemNode> {
        self.items.remove(&id)
    }

    /// Resolve a path-derived chain against the materialized nodes
    pub fn resolve_chain(&self, chain: &CollectionChain) -> Option<CollectionId> {
        let top = self.top_level()?;
        let top_node = self.collection(top)?;
        if Path::new(&top_node.remote_id) != chain.base() {
            return None;
        }
        chain.segments().iter().try_fold(top, |current, segment| {
            self.child_by_remote_id(Parent::Collection(current), segment)
        })
    }
}
