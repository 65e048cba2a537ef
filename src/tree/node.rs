//! Collection and item node types

use crate::types::{
    CollectionId, ContentHash, ItemId, Parent, COLLECTION_MIME_TYPE, NOTE_MIME_TYPE,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Permission flags advertised to the store for a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRights {
    pub can_create_item: bool,
    pub can_change_item: bool,
    pub can_delete_item: bool,
    pub can_create_collection: bool,
    pub can_change_collection: bool,
    pub can_delete_collection: bool,
}

impl CollectionRights {
    /// Rights supported under the given configuration.
    ///
    /// A read-only tree grants nothing; the top-level collection can never be deleted.
    pub fn supported(read_only: bool, is_top_level: bool) -> Self {
        if read_only {
            return Self::default();
        }
        Self {
            can_create_item: true,
            can_change_item: true,
            can_delete_item: true,
            can_create_collection: true,
            can_change_collection: true,
            can_delete_collection: !is_top_level,
        }
    }

    pub fn is_read_only(&self) -> bool {
        *self == Self::default()
    }
}

/// A collection, mapped one-to-one to a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionNode {
    pub id: CollectionId,
    /// Directory leaf name, or the configured base path for the top-level collection
    pub remote_id: String,
    pub name: String,
    pub parent: Parent,
    pub content_types: Vec<String>,
    pub rights: CollectionRights,
}

impl CollectionNode {
    pub fn new(id: CollectionId, remote_id: impl Into<String>, parent: Parent) -> Self {
        let remote_id = remote_id.into();
        Self {
            id,
            name: remote_id.clone(),
            remote_id,
            parent,
            content_types: vec![COLLECTION_MIME_TYPE.to_string(), NOTE_MIME_TYPE.to_string()],
            rights: CollectionRights::default(),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent == Parent::Root
    }
}

/// An item, mapped one-to-one to a file inside its collection's directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemNode {
    pub id: ItemId,
    /// File name; empty only between creation and the first successful commit
    pub remote_id: String,
    pub parent: CollectionId,
    pub content_type: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Fingerprint of the body last written to or read from disk
    pub content_hash: Option<ContentHash>,
}

impl ItemNode {
    pub fn new(id: ItemId, remote_id: impl Into<String>, parent: CollectionId) -> Self {
        Self {
            id,
            remote_id: remote_id.into(),
            parent,
            content_type: NOTE_MIME_TYPE.to_string(),
            created: None,
            modified: None,
            content_hash: None,
        }
    }
}
