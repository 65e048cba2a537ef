//! Core identifier types shared by the engine, the store adapters and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash: blake3 fingerprint of an item body
pub type ContentHash = [u8; 32];

/// Content type advertised for items
pub const NOTE_MIME_TYPE: &str = "text/x-vnd.plain-note";

/// Content type advertised for collections
pub const COLLECTION_MIME_TYPE: &str = "inode/directory";

/// Arena index of a collection owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionId(pub u64);

/// Arena index of an item owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Parent reference of a collection: either the root sentinel or another collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parent {
    Root,
    Collection(CollectionId),
}
