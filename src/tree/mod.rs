//! Collection/item tree: nodes, the identity arena, path mapping and directory scanning

pub mod hasher;
pub mod hierarchy;
pub mod node;
pub mod path;
pub mod walker;

pub use hierarchy::Hierarchy;
pub use node::{CollectionNode, CollectionRights, ItemNode};
pub use path::{checked_path_for, collection_chain_for, path_for, CollectionChain};
pub use walker::{DirectoryScanner, DiscoveredDirectory};
