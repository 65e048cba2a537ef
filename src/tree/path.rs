//! Mapping between collections and directory paths.
//!
//! `path_for` walks parent links up to the root sentinel; `collection_chain_for`
//! is the inverse used when a watcher event only carries a path.

use crate::error::SyncError;
use crate::tree::hierarchy::Hierarchy;
use crate::types::{CollectionId, Parent};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Directory path of a collection.
///
/// Fails with `NotFound` if the collection is unknown or any ancestor has an
/// empty remote id.
pub fn path_for(hierarchy: &Hierarchy, id: CollectionId) -> Result<PathBuf, SyncError> {
    let mut segments = Vec::new();
    let mut current = id;
    let mut steps = 0usize;

    loop {
        let node = hierarchy
            .collection(current)
            .ok_or_else(|| SyncError::NotFound(format!("Collection {} is unknown", current)))?;
        if node.remote_id.is_empty() {
            return Err(SyncError::NotFound(format!(
                "Incomplete ancestor chain: collection {} has no remote id",
                current
            )));
        }
        segments.push(node.remote_id.as_str());
        match node.parent {
            Parent::Root => break,
            Parent::Collection(parent) => current = parent,
        }
        steps += 1;
        if steps > hierarchy.collection_count() {
            return Err(SyncError::NotFound(format!(
                "Ancestor chain of {} does not reach the root",
                id
            )));
        }
    }

    let mut segments = segments.into_iter().rev();
    let mut path = PathBuf::from(segments.next().unwrap_or_default());
    for segment in segments {
        path.push(segment);
    }
    Ok(path)
}

/// Like `path_for`, but checks the top-level remote id against the configured base path.
pub fn checked_path_for(
    hierarchy: &Hierarchy,
    id: CollectionId,
    base: &Path,
) -> Result<PathBuf, SyncError> {
    let path = path_for(hierarchy, id)?;
    if !path.starts_with(base) {
        warn!(
            collection = %id,
            path = %path.display(),
            base = %base.display(),
            "Top-level remote id does not match configured base path"
        );
    }
    Ok(path)
}

/// Ancestor chain synthesized from a path: the base remote id followed by one
/// stub per directory segment, top to leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionChain {
    base: PathBuf,
    segments: Vec<String>,
}

impl CollectionChain {
    pub fn new(base: impl Into<PathBuf>, segments: Vec<String>) -> Self {
        Self {
            base: base.into(),
            segments,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Remote id of the deepest stub
    pub fn leaf(&self) -> String {
        self.segments
            .last()
            .cloned()
            .unwrap_or_else(|| self.base.to_string_lossy().to_string())
    }

    /// True when the chain denotes the top-level collection itself
    pub fn is_top_level(&self) -> bool {
        self.segments.is_empty()
    }

    /// Chain of the parent directory, or `None` for the top level
    pub fn parent(&self) -> Option<CollectionChain> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(CollectionChain::new(self.base.clone(), segments))
    }

    pub fn to_path(&self) -> PathBuf {
        let mut path = self.base.clone();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

/// Split `path` against the configured base into a chain of collection stubs.
pub fn collection_chain_for(base: &Path, path: &Path) -> Result<CollectionChain, SyncError> {
    let relative = path.strip_prefix(base).map_err(|_| {
        SyncError::NotFound(format!(
            "Path '{}' is outside of '{}'",
            path.display(),
            base.display()
        ))
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_string_lossy().to_string()),
            Component::CurDir => {}
            _ => {
                return Err(SyncError::NotFound(format!(
                    "Path '{}' is not a plain descendant of '{}'",
                    path.display(),
                    base.display()
                )))
            }
        }
    }

    Ok(CollectionChain::new(base, segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_path_for_nested() {
        let mut h = Hierarchy::new();
        let top = h.insert_collection("/data", Parent::Root);
        let work = h.insert_collection("Work", Parent::Collection(top));
        let q1 = h.insert_collection("Q1", Parent::Collection(work));

        assert_eq!(path_for(&h, top).unwrap(), PathBuf::from("/data"));
        assert_eq!(path_for(&h, q1).unwrap(), PathBuf::from("/data/Work/Q1"));
    }

    #[test]
    fn test_path_for_incomplete_chain() {
        let mut h = Hierarchy::new();
        let top = h.insert_collection("/data", Parent::Root);
        let pending = h.insert_collection("", Parent::Collection(top));
        let child = h.insert_collection("Inner", Parent::Collection(pending));

        assert!(matches!(path_for(&h, child), Err(SyncError::NotFound(_))));
        assert!(matches!(
            path_for(&h, CollectionId(99)),
            Err(SyncError::NotFound(_))
        ));
    }

    #[test]
    fn test_chain_for_base_is_top_level() {
        let chain = collection_chain_for(Path::new("/data"), Path::new("/data")).unwrap();
        assert!(chain.is_top_level());
        assert!(chain.parent().is_none());
        assert_eq!(chain.to_path(), PathBuf::from("/data"));
    }

    #[test]
    fn test_chain_for_outside_base() {
        let err = collection_chain_for(Path::new("/data"), Path::new("/etc/passwd")).unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[test]
    fn test_chain_parent_and_leaf() {
        let chain =
            collection_chain_for(Path::new("/data"), Path::new("/data/Work/Q1")).unwrap();
        assert_eq!(chain.leaf(), "Q1");
        assert_eq!(chain.parent().unwrap().to_path(), PathBuf::from("/data/Work"));
    }

    proptest! {
        #[test]
        fn prop_path_and_chain_round_trip(
            segments in prop::collection::vec("[A-Za-z0-9 _-]{1,12}", 0..6)
        ) {
            let mut h = Hierarchy::new();
            let mut current = h.insert_collection("/base", Parent::Root);
            for segment in &segments {
                current = h.insert_collection(segment.clone(), Parent::Collection(current));
            }

            let path = path_for(&h, current).unwrap();
            let chain = collection_chain_for(Path::new("/base"), &path).unwrap();
            prop_assert_eq!(chain.segments(), segments.as_slice());
            prop_assert_eq!(chain.to_path(), path);
            prop_assert_eq!(h.resolve_chain(&chain), Some(current));
        }
    }
}
