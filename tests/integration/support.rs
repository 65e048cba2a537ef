use notesync::store::MemoryStore;
use notesync::types::{CollectionId, Parent};
use notesync::{ResourceHandler, SyncConfig, SyncEngine};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary base directory with an engine that has already reported its collections
pub struct Fixture {
    pub temp: TempDir,
    pub engine: SyncEngine<MemoryStore>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    /// Lay out the tree with `setup`, then start the engine
    pub fn with(setup: impl FnOnce(&Path)) -> Self {
        Self::configured(setup, |_| {})
    }

    pub fn configured(setup: impl FnOnce(&Path), configure: impl FnOnce(&mut SyncConfig)) -> Self {
        let temp = TempDir::new().unwrap();
        setup(temp.path());
        let mut config = SyncConfig::for_base_path(temp.path());
        configure(&mut config);
        let mut engine = SyncEngine::detached(config, MemoryStore::new()).unwrap();
        engine.retrieve_collections();
        Self { temp, engine }
    }

    pub fn base(&self) -> PathBuf {
        self.engine.base_path().to_path_buf()
    }

    pub fn top(&self) -> CollectionId {
        self.engine.hierarchy().top_level().unwrap()
    }

    /// Collection at a `/`-separated path below the base
    pub fn collection(&self, path: &str) -> CollectionId {
        path.split('/').fold(self.top(), |current, segment| {
            self.engine
                .hierarchy()
                .child_by_remote_id(Parent::Collection(current), segment)
                .unwrap_or_else(|| panic!("no collection '{}' in '{}'", segment, path))
        })
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.base().join(relative)).unwrap()
    }
}

/// Every path below `root` with the bytes of each file, in a stable order
pub fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| {
            let body = if entry.file_type().is_file() {
                fs::read(entry.path()).unwrap()
            } else {
                Vec::new()
            };
            (entry.path().strip_prefix(root).unwrap().to_path_buf(), body)
        })
        .collect()
}

pub fn parts(head: bool, body: bool) -> notesync::PartSet {
    let mut parts = notesync::PartSet::new();
    if head {
        parts.insert(notesync::ItemPart::Head);
    }
    if body {
        parts.insert(notesync::ItemPart::Body);
    }
    parts
}
