//! Directory scanning: item candidates, collection candidates and recursive discovery

use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A directory found during recursive discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDirectory {
    pub path: PathBuf,
    pub parent: PathBuf,
    pub name: String,
}

/// One-shot enumeration of directory entries through the ignore filter.
///
/// Nothing is cached: every call reads the directory again.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    filter: IgnoreFilter,
}

impl DirectoryScanner {
    pub fn new(filter: IgnoreFilter) -> Self {
        Self { filter }
    }

    /// True when `name` is never listed as an item or collection
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.filter.is_ignored_name(name)
    }

    /// Names of the regular, readable files in `dir`
    pub fn list_items<'a>(
        &'a self,
        dir: &Path,
    ) -> Result<impl Iterator<Item = String> + 'a, SyncError> {
        let entries = fs::read_dir(dir).map_err(|e| SyncError::IoUnavailable {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(entries.filter_map(move |entry| {
            let entry = entry.ok()?;
            let name = entry.file_name().to_string_lossy().to_string();
            if self.filter.is_ignored_name(&name) {
                return None;
            }
            let path = entry.path();
            let metadata = fs::metadata(&path).ok()?;
            if !metadata.is_file() || fs::File::open(&path).is_err() {
                return None;
            }
            Some(name)
        }))
    }

    /// Names of the subdirectories of `dir`
    pub fn list_subdirectories<'a>(
        &'a self,
        dir: &Path,
    ) -> Result<impl Iterator<Item = String> + 'a, SyncError> {
        let entries = fs::read_dir(dir).map_err(|e| SyncError::IoUnavailable {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(entries.filter_map(move |entry| {
            let entry = entry.ok()?;
            let name = entry.file_name().to_string_lossy().to_string();
            if self.filter.is_ignored_name(&name) {
                return None;
            }
            let file_type = entry.file_type().ok()?;
            file_type.is_dir().then_some(name)
        }))
    }

    /// Depth-first discovery of every directory below `root`.
    ///
    /// Parents are always yielded before their children. `on_directory` is
    /// invoked for each discovered directory, in order.
    pub fn discover<F>(&self, root: &Path, mut on_directory: F) -> Result<Vec<DiscoveredDirectory>, SyncError>
    where
        F: FnMut(&Path),
    {
        if !root.is_dir() {
            return Err(SyncError::NotFound(format!(
                "Directory '{}' does not exist",
                root.display()
            )));
        }

        // Symlinked directories are not collections
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut found = Vec::new();
        let entries = walker.into_iter().filter_entry(|entry| {
            entry.file_type().is_dir()
                && !self
                    .filter
                    .is_ignored_name(&entry.file_name().to_string_lossy())
        });

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory during discovery");
                    continue;
                }
            };
            let path = entry.path().to_path_buf();
            let parent = match path.parent() {
                Some(parent) => parent.to_path_buf(),
                None => continue,
            };
            on_directory(&path);
            found.push(DiscoveredDirectory {
                name: entry.file_name().to_string_lossy().to_string(),
                parent,
                path,
            });
        }

        debug!(root = %root.display(), directories = found.len(), "Discovered directories");
        Ok(found)
    }
}
