//! Ignore filter for directory entries and watch notifications.
//!
//! Hidden entries, editor backups (trailing `~`), the configured marker file
//! and any configured glob pattern are never treated as items or collections.

use std::path::Path;

/// Name-based filter applied by the scanner and the change watcher
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    marker_file: Option<String>,
    patterns: Vec<String>,
}

impl IgnoreFilter {
    pub fn new(marker_file: Option<String>, patterns: Vec<String>) -> Self {
        Self {
            marker_file,
            patterns: patterns.into_iter().map(|p| p.replace('\\', "/")).collect(),
        }
    }

    /// True if an entry with this leaf name must be skipped
    pub fn is_ignored_name(&self, name: &str) -> bool {
        if name.is_empty() || name.starts_with('.') || name.ends_with('~') {
            return true;
        }
        if self.marker_file.as_deref() == Some(name) {
            return true;
        }
        self.patterns.iter().any(|p| {
            let leaf_pattern = p.rsplit('/').next().unwrap_or(p);
            glob_match(leaf_pattern, name)
        })
    }

    /// True if the leaf of `path` must be skipped
    pub fn is_ignored_path(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => self.is_ignored_name(&name.to_string_lossy()),
            None => false,
        }
    }
}

/// Glob matcher supporting `*` (any sequence) and `?` (single char).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();

    let mut pi = 0usize;
    let mut ti = 0usize;
    let mut star: Option<usize> = None;
    let mut star_text = 0usize;

    while ti < txt.len() {
        if pi < pat.len() && (pat[pi] == '?' || pat[pi] == txt[ti]) {
            pi += 1;
            ti += 1;
            continue;
        }
        if pi < pat.len() && pat[pi] == '*' {
            while pi < pat.len() && pat[pi] == '*' {
                pi += 1;
            }
            star = Some(pi);
            star_text = ti;
            continue;
        }
        if let Some(star_pi) = star {
            star_text += 1;
            ti = star_text;
            pi = star_pi;
            continue;
        }
        return false;
    }

    while pi < pat.len() && pat[pi] == '*' {
        pi += 1;
    }
    pi == pat.len()
}
