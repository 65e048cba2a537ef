//! Item payload and declared-title handling.
//!
//! The payload is opaque to the engine apart from its declared title, which
//! decides the item's file name, and its body, which is the file content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

/// Content type of the body written to disk
pub const BODY_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Item content exchanged with the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePayload {
    /// Declared title; becomes the file name when the head is saved
    pub title: String,
    /// Raw body bytes, written to and read from the file verbatim
    pub body: Vec<u8>,
    pub content_type: String,
    /// File creation time when read from disk
    pub created: Option<DateTime<Utc>>,
    /// Provenance: file modification time when read from disk
    pub last_modified: Option<DateTime<Utc>>,
}

impl NotePayload {
    pub fn new(title: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            content_type: BODY_CONTENT_TYPE.to_string(),
            created: None,
            last_modified: None,
        }
    }

    /// File name derived from the declared title
    pub fn declared_identity(&self) -> String {
        normalize_title(&self.title)
    }
}

/// Normalize a declared title into a file name.
///
/// NFC-normalizes, drops path separators and control characters, and trims
/// surrounding whitespace. `.` and `..` normalize to the empty string.
pub fn normalize_title(title: &str) -> String {
    let cleaned: String = title
        .nfc()
        .filter(|c| *c != '/' && *c != '\\' && !c.is_control())
        .collect();
    let trimmed = cleaned.trim();
    if trimmed == "." || trimmed == ".." {
        return String::new();
    }
    trimmed.to_string()
}

/// Part of an item the store reports as changed or requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemPart {
    /// Identity-relevant fields (declared title)
    Head,
    /// Content
    Body,
}

/// Set of item parts
pub type PartSet = BTreeSet<ItemPart>;

/// Derive `(save_head, save_body)` from a changed-part set
pub fn save_flags(parts: &PartSet) -> (bool, bool) {
    (parts.contains(&ItemPart::Head), parts.contains(&ItemPart::Body))
}
