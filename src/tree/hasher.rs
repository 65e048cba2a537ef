//! Content fingerprints for item bodies

use crate::types::ContentHash;

/// Compute the fingerprint of an item body
pub fn content_hash(body: &[u8]) -> ContentHash {
    *blake3::hash(body).as_bytes()
}

/// Short hex rendering used in logs and status output
pub fn short_hex(hash: &ContentHash) -> String {
    hex::encode(&hash[..6])
}
