//! Content canonicalization and hashing
//!
//! Chunk equality across runs is decided on normalized text: CRLF and lone CR
//! collapse to LF and surrounding whitespace is trimmed before hashing or
//! comparison. Token counts are estimated, not tokenized; the 4-chars-per-token
//! heuristic matches what embedding providers budget against.

use sha2::{Digest, Sha256};

/// Canonicalize text for content comparison
///
/// Replaces CRLF and lone CR with LF, then trims leading and trailing
/// whitespace.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// SHA-256 hex digest of the normalized text
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    hex::encode(hasher.finalize())
}

/// Estimated token count: `ceil(len / 4)`
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Character count excluding whitespace
pub fn non_whitespace_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
