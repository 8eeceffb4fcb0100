//! Chunk classification between two views of a file

use crate::entities::Chunk;

/// Result of diffing a file's new chunks against its stored chunks
///
/// The default contract is add/delete-only: `modified` exists in the type but
/// stays empty, and any change surfaces as a deletion plus an addition.
/// Populating `modified` later is an optimization, not a semantic change.
#[derive(Debug, Clone, Default)]
pub struct ChunkDiff {
    /// Stored chunks whose normalized content also appears in the new view
    pub unchanged: Vec<Chunk>,
    /// Reserved; empty in the default contract
    pub modified: Vec<Chunk>,
    /// New chunks with no stored counterpart
    pub added: Vec<Chunk>,
    /// Stored chunks with no counterpart in the new view
    pub deleted: Vec<Chunk>,
}

impl ChunkDiff {
    /// Whether the diff carries any change
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty() || !self.modified.is_empty()
    }

    /// Total number of changed chunks
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }
}
