//! Progress reporting port

use std::sync::Arc;

/// Sink for progress reports emitted during an indexing run
///
/// Reports are non-blocking from the coordinator's perspective; sinks must
/// not perform slow work inline.
pub trait ProgressSink: Send + Sync {
    /// Report progress in `[0, 1]` with a human-readable message
    fn report(&self, progress: f64, message: &str, processed: usize, total: usize);
}

/// Shared progress sink handle
pub type SharedProgressSink = Arc<dyn ProgressSink>;

/// Sink that drops every report
#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn report(&self, _progress: f64, _message: &str, _processed: usize, _total: usize) {}
}
