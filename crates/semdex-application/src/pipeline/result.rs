//! Run states and the per-run summary

use crate::stats::ErrorStats;
use serde::Serialize;
use std::time::Duration;

/// Lifecycle of one indexing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Run constructed, nothing started
    Created,
    /// Walking the directory tree
    Discovering,
    /// Applying change detection against the store
    Filtering,
    /// Pipeline workers active
    Running,
    /// Completed normally
    Succeeded,
    /// Nothing to index after filtering
    NoFiles,
    /// Stopped by cancellation
    Cancelled,
    /// Attempted files but processed or stored nothing
    Errored,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Discovering => "discovering",
            Self::Filtering => "filtering",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::NoFiles => "no-files",
            Self::Cancelled => "cancelled",
            Self::Errored => "errored",
        };
        write!(f, "{}", name)
    }
}

/// User-visible outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run completed
    Success,
    /// Change detection filtered every file out
    NoFiles,
    /// Run failed: nothing it attempted was processed or stored
    Error,
    /// Run stopped on cancellation; counts are partial
    Cancelled,
}

/// Summary returned from every run
#[derive(Debug, Clone, Serialize)]
pub struct IndexingRunResult {
    /// Overall outcome
    pub status: RunStatus,
    /// Files that passed change detection
    pub files_attempted: usize,
    /// Files parsed successfully
    pub files_processed: usize,
    /// Files whose processing failed
    pub files_failed: usize,
    /// Chunks written to the store
    pub chunks_stored: usize,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Error frequency table with bounded samples
    pub errors: ErrorStats,
}

impl IndexingRunResult {
    /// Empty summary for a run that found nothing to do
    pub fn no_files(duration: Duration) -> Self {
        Self {
            status: RunStatus::NoFiles,
            files_attempted: 0,
            files_processed: 0,
            files_failed: 0,
            chunks_stored: 0,
            duration,
            errors: ErrorStats::default(),
        }
    }
}
