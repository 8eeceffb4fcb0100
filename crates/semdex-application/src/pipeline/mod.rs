//! The three-stage indexing pipeline
//!
//! Parse workers turn file descriptors into chunks, embed workers turn chunk
//! batches into vectors, store workers persist both. The coordinator owns the
//! bounded channels between the stages and the worker handles for the
//! duration of one run.

pub mod backoff;
pub mod coordinator;
pub mod embed_worker;
pub mod parse_worker;
pub mod result;
pub mod store_worker;

pub use coordinator::{IndexingCoordinator, IndexingCoordinatorBuilder, PipelineConfig};
pub use result::{IndexingRunResult, RunState, RunStatus};

use crate::stats::ErrorStats;
use semdex_domain::{Chunk, EmbedChunk, EmbeddingStatus};
use std::sync::atomic::AtomicUsize;
use std::sync::Mutex;

/// Item flowing from the embed stage to the store stage
#[derive(Debug, Clone)]
pub enum EmbedResult {
    /// Chunk embedded successfully
    Embedded(EmbedChunk),
    /// Embedding failed; the chunk is persisted with a failure-status row
    Failed {
        /// The chunk that could not be embedded
        chunk: Chunk,
        /// Provider that was asked
        provider: String,
        /// Model that was asked
        model: String,
        /// Failure status to persist
        status: EmbeddingStatus,
    },
    /// No embedding provider configured; the chunk is persisted without a row
    Unembedded(Chunk),
}

impl EmbedResult {
    /// The chunk carried by this item
    pub fn chunk(&self) -> &Chunk {
        match self {
            Self::Embedded(embedded) => &embedded.chunk,
            Self::Failed { chunk, .. } | Self::Unembedded(chunk) => chunk,
        }
    }
}

/// Counters shared by every worker in a run
#[derive(Debug, Default)]
pub struct PipelineCounters {
    /// Files parsed successfully
    pub files_processed: AtomicUsize,
    /// Files whose parse failed
    pub files_failed: AtomicUsize,
    /// Chunks produced by parse workers
    pub chunks_parsed: AtomicUsize,
    /// Chunks written by store workers
    pub chunks_stored: AtomicUsize,
    /// Aggregated error statistics
    pub errors: Mutex<ErrorStats>,
}

impl PipelineCounters {
    /// Record a failure in the shared stats table
    pub fn record_error<T: Into<String>, M: AsRef<str>>(&self, error_type: T, message: M) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.record(error_type, message);
        }
    }

    /// Snapshot the error table
    pub fn errors_snapshot(&self) -> ErrorStats {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }
}
