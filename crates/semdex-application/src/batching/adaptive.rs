//! Adaptive batch file processor
//!
//! Alternative driver for sequential file batches, used when pipeline mode is
//! not chosen. Processes windows of files concurrently and resizes the window
//! from observed wall-time: slow windows halve, fast windows double, mildly
//! fast windows grow by half. Concurrency inside a window is bounded by the
//! hardware thread count.

use crate::constants::{
    ADAPTIVE_FAST_THRESHOLD, ADAPTIVE_INITIAL_BATCH_SIZE, ADAPTIVE_MAX_BATCH_SIZE,
    ADAPTIVE_MIN_BATCH_SIZE, ADAPTIVE_SLOW_THRESHOLD, ADAPTIVE_TARGET_BATCH_TIME,
};
use crate::stats::ErrorStats;
use async_trait::async_trait;
use semdex_domain::{Error, FailureKind, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Window sizing parameters
#[derive(Debug, Clone)]
pub struct AdaptiveBatchConfig {
    /// Starting window size
    pub initial_batch_size: usize,
    /// Lower bound on the window
    pub min_batch_size: usize,
    /// Upper bound on the window
    pub max_batch_size: usize,
    /// Wall-time the processor steers toward
    pub target_batch_time: Duration,
    /// Wall-time above which the window halves
    pub slow_threshold: Duration,
    /// Wall-time below which the window doubles
    pub fast_threshold: Duration,
}

impl Default for AdaptiveBatchConfig {
    fn default() -> Self {
        Self {
            initial_batch_size: ADAPTIVE_INITIAL_BATCH_SIZE,
            min_batch_size: ADAPTIVE_MIN_BATCH_SIZE,
            max_batch_size: ADAPTIVE_MAX_BATCH_SIZE,
            target_batch_time: ADAPTIVE_TARGET_BATCH_TIME,
            slow_threshold: ADAPTIVE_SLOW_THRESHOLD,
            fast_threshold: ADAPTIVE_FAST_THRESHOLD,
        }
    }
}

/// Per-file outcome tracked across a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// File processed successfully
    Success,
    /// File failed with a retryable error
    Error,
    /// File failed with a non-retryable error
    PermanentFailure,
}

/// Handler the processor drives for each file
#[async_trait]
pub trait FileProcessor: Send + Sync {
    /// Process one file
    async fn process(&self, path: &Path) -> Result<()>;
}

/// Aggregated outcome of an adaptive run
#[derive(Debug, Clone, Default)]
pub struct AdaptiveBatchResult {
    /// Files taken from the input list
    pub attempted: usize,
    /// Files processed successfully
    pub processed: usize,
    /// Files that failed with a retryable error
    pub failed: usize,
    /// Files that failed permanently
    pub permanent_failures: usize,
    /// Windows executed
    pub batches: usize,
    /// Aggregated error statistics
    pub errors: ErrorStats,
}

/// Abort predicate consulted after every window
pub type AbortPredicate = Box<dyn Fn(&ErrorStats) -> bool + Send + Sync>;

/// Parallel file processor with dynamic window sizing
pub struct AdaptiveBatchProcessor {
    config: AdaptiveBatchConfig,
    processor: Arc<dyn FileProcessor>,
    abort_predicate: Option<AbortPredicate>,
    concurrency: usize,
}

impl AdaptiveBatchProcessor {
    /// Create a processor with default window sizing
    pub fn new(processor: Arc<dyn FileProcessor>) -> Self {
        Self::with_config(processor, AdaptiveBatchConfig::default())
    }

    /// Create a processor with explicit window sizing
    pub fn with_config(processor: Arc<dyn FileProcessor>, config: AdaptiveBatchConfig) -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(4);
        Self {
            config,
            processor,
            abort_predicate: None,
            concurrency,
        }
    }

    /// Stop the run early when the predicate fires on the accumulated stats
    pub fn with_abort_predicate(mut self, predicate: AbortPredicate) -> Self {
        self.abort_predicate = Some(predicate);
        self
    }

    /// Process the given paths in adaptively sized windows
    pub async fn run(
        &self,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<AdaptiveBatchResult> {
        let mut result = AdaptiveBatchResult::default();
        let mut batch_size = self
            .config
            .initial_batch_size
            .clamp(self.config.min_batch_size, self.config.max_batch_size);
        let mut position = 0usize;

        while position < paths.len() {
            if cancel.is_cancelled() {
                tracing::info!(position, "adaptive processing cancelled");
                break;
            }

            let window = &paths[position..paths.len().min(position + batch_size)];
            let started = tokio::time::Instant::now();

            let outcomes = match self.process_window(window, cancel).await {
                Ok(outcomes) => outcomes,
                Err(first_error) => {
                    // Unexpected window failure: halve and retry once
                    if batch_size <= self.config.min_batch_size {
                        return Err(first_error);
                    }
                    batch_size = (batch_size / 2).max(self.config.min_batch_size);
                    tracing::warn!(
                        batch_size,
                        error = %first_error,
                        "window failed, retrying once with halved batch"
                    );
                    let retry_window = &paths[position..paths.len().min(position + batch_size)];
                    self.process_window(retry_window, cancel).await?
                }
            };

            let elapsed = started.elapsed();
            let window_len = outcomes.len();
            position += window_len;
            result.attempted += window_len;
            result.batches += 1;
            for (outcome, error) in outcomes {
                match outcome {
                    FileOutcome::Success => result.processed += 1,
                    FileOutcome::Error => {
                        result.failed += 1;
                        if let Some(error) = error {
                            result.errors.record("transient", error);
                        }
                    }
                    FileOutcome::PermanentFailure => {
                        result.permanent_failures += 1;
                        if let Some(error) = error {
                            result.errors.record("permanent", error);
                        }
                    }
                }
            }

            if let Some(predicate) = &self.abort_predicate {
                if predicate(&result.errors) {
                    tracing::warn!(batches = result.batches, "abort predicate fired");
                    break;
                }
            }

            batch_size = self.adjust_batch_size(batch_size, elapsed);
        }

        Ok(result)
    }

    /// Process one window concurrently under the hardware-thread semaphore
    async fn process_window(
        &self,
        window: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<Vec<(FileOutcome, Option<String>)>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(window.len());

        for path in window {
            let semaphore = Arc::clone(&semaphore);
            let processor = Arc::clone(&self.processor);
            let cancel = cancel.clone();
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| Error::Cancelled)?;
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                processor.process(&path).await
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let joined = handle
                .await
                .map_err(|e| Error::permanent(format!("file task aborted: {}", e)))?;
            outcomes.push(match joined {
                Ok(()) => (FileOutcome::Success, None),
                Err(error) => {
                    let message = error.to_string();
                    match error.failure_kind() {
                        FailureKind::Transient => (FileOutcome::Error, Some(message)),
                        FailureKind::Permanent => (FileOutcome::PermanentFailure, Some(message)),
                    }
                }
            });
        }
        Ok(outcomes)
    }

    /// Grow or shrink the window from its observed wall-time
    fn adjust_batch_size(&self, current: usize, elapsed: Duration) -> usize {
        let next = if elapsed > self.config.slow_threshold && current > self.config.min_batch_size {
            current / 2
        } else if elapsed < self.config.fast_threshold && current < self.config.max_batch_size {
            current * 2
        } else if elapsed < self.config.target_batch_time && current < self.config.max_batch_size {
            current + current / 2
        } else {
            current
        };
        next.clamp(self.config.min_batch_size, self.config.max_batch_size)
    }
}
