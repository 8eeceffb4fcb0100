//! Application-wide constants and default values
//!
//! Centralizes the pipeline's tuning knobs so that defaults are consistent
//! across workers and easy to audit in one place.

use std::time::Duration;

// ============================================================================
// Pipeline Worker Pools
// ============================================================================

/// Default number of parse workers draining the files queue
pub const DEFAULT_PARSE_WORKERS: usize = 4;

/// Default number of embed workers
///
/// Zero when no embedding provider is configured; otherwise additionally
/// capped by the provider's `recommended_concurrency`.
pub const DEFAULT_EMBED_WORKERS: usize = 2;

/// Default number of store workers
pub const DEFAULT_STORE_WORKERS: usize = 2;

/// Concurrency cap applied when a provider publishes no recommendation
pub const DEFAULT_RECOMMENDED_CONCURRENCY: usize = 8;

// ============================================================================
// Channel Capacities
// ============================================================================

/// Bounded capacity of the files queue
///
/// Small enough that discovery cannot race far ahead of parsing; producers
/// block when the queue is saturated.
pub const FILE_CHANNEL_CAPACITY: usize = 256;

/// Bounded capacity of the chunks queue
pub const CHUNK_CHANNEL_CAPACITY: usize = 2048;

/// Bounded capacity of the embedded-chunks queue
pub const EMBED_CHANNEL_CAPACITY: usize = 2048;

// ============================================================================
// Batching
// ============================================================================

/// Chunks buffered per embedding call
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 100;

/// Embedded chunks buffered per store write
pub const DEFAULT_DATABASE_BATCH_SIZE: usize = 1000;

/// Global cap on chunks per embedding batch, regardless of provider limits
pub const MAX_CHUNKS_PER_BATCH: usize = 300;

/// Fixed batch size used when the provider publishes no limits
pub const FIXED_BATCH_SIZE: usize = 20;

/// Fraction of the provider's token budget the batcher actually uses
pub const SAFE_TOKEN_FRACTION: f64 = 0.8;

/// Store batches between `optimize_tables` invocations
pub const OPTIMIZE_EVERY_BATCHES: usize = 10;

/// Extended budget for the store's optimization hook
///
/// Fragment compaction can be slow on large stores; it must not hold any
/// lock that serializes foreground writes longer than this.
pub const OPTIMIZE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

// ============================================================================
// Retries
// ============================================================================

/// Attempts per embed batch before a transient failure becomes final
pub const EMBED_MAX_ATTEMPTS: u32 = 3;

/// Ceiling on the embed retry backoff
pub const EMBED_BACKOFF_CAP: Duration = Duration::from_secs(5);

/// Attempts per store batch before the failure propagates
pub const STORE_MAX_RETRIES: u32 = 3;

/// Initial store retry delay
pub const STORE_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Ceiling on the store retry backoff
pub const STORE_RETRY_MAX_DELAY: Duration = Duration::from_millis(5000);

/// Distinct messages retained per error type in run summaries
pub const ERROR_SAMPLE_LIMIT: usize = 5;

// ============================================================================
// Discovery
// ============================================================================

/// Extensions indexed when no explicit list is configured
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "cs", "py", "js", "ts", "java", "cpp", "c", "go", "rs", "php", "rb",
];

/// Directory names excluded from discovery by default
pub const DEFAULT_EXCLUDED_DIRS: &[&str] =
    &["node_modules", ".git", "target", "__pycache__", ".venv"];

/// Files larger than this are skipped (bytes)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

// ============================================================================
// Adaptive Batch Processing
// ============================================================================

/// Starting window size for the adaptive file processor
pub const ADAPTIVE_INITIAL_BATCH_SIZE: usize = 10;

/// Lower bound on the adaptive window
pub const ADAPTIVE_MIN_BATCH_SIZE: usize = 1;

/// Upper bound on the adaptive window
pub const ADAPTIVE_MAX_BATCH_SIZE: usize = 100;

/// Window wall-time the adaptive processor steers toward
pub const ADAPTIVE_TARGET_BATCH_TIME: Duration = Duration::from_secs(15);

/// Window wall-time above which the window is halved
pub const ADAPTIVE_SLOW_THRESHOLD: Duration = Duration::from_secs(25);

/// Window wall-time below which the window is doubled
pub const ADAPTIVE_FAST_THRESHOLD: Duration = Duration::from_secs(5);
