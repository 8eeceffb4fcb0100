//! Semdex - incremental semantic indexing of source repositories
//!
//! Discovers supported files under a root directory, parses each into
//! semantically meaningful chunks, generates a dense embedding per chunk, and
//! persists chunks together with their embeddings. Re-runs are incremental:
//! change detection skips untouched files, and the content diff keeps prior
//! embeddings for unchanged chunks.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use semdex::{coordinator, CancellationToken, InMemoryDatabaseProvider, NullEmbeddingProvider};
//!
//! # async fn run() -> semdex::Result<()> {
//! let database = Arc::new(InMemoryDatabaseProvider::new());
//! let indexer = coordinator(database)
//!     .embedding(Arc::new(NullEmbeddingProvider::new()))
//!     .build();
//! let result = indexer.run(Path::new("."), CancellationToken::new()).await?;
//! println!("stored {} chunks", result.chunks_stored);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub use semdex_application::batching::{
    AdaptiveBatchConfig, AdaptiveBatchProcessor, AdaptiveBatchResult, TokenAwareBatcher,
};
pub use semdex_application::chunking::{diff_chunks, split_chunk, SplitLimits};
pub use semdex_application::discovery::{DiscoveryOptions, DiscoveryResult};
pub use semdex_application::pipeline::{
    IndexingCoordinator, IndexingCoordinatorBuilder, PipelineConfig,
};
pub use semdex_application::{ErrorStats, IndexingRunResult, RunStatus};
pub use semdex_domain::ports::{
    DatabaseProvider, EmbeddingProvider, LanguageParser, ParserRegistry, ProgressSink,
    SharedDatabaseProvider, SharedEmbeddingProvider,
};
pub use semdex_domain::{
    Chunk, ChunkDiff, ChunkType, EmbedChunk, EmbeddingData, EmbeddingStatus, Error, Language,
    Result, SourceFile,
};
pub use semdex_infrastructure::{
    init_logging, AppConfig, ConfigLoader, ConsecutiveFailureBreaker, FileLockRegistry,
    SlidingWindowRateLimiter, TracingProgressSink,
};
pub use semdex_providers::{InMemoryDatabaseProvider, NullEmbeddingProvider};
pub use tokio_util::sync::CancellationToken;

/// Start building a coordinator with the standard infrastructure wiring
///
/// Uses an empty parser registry (the keyword fallback chunker handles every
/// file), the in-process file lock registry, the consecutive-failure circuit
/// breaker, and the sliding-window rate limiter. Attach an embedding provider
/// and overrides on the returned builder.
pub fn coordinator(database: SharedDatabaseProvider) -> IndexingCoordinatorBuilder {
    IndexingCoordinator::builder(
        database,
        Arc::new(ParserRegistry::new()),
        Arc::new(FileLockRegistry::new()),
    )
    .circuit_breaker(Arc::new(ConsecutiveFailureBreaker::with_name("embedding")))
    .rate_limiter(Arc::new(SlidingWindowRateLimiter::new()))
}
