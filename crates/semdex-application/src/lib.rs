//! Semdex application layer
//!
//! The engines that make up the indexing core: the chunk split engine, the
//! content-diff cache, the token-aware batcher, the three-stage pipeline with
//! its coordinator, and the adaptive batch file processor. Infrastructure
//! concerns (circuit breakers, rate limiters, file locks) enter through the
//! ports declared here.

pub mod batching;
pub mod chunking;
pub mod constants;
pub mod discovery;
pub mod pipeline;
pub mod ports;
pub mod stats;

pub use pipeline::{IndexingCoordinator, IndexingRunResult, PipelineConfig, RunStatus};
pub use stats::ErrorStats;
