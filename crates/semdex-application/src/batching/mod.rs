//! Batch grouping strategies

pub mod adaptive;
pub mod token_batcher;

pub use adaptive::{
    AdaptiveBatchConfig, AdaptiveBatchProcessor, AdaptiveBatchResult, FileOutcome, FileProcessor,
};
pub use token_batcher::{BatchLimits, TokenAwareBatcher};
