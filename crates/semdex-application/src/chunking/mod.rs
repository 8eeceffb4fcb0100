//! Chunking engines
//!
//! The split engine bounds chunk sizes, the fallback chunker covers languages
//! without a registered parser, and the diff cache decides which chunks
//! survived between runs.

pub mod diff;
pub mod fallback;
pub mod splitter;
pub mod universal;

pub use diff::diff_chunks;
pub use splitter::{split_chunk, split_chunk_with_limits, SplitLimits};
pub use universal::UniversalConcept;
