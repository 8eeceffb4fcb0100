//! Ports consumed by the indexing core
//!
//! Concrete database, embedding, and parser implementations live outside this
//! crate; the pipeline depends only on these contracts.

mod database;
mod embedding;
mod parser;
mod progress;

pub use database::{DatabaseProvider, SharedDatabaseProvider};
pub use embedding::{EmbeddingProvider, SharedEmbeddingProvider};
pub use parser::{LanguageParser, ParserRegistry};
pub use progress::{NullProgressSink, ProgressSink, SharedProgressSink};
