//! Language parser port

use crate::entities::{Chunk, SourceFile};
use crate::error::Result;
use crate::value_objects::Language;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-language chunk extractor
///
/// Implementations typically wrap a tree-structured parser; the pipeline only
/// sees this seam. `parse` must not mutate its input and may return an empty
/// list. Produced chunks carry the file's id and 1-based line numbers.
#[async_trait]
pub trait LanguageParser: Send + Sync {
    /// Extract semantic chunks from a file's content
    async fn parse(&self, file: &SourceFile, content: &str) -> Result<Vec<Chunk>>;

    /// The language this parser handles
    fn language(&self) -> Language;
}

/// Parsers indexed by language, handed to parse workers
pub type ParserRegistry = HashMap<Language, Arc<dyn LanguageParser>>;
