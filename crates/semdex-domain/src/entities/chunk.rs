//! The semantic unit of indexed code
//!
//! A [`Chunk`] is created once by a parse worker, validated at construction,
//! and read-only afterwards. The serialized form tolerates legacy key names
//! (`type` for `chunk_type`, `language_info` for `language`, `path` for
//! `file_path`) so records exchanged with older tooling stay readable.

use crate::error::{Error, Result};
use crate::value_objects::{ChunkType, Language};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum characters of code shown in a display-name preview
const DISPLAY_PREVIEW_LEN: usize = 50;

/// Immutable semantic unit of code with position and type metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Optional symbol name (function name, class name, header text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// 1-based inclusive start line
    pub start_line: u32,
    /// 1-based inclusive end line
    pub end_line: u32,
    /// The chunk's source text (never empty)
    pub code: String,
    /// Semantic classification
    #[serde(alias = "type")]
    pub chunk_type: ChunkType,
    /// Identifier of the owning file row
    pub file_id: i64,
    /// Language the chunk was parsed from
    #[serde(alias = "language_info")]
    pub language: Language,
    /// Optional store-assigned global id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Optional repository-relative path of the owning file
    #[serde(default, alias = "path", skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Optional enclosing header for hierarchical document formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_header: Option<String>,
    /// Optional inclusive starting byte offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_byte: Option<u64>,
    /// Optional inclusive ending byte offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_byte: Option<u64>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Language-specific metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Chunk {
    /// Start building a chunk
    pub fn builder() -> ChunkBuilder {
        ChunkBuilder::default()
    }

    /// Number of lines spanned (always positive)
    pub fn line_count(&self) -> u32 {
        self.end_line - self.start_line + 1
    }

    /// Number of characters in the code text
    pub fn char_count(&self) -> usize {
        self.code.chars().count()
    }

    /// Number of bytes spanned, when byte offsets are known
    pub fn byte_count(&self) -> Option<u64> {
        match (self.start_byte, self.end_byte) {
            (Some(start), Some(end)) => Some(end - start + 1),
            _ => None,
        }
    }

    /// Human-readable name for logs and progress reports
    ///
    /// Code-like chunks show their symbol; anything else (or a symbol-less
    /// chunk) shows a short preview of the code with newlines collapsed.
    pub fn display_name(&self) -> String {
        if self.chunk_type.is_code_like() {
            if let Some(symbol) = &self.symbol {
                return symbol.clone();
            }
        }
        let collapsed: String = self
            .code
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        let preview: String = collapsed.chars().take(DISPLAY_PREVIEW_LEN).collect();
        if collapsed.chars().count() > DISPLAY_PREVIEW_LEN {
            format!("{}...", preview)
        } else {
            preview
        }
    }

    /// Validate the chunk's invariants
    ///
    /// Called by the builder; exposed for records that arrive through
    /// deserialization rather than construction.
    pub fn validate(&self) -> Result<()> {
        if let Some(symbol) = &self.symbol {
            if symbol.trim().is_empty() {
                return Err(Error::validation("symbol must not be whitespace-only"));
            }
        }
        if self.start_line < 1 {
            return Err(Error::validation("start_line must be >= 1"));
        }
        if self.end_line < self.start_line {
            return Err(Error::validation(format!(
                "end_line {} precedes start_line {}",
                self.end_line, self.start_line
            )));
        }
        if self.code.is_empty() {
            return Err(Error::validation("code must not be empty"));
        }
        if let (Some(start), Some(end)) = (self.start_byte, self.end_byte) {
            if start > end {
                return Err(Error::validation(format!(
                    "start_byte {} exceeds end_byte {}",
                    start, end
                )));
            }
        }
        Ok(())
    }
}

/// Builder enforcing [`Chunk`] invariants at construction
#[derive(Debug, Default)]
pub struct ChunkBuilder {
    symbol: Option<String>,
    start_line: u32,
    end_line: u32,
    code: String,
    chunk_type: Option<ChunkType>,
    file_id: i64,
    language: Option<Language>,
    id: Option<i64>,
    file_path: Option<String>,
    parent_header: Option<String>,
    start_byte: Option<u64>,
    end_byte: Option<u64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    metadata: HashMap<String, serde_json::Value>,
}

impl ChunkBuilder {
    /// Set the symbol name
    pub fn symbol<S: Into<String>>(mut self, symbol: S) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the inclusive 1-based line span
    pub fn lines(mut self, start_line: u32, end_line: u32) -> Self {
        self.start_line = start_line;
        self.end_line = end_line;
        self
    }

    /// Set the code text
    pub fn code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = code.into();
        self
    }

    /// Set the semantic classification
    pub fn chunk_type(mut self, chunk_type: ChunkType) -> Self {
        self.chunk_type = Some(chunk_type);
        self
    }

    /// Set the owning file id
    pub fn file_id(mut self, file_id: i64) -> Self {
        self.file_id = file_id;
        self
    }

    /// Set the language
    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Set the store-assigned global id
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the repository-relative file path
    pub fn file_path<S: Into<String>>(mut self, path: S) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Set the enclosing document header
    pub fn parent_header<S: Into<String>>(mut self, header: S) -> Self {
        self.parent_header = Some(header.into());
        self
    }

    /// Set the inclusive byte span
    pub fn bytes(mut self, start_byte: u64, end_byte: u64) -> Self {
        self.start_byte = Some(start_byte);
        self.end_byte = Some(end_byte);
        self
    }

    /// Set the creation timestamp
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Set the last-update timestamp
    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Attach a metadata entry
    pub fn metadata_entry<S: Into<String>>(mut self, key: S, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Replace the whole metadata map
    pub fn metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Validate and build the chunk
    pub fn build(self) -> Result<Chunk> {
        let chunk = Chunk {
            symbol: self.symbol,
            start_line: self.start_line,
            end_line: self.end_line,
            code: self.code,
            chunk_type: self.chunk_type.unwrap_or(ChunkType::Unknown),
            file_id: self.file_id,
            language: self.language.unwrap_or(Language::Unknown),
            id: self.id,
            file_path: self.file_path,
            parent_header: self.parent_header,
            start_byte: self.start_byte,
            end_byte: self.end_byte,
            created_at: self.created_at,
            updated_at: self.updated_at,
            metadata: self.metadata,
        };
        chunk.validate()?;
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ChunkBuilder {
        Chunk::builder()
            .lines(1, 3)
            .code("fn main() {\n    println!(\"hi\");\n}")
            .chunk_type(ChunkType::Function)
            .language(Language::Rust)
            .file_id(1)
    }

    #[test]
    fn builds_a_valid_chunk() {
        let chunk = base().symbol("main").build().unwrap();
        assert_eq!(chunk.line_count(), 3);
        assert_eq!(chunk.display_name(), "main");
    }

    #[test]
    fn rejects_empty_code() {
        let err = base().code("").build().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_whitespace_symbol() {
        let err = base().symbol("   ").build().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_inverted_line_span() {
        let err = base().lines(5, 2).build().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_zero_start_line() {
        let err = base().lines(0, 2).build().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_inverted_byte_span() {
        let err = base().bytes(100, 10).build().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn byte_count_is_inclusive() {
        let chunk = base().bytes(10, 19).build().unwrap();
        assert_eq!(chunk.byte_count(), Some(10));
    }

    #[test]
    fn display_name_previews_prose() {
        let long = "word ".repeat(30);
        let chunk = base()
            .chunk_type(ChunkType::Paragraph)
            .code(long)
            .build()
            .unwrap();
        let name = chunk.display_name();
        assert!(name.ends_with("..."));
        assert_eq!(name.chars().count(), 53);
    }

    #[test]
    fn display_name_collapses_newlines() {
        let chunk = base().build().unwrap();
        assert!(!chunk.display_name().contains('\n'));
    }

    #[test]
    fn legacy_keys_deserialize() {
        let json = serde_json::json!({
            "symbol": "run",
            "start_line": 1,
            "end_line": 2,
            "code": "def run():\n    pass",
            "type": "function",
            "file_id": 7,
            "language_info": "python",
            "path": "pkg/run.py"
        });
        let chunk: Chunk = serde_json::from_value(json).unwrap();
        assert_eq!(chunk.chunk_type, ChunkType::Function);
        assert_eq!(chunk.language, Language::Python);
        assert_eq!(chunk.file_path.as_deref(), Some("pkg/run.py"));
    }

    #[test]
    fn unknown_chunk_type_string_maps_to_unknown() {
        let json = serde_json::json!({
            "start_line": 1,
            "end_line": 1,
            "code": "x",
            "chunk_type": "widget",
            "file_id": 1,
            "language": "rust"
        });
        let chunk: Chunk = serde_json::from_value(json).unwrap();
        assert_eq!(chunk.chunk_type, ChunkType::Unknown);
    }

    #[test]
    fn timestamps_serialize_iso8601() {
        let at = chrono::DateTime::parse_from_rfc3339("2024-05-01T10:30:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let chunk = base().created_at(at).build().unwrap();
        let json = serde_json::to_value(&chunk).unwrap();
        let raw = json["created_at"].as_str().unwrap();
        assert!(raw.starts_with("2024-05-01T10:30:00"));
    }
}
