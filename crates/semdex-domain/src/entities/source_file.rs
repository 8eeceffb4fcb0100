//! Indexed source file descriptor

use crate::error::{Error, Result};
use crate::value_objects::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable descriptor of an indexed source file
///
/// Paths are repository-relative with forward slashes regardless of the host
/// platform; the store is unique by path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceFile {
    /// Store-assigned id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Repository-relative path with forward slashes
    pub path: String,
    /// Modification time, unix seconds
    pub mtime: i64,
    /// Detected language
    pub language: Language,
    /// Size in bytes
    pub size_bytes: u64,
    /// Hash of the normalized file content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SourceFile {
    /// Create a validated descriptor
    pub fn new<S: Into<String>>(
        path: S,
        mtime: i64,
        language: Language,
        size_bytes: u64,
    ) -> Result<Self> {
        let file = Self {
            id: None,
            path: path.into(),
            mtime,
            language,
            size_bytes,
            content_hash: None,
            created_at: None,
            updated_at: None,
        };
        file.validate()?;
        Ok(file)
    }

    /// Attach the normalized content hash
    pub fn with_content_hash<S: Into<String>>(mut self, hash: S) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    /// Attach the store-assigned id
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Validate the descriptor's invariants
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(Error::validation("file path must not be empty"));
        }
        if self.path.contains('\\') {
            return Err(Error::validation(
                "file path must use forward slashes",
            ));
        }
        if self.mtime < 0 {
            return Err(Error::validation("mtime must be non-negative"));
        }
        Ok(())
    }
}
