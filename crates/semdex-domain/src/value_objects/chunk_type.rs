//! Semantic classification of chunks

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// Semantic kind of a code chunk
///
/// Unknown strings deserialize to [`ChunkType::Unknown`] so that records
/// written by newer tools remain readable.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Function,
    Class,
    Interface,
    Struct,
    Enum,
    Module,
    Import,
    Documentation,
    Paragraph,
    Unknown,
}

impl ChunkType {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Function => "function",
            ChunkType::Class => "class",
            ChunkType::Interface => "interface",
            ChunkType::Struct => "struct",
            ChunkType::Enum => "enum",
            ChunkType::Module => "module",
            ChunkType::Import => "import",
            ChunkType::Documentation => "documentation",
            ChunkType::Paragraph => "paragraph",
            ChunkType::Unknown => "unknown",
        }
    }

    /// Whether this type names a code construct (as opposed to prose)
    ///
    /// Code-like chunks display their symbol; prose chunks display a content
    /// preview instead.
    pub fn is_code_like(&self) -> bool {
        !matches!(
            self,
            ChunkType::Documentation | ChunkType::Paragraph | ChunkType::Unknown
        )
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChunkType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "function" => ChunkType::Function,
            "class" => ChunkType::Class,
            "interface" => ChunkType::Interface,
            "struct" => ChunkType::Struct,
            "enum" => ChunkType::Enum,
            "module" => ChunkType::Module,
            "import" => ChunkType::Import,
            "documentation" => ChunkType::Documentation,
            "paragraph" => ChunkType::Paragraph,
            _ => ChunkType::Unknown,
        })
    }
}

impl<'de> Deserialize<'de> for ChunkType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(ChunkType::Unknown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_strings_decode_to_unknown() {
        let parsed: ChunkType = serde_json::from_str("\"method_group\"").unwrap();
        assert_eq!(parsed, ChunkType::Unknown);
    }

    #[test]
    fn round_trip() {
        let json = serde_json::to_string(&ChunkType::Function).unwrap();
        assert_eq!(json, "\"function\"");
        let parsed: ChunkType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ChunkType::Function);
    }

    #[test]
    fn code_like_classification() {
        assert!(ChunkType::Function.is_code_like());
        assert!(ChunkType::Import.is_code_like());
        assert!(!ChunkType::Paragraph.is_code_like());
        assert!(!ChunkType::Unknown.is_code_like());
    }
}
