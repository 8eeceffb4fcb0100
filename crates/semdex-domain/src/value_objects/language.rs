//! Supported source languages

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// Languages the indexer understands
///
/// Tags are case-insensitive on input and canonicalize to a lowercase name.
/// Unknown strings deserialize to [`Language::Unknown`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    CSharp,
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    C,
    Go,
    Rust,
    Php,
    Ruby,
    Markdown,
    Text,
    Unknown,
}

impl Language {
    /// Detect a language from a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "cs" => Language::CSharp,
            "py" => Language::Python,
            "js" => Language::JavaScript,
            "ts" => Language::TypeScript,
            "java" => Language::Java,
            "cpp" | "cc" | "cxx" => Language::Cpp,
            "c" | "h" => Language::C,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            "md" | "markdown" => Language::Markdown,
            "txt" | "text" => Language::Text,
            _ => Language::Unknown,
        }
    }

    /// Canonical lowercase name of the language
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::CSharp => "csharp",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Markdown => "markdown",
            Language::Text => "text",
            Language::Unknown => "unknown",
        }
    }

    /// Primary file extension for the language (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            Language::CSharp => "cs",
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Go => "go",
            Language::Rust => "rs",
            Language::Php => "php",
            Language::Ruby => "rb",
            Language::Markdown => "md",
            Language::Text => "txt",
            Language::Unknown => "",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "csharp" | "c#" | "cs" => Language::CSharp,
            "python" | "py" => Language::Python,
            "javascript" | "js" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "java" => Language::Java,
            "cpp" | "c++" => Language::Cpp,
            "c" => Language::C,
            "go" | "golang" => Language::Go,
            "rust" | "rs" => Language::Rust,
            "php" => Language::Php,
            "ruby" | "rb" => Language::Ruby,
            "markdown" | "md" => Language::Markdown,
            "text" | "txt" | "plaintext" => Language::Text,
            _ => Language::Unknown,
        })
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(Language::Unknown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn extension_mapping() {
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("PY"), Language::Python);
        assert_eq!(Language::from_extension("xyz"), Language::Unknown);
    }

    #[test]
    fn tags_are_case_insensitive() {
        assert_eq!(Language::from_str("RuSt").unwrap(), Language::Rust);
        assert_eq!(Language::from_str("C#").unwrap(), Language::CSharp);
        assert_eq!(Language::from_str("nonsense").unwrap(), Language::Unknown);
    }

    #[test]
    fn canonical_names_are_lowercase() {
        assert_eq!(Language::TypeScript.as_str(), "typescript");
        assert_eq!(Language::CSharp.to_string(), "csharp");
    }

    #[test]
    fn unknown_strings_deserialize_to_unknown() {
        let parsed: Language = serde_json::from_str("\"brainfuck\"").unwrap();
        assert_eq!(parsed, Language::Unknown);
        let parsed: Language = serde_json::from_str("\"rust\"").unwrap();
        assert_eq!(parsed, Language::Rust);
    }
}
