//! Language registry
//!
//! Per-language chunking parameters: size bounds, token limits, and the
//! line-starting keywords and patterns the fallback chunker uses to decide
//! where a new semantic unit begins. Unknown tags resolve to a conservative
//! fallback profile so the pipeline never refuses a language outright.

use crate::value_objects::{ChunkType, Language};
use std::str::FromStr;

/// Fallback maximum chunk size in non-whitespace characters
pub const FALLBACK_MAX_CHUNK_SIZE: usize = 1200;
/// Fallback minimum chunk size in non-whitespace characters
pub const FALLBACK_MIN_CHUNK_SIZE: usize = 50;
/// Fallback estimated-token ceiling per chunk
pub const FALLBACK_SAFE_TOKEN_LIMIT: usize = 6000;

/// Chunking parameters for one language
#[derive(Debug, Clone)]
pub struct LanguageChunkProfile {
    /// Canonical lowercase language name
    pub name: &'static str,
    /// Primary file extension, without the dot
    pub extension: &'static str,
    /// Upper bound on non-whitespace characters per chunk
    pub max_chunk_size: usize,
    /// Lines below this non-whitespace size merge with their neighbors
    pub min_chunk_size: usize,
    /// Upper bound on estimated tokens per chunk
    pub safe_token_limit: usize,
    /// Line-starting keywords that begin a new chunk
    pub split_keywords: &'static [&'static str],
    /// Line-starting pattern to chunk type
    pub type_patterns: &'static [(&'static str, ChunkType)],
    /// Line-starting pattern to the prefix stripped when extracting a symbol
    pub symbol_prefixes: &'static [(&'static str, &'static str)],
}

impl LanguageChunkProfile {
    /// The chunk type a line starting with one of the registered patterns maps to
    pub fn type_for_line(&self, line: &str) -> Option<ChunkType> {
        let trimmed = line.trim_start();
        self.type_patterns
            .iter()
            .find(|(pattern, _)| trimmed.starts_with(pattern))
            .map(|(_, chunk_type)| *chunk_type)
    }

    /// Extract a symbol from a declaration line, when a prefix rule matches
    pub fn symbol_for_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim_start();
        for (pattern, prefix) in self.symbol_prefixes {
            if trimmed.starts_with(pattern) {
                let rest = trimmed.strip_prefix(prefix).unwrap_or(trimmed);
                let symbol: String = rest
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if !symbol.is_empty() {
                    return Some(symbol);
                }
            }
        }
        None
    }

    /// Whether a line begins a new chunk
    pub fn starts_chunk(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        self.split_keywords
            .iter()
            .any(|keyword| trimmed.starts_with(keyword))
    }
}

const FALLBACK_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "unknown",
    extension: "",
    max_chunk_size: FALLBACK_MAX_CHUNK_SIZE,
    min_chunk_size: FALLBACK_MIN_CHUNK_SIZE,
    safe_token_limit: FALLBACK_SAFE_TOKEN_LIMIT,
    split_keywords: &[],
    type_patterns: &[],
    symbol_prefixes: &[],
};

const RUST_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "rust",
    extension: "rs",
    max_chunk_size: 1200,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &[
        "fn ", "pub fn ", "pub(crate) fn ", "async fn ", "pub async fn ", "struct ",
        "pub struct ", "enum ", "pub enum ", "trait ", "pub trait ", "impl ", "mod ",
        "pub mod ", "use ",
    ],
    type_patterns: &[
        ("fn ", ChunkType::Function),
        ("pub fn ", ChunkType::Function),
        ("async fn ", ChunkType::Function),
        ("pub async fn ", ChunkType::Function),
        ("struct ", ChunkType::Struct),
        ("pub struct ", ChunkType::Struct),
        ("enum ", ChunkType::Enum),
        ("pub enum ", ChunkType::Enum),
        ("trait ", ChunkType::Interface),
        ("pub trait ", ChunkType::Interface),
        ("mod ", ChunkType::Module),
        ("pub mod ", ChunkType::Module),
        ("use ", ChunkType::Import),
    ],
    symbol_prefixes: &[
        ("pub async fn ", "pub async fn "),
        ("pub fn ", "pub fn "),
        ("async fn ", "async fn "),
        ("fn ", "fn "),
        ("pub struct ", "pub struct "),
        ("struct ", "struct "),
        ("pub enum ", "pub enum "),
        ("enum ", "enum "),
        ("pub trait ", "pub trait "),
        ("trait ", "trait "),
        ("pub mod ", "pub mod "),
        ("mod ", "mod "),
    ],
};

const PYTHON_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "python",
    extension: "py",
    max_chunk_size: 1200,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &["def ", "async def ", "class ", "import ", "from "],
    type_patterns: &[
        ("def ", ChunkType::Function),
        ("async def ", ChunkType::Function),
        ("class ", ChunkType::Class),
        ("import ", ChunkType::Import),
        ("from ", ChunkType::Import),
    ],
    symbol_prefixes: &[
        ("async def ", "async def "),
        ("def ", "def "),
        ("class ", "class "),
    ],
};

const JAVASCRIPT_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "javascript",
    extension: "js",
    max_chunk_size: 1200,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &[
        "function ", "async function ", "class ", "export ", "import ", "const ", "module.exports",
    ],
    type_patterns: &[
        ("function ", ChunkType::Function),
        ("async function ", ChunkType::Function),
        ("class ", ChunkType::Class),
        ("import ", ChunkType::Import),
        ("export ", ChunkType::Unknown),
    ],
    symbol_prefixes: &[
        ("async function ", "async function "),
        ("function ", "function "),
        ("class ", "class "),
    ],
};

const TYPESCRIPT_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "typescript",
    extension: "ts",
    max_chunk_size: 1200,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &[
        "function ", "async function ", "class ", "interface ", "enum ", "type ", "export ",
        "import ", "namespace ",
    ],
    type_patterns: &[
        ("function ", ChunkType::Function),
        ("async function ", ChunkType::Function),
        ("class ", ChunkType::Class),
        ("interface ", ChunkType::Interface),
        ("enum ", ChunkType::Enum),
        ("namespace ", ChunkType::Module),
        ("import ", ChunkType::Import),
    ],
    symbol_prefixes: &[
        ("async function ", "async function "),
        ("function ", "function "),
        ("class ", "class "),
        ("interface ", "interface "),
        ("enum ", "enum "),
        ("namespace ", "namespace "),
    ],
};

const JAVA_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "java",
    extension: "java",
    max_chunk_size: 1400,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &[
        "public ", "private ", "protected ", "class ", "interface ", "enum ", "import ", "package ",
    ],
    type_patterns: &[
        ("class ", ChunkType::Class),
        ("public class ", ChunkType::Class),
        ("interface ", ChunkType::Interface),
        ("public interface ", ChunkType::Interface),
        ("enum ", ChunkType::Enum),
        ("public enum ", ChunkType::Enum),
        ("import ", ChunkType::Import),
        ("package ", ChunkType::Module),
    ],
    symbol_prefixes: &[
        ("public class ", "public class "),
        ("class ", "class "),
        ("public interface ", "public interface "),
        ("interface ", "interface "),
        ("public enum ", "public enum "),
        ("enum ", "enum "),
    ],
};

const CSHARP_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "csharp",
    extension: "cs",
    max_chunk_size: 1400,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &[
        "public ", "private ", "protected ", "internal ", "class ", "interface ", "struct ",
        "enum ", "namespace ", "using ",
    ],
    type_patterns: &[
        ("class ", ChunkType::Class),
        ("public class ", ChunkType::Class),
        ("interface ", ChunkType::Interface),
        ("public interface ", ChunkType::Interface),
        ("struct ", ChunkType::Struct),
        ("public struct ", ChunkType::Struct),
        ("enum ", ChunkType::Enum),
        ("public enum ", ChunkType::Enum),
        ("namespace ", ChunkType::Module),
        ("using ", ChunkType::Import),
    ],
    symbol_prefixes: &[
        ("public class ", "public class "),
        ("class ", "class "),
        ("public interface ", "public interface "),
        ("interface ", "interface "),
        ("public struct ", "public struct "),
        ("struct ", "struct "),
        ("namespace ", "namespace "),
    ],
};

const CPP_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "cpp",
    extension: "cpp",
    max_chunk_size: 1400,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &[
        "class ", "struct ", "enum ", "namespace ", "template", "#include", "void ", "int ",
        "static ",
    ],
    type_patterns: &[
        ("class ", ChunkType::Class),
        ("struct ", ChunkType::Struct),
        ("enum ", ChunkType::Enum),
        ("namespace ", ChunkType::Module),
        ("#include", ChunkType::Import),
    ],
    symbol_prefixes: &[
        ("class ", "class "),
        ("struct ", "struct "),
        ("namespace ", "namespace "),
    ],
};

const C_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "c",
    extension: "c",
    max_chunk_size: 1400,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &["struct ", "enum ", "typedef ", "#include", "static ", "void ", "int "],
    type_patterns: &[
        ("struct ", ChunkType::Struct),
        ("enum ", ChunkType::Enum),
        ("#include", ChunkType::Import),
    ],
    symbol_prefixes: &[("struct ", "struct "), ("enum ", "enum ")],
};

const GO_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "go",
    extension: "go",
    max_chunk_size: 1200,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &["func ", "type ", "import ", "package ", "var ", "const "],
    type_patterns: &[
        ("func ", ChunkType::Function),
        ("type ", ChunkType::Struct),
        ("import ", ChunkType::Import),
        ("package ", ChunkType::Module),
    ],
    symbol_prefixes: &[("func ", "func "), ("type ", "type "), ("package ", "package ")],
};

const PHP_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "php",
    extension: "php",
    max_chunk_size: 1200,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &[
        "function ", "public function ", "private function ", "class ", "interface ", "trait ",
        "namespace ", "use ",
    ],
    type_patterns: &[
        ("function ", ChunkType::Function),
        ("public function ", ChunkType::Function),
        ("private function ", ChunkType::Function),
        ("class ", ChunkType::Class),
        ("interface ", ChunkType::Interface),
        ("namespace ", ChunkType::Module),
        ("use ", ChunkType::Import),
    ],
    symbol_prefixes: &[
        ("public function ", "public function "),
        ("private function ", "private function "),
        ("function ", "function "),
        ("class ", "class "),
        ("interface ", "interface "),
    ],
};

const RUBY_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "ruby",
    extension: "rb",
    max_chunk_size: 1200,
    min_chunk_size: 50,
    safe_token_limit: 6000,
    split_keywords: &["def ", "class ", "module ", "require "],
    type_patterns: &[
        ("def ", ChunkType::Function),
        ("class ", ChunkType::Class),
        ("module ", ChunkType::Module),
        ("require ", ChunkType::Import),
    ],
    symbol_prefixes: &[
        ("def ", "def "),
        ("class ", "class "),
        ("module ", "module "),
    ],
};

const MARKDOWN_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "markdown",
    extension: "md",
    max_chunk_size: 1600,
    min_chunk_size: 30,
    safe_token_limit: 6000,
    split_keywords: &["# ", "## ", "### ", "#### "],
    type_patterns: &[
        ("# ", ChunkType::Documentation),
        ("## ", ChunkType::Documentation),
        ("### ", ChunkType::Documentation),
        ("#### ", ChunkType::Documentation),
    ],
    symbol_prefixes: &[],
};

const TEXT_PROFILE: LanguageChunkProfile = LanguageChunkProfile {
    name: "text",
    extension: "txt",
    max_chunk_size: 1600,
    min_chunk_size: 30,
    safe_token_limit: 6000,
    split_keywords: &[],
    type_patterns: &[],
    symbol_prefixes: &[],
};

/// Resolve the chunking profile for a language
pub fn profile_for(language: Language) -> &'static LanguageChunkProfile {
    match language {
        Language::Rust => &RUST_PROFILE,
        Language::Python => &PYTHON_PROFILE,
        Language::JavaScript => &JAVASCRIPT_PROFILE,
        Language::TypeScript => &TYPESCRIPT_PROFILE,
        Language::Java => &JAVA_PROFILE,
        Language::CSharp => &CSHARP_PROFILE,
        Language::Cpp => &CPP_PROFILE,
        Language::C => &C_PROFILE,
        Language::Go => &GO_PROFILE,
        Language::Php => &PHP_PROFILE,
        Language::Ruby => &RUBY_PROFILE,
        Language::Markdown => &MARKDOWN_PROFILE,
        Language::Text => &TEXT_PROFILE,
        Language::Unknown => &FALLBACK_PROFILE,
    }
}

/// Resolve a profile from a case-insensitive language tag
///
/// Unknown tags resolve to the fallback profile (1200/50/6000, empty sets).
pub fn profile_for_tag(tag: &str) -> &'static LanguageChunkProfile {
    let language = Language::from_str(tag).unwrap_or(Language::Unknown);
    profile_for(language)
}
