//! Chunk split engine
//!
//! Takes a possibly oversized chunk and produces pieces that satisfy two
//! upper bounds: non-whitespace characters against the language's
//! `max_chunk_size`, and estimated tokens against its `safe_token_limit`.
//! The strategy is split-then-merge: prefer a midpoint line split for
//! regular-looking code, fall back to a character-level emergency split for
//! degenerate input (minified lines, two-line chunks).
//!
//! The engine is pure. For any input chunk, the concatenated content of the
//! output equals the input content, and line spans are monotone
//! non-decreasing covering the input span.

use crate::chunking::universal::UniversalConcept;
use semdex_domain::content::{estimate_tokens, non_whitespace_len};
use semdex_domain::registry::{self, LanguageChunkProfile};
use semdex_domain::{Chunk, Result};

/// Line length treated as "very long" relative to the chunk size bound
const VERY_LONG_LINE_FRACTION: f64 = 0.2;

/// Maximum line length for content to still count as regular code
const REGULAR_CODE_MAX_LINE: usize = 200;

/// Maximum average line length for content to still count as regular code
const REGULAR_CODE_AVG_LINE: usize = 100;

/// Minimum line count for content to count as regular code
const REGULAR_CODE_MIN_LINES: usize = 10;

/// Fraction of the token-derived character budget the emergency split uses
const EMERGENCY_CHAR_FRACTION: f64 = 0.8;

/// Cut points the emergency split prefers, in priority order
const EMERGENCY_SEPARATORS: &[char] = &[';', '}', '{', ',', ' '];

/// Size bounds a split output must satisfy
#[derive(Debug, Clone, Copy)]
pub struct SplitLimits {
    /// Upper bound on non-whitespace characters
    pub max_chunk_size: usize,
    /// Upper bound on estimated tokens (`ceil(len / 4)`)
    pub safe_token_limit: usize,
}

impl SplitLimits {
    /// Bounds from a language profile
    pub fn from_profile(profile: &LanguageChunkProfile) -> Self {
        Self {
            max_chunk_size: profile.max_chunk_size,
            safe_token_limit: profile.safe_token_limit,
        }
    }

    /// Whether a piece of text satisfies both bounds
    pub fn fits(&self, text: &str) -> bool {
        non_whitespace_len(text) <= self.max_chunk_size
            && estimate_tokens(text) <= self.safe_token_limit
    }
}

/// Intermediate representation the strategies operate on
#[derive(Debug, Clone)]
struct UniversalPart {
    start_line: u32,
    end_line: u32,
    content: String,
}

/// Split a chunk using the size bounds of its own language profile
pub fn split_chunk(chunk: &Chunk) -> Result<Vec<Chunk>> {
    let profile = registry::profile_for(chunk.language);
    split_chunk_with_limits(chunk, SplitLimits::from_profile(profile))
}

/// Split a chunk against explicit size bounds
///
/// A chunk already within bounds is returned unchanged. Otherwise every
/// produced part carries the parent's concept label (collapsed through the
/// universal vocabulary), a `_partN` suffix on the name, and a shallow copy
/// of the parent's metadata.
pub fn split_chunk_with_limits(chunk: &Chunk, limits: SplitLimits) -> Result<Vec<Chunk>> {
    if limits.fits(&chunk.code) {
        return Ok(vec![chunk.clone()]);
    }

    let concept = UniversalConcept::from_chunk_type(chunk.chunk_type);
    let root = UniversalPart {
        start_line: chunk.start_line,
        end_line: chunk.end_line,
        content: chunk.code.clone(),
    };
    let mut parts = Vec::new();
    split_part(root, limits, &mut parts);

    let base_name = chunk.symbol.clone().unwrap_or_else(|| "chunk".to_string());
    let mut out = Vec::with_capacity(parts.len());
    for (index, part) in parts.into_iter().enumerate() {
        let mut builder = Chunk::builder()
            .symbol(format!("{}_part{}", base_name, index + 1))
            .lines(part.start_line, part.end_line)
            .code(part.content)
            .chunk_type(concept.to_chunk_type())
            .file_id(chunk.file_id)
            .language(chunk.language)
            .metadata(chunk.metadata.clone());
        if let Some(path) = &chunk.file_path {
            builder = builder.file_path(path.clone());
        }
        if let Some(header) = &chunk.parent_header {
            builder = builder.parent_header(header.clone());
        }
        out.push(builder.build()?);
    }
    Ok(out)
}

/// Recursive strategy selection
fn split_part(part: UniversalPart, limits: SplitLimits, out: &mut Vec<UniversalPart>) {
    if limits.fits(&part.content) {
        out.push(part);
        return;
    }

    let lines: Vec<&str> = part.content.split('\n').collect();
    let max_line_len = lines.iter().map(|l| l.len()).max().unwrap_or(0);
    let total_line_len: usize = lines.iter().map(|l| l.len()).sum();
    let avg_line_len = total_line_len / lines.len().max(1);

    let has_very_long_lines =
        max_line_len as f64 > VERY_LONG_LINE_FRACTION * limits.max_chunk_size as f64;
    let is_regular_code = lines.len() > REGULAR_CODE_MIN_LINES
        && max_line_len < REGULAR_CODE_MAX_LINE
        && avg_line_len < REGULAR_CODE_AVG_LINE;

    if lines.len() <= 2 || has_very_long_lines {
        emergency_split(part, limits, out);
    } else if is_regular_code {
        let (first, second) = line_split(&part, &lines);
        split_part(first, limits, out);
        split_part(second, limits, out);
    } else {
        let (first, second) = line_split(&part, &lines);
        for half in [first, second] {
            if limits.fits(&half.content) {
                out.push(half);
            } else {
                emergency_split(half, limits, out);
            }
        }
    }
}

/// Divide a part's lines at the midpoint, preserving original line numbers
///
/// The first half keeps its trailing newline so the concatenation of the two
/// halves reproduces the input exactly.
fn line_split(part: &UniversalPart, lines: &[&str]) -> (UniversalPart, UniversalPart) {
    let mid = lines.len() / 2;
    let first_content = format!("{}\n", lines[..mid].join("\n"));
    let second_content = lines[mid..].join("\n");
    let first = UniversalPart {
        start_line: part.start_line,
        end_line: part.start_line + mid as u32 - 1,
        content: first_content,
    };
    let second = UniversalPart {
        start_line: part.start_line + mid as u32,
        end_line: part.end_line,
        content: second_content,
    };
    (first, second)
}

/// Character-level split for content a line split cannot bound
///
/// Walks the text cutting at the latest occurrence of `;`, `}`, `{`, `,`, or
/// space within the character budget whose prefix meets the bound, or hard at
/// the budget when no separator qualifies. Line numbers are approximated by
/// proportional mapping of content offsets onto the part's line span.
fn emergency_split(part: UniversalPart, limits: SplitLimits, out: &mut Vec<UniversalPart>) {
    let total_len = part.content.len();
    let est_tokens = estimate_tokens(&part.content).max(1);
    let chars_per_token = total_len as f64 / est_tokens as f64;
    let token_budget =
        (limits.safe_token_limit as f64 * chars_per_token * EMERGENCY_CHAR_FRACTION) as usize;
    let max_chars = limits.max_chunk_size.min(token_budget).max(1);

    let line_span = (part.end_line - part.start_line) as f64;

    let mut pieces: Vec<(usize, usize)> = Vec::new();
    let mut offset = 0usize;
    loop {
        let rest = &part.content[offset..];
        if limits.fits(rest) {
            break;
        }
        let cut = find_cut(rest, max_chars, limits);
        if cut == 0 || cut >= rest.len() {
            break;
        }
        pieces.push((offset, offset + cut));
        offset += cut;
    }
    pieces.push((offset, total_len));

    for (piece_start, piece_end) in pieces {
        let start_ratio = piece_start as f64 / total_len as f64;
        let end_ratio = piece_end as f64 / total_len as f64;
        let start_line = part.start_line + (start_ratio * line_span) as u32;
        let end_line = (part.start_line + (end_ratio * line_span) as u32)
            .clamp(start_line, part.end_line);
        out.push(UniversalPart {
            start_line,
            end_line,
            content: part.content[piece_start..piece_end].to_string(),
        });
    }
}

/// Find the byte offset to cut a prefix off `text`
fn find_cut(text: &str, max_chars: usize, limits: SplitLimits) -> usize {
    let window_end = floor_char_boundary(text, max_chars.min(text.len()));
    let window = &text[..window_end];
    for &separator in EMERGENCY_SEPARATORS {
        if let Some(position) = window.rfind(separator) {
            let cut = position + separator.len_utf8();
            if limits.fits(&text[..cut]) {
                return cut;
            }
        }
    }
    window_end
}

/// Largest char boundary at or below `index`
fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use semdex_domain::{ChunkType, Language};

    fn limits() -> SplitLimits {
        SplitLimits {
            max_chunk_size: 1200,
            safe_token_limit: 6000,
        }
    }

    fn chunk_of(code: String, end_line: u32) -> Chunk {
        Chunk::builder()
            .symbol("process")
            .lines(1, end_line)
            .code(code)
            .chunk_type(ChunkType::Function)
            .language(Language::Rust)
            .file_id(1)
            .build()
            .unwrap()
    }

    fn concatenation(parts: &[Chunk]) -> String {
        parts.iter().map(|c| c.code.as_str()).collect()
    }

    #[test]
    fn chunk_within_bounds_is_unchanged() {
        let chunk = chunk_of("fn small() {}".to_string(), 1);
        let parts = split_chunk_with_limits(&chunk, limits()).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0], chunk);
    }

    #[test]
    fn oversized_regular_code_splits_within_bounds() {
        let line = "    let value = compute(alpha, beta, gamma);";
        let code: String = (0..300).map(|_| line).collect::<Vec<_>>().join("\n");
        let chunk = chunk_of(code.clone(), 300);
        let parts = split_chunk_with_limits(&chunk, limits()).unwrap();

        assert!(parts.len() > 1);
        for part in &parts {
            assert!(non_whitespace_len(&part.code) <= 1200);
            assert!(estimate_tokens(&part.code) <= 6000);
        }
        assert_eq!(concatenation(&parts), code);
    }

    #[test]
    fn twelve_thousand_chars_yield_at_least_ten_parts() {
        // 12000 non-whitespace characters against a 1200-char bound
        let statement = "let abcdefghijklmnopqrstuvwxyz0=1;";
        let per_line_nonws = non_whitespace_len(statement);
        let line_count = 12000usize.div_ceil(per_line_nonws);
        let code: String = (0..line_count)
            .map(|_| statement)
            .collect::<Vec<_>>()
            .join("\n");
        let chunk = chunk_of(code.clone(), line_count as u32);
        let parts = split_chunk_with_limits(&chunk, limits()).unwrap();

        assert!(parts.len() >= 10, "expected >= 10 parts, got {}", parts.len());
        for part in &parts {
            assert!(non_whitespace_len(&part.code) <= 1200);
            let symbol = part.symbol.as_deref().unwrap();
            assert!(symbol.contains("_part"), "missing _partN suffix: {}", symbol);
        }
        assert_eq!(concatenation(&parts), code);
    }

    #[test]
    fn part_names_are_numbered_sequentially() {
        let line = "call_site(arg_one, arg_two, arg_three, arg_four);";
        let code: String = (0..120).map(|_| line).collect::<Vec<_>>().join("\n");
        let chunk = chunk_of(code, 120);
        let parts = split_chunk_with_limits(&chunk, limits()).unwrap();
        for (index, part) in parts.iter().enumerate() {
            assert_eq!(
                part.symbol.as_deref().unwrap(),
                format!("process_part{}", index + 1)
            );
        }
    }

    #[test]
    fn very_long_single_line_uses_emergency_split() {
        let code = "x".repeat(4000) + ";" + &"y".repeat(4000);
        let chunk = chunk_of(code.clone(), 1);
        let parts = split_chunk_with_limits(&chunk, limits()).unwrap();

        assert!(parts.len() > 1);
        for part in &parts {
            assert!(non_whitespace_len(&part.code) <= 1200);
        }
        assert_eq!(concatenation(&parts), code);
    }

    #[test]
    fn emergency_split_prefers_semicolons() {
        let statements: String = (0..400).map(|_| "let q=do_work(a,b);").collect();
        let chunk = chunk_of(statements.clone(), 1);
        let parts = split_chunk_with_limits(&chunk, limits()).unwrap();

        assert_eq!(concatenation(&parts), statements);
        // every non-final part should end at a statement boundary
        for part in &parts[..parts.len() - 1] {
            assert!(part.code.ends_with(';'), "cut mid-statement: {:?}", &part.code);
        }
    }

    #[test]
    fn line_spans_are_monotone_and_cover_input() {
        let line = "    accumulator += transform(source_value, weight);";
        let code: String = (0..200).map(|_| line).collect::<Vec<_>>().join("\n");
        let chunk = chunk_of(code, 200);
        let parts = split_chunk_with_limits(&chunk, limits()).unwrap();

        assert_eq!(parts.first().unwrap().start_line, 1);
        assert_eq!(parts.last().unwrap().end_line, 200);
        for pair in parts.windows(2) {
            assert!(pair[1].start_line >= pair[0].start_line);
        }
        for part in &parts {
            assert!(part.start_line >= 1);
            assert!(part.end_line >= part.start_line);
        }
    }

    #[test]
    fn parts_inherit_parent_concept() {
        let line = "    field_one: u64,";
        let code: String = (0..200).map(|_| line).collect::<Vec<_>>().join("\n");
        let chunk = Chunk::builder()
            .symbol("Config")
            .lines(1, 200)
            .code(code)
            .chunk_type(ChunkType::Struct)
            .language(Language::Rust)
            .file_id(1)
            .build()
            .unwrap();
        let parts = split_chunk_with_limits(&chunk, limits()).unwrap();
        // Struct collapses to Structure, which expands to Class
        for part in &parts {
            assert_eq!(part.chunk_type, ChunkType::Class);
        }
    }

    #[test]
    fn metadata_is_copied_to_parts() {
        let line = "    let x = y + z;";
        let code: String = (0..200).map(|_| line).collect::<Vec<_>>().join("\n");
        let chunk = Chunk::builder()
            .symbol("f")
            .lines(1, 200)
            .code(code)
            .chunk_type(ChunkType::Function)
            .language(Language::Rust)
            .file_id(1)
            .metadata_entry("visibility", serde_json::json!("pub"))
            .build()
            .unwrap();
        let parts = split_chunk_with_limits(&chunk, limits()).unwrap();
        for part in &parts {
            assert_eq!(part.metadata["visibility"], serde_json::json!("pub"));
        }
    }
}
