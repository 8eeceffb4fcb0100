//! Keyword and size based fallback chunker
//!
//! Used when no language-specific parser is registered for a file. Splits on
//! the language's configured line-starting keywords, or whenever the running
//! non-whitespace character count would exceed the language's chunk size
//! bound. Segments smaller than `min_chunk_size` stay merged with their
//! neighbors. Anything still oversized afterwards goes through the split
//! engine.

use crate::chunking::splitter::{split_chunk_with_limits, SplitLimits};
use semdex_domain::content::non_whitespace_len;
use semdex_domain::registry::{self, LanguageChunkProfile};
use semdex_domain::{Chunk, ChunkType, Result, SourceFile};

/// Chunk a file's content with the language's keyword/size heuristics
pub fn chunk_content(file: &SourceFile, content: &str) -> Result<Vec<Chunk>> {
    let profile = registry::profile_for(file.language);
    let file_id = file.id.unwrap_or_default();

    let mut segments: Vec<(u32, Vec<&str>)> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_start = 1u32;
    let mut current_size = 0usize;

    for (index, line) in content.lines().enumerate() {
        let line_number = index as u32 + 1;
        let line_size = non_whitespace_len(line);

        // A keyword only opens a new segment once the current one has grown
        // past the merge threshold; tiny fragments stay with their neighbors.
        let keyword_boundary =
            profile.starts_chunk(line) && current_size >= profile.min_chunk_size;
        let size_boundary =
            !current.is_empty() && current_size + line_size > profile.max_chunk_size;

        if (keyword_boundary || size_boundary) && !current.is_empty() {
            segments.push((current_start, std::mem::take(&mut current)));
            current_start = line_number;
            current_size = 0;
        }

        current.push(line);
        current_size += line_size;
    }
    if !current.is_empty() {
        segments.push((current_start, current));
    }

    let limits = SplitLimits::from_profile(profile);
    let mut chunks = Vec::new();
    for (start_line, lines) in segments {
        let code = lines.join("\n");
        if code.trim().is_empty() {
            continue;
        }
        let end_line = start_line + lines.len() as u32 - 1;
        let chunk = build_segment_chunk(file, file_id, profile, start_line, end_line, code)?;
        chunks.extend(split_chunk_with_limits(&chunk, limits)?);
    }
    Ok(chunks)
}

fn build_segment_chunk(
    file: &SourceFile,
    file_id: i64,
    profile: &LanguageChunkProfile,
    start_line: u32,
    end_line: u32,
    code: String,
) -> Result<Chunk> {
    let declaration = code.lines().find(|l| !l.trim().is_empty());
    let chunk_type = declaration
        .and_then(|line| profile.type_for_line(line))
        .unwrap_or(ChunkType::Unknown);
    let symbol = declaration.and_then(|line| profile.symbol_for_line(line));

    let mut builder = Chunk::builder()
        .lines(start_line, end_line)
        .code(code)
        .chunk_type(chunk_type)
        .file_id(file_id)
        .language(file.language)
        .file_path(file.path.clone());
    if let Some(symbol) = symbol {
        builder = builder.symbol(symbol);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use semdex_domain::Language;

    fn file(language: Language) -> SourceFile {
        SourceFile::new("src/sample.rs", 1_700_000_000, language, 1024)
            .unwrap()
            .with_id(7)
    }

    #[test]
    fn splits_on_declaration_keywords() {
        let content = "\
fn first() {
    let alpha = load_alpha();
    let beta = load_beta();
    let gamma = alpha + beta;
    assert!(gamma > 0);
}

fn second() {
    let delta = load_delta();
    let epsilon = load_epsilon();
    let zeta = delta * epsilon;
    assert!(zeta > 0);
}";
        let chunks = chunk_content(&file(Language::Rust), content).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].symbol.as_deref(), Some("first"));
        assert_eq!(chunks[1].symbol.as_deref(), Some("second"));
        assert_eq!(chunks[0].chunk_type, ChunkType::Function);
        assert_eq!(chunks[1].start_line, 8);
    }

    #[test]
    fn tiny_segments_merge_with_neighbors() {
        // Each declaration is below min_chunk_size, so no keyword boundary fires
        let content = "fn a() {}\nfn b() {}\nfn c() {}";
        let chunks = chunk_content(&file(Language::Rust), content).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].line_count(), 3);
    }

    #[test]
    fn respects_size_bound() {
        let line = "    let accumulator = accumulator + increment_value;";
        let content: String = (0..120).map(|_| line).collect::<Vec<_>>().join("\n");
        let chunks = chunk_content(&file(Language::Rust), &content).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(non_whitespace_len(&chunk.code) <= 1200);
        }
    }

    #[test]
    fn unknown_language_still_chunks() {
        let content = "some opaque content\nwith a few lines\nand no keywords";
        let mut f = file(Language::Unknown);
        f.path = "notes/opaque.xyz".to_string();
        let chunks = chunk_content(&f, content).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::Unknown);
    }

    #[test]
    fn empty_content_produces_no_chunks() {
        let chunks = chunk_content(&file(Language::Rust), "").unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunks_carry_file_id_and_path() {
        let content = "fn only() {\n    body();\n}";
        let chunks = chunk_content(&file(Language::Rust), content).unwrap();
        assert_eq!(chunks[0].file_id, 7);
        assert_eq!(chunks[0].file_path.as_deref(), Some("src/sample.rs"));
    }
}
