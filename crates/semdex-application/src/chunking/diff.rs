//! Chunk-diff cache
//!
//! Classifies a file's freshly parsed chunks against its stored chunks by
//! normalized content, so unchanged chunks keep their prior embeddings across
//! runs. Stateless and O(n + m): the whole contract is one pure function.

use semdex_domain::content::normalize;
use semdex_domain::{Chunk, ChunkDiff};
use std::collections::HashSet;

/// Classify new chunks against existing chunks by normalized content
///
/// Content appearing on both sides is unchanged (the stored chunks are
/// reported, since they carry ids and embeddings); content only on the
/// existing side is deleted; content only on the new side is added.
/// `modified` stays empty: a change is a deletion plus an addition.
/// Order within each list follows the input order.
pub fn diff_chunks(new_chunks: &[Chunk], existing_chunks: &[Chunk]) -> ChunkDiff {
    let new_keys: HashSet<String> = new_chunks
        .iter()
        .map(|chunk| normalize(&chunk.code))
        .collect();
    let existing_keys: HashSet<String> = existing_chunks
        .iter()
        .map(|chunk| normalize(&chunk.code))
        .collect();

    let mut diff = ChunkDiff::default();
    for chunk in existing_chunks {
        if new_keys.contains(&normalize(&chunk.code)) {
            diff.unchanged.push(chunk.clone());
        } else {
            diff.deleted.push(chunk.clone());
        }
    }
    for chunk in new_chunks {
        if !existing_keys.contains(&normalize(&chunk.code)) {
            diff.added.push(chunk.clone());
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use semdex_domain::{ChunkType, Language};

    fn chunk(code: &str) -> Chunk {
        Chunk::builder()
            .lines(1, 1)
            .code(code)
            .chunk_type(ChunkType::Function)
            .language(Language::Rust)
            .file_id(1)
            .build()
            .unwrap()
    }

    fn codes(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.code.as_str()).collect()
    }

    #[test]
    fn identical_inputs_are_all_unchanged() {
        let chunks = vec![chunk("fn a() {}"), chunk("fn b() {}")];
        let diff = diff_chunks(&chunks, &chunks);
        assert_eq!(diff.unchanged.len(), 2);
        assert!(diff.added.is_empty());
        assert!(diff.deleted.is_empty());
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn add_and_delete_classification() {
        let existing = vec![chunk("A"), chunk("B"), chunk("C")];
        let new = vec![chunk("A"), chunk("C"), chunk("D")];
        let diff = diff_chunks(&new, &existing);
        assert_eq!(codes(&diff.unchanged), vec!["A", "C"]);
        assert_eq!(codes(&diff.added), vec!["D"]);
        assert_eq!(codes(&diff.deleted), vec!["B"]);
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn line_endings_do_not_count_as_changes() {
        let existing = vec![chunk("fn a() {\n    body();\n}")];
        let new = vec![chunk("fn a() {\r\n    body();\r\n}")];
        let diff = diff_chunks(&new, &existing);
        assert_eq!(diff.unchanged.len(), 1);
        assert!(diff.added.is_empty());
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn surrounding_whitespace_does_not_count_as_changes() {
        let existing = vec![chunk("fn a() {}")];
        let new = vec![chunk("\n\nfn a() {}\n")];
        let diff = diff_chunks(&new, &existing);
        assert_eq!(diff.unchanged.len(), 1);
        assert!(diff.added.is_empty());
    }

    #[test]
    fn unchanged_side_comes_from_existing() {
        let stored = chunk("A");
        let mut stored = stored;
        stored.id = Some(41);
        let diff = diff_chunks(&[chunk("A")], &[stored]);
        assert_eq!(diff.unchanged[0].id, Some(41));
    }

    #[test]
    fn empty_sides() {
        let diff = diff_chunks(&[], &[chunk("A")]);
        assert_eq!(diff.deleted.len(), 1);
        let diff = diff_chunks(&[chunk("A")], &[]);
        assert_eq!(diff.added.len(), 1);
        let diff = diff_chunks(&[], &[]);
        assert!(!diff.has_changes());
    }

    #[test]
    fn lists_are_pairwise_disjoint() {
        let existing = vec![chunk("A"), chunk("B")];
        let new = vec![chunk("B"), chunk("C")];
        let diff = diff_chunks(&new, &existing);
        let unchanged: Vec<_> = codes(&diff.unchanged);
        let added: Vec<_> = codes(&diff.added);
        let deleted: Vec<_> = codes(&diff.deleted);
        for code in &unchanged {
            assert!(!added.contains(code));
            assert!(!deleted.contains(code));
        }
        for code in &added {
            assert!(!deleted.contains(code));
        }
        assert_eq!(diff.total_changes(), 2);
    }
}
