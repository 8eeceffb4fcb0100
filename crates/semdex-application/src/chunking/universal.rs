//! Universal chunk vocabulary
//!
//! The split engine works on a reduced label set so the same strategy code
//! serves every language. Chunk types collapse into five concepts on the way
//! in and expand back on the way out; the round trip is deliberately lossy
//! (a split `Struct` comes back as `Class`).

use semdex_domain::ChunkType;

/// Reduced label set used inside the split engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniversalConcept {
    /// Callable definitions
    Definition,
    /// Generic code blocks
    Block,
    /// Comments and documentation
    Comment,
    /// Import and include statements
    Import,
    /// Type and module structure
    Structure,
}

impl UniversalConcept {
    /// Collapse a chunk type into its concept
    pub fn from_chunk_type(chunk_type: ChunkType) -> Self {
        match chunk_type {
            ChunkType::Function => UniversalConcept::Definition,
            ChunkType::Class
            | ChunkType::Interface
            | ChunkType::Struct
            | ChunkType::Enum
            | ChunkType::Module => UniversalConcept::Structure,
            ChunkType::Documentation => UniversalConcept::Comment,
            ChunkType::Import => UniversalConcept::Import,
            ChunkType::Paragraph | ChunkType::Unknown => UniversalConcept::Block,
        }
    }

    /// Expand a concept back into a chunk type
    pub fn to_chunk_type(self) -> ChunkType {
        match self {
            UniversalConcept::Definition => ChunkType::Function,
            UniversalConcept::Structure => ChunkType::Class,
            UniversalConcept::Comment => ChunkType::Documentation,
            UniversalConcept::Import => ChunkType::Import,
            UniversalConcept::Block => ChunkType::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_mapping() {
        assert_eq!(
            UniversalConcept::from_chunk_type(ChunkType::Function),
            UniversalConcept::Definition
        );
        assert_eq!(
            UniversalConcept::from_chunk_type(ChunkType::Enum),
            UniversalConcept::Structure
        );
        assert_eq!(
            UniversalConcept::from_chunk_type(ChunkType::Documentation),
            UniversalConcept::Comment
        );
        assert_eq!(
            UniversalConcept::from_chunk_type(ChunkType::Paragraph),
            UniversalConcept::Block
        );
    }

    #[test]
    fn reverse_mapping() {
        assert_eq!(UniversalConcept::Definition.to_chunk_type(), ChunkType::Function);
        assert_eq!(UniversalConcept::Structure.to_chunk_type(), ChunkType::Class);
        assert_eq!(UniversalConcept::Comment.to_chunk_type(), ChunkType::Documentation);
        assert_eq!(UniversalConcept::Import.to_chunk_type(), ChunkType::Import);
        assert_eq!(UniversalConcept::Block.to_chunk_type(), ChunkType::Unknown);
    }
}
