//! Provider constants

/// Dimension of vectors produced by the null embedding provider
///
/// Matches the dimensionality of common small embedding models.
pub const NULL_EMBEDDING_DIMENSION: usize = 384;
