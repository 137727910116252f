//! Error types for mesh SDF baking.

use thiserror::Error;

use crate::constants::{MIN_INDEX_COUNT, MIN_VERTEX_COUNT};

/// Result type for mesh SDF operations.
pub type MeshSdfResult<T> = Result<T, MeshSdfError>;

/// Recoverable failures, caused by caller input.
///
/// Broken internal invariants (chunk lookups out of range, partitioning without
/// triangles) are not represented here: they panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshSdfError {
  /// Fewer vertices than a closed solid needs.
  #[error("mesh has {count} vertices, a closed mesh needs at least {}", MIN_VERTEX_COUNT)]
  TooFewVertices { count: usize },

  /// Fewer indices than a closed solid needs.
  #[error("mesh has {count} indices, a closed mesh needs at least {}", MIN_INDEX_COUNT)]
  TooFewIndices { count: usize },

  /// Index array does not describe whole triangles.
  #[error("index count {count} is not a multiple of 3")]
  IndexCountNotMultipleOfThree { count: usize },

  /// An index references a vertex that does not exist.
  #[error("index {index} is out of range for {vertex_count} vertices")]
  IndexOutOfRange { index: u32, vertex_count: usize },

  /// Destination buffer does not match the baked grid.
  #[error("destination buffer holds {actual} values, grid has {expected}")]
  BufferSizeMismatch { expected: usize, actual: usize },
}
