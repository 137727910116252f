//! Exact generators: every cell is evaluated against the mesh.

use crate::distance::{signed_distance_naive, signed_distance_partitioned};
use crate::partition::ChunkGrid;
use crate::triangle::Triangle;
use crate::types::{GridLayout, SlabRange};

use super::fill_slab;

/// Evaluate every cell of `slab` against all triangles.
///
/// `dst` covers exactly the slab.
#[tracing::instrument(skip_all, name = "mesh_sdf::generate_naive")]
pub fn generate_mesh_sdf_naive(
  dst: &mut [f32],
  layout: &GridLayout,
  slab: SlabRange,
  triangles: &[Triangle],
) {
  fill_slab(dst, layout, slab, |_, p| signed_distance_naive(p, triangles));
}

/// Evaluate every cell of `slab`, testing only the candidate triangles of
/// each cell's chunk.
///
/// Produces the same values as [`generate_mesh_sdf_naive`]. `grid` must have
/// been built over the layout's box, with near chunks.
#[tracing::instrument(skip_all, name = "mesh_sdf::generate_partitioned")]
pub fn generate_mesh_sdf_partitioned(
  dst: &mut [f32],
  layout: &GridLayout,
  slab: SlabRange,
  triangles: &[Triangle],
  grid: &ChunkGrid,
) {
  fill_slab(dst, layout, slab, |_, p| {
    signed_distance_partitioned(p, triangles, grid)
  });
}

#[cfg(test)]
#[path = "accurate_test.rs"]
mod accurate_test;
