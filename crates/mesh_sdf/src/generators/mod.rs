//! SDF grid generation strategies.
//!
//! - [`accurate`]: exact values, exhaustive or through a chunk grid
//! - [`interp`]: exact near the surface, trilinear elsewhere
//! - [`floodfill`]: exact hull, distances propagated outward

pub mod accurate;
pub mod floodfill;
pub mod interp;

pub use accurate::{generate_mesh_sdf_naive, generate_mesh_sdf_partitioned};
pub use floodfill::generate_mesh_sdf_approx_floodfill;
pub use interp::generate_mesh_sdf_approx_interp;

use glam::{IVec3, Vec3};

use crate::config::BakeMode;
use crate::partition::{build_chunk_grid, partition_triangles, ChunkGrid};
use crate::triangle::Triangle;
use crate::types::{Aabb, GridLayout, SlabRange};

/// Write `f(grid_pos, sample_pos)` into every cell of `slab`.
///
/// `dst` covers exactly the slab.
pub(crate) fn fill_slab(
  dst: &mut [f32],
  layout: &GridLayout,
  slab: SlabRange,
  f: impl Fn(IVec3, Vec3) -> f32,
) {
  if layout.is_empty() || slab.is_empty() {
    return;
  }
  assert_eq!(dst.len(), layout.slab_len(&slab), "destination does not match slab");

  let offset = slab.start as usize * layout.layer_len();
  for z in slab {
    for x in 0..layout.resolution.x {
      for y in 0..layout.resolution.y {
        let gp = IVec3::new(x as i32, y as i32, z as i32);
        dst[layout.index(x, y, z) - offset] = f(gp, layout.grid_to_space(gp));
      }
    }
  }
}

/// A generation strategy with everything it needs besides the triangles.
#[derive(Debug)]
pub enum Generator {
  Naive,
  Partitioned(ChunkGrid),
  ApproxInterp,
  /// Chunk grid without near lists, used for raycasting only.
  ApproxFloodfill(ChunkGrid),
}

impl Generator {
  /// Build the acceleration structure `mode` needs over the sampling box.
  pub fn new(mode: &BakeMode, triangles: &[Triangle], sampling_box: Aabb) -> Self {
    match *mode {
      BakeMode::AccurateNaive => Self::Naive,
      BakeMode::AccuratePartitioned { subdiv } => {
        Self::Partitioned(build_chunk_grid(subdiv, triangles, sampling_box))
      }
      BakeMode::ApproxInterp => Self::ApproxInterp,
      BakeMode::ApproxFloodfill { subdiv } => {
        Self::ApproxFloodfill(partition_triangles(subdiv, triangles, sampling_box))
      }
    }
  }

  /// Generate `slab` into `dst`, which covers exactly the slab.
  ///
  /// # Panics
  ///
  /// Floodfill propagates across the whole grid and panics on a partial slab.
  pub fn generate(&self, triangles: &[Triangle], dst: &mut [f32], layout: &GridLayout, slab: SlabRange) {
    match self {
      Self::Naive => generate_mesh_sdf_naive(dst, layout, slab, triangles),
      Self::Partitioned(grid) => generate_mesh_sdf_partitioned(dst, layout, slab, triangles, grid),
      Self::ApproxInterp => generate_mesh_sdf_approx_interp(dst, layout, slab, triangles),
      Self::ApproxFloodfill(grid) => {
        assert!(slab == layout.full_slab(), "floodfill only generates whole grids");
        generate_mesh_sdf_approx_floodfill(dst, layout, triangles, grid);
      }
    }
  }

  /// True when slabs are generated as independent tasks.
  pub fn dispatches_per_slab(&self) -> bool {
    matches!(self, Self::Naive | Self::Partitioned(_))
  }

  /// True when the boundary sign fix may run after generation.
  pub fn applies_sign_fix(&self) -> bool {
    !matches!(self, Self::ApproxFloodfill(_))
  }

  /// Chunk grid built for this strategy, if any.
  pub fn chunk_grid(&self) -> Option<&ChunkGrid> {
    match self {
      Self::Partitioned(grid) | Self::ApproxFloodfill(grid) => Some(grid),
      Self::Naive | Self::ApproxInterp => None,
    }
  }
}
