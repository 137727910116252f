//! Bounded-variation check for baked grids.
//!
//! Two face neighbors of a true distance field differ by at most the distance
//! between their centers. A larger jump points at a wrong sign or a missed
//! triangle.

use glam::{IVec3, Vec3};

use crate::constants::FACE_DIRECTIONS;
use crate::distance::closest_triangle_index;
use crate::sign_fix::max_sdf_variation;
use crate::triangle::Triangle;
use crate::types::GridLayout;

/// One side of a failed check.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BadCell {
  pub grid_pos: IVec3,
  pub mesh_pos: Vec3,
  /// Exhaustive nearest triangle, for diagnostics.
  pub closest_triangle_index: usize,
}

impl BadCell {
  fn new(layout: &GridLayout, grid_pos: IVec3, triangles: &[Triangle]) -> Self {
    let mesh_pos = layout.grid_to_space(grid_pos);
    Self {
      grid_pos,
      mesh_pos,
      closest_triangle_index: closest_triangle_index(mesh_pos, triangles),
    }
  }
}

/// Outcome of [`check_sdf`]. Cells are only meaningful when `ok` is false.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CheckResult {
  pub ok: bool,
  pub cell0: BadCell,
  pub cell1: BadCell,
}

impl CheckResult {
  fn passed() -> Self {
    Self {
      ok: true,
      ..Default::default()
    }
  }
}

/// Check that no two face neighbors differ by more than the max variation.
///
/// Stops at the first violation. Empty grids pass.
#[tracing::instrument(skip_all, name = "mesh_sdf::check_sdf")]
pub fn check_sdf(sdf: &[f32], layout: &GridLayout, triangles: &[Triangle]) -> CheckResult {
  if layout.is_empty() {
    return CheckResult::passed();
  }
  assert_eq!(sdf.len(), layout.volume(), "sdf does not match grid");

  let max_variation = max_sdf_variation(layout);

  for (i, &v) in sdf.iter().enumerate() {
    let pos = layout.position_of(i);
    for dir in FACE_DIRECTIONS {
      let npos = pos + IVec3::from_array(dir);
      if !layout.contains(npos) {
        continue;
      }
      let nv = sdf[layout.index_of(npos)];
      if (v - nv).abs() <= max_variation {
        continue;
      }

      let cell0 = BadCell::new(layout, pos, triangles);
      let cell1 = BadCell::new(layout, npos, triangles);
      tracing::debug!(
        max_variation,
        v,
        nv,
        cell0 = ?cell0,
        cell1 = ?cell1,
        "sdf variation too large between neighbors"
      );
      return CheckResult {
        ok: false,
        cell0,
        cell1,
      };
    }
  }

  CheckResult::passed()
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;
