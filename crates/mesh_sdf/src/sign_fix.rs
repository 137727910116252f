//! Sign repair by flooding the outside from the grid origin.
//!
//! Nearest-triangle signs can flip near edges and vertices shared by
//! triangles of opposing orientation. Starting at cell `(0, 0, 0)`, which is
//! assumed to be outside, a 6-connected flood forces negative cells positive
//! and stops at cells that look like a real surface crossing.
//!
//! The origin assumption only holds when the sampling box has a margin around
//! the mesh. A mesh touching the box corner gets wrong signs.

use glam::IVec3;

use crate::constants::{FACE_DIRECTIONS, VARIATION_TOLERANCE};
use crate::types::GridLayout;

/// Largest difference two neighbor cells may have in a valid field.
pub fn max_sdf_variation(layout: &GridLayout) -> f32 {
  VARIATION_TOLERANCE * layout.max_cell_size()
}

/// Flood from the origin cell and make every reached cell positive.
///
/// A neighbor is treated as boundary, and not flooded through, when it is
/// positive but closer than two variations to the surface, or when its sign
/// differs from the current cell by less than one variation.
#[tracing::instrument(skip_all, name = "mesh_sdf::fix_sdf_sign_from_boundary")]
pub fn fix_sdf_sign_from_boundary(sdf: &mut [f32], layout: &GridLayout) {
  if layout.is_empty() {
    return;
  }
  assert_eq!(sdf.len(), layout.volume(), "sdf does not match grid");

  let max_variation = max_sdf_variation(layout);
  let min_sd = 2.0 * max_variation;

  let mut visited = vec![false; layout.volume()];
  let mut stack = vec![IVec3::ZERO];
  visited[0] = true;
  let mut flipped = 0usize;

  while let Some(pos) = stack.pop() {
    let v = sdf[layout.index_of(pos)];

    for dir in FACE_DIRECTIONS {
      let npos = pos + IVec3::from_array(dir);
      if !layout.contains(npos) {
        continue;
      }
      let ni = layout.index_of(npos);
      if visited[ni] {
        continue;
      }
      visited[ni] = true;

      let nv = sdf[ni];
      if (nv > 0.0 && nv < min_sd) || ((nv > 0.0) != (v > 0.0) && (nv - v).abs() < max_variation) {
        continue;
      }
      if nv < 0.0 {
        sdf[ni] = -nv;
        flipped += 1;
      }
      stack.push(npos);
    }
  }

  tracing::debug!(flipped, "fixed boundary signs");
}

#[cfg(test)]
#[path = "sign_fix_test.rs"]
mod sign_fix_test;
