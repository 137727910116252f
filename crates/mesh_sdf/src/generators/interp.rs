//! Approximate generator: exact near the surface, interpolated elsewhere.
//!
//! # Nodes
//!
//! ```text
//!   c ─ ─ ─ ─ c ─ ─ ─ ─ c       c: node corner, evaluated exactly
//!   │ · · · · │ · · · · │       ·: cell
//!   │ · · · · │ · · · · │
//!   │ · · · · │ · · · · │       A node spans 4×4×4 cells. Corners are
//!   │ · · · · │ · · · · │       shared with neighbor nodes and evaluated
//!   c ─ ─ ─ ─ c ─ ─ ─ ─ c       once.
//! ```
//!
//! If the smallest absolute corner distance is below 0.6 × the node diagonal,
//! the surface may cross the node and every cell is evaluated. Otherwise cells
//! are trilinearly interpolated from the corners.

use glam::{IVec3, Vec3};

use crate::constants::{FAR_SD, NODE_SIZE_CELLS, NODE_SUBDIV_THRESHOLD_RATIO};
use crate::distance::signed_distance_naive;
use crate::triangle::Triangle;
use crate::types::{GridLayout, SlabRange};

/// Trilinear interpolation. `corners` is indexed by `x | y << 1 | z << 2`.
#[inline]
fn interpolate_trilinear(corners: &[f32; 8], p: Vec3) -> f32 {
  let v00 = corners[0b000] + p.x * (corners[0b001] - corners[0b000]);
  let v10 = corners[0b010] + p.x * (corners[0b011] - corners[0b010]);
  let v01 = corners[0b100] + p.x * (corners[0b101] - corners[0b100]);
  let v11 = corners[0b110] + p.x * (corners[0b111] - corners[0b110]);

  let v0 = v00 + p.y * (v10 - v00);
  let v1 = v01 + p.y * (v11 - v01);

  v0 + p.z * (v1 - v0)
}

#[inline]
fn corner_offset(i: usize) -> IVec3 {
  IVec3::new((i & 1) as i32, ((i >> 1) & 1) as i32, ((i >> 2) & 1) as i32)
}

/// Fill `slab` with an adaptive approximation of the signed distance.
///
/// Only the nodes overlapping the slab are visited, so slabs can be generated
/// independently; each cell gets the same value it would get in a full-grid
/// run.
#[tracing::instrument(skip_all, name = "mesh_sdf::generate_approx_interp")]
pub fn generate_mesh_sdf_approx_interp(
  dst: &mut [f32],
  layout: &GridLayout,
  slab: SlabRange,
  triangles: &[Triangle],
) {
  if layout.is_empty() || slab.is_empty() {
    return;
  }
  assert_eq!(dst.len(), layout.slab_len(&slab), "destination does not match slab");

  dst.fill(FAR_SD);

  let res = layout.resolution.as_ivec3();
  let node_size = NODE_SIZE_CELLS as i32;
  let node_diagonal = NODE_SIZE_CELLS as f32 * layout.cell_size().length();
  let threshold = NODE_SUBDIV_THRESHOLD_RATIO * node_diagonal;

  let eval = |gp: IVec3| signed_distance_naive(layout.grid_to_space(gp), triangles);

  // Nodes along Z overlapping the slab.
  let first_node_z = (slab.start / NODE_SIZE_CELLS) as i32;
  let end_node_z = slab.end.div_ceil(NODE_SIZE_CELLS) as i32;

  let corner_grid_size = IVec3::new(
    layout.resolution.x.div_ceil(NODE_SIZE_CELLS) as i32 + 1,
    layout.resolution.y.div_ceil(NODE_SIZE_CELLS) as i32 + 1,
    end_node_z - first_node_z + 1,
  );
  let corner_index =
    |c: IVec3| ((c.z * corner_grid_size.x + c.x) * corner_grid_size.y + c.y) as usize;

  let slab_min = IVec3::new(0, 0, slab.start as i32);
  let slab_max = IVec3::new(res.x, res.y, slab.end as i32);
  let slab_offset = slab.start as usize * layout.layer_len();
  let local_index = |gp: IVec3| layout.index_of(gp) - slab_offset;
  let in_slab = |gp: IVec3| gp.cmpge(slab_min).all() && gp.cmplt(slab_max).all();

  let corner_volume = (corner_grid_size.x * corner_grid_size.y * corner_grid_size.z) as usize;
  let mut corners = vec![0.0f32; corner_volume];

  {
    let _span = tracing::info_span!("node_corners").entered();
    for cz in 0..corner_grid_size.z {
      for cx in 0..corner_grid_size.x {
        for cy in 0..corner_grid_size.y {
          let gp = IVec3::new(cx, cy, cz + first_node_z) * node_size;
          let sd = eval(gp);
          corners[corner_index(IVec3::new(cx, cy, cz))] = sd;
          if in_slab(gp) {
            dst[local_index(gp)] = sd;
          }
        }
      }
    }
  }

  let _span = tracing::info_span!("node_cells").entered();
  let mut exact_nodes = 0usize;
  let mut interpolated_nodes = 0usize;

  for nz in 0..corner_grid_size.z - 1 {
    for nx in 0..corner_grid_size.x - 1 {
      for ny in 0..corner_grid_size.y - 1 {
        let node = IVec3::new(nx, ny, nz);
        let sd: [f32; 8] = std::array::from_fn(|i| corners[corner_index(node + corner_offset(i))]);
        let ud = sd.iter().fold(FAR_SD, |m, v| m.min(v.abs()));
        let near_surface = ud < threshold;
        if near_surface {
          exact_nodes += 1;
        } else {
          interpolated_nodes += 1;
        }

        let node_origin = IVec3::new(nx, ny, nz + first_node_z) * node_size;
        let lo = node_origin.max(slab_min);
        let hi = (node_origin + node_size).min(slab_max);

        for z in lo.z..hi.z {
          for x in lo.x..hi.x {
            for y in lo.y..hi.y {
              let gp = IVec3::new(x, y, z);
              let i = local_index(gp);
              if dst[i] != FAR_SD {
                continue;
              }
              dst[i] = if near_surface {
                eval(gp)
              } else {
                let p = (gp - node_origin).as_vec3() / node_size as f32;
                interpolate_trilinear(&sd, p)
              };
            }
          }
        }
      }
    }
  }

  tracing::debug!(exact_nodes, interpolated_nodes, "interpolated slab");
}

#[cfg(test)]
#[path = "interp_test.rs"]
mod interp_test;
