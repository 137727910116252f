//! Approximate generator: exact hull around the surface, propagated outward.
//!
//! # Passes
//!
//! 1. **Hull**: each triangle writes its squared distance into the cells
//!    around its bounds (padded by two cells). Cells closer than two cells to
//!    the surface are frozen and signed by raycasting.
//! 2. **Seeds**: frozen cells with a non-frozen face neighbor.
//! 3. **Propagation**: breadth-first over 26 neighbors. A cell reached from a
//!    seed gets the seed's distance grown by the step length, keeping the
//!    sign of the seed.

use glam::{IVec3, Vec3};

use crate::constants::{FACE_DIRECTIONS, FAR_SD, HULL_PADDING};
use crate::partition::ChunkGrid;
use crate::raycast::find_sign_with_raycast_multi_attempt;
use crate::triangle::Triangle;
use crate::types::GridLayout;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellFlag {
  NotVisited,
  Visited,
  Frozen,
}

/// Fill the whole grid with the hull + floodfill approximation.
///
/// `grid` only needs triangle buckets (see
/// [`partition_triangles`](crate::partition::partition_triangles)).
#[tracing::instrument(skip_all, name = "mesh_sdf::generate_approx_floodfill")]
pub fn generate_mesh_sdf_approx_floodfill(
  dst: &mut [f32],
  layout: &GridLayout,
  triangles: &[Triangle],
  grid: &ChunkGrid,
) {
  if layout.is_empty() {
    return;
  }
  assert_eq!(dst.len(), layout.volume(), "destination does not match grid");

  let mut flags = vec![CellFlag::NotVisited; layout.volume()];
  generate_mesh_sdf_hull(dst, &mut flags, layout, triangles, grid);

  let seeds = place_seeds(&flags, layout);
  propagate(dst, &mut flags, layout, seeds);
}

/// Exact distances near the surface. Frozen cells get a raycast sign; other
/// touched cells keep an unsigned distance; the rest stay at [`FAR_SD`].
fn generate_mesh_sdf_hull(
  dst: &mut [f32],
  flags: &mut [CellFlag],
  layout: &GridLayout,
  triangles: &[Triangle],
  grid: &ChunkGrid,
) {
  // Squared distances can exceed the far marker on large meshes.
  dst.fill(f32::INFINITY);

  let res = layout.resolution.as_ivec3();
  let cell_size = layout.cell_size();
  let translation = layout.min_pos + cell_size * 0.5;

  {
    let _span = tracing::info_span!("triangle_squared_distances").entered();
    for t in triangles {
      let lo = ((t.min_pos() - translation) / cell_size).floor().as_ivec3() - HULL_PADDING;
      let hi = ((t.max_pos() - translation) / cell_size).ceil().as_ivec3() + HULL_PADDING;
      let lo = lo.max(IVec3::ZERO);
      let hi = hi.min(res);

      for z in lo.z..hi.z {
        for x in lo.x..hi.x {
          for y in lo.y..hi.y {
            let gp = IVec3::new(x, y, z);
            let i = layout.index_of(gp);
            let d = t.distance_squared(layout.grid_to_space(gp));
            dst[i] = dst[i].min(d);
          }
        }
      }
    }
  }

  let _span = tracing::info_span!("sqrt_and_raycast_signs").entered();
  let frozen_distance = HULL_PADDING as f32 * layout.max_cell_size();
  let mut ref_triangle_index = 0;
  let mut frozen = 0usize;

  for (i, df) in dst.iter_mut().enumerate() {
    if *df == f32::INFINITY {
      *df = FAR_SD;
      continue;
    }
    *df = df.sqrt();
    if *df < frozen_distance {
      flags[i] = CellFlag::Frozen;
      frozen += 1;
      let pos = layout.grid_to_space(layout.position_of(i));
      let sign_sum = find_sign_with_raycast_multi_attempt(grid, triangles, pos, &mut ref_triangle_index);
      if sign_sum < 0 {
        *df = -*df;
      }
    }
  }

  tracing::debug!(frozen, "computed hull");
}

fn place_seeds(flags: &[CellFlag], layout: &GridLayout) -> Vec<IVec3> {
  let mut seeds = Vec::new();
  for (i, &flag) in flags.iter().enumerate() {
    if flag != CellFlag::Frozen {
      continue;
    }
    let pos = layout.position_of(i);
    let has_open_neighbor = FACE_DIRECTIONS.iter().any(|&dir| {
      let npos = pos + IVec3::from_array(dir);
      layout.contains(npos) && flags[layout.index_of(npos)] != CellFlag::Frozen
    });
    if has_open_neighbor {
      seeds.push(pos);
    }
  }
  seeds
}

/// Step length to a neighbor, indexed by `|dx| << 2 | |dy| << 1 | |dz|`.
fn step_lengths(cell_size: Vec3) -> [f32; 8] {
  std::array::from_fn(|i| {
    let mask = Vec3::new(((i >> 2) & 1) as f32, ((i >> 1) & 1) as f32, (i & 1) as f32);
    (cell_size * mask).length()
  })
}

fn propagate(dst: &mut [f32], flags: &mut [CellFlag], layout: &GridLayout, seeds: Vec<IVec3>) {
  let _span = tracing::info_span!("propagate").entered();

  let dds = step_lengths(layout.cell_size());
  let res_minus_one = layout.resolution.as_ivec3() - IVec3::ONE;

  let mut current = seeds;
  let mut next = Vec::new();
  let mut iterations = 0usize;

  while !current.is_empty() {
    iterations += 1;

    // Breadth-first: seeds created in this pass wait for the next one.
    for &pos in &current {
      let src_sd = dst[layout.index_of(pos)];
      debug_assert!(src_sd != FAR_SD);

      let min = IVec3::select(pos.cmpeq(IVec3::ZERO), IVec3::ZERO, IVec3::NEG_ONE);
      let max = IVec3::select(pos.cmpeq(res_minus_one), IVec3::ZERO, IVec3::ONE);

      for dz in min.z..=max.z {
        for dy in min.y..=max.y {
          for dx in min.x..=max.x {
            if dx == 0 && dy == 0 && dz == 0 {
              continue;
            }

            let npos = pos + IVec3::new(dx, dy, dz);
            let ni = layout.index_of(npos);
            let flag = flags[ni];
            if flag == CellFlag::Frozen {
              continue;
            }

            let dd = dds[((dx.unsigned_abs() << 2) | (dy.unsigned_abs() << 1) | dz.unsigned_abs()) as usize];
            let dst_sd = dst[ni];

            dst[ni] = match flag {
              CellFlag::NotVisited if dst_sd == FAR_SD => {
                if src_sd < 0.0 {
                  src_sd - dd
                } else {
                  src_sd + dd
                }
              }
              // Unfrozen hull distances are unsigned and may be closer.
              CellFlag::NotVisited => {
                if src_sd < 0.0 {
                  (-dst_sd).max(src_sd - dd)
                } else {
                  dst_sd.min(src_sd + dd)
                }
              }
              _ => {
                if src_sd < 0.0 {
                  dst_sd.max(src_sd - dd)
                } else {
                  dst_sd.min(src_sd + dd)
                }
              }
            };

            if flag == CellFlag::NotVisited {
              flags[ni] = CellFlag::Visited;
              next.push(npos);
            }
          }
        }
      }
    }

    current.clear();
    std::mem::swap(&mut current, &mut next);
  }

  tracing::debug!(iterations, "propagated distances");
}

#[cfg(test)]
#[path = "floodfill_test.rs"]
mod floodfill_test;
