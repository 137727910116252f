//! Nearest-triangle signed distance queries.
//!
//! The sign comes from the side of the closest triangle's plane the point is
//! on. When the closest point is an edge or vertex shared by triangles facing
//! different ways, the choice is ambiguous and can be locally wrong; the
//! boundary sign fix repairs most of those cells afterwards.

use glam::Vec3;

use crate::partition::ChunkGrid;
use crate::triangle::Triangle;

/// Closest triangle found by a scan.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Closest {
  triangle_index: usize,
  distance_squared: f32,
}

/// Scan `candidates` (indices into `triangles`) for the closest triangle.
///
/// Ties keep the first candidate. Returns `None` only for an empty candidate
/// set.
#[inline]
fn closest_among(
  p: Vec3,
  triangles: &[Triangle],
  candidates: impl Iterator<Item = usize>,
) -> Option<Closest> {
  let mut best: Option<Closest> = None;
  let mut min_distance_squared = f32::INFINITY;

  for i in candidates {
    let d = triangles[i].distance_squared(p);
    if d < min_distance_squared {
      min_distance_squared = d;
      best = Some(Closest {
        triangle_index: i,
        distance_squared: d,
      });
    }
  }

  best
}

/// Signed distance to the closest of `candidates`, or `+inf` when there are
/// none.
#[inline]
fn signed_distance_among(p: Vec3, triangles: &[Triangle], candidates: impl Iterator<Item = usize>) -> f32 {
  let Some(c) = closest_among(p, triangles, candidates) else {
    return f32::INFINITY;
  };
  let d = c.distance_squared.sqrt();
  if triangles[c.triangle_index].is_outside(p) {
    d
  } else {
    -d
  }
}

/// Index of the closest triangle to `p`, by exhaustive scan.
///
/// Returns `triangles.len()` for an empty slice.
pub fn closest_triangle_index(p: Vec3, triangles: &[Triangle]) -> usize {
  closest_among(p, triangles, 0..triangles.len())
    .map(|c| c.triangle_index)
    .unwrap_or(triangles.len())
}

/// Signed distance from `p` to the mesh, testing every triangle.
pub fn signed_distance_naive(p: Vec3, triangles: &[Triangle]) -> f32 {
  signed_distance_among(p, triangles, 0..triangles.len())
}

/// Signed distance from `p` to the mesh, testing only the candidates of the
/// chunk containing `p`.
///
/// # Panics
///
/// If `p` is outside the chunk grid.
pub fn signed_distance_partitioned(p: Vec3, triangles: &[Triangle], grid: &ChunkGrid) -> f32 {
  signed_distance_among(p, triangles, grid.candidates(p).iter().map(|&i| i as usize))
}

#[cfg(test)]
#[path = "distance_test.rs"]
mod distance_test;
