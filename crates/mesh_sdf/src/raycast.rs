//! Ray queries against a chunk grid, used to sign hull cells.
//!
//! A ray is cast from a sample position toward the centroid of a reference
//! triangle. The first triangle it hits tells whether the sample is inside:
//! hitting a front face (normal against the ray) means the ray came from
//! outside.

use glam::{DVec3, IVec3, Vec3};

use crate::constants::{RAYCAST_MAX_DISTANCE_RATIO, RAYCAST_SIGN_ATTEMPTS, SQRT_3};
use crate::partition::ChunkGrid;
use crate::triangle::Triangle;

const PARALLEL_EPSILON_F32: f32 = 1e-5;
const PARALLEL_EPSILON_F64: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
enum RayTriangle {
  Hit(f32),
  Parallel,
  Miss,
}

/// Möller–Trumbore in single precision.
fn intersect_f32(from: Vec3, dir: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> RayTriangle {
  let e1 = v1 - v0;
  let e2 = v2 - v0;
  let h = dir.cross(e2);
  let a = e1.dot(h);
  if a.abs() < PARALLEL_EPSILON_F32 {
    return RayTriangle::Parallel;
  }

  let f = 1.0 / a;
  let s = from - v0;
  let u = f * s.dot(h);
  if !(0.0..=1.0).contains(&u) {
    return RayTriangle::Miss;
  }

  let q = s.cross(e1);
  let v = f * dir.dot(q);
  if v < 0.0 || u + v > 1.0 {
    return RayTriangle::Miss;
  }

  let t = f * e2.dot(q);
  if t > PARALLEL_EPSILON_F32 {
    RayTriangle::Hit(t)
  } else {
    RayTriangle::Miss
  }
}

/// Möller–Trumbore in double precision.
fn intersect_f64(from: DVec3, dir: DVec3, v0: DVec3, v1: DVec3, v2: DVec3) -> RayTriangle {
  let e1 = v1 - v0;
  let e2 = v2 - v0;
  let h = dir.cross(e2);
  let a = e1.dot(h);
  if a.abs() < PARALLEL_EPSILON_F64 {
    return RayTriangle::Parallel;
  }

  let f = 1.0 / a;
  let s = from - v0;
  let u = f * s.dot(h);
  if !(0.0..=1.0).contains(&u) {
    return RayTriangle::Miss;
  }

  let q = s.cross(e1);
  let v = f * dir.dot(q);
  if v < 0.0 || u + v > 1.0 {
    return RayTriangle::Miss;
  }

  let t = f * e2.dot(q);
  if t > PARALLEL_EPSILON_F64 {
    RayTriangle::Hit(t as f32)
  } else {
    RayTriangle::Miss
  }
}

/// Distance along `dir` at which the ray from `from` hits `triangle`.
///
/// Near-parallel results in single precision are retried in double
/// precision, which usually settles them.
pub fn ray_intersects_triangle(from: Vec3, dir: Vec3, triangle: &Triangle) -> Option<f32> {
  let [v0, v1, v2] = triangle.vertices();
  let mut result = intersect_f32(from, dir, v0, v1, v2);
  if result == RayTriangle::Parallel {
    result = intersect_f64(
      from.as_dvec3(),
      dir.as_dvec3(),
      v0.as_dvec3(),
      v1.as_dvec3(),
      v2.as_dvec3(),
    );
  }
  match result {
    RayTriangle::Hit(t) => Some(t),
    RayTriangle::Parallel | RayTriangle::Miss => None,
  }
}

/// Closest hit among `indices`.
fn closest_hit(
  from: Vec3,
  dir: Vec3,
  triangles: &[Triangle],
  indices: &[u32],
) -> Option<(usize, f32)> {
  let mut best: Option<(usize, f32)> = None;
  for &i in indices {
    if let Some(t) = ray_intersects_triangle(from, dir, &triangles[i as usize]) {
      if best.map_or(true, |(_, best_t)| t < best_t) {
        best = Some((i as usize, t));
      }
    }
  }
  best
}

/// First triangle hit by a ray, walking the chunk grid front to back.
///
/// `dir` must be normalized. Hits farther than `max_distance` are ignored.
/// A hit is only accepted once the walk has reached the chunk containing it,
/// so a triangle straddling several chunks never shadows a closer one.
pub fn raycast(
  grid: &ChunkGrid,
  triangles: &[Triangle],
  from: Vec3,
  dir: Vec3,
  max_distance: f32,
) -> Option<usize> {
  let cs = grid.chunk_size();
  let start = (from - grid.min_pos()) / cs;
  let max_distance_chunks = max_distance / cs + 2.0 * SQRT_3;

  let mut cell = start.floor().as_ivec3();
  let step = IVec3::new(axis_step(dir.x), axis_step(dir.y), axis_step(dir.z));
  let t_delta = Vec3::new(axis_delta(dir.x), axis_delta(dir.y), axis_delta(dir.z));
  let mut t_max = Vec3::new(
    axis_first_boundary(start.x, cell.x, dir.x),
    axis_first_boundary(start.y, cell.y, dir.y),
    axis_first_boundary(start.z, cell.z, dir.z),
  );

  loop {
    let exit_t = t_max.min_element();

    if grid.contains(cell) {
      let chunk = grid.chunk(cell);
      if let Some((index, t)) = closest_hit(from, dir, triangles, &chunk.triangles) {
        if t <= max_distance.min(exit_t * cs) {
          return Some(index);
        }
      }
    }

    if exit_t > max_distance_chunks {
      return None;
    }

    if t_max.x <= t_max.y && t_max.x <= t_max.z {
      cell.x += step.x;
      t_max.x += t_delta.x;
    } else if t_max.y <= t_max.z {
      cell.y += step.y;
      t_max.y += t_delta.y;
    } else {
      cell.z += step.z;
      t_max.z += t_delta.z;
    }
  }
}

#[inline]
fn axis_step(d: f32) -> i32 {
  if d > 0.0 {
    1
  } else if d < 0.0 {
    -1
  } else {
    0
  }
}

#[inline]
fn axis_delta(d: f32) -> f32 {
  if d != 0.0 {
    (1.0 / d).abs()
  } else {
    f32::INFINITY
  }
}

#[inline]
fn axis_first_boundary(start: f32, cell: i32, d: f32) -> f32 {
  if d > 0.0 {
    (cell as f32 + 1.0 - start) / d
  } else if d < 0.0 {
    (start - cell as f32) / -d
  } else {
    f32::INFINITY
  }
}

/// Sign of the mesh at `pos`, from a ray toward `reference`'s centroid.
///
/// Returns `None` when the ray hits nothing, which happens when it grazes
/// the reference triangle edge-on.
pub fn find_sign_with_raycast(
  grid: &ChunkGrid,
  triangles: &[Triangle],
  pos: Vec3,
  reference: &Triangle,
) -> Option<i32> {
  let target = reference.centroid();
  let dir = (target - pos).normalize_or_zero();
  if dir == Vec3::ZERO {
    return None;
  }
  let max_distance = pos.distance(target) * RAYCAST_MAX_DISTANCE_RATIO;

  let Some(hit) = raycast(grid, triangles, pos, dir, max_distance) else {
    tracing::debug!(
      pos = %pos,
      dp = reference.normal().dot(dir),
      "raycast found no triangle"
    );
    return None;
  };

  // Front face: the ray came from outside.
  Some(if triangles[hit].normal().dot(dir) < 0.0 {
    1
  } else {
    -1
  })
}

/// Sum of up to three raycast signs, each toward the next reference triangle.
///
/// `ref_triangle_index` advances once per attempt and carries over between
/// calls. Stops after two attempts if they did not cancel out. A negative sum
/// means inside.
pub fn find_sign_with_raycast_multi_attempt(
  grid: &ChunkGrid,
  triangles: &[Triangle],
  pos: Vec3,
  ref_triangle_index: &mut usize,
) -> i32 {
  let mut sign_sum = 0;
  for attempt in 0..RAYCAST_SIGN_ATTEMPTS {
    if let Some(sign) = find_sign_with_raycast(grid, triangles, pos, &triangles[*ref_triangle_index]) {
      sign_sum += sign;
    }
    *ref_triangle_index = (*ref_triangle_index + 1) % triangles.len();
    if attempt == 1 && sign_sum != 0 {
      break;
    }
  }
  sign_sum
}

#[cfg(test)]
#[path = "raycast_test.rs"]
mod raycast_test;
