//! Triangle preparation.
//!
//! Raw vertex/index arrays are turned into self-contained [`Triangle`] records
//! carrying everything the distance query needs, so the hot loop only does
//! dot products and multiplications.
//!
//! # Winding
//!
//! The face normal is `nor = (v2 - v1) × (v1 - v3)`. A point on the positive
//! side of `nor` is outside the mesh, so triangles must be wound clockwise when
//! seen from outside.

use std::sync::Arc;

use glam::Vec3;

use crate::constants::{MIN_INDEX_COUNT, MIN_VERTEX_COUNT};
use crate::error::{MeshSdfError, MeshSdfResult};
use crate::types::Aabb;

/// A triangle with precomputed query helpers.
///
/// Fields are private: derived values are a pure function of the three
/// vertices, and nothing can change a vertex once the triangle exists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
  v1: Vec3,
  v2: Vec3,
  v3: Vec3,

  v21: Vec3,
  v32: Vec3,
  v13: Vec3,
  nor: Vec3,
  v21_cross_nor: Vec3,
  v32_cross_nor: Vec3,
  v13_cross_nor: Vec3,
  inv_v21_length_squared: f32,
  inv_v32_length_squared: f32,
  inv_v13_length_squared: f32,
  inv_nor_length_squared: f32,
}

/// `1 / x`, or 0 for degenerate lengths so clamped projections stay finite.
#[inline]
fn inverse_or_zero(x: f32) -> f32 {
  if x > 0.0 {
    1.0 / x
  } else {
    0.0
  }
}

impl Triangle {
  pub fn new(v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
    let v21 = v2 - v1;
    let v32 = v3 - v2;
    let v13 = v1 - v3;
    let nor = v21.cross(v13);
    Self {
      v1,
      v2,
      v3,
      v21,
      v32,
      v13,
      nor,
      v21_cross_nor: v21.cross(nor),
      v32_cross_nor: v32.cross(nor),
      v13_cross_nor: v13.cross(nor),
      inv_v21_length_squared: inverse_or_zero(v21.length_squared()),
      inv_v32_length_squared: inverse_or_zero(v32.length_squared()),
      inv_v13_length_squared: inverse_or_zero(v13.length_squared()),
      inv_nor_length_squared: inverse_or_zero(nor.length_squared()),
    }
  }

  #[inline]
  pub fn vertices(&self) -> [Vec3; 3] {
    [self.v1, self.v2, self.v3]
  }

  /// Unnormalized face normal, pointing outside.
  #[inline]
  pub fn normal(&self) -> Vec3 {
    self.nor
  }

  #[inline]
  pub fn centroid(&self) -> Vec3 {
    (self.v1 + self.v2 + self.v3) / 3.0
  }

  /// Zero area: collinear or coincident vertices.
  #[inline]
  pub fn is_degenerate(&self) -> bool {
    self.inv_nor_length_squared == 0.0
  }

  #[inline]
  pub fn min_pos(&self) -> Vec3 {
    self.v1.min(self.v2).min(self.v3)
  }

  #[inline]
  pub fn max_pos(&self) -> Vec3 {
    self.v1.max(self.v2).max(self.v3)
  }

  /// Squared distance from `p` to the closest point of the triangle.
  ///
  /// Prism test: if the projection of `p` falls outside the triangle, the
  /// closest point is on one of the three edges. Otherwise it is the
  /// projection on the plane.
  #[inline]
  pub fn distance_squared(&self, p: Vec3) -> f32 {
    let p1 = p - self.v1;
    let p2 = p - self.v2;
    let p3 = p - self.v3;

    let det = sign_nonzero(self.v21_cross_nor.dot(p1))
      + sign_nonzero(self.v32_cross_nor.dot(p2))
      + sign_nonzero(self.v13_cross_nor.dot(p3));

    if det < 2.0 || self.is_degenerate() {
      let d21 = (self.v21 * (self.v21.dot(p1) * self.inv_v21_length_squared).clamp(0.0, 1.0) - p1)
        .length_squared();
      let d32 = (self.v32 * (self.v32.dot(p2) * self.inv_v32_length_squared).clamp(0.0, 1.0) - p2)
        .length_squared();
      let d13 = (self.v13 * (self.v13.dot(p3) * self.inv_v13_length_squared).clamp(0.0, 1.0) - p3)
        .length_squared();
      d21.min(d32).min(d13)
    } else {
      let d = self.nor.dot(p1);
      d * d * self.inv_nor_length_squared
    }
  }

  /// True if `p` is on the outer side of the triangle's plane.
  #[inline]
  pub fn is_outside(&self, p: Vec3) -> bool {
    self.nor.dot(p - self.v1) > 0.0
  }
}

/// Like `signum`, but 0 counts as positive.
#[inline]
fn sign_nonzero(x: f32) -> f32 {
  if x < 0.0 {
    -1.0
  } else {
    1.0
  }
}

/// Triangles ready for querying, plus the bounds of every input vertex.
///
/// The triangle list is a shared read-only arena: chunk grids and bake tasks
/// refer to triangles by index into it.
#[derive(Clone, Debug)]
pub struct PreparedMesh {
  pub triangles: Arc<[Triangle]>,
  pub bounds: Aabb,
}

/// Build triangle records from raw mesh arrays.
///
/// Bounds cover all vertices, including ones no triangle references. Fails
/// without partial output if the arrays cannot describe a closed mesh.
#[tracing::instrument(skip_all, name = "mesh_sdf::prepare_triangles")]
pub fn prepare_triangles(vertices: &[Vec3], indices: &[u32]) -> MeshSdfResult<PreparedMesh> {
  if vertices.len() < MIN_VERTEX_COUNT {
    return Err(MeshSdfError::TooFewVertices {
      count: vertices.len(),
    });
  }
  if indices.len() < MIN_INDEX_COUNT {
    return Err(MeshSdfError::TooFewIndices {
      count: indices.len(),
    });
  }
  if indices.len() % 3 != 0 {
    return Err(MeshSdfError::IndexCountNotMultipleOfThree {
      count: indices.len(),
    });
  }

  let vertex = |index: u32| {
    vertices
      .get(index as usize)
      .copied()
      .ok_or(MeshSdfError::IndexOutOfRange {
        index,
        vertex_count: vertices.len(),
      })
  };

  let triangles = indices
    .chunks_exact(3)
    .map(|tri| Ok(Triangle::new(vertex(tri[0])?, vertex(tri[1])?, vertex(tri[2])?)))
    .collect::<MeshSdfResult<Arc<[Triangle]>>>()?;

  let mut bounds = Aabb::empty();
  for &v in vertices {
    bounds.encapsulate(v);
  }

  tracing::debug!(
    triangles = triangles.len(),
    vertices = vertices.len(),
    "prepared mesh triangles"
  );

  Ok(PreparedMesh { triangles, bounds })
}

#[cfg(test)]
#[path = "triangle_test.rs"]
mod triangle_test;
