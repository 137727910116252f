//! Core data types shared by every bake stage.

use std::ops::Range;

use glam::{IVec3, UVec3, Vec3};

/// Z layers of the grid, with full X and Y extent.
///
/// This is the sub-box shape used for parallel dispatch: a slab is always one
/// contiguous slice of the flat grid.
pub type SlabRange = Range<u32>;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
  pub min: Vec3,
  pub max: Vec3,
}

impl Aabb {
  /// Create AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: Vec3::splat(f32::INFINITY),
      max: Vec3::splat(f32::NEG_INFINITY),
    }
  }

  /// Create AABB from min/max corners.
  pub fn new(min: Vec3, max: Vec3) -> Self {
    Self { min, max }
  }

  /// Expand AABB to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// Check if AABB is valid (min <= max on all axes).
  pub fn is_valid(&self) -> bool {
    self.min.cmple(self.max).all()
  }

  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }

  /// Grow every side by `size * ratio`.
  pub fn expanded_by_ratio(&self, ratio: f32) -> Self {
    let margin = self.size() * ratio;
    Self {
      min: self.min - margin,
      max: self.max + margin,
    }
  }
}

impl Default for Aabb {
  fn default() -> Self {
    Self::empty()
  }
}

/// Resolution and placement of an SDF grid.
///
/// Each cell holds the signed distance sampled at its center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
  /// Cell count per axis. Any zero axis makes the grid empty.
  pub resolution: UVec3,
  /// Lower corner of the sampled box.
  pub min_pos: Vec3,
  /// Upper corner of the sampled box.
  pub max_pos: Vec3,
}

impl GridLayout {
  pub fn new(resolution: UVec3, min_pos: Vec3, max_pos: Vec3) -> Self {
    Self {
      resolution,
      min_pos,
      max_pos,
    }
  }

  pub fn from_box(resolution: UVec3, bounds: Aabb) -> Self {
    Self::new(resolution, bounds.min, bounds.max)
  }

  /// True when any axis has zero cells.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.resolution.cmpeq(UVec3::ZERO).any()
  }

  /// Total number of cells.
  #[inline]
  pub fn volume(&self) -> usize {
    self.resolution.x as usize * self.resolution.y as usize * self.resolution.z as usize
  }

  /// Number of cells in one Z layer.
  #[inline]
  pub fn layer_len(&self) -> usize {
    self.resolution.x as usize * self.resolution.y as usize
  }

  /// Number of cells in a slab.
  #[inline]
  pub fn slab_len(&self, slab: &SlabRange) -> usize {
    self.layer_len() * (slab.end - slab.start) as usize
  }

  /// The slab covering the whole grid.
  #[inline]
  pub fn full_slab(&self) -> SlabRange {
    0..self.resolution.z
  }

  pub fn size(&self) -> Vec3 {
    self.max_pos - self.min_pos
  }

  /// Per-axis cell size in world units.
  #[inline]
  pub fn cell_size(&self) -> Vec3 {
    self.size() / self.resolution.as_vec3()
  }

  /// Largest per-axis cell size, the bound on SDF variation between neighbors.
  pub fn max_cell_size(&self) -> f32 {
    self.cell_size().max_element()
  }

  /// World position of the center of a cell.
  #[inline]
  pub fn grid_to_space(&self, grid_pos: IVec3) -> Vec3 {
    let cell_size = self.cell_size();
    self.min_pos + cell_size * 0.5 + cell_size * grid_pos.as_vec3()
  }

  /// Flat index of a cell. Z outermost, then X, Y innermost.
  #[inline]
  pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
    (z as usize * self.resolution.x as usize + x as usize) * self.resolution.y as usize + y as usize
  }

  /// Flat index of a cell given as a vector, which must be in bounds.
  #[inline]
  pub fn index_of(&self, pos: IVec3) -> usize {
    debug_assert!(self.contains(pos));
    self.index(pos.x as u32, pos.y as u32, pos.z as u32)
  }

  #[inline]
  pub fn contains(&self, pos: IVec3) -> bool {
    pos.cmpge(IVec3::ZERO).all() && pos.cmplt(self.resolution.as_ivec3()).all()
  }

  /// Grid position of a flat index.
  pub fn position_of(&self, index: usize) -> IVec3 {
    let res_y = self.resolution.y as usize;
    let res_x = self.resolution.x as usize;
    let y = index % res_y;
    let zx = index / res_y;
    let x = zx % res_x;
    let z = zx / res_x;
    IVec3::new(x as i32, y as i32, z as i32)
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
