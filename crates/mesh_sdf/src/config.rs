//! BakeConfig - strategy, resolution and sampling box settings.

use glam::{UVec3, Vec3};

use crate::constants::{
  DEFAULT_CELL_COUNT, DEFAULT_MARGIN_RATIO, DEFAULT_PARTITION_SUBDIV, MAX_CELL_COUNT,
  MAX_MARGIN_RATIO, MAX_PARTITION_SUBDIV, MIN_CELL_COUNT, MIN_MARGIN_RATIO, MIN_PARTITION_SUBDIV,
};

/// Grid generation strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BakeMode {
  /// Every cell against every triangle.
  AccurateNaive,
  /// Same values as naive, with a chunk grid of `subdiv` chunks along the
  /// largest axis pruning the triangles tested per cell.
  AccuratePartitioned { subdiv: u32 },
  /// Exact near the surface, trilinear elsewhere.
  ApproxInterp,
  /// Exact hull signed by raycasts through a chunk grid, then propagated.
  /// Never takes the boundary sign fix.
  ApproxFloodfill { subdiv: u32 },
}

impl BakeMode {
  /// Same mode with its subdivision clamped to the supported range.
  pub fn clamped(self) -> Self {
    let clamp = |subdiv: u32| subdiv.clamp(MIN_PARTITION_SUBDIV, MAX_PARTITION_SUBDIV);
    match self {
      Self::AccuratePartitioned { subdiv } => Self::AccuratePartitioned {
        subdiv: clamp(subdiv),
      },
      Self::ApproxFloodfill { subdiv } => Self::ApproxFloodfill {
        subdiv: clamp(subdiv),
      },
      other => other,
    }
  }
}

impl Default for BakeMode {
  fn default() -> Self {
    Self::AccuratePartitioned {
      subdiv: DEFAULT_PARTITION_SUBDIV,
    }
  }
}

/// How many cells the grid gets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
  /// `cell_count` cells along the largest axis of the sampling box, cubic
  /// cells elsewhere.
  Auto { cell_count: u32 },
  /// Fixed count per axis. Zero axes make an empty grid.
  Explicit(UVec3),
}

impl Resolution {
  /// Cell counts for a sampling box of `box_size`.
  pub fn resolve(&self, box_size: Vec3) -> UVec3 {
    match *self {
      Self::Auto { cell_count } => auto_compute_grid_resolution(box_size, cell_count),
      Self::Explicit(res) => res,
    }
  }
}

impl Default for Resolution {
  fn default() -> Self {
    Self::Auto {
      cell_count: DEFAULT_CELL_COUNT,
    }
  }
}

/// Resolution with uniform cells: the largest axis gets exactly `cell_count`
/// cells, the others as many whole cells as fit.
///
/// A box with no extent gets an empty grid.
pub fn auto_compute_grid_resolution(box_size: Vec3, cell_count: u32) -> UVec3 {
  let max = box_size.max_element();
  if max <= 0.0 || cell_count == 0 {
    return UVec3::ZERO;
  }
  let cell_size = max / cell_count as f32;
  let res = (box_size / cell_size).as_uvec3();
  UVec3::select(box_size.cmpeq(Vec3::splat(max)), UVec3::splat(cell_count), res)
}

/// Settings for one bake.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BakeConfig {
  pub resolution: Resolution,

  /// Sampling box growth on every side, relative to the mesh size.
  pub margin_ratio: f32,

  pub mode: BakeMode,

  /// Flood the outside from the grid origin after generation.
  /// The origin cell must lie outside the mesh, so keep a margin.
  pub boundary_sign_fix: bool,
}

impl BakeConfig {
  pub fn with_resolution(mut self, resolution: Resolution) -> Self {
    self.resolution = match resolution {
      Resolution::Auto { cell_count } => Resolution::Auto {
        cell_count: cell_count.clamp(MIN_CELL_COUNT, MAX_CELL_COUNT),
      },
      explicit => explicit,
    };
    self
  }

  /// Auto resolution with `cell_count` cells along the largest axis.
  pub fn with_cell_count(self, cell_count: u32) -> Self {
    self.with_resolution(Resolution::Auto { cell_count })
  }

  pub fn with_explicit_resolution(self, resolution: UVec3) -> Self {
    self.with_resolution(Resolution::Explicit(resolution))
  }

  /// NaN falls back to no margin.
  pub fn with_margin_ratio(mut self, margin_ratio: f32) -> Self {
    self.margin_ratio = margin_ratio.max(MIN_MARGIN_RATIO).min(MAX_MARGIN_RATIO);
    self
  }

  pub fn with_mode(mut self, mode: BakeMode) -> Self {
    self.mode = mode.clamped();
    self
  }

  pub fn with_boundary_sign_fix(mut self, enabled: bool) -> Self {
    self.boundary_sign_fix = enabled;
    self
  }

  /// Re-apply the builder limits to every field, for configs built as struct
  /// literals.
  pub fn clamped(self) -> Self {
    self
      .with_resolution(self.resolution)
      .with_margin_ratio(self.margin_ratio)
      .with_mode(self.mode)
  }
}

impl Default for BakeConfig {
  fn default() -> Self {
    Self {
      resolution: Resolution::default(),
      margin_ratio: DEFAULT_MARGIN_RATIO,
      mode: BakeMode::default(),
      boundary_sign_fix: true,
    }
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
