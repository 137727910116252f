//! Bake limits, defaults and numeric tolerances.
//!
//! # Grid Layout
//!
//! ```text
//! SDF grid memory layout (row-major, Y innermost):
//!
//! Address:  0       1       ...  res.y-1      res.y    ...
//! Content: [x0,y0,z0][x0,y1,z0]...[x0,yN,z0][x1,y0,z0]...
//!          └────────── Y ──────────┘
//!
//! index = (z * res.x + x) * res.y + y
//! ```
//!
//! Z is the outermost axis, so every Z layer is one contiguous slice of
//! `res.x * res.y` values. Parallel bakes hand one layer to each task.
//!
//! # Sample Positions
//!
//! ```text
//!   min_pos                                         max_pos
//!     │                                               │
//!     ├───────┬───────┬───────┬───────┬───────┬───────┤
//!     │   •   │   •   │   •   │   •   │   •   │   •   │
//!     └───────┴───────┴───────┴───────┴───────┴───────┘
//!         0       1       2       3       4       5
//!
//! sample = min_pos + cell_size / 2 + grid_pos * cell_size
//! ```

/// Minimum cell budget along the largest axis.
pub const MIN_CELL_COUNT: u32 = 2;

/// Maximum cell budget along the largest axis.
pub const MAX_CELL_COUNT: u32 = 256;

/// Default cell budget along the largest axis.
pub const DEFAULT_CELL_COUNT: u32 = 64;

/// Smallest margin ratio (sampling box equals the mesh box).
pub const MIN_MARGIN_RATIO: f32 = 0.0;

/// Largest margin ratio (sampling box is three times the mesh box).
pub const MAX_MARGIN_RATIO: f32 = 1.0;

/// Default margin ratio.
pub const DEFAULT_MARGIN_RATIO: f32 = 0.25;

/// Minimum chunk grid subdivisions along the largest axis.
pub const MIN_PARTITION_SUBDIV: u32 = 2;

/// Maximum chunk grid subdivisions along the largest axis.
pub const MAX_PARTITION_SUBDIV: u32 = 255;

/// Default chunk grid subdivisions along the largest axis.
pub const DEFAULT_PARTITION_SUBDIV: u32 = 32;

/// A closed solid needs at least a tetrahedron.
pub const MIN_VERTEX_COUNT: usize = 4;

/// Four triangles, three indices each.
pub const MIN_INDEX_COUNT: usize = 12;

/// Sentinel for cells that have not been computed yet.
pub const FAR_SD: f32 = 9_999_999.0;

/// Allowed ratio between neighbor variation and the largest cell size.
pub const VARIATION_TOLERANCE: f32 = 1.1;

/// `sqrt(3)`, the diagonal of a unit cube.
pub const SQRT_3: f32 = 1.732_050_8;

/// Interpolated nodes span `1 << NODE_SIZE_PO2` cells per axis.
pub const NODE_SIZE_PO2: u32 = 2;

/// Cells per interpolated node along each axis (4).
pub const NODE_SIZE_CELLS: u32 = 1 << NODE_SIZE_PO2;

/// Nodes closer than this fraction of their diagonal are evaluated exactly.
pub const NODE_SUBDIV_THRESHOLD_RATIO: f32 = 0.6;

/// Triangle bounds are grown by this fraction of a chunk before bucketing.
pub const PARTITION_MARGIN_RATIO: f32 = 0.01;

/// Cells around each triangle that receive an exact distance in the hull pass.
pub const HULL_PADDING: i32 = 2;

/// Reference triangles tried when signing a hull cell by raycast.
pub const RAYCAST_SIGN_ATTEMPTS: u32 = 3;

/// Maximum ray length, relative to the distance to the reference centroid.
pub const RAYCAST_MAX_DISTANCE_RATIO: f32 = 1.01;

/// The six face-neighbor offsets.
pub const FACE_DIRECTIONS: [[i32; 3]; 6] = [
  [-1, 0, 0],
  [1, 0, 0],
  [0, -1, 0],
  [0, 1, 0],
  [0, 0, -1],
  [0, 0, 1],
];

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
