//! mesh_sdf - Signed distance field baking from closed triangle meshes
//!
//! Turns raw vertex/index arrays into a dense grid of signed distances
//! (negative inside), ready to be copied into voxel storage.
//!
//! # Features
//!
//! - **Accurate strategies**: exhaustive, or pruned through a chunk grid with
//!   identical results
//! - **Approximate strategies**: adaptive trilinear interpolation, or an exact
//!   hull with raycast signs propagated outward
//! - **Sign repair**: flood from the sampling box corner to undo sign flips
//!   near shared edges
//! - **Validation**: bounded-variation check with diagnostics
//! - **Background bakes**: one task per Z layer on any [`TaskScheduler`],
//!   joined by an atomic countdown
//!
//! # Example
//!
//! ```ignore
//! use mesh_sdf::{bake, BakeConfig, BakeMode};
//!
//! let config = BakeConfig::default()
//!     .with_cell_count(64)
//!     .with_mode(BakeMode::AccuratePartitioned { subdiv: 32 });
//! let baked = bake(&vertices, &indices, &config)?;
//!
//! println!("{} cells at {}", baked.values.len(), baked.layout.resolution);
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use error::{MeshSdfError, MeshSdfResult};
pub use types::{Aabb, GridLayout, SlabRange};

// Geometry and spatial queries
pub mod distance;
pub mod partition;
pub mod raycast;
pub mod triangle;
pub use partition::{build_chunk_grid, partition_triangles, Chunk, ChunkGrid};
pub use triangle::{prepare_triangles, PreparedMesh, Triangle};

// Grid generation and post-processing
pub mod generators;
pub mod sign_fix;
pub mod validate;
pub use generators::Generator;
pub use sign_fix::fix_sdf_sign_from_boundary;
pub use validate::{check_sdf, BadCell, CheckResult};

// Orchestration
pub mod bake;
pub mod config;
pub mod join;
pub mod task_queue;
pub mod threading;
pub use bake::{bake, bake_async, BakeCallback, BakeStats, BakedSdf};
pub use config::{auto_compute_grid_resolution, BakeConfig, BakeMode, Resolution};
pub use join::JoinCounter;
pub use task_queue::{BakeCompletion, BakeQueue};
pub use threading::{InlineScheduler, RayonScheduler, Task, TaskScheduler};

#[cfg(test)]
mod test_utils;
