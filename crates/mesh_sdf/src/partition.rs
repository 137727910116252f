//! Spatial partitioning of triangles into a uniform chunk grid.
//!
//! # Structure
//!
//! ```text
//! ┌─────┬─────┬─────┬─────┐
//! │     │  ╱  │     │     │   chunk_size = max(box size) / subdiv
//! ├─────┼─╱───┼─────┼─────┤
//! │     │╱    │     │     │   each triangle is referenced by every chunk
//! ├────╱┼─────┼─────┼─────┤   its (slightly grown) bounds overlap
//! │   ╱ │     │     │  p  │
//! └─────┴─────┴─────┴─────┘   p queries the triangles of its near chunks
//! ```
//!
//! Chunks refer to triangles and to each other by index: the triangle list is
//! an arena owned by the prepared mesh, and the chunk array is allocated once
//! before any near-chunk index is recorded.
//!
//! # Near Chunks
//!
//! For each chunk, let `d²` be the squared chunk-grid distance to the nearest
//! nonempty chunk (0 if the chunk has triangles itself). Every nonempty chunk
//! within `(d + 2√3)²` goes into its near list: a query point is at most
//! `d + √3` from some triangle, and any triangle that close lies in a chunk
//! whose center is at most `d + 2√3` away. The triangles of the near list
//! are flattened into one sorted, deduplicated candidate range per chunk, so a
//! query never tests the same triangle twice and visits candidates in the same
//! order as an exhaustive scan.

use std::ops::Range;

use glam::{IVec3, Vec3};
use smallvec::SmallVec;

use crate::constants::{PARTITION_MARGIN_RATIO, SQRT_3};
use crate::triangle::Triangle;
use crate::types::Aabb;

/// Slack on the near-chunk radius, so rounding never drops a chunk that sits
/// exactly on it.
const NEAR_MARGIN_EPSILON: f32 = 1e-4;

/// One cell of the chunk grid.
#[derive(Clone, Debug, Default)]
pub struct Chunk {
  /// Position in chunk-grid units.
  pub pos: IVec3,
  /// Indices of triangles whose bounds overlap this chunk.
  pub triangles: SmallVec<[u32; 8]>,
  /// Indices of nonempty chunks consulted by queries landing here.
  pub near_chunks: Vec<u32>,
}

impl Chunk {
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.triangles.is_empty()
  }
}

/// Uniform grid of cubic chunks bucketing a fixed triangle set.
///
/// Immutable once built. Built with [`partition_triangles`] it only buckets
/// triangles (enough for raycasting); built with [`build_chunk_grid`] it also
/// carries near-chunk lists for nearest-triangle queries.
#[derive(Clone, Debug)]
pub struct ChunkGrid {
  chunks: Vec<Chunk>,
  size: IVec3,
  min_pos: Vec3,
  chunk_size: f32,
  /// Flattened per-chunk candidate triangles, indexed by `candidate_ranges`.
  candidates: Vec<u32>,
  candidate_ranges: Vec<Range<u32>>,
}

impl ChunkGrid {
  /// Grid size in chunks.
  #[inline]
  pub fn size(&self) -> IVec3 {
    self.size
  }

  /// World position of the lower corner of chunk (0, 0, 0).
  #[inline]
  pub fn min_pos(&self) -> Vec3 {
    self.min_pos
  }

  /// Edge length of a chunk in world units.
  #[inline]
  pub fn chunk_size(&self) -> f32 {
    self.chunk_size
  }

  #[inline]
  pub fn chunks(&self) -> &[Chunk] {
    &self.chunks
  }

  pub fn nonempty_chunk_count(&self) -> usize {
    self.chunks.iter().filter(|c| !c.is_empty()).count()
  }

  /// True once near-chunk lists have been computed.
  #[inline]
  pub fn has_near_chunks(&self) -> bool {
    !self.candidate_ranges.is_empty()
  }

  #[inline]
  pub fn contains(&self, pos: IVec3) -> bool {
    pos.cmpge(IVec3::ZERO).all() && pos.cmplt(self.size).all()
  }

  /// Chunk-grid position of a world position. May be out of range.
  #[inline]
  pub fn locate(&self, p: Vec3) -> IVec3 {
    ((p - self.min_pos) / self.chunk_size).floor().as_ivec3()
  }

  /// Flat ZXY index of a chunk.
  ///
  /// # Panics
  ///
  /// If `pos` is outside the grid.
  #[inline]
  pub fn chunk_index(&self, pos: IVec3) -> usize {
    assert!(
      self.contains(pos),
      "chunk index out of range: {pos} not in grid of size {}",
      self.size
    );
    ((pos.z * self.size.x + pos.x) * self.size.y + pos.y) as usize
  }

  #[inline]
  pub fn chunk(&self, pos: IVec3) -> &Chunk {
    &self.chunks[self.chunk_index(pos)]
  }

  /// Sorted, deduplicated triangle indices a query at `p` has to test.
  ///
  /// # Panics
  ///
  /// If `p` falls outside the grid, or near chunks were not computed.
  #[inline]
  pub fn candidates(&self, p: Vec3) -> &[u32] {
    assert!(self.has_near_chunks(), "chunk grid was built without near chunks");
    let range = self.candidate_ranges[self.chunk_index(self.locate(p))].clone();
    &self.candidates[range.start as usize..range.end as usize]
  }

  /// Number of triangle tests a partitioned query at `p` performs.
  pub fn candidate_count(&self, p: Vec3) -> usize {
    self.candidates(p).len()
  }
}

/// Bucket triangles into a chunk grid covering `bounds`.
///
/// The result has no near-chunk lists; use [`build_chunk_grid`] for
/// nearest-triangle queries.
#[tracing::instrument(skip_all, name = "mesh_sdf::partition_triangles")]
pub fn partition_triangles(subdiv: u32, triangles: &[Triangle], bounds: Aabb) -> ChunkGrid {
  let extent = bounds.size().max_element();
  let chunk_size = if extent > 0.0 {
    extent / subdiv.max(1) as f32
  } else {
    1.0
  };
  let grid_min = (bounds.min / chunk_size).floor().as_ivec3();
  let grid_max = (bounds.max / chunk_size).ceil().as_ivec3();
  // A flat box still needs one layer of chunks.
  let size = (grid_max - grid_min).max(IVec3::ONE);
  let min_pos = grid_min.as_vec3() * chunk_size;

  let volume = (size.x * size.y * size.z) as usize;
  let mut grid = ChunkGrid {
    chunks: vec![Chunk::default(); volume],
    size,
    min_pos,
    chunk_size,
    candidates: Vec::new(),
    candidate_ranges: Vec::new(),
  };

  for z in 0..size.z {
    for x in 0..size.x {
      for y in 0..size.y {
        let pos = IVec3::new(x, y, z);
        let i = grid.chunk_index(pos);
        grid.chunks[i].pos = pos;
      }
    }
  }

  let margin = Vec3::splat(chunk_size * PARTITION_MARGIN_RATIO);
  let last = size - IVec3::ONE;

  {
    let _span = tracing::info_span!("group_triangles").entered();
    for (triangle_index, t) in triangles.iter().enumerate() {
      // The margin can push bounds past the grid when the mesh touches the
      // box. Clamp: the triangle itself is inside.
      let lo = grid.locate(t.min_pos() - margin).clamp(IVec3::ZERO, last);
      let hi = grid.locate(t.max_pos() + margin).clamp(IVec3::ZERO, last);

      for z in lo.z..=hi.z {
        for x in lo.x..=hi.x {
          for y in lo.y..=hi.y {
            let i = grid.chunk_index(IVec3::new(x, y, z));
            grid.chunks[i].triangles.push(triangle_index as u32);
          }
        }
      }
    }
  }

  tracing::debug!(
    chunk_size,
    size = %size,
    nonempty = grid.nonempty_chunk_count(),
    "partitioned triangles"
  );

  grid
}

/// Bucket triangles and compute near-chunk lists.
pub fn build_chunk_grid(subdiv: u32, triangles: &[Triangle], bounds: Aabb) -> ChunkGrid {
  let mut grid = partition_triangles(subdiv, triangles, bounds);
  compute_near_chunks(&mut grid);
  grid
}

/// Fill near-chunk lists and candidate ranges.
///
/// # Panics
///
/// If no chunk holds a triangle.
#[tracing::instrument(skip_all, name = "mesh_sdf::compute_near_chunks")]
fn compute_near_chunks(grid: &mut ChunkGrid) {
  let nonempty: Vec<u32> = grid
    .chunks
    .iter()
    .enumerate()
    .filter(|(_, c)| !c.is_empty())
    .map(|(i, _)| i as u32)
    .collect();

  assert!(!nonempty.is_empty(), "no closest chunk: chunk grid holds no triangles");

  let mut near_lists = Vec::with_capacity(grid.chunks.len());
  for chunk in &grid.chunks {
    let closest_distance_squared = if chunk.is_empty() {
      nonempty
        .iter()
        .map(|&ni| (grid.chunks[ni as usize].pos - chunk.pos).length_squared())
        .min()
        .unwrap_or(i32::MAX)
    } else {
      0
    };

    let margin = (closest_distance_squared as f32).sqrt() + 2.0 * SQRT_3;
    let margin_squared = margin * margin + NEAR_MARGIN_EPSILON;

    let near: Vec<u32> = nonempty
      .iter()
      .copied()
      .filter(|&ni| {
        let distance_squared = (grid.chunks[ni as usize].pos - chunk.pos).length_squared();
        distance_squared as f32 <= margin_squared
      })
      .collect();
    near_lists.push(near);
  }

  for (chunk, near) in grid.chunks.iter_mut().zip(near_lists) {
    chunk.near_chunks = near;
  }

  let _span = tracing::info_span!("flatten_candidates").entered();
  let mut candidates = Vec::new();
  let mut candidate_ranges = Vec::with_capacity(grid.chunks.len());
  let mut scratch: Vec<u32> = Vec::new();

  for chunk in &grid.chunks {
    scratch.clear();
    for &ni in &chunk.near_chunks {
      scratch.extend_from_slice(&grid.chunks[ni as usize].triangles);
    }
    scratch.sort_unstable();
    scratch.dedup();

    let start = candidates.len() as u32;
    candidates.extend_from_slice(&scratch);
    candidate_ranges.push(start..candidates.len() as u32);
  }

  tracing::debug!(
    chunks = grid.chunks.len(),
    candidates = candidates.len(),
    "computed near chunks"
  );

  grid.candidates = candidates;
  grid.candidate_ranges = candidate_ranges;
}

#[cfg(test)]
#[path = "partition_test.rs"]
mod partition_test;
