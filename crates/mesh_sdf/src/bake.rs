//! Bake orchestration: preparation, generation, sign fix.
//!
//! # Async Flow
//!
//! ```text
//! bake_async ──► first pass ──┬─ interp / floodfill ─► generate ─► sign fix ─► on_complete
//!                             │
//!                             └─ naive / partitioned
//!                                  │
//!                                  ├─► slab 0 ──┐
//!                                  ├─► slab 1 ──┤ JoinCounter
//!                                  └─► slab N ──┴─► last one: sign fix ─► on_complete
//! ```
//!
//! Slab tasks share one [`SlabBake`] through an `Arc`. Each writes only its
//! own slot; the task that posts last assembles the grid.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use glam::Vec3;
use rayon::prelude::*;
use web_time::Instant;

use crate::config::BakeConfig;
use crate::error::{MeshSdfError, MeshSdfResult};
use crate::generators::Generator;
use crate::join::JoinCounter;
use crate::sign_fix::fix_sdf_sign_from_boundary;
use crate::threading::TaskScheduler;
use crate::triangle::{prepare_triangles, Triangle};
use crate::types::GridLayout;

/// Timings and sizes of one bake.
#[derive(Debug, Clone, Copy, Default)]
pub struct BakeStats {
  /// Number of triangles in the mesh.
  pub triangle_count: usize,
  /// Chunks holding triangles, when the mode builds a chunk grid.
  pub nonempty_chunk_count: usize,
  /// Triangle preparation time in microseconds.
  pub prepare_us: u64,
  /// Chunk grid construction time in microseconds.
  pub partition_us: u64,
  /// Grid generation time in microseconds, wall clock across all slabs.
  pub generate_us: u64,
  /// Sign fix time in microseconds.
  pub sign_fix_us: u64,
}

/// A finished grid.
#[derive(Debug, Clone)]
pub struct BakedSdf {
  /// Signed distances, indexed by [`GridLayout::index`].
  pub values: Vec<f32>,
  pub layout: GridLayout,
  pub stats: BakeStats,
}

impl BakedSdf {
  /// Copy the grid into a caller-owned buffer of exactly the grid's volume.
  pub fn copy_to(&self, dst: &mut [f32]) -> MeshSdfResult<()> {
    if dst.len() != self.values.len() {
      return Err(MeshSdfError::BufferSizeMismatch {
        expected: self.values.len(),
        actual: dst.len(),
      });
    }
    dst.copy_from_slice(&self.values);
    Ok(())
  }
}

/// Completion callback of [`bake_async`].
pub type BakeCallback = Box<dyn FnOnce(MeshSdfResult<BakedSdf>) + Send + 'static>;

/// Everything a bake needs before generation starts.
struct BakeSetup {
  triangles: Arc<[Triangle]>,
  layout: GridLayout,
  generator: Generator,
  boundary_sign_fix: bool,
  stats: BakeStats,
}

impl BakeSetup {
  #[tracing::instrument(skip_all, name = "mesh_sdf::bake_setup")]
  fn new(vertices: &[Vec3], indices: &[u32], config: &BakeConfig) -> MeshSdfResult<Self> {
    let config = config.clamped();
    let mut stats = BakeStats::default();

    let start = Instant::now();
    let mesh = prepare_triangles(vertices, indices)?;
    stats.prepare_us = start.elapsed().as_micros() as u64;
    stats.triangle_count = mesh.triangles.len();

    let sampling_box = mesh.bounds.expanded_by_ratio(config.margin_ratio);
    let resolution = config.resolution.resolve(sampling_box.size());
    let layout = GridLayout::from_box(resolution, sampling_box);

    let start = Instant::now();
    let generator = Generator::new(&config.mode, &mesh.triangles, sampling_box);
    stats.partition_us = start.elapsed().as_micros() as u64;
    stats.nonempty_chunk_count = generator.chunk_grid().map_or(0, |grid| grid.nonempty_chunk_count());

    tracing::debug!(
      mode = ?config.mode,
      resolution = %layout.resolution,
      triangles = stats.triangle_count,
      chunks = stats.nonempty_chunk_count,
      "bake setup"
    );

    Ok(Self {
      triangles: mesh.triangles,
      layout,
      generator,
      boundary_sign_fix: config.boundary_sign_fix,
      stats,
    })
  }

  fn slab_count(&self) -> u32 {
    if self.layout.is_empty() {
      0
    } else {
      self.layout.resolution.z
    }
  }

  /// Generate the whole grid on the calling thread.
  fn generate_whole(&self) -> Vec<f32> {
    let mut values = vec![0.0; self.layout.volume()];
    self
      .generator
      .generate(&self.triangles, &mut values, &self.layout, self.layout.full_slab());
    values
  }

  /// Sign fix, when enabled and supported by the mode.
  fn finish(&self, mut values: Vec<f32>, mut stats: BakeStats) -> BakedSdf {
    if self.boundary_sign_fix && self.generator.applies_sign_fix() {
      let start = Instant::now();
      fix_sdf_sign_from_boundary(&mut values, &self.layout);
      stats.sign_fix_us = start.elapsed().as_micros() as u64;
    }
    BakedSdf {
      values,
      layout: self.layout,
      stats,
    }
  }
}

/// Bake on the calling thread. Slab-parallel modes fan out over rayon.
#[tracing::instrument(skip_all, name = "mesh_sdf::bake")]
pub fn bake(vertices: &[Vec3], indices: &[u32], config: &BakeConfig) -> MeshSdfResult<BakedSdf> {
  let setup = BakeSetup::new(vertices, indices, config)?;
  let mut stats = setup.stats;

  let start = Instant::now();
  let values = if setup.generator.dispatches_per_slab() && setup.slab_count() > 0 {
    let layout = &setup.layout;
    let mut values = vec![0.0; layout.volume()];
    values
      .par_chunks_mut(layout.layer_len())
      .enumerate()
      .for_each(|(z, layer)| {
        let z = z as u32;
        setup.generator.generate(&setup.triangles, layer, layout, z..z + 1);
      });
    values
  } else {
    setup.generate_whole()
  };
  stats.generate_us = start.elapsed().as_micros() as u64;

  Ok(setup.finish(values, stats))
}

/// Bake through `scheduler` without blocking.
///
/// A first-pass task prepares the mesh. Naive and partitioned modes then
/// submit one task per Z layer; other modes generate inside the first pass.
/// `on_complete` runs exactly once, on the thread of the last task, with the
/// grid or the preparation error.
pub fn bake_async<S, F>(scheduler: &S, vertices: Vec<Vec3>, indices: Vec<u32>, config: BakeConfig, on_complete: F)
where
  S: TaskScheduler + Clone,
  F: FnOnce(MeshSdfResult<BakedSdf>) + Send + 'static,
{
  let task_scheduler = scheduler.clone();
  scheduler.submit(Box::new(move || {
    run_first_pass(&task_scheduler, &vertices, &indices, &config, Box::new(on_complete));
  }));
}

#[tracing::instrument(skip_all, name = "mesh_sdf::bake_first_pass")]
fn run_first_pass<S: TaskScheduler>(
  scheduler: &S,
  vertices: &[Vec3],
  indices: &[u32],
  config: &BakeConfig,
  on_complete: BakeCallback,
) {
  let setup = match BakeSetup::new(vertices, indices, config) {
    Ok(setup) => setup,
    Err(err) => {
      tracing::error!(%err, "failed to prepare mesh for baking");
      on_complete(Err(err));
      return;
    }
  };

  let slab_count = setup.slab_count();
  if !setup.generator.dispatches_per_slab() || slab_count == 0 {
    let mut stats = setup.stats;
    let start = Instant::now();
    let values = setup.generate_whole();
    stats.generate_us = start.elapsed().as_micros() as u64;
    on_complete(Ok(setup.finish(values, stats)));
    return;
  }

  let bake = Arc::new(SlabBake {
    slabs: (0..slab_count).map(|_| OnceLock::new()).collect(),
    join: JoinCounter::new(slab_count),
    on_complete: Mutex::new(Some(on_complete)),
    generate_start: Instant::now(),
    setup,
  });

  for z in 0..slab_count {
    let bake = Arc::clone(&bake);
    scheduler.submit(Box::new(move || bake.run_slab(z)));
  }
}

/// State shared by the slab tasks of one bake.
struct SlabBake {
  setup: BakeSetup,
  /// One Z layer per slot, each set once by its task.
  slabs: Vec<OnceLock<Vec<f32>>>,
  join: JoinCounter,
  on_complete: Mutex<Option<BakeCallback>>,
  generate_start: Instant,
}

impl SlabBake {
  #[tracing::instrument(skip_all, name = "mesh_sdf::bake_slab", fields(z = z))]
  fn run_slab(&self, z: u32) {
    let layout = &self.setup.layout;
    let slab = z..z + 1;
    let mut values = vec![0.0; layout.slab_len(&slab)];
    self.setup.generator.generate(&self.setup.triangles, &mut values, layout, slab);

    if self.slabs[z as usize].set(values).is_err() {
      tracing::warn!(z, "slab generated twice");
    }

    if self.join.post() {
      self.complete();
    }
  }

  /// Runs once, after every slab is set.
  fn complete(&self) {
    let mut stats = self.setup.stats;
    stats.generate_us = self.generate_start.elapsed().as_micros() as u64;

    let mut values = Vec::with_capacity(self.setup.layout.volume());
    for slab in &self.slabs {
      if let Some(slab) = slab.get() {
        values.extend_from_slice(slab);
      }
    }
    debug_assert_eq!(values.len(), self.setup.layout.volume());

    let baked = self.setup.finish(values, stats);
    let on_complete = self
      .on_complete
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if let Some(on_complete) = on_complete {
      on_complete(Ok(baked));
    }
  }
}

#[cfg(test)]
#[path = "bake_test.rs"]
mod bake_test;
