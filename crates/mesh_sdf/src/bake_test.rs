use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel as channel;
use glam::{IVec3, UVec3};

use super::*;
use crate::config::{BakeMode, Resolution};
use crate::test_utils::{cube, unit_cube, uv_sphere, CountingScheduler, MeshArrays};
use crate::threading::{InlineScheduler, RayonScheduler};
use crate::validate::check_sdf;

fn cube_config(mode: BakeMode) -> BakeConfig {
  BakeConfig::default()
    .with_margin_ratio(0.2)
    .with_explicit_resolution(UVec3::splat(8))
    .with_mode(mode)
}

fn bake_mesh(mesh: &MeshArrays, config: &BakeConfig) -> BakedSdf {
  bake(&mesh.vertices, &mesh.indices, config).unwrap()
}

/// Collects async results so tests can inspect them after the scheduler ran.
#[derive(Clone, Default)]
struct Completions {
  calls: Arc<AtomicUsize>,
  result: Arc<Mutex<Option<MeshSdfResult<BakedSdf>>>>,
}

impl Completions {
  fn callback(&self) -> impl FnOnce(MeshSdfResult<BakedSdf>) + Send + 'static {
    let calls = Arc::clone(&self.calls);
    let result = Arc::clone(&self.result);
    move |r| {
      calls.fetch_add(1, Ordering::SeqCst);
      *result.lock().unwrap() = Some(r);
    }
  }

  fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  fn take(&self) -> MeshSdfResult<BakedSdf> {
    self.result.lock().unwrap().take().expect("no completion")
  }
}

#[test]
fn test_cube_scenario() {
  let mesh = unit_cube();
  let baked = bake_mesh(&mesh, &cube_config(BakeMode::AccuratePartitioned { subdiv: 4 }));
  let layout = baked.layout;

  assert_eq!(layout.resolution, UVec3::splat(8));
  assert!(layout.min_pos.abs_diff_eq(Vec3::splat(-0.2), 1e-6));
  assert!(layout.max_pos.abs_diff_eq(Vec3::splat(1.2), 1e-6));

  for (i, &v) in baked.values.iter().enumerate() {
    let p = layout.grid_to_space(layout.position_of(i));
    let inside = p.cmpgt(Vec3::ZERO).all() && p.cmplt(Vec3::ONE).all();
    assert_eq!(v < 0.0, inside, "cell at {p} has {v}");
  }

  let prepared = crate::triangle::prepare_triangles(&mesh.vertices, &mesh.indices).unwrap();
  assert!(check_sdf(&baked.values, &layout, &prepared.triangles).ok);
}

#[test]
fn test_large_mesh_accurate_bakes() {
  let mesh = cube(Vec3::ZERO, Vec3::splat(10_000.0));

  for mode in [BakeMode::AccurateNaive, BakeMode::AccuratePartitioned { subdiv: 4 }] {
    let baked = bake_mesh(&mesh, &cube_config(mode));
    let layout = baked.layout;

    // Cell (4, 4, 4) sits at 5875 on every axis, 4125 from the far faces.
    let center = IVec3::splat(4);
    assert!(layout.grid_to_space(center).abs_diff_eq(Vec3::splat(5875.0), 1e-2));
    let v = baked.values[layout.index_of(center)];
    assert!((v + 4125.0).abs() < 0.5, "{mode:?}: center has {v}");

    // Cell (0, 0, 0) sits at -1125 on every axis.
    let v = baked.values[0];
    assert!((v - 1125.0 * 3.0f32.sqrt()).abs() < 0.5, "{mode:?}: corner has {v}");
  }
}

#[test]
fn test_large_mesh_async_bake_completes() {
  let mesh = cube(Vec3::ZERO, Vec3::splat(10_000.0));
  let completions = Completions::default();
  let config = cube_config(BakeMode::AccuratePartitioned { subdiv: 4 });

  bake_async(&InlineScheduler, mesh.vertices.clone(), mesh.indices.clone(), config, completions.callback());

  assert_eq!(completions.calls(), 1);
  assert_eq!(completions.take().unwrap().values, bake_mesh(&mesh, &config).values);
}

#[test]
fn test_struct_literal_config_is_clamped() {
  let mesh = unit_cube();
  let config = BakeConfig {
    resolution: Resolution::Explicit(UVec3::splat(6)),
    margin_ratio: -0.5,
    mode: BakeMode::AccuratePartitioned { subdiv: 0 },
    boundary_sign_fix: true,
  };

  let baked = bake_mesh(&mesh, &config);
  assert!(baked.layout.min_pos.abs_diff_eq(Vec3::ZERO, 1e-6));
  assert!(baked.layout.max_pos.abs_diff_eq(Vec3::ONE, 1e-6));
  assert_eq!(baked.values.len(), 6 * 6 * 6);
  assert!(baked.values.iter().all(|v| v.is_finite()));
}

#[test]
fn test_naive_and_partitioned_bakes_match() {
  let mesh = uv_sphere(Vec3::new(0.5, 0.0, -1.0), 2.0, 10, 14);
  let config = BakeConfig::default().with_cell_count(12);

  let naive = bake_mesh(&mesh, &config.with_mode(BakeMode::AccurateNaive));
  let partitioned = bake_mesh(&mesh, &config.with_mode(BakeMode::AccuratePartitioned { subdiv: 8 }));

  assert_eq!(naive.layout, partitioned.layout);
  for (a, b) in naive.values.iter().zip(&partitioned.values) {
    assert!((a - b).abs() < 1e-5, "{a} vs {b}");
  }
  assert_eq!(naive.stats.nonempty_chunk_count, 0);
  assert!(partitioned.stats.nonempty_chunk_count > 0);
  assert_eq!(partitioned.stats.triangle_count, mesh.triangle_count());
}

#[test]
fn test_approx_modes_keep_inside_negative() {
  let mesh = unit_cube();
  for mode in [BakeMode::ApproxInterp, BakeMode::ApproxFloodfill { subdiv: 4 }] {
    let config = BakeConfig::default()
      .with_margin_ratio(0.25)
      .with_explicit_resolution(UVec3::splat(16))
      .with_mode(mode);
    let baked = bake_mesh(&mesh, &config);

    for (i, &v) in baked.values.iter().enumerate() {
      let p = baked.layout.grid_to_space(baked.layout.position_of(i));
      let inside = p.cmpgt(Vec3::ZERO).all() && p.cmplt(Vec3::ONE).all();
      assert_eq!(v < 0.0, inside, "{mode:?}: cell at {p} has {v}");
    }
  }
}

#[test]
fn test_auto_resolution_from_sampling_box() {
  let mesh = crate::test_utils::cube(Vec3::ZERO, Vec3::new(2.0, 1.0, 0.5));
  let config = BakeConfig::default().with_margin_ratio(0.0).with_cell_count(8);
  let baked = bake_mesh(&mesh, &config);
  assert_eq!(baked.layout.resolution, UVec3::new(8, 4, 2));
  assert_eq!(baked.values.len(), 64);
}

#[test]
fn test_sign_fix_toggle() {
  // Zero margin puts the origin cell inside, so the fix corrupts signs.
  let config = BakeConfig::default()
    .with_margin_ratio(0.0)
    .with_explicit_resolution(UVec3::splat(8))
    .with_mode(BakeMode::AccurateNaive);

  let fixed = bake_mesh(&unit_cube(), &config);
  let unfixed = bake_mesh(&unit_cube(), &config.with_boundary_sign_fix(false));

  assert!(unfixed.values.iter().all(|&v| v < 0.0));
  assert_eq!(fixed.values.iter().filter(|&&v| v > 0.0).count(), 3);
}

#[test]
fn test_zero_resolution_bake() {
  let config = cube_config(BakeMode::AccuratePartitioned { subdiv: 4 }).with_explicit_resolution(UVec3::new(0, 8, 8));
  let baked = bake_mesh(&unit_cube(), &config);
  assert!(baked.values.is_empty());
  assert!(baked.layout.is_empty());
}

#[test]
fn test_invalid_mesh_is_rejected() {
  let mut mesh = unit_cube();
  mesh.indices.pop();
  let err = bake(&mesh.vertices, &mesh.indices, &BakeConfig::default()).unwrap_err();
  assert_eq!(err, MeshSdfError::IndexCountNotMultipleOfThree { count: 35 });
}

#[test]
fn test_copy_to() {
  let baked = bake_mesh(&unit_cube(), &cube_config(BakeMode::AccurateNaive));

  let mut dst = vec![0.0; 512];
  baked.copy_to(&mut dst).unwrap();
  assert_eq!(dst, baked.values);

  let mut small = vec![0.0; 100];
  assert_eq!(
    baked.copy_to(&mut small),
    Err(MeshSdfError::BufferSizeMismatch {
      expected: 512,
      actual: 100
    })
  );
}

#[test]
fn test_async_dispatches_one_task_per_layer() {
  let mesh = unit_cube();
  let config = cube_config(BakeMode::AccuratePartitioned { subdiv: 4 }).with_explicit_resolution(UVec3::new(8, 8, 4));
  let scheduler = CountingScheduler::new();
  let completions = Completions::default();

  bake_async(&scheduler, mesh.vertices.clone(), mesh.indices.clone(), config, completions.callback());
  assert_eq!(scheduler.submitted(), 1);

  // First pass.
  assert!(scheduler.run_one());
  assert_eq!(scheduler.submitted(), 5);
  assert_eq!(scheduler.queued(), 4);

  for _ in 0..3 {
    assert!(scheduler.run_one());
    assert_eq!(completions.calls(), 0, "completed before every slab finished");
  }
  assert!(scheduler.run_one());
  assert_eq!(completions.calls(), 1);
  assert!(!scheduler.run_one());

  let baked = completions.take().unwrap();
  let sync = bake_mesh(&mesh, &config);
  assert_eq!(baked.values, sync.values);
  assert_eq!(baked.layout, sync.layout);
}

#[test]
fn test_async_single_pass_modes() {
  let mesh = unit_cube();
  for mode in [BakeMode::ApproxInterp, BakeMode::ApproxFloodfill { subdiv: 4 }] {
    let scheduler = CountingScheduler::new();
    let completions = Completions::default();
    let config = cube_config(mode);

    bake_async(&scheduler, mesh.vertices.clone(), mesh.indices.clone(), config, completions.callback());
    assert_eq!(scheduler.run_all(), 1);
    assert_eq!(scheduler.submitted(), 1);
    assert_eq!(completions.calls(), 1);

    let baked = completions.take().unwrap();
    assert_eq!(baked.values, bake_mesh(&mesh, &config).values);
  }
}

#[test]
fn test_async_reports_errors_through_callback() {
  let scheduler = CountingScheduler::new();
  let completions = Completions::default();

  bake_async(&scheduler, vec![Vec3::ZERO; 3], vec![0; 12], BakeConfig::default(), completions.callback());
  assert_eq!(scheduler.run_all(), 1);
  assert_eq!(completions.calls(), 1);
  assert_eq!(completions.take().unwrap_err(), MeshSdfError::TooFewVertices { count: 3 });
}

#[test]
fn test_async_zero_resolution_completes_in_first_pass() {
  let mesh = unit_cube();
  let scheduler = CountingScheduler::new();
  let completions = Completions::default();
  let config = cube_config(BakeMode::AccurateNaive).with_explicit_resolution(UVec3::new(8, 8, 0));

  bake_async(&scheduler, mesh.vertices, mesh.indices, config, completions.callback());
  assert_eq!(scheduler.run_all(), 1);
  assert_eq!(completions.calls(), 1);
  assert!(completions.take().unwrap().values.is_empty());
}

#[test]
fn test_async_inline_scheduler() {
  let mesh = unit_cube();
  let completions = Completions::default();
  let config = cube_config(BakeMode::AccurateNaive);

  bake_async(&InlineScheduler, mesh.vertices.clone(), mesh.indices.clone(), config, completions.callback());
  assert_eq!(completions.calls(), 1);
  assert_eq!(completions.take().unwrap().values, bake_mesh(&mesh, &config).values);
}

#[test]
fn test_async_rayon_scheduler() {
  let mesh = uv_sphere(Vec3::ZERO, 1.0, 8, 12);
  let config = BakeConfig::default().with_cell_count(16);
  let (sender, receiver) = channel::bounded(1);

  bake_async(&RayonScheduler, mesh.vertices.clone(), mesh.indices.clone(), config, move |result| {
    let _ = sender.send(result);
  });

  let baked = receiver.recv_timeout(Duration::from_secs(30)).unwrap().unwrap();
  assert_eq!(baked.layout.resolution, UVec3::splat(16));
  assert_eq!(baked.values, bake_mesh(&mesh, &config).values);
}
