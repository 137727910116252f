//! Mesh fixtures for tests.
//!
//! Every fixture is closed and wound clockwise when seen from outside, so the
//! triangle normal points out of the solid.

use std::sync::{Arc, Mutex};

use glam::Vec3;

use crate::threading::{Task, TaskScheduler};

/// Raw mesh arrays.
#[derive(Clone, Debug, Default)]
pub struct MeshArrays {
  pub vertices: Vec<Vec3>,
  pub indices: Vec<u32>,
}

impl MeshArrays {
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Append another mesh, rebasing its indices.
  pub fn merge(mut self, other: MeshArrays) -> Self {
    let base = self.vertices.len() as u32;
    self.vertices.extend(other.vertices);
    self.indices.extend(other.indices.into_iter().map(|i| i + base));
    self
  }

  /// Flip triangles whose normal points toward `center`.
  ///
  /// Only meaningful for meshes that are star-shaped around `center`.
  pub fn orient_outward(mut self, center: Vec3) -> Self {
    for tri in self.indices.chunks_exact_mut(3) {
      let v1 = self.vertices[tri[0] as usize];
      let v2 = self.vertices[tri[1] as usize];
      let v3 = self.vertices[tri[2] as usize];
      let nor = (v2 - v1).cross(v1 - v3);
      let centroid = (v1 + v2 + v3) / 3.0;
      if nor.dot(centroid - center) < 0.0 {
        tri.swap(1, 2);
      }
    }
    self
  }
}

/// Axis-aligned box with 8 vertices and 12 triangles.
///
/// Vertex `i` sits at `min + size * (i & 1, (i >> 1) & 1, (i >> 2) & 1)`.
pub fn cube(min: Vec3, size: Vec3) -> MeshArrays {
  let vertices = (0..8u32)
    .map(|i| {
      let corner = Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32);
      min + size * corner
    })
    .collect();

  #[rustfmt::skip]
  let indices = vec![
    0, 6, 4,  0, 2, 6, // -X
    1, 7, 3,  1, 5, 7, // +X
    0, 5, 1,  0, 4, 5, // -Y
    2, 7, 6,  2, 3, 7, // +Y
    0, 3, 2,  0, 1, 3, // -Z
    4, 7, 5,  4, 6, 7, // +Z
  ];

  MeshArrays { vertices, indices }
}

/// The unit cube spanning `[0, 1]³`.
pub fn unit_cube() -> MeshArrays {
  cube(Vec3::ZERO, Vec3::ONE)
}

/// Regular octahedron (6 vertices, 8 triangles).
pub fn octahedron(center: Vec3, radius: f32) -> MeshArrays {
  let vertices = vec![
    center + Vec3::X * radius,
    center - Vec3::X * radius,
    center + Vec3::Y * radius,
    center - Vec3::Y * radius,
    center + Vec3::Z * radius,
    center - Vec3::Z * radius,
  ];
  #[rustfmt::skip]
  let indices = vec![
    0, 2, 4,  2, 1, 4,  1, 3, 4,  3, 0, 4,
    2, 0, 5,  1, 2, 5,  3, 1, 5,  0, 3, 5,
  ];
  MeshArrays { vertices, indices }.orient_outward(center)
}

/// Latitude/longitude sphere.
pub fn uv_sphere(center: Vec3, radius: f32, rings: u32, segments: u32) -> MeshArrays {
  assert!(rings >= 2 && segments >= 3);

  let mut vertices = vec![center + Vec3::Y * radius];
  for ring in 1..rings {
    let theta = std::f32::consts::PI * ring as f32 / rings as f32;
    for segment in 0..segments {
      let phi = std::f32::consts::TAU * segment as f32 / segments as f32;
      let dir = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
      vertices.push(center + dir * radius);
    }
  }
  let bottom = vertices.len() as u32;
  vertices.push(center - Vec3::Y * radius);

  let ring_start = |ring: u32| 1 + (ring - 1) * segments;
  let mut indices = Vec::new();

  for s in 0..segments {
    let next = (s + 1) % segments;
    indices.extend([0, ring_start(1) + s, ring_start(1) + next]);
  }
  for ring in 1..rings - 1 {
    let a = ring_start(ring);
    let b = ring_start(ring + 1);
    for s in 0..segments {
      let next = (s + 1) % segments;
      indices.extend([a + s, b + s, b + next]);
      indices.extend([a + s, b + next, a + next]);
    }
  }
  let last = ring_start(rings - 1);
  for s in 0..segments {
    let next = (s + 1) % segments;
    indices.extend([bottom, last + next, last + s]);
  }

  MeshArrays { vertices, indices }.orient_outward(center)
}

/// Two disjoint cubes with a gap between them, leaving empty chunks inside
/// the partition grid.
pub fn two_cubes() -> MeshArrays {
  cube(Vec3::ZERO, Vec3::ONE).merge(cube(Vec3::new(2.0, 0.25, 0.0), Vec3::splat(0.75)))
}

/// Scheduler that queues tasks and runs them when the test says so.
///
/// Counts submissions so tests can check how work was split.
#[derive(Clone, Default)]
pub struct CountingScheduler {
  queue: Arc<Mutex<Vec<Task>>>,
  submitted: Arc<Mutex<usize>>,
}

impl CountingScheduler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn submitted(&self) -> usize {
    *self.submitted.lock().unwrap()
  }

  pub fn queued(&self) -> usize {
    self.queue.lock().unwrap().len()
  }

  /// Run one queued task, newest first. Returns false when the queue is empty.
  pub fn run_one(&self) -> bool {
    let task = self.queue.lock().unwrap().pop();
    match task {
      Some(task) => {
        task();
        true
      }
      None => false,
    }
  }

  /// Run queued tasks (including ones they submit) until none remain.
  pub fn run_all(&self) -> usize {
    let mut count = 0;
    while self.run_one() {
      count += 1;
    }
    count
  }
}

impl TaskScheduler for CountingScheduler {
  fn submit(&self, task: Task) {
    *self.submitted.lock().unwrap() += 1;
    self.queue.lock().unwrap().push(task);
  }
}
