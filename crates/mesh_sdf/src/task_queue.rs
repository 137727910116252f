//! Bake queue for hosts that poll once per frame.
//!
//! Following the stage pattern: Enqueue → (background work) → Poll
//!
//! Each request runs through [`bake_async`]; completion callbacks push into a
//! channel that [`BakeQueue::poll`] drains without blocking.

use crossbeam_channel::{self as channel, Receiver, Sender};
use glam::Vec3;
use web_time::Instant;

use crate::bake::{bake_async, BakedSdf};
use crate::config::BakeConfig;
use crate::error::MeshSdfResult;
use crate::threading::{RayonScheduler, TaskScheduler};

/// Finished bake.
#[derive(Debug)]
pub struct BakeCompletion {
  /// Request ID this completion corresponds to
  pub id: u64,
  /// Baked grid, or why the mesh was rejected
  pub result: MeshSdfResult<BakedSdf>,
  /// Time from enqueue to completion in microseconds
  pub bake_time_us: u64,
}

/// Runs bakes in the background and hands back completions on poll.
pub struct BakeQueue<S: TaskScheduler + Clone = RayonScheduler> {
  scheduler: S,
  sender: Sender<BakeCompletion>,
  receiver: Receiver<BakeCompletion>,
  /// Next request ID
  next_id: u64,
  /// Requests enqueued but not yet polled
  in_flight: usize,
}

impl Default for BakeQueue<RayonScheduler> {
  fn default() -> Self {
    Self::new(RayonScheduler)
  }
}

impl<S: TaskScheduler + Clone> BakeQueue<S> {
  pub fn new(scheduler: S) -> Self {
    let (sender, receiver) = channel::unbounded();
    Self {
      scheduler,
      sender,
      receiver,
      next_id: 0,
      in_flight: 0,
    }
  }

  /// Start baking a mesh, returning the assigned ID.
  pub fn enqueue(&mut self, vertices: Vec<Vec3>, indices: Vec<u32>, config: BakeConfig) -> u64 {
    let id = self.next_id;
    self.next_id += 1;
    self.in_flight += 1;

    let sender = self.sender.clone();
    let start = Instant::now();
    bake_async(&self.scheduler, vertices, indices, config, move |result| {
      let completion = BakeCompletion {
        id,
        result,
        bake_time_us: start.elapsed().as_micros() as u64,
      };
      // Receiver lives as long as the queue; a dropped queue discards results.
      let _ = sender.send(completion);
    });

    id
  }

  /// Take every completion that arrived since the last poll (non-blocking).
  pub fn poll(&mut self) -> Vec<BakeCompletion> {
    let completions: Vec<BakeCompletion> = self.receiver.try_iter().collect();
    self.in_flight -= completions.len();
    completions
  }

  /// Requests whose completion has not been polled yet.
  pub fn in_flight_count(&self) -> usize {
    self.in_flight
  }

  /// True when every request has been polled.
  pub fn is_idle(&self) -> bool {
    self.in_flight == 0
  }
}

#[cfg(test)]
#[path = "task_queue_test.rs"]
mod task_queue_test;
