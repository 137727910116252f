//! Task submission seam for background bakes.
//!
//! The baker never runs its own threads. It hands boxed tasks to a
//! [`TaskScheduler`] and never blocks on them:
//! - [`RayonScheduler`]: `rayon::spawn` onto the global pool (native, and
//!   wasm32 with wasm-bindgen-rayon)
//! - [`InlineScheduler`]: runs the task on the calling thread
//!
//! # Usage
//!
//! ```ignore
//! let scheduler = RayonScheduler;
//! bake_async(&scheduler, vertices, indices, config, |result| {
//!     // Runs on whichever worker finished last
//! });
//! ```

use std::sync::Arc;

/// A unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Anything that can run tasks, now or later, on any thread.
///
/// Tasks may submit further tasks.
pub trait TaskScheduler: Send + Sync + 'static {
  fn submit(&self, task: Task);
}

impl<S: TaskScheduler + ?Sized> TaskScheduler for Arc<S> {
  fn submit(&self, task: Task) {
    (**self).submit(task);
  }
}

/// Fire-and-forget scheduling on rayon's global thread pool.
///
/// Use `rayon::ThreadPoolBuilder` before the first bake to configure the
/// pool size.
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonScheduler;

impl RayonScheduler {
  /// Number of worker threads in rayon's pool.
  pub fn num_threads(&self) -> usize {
    rayon::current_num_threads()
  }
}

impl TaskScheduler for RayonScheduler {
  fn submit(&self, task: Task) {
    rayon::spawn(task);
  }
}

/// Runs every task immediately on the submitting thread.
///
/// For single-threaded targets. Nested submissions run depth-first.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineScheduler;

impl TaskScheduler for InlineScheduler {
  fn submit(&self, task: Task) {
    task();
  }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use crossbeam_channel as channel;

  use super::*;

  #[test]
  fn test_inline_runs_immediately() {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    InlineScheduler.submit(Box::new(move || {
      c.fetch_add(1, Ordering::Relaxed);
    }));
    assert_eq!(count.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn test_inline_nested_submission() {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    InlineScheduler.submit(Box::new(move || {
      for _ in 0..3 {
        let c = Arc::clone(&c);
        InlineScheduler.submit(Box::new(move || {
          c.fetch_add(1, Ordering::Relaxed);
        }));
      }
    }));
    assert_eq!(count.load(Ordering::Relaxed), 3);
  }

  #[test]
  fn test_rayon_runs_all_tasks() {
    let scheduler = Arc::new(RayonScheduler);
    let (sender, receiver) = channel::unbounded();

    for i in 0..10 {
      let sender = sender.clone();
      scheduler.submit(Box::new(move || {
        let _ = sender.send(i * 2);
      }));
    }
    drop(sender);

    let mut results: Vec<i32> = receiver.iter().collect();
    results.sort_unstable();
    assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
  }

  #[test]
  fn test_num_threads() {
    assert!(RayonScheduler.num_threads() >= 1);
  }
}
