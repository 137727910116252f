//! Countdown that turns N task completions into one finalization.

use std::sync::atomic::{AtomicU32, Ordering};

/// Atomic countdown shared by a group of tasks.
///
/// Each task calls [`post`](Self::post) once when it is done. Exactly one
/// call, the last, returns `true`, and that caller sees every write the other
/// tasks made before posting.
#[derive(Debug)]
pub struct JoinCounter {
  remaining: AtomicU32,
}

impl JoinCounter {
  pub fn new(count: u32) -> Self {
    Self {
      remaining: AtomicU32::new(count),
    }
  }

  /// Record one completion. Returns `true` for the last one.
  pub fn post(&self) -> bool {
    let previous = self.remaining.fetch_sub(1, Ordering::AcqRel);
    debug_assert!(previous > 0, "join counter posted more times than its count");
    previous == 1
  }

  /// Completions still expected.
  pub fn remaining(&self) -> u32 {
    self.remaining.load(Ordering::Acquire)
  }
}

#[cfg(test)]
#[path = "join_test.rs"]
mod join_test;
