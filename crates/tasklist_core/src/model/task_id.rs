//! Task id generation.
//!
//! # Responsibility
//! - Abstract the millisecond tick source used for ids and timestamps.
//! - Issue ids that stay unique within a session even when the clock stalls
//!   or moves backwards.
//!
//! # Invariants
//! - Issued ids are strictly increasing until `i64::MAX`; past that ceiling
//!   they strictly decrease below every known id.
//! - An allocator seeded from a collection never re-issues an existing id.

use crate::model::task::{Task, TaskId};
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond tick source.
pub trait Clock {
    /// Current time as Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        // A clock set before 1970 reads as 0; the allocator tie-breaker still
        // keeps ids unique.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Issues `max(now_ms, last_issued + 1)`.
///
/// Once `last_issued` reaches `i64::MAX`, ids are handed out downwards from
/// the lowest id known to the allocator instead.
#[derive(Debug, Clone, Default)]
pub struct TaskIdAllocator {
    last_issued: Option<TaskId>,
    lowest_known: Option<TaskId>,
}

impl TaskIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator that will never collide with `tasks`.
    pub fn seeded_from(tasks: &[Task]) -> Self {
        Self {
            last_issued: tasks.iter().map(|task| task.id).max(),
            lowest_known: tasks.iter().map(|task| task.id).min(),
        }
    }

    /// Returns the next id for a clock reading of `now_ms`.
    ///
    /// Returns `None` only when the whole `i64` range above and below the
    /// known ids is used up.
    pub fn next_id(&mut self, now_ms: i64) -> Option<TaskId> {
        let id = match self.last_issued {
            Some(last) if now_ms <= last => match last.checked_add(1) {
                Some(id) => id,
                None => return self.next_id_below(),
            },
            _ => now_ms,
        };
        self.last_issued = Some(id);
        self.lowest_known = Some(self.lowest_known.map_or(id, |lowest| lowest.min(id)));
        Some(id)
    }

    /// Last id handed out or observed at seeding time.
    pub fn last_issued(&self) -> Option<TaskId> {
        self.last_issued
    }

    fn next_id_below(&mut self) -> Option<TaskId> {
        let id = self.lowest_known?.checked_sub(1)?;
        self.lowest_known = Some(id);
        Some(id)
    }
}
