//! Wall-clock abstraction

use chrono::{Local, NaiveDateTime, SubsecRound, TimeDelta};
use std::fmt::Debug;
use std::sync::Mutex;

/// Source of the current local time, truncated to whole seconds
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the system's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(0)
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start.trunc_subsecs(0)),
        }
    }

    /// Move the clock to `at`
    pub fn set(&self, at: NaiveDateTime) {
        *self.lock() = at.trunc_subsecs(0);
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.lock();
        *now = (*now + delta).trunc_subsecs(0);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        // A poisoned guard still holds a valid timestamp.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}
