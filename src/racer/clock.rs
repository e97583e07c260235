//! Clock injection for racer-side timekeeping.
//!
//! Every instant a racer stamps (its observed race start, its submission
//! time) comes from its own clock. Tests and tools inject [`ManualClock`]
//! to make those instants deterministic; production code uses
//! [`SystemClock`].

use std::{
    sync::Mutex,
    time::{Duration, SystemTime},
};

/// Source of the local wall-clock instants an agent stamps records with.
pub trait Clock: Send + Sync {
    /// Current instant according to this clock.
    fn now(&self) -> SystemTime;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Settable clock for tests and tools.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<SystemTime>,
}

impl ManualClock {
    /// Create a clock initialized at `instant`.
    pub fn starting_at(instant: SystemTime) -> Self {
        Self {
            current: Mutex::new(instant),
        }
    }

    /// Advance the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut current = self.lock();
        *current += delta;
    }

    /// Jump the clock to `instant`.
    pub fn set(&self, instant: SystemTime) {
        *self.lock() = instant;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SystemTime> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(SystemTime::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.lock()
    }
}
