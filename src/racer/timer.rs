//! Racer-local elapsed time display.

use std::time::SystemTime;

use crate::dto::format_hms;

/// Tick-driven elapsed display anchored to the locally observed start.
///
/// The display recomputes from the start instant on every read, so a missed
/// tick never loses time. Freezing pins the value (submission recorded or
/// stop observed) while the surrounding loop keeps polling; the first freeze
/// wins, so a stop arriving after a submission does not move the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElapsedTimer {
    started_at: Option<SystemTime>,
    frozen_seconds: Option<u64>,
}

impl ElapsedTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer at the locally observed start instant.
    pub fn start(&mut self, at: SystemTime) {
        self.started_at = Some(at);
        self.frozen_seconds = None;
    }

    /// Whether the timer is armed and still counting.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.frozen_seconds.is_none()
    }

    /// Pin the display at `now`. No-op when unarmed or already frozen.
    pub fn freeze(&mut self, now: SystemTime) {
        if let Some(started) = self.started_at {
            self.frozen_seconds
                .get_or_insert_with(|| elapsed_whole_seconds(started, now));
        }
    }

    /// Clear all state, back to idle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Elapsed whole seconds as of `now`, or the pinned value once frozen.
    pub fn elapsed_seconds(&self, now: SystemTime) -> u64 {
        if let Some(frozen) = self.frozen_seconds {
            return frozen;
        }
        self.started_at
            .map(|started| elapsed_whole_seconds(started, now))
            .unwrap_or(0)
    }

    /// HH:MM:SS rendering of [`ElapsedTimer::elapsed_seconds`].
    pub fn display(&self, now: SystemTime) -> String {
        format_hms(self.elapsed_seconds(now))
    }
}

fn elapsed_whole_seconds(started: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(started).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn instant(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn idle_timer_reads_zero() {
        let timer = ElapsedTimer::new();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed_seconds(instant(500)), 0);
        assert_eq!(timer.display(instant(500)), "00:00:00");
    }

    #[test]
    fn running_timer_tracks_the_reading_instant() {
        let mut timer = ElapsedTimer::new();
        timer.start(instant(100));
        assert!(timer.is_running());
        assert_eq!(timer.elapsed_seconds(instant(100)), 0);
        assert_eq!(timer.elapsed_seconds(instant(165)), 65);
        assert_eq!(timer.display(instant(165)), "00:01:05");
    }

    #[test]
    fn freeze_pins_the_value() {
        let mut timer = ElapsedTimer::new();
        timer.start(instant(100));
        timer.freeze(instant(220));
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed_seconds(instant(500)), 120);
    }

    #[test]
    fn first_freeze_wins() {
        let mut timer = ElapsedTimer::new();
        timer.start(instant(100));
        timer.freeze(instant(220));
        timer.freeze(instant(400));
        assert_eq!(timer.elapsed_seconds(instant(500)), 120);
    }

    #[test]
    fn freeze_before_start_is_a_noop() {
        let mut timer = ElapsedTimer::new();
        timer.freeze(instant(220));
        assert_eq!(timer.elapsed_seconds(instant(500)), 0);

        timer.start(instant(300));
        assert!(timer.is_running());
        assert_eq!(timer.elapsed_seconds(instant(350)), 50);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut timer = ElapsedTimer::new();
        timer.start(instant(100));
        timer.freeze(instant(200));
        timer.reset();
        assert_eq!(timer, ElapsedTimer::new());
    }
}
