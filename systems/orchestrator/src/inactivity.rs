//! Inactivity tracking that restarts a stalled simulation.

use std::time::Duration;

/// Time without births after which the simulation is set up again.
pub const RESTART_TIMEOUT: Duration = Duration::from_secs(60);

/// Window before the timeout during which the display dims.
pub const FADE_WINDOW: Duration = Duration::from_secs(3);

/// Opacity of the dim overlay at the moment of the restart.
pub const MAX_DIM: f32 = 0.8;

/// Measures the time since the last birth or brush stroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct InactivityTracker {
    idle: Duration,
    suspended: bool,
}

impl InactivityTracker {
    /// Creates a running tracker with no idle time.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            idle: Duration::ZERO,
            suspended: false,
        }
    }

    /// Time accumulated since the last activity.
    #[must_use]
    pub const fn idle(&self) -> Duration {
        self.idle
    }

    /// Reports whether the tracker ignores elapsed time.
    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Records activity, restarting the countdown.
    pub fn record_activity(&mut self) {
        self.idle = Duration::ZERO;
    }

    /// Stops counting, as while the simulation is paused.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Restarts the countdown from zero and resumes counting.
    pub fn resume(&mut self) {
        self.suspended = false;
        self.idle = Duration::ZERO;
    }

    /// Accumulates `elapsed` and reports whether the timeout expired.
    ///
    /// The countdown restarts when it fires.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if self.suspended {
            return false;
        }
        self.idle = self.idle.saturating_add(elapsed);
        if self.idle >= RESTART_TIMEOUT {
            self.idle = Duration::ZERO;
            true
        } else {
            false
        }
    }

    /// Opacity of the black overlay for the current idle time.
    #[must_use]
    pub fn dim(&self) -> f32 {
        let fade_start = RESTART_TIMEOUT.saturating_sub(FADE_WINDOW);
        if self.suspended || self.idle <= fade_start {
            return 0.0;
        }
        let progress = (self.idle - fade_start).as_secs_f32() / FADE_WINDOW.as_secs_f32();
        progress.min(1.0) * MAX_DIM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_only_during_the_final_window() {
        let mut tracker = InactivityTracker::new();
        assert!(!tracker.advance(Duration::from_secs(57)));
        assert_eq!(tracker.dim(), 0.0);

        assert!(!tracker.advance(Duration::from_millis(1_500)));
        assert!((tracker.dim() - 0.4).abs() < 1e-4);

        assert!(tracker.advance(Duration::from_millis(1_500)));
        assert_eq!(tracker.idle(), Duration::ZERO);
        assert_eq!(tracker.dim(), 0.0);
    }

    #[test]
    fn suspended_tracker_never_fires() {
        let mut tracker = InactivityTracker::new();
        let _ = tracker.advance(Duration::from_secs(58));
        tracker.suspend();
        assert_eq!(tracker.dim(), 0.0);
        assert!(!tracker.advance(Duration::from_secs(600)));

        tracker.resume();
        assert_eq!(tracker.idle(), Duration::ZERO);
        assert!(!tracker.advance(Duration::from_secs(59)));
    }

    #[test]
    fn activity_restarts_the_countdown() {
        let mut tracker = InactivityTracker::new();
        let _ = tracker.advance(Duration::from_secs(59));
        tracker.record_activity();
        assert!(!tracker.advance(Duration::from_secs(59)));
    }
}
