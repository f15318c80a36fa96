//! Fixed-interval update clock.

use std::time::Duration;

use convoy_core::ClockConfig;

/// Largest interval reachable through the speed controls, in milliseconds.
pub const MAX_INTERVAL_MS: u64 = 1_000;

/// Interval change applied by one speed adjustment, in milliseconds.
pub const SPEED_STEP_MS: u64 = 10;

/// Decides on which frames the active engine advances.
///
/// At most one step runs per frame: when the interval has elapsed the clock
/// fires once and discards the remainder, so a slow frame never triggers a
/// burst of catch-up steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateClock {
    interval: Duration,
    since_step: Duration,
}

impl UpdateClock {
    /// Creates a clock honouring the configured interval and its minimum.
    #[must_use]
    pub fn new(config: ClockConfig) -> Self {
        Self {
            interval: config.interval(),
            since_step: Duration::ZERO,
        }
    }

    /// Current interval between steps.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Replaces the interval, clamped to the supported range.
    pub fn set_interval_ms(&mut self, interval_ms: u64) {
        let interval_ms = interval_ms.clamp(ClockConfig::MIN_INTERVAL_MS, MAX_INTERVAL_MS);
        self.interval = Duration::from_millis(interval_ms);
    }

    /// Shortens the interval by one speed step.
    pub fn faster(&mut self) {
        self.set_interval_ms(self.interval_ms().saturating_sub(SPEED_STEP_MS));
    }

    /// Lengthens the interval by one speed step.
    pub fn slower(&mut self) {
        self.set_interval_ms(self.interval_ms().saturating_add(SPEED_STEP_MS));
    }

    /// Interval in whole milliseconds.
    #[must_use]
    pub fn interval_ms(&self) -> u64 {
        u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX)
    }

    /// Forgets time accumulated towards the next step.
    pub fn restart(&mut self) {
        self.since_step = Duration::ZERO;
    }

    /// Accumulates `elapsed` and reports whether a step is due.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        self.since_step = self.since_step.saturating_add(elapsed);
        if self.since_step >= self.interval {
            self.since_step = Duration::ZERO;
            true
        } else {
            false
        }
    }
}
