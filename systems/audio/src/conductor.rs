//! Maps per-step activity onto the shared low-pass cutoff.
//!
//! Busy steps close the filter and quiet steps open it again, so dense
//! activity sounds muffled while sparse activity stays bright.

use crate::effects::Glide;

/// Raw pulse count at which the filter reaches its lowest cutoff.
pub const MAX_EVENTS_FOR_FULL_CHAOS: u32 = 20;
/// Cutoff under full chaos, in Hz.
pub const MIN_CUTOFF_HZ: f32 = 800.0;
/// Cutoff for a step without pulses, in Hz.
pub const MAX_CUTOFF_HZ: f32 = 16_000.0;
/// Cutoff before the first step is conducted, in Hz.
pub const OPEN_CUTOFF_HZ: f32 = 18_000.0;
/// Time constant of the cutoff and master gain glides, in seconds.
pub const GLIDE_SECONDS: f32 = 0.1;

/// Activity of a step in `[0, 1]`.
#[must_use]
pub fn chaos_ratio(total_pulses: u32) -> f32 {
    (total_pulses as f32 / MAX_EVENTS_FOR_FULL_CHAOS as f32).min(1.0)
}

/// Cutoff the filter glides towards after a step with `total_pulses` raw pulses.
#[must_use]
pub fn target_cutoff(total_pulses: u32) -> f32 {
    MAX_CUTOFF_HZ - chaos_ratio(total_pulses) * (MAX_CUTOFF_HZ - MIN_CUTOFF_HZ)
}

/// Owner of the live filter cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Conductor {
    cutoff: Glide,
}

impl Conductor {
    /// Creates a conductor with the filter fully open.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cutoff: Glide::new(OPEN_CUTOFF_HZ, GLIDE_SECONDS),
        }
    }

    /// Retargets the filter for the activity of the latest step.
    pub fn observe(&mut self, total_pulses: u32) {
        self.cutoff.set_target(target_cutoff(total_pulses));
    }

    /// Advances the glide by `seconds` and returns the live cutoff.
    pub fn advance(&mut self, seconds: f32) -> f32 {
        self.cutoff.advance(seconds)
    }

    /// Live cutoff in Hz.
    #[must_use]
    pub const fn cutoff(&self) -> f32 {
        self.cutoff.value()
    }

    /// Cutoff the filter is approaching, in Hz.
    #[must_use]
    pub const fn target(&self) -> f32 {
        self.cutoff.target()
    }
}

impl Default for Conductor {
    fn default() -> Self {
        Self::new()
    }
}
