#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded top-K selection of the pulses produced by a simulation step.
//!
//! Engines stream every transition into a [`TopK`] through the
//! [`PulseSink`] trait. The selector keeps at most `capacity` pulses in a
//! buffer allocated once, so a full field scan never allocates per cell.

use std::cmp::Ordering;

use convoy_core::{Pulse, PulseKind, PulseSink, StepSummary};

#[derive(Clone, Copy, Debug)]
struct Ranked {
    pulse: Pulse,
    sequence: u32,
}

impl Ranked {
    /// Orders retained pulses by descending weight, then by emission order.
    fn forwarding_order(&self, other: &Self) -> Ordering {
        other
            .pulse
            .weight()
            .total_cmp(&self.pulse.weight())
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Fixed-capacity selector retaining the heaviest pulses of a step.
///
/// A new pulse enters when fewer than `capacity` pulses are retained, or when
/// its weight strictly exceeds the lightest retained pulse. Equal weights
/// therefore keep the pulse that was emitted first.
#[derive(Clone, Debug)]
pub struct TopK {
    capacity: usize,
    retained: Vec<Ranked>,
    lightest: usize,
    sequence: u32,
    births: u32,
}

impl TopK {
    /// Creates an empty selector retaining at most `capacity` pulses.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            retained: Vec::with_capacity(capacity),
            lightest: 0,
            sequence: 0,
            births: 0,
        }
    }

    /// Maximum number of retained pulses.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of raw pulses offered since the last reset.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.sequence
    }

    /// Number of raw birth pulses offered since the last reset.
    #[must_use]
    pub const fn births(&self) -> u32 {
        self.births
    }

    /// Number of pulses currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    /// Reports whether no pulse is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Weight of the lightest retained pulse, if any.
    #[must_use]
    pub fn min_weight(&self) -> Option<f32> {
        self.retained
            .get(self.lightest)
            .map(|ranked| ranked.pulse.weight())
    }

    /// Clears all retained pulses and counters, adopting a new capacity.
    pub fn reset(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.retained.clear();
        if self.retained.capacity() < capacity {
            self.retained.reserve(capacity);
        }
        self.lightest = 0;
        self.sequence = 0;
        self.births = 0;
    }

    /// Offers a pulse to the selector.
    pub fn offer(&mut self, pulse: Pulse) {
        let sequence = self.sequence;
        self.sequence = self.sequence.saturating_add(1);
        if pulse.kind() == PulseKind::Birth {
            self.births = self.births.saturating_add(1);
        }

        if self.capacity == 0 {
            return;
        }

        let ranked = Ranked { pulse, sequence };
        if self.retained.len() < self.capacity {
            self.retained.push(ranked);
            if self.retained.len() == 1 || self.is_lighter(self.retained.len() - 1, self.lightest)
            {
                self.lightest = self.retained.len() - 1;
            }
            return;
        }

        if pulse.weight() > self.retained[self.lightest].pulse.weight() {
            self.retained[self.lightest] = ranked;
            self.lightest = self.find_lightest();
        }
    }

    /// Retained pulses sorted for forwarding, without clearing the selector.
    #[must_use]
    pub fn selected(&self) -> Vec<Pulse> {
        let mut ordered = self.retained.clone();
        ordered.sort_by(Ranked::forwarding_order);
        ordered.into_iter().map(|ranked| ranked.pulse).collect()
    }

    /// Produces the step summary and resets the selector for the next step.
    pub fn finish(&mut self, tick: u64) -> StepSummary {
        let summary = StepSummary {
            tick,
            total_pulses: self.sequence,
            births: self.births,
            selected: self.selected(),
        };
        self.reset(self.capacity);
        summary
    }

    // The lightest pulse is the one evicted first; among equal weights the
    // most recently emitted one goes first.
    fn is_lighter(&self, candidate: usize, current: usize) -> bool {
        let candidate = &self.retained[candidate];
        let current = &self.retained[current];
        match candidate.pulse.weight().total_cmp(&current.pulse.weight()) {
            Ordering::Less => true,
            Ordering::Equal => candidate.sequence > current.sequence,
            Ordering::Greater => false,
        }
    }

    fn find_lightest(&self) -> usize {
        let mut lightest = 0;
        for index in 1..self.retained.len() {
            if self.is_lighter(index, lightest) {
                lightest = index;
            }
        }
        lightest
    }
}

impl PulseSink for TopK {
    fn record(&mut self, pulse: Pulse) {
        self.offer(pulse);
    }
}

#[cfg(test)]
mod tests {
    use super::TopK;
    use convoy_core::{Pulse, PulseKind};

    fn pulse(weight: f32) -> Pulse {
        Pulse::new(0.5, 0.5, PulseKind::Death, weight)
    }

    #[test]
    fn running_minimum_follows_replacements() {
        let mut selector = TopK::new(2);
        selector.offer(pulse(3.0));
        selector.offer(pulse(1.0));
        assert_eq!(selector.min_weight(), Some(1.0));

        selector.offer(pulse(2.0));
        assert_eq!(selector.min_weight(), Some(2.0));

        selector.offer(pulse(5.0));
        assert_eq!(selector.min_weight(), Some(3.0));
    }

    #[test]
    fn zero_capacity_still_counts() {
        let mut selector = TopK::new(0);
        selector.offer(pulse(1.0));
        assert!(selector.is_empty());
        assert_eq!(selector.total(), 1);
    }
}
