//! Seedable pseudo-random stream used by every engine.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SETUP_STREAM_INCREMENT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Deterministic generator producing uniform values in `[0, 1)`.
///
/// A simulation owns exactly one generator; it is rebuilt on every setup so a
/// run is reproducible from its base seed and setup counter.
#[derive(Clone, Debug)]
pub struct Generator {
    rng: ChaCha8Rng,
}

impl Generator {
    /// Creates a generator from a raw seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Derives the stream for the `generation`-th setup of a run.
    #[must_use]
    pub fn for_setup(base_seed: u64, generation: u64) -> Self {
        Self::from_seed(mix_seed(base_seed, generation))
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform integer in `[0, bound)`; returns 0 for an empty range.
    pub fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        let scaled = (self.next_unit() * f64::from(bound)).floor() as u32;
        scaled.min(bound - 1)
    }

    /// Returns `true` with probability `probability`.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }

    /// Uniform value in `[-1, 1)`.
    pub fn signed_unit(&mut self) -> f64 {
        self.next_unit() * 2.0 - 1.0
    }
}

fn mix_seed(base_seed: u64, generation: u64) -> u64 {
    let mut z = base_seed.wrapping_add(generation.wrapping_mul(SETUP_STREAM_INCREMENT));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
