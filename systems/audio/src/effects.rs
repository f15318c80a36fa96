//! Shared effect nodes applied to the summed voice output.

use std::f32::consts::PI;

use convoy_core::Generator;

use crate::Frame;

/// Parameter that approaches its target exponentially.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Glide {
    value: f32,
    target: f32,
    time_constant: f32,
}

impl Glide {
    /// Creates a glide resting at `value`.
    pub(crate) const fn new(value: f32, time_constant: f32) -> Self {
        Self {
            value,
            target: value,
            time_constant,
        }
    }

    /// Current value.
    pub(crate) const fn value(&self) -> f32 {
        self.value
    }

    /// Value being approached.
    pub(crate) const fn target(&self) -> f32 {
        self.target
    }

    /// Starts approaching `target` from the current value.
    pub(crate) fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Moves `seconds` along the approach curve and returns the new value.
    pub(crate) fn advance(&mut self, seconds: f32) -> f32 {
        if self.time_constant <= 0.0 {
            self.value = self.target;
        } else {
            let blend = 1.0 - (-seconds / self.time_constant).exp();
            self.value += (self.target - self.value) * blend;
        }
        self.value
    }
}

/// Feed-forward peak compressor with automatic make-up gain.
#[derive(Clone, Debug)]
pub(crate) struct Compressor {
    threshold_db: f32,
    ratio: f32,
    attack: f32,
    release: f32,
    makeup: f32,
    envelope: f32,
}

impl Compressor {
    const ATTACK_SECONDS: f32 = 0.003;
    const RELEASE_SECONDS: f32 = 0.25;

    pub(crate) fn new(threshold_db: f32, ratio: f32, sample_rate: f32) -> Self {
        let full_scale_db = threshold_db - threshold_db / ratio;
        Self {
            threshold_db,
            ratio,
            attack: smoothing(Self::ATTACK_SECONDS, sample_rate),
            release: smoothing(Self::RELEASE_SECONDS, sample_rate),
            makeup: db_to_gain(-full_scale_db * 0.6),
            envelope: 0.0,
        }
    }

    pub(crate) fn process(&mut self, input: Frame) -> Frame {
        let level = input.left.abs().max(input.right.abs());
        let coefficient = if level > self.envelope {
            self.attack
        } else {
            self.release
        };
        self.envelope = level + (self.envelope - level) * coefficient;

        let level_db = gain_to_db(self.envelope);
        let reduction_db = if level_db > self.threshold_db {
            (self.threshold_db - level_db) * (1.0 - 1.0 / self.ratio)
        } else {
            0.0
        };
        input * (db_to_gain(reduction_db) * self.makeup)
    }
}

/// Stereo second-order low-pass filter.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LowPass {
    sample_rate: f32,
    coefficients: [f32; 5],
    state: [[f32; 4]; 2],
}

impl LowPass {
    const Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

    pub(crate) fn new(cutoff: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            coefficients: [1.0, 0.0, 0.0, 0.0, 0.0],
            state: [[0.0; 4]; 2],
        };
        filter.set_cutoff(cutoff);
        filter
    }

    pub(crate) fn set_cutoff(&mut self, cutoff: f32) {
        let nyquist = self.sample_rate * 0.5;
        let cutoff = cutoff.clamp(10.0, nyquist * 0.99);
        let omega = 2.0 * PI * cutoff / self.sample_rate;
        let alpha = omega.sin() / (2.0 * Self::Q);
        let cos = omega.cos();
        let a0 = 1.0 + alpha;
        let b1 = (1.0 - cos) / a0;
        self.coefficients = [b1 * 0.5, b1, b1 * 0.5, -2.0 * cos / a0, (1.0 - alpha) / a0];
    }

    pub(crate) fn process(&mut self, input: Frame) -> Frame {
        Frame::new(
            self.channel(0, input.left),
            self.channel(1, input.right),
        )
    }

    /// Filters a mono signal through the left channel state.
    pub(crate) fn process_mono(&mut self, x: f32) -> f32 {
        self.channel(0, x)
    }

    fn channel(&mut self, index: usize, x: f32) -> f32 {
        let [b0, b1, b2, a1, a2] = self.coefficients;
        let [x1, x2, y1, y2] = self.state[index];
        let y = b0 * x + b1 * x1 + b2 * x2 - a1 * y1 - a2 * y2;
        self.state[index] = [x, x1, y, y1];
        y
    }
}

#[derive(Clone, Copy, Debug)]
struct Tap {
    delay: usize,
    gain: f32,
}

/// Convolution reverb over a sparse, exponentially decaying stereo impulse.
#[derive(Clone, Debug)]
pub(crate) struct Reverb {
    taps: [Vec<Tap>; 2],
    history: Vec<Frame>,
    cursor: usize,
}

impl Reverb {
    const TAPS_PER_CHANNEL: usize = 96;

    pub(crate) fn new(
        seconds: f32,
        decay: f32,
        sample_rate: f32,
        rng: &mut Generator,
    ) -> Self {
        let length = ((seconds * sample_rate) as usize).max(Self::TAPS_PER_CHANNEL);
        let mut channel = || {
            let segment = length / Self::TAPS_PER_CHANNEL;
            let mut taps: Vec<Tap> = (0..Self::TAPS_PER_CHANNEL)
                .map(|index| {
                    let jitter = (rng.next_unit() * segment as f64) as usize;
                    let delay = (index * segment + jitter).min(length - 1);
                    let t = delay as f32 / length as f32;
                    let sign = if rng.chance(0.5) { 1.0 } else { -1.0 };
                    Tap {
                        delay,
                        gain: sign * (1.0 - t).powf(decay),
                    }
                })
                .collect();
            let energy: f32 = taps.iter().map(|tap| tap.gain * tap.gain).sum();
            let scale = if energy > 0.0 { energy.sqrt().recip() } else { 0.0 };
            for tap in &mut taps {
                tap.gain *= scale;
            }
            taps
        };
        let left = channel();
        let right = channel();
        Self {
            taps: [left, right],
            history: vec![Frame::ZERO; length],
            cursor: 0,
        }
    }

    pub(crate) fn process(&mut self, input: Frame) -> Frame {
        let length = self.history.len();
        self.history[self.cursor] = input;
        let read = |delay: usize| (self.cursor + length - delay) % length;

        let left: f32 = self.taps[0]
            .iter()
            .map(|tap| self.history[read(tap.delay)].left * tap.gain)
            .sum();
        let right: f32 = self.taps[1]
            .iter()
            .map(|tap| self.history[read(tap.delay)].right * tap.gain)
            .sum();
        self.cursor = (self.cursor + 1) % length;
        Frame::new(left, right)
    }
}

fn smoothing(seconds: f32, sample_rate: f32) -> f32 {
    (-1.0 / (seconds * sample_rate)).exp()
}

fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(1e-6).log10()
}

fn db_to_gain(db: f32) -> f32 {
    10_f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::{Compressor, Glide, LowPass, Reverb};
    use crate::Frame;
    use convoy_core::Generator;

    #[test]
    fn glide_approaches_without_jumping() {
        let mut glide = Glide::new(18_000.0, 0.1);
        glide.set_target(800.0);
        let first = glide.advance(0.05);
        assert!(first < 18_000.0 && first > 800.0);
        let _ = glide.advance(2.0);
        assert!((glide.value() - 800.0).abs() < 1.0);
    }

    #[test]
    fn one_time_constant_covers_most_of_the_distance() {
        let mut glide = Glide::new(0.0, 0.1);
        glide.set_target(1.0);
        let value = glide.advance(0.1);
        assert!((value - (1.0 - (-1.0_f32).exp())).abs() < 1e-5);
    }

    #[test]
    fn compressor_reduces_loud_input_more_than_quiet_input() {
        let mut loud = Compressor::new(-40.0, 6.0, 1000.0);
        let mut quiet = Compressor::new(-40.0, 6.0, 1000.0);
        let mut loud_out = Frame::ZERO;
        let mut quiet_out = Frame::ZERO;
        for _ in 0..500 {
            loud_out = loud.process(Frame::new(0.8, 0.8));
            quiet_out = quiet.process(Frame::new(0.008, 0.008));
        }
        let loud_gain = loud_out.left / 0.8;
        let quiet_gain = quiet_out.left / 0.008;
        assert!(loud_gain < quiet_gain);
    }

    #[test]
    fn low_pass_keeps_dc_and_removes_nyquist() {
        let mut filter = LowPass::new(1_000.0, 44_100.0);
        let mut last = Frame::ZERO;
        for _ in 0..2_000 {
            last = filter.process(Frame::new(1.0, 1.0));
        }
        assert!((last.left - 1.0).abs() < 1e-3);

        let mut filter = LowPass::new(1_000.0, 44_100.0);
        let mut peak = 0.0_f32;
        for index in 0..2_000 {
            let sign = if index % 2 == 0 { 1.0 } else { -1.0 };
            let out = filter.process(Frame::new(sign, sign));
            if index > 200 {
                peak = peak.max(out.left.abs());
            }
        }
        assert!(peak < 0.01);
    }

    #[test]
    fn reverb_impulse_is_delayed_and_bounded() {
        let mut rng = Generator::from_seed(1);
        let mut reverb = Reverb::new(0.5, 2.0, 1_000.0, &mut rng);
        let mut energy = 0.0;
        let first = reverb.process(Frame::new(1.0, 1.0));
        energy += first.left * first.left;
        for _ in 0..600 {
            let out = reverb.process(Frame::ZERO);
            energy += out.left * out.left;
        }
        assert!((energy - 1.0).abs() < 1e-3);
    }
}
