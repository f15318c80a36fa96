//! Short synthesized voices triggered by selected pulses.

use std::f32::consts::{FRAC_PI_2, TAU};

use convoy_core::{Pulse, PulseKind, VoiceAlgorithm};

use crate::{effects::LowPass, Frame};

/// Pentatonic pitch set voices are quantised to, in Hz.
pub const PENTATONIC_SCALE_HZ: [f32; 6] = [261.63, 293.66, 329.63, 392.00, 440.00, 523.25];

/// Delay applied before every voice starts.
pub const LOOKAHEAD_SECONDS: f32 = 0.005;

/// Cutoff of the low-pass stage shaping percussion noise bursts.
pub(crate) const NOISE_CUTOFF_HZ: f32 = 3_000.0;

const SILENCE: f32 = 0.001;
const TRIAD_SEMITONES: [f32; 3] = [0.0, 4.0, 7.0];

/// Scale pitch for a pulse: higher rows sound higher, births one step above deaths.
#[must_use]
pub fn pitch_for(pulse: &Pulse) -> f32 {
    let len = PENTATONIC_SCALE_HZ.len();
    let band = ((1.0 - pulse.y()) * len as f32).floor().max(0.0) as usize;
    let lift = usize::from(pulse.kind() == PulseKind::Birth);
    PENTATONIC_SCALE_HZ[(band + lift) % len]
}

/// Stereo position in `[-1, 1]` derived from the pulse column.
#[must_use]
pub fn pan_for(pulse: &Pulse) -> f32 {
    pulse.x() * 2.0 - 1.0
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
    Noise,
}

impl Waveform {
    fn sample(self, phase: f32, noise: f32) -> f32 {
        match self {
            Self::Sine => (phase * TAU).sin(),
            Self::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Self::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Sawtooth => 2.0 * phase - 1.0,
            Self::Noise => noise,
        }
    }
}

/// Linear attack to `peak`, exponential decay to near silence, then a short hold.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Envelope {
    peak: f32,
    attack: f32,
    decay_end: f32,
    stop: f32,
}

impl Envelope {
    fn new(peak: f32, attack: f32, decay_end: f32) -> Self {
        Self {
            peak,
            attack,
            decay_end,
            stop: decay_end + 0.02,
        }
    }

    fn amplitude(&self, t: f32) -> f32 {
        if t < 0.0 {
            0.0
        } else if t < self.attack {
            self.peak * t / self.attack
        } else if t < self.decay_end {
            let progress = (t - self.attack) / (self.decay_end - self.attack);
            self.peak * (SILENCE / self.peak).powf(progress)
        } else {
            SILENCE
        }
    }
}

/// One sounding oscillator with its envelope and stereo placement.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Voice {
    waveform: Waveform,
    start_hz: f32,
    end_hz: f32,
    sweep: f32,
    envelope: Envelope,
    filter: Option<LowPass>,
    left: f32,
    right: f32,
    delay: u32,
    elapsed: u32,
    stop: u32,
    phase: f32,
}

impl Voice {
    fn new(
        waveform: Waveform,
        hz: f32,
        envelope: Envelope,
        pan: f32,
        detune_cents: f32,
        sample_rate: f32,
    ) -> Self {
        let hz = hz * 2_f32.powf(detune_cents / 1200.0);
        let angle = (pan.clamp(-1.0, 1.0) + 1.0) * 0.5 * FRAC_PI_2;
        Self {
            waveform,
            start_hz: hz,
            end_hz: hz,
            sweep: 0.0,
            envelope,
            filter: None,
            left: angle.cos(),
            right: angle.sin(),
            delay: (LOOKAHEAD_SECONDS * sample_rate).round() as u32,
            elapsed: 0,
            stop: (envelope.stop * sample_rate).round() as u32,
            phase: 0.0,
        }
    }

    fn sweeping(mut self, ratio: f32, duration: f32) -> Self {
        self.end_hz = self.start_hz * ratio;
        self.sweep = duration;
        self
    }

    fn filtered(mut self, cutoff: f32, sample_rate: f32) -> Self {
        self.filter = Some(LowPass::new(cutoff, sample_rate));
        self
    }

    fn frequency(&self, t: f32) -> f32 {
        if self.sweep <= 0.0 {
            return self.start_hz;
        }
        let progress = (t / self.sweep).clamp(0.0, 1.0);
        self.start_hz * (self.end_hz / self.start_hz).powf(progress)
    }

    pub(crate) fn finished(&self) -> bool {
        self.delay == 0 && self.elapsed >= self.stop
    }

    /// Renders the next frame, or `None` once the voice has stopped.
    pub(crate) fn next_frame(&mut self, sample_rate: f32, noise: &[f32]) -> Option<Frame> {
        if self.delay > 0 {
            self.delay -= 1;
            return Some(Frame::ZERO);
        }
        if self.elapsed >= self.stop {
            return None;
        }
        let t = self.elapsed as f32 / sample_rate;
        let noise = if noise.is_empty() {
            0.0
        } else {
            noise[self.elapsed as usize % noise.len()]
        };
        let mut value = self.waveform.sample(self.phase, noise);
        if let Some(filter) = self.filter.as_mut() {
            value = filter.process_mono(value);
        }
        value *= self.envelope.amplitude(t);
        self.phase = (self.phase + self.frequency(t) / sample_rate).fract();
        self.elapsed += 1;
        Some(Frame::new(value * self.left, value * self.right))
    }
}

/// Appends the voices `algorithm` uses for `pulse`.
pub(crate) fn spawn(
    algorithm: VoiceAlgorithm,
    pulse: &Pulse,
    detune_cents: f32,
    sample_rate: f32,
    voices: &mut Vec<Voice>,
) {
    let hz = pitch_for(pulse);
    let pan = pan_for(pulse);
    let voice = |waveform, hz, envelope| {
        Voice::new(waveform, hz, envelope, pan, detune_cents, sample_rate)
    };
    let birth = pulse.kind() == PulseKind::Birth;

    match algorithm {
        VoiceAlgorithm::Classic => {
            let waveform = if birth {
                Waveform::Triangle
            } else {
                Waveform::Square
            };
            voices.push(voice(waveform, hz, Envelope::new(0.4, 0.02, 0.4)));
        }
        VoiceAlgorithm::Percussion if birth => {
            voices.push(
                voice(Waveform::Sine, hz * 1.5, Envelope::new(0.8, 0.01, 0.2))
                    .sweeping(1.0 / 3.0, 0.2),
            );
        }
        VoiceAlgorithm::Percussion => {
            voices.push(
                voice(Waveform::Noise, hz, Envelope::new(0.2, 0.01, 0.1))
                    .filtered(NOISE_CUTOFF_HZ, sample_rate),
            );
        }
        VoiceAlgorithm::Harps if birth => {
            for semitones in TRIAD_SEMITONES {
                let interval = 2_f32.powf(semitones / 12.0);
                voices.push(voice(
                    Waveform::Sine,
                    hz * interval,
                    Envelope::new(0.15, 0.01, 0.6),
                ));
            }
        }
        VoiceAlgorithm::Harps => {
            voices.push(voice(
                Waveform::Sawtooth,
                hz / 2.0,
                Envelope::new(0.2, 0.01, 0.5),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{pitch_for, spawn, Envelope, Voice, NOISE_CUTOFF_HZ, PENTATONIC_SCALE_HZ};
    use convoy_core::{Pulse, PulseKind, VoiceAlgorithm};

    fn pulse(x: f32, y: f32, kind: PulseKind) -> Pulse {
        Pulse::new(x, y, kind, 1.0)
    }

    fn drain(voice: &mut Voice) -> usize {
        let mut frames = 0;
        while voice.next_frame(1000.0, &[0.5]).is_some() {
            frames += 1;
        }
        frames
    }

    #[test]
    fn pitch_rises_towards_the_top_row() {
        assert_eq!(pitch_for(&pulse(0.5, 0.99, PulseKind::Death)), PENTATONIC_SCALE_HZ[0]);
        assert_eq!(pitch_for(&pulse(0.5, 0.99, PulseKind::Birth)), PENTATONIC_SCALE_HZ[1]);
        assert_eq!(pitch_for(&pulse(0.5, 0.1, PulseKind::Death)), PENTATONIC_SCALE_HZ[5]);
        assert_eq!(pitch_for(&pulse(0.5, 0.0, PulseKind::Birth)), PENTATONIC_SCALE_HZ[1]);
    }

    #[test]
    fn envelope_ramps_then_decays_to_silence() {
        let envelope = Envelope::new(0.4, 0.02, 0.4);
        assert_eq!(envelope.amplitude(0.0), 0.0);
        assert!((envelope.amplitude(0.01) - 0.2).abs() < 1e-6);
        assert!((envelope.amplitude(0.02) - 0.4).abs() < 1e-6);
        assert!(envelope.amplitude(0.2) < 0.4);
        assert!(envelope.amplitude(0.2) > 0.001);
        assert_eq!(envelope.amplitude(0.41), 0.001);
    }

    #[test]
    fn voices_per_algorithm() {
        let birth = pulse(0.2, 0.4, PulseKind::Birth);
        let death = pulse(0.2, 0.4, PulseKind::Death);
        let mut voices = Vec::new();
        spawn(VoiceAlgorithm::Harps, &birth, 0.0, 1000.0, &mut voices);
        assert_eq!(voices.len(), 3);
        voices.clear();
        spawn(VoiceAlgorithm::Harps, &death, 0.0, 1000.0, &mut voices);
        spawn(VoiceAlgorithm::Percussion, &death, 0.0, 1000.0, &mut voices);
        spawn(VoiceAlgorithm::Classic, &birth, 0.0, 1000.0, &mut voices);
        assert_eq!(voices.len(), 3);
    }

    #[test]
    fn voice_stops_after_lookahead_and_envelope() {
        let mut voices = Vec::new();
        spawn(
            VoiceAlgorithm::Classic,
            &pulse(0.5, 0.5, PulseKind::Birth),
            0.0,
            1000.0,
            &mut voices,
        );
        // 5 ms lookahead plus 420 ms of envelope at 1 kHz.
        assert_eq!(drain(&mut voices[0]), 5 + 420);
    }

    #[test]
    fn hard_left_pan_silences_the_right_channel() {
        let mut voices = Vec::new();
        spawn(
            VoiceAlgorithm::Percussion,
            &pulse(0.0, 0.5, PulseKind::Death),
            0.0,
            1000.0,
            &mut voices,
        );
        let voice = &mut voices[0];
        for _ in 0..20 {
            if let Some(frame) = voice.next_frame(1000.0, &[0.5]) {
                assert!(frame.right.abs() < 1e-6);
            }
        }
    }

    fn burst_energy(noise: &[f32]) -> f32 {
        let sample_rate = 44_100.0;
        let mut voices = Vec::new();
        spawn(
            VoiceAlgorithm::Percussion,
            &pulse(0.5, 0.5, PulseKind::Death),
            0.0,
            sample_rate,
            &mut voices,
        );
        let voice = &mut voices[0];
        let mut energy = 0.0;
        while let Some(frame) = voice.next_frame(sample_rate, noise) {
            energy += frame.left * frame.left + frame.right * frame.right;
        }
        energy
    }

    #[test]
    fn percussion_noise_is_low_passed() {
        assert!(NOISE_CUTOFF_HZ < 44_100.0 / 2.0);
        // A table alternating in sign sits at Nyquist, far above the cutoff.
        let nyquist = burst_energy(&[1.0, -1.0]);
        let steady = burst_energy(&[1.0]);
        assert!(steady > 0.0);
        assert!(nyquist < steady * 1e-3, "nyquist {nyquist} vs steady {steady}");
    }
}
