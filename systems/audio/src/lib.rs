#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Audio-reactive synthesis for selected simulation pulses.
//!
//! Voices are mixed into a persistent signal graph: every voice is panned
//! into a dry path and a reverb send, the reverb returns into the shared
//! compressor, the compressor feeds the conductor-driven low-pass filter and
//! the master gain applies volume and mute last. The rendered stereo frames
//! are handed to an [`AudioDevice`]. [`HeadlessDevice`] meters them; with the
//! `native-audio` feature, `RodioDevice` plays them on the default output.
//!
//! Nothing is rendered before [`AudioEngine::initialize`] succeeds. A device
//! that fails to open or rejects a buffer is dropped and the engine stays
//! silent; the simulation never sees an audio error.

mod conductor;
mod effects;
#[cfg(feature = "native-audio")]
mod native;
mod voice;

use std::{
    ops::{Add, AddAssign, Mul},
    time::Duration,
};

use convoy_core::{AudioConfig, Generator, Pulse, VoiceAlgorithm};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use conductor::{
    chaos_ratio, target_cutoff, Conductor, GLIDE_SECONDS, MAX_CUTOFF_HZ,
    MAX_EVENTS_FOR_FULL_CHAOS, MIN_CUTOFF_HZ, OPEN_CUTOFF_HZ,
};
#[cfg(feature = "native-audio")]
pub use native::RodioDevice;
pub use voice::{pan_for, pitch_for, LOOKAHEAD_SECONDS, PENTATONIC_SCALE_HZ};

use effects::{Compressor, Glide, LowPass, Reverb};
use voice::Voice;

const BLOCK_FRAMES: usize = 64;
const MAX_VOICES: usize = 128;
const DETUNE_SPREAD_CENTS: f32 = 15.0;
const NOISE_SECONDS: f32 = 0.5;
const REVERB_SECONDS: f32 = 2.0;
const REVERB_DECAY: f32 = 2.0;
const REVERB_WET: f32 = 0.7;
const COMPRESSOR_THRESHOLD_DB: f32 = -40.0;
const COMPRESSOR_RATIO: f32 = 6.0;

/// Stereo sample pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    /// Left channel sample.
    pub left: f32,
    /// Right channel sample.
    pub right: f32,
}

impl Frame {
    /// Silent frame.
    pub const ZERO: Frame = Frame::new(0.0, 0.0);

    /// Creates a frame from both channel samples.
    #[must_use]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Largest absolute sample of the two channels.
    #[must_use]
    pub fn peak(&self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}

impl Add for Frame {
    type Output = Frame;

    fn add(self, other: Frame) -> Frame {
        Frame::new(self.left + other.left, self.right + other.right)
    }
}

impl AddAssign for Frame {
    fn add_assign(&mut self, other: Frame) {
        *self = *self + other;
    }
}

impl Mul<f32> for Frame {
    type Output = Frame;

    fn mul(self, gain: f32) -> Frame {
        Frame::new(self.left * gain, self.right * gain)
    }
}

/// Failures reported by audio devices.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The device could not be opened.
    #[error("audio device unavailable: {reason}")]
    Unavailable {
        /// Description supplied by the device.
        reason: String,
    },
    /// The device refused a rendered buffer.
    #[error("audio device rejected {frames} frames: {reason}")]
    Rejected {
        /// Size of the refused buffer.
        frames: usize,
        /// Description supplied by the device.
        reason: String,
    },
}

/// Output collaborator receiving rendered stereo frames.
pub trait AudioDevice {
    /// Prepares the device for output at `sample_rate`.
    fn open(&mut self, sample_rate: u32) -> Result<(), AudioError>;

    /// Queues rendered frames for playback.
    fn submit(&mut self, frames: &[Frame]) -> Result<(), AudioError>;
}

/// Device that discards audio while metering it.
#[derive(Clone, Debug, Default)]
pub struct HeadlessDevice {
    open_failure: Option<String>,
    sample_rate: Option<u32>,
    frames: u64,
    peak: f32,
}

impl HeadlessDevice {
    /// Creates a device that always opens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a device whose `open` fails with `reason`.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            open_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Frames received so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Largest absolute sample received so far.
    #[must_use]
    pub const fn peak(&self) -> f32 {
        self.peak
    }
}

impl AudioDevice for HeadlessDevice {
    fn open(&mut self, sample_rate: u32) -> Result<(), AudioError> {
        if let Some(reason) = &self.open_failure {
            return Err(AudioError::Unavailable {
                reason: reason.clone(),
            });
        }
        self.sample_rate = Some(sample_rate);
        Ok(())
    }

    fn submit(&mut self, frames: &[Frame]) -> Result<(), AudioError> {
        if self.sample_rate.is_none() {
            return Err(AudioError::Rejected {
                frames: frames.len(),
                reason: "device was never opened".to_owned(),
            });
        }
        self.frames += frames.len() as u64;
        self.peak = frames.iter().map(Frame::peak).fold(self.peak, f32::max);
        Ok(())
    }
}

/// Lifecycle of the output device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceStatus {
    /// No user gesture has initialised audio yet.
    Uninitialized,
    /// The device is open and receiving frames.
    Ready,
    /// The device failed and audio stays silent for the rest of the run.
    Unavailable,
}

/// Running totals of everything the engine rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioStats {
    /// Frames rendered and submitted.
    pub frames_rendered: u64,
    /// Voices started from selected pulses.
    pub voices_started: u64,
    /// Largest absolute output sample.
    pub peak_level: f32,
    cutoff_total: f64,
    cutoff_blocks: u64,
}

impl AudioStats {
    /// Mean live filter cutoff over all rendered blocks, if any were rendered.
    #[must_use]
    pub fn mean_cutoff(&self) -> Option<f32> {
        (self.cutoff_blocks > 0).then(|| (self.cutoff_total / self.cutoff_blocks as f64) as f32)
    }
}

#[derive(Clone, Debug)]
struct Graph {
    sample_rate: f32,
    noise: Vec<f32>,
    reverb: Reverb,
    compressor: Compressor,
    filter: LowPass,
    conductor: Conductor,
    master: Glide,
    gain: f32,
}

impl Graph {
    fn new(config: &AudioConfig, rng: &mut Generator) -> Self {
        let sample_rate = config.sample_rate as f32;
        let noise_len = (NOISE_SECONDS * sample_rate) as usize;
        let noise = (0..noise_len).map(|_| rng.signed_unit() as f32).collect();
        let master = Glide::new(master_level(config), GLIDE_SECONDS);
        Self {
            sample_rate,
            noise,
            reverb: Reverb::new(REVERB_SECONDS, REVERB_DECAY, sample_rate, rng),
            compressor: Compressor::new(COMPRESSOR_THRESHOLD_DB, COMPRESSOR_RATIO, sample_rate),
            filter: LowPass::new(OPEN_CUTOFF_HZ, sample_rate),
            conductor: Conductor::new(),
            gain: master.value(),
            master,
        }
    }

    fn begin_block(&mut self, seconds: f32) {
        let cutoff = self.conductor.advance(seconds);
        self.filter.set_cutoff(cutoff);
        self.gain = self.master.advance(seconds);
    }

    fn process(&mut self, dry: Frame) -> Frame {
        let wet = self.reverb.process(dry) * REVERB_WET;
        let compressed = self.compressor.process(dry + wet);
        self.filter.process(compressed) * self.gain
    }
}

fn master_level(config: &AudioConfig) -> f32 {
    if config.muted {
        0.0
    } else {
        config.volume
    }
}

/// Voice scheduler and effect graph driven by the orchestrator.
pub struct AudioEngine {
    config: AudioConfig,
    device: Option<Box<dyn AudioDevice>>,
    status: DeviceStatus,
    graph: Option<Graph>,
    rng: Generator,
    voices: Vec<Voice>,
    block: Vec<Frame>,
    carry: f64,
    stats: AudioStats,
}

impl AudioEngine {
    /// Creates an engine that stays silent until [`AudioEngine::initialize`].
    #[must_use]
    pub fn new(config: AudioConfig, seed: u64, device: Box<dyn AudioDevice>) -> Self {
        Self {
            config,
            device: Some(device),
            status: DeviceStatus::Uninitialized,
            graph: None,
            rng: Generator::from_seed(seed),
            voices: Vec::new(),
            block: Vec::with_capacity(BLOCK_FRAMES),
            carry: 0.0,
            stats: AudioStats::default(),
        }
    }

    /// Opens the device and builds the signal graph.
    ///
    /// Only the first call has an effect. Returns whether audio is ready.
    pub fn initialize(&mut self) -> bool {
        match self.status {
            DeviceStatus::Ready => return true,
            DeviceStatus::Unavailable => return false,
            DeviceStatus::Uninitialized => {}
        }

        let opened = match self.device.as_mut() {
            Some(device) => device.open(self.config.sample_rate),
            None => Err(AudioError::Unavailable {
                reason: "no device attached".to_owned(),
            }),
        };
        match opened {
            Ok(()) => {
                self.graph = Some(Graph::new(&self.config, &mut self.rng));
                self.status = DeviceStatus::Ready;
                info!(sample_rate = self.config.sample_rate, "audio initialised");
                true
            }
            Err(error) => {
                warn!(%error, "audio unavailable, continuing silently");
                self.shutdown();
                false
            }
        }
    }

    /// Device lifecycle state.
    #[must_use]
    pub const fn status(&self) -> DeviceStatus {
        self.status
    }

    /// Reports whether voices are currently rendered.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status == DeviceStatus::Ready
    }

    /// Active audio settings.
    #[must_use]
    pub const fn config(&self) -> AudioConfig {
        self.config
    }

    /// Selects the algorithm used for voices started from now on.
    pub fn set_voice(&mut self, voice: VoiceAlgorithm) {
        self.config.voice = voice;
    }

    /// Sets the master volume; non-finite values are ignored.
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.config.volume = volume.clamp(0.0, 1.0);
        self.retarget_master();
    }

    /// Silences or restores the aggregate output.
    ///
    /// Voices already sounding keep running; only the master gain moves.
    pub fn set_muted(&mut self, muted: bool) {
        self.config.muted = muted;
        self.retarget_master();
    }

    /// Starts voices for pulses selected by the last step.
    pub fn play(&mut self, pulses: &[Pulse]) {
        if self.config.muted {
            return;
        }
        let Some(graph) = self.graph.as_ref() else {
            return;
        };
        for pulse in pulses {
            if self.voices.len() >= MAX_VOICES {
                debug!(active = self.voices.len(), "voice limit reached");
                break;
            }
            let detune = (self.rng.next_unit() as f32 - 0.5) * DETUNE_SPREAD_CENTS;
            voice::spawn(
                self.config.voice,
                pulse,
                detune,
                graph.sample_rate,
                &mut self.voices,
            );
            self.stats.voices_started += 1;
        }
    }

    /// Retargets the filter for a step that produced `total_pulses` raw pulses.
    pub fn conduct(&mut self, total_pulses: u32) {
        if let Some(graph) = self.graph.as_mut() {
            graph.conductor.observe(total_pulses);
        }
    }

    /// Renders `elapsed` worth of audio and hands it to the device.
    ///
    /// Stalls longer than a quarter second are not caught up.
    pub fn advance(&mut self, elapsed: Duration) {
        let Some(graph) = self.graph.as_mut() else {
            return;
        };
        let rate = f64::from(self.config.sample_rate);
        let wanted = elapsed.as_secs_f64() * rate + self.carry;
        let frames = wanted.floor();
        self.carry = wanted - frames;
        let mut remaining = (frames as usize).min(self.config.sample_rate as usize / 4);

        let mut failure = None;
        while remaining > 0 {
            let len = remaining.min(BLOCK_FRAMES);
            graph.begin_block(len as f32 / graph.sample_rate);
            self.block.clear();
            for _ in 0..len {
                let mut dry = Frame::ZERO;
                for voice in &mut self.voices {
                    if let Some(frame) = voice.next_frame(graph.sample_rate, &graph.noise) {
                        dry += frame;
                    }
                }
                let out = graph.process(dry);
                self.stats.peak_level = self.stats.peak_level.max(out.peak());
                self.block.push(out);
            }
            self.voices.retain(|voice| !voice.finished());
            self.stats.frames_rendered += len as u64;
            self.stats.cutoff_total += f64::from(graph.conductor.cutoff());
            self.stats.cutoff_blocks += 1;

            if let Some(device) = self.device.as_mut() {
                if let Err(error) = device.submit(&self.block) {
                    failure = Some(error);
                    break;
                }
            }
            remaining -= len;
        }

        if let Some(error) = failure {
            warn!(%error, "audio device dropped, continuing silently");
            self.shutdown();
        }
    }

    /// Number of voices still sounding.
    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Live filter cutoff, once initialised.
    #[must_use]
    pub fn cutoff(&self) -> Option<f32> {
        self.graph.as_ref().map(|graph| graph.conductor.cutoff())
    }

    /// Filter cutoff being approached, once initialised.
    #[must_use]
    pub fn target_cutoff(&self) -> Option<f32> {
        self.graph.as_ref().map(|graph| graph.conductor.target())
    }

    /// Live master gain, once initialised.
    #[must_use]
    pub fn master_gain(&self) -> Option<f32> {
        self.graph.as_ref().map(|graph| graph.master.value())
    }

    /// Totals rendered so far.
    #[must_use]
    pub const fn stats(&self) -> AudioStats {
        self.stats
    }

    fn retarget_master(&mut self) {
        let level = master_level(&self.config);
        if let Some(graph) = self.graph.as_mut() {
            graph.master.set_target(level);
        }
    }

    fn shutdown(&mut self) {
        self.device = None;
        self.graph = None;
        self.voices.clear();
        self.status = DeviceStatus::Unavailable;
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("config", &self.config)
            .field("status", &self.status)
            .field("voices", &self.voices.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
