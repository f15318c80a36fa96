#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver that ties the world, the audio layer and the adapters together.
//!
//! Adapters hand every animation frame to [`Orchestrator::frame`] together with
//! the input they captured. The orchestrator translates that input into world
//! commands, advances the fixed-interval clock, watches for inactivity, routes
//! the selected pulses of each step to the audio engine, and finally repopulates
//! the scene. Engines never see the audio layer: the only connection between the
//! two is the [`Event::Stepped`] summary observed here.

mod clock;
mod inactivity;

use std::time::Duration;

use convoy_core::{
    AppConfig, BrushConfig, Command, ConfigError, Event, Mode, SimulationConfig, StepSummary,
};
use convoy_rendering::{FrameInput, Scene, StatusPanel};
use convoy_system_audio::{AudioDevice, AudioEngine};
use convoy_world::{self as world, query, World};
use tracing::{debug, info};

pub use clock::{UpdateClock, MAX_INTERVAL_MS, SPEED_STEP_MS};
pub use inactivity::{InactivityTracker, FADE_WINDOW, MAX_DIM, RESTART_TIMEOUT};

/// Offset separating the audio generator stream from the simulation streams.
const AUDIO_STREAM: u64 = 0x5EED_A0D1_0000_0001;

/// Activity accumulated since the orchestrator was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RunTotals {
    /// Simulation steps executed.
    pub steps: u64,
    /// Raw birth pulses across all steps.
    pub births: u64,
    /// Raw death pulses across all steps.
    pub deaths: u64,
    /// Pulses forwarded to the audio layer.
    pub voiced: u64,
    /// Setups performed after start-up, including inactivity restarts.
    pub setups: u64,
    /// Setups triggered by the inactivity timeout.
    pub inactivity_restarts: u64,
}

impl RunTotals {
    fn record_step(&mut self, summary: &StepSummary) {
        let births = u64::from(summary.births);
        self.steps = self.steps.saturating_add(1);
        self.births = self.births.saturating_add(births);
        self.deaths = self
            .deaths
            .saturating_add(u64::from(summary.total_pulses).saturating_sub(births));
        self.voiced = self.voiced.saturating_add(summary.selected.len() as u64);
    }
}

/// Drives a single simulator instance frame by frame.
#[derive(Debug)]
pub struct Orchestrator {
    world: World,
    audio: AudioEngine,
    clock: UpdateClock,
    inactivity: InactivityTracker,
    brush: BrushConfig,
    paused: bool,
    totals: RunTotals,
    events: Vec<Event>,
}

impl Orchestrator {
    /// Creates an orchestrator with the configured mode already set up.
    ///
    /// The configuration must already be sanitised. The audio device stays
    /// closed until [`Orchestrator::initialize_audio`] or a user gesture.
    #[must_use]
    pub fn new(config: AppConfig, device: Box<dyn AudioDevice>) -> Self {
        let world = World::new(config.mode, config.dimensions, config.simulation);
        let audio = AudioEngine::new(
            config.audio,
            config.simulation.seed.wrapping_add(AUDIO_STREAM),
            device,
        );
        Self {
            world,
            audio,
            clock: UpdateClock::new(config.clock),
            inactivity: InactivityTracker::new(),
            brush: config.brush,
            paused: false,
            totals: RunTotals::default(),
            events: Vec::new(),
        }
    }

    /// Read-only access to the simulation.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the audio engine.
    #[must_use]
    pub const fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    /// Update clock driving simulation steps.
    #[must_use]
    pub const fn clock(&self) -> &UpdateClock {
        &self.clock
    }

    /// Inactivity tracker state.
    #[must_use]
    pub const fn inactivity(&self) -> &InactivityTracker {
        &self.inactivity
    }

    /// Current brush settings.
    #[must_use]
    pub const fn brush(&self) -> BrushConfig {
        self.brush
    }

    /// Reports whether simulation steps are suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Activity accumulated so far.
    #[must_use]
    pub const fn totals(&self) -> RunTotals {
        self.totals
    }

    /// Starts the audio device; returns whether sound is available.
    pub fn initialize_audio(&mut self) -> bool {
        self.audio.initialize()
    }

    /// Suspends simulation steps and the inactivity timer.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.inactivity.suspend();
            info!("simulation paused");
        }
    }

    /// Resumes simulation steps and restarts the inactivity timer.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.inactivity.resume();
            info!("simulation resumed");
        }
    }

    /// Sets up the active mode again and unpauses.
    pub fn reset(&mut self) {
        self.submit(Command::Reset);
        self.resume();
    }

    /// Switches the active mode.
    pub fn select_mode(&mut self, mode: Mode) {
        self.submit(Command::SelectMode { mode });
    }

    /// Sanitises and applies a new simulation configuration.
    ///
    /// Returns whether the change forced a fresh setup.
    pub fn configure(&mut self, config: SimulationConfig) -> Result<bool, ConfigError> {
        let config = config.sanitized()?;
        let generation = query::generation(&self.world);
        self.submit(Command::Configure {
            config: Box::new(config),
        });
        Ok(query::generation(&self.world) != generation)
    }

    /// Changes the master volume.
    pub fn set_volume(&mut self, volume: f32) {
        self.audio.set_volume(volume);
    }

    /// Processes one animation frame and repopulates `scene`.
    pub fn frame(&mut self, elapsed: Duration, input: FrameInput, scene: &mut Scene) {
        self.update(elapsed, input);
        self.populate_scene(scene);
    }

    /// Processes input and advances time without drawing.
    pub fn update(&mut self, elapsed: Duration, input: FrameInput) {
        self.handle_input(input);

        if self.inactivity.advance(elapsed) {
            info!(
                timeout_secs = RESTART_TIMEOUT.as_secs(),
                "no births observed, restarting simulation"
            );
            self.totals.inactivity_restarts = self.totals.inactivity_restarts.saturating_add(1);
            self.reset();
        }

        if !self.paused && self.clock.advance(elapsed) {
            self.submit(Command::Step);
        }

        self.audio.advance(elapsed);
    }

    /// Draws the simulation, the status panel and the inactivity overlay.
    pub fn populate_scene(&self, scene: &mut Scene) {
        scene.begin_frame(query::dimensions(&self.world));
        query::render(&self.world, scene);
        scene.dim = self.inactivity.dim();
        let audio = self.audio.config();
        scene.status = Some(StatusPanel {
            mode: query::mode(&self.world),
            paused: self.paused,
            muted: audio.muted,
            audio_ready: self.audio.is_ready(),
            voice: audio.voice,
            eraser: self.brush.eraser,
            brush_radius: self.brush.radius,
            interval_ms: self.clock.interval_ms(),
            tick: query::tick(&self.world),
        });
    }

    fn handle_input(&mut self, input: FrameInput) {
        if input.gesture {
            let _ = self.audio.initialize();
        }

        if let Some(dimensions) = input.surface {
            if dimensions != query::dimensions(&self.world) {
                self.submit(Command::Setup { dimensions });
            }
        }
        if let Some(mode) = input.select_mode {
            self.select_mode(mode);
        }
        if input.reset {
            self.reset();
        }
        if input.toggle_pause {
            if self.paused {
                self.resume();
            } else {
                self.pause();
            }
        }

        if input.toggle_mute {
            let _ = self.audio.initialize();
            let muted = !self.audio.config().muted;
            self.audio.set_muted(muted);
            info!(muted, "audio mute toggled");
        }
        if input.cycle_voice {
            let voice = self.audio.config().voice.next();
            self.audio.set_voice(voice);
            debug!(?voice, "voice algorithm changed");
        }

        if input.faster {
            self.clock.faster();
        }
        if input.slower {
            self.clock.slower();
        }
        if input.brush_grow {
            self.brush.radius = (self.brush.radius + 1).min(BrushConfig::MAX_RADIUS);
        }
        if input.brush_shrink {
            self.brush.radius = self.brush.radius.saturating_sub(1);
        }
        if input.toggle_eraser {
            self.brush.eraser = !self.brush.eraser;
        }

        if let Some(cell) = input.brush {
            self.submit(Command::Paint {
                cell,
                radius: self.brush.radius,
                erase: self.brush.eraser,
            });
        }
    }

    fn submit(&mut self, command: Command) {
        let mut events = std::mem::take(&mut self.events);
        world::apply(&mut self.world, command, &mut events);
        for event in events.drain(..) {
            self.observe(event);
        }
        self.events = events;
    }

    fn observe(&mut self, event: Event) {
        match event {
            Event::Stepped { summary } => {
                self.totals.record_step(&summary);
                if summary.births > 0 {
                    self.inactivity.record_activity();
                }
                self.audio.play(&summary.selected);
                self.audio.conduct(summary.total_pulses);
            }
            Event::Painted { cells } => {
                debug!(cells, "brush stroke applied");
                self.inactivity.record_activity();
            }
            Event::SimulationReset { .. } => {
                self.totals.setups = self.totals.setups.saturating_add(1);
                self.inactivity.record_activity();
                self.clock.restart();
            }
            Event::ModeChanged { mode } => {
                debug!(mode = mode.label(), "mode switch observed");
            }
            Event::Reconfigured { restarted } => {
                debug!(restarted, "configuration change observed");
            }
        }
    }
}
