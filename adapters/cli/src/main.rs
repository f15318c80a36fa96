#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Convoy simulator.
//!
//! Settings come from an optional TOML file, then from command-line overrides.
//! The simulator either opens a Macroquad window or runs a fixed number of
//! ticks headlessly and reports what it heard.

mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use convoy_core::{AppConfig, GridDimensions, Mode, VoiceAlgorithm};
use convoy_rendering::{Color, FrameInput, Presentation, RenderingBackend, Scene, SurfaceLayout};
use convoy_rendering_macroquad::MacroquadBackend;
use convoy_system_audio::{AudioDevice, HeadlessDevice};
use convoy_system_orchestrator::{Orchestrator, RunTotals};
use convoy_world::query;
use settings::{Settings, WindowSettings};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments accepted by the simulator.
#[derive(Debug, Parser)]
#[command(
    name = "convoy",
    version,
    about = "Cellular automata and flocking agents that play themselves."
)]
struct CliArgs {
    /// TOML settings file; command-line flags take precedence over it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Simulation mode active at start-up.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Base seed for every generator stream.
    #[arg(long)]
    seed: Option<u64>,
    /// Grid rows used when no window dictates the extent.
    #[arg(long)]
    rows: Option<u32>,
    /// Grid columns used when no window dictates the extent.
    #[arg(long)]
    columns: Option<u32>,
    /// Milliseconds between simulation ticks.
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,
    /// Synthesis algorithm used to voice pulses.
    #[arg(long, value_enum)]
    voice: Option<VoiceArg>,
    /// Master volume in `[0, 1]`.
    #[arg(long)]
    volume: Option<f32>,
    /// Starts with audio unmuted.
    #[arg(long)]
    unmuted: bool,
    /// Runs without a window for `--ticks` simulation ticks.
    #[arg(long)]
    headless: bool,
    /// Number of ticks simulated by a headless run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Enables vertical sync.
    #[arg(long = "vsync", action = ArgAction::SetTrue, overrides_with = "no_vsync")]
    vsync: bool,
    /// Disables vertical sync.
    #[arg(long = "no-vsync", action = ArgAction::SetTrue, overrides_with = "vsync")]
    no_vsync: bool,
    /// Logs frame timing once per second.
    #[arg(long)]
    show_fps: bool,
    /// Hides the status panel at start-up.
    #[arg(long)]
    hide_panel: bool,
    /// On-screen size of a grid cell in pixels.
    #[arg(long, value_name = "PX")]
    cell_pixels: Option<f32>,
    /// Emits logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

/// Command-line names for [`Mode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Classic,
    Resources,
    Smooth,
    Cyclic,
    Walkers,
    Flock,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Classic => Mode::Classic,
            ModeArg::Resources => Mode::Resources,
            ModeArg::Smooth => Mode::Smooth,
            ModeArg::Cyclic => Mode::Cyclic,
            ModeArg::Walkers => Mode::Walkers,
            ModeArg::Flock => Mode::Flock,
        }
    }
}

/// Command-line names for [`VoiceAlgorithm`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum VoiceArg {
    Classic,
    Percussion,
    Harps,
}

impl From<VoiceArg> for VoiceAlgorithm {
    fn from(value: VoiceArg) -> Self {
        match value {
            VoiceArg::Classic => VoiceAlgorithm::Classic,
            VoiceArg::Percussion => VoiceAlgorithm::Percussion,
            VoiceArg::Harps => VoiceAlgorithm::Harps,
        }
    }
}

/// Entry point for the Convoy command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let settings = settings::load(args.config.as_deref())?;
    let Settings { app, window } = apply_overrides(&args, settings);
    let config = app.sanitized().context("invalid simulator settings")?;

    info!(
        mode = config.mode.label(),
        columns = config.dimensions.columns(),
        rows = config.dimensions.rows(),
        seed = config.simulation.seed,
        headless = args.headless,
        "starting convoy"
    );

    if args.headless {
        let _ = run_headless(config, args.ticks);
        Ok(())
    } else {
        run_visual(config, window)
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn apply_overrides(args: &CliArgs, settings: Settings) -> Settings {
    let Settings {
        mut app,
        mut window,
    } = settings;

    if let Some(mode) = args.mode {
        app.mode = mode.into();
    }
    if let Some(seed) = args.seed {
        app.simulation.seed = seed;
    }
    if args.rows.is_some() || args.columns.is_some() {
        app.dimensions = GridDimensions::new(
            args.columns.unwrap_or_else(|| app.dimensions.columns()),
            args.rows.unwrap_or_else(|| app.dimensions.rows()),
        );
    }
    if let Some(interval_ms) = args.interval_ms {
        app.clock.interval_ms = interval_ms;
    }
    if let Some(voice) = args.voice {
        app.audio.voice = voice.into();
    }
    if let Some(volume) = args.volume {
        app.audio.volume = volume;
    }
    if args.unmuted {
        app.audio.muted = false;
    }

    if args.vsync {
        window.vsync = true;
    }
    if args.no_vsync {
        window.vsync = false;
    }
    if args.show_fps {
        window.show_fps = true;
    }
    if args.hide_panel {
        window.status_panel = false;
    }
    if let Some(cell_pixels) = args.cell_pixels {
        window.cell_pixels = cell_pixels;
    }

    Settings { app, window }
}

fn run_headless(config: AppConfig, ticks: u64) -> RunTotals {
    let mut orchestrator = Orchestrator::new(config, Box::new(HeadlessDevice::new()));
    let _ = orchestrator.initialize_audio();

    while orchestrator.totals().steps < ticks {
        let interval = orchestrator.clock().interval();
        orchestrator.update(interval, FrameInput::default());
    }

    let totals = orchestrator.totals();
    let stats = orchestrator.audio().stats();
    info!(
        steps = totals.steps,
        births = totals.births,
        deaths = totals.deaths,
        voiced = totals.voiced,
        setups = totals.setups,
        inactivity_restarts = totals.inactivity_restarts,
        generation = query::generation(orchestrator.world()),
        voices_started = stats.voices_started,
        peak_level = stats.peak_level,
        mean_cutoff = stats.mean_cutoff().unwrap_or_default(),
        "headless run finished"
    );
    println!(
        "{} ticks in {} mode: {} births, {} deaths, {} voiced, {} restarts",
        totals.steps,
        config.mode.label(),
        totals.births,
        totals.deaths,
        totals.voiced,
        totals.inactivity_restarts
    );
    totals
}

fn run_visual(config: AppConfig, window: WindowSettings) -> Result<()> {
    let layout = SurfaceLayout::new(window.cell_pixels).context("invalid cell size")?;

    let mut orchestrator = Orchestrator::new(config, speaker_device());
    let mut scene = Scene::new(config.dimensions);
    orchestrator.populate_scene(&mut scene);

    let presentation = Presentation::new("Convoy", Color::BLACK, layout, scene);
    MacroquadBackend::new()
        .with_vsync(window.vsync)
        .with_show_fps(window.show_fps)
        .with_status_panel(window.status_panel)
        .run(presentation, move |elapsed, input, scene| {
            orchestrator.frame(elapsed, input, scene);
        })
}

/// Output used by windowed runs: the speakers when built with
/// `native-audio`, otherwise a metering device.
fn speaker_device() -> Box<dyn AudioDevice> {
    #[cfg(feature = "native-audio")]
    {
        Box::new(convoy_system_audio::RodioDevice::new())
    }
    #[cfg(not(feature = "native-audio"))]
    {
        info!("built without native-audio, voices are rendered silently");
        Box::new(HeadlessDevice::new())
    }
}
