//! Configuration records, presets, and the sanitising configuration boundary.
//!
//! Every record derives serde with `#[serde(default)]`, so partial
//! configuration files fill in the remaining knobs from the defaults below.
//! Values coming from adapters must pass through [`AppConfig::sanitized`]
//! before reaching the world; engines assume clean numeric domains.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BoundaryPolicy, GridDimensions, Mode, Neighborhood, RenderStyle, VoiceAlgorithm};

const MAX_GRID_EXTENT: u32 = 2_048;
const MAX_NEIGHBOR_COUNT: u32 = 8;

/// Reasons a configuration value is rejected at the configuration boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric knob held NaN or an infinity.
    #[error("`{field}` must be a finite number")]
    NonFinite {
        /// Name of the offending knob.
        field: &'static str,
    },
    /// A threshold interval had its lower bound at or above its upper bound.
    #[error("`{field}` lower bound {lower} must be below upper bound {upper}")]
    InvertedInterval {
        /// Name of the offending interval.
        field: &'static str,
        /// Provided lower bound.
        lower: f32,
        /// Provided upper bound.
        upper: f32,
    },
    /// A rule string did not follow `B<digits>/S<digits>` notation.
    #[error("invalid rule notation `{notation}`: {reason}")]
    InvalidRule {
        /// Notation that failed to parse.
        notation: String,
        /// Short description of the failure.
        reason: &'static str,
    },
}

/// Set of live-neighbour counts (0 through 8) stored as a bit mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NeighborCounts(u16);

impl NeighborCounts {
    /// Builds a set from explicit counts; counts above 8 are ignored.
    #[must_use]
    pub fn from_counts(counts: &[u32]) -> Self {
        let mask = counts
            .iter()
            .filter(|count| **count <= MAX_NEIGHBOR_COUNT)
            .fold(0_u16, |mask, count| mask | (1 << count));
        Self(mask)
    }

    /// Reports whether `count` belongs to the set.
    #[must_use]
    pub const fn contains(self, count: u32) -> bool {
        count <= MAX_NEIGHBOR_COUNT && self.0 & (1 << count) != 0
    }

    /// Reports whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the counts contained in the set in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u32> {
        (0..=MAX_NEIGHBOR_COUNT).filter(move |count| self.contains(*count))
    }
}

/// Birth and survival rule of a life-like automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleSet {
    birth: NeighborCounts,
    survival: NeighborCounts,
}

impl RuleSet {
    /// Creates a rule from explicit birth and survival counts.
    #[must_use]
    pub fn new(birth: &[u32], survival: &[u32]) -> Self {
        Self {
            birth: NeighborCounts::from_counts(birth),
            survival: NeighborCounts::from_counts(survival),
        }
    }

    /// Neighbour counts that bring a dead cell to life.
    #[must_use]
    pub const fn birth(&self) -> NeighborCounts {
        self.birth
    }

    /// Neighbour counts that keep a live cell alive.
    #[must_use]
    pub const fn survival(&self) -> NeighborCounts {
        self.survival
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        RulePreset::Seeds.rules()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("B")?;
        for count in self.birth.iter() {
            write!(f, "{count}")?;
        }
        f.write_str("/S")?;
        for count in self.survival.iter() {
            write!(f, "{count}")?;
        }
        Ok(())
    }
}

impl FromStr for RuleSet {
    type Err = ConfigError;

    fn from_str(notation: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ConfigError::InvalidRule {
            notation: notation.to_owned(),
            reason,
        };

        let mut birth = None;
        let mut survival = None;
        for part in notation.trim().split('/') {
            let mut chars = part.trim().chars();
            let slot = match chars.next().map(|c| c.to_ascii_uppercase()) {
                Some('B') => &mut birth,
                Some('S') => &mut survival,
                _ => return Err(invalid("each part must start with B or S")),
            };
            if slot.is_some() {
                return Err(invalid("duplicate rule part"));
            }
            let mut counts = Vec::new();
            for digit in chars {
                match digit.to_digit(10) {
                    Some(count) if count <= MAX_NEIGHBOR_COUNT => counts.push(count),
                    _ => return Err(invalid("neighbour counts must be digits 0-8")),
                }
            }
            *slot = Some(NeighborCounts::from_counts(&counts));
        }

        match (birth, survival) {
            (Some(birth), Some(survival)) => Ok(Self { birth, survival }),
            _ => Err(invalid("both B and S parts are required")),
        }
    }
}

impl TryFrom<String> for RuleSet {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RuleSet> for String {
    fn from(value: RuleSet) -> Self {
        value.to_string()
    }
}

/// Named rule presets offered by the configuration surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePreset {
    /// B3/S23, Conway's Game of Life.
    Life,
    /// B36/S23, Life with replicators.
    HighLife,
    /// B34/S34.
    ThreeFour,
    /// B2/S, explosive fractal growth.
    Seeds,
    /// B1357/S1357.
    Replicator,
    /// B3/S1234, maze-like corridors.
    Maze,
    /// B35678/S5678, chaotic blobs.
    Diamoeba,
    /// B3678/S34678, symmetric under inversion.
    DayAndNight,
    /// B4678/S35678, slowly annealing regions.
    Cities,
    /// B3/S245, moving structures.
    Move,
    /// B378/S235678, coagulating blobs.
    Coagulations,
}

impl RulePreset {
    /// Every preset in presentation order.
    pub const ALL: [RulePreset; 11] = [
        RulePreset::Life,
        RulePreset::HighLife,
        RulePreset::ThreeFour,
        RulePreset::Seeds,
        RulePreset::Replicator,
        RulePreset::Maze,
        RulePreset::Diamoeba,
        RulePreset::DayAndNight,
        RulePreset::Cities,
        RulePreset::Move,
        RulePreset::Coagulations,
    ];

    /// Rule table described by the preset.
    #[must_use]
    pub fn rules(self) -> RuleSet {
        match self {
            Self::Life => RuleSet::new(&[3], &[2, 3]),
            Self::HighLife => RuleSet::new(&[3, 6], &[2, 3]),
            Self::ThreeFour => RuleSet::new(&[3, 4], &[3, 4]),
            Self::Seeds => RuleSet::new(&[2], &[]),
            Self::Replicator => RuleSet::new(&[1, 3, 5, 7], &[1, 3, 5, 7]),
            Self::Maze => RuleSet::new(&[3], &[1, 2, 3, 4]),
            Self::Diamoeba => RuleSet::new(&[3, 5, 6, 7, 8], &[5, 6, 7, 8]),
            Self::DayAndNight => RuleSet::new(&[3, 6, 7, 8], &[3, 4, 6, 7, 8]),
            Self::Cities => RuleSet::new(&[4, 6, 7, 8], &[3, 5, 6, 7, 8]),
            Self::Move => RuleSet::new(&[3], &[2, 4, 5]),
            Self::Coagulations => RuleSet::new(&[3, 7, 8], &[2, 3, 5, 6, 7, 8]),
        }
    }

    /// Display name of the preset.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Life => "Life",
            Self::HighLife => "HighLife",
            Self::ThreeFour => "3-4 Life",
            Self::Seeds => "Seeds",
            Self::Replicator => "Replicator",
            Self::Maze => "Maze",
            Self::Diamoeba => "Diamoeba",
            Self::DayAndNight => "Day & Night",
            Self::Cities => "Cities",
            Self::Move => "Move",
            Self::Coagulations => "Coagulations",
        }
    }
}

/// Parameters of the discrete Classic/Generations automaton.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    /// Birth and survival rule table.
    pub rules: RuleSet,
    /// Neighbour topology.
    pub neighborhood: Neighborhood,
    /// Enables species inheritance (Generations mode).
    pub generations: bool,
    /// Enables random survival and birth failures.
    pub probabilistic: bool,
    /// Leaves a fading countdown behind dead cells.
    pub fade: bool,
    /// Visual style of live cells.
    pub render_style: RenderStyle,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            neighborhood: Neighborhood::Moore,
            generations: false,
            probabilistic: false,
            fade: true,
            render_style: RenderStyle::Squares,
        }
    }
}

/// Regeneration and consumption rates of the resource overlay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Amount regained per step by cells that are not alive.
    pub regeneration_rate: f32,
    /// Amount consumed per step by live cells.
    pub consumption_rate: f32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            regeneration_rate: 0.2,
            consumption_rate: 4.0,
        }
    }
}

/// Thresholds and integration rate of the continuous automaton.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothParams {
    /// Lower bound of the birth interval (exclusive).
    pub birth_min: f32,
    /// Upper bound of the birth interval (exclusive).
    pub birth_max: f32,
    /// Lower bound of the survival interval (exclusive).
    pub survival_min: f32,
    /// Upper bound of the survival interval (exclusive).
    pub survival_max: f32,
    /// Euler integration rate.
    pub rate: f32,
}

impl SmoothParams {
    /// Creates a parameter set.
    #[must_use]
    pub const fn new(
        birth_min: f32,
        birth_max: f32,
        survival_min: f32,
        survival_max: f32,
        rate: f32,
    ) -> Self {
        Self {
            birth_min,
            birth_max,
            survival_min,
            survival_max,
            rate,
        }
    }
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self::new(0.278, 0.365, 0.267, 0.445, 0.1)
    }
}

/// Named presets of the continuous automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SmoothPreset {
    /// Liquid gliders.
    #[default]
    Liquid,
    /// Coral growth.
    Coral,
    /// Cellular mitosis.
    Mitosis,
    /// Amoeba battle.
    Amoeba,
    /// Crystallisation.
    Crystal,
    /// User-provided thresholds from [`SmoothConfig::custom`].
    Custom,
}

impl SmoothPreset {
    /// Every preset in presentation order.
    pub const ALL: [SmoothPreset; 6] = [
        SmoothPreset::Liquid,
        SmoothPreset::Coral,
        SmoothPreset::Mitosis,
        SmoothPreset::Amoeba,
        SmoothPreset::Crystal,
        SmoothPreset::Custom,
    ];

    /// Fixed parameters of a named preset, `None` for [`SmoothPreset::Custom`].
    #[must_use]
    pub const fn params(self) -> Option<SmoothParams> {
        match self {
            Self::Liquid => Some(SmoothParams::new(0.258, 0.365, 0.267, 0.445, 0.12)),
            Self::Coral => Some(SmoothParams::new(0.300, 0.450, 0.220, 0.580, 0.09)),
            Self::Mitosis => Some(SmoothParams::new(0.250, 0.340, 0.200, 0.500, 0.14)),
            Self::Amoeba => Some(SmoothParams::new(0.300, 0.420, 0.250, 0.500, 0.1)),
            Self::Crystal => Some(SmoothParams::new(0.220, 0.320, 0.150, 0.500, 0.05)),
            Self::Custom => None,
        }
    }
}

/// Colour themes of the continuous automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SmoothPalette {
    /// Cyan lightness ramp.
    #[default]
    Cyan,
    /// Orange to yellow.
    Magma,
    /// Greens.
    Forest,
    /// Full hue sweep.
    Psychedelic,
}

/// Parameters of the continuous automaton.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothConfig {
    /// Selected preset.
    pub preset: SmoothPreset,
    /// Thresholds used when `preset` is [`SmoothPreset::Custom`].
    pub custom: SmoothParams,
    /// Neighbour topology.
    pub neighborhood: Neighborhood,
    /// Colour theme.
    pub palette: SmoothPalette,
    /// Activation level whose crossing counts as a birth or death pulse.
    ///
    /// Independent from the birth/survival thresholds.
    pub activation_threshold: f32,
}

impl SmoothConfig {
    /// Parameters in effect for the selected preset.
    #[must_use]
    pub fn params(&self) -> SmoothParams {
        self.preset.params().unwrap_or(self.custom)
    }
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            preset: SmoothPreset::Liquid,
            custom: SmoothParams::default(),
            neighborhood: Neighborhood::Moore,
            palette: SmoothPalette::Cyan,
            activation_threshold: 0.2,
        }
    }
}

/// Parameters of the cyclic automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CyclicConfig {
    /// Number of states in the cycle.
    pub states: u16,
    /// Successor-holding neighbours required to advance.
    pub threshold: u8,
}

impl Default for CyclicConfig {
    fn default() -> Self {
        Self {
            states: 8,
            threshold: 3,
        }
    }
}

/// Parameters of the walker (ant) mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Number of walkers.
    pub count: u32,
    /// Micro-steps executed by every walker per simulation tick.
    pub micro_steps: u32,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            count: 3,
            micro_steps: 10,
        }
    }
}

/// Parameters of the flocking mode, in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    /// Number of agents.
    pub count: u32,
    /// Weight of the alignment steering force.
    pub alignment: f32,
    /// Weight of the cohesion steering force.
    pub cohesion: f32,
    /// Weight of the separation steering force.
    pub separation: f32,
    /// Distance within which other agents are considered neighbours.
    pub perception_radius: f32,
    /// Neighbour distance below which a near-miss pulse is emitted.
    pub separation_sound_distance: f32,
    /// Speed cap.
    pub max_speed: f32,
    /// Steering force cap.
    pub max_force: f32,
    /// Width of the edge band in which clamped agents steer inward.
    pub edge_margin: f32,
    /// Magnitude of the inward steering force near edges.
    pub edge_turn_force: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            count: 150,
            alignment: 1.0,
            cohesion: 1.0,
            separation: 1.5,
            perception_radius: 50.0,
            separation_sound_distance: 20.0,
            max_speed: 3.0,
            max_force: 0.05,
            edge_margin: 50.0,
            edge_turn_force: 0.2,
        }
    }
}

/// Complete engine configuration shared by every mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Base seed from which every setup derives its generator stream.
    pub seed: u64,
    /// Boundary handling shared by every mode.
    pub boundary: BoundaryPolicy,
    /// Discrete automaton parameters.
    pub life: LifeConfig,
    /// Resource overlay parameters.
    pub resources: ResourceConfig,
    /// Continuous automaton parameters.
    pub smooth: SmoothConfig,
    /// Cyclic automaton parameters.
    pub cyclic: CyclicConfig,
    /// Walker parameters.
    pub walkers: WalkerConfig,
    /// Flocking parameters.
    pub flock: FlockConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x00c0_ffee,
            boundary: BoundaryPolicy::Clamp,
            life: LifeConfig::default(),
            resources: ResourceConfig::default(),
            smooth: SmoothConfig::default(),
            cyclic: CyclicConfig::default(),
            walkers: WalkerConfig::default(),
            flock: FlockConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Clamps every knob to its domain, rejecting non-finite or inverted values.
    pub fn sanitized(mut self) -> Result<Self, ConfigError> {
        let resources = &mut self.resources;
        resources.regeneration_rate =
            clamp_finite("resources.regeneration_rate", resources.regeneration_rate, 0.0, 100.0)?;
        resources.consumption_rate =
            clamp_finite("resources.consumption_rate", resources.consumption_rate, 0.0, 100.0)?;

        let smooth = &mut self.smooth;
        let custom = &mut smooth.custom;
        custom.birth_min = clamp_finite("smooth.custom.birth_min", custom.birth_min, 0.0, 1.0)?;
        custom.birth_max = clamp_finite("smooth.custom.birth_max", custom.birth_max, 0.0, 1.0)?;
        custom.survival_min =
            clamp_finite("smooth.custom.survival_min", custom.survival_min, 0.0, 1.0)?;
        custom.survival_max =
            clamp_finite("smooth.custom.survival_max", custom.survival_max, 0.0, 1.0)?;
        custom.rate = clamp_finite("smooth.custom.rate", custom.rate, 0.001, 1.0)?;
        ordered("smooth.custom.birth", custom.birth_min, custom.birth_max)?;
        ordered(
            "smooth.custom.survival",
            custom.survival_min,
            custom.survival_max,
        )?;
        smooth.activation_threshold = clamp_finite(
            "smooth.activation_threshold",
            smooth.activation_threshold,
            0.0,
            1.0,
        )?;

        self.cyclic.states = self.cyclic.states.clamp(2, 24);
        self.cyclic.threshold = self.cyclic.threshold.clamp(1, 8);

        self.walkers.count = self.walkers.count.clamp(1, 256);
        self.walkers.micro_steps = self.walkers.micro_steps.clamp(1, 100);

        let flock = &mut self.flock;
        flock.count = flock.count.clamp(1, 1_000);
        flock.alignment = clamp_finite("flock.alignment", flock.alignment, 0.0, 5.0)?;
        flock.cohesion = clamp_finite("flock.cohesion", flock.cohesion, 0.0, 5.0)?;
        flock.separation = clamp_finite("flock.separation", flock.separation, 0.0, 5.0)?;
        flock.perception_radius =
            clamp_finite("flock.perception_radius", flock.perception_radius, 1.0, 500.0)?;
        flock.separation_sound_distance = clamp_finite(
            "flock.separation_sound_distance",
            flock.separation_sound_distance,
            0.0,
            flock.perception_radius,
        )?;
        flock.max_speed = clamp_finite("flock.max_speed", flock.max_speed, 0.1, 50.0)?;
        flock.max_force = clamp_finite("flock.max_force", flock.max_force, 0.0, 10.0)?;
        flock.edge_margin = clamp_finite("flock.edge_margin", flock.edge_margin, 0.0, 500.0)?;
        flock.edge_turn_force =
            clamp_finite("flock.edge_turn_force", flock.edge_turn_force, 0.0, 10.0)?;

        Ok(self)
    }

    /// Reports whether switching from `previous` to `self` requires a fresh
    /// setup of `mode` rather than a live parameter update.
    #[must_use]
    pub fn requires_setup(&self, previous: &Self, mode: Mode) -> bool {
        if self.seed != previous.seed || self.boundary != previous.boundary {
            return true;
        }
        match mode {
            Mode::Classic | Mode::Resources => self.life.generations != previous.life.generations,
            Mode::Smooth => self.smooth.preset != previous.smooth.preset,
            Mode::Cyclic => self.cyclic.states != previous.cyclic.states,
            Mode::Walkers => self.walkers != previous.walkers,
            Mode::Flock => self.flock.count != previous.flock.count,
        }
    }
}

/// Audio layer settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Synthesis algorithm used for voices.
    pub voice: VoiceAlgorithm,
    /// Master volume in `[0, 1]`.
    pub volume: f32,
    /// Starts with the aggregate output silenced.
    pub muted: bool,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            voice: VoiceAlgorithm::Classic,
            volume: 0.4,
            muted: true,
            sample_rate: 44_100,
        }
    }
}

impl AudioConfig {
    /// Clamps volume and sample rate to their domains.
    pub fn sanitized(mut self) -> Result<Self, ConfigError> {
        self.volume = clamp_finite("audio.volume", self.volume, 0.0, 1.0)?;
        self.sample_rate = self.sample_rate.clamp(8_000, 192_000);
        Ok(self)
    }
}

/// Fixed-interval update clock settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Interval between simulation ticks in milliseconds.
    pub interval_ms: u64,
}

impl ClockConfig {
    /// Smallest permitted interval.
    pub const MIN_INTERVAL_MS: u64 = 16;

    /// Interval with the minimum applied.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(Self::MIN_INTERVAL_MS))
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { interval_ms: 100 }
    }
}

/// Brush settings used when painting cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Radius of the painted disc in cells.
    pub radius: u32,
    /// Clears cells instead of setting them alive.
    pub eraser: bool,
}

impl BrushConfig {
    /// Largest permitted radius.
    pub const MAX_RADIUS: u32 = 16;
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius: 1,
            eraser: false,
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Mode active at start-up.
    pub mode: Mode,
    /// Grid extent used when no surface dictates one.
    pub dimensions: GridDimensions,
    /// Engine configuration.
    pub simulation: SimulationConfig,
    /// Audio settings.
    pub audio: AudioConfig,
    /// Update clock settings.
    pub clock: ClockConfig,
    /// Brush settings.
    pub brush: BrushConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Resources,
            dimensions: GridDimensions::new(160, 100),
            simulation: SimulationConfig::default(),
            audio: AudioConfig::default(),
            clock: ClockConfig::default(),
            brush: BrushConfig::default(),
        }
    }
}

impl AppConfig {
    /// Sanitises every nested record; see [`SimulationConfig::sanitized`].
    pub fn sanitized(mut self) -> Result<Self, ConfigError> {
        self.dimensions = GridDimensions::new(
            self.dimensions.columns().min(MAX_GRID_EXTENT),
            self.dimensions.rows().min(MAX_GRID_EXTENT),
        );
        self.simulation = self.simulation.sanitized()?;
        self.audio = self.audio.sanitized()?;
        self.clock.interval_ms = self.clock.interval_ms.max(ClockConfig::MIN_INTERVAL_MS);
        self.brush.radius = self.brush.radius.min(BrushConfig::MAX_RADIUS);
        Ok(self)
    }
}

fn clamp_finite(field: &'static str, value: f32, min: f32, max: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value.clamp(min, max))
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn ordered(field: &'static str, lower: f32, upper: f32) -> Result<(), ConfigError> {
    if lower < upper {
        Ok(())
    } else {
        Err(ConfigError::InvertedInterval {
            field,
            lower,
            upper,
        })
    }
}
