#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Convoy simulator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for the
//! orchestrator to react to. Engines never talk to the audio layer directly:
//! they report [`Pulse`] values through a [`PulseSink`] and the orchestrator
//! forwards the selected pulses downstream.

mod config;
mod field;
mod generator;

use serde::{Deserialize, Serialize};

pub use config::{
    AppConfig, AudioConfig, BrushConfig, ClockConfig, ConfigError, CyclicConfig, FlockConfig,
    LifeConfig, NeighborCounts, RulePreset, RuleSet, ResourceConfig, SimulationConfig,
    SmoothConfig, SmoothPalette, SmoothParams, SmoothPreset, WalkerConfig,
};
pub use field::{Field, ResourceField};
pub use generator::Generator;

/// Number of world units spanned by a single grid cell.
///
/// Agent modes operate in world units so their perception radii and speeds
/// stay independent of the grid resolution.
pub const CELL_UNITS: f32 = 8.0;

/// Simulation mode selected from the fixed enumeration of engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Classic or Generations life-like automaton.
    Classic,
    /// Classic automaton constrained by a consumable resource overlay.
    #[default]
    Resources,
    /// Continuous ("smooth") automaton with float activations.
    Smooth,
    /// Cyclic automaton advancing through a ring of states.
    Cyclic,
    /// Ant-like walkers flipping a binary field.
    Walkers,
    /// Boid-like flocking agents.
    Flock,
}

impl Mode {
    /// Every selectable mode in presentation order.
    pub const ALL: [Mode; 6] = [
        Mode::Classic,
        Mode::Resources,
        Mode::Smooth,
        Mode::Cyclic,
        Mode::Walkers,
        Mode::Flock,
    ];

    /// Number of pulses the selection pipeline forwards per step for the mode.
    #[must_use]
    pub const fn selection_capacity(self) -> usize {
        match self {
            Self::Flock => 2,
            _ => 3,
        }
    }

    /// Reports whether brush painting applies to the mode's field.
    #[must_use]
    pub const fn accepts_paint(self) -> bool {
        !matches!(self, Self::Flock)
    }

    /// Human readable label for adapters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Resources => "Resources",
            Self::Smooth => "Smooth",
            Self::Cyclic => "Cyclic",
            Self::Walkers => "Walkers",
            Self::Flock => "Flock",
        }
    }

    /// Mode following `self` in [`Mode::ALL`], wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        let index = Self::ALL
            .iter()
            .position(|mode| *mode == self)
            .unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// Boundary handling shared by every mode that has bounded coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Edges connect to the opposite edge.
    Wrap,
    /// Coordinates beyond the edge do not exist; agents are reflected inward.
    #[default]
    Clamp,
}

/// Neighbour topology used by the discrete and continuous automata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// Eight-connected neighbourhood.
    #[default]
    Moore,
    /// Four-connected, orthogonal-only neighbourhood.
    VonNeumann,
}

const MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const VON_NEUMANN_OFFSETS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

impl Neighborhood {
    /// Column/row offsets visited by the neighbourhood in row-major order.
    #[must_use]
    pub fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            Self::Moore => &MOORE_OFFSETS,
            Self::VonNeumann => &VON_NEUMANN_OFFSETS,
        }
    }
}

/// Visual style applied to discrete automaton cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderStyle {
    /// Filled squares separated by a thin gap.
    #[default]
    Squares,
    /// Filled circles inscribed in each cell.
    Circles,
    /// Squares surrounded by a soft glow.
    Glow,
}

/// Synthesis algorithm used to voice selected pulses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VoiceAlgorithm {
    /// Single oscillator: triangle for births, square for deaths.
    #[default]
    Classic,
    /// Sine chirp for births, filtered noise burst for deaths.
    Percussion,
    /// Major triad for births, low sawtooth for deaths.
    Harps,
}

impl VoiceAlgorithm {
    /// Algorithm following `self`, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Classic => Self::Percussion,
            Self::Percussion => Self::Harps,
            Self::Harps => Self::Classic,
        }
    }
}

/// Rectangular grid dimensions, fixed for the lifetime of a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    columns: u32,
    rows: u32,
}

impl GridDimensions {
    /// Creates dimensions, promoting zero extents to a single cell.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns: if columns == 0 { 1 } else { columns },
            rows: if rows == 0 { 1 } else { rows },
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Width of the grid in world units.
    #[must_use]
    pub fn width_units(&self) -> f32 {
        self.columns as f32 * CELL_UNITS
    }

    /// Height of the grid in world units.
    #[must_use]
    pub fn height_units(&self) -> f32 {
        self.rows as f32 * CELL_UNITS
    }

    /// Dense row-major index of the provided cell, if it lies inside the grid.
    #[must_use]
    pub const fn index_of(&self, column: u32, row: u32) -> Option<usize> {
        if column < self.columns && row < self.rows {
            Some(row as usize * self.columns as usize + column as usize)
        } else {
            None
        }
    }

    /// Resolves the neighbour of `(column, row)` displaced by `(dx, dy)`.
    ///
    /// Under [`BoundaryPolicy::Wrap`] the coordinate is reduced modulo the
    /// dimensions; under [`BoundaryPolicy::Clamp`] out-of-range neighbours do
    /// not exist and `None` is returned.
    #[must_use]
    pub fn neighbor(
        &self,
        column: u32,
        row: u32,
        dx: i32,
        dy: i32,
        policy: BoundaryPolicy,
    ) -> Option<(u32, u32)> {
        let columns = i64::from(self.columns);
        let rows = i64::from(self.rows);
        let x = i64::from(column) + i64::from(dx);
        let y = i64::from(row) + i64::from(dy);
        match policy {
            BoundaryPolicy::Wrap => Some((x.rem_euclid(columns) as u32, y.rem_euclid(rows) as u32)),
            BoundaryPolicy::Clamp => {
                if x < 0 || y < 0 || x >= columns || y >= rows {
                    None
                } else {
                    Some((x as u32, y as u32))
                }
            }
        }
    }

    /// Cells of a brush disc: every in-grid cell within `radius + 0.5` of
    /// `centre`, visited row by row. The disc never wraps across edges.
    pub fn disc(&self, centre: CellCoord, radius: u32) -> impl Iterator<Item = CellCoord> {
        let dimensions = *self;
        let reach = i64::from(radius);
        let limit = f64::from(radius) + 0.5;
        (-reach..=reach)
            .flat_map(move |dy| (-reach..=reach).map(move |dx| (dx, dy)))
            .filter(move |(dx, dy)| ((dx * dx + dy * dy) as f64).sqrt() <= limit)
            .filter_map(move |(dx, dy)| {
                let column = i64::from(centre.column()) + dx;
                let row = i64::from(centre.row()) + dy;
                if column < 0
                    || row < 0
                    || column >= i64::from(dimensions.columns)
                    || row >= i64::from(dimensions.rows)
                {
                    None
                } else {
                    Some(CellCoord::new(column as u32, row as u32))
                }
            })
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Four-way heading used by walker agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Headings indexed clockwise starting from north.
    pub const CLOCKWISE: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column/row displacement of a single step in this heading.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Heading after a quarter turn clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Heading after a quarter turn counter-clockwise.
    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::East => Self::North,
            Self::South => Self::East,
            Self::West => Self::South,
        }
    }
}

/// Kind of simulation transition carried by a [`Pulse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PulseKind {
    /// A cell became alive or an agent produced a constructive event.
    Birth,
    /// A cell died or agents came dangerously close.
    Death,
}

/// Weighted simulation event destined for the audio layer.
///
/// Positions are normalised to `[0, 1]` so consumers never need to know the
/// grid resolution or the world extent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    x: f32,
    y: f32,
    kind: PulseKind,
    weight: f32,
}

impl Pulse {
    /// Creates a pulse at a normalised position, clamping inputs to their domains.
    #[must_use]
    pub fn new(x: f32, y: f32, kind: PulseKind, weight: f32) -> Self {
        Self {
            x: unit_or_zero(x),
            y: unit_or_zero(y),
            kind,
            weight: if weight.is_finite() { weight.max(0.0) } else { f32::MAX },
        }
    }

    /// Creates a pulse located at the top-left corner of a grid cell.
    #[must_use]
    pub fn at_cell(
        column: u32,
        row: u32,
        dimensions: GridDimensions,
        kind: PulseKind,
        weight: f32,
    ) -> Self {
        Self::new(
            column as f32 / dimensions.columns() as f32,
            row as f32 / dimensions.rows() as f32,
            kind,
            weight,
        )
    }

    /// Normalised horizontal position.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Normalised vertical position.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Transition kind.
    #[must_use]
    pub const fn kind(&self) -> PulseKind {
        self.kind
    }

    /// Non-negative priority weight.
    #[must_use]
    pub const fn weight(&self) -> f32 {
        self.weight
    }
}

fn unit_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Receiver of the raw pulse stream produced by an engine step.
pub trait PulseSink {
    /// Records a single pulse.
    fn record(&mut self, pulse: Pulse);
}

impl PulseSink for Vec<Pulse> {
    fn record(&mut self, pulse: Pulse) {
        self.push(pulse);
    }
}

/// Outcome of a single simulation step after top-K selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepSummary {
    /// Monotonic step counter since the last setup.
    pub tick: u64,
    /// Total raw pulses produced by the step, before selection.
    pub total_pulses: u32,
    /// Raw birth pulses produced by the step.
    pub births: u32,
    /// Pulses retained for voicing, sorted by descending weight.
    pub selected: Vec<Pulse>,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Allocates fresh state for the active mode at the provided dimensions.
    ///
    /// Issued on initial start and whenever the presentation surface resizes.
    Setup {
        /// Grid extent for the new simulation.
        dimensions: GridDimensions,
    },
    /// Discards the current state and runs setup again with unchanged dimensions.
    Reset,
    /// Switches to another mode, discarding all state of the current one.
    SelectMode {
        /// Mode to activate.
        mode: Mode,
    },
    /// Replaces the simulation configuration.
    ///
    /// Values must already be sanitised at the configuration boundary.
    Configure {
        /// New configuration.
        config: Box<SimulationConfig>,
    },
    /// Advances the active engine by exactly one simulation tick.
    Step,
    /// Sets or clears a disc of cells around the provided centre.
    Paint {
        /// Centre cell of the brush.
        cell: CellCoord,
        /// Brush radius in cells.
        radius: u32,
        /// Clears cells instead of setting them alive.
        erase: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A setup call allocated fresh state.
    SimulationReset {
        /// Mode that was set up.
        mode: Mode,
        /// Dimensions of the new field.
        dimensions: GridDimensions,
        /// Setup counter used to derive the generator stream.
        generation: u64,
    },
    /// The active mode changed.
    ModeChanged {
        /// Newly active mode.
        mode: Mode,
    },
    /// A simulation step completed.
    Stepped {
        /// Selected pulses and activity counts for the step.
        summary: StepSummary,
    },
    /// A brush stroke modified the field.
    Painted {
        /// Number of cells written by the stroke.
        cells: u32,
    },
    /// A configuration change was applied.
    Reconfigured {
        /// Whether the change forced a fresh setup.
        restarted: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        BoundaryPolicy, CellCoord, Direction, GridDimensions, Mode, Neighborhood, Pulse, PulseKind,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn wrap_neighbor_crosses_edges() {
        let dimensions = GridDimensions::new(5, 4);
        assert_eq!(
            dimensions.neighbor(4, 0, 1, -1, BoundaryPolicy::Wrap),
            Some((0, 3))
        );
        assert_eq!(
            dimensions.neighbor(0, 3, -1, 1, BoundaryPolicy::Wrap),
            Some((4, 0))
        );
    }

    #[test]
    fn clamp_neighbor_skips_out_of_range() {
        let dimensions = GridDimensions::new(5, 4);
        assert_eq!(dimensions.neighbor(4, 0, 1, 0, BoundaryPolicy::Clamp), None);
        assert_eq!(
            dimensions.neighbor(2, 2, -1, 1, BoundaryPolicy::Clamp),
            Some((1, 3))
        );
    }

    #[test]
    fn brush_disc_stays_inside_grid() {
        let dimensions = GridDimensions::new(10, 10);
        let centre = CellCoord::new(5, 5);
        assert_eq!(dimensions.disc(centre, 0).collect::<Vec<_>>(), vec![centre]);
        assert_eq!(dimensions.disc(centre, 1).count(), 9);
        assert_eq!(dimensions.disc(centre, 2).count(), 21);

        let corner: Vec<_> = dimensions.disc(CellCoord::new(0, 0), 1).collect();
        assert_eq!(
            corner,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1)
            ]
        );
    }

    #[test]
    fn zero_dimensions_are_promoted() {
        let dimensions = GridDimensions::new(0, 0);
        assert_eq!(dimensions.cell_count(), 1);
    }

    #[test]
    fn neighborhoods_exclude_centre() {
        assert_eq!(Neighborhood::Moore.offsets().len(), 8);
        assert_eq!(Neighborhood::VonNeumann.offsets().len(), 4);
        assert!(Neighborhood::Moore
            .offsets()
            .iter()
            .all(|offset| *offset != (0, 0)));
        assert!(Neighborhood::VonNeumann
            .offsets()
            .iter()
            .all(|(dx, dy)| dx.abs() + dy.abs() == 1));
    }

    #[test]
    fn turning_four_times_returns_to_start() {
        for heading in Direction::CLOCKWISE {
            let turned = heading.clockwise().clockwise().clockwise().clockwise();
            assert_eq!(turned, heading);
            assert_eq!(heading.clockwise().counter_clockwise(), heading);
        }
    }

    #[test]
    fn pulse_clamps_position_and_weight() {
        let pulse = Pulse::new(1.5, -0.25, PulseKind::Death, -3.0);
        assert_eq!(pulse.x(), 1.0);
        assert_eq!(pulse.y(), 0.0);
        assert_eq!(pulse.weight(), 0.0);
    }

    #[test]
    fn pulse_position_is_resolution_independent() {
        let pulse = Pulse::at_cell(5, 2, GridDimensions::new(10, 8), PulseKind::Birth, 1.0);
        assert!((pulse.x() - 0.5).abs() < f32::EPSILON);
        assert!((pulse.y() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn flock_selects_fewer_pulses() {
        assert_eq!(Mode::Flock.selection_capacity(), 2);
        assert_eq!(Mode::Smooth.selection_capacity(), 3);
        assert!(!Mode::Flock.accepts_paint());
        assert_eq!(Mode::Flock.next(), Mode::Classic);
    }

    #[test]
    fn mode_round_trips_through_bincode() {
        for mode in Mode::ALL {
            assert_round_trip(&mode);
        }
    }

    #[test]
    fn pulse_round_trips_through_bincode() {
        assert_round_trip(&Pulse::new(0.3, 0.7, PulseKind::Birth, 2.5));
    }
}
