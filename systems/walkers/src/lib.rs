#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ant-like walkers that flip a binary field as they move.

use convoy_core::{
    BoundaryPolicy, CellCoord, Direction, Field, Generator, GridDimensions, Pulse, PulseKind,
    PulseSink, RenderStyle, SimulationConfig, WalkerConfig,
};
use convoy_rendering::{Color, Scene, Sprite};

const SCATTER_CELLS: f64 = 20.0;

/// Single walker positioned on a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Walker {
    cell: CellCoord,
    heading: Direction,
}

impl Walker {
    /// Creates a walker at the provided cell.
    #[must_use]
    pub const fn new(cell: CellCoord, heading: Direction) -> Self {
        Self { cell, heading }
    }

    /// Cell currently occupied by the walker.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Heading the walker will move along next.
    #[must_use]
    pub const fn heading(&self) -> Direction {
        self.heading
    }
}

/// State of the walker mode.
#[derive(Clone, Debug)]
pub struct WalkerEngine {
    cells: Field<u8>,
    walkers: Vec<Walker>,
    config: WalkerConfig,
    boundary: BoundaryPolicy,
}

impl WalkerEngine {
    /// Creates an empty field with walkers scattered around its centre.
    #[must_use]
    pub fn setup(
        dimensions: GridDimensions,
        config: &SimulationConfig,
        rng: &mut Generator,
    ) -> Self {
        let walkers = (0..config.walkers.count)
            .map(|_| {
                let column = scatter(dimensions.columns(), rng);
                let row = scatter(dimensions.rows(), rng);
                let heading = Direction::CLOCKWISE[rng.below(4) as usize];
                Walker::new(CellCoord::new(column, row), heading)
            })
            .collect();
        Self::from_parts(Field::filled(dimensions, 0), walkers, config)
    }

    /// Builds an engine from an explicit field and walker set.
    ///
    /// Walkers outside the field are clamped onto its nearest cell.
    #[must_use]
    pub fn from_parts(cells: Field<u8>, walkers: Vec<Walker>, config: &SimulationConfig) -> Self {
        let dimensions = cells.dimensions();
        let walkers = walkers
            .into_iter()
            .map(|walker| {
                Walker::new(
                    CellCoord::new(
                        walker.cell.column().min(dimensions.columns() - 1),
                        walker.cell.row().min(dimensions.rows() - 1),
                    ),
                    walker.heading,
                )
            })
            .collect();
        Self {
            cells,
            walkers,
            config: config.walkers,
            boundary: config.boundary,
        }
    }

    /// Adopts parameters that take effect on the next step.
    pub fn configure(&mut self, config: &SimulationConfig) {
        self.config.micro_steps = config.walkers.micro_steps;
        self.boundary = config.boundary;
    }

    /// Current binary field.
    #[must_use]
    pub fn cells(&self) -> &Field<u8> {
        &self.cells
    }

    /// Current walkers.
    #[must_use]
    pub fn walkers(&self) -> &[Walker] {
        &self.walkers
    }

    /// Runs `micro_steps` moves for every walker.
    ///
    /// Each move flips the occupied cell and reports a birth when the cell
    /// was set, a death when it was cleared.
    pub fn step<S>(&mut self, sink: &mut S)
    where
        S: PulseSink + ?Sized,
    {
        for _ in 0..self.config.micro_steps {
            for index in 0..self.walkers.len() {
                let walker = self.walkers[index];
                self.walkers[index] = self.advance(walker, sink);
            }
        }
    }

    /// Sets or clears a disc of field cells.
    pub fn paint(&mut self, centre: CellCoord, radius: u32, erase: bool) -> u32 {
        let value = u8::from(!erase);
        let mut painted = 0;
        for cell in self.cells.dimensions().disc(centre, radius) {
            self.cells.set(cell.column(), cell.row(), value);
            painted += 1;
        }
        painted
    }

    /// Draws set cells in grey and walkers in red.
    pub fn render(&self, scene: &mut Scene) {
        let trail = Color::from_rgb_u8(0xcc, 0xcc, 0xcc);
        for (cell, value) in self.cells.iter() {
            if value == 1 {
                scene.push(Sprite::cell(
                    cell.column(),
                    cell.row(),
                    RenderStyle::Squares,
                    trail,
                ));
            }
        }

        let body = Color::from_hsl(0.0, 100.0, 60.0);
        for walker in &self.walkers {
            scene.push(Sprite::cell_fill(
                walker.cell.column(),
                walker.cell.row(),
                body,
            ));
        }
    }

    fn advance<S>(&mut self, walker: Walker, sink: &mut S) -> Walker
    where
        S: PulseSink + ?Sized,
    {
        let dimensions = self.cells.dimensions();
        let Walker { cell, heading } = walker;

        let (heading, value, kind) = if self.cells.get(cell.column(), cell.row()) == 0 {
            (heading.clockwise(), 1, PulseKind::Birth)
        } else {
            (heading.counter_clockwise(), 0, PulseKind::Death)
        };
        self.cells.set(cell.column(), cell.row(), value);
        sink.record(Pulse::at_cell(cell.column(), cell.row(), dimensions, kind, 1.0));

        let (dx, dy) = heading.offset();
        let column = i64::from(cell.column()) + i64::from(dx);
        let row = i64::from(cell.row()) + i64::from(dy);
        let columns = i64::from(dimensions.columns());
        let rows = i64::from(dimensions.rows());

        match self.boundary {
            BoundaryPolicy::Wrap => Walker::new(
                CellCoord::new(
                    column.rem_euclid(columns) as u32,
                    row.rem_euclid(rows) as u32,
                ),
                heading,
            ),
            BoundaryPolicy::Clamp => {
                let mut heading = heading;
                let column = if column >= columns {
                    heading = Direction::West;
                    columns - 1
                } else if column < 0 {
                    heading = Direction::East;
                    0
                } else {
                    column
                };
                let row = if row >= rows {
                    heading = Direction::North;
                    rows - 1
                } else if row < 0 {
                    heading = Direction::South;
                    0
                } else {
                    row
                };
                Walker::new(CellCoord::new(column as u32, row as u32), heading)
            }
        }
    }
}

fn scatter(extent: u32, rng: &mut Generator) -> u32 {
    let offset = (rng.next_unit() - 0.5) * SCATTER_CELLS;
    let position = (f64::from(extent) / 2.0 + offset).floor();
    position.clamp(0.0, f64::from(extent - 1)) as u32
}
