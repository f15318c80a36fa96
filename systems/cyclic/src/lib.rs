#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cyclic cellular automaton: each cell advances through a ring of states
//! once enough neighbours already hold its successor.

use convoy_core::{
    BoundaryPolicy, CellCoord, CyclicConfig, Field, Generator, GridDimensions, Neighborhood,
    Pulse, PulseKind, PulseSink, RenderStyle, SimulationConfig,
};
use convoy_rendering::{Color, Scene, Sprite};

/// State of the cyclic automaton.
#[derive(Clone, Debug)]
pub struct CyclicEngine {
    cells: Field<u16>,
    next: Field<u16>,
    config: CyclicConfig,
    boundary: BoundaryPolicy,
}

impl CyclicEngine {
    /// Seeds every cell with a uniformly random state.
    #[must_use]
    pub fn setup(
        dimensions: GridDimensions,
        config: &SimulationConfig,
        rng: &mut Generator,
    ) -> Self {
        let states = u32::from(config.cyclic.states.max(1));
        let cells = Field::from_fn(dimensions, |_| rng.below(states) as u16);
        Self::from_field(cells, config)
    }

    /// Builds an engine from an explicit state field.
    #[must_use]
    pub fn from_field(cells: Field<u16>, config: &SimulationConfig) -> Self {
        Self {
            next: cells.clone(),
            cells,
            config: config.cyclic,
            boundary: config.boundary,
        }
    }

    /// Adopts parameters that take effect on the next step.
    pub fn configure(&mut self, config: &SimulationConfig) {
        self.config.threshold = config.cyclic.threshold;
        self.boundary = config.boundary;
    }

    /// Current state field.
    #[must_use]
    pub fn cells(&self) -> &Field<u16> {
        &self.cells
    }

    /// Number of states in the ring.
    #[must_use]
    pub const fn states(&self) -> u16 {
        self.config.states
    }

    /// Advances every cell whose successor is held by at least `threshold`
    /// of its eight neighbours, reporting each advance as a birth.
    pub fn step<S>(&mut self, sink: &mut S)
    where
        S: PulseSink + ?Sized,
    {
        let dimensions = self.cells.dimensions();
        let states = self.config.states.max(1);
        let threshold = u32::from(self.config.threshold);

        for row in 0..dimensions.rows() {
            for column in 0..dimensions.columns() {
                let current = self.cells.get(column, row);
                let successor = (current + 1) % states;
                let mut matching = 0_u32;
                for &(dx, dy) in Neighborhood::Moore.offsets() {
                    if let Some((x, y)) = dimensions.neighbor(column, row, dx, dy, self.boundary) {
                        if self.cells.get(x, y) == successor {
                            matching += 1;
                        }
                    }
                }

                if matching >= threshold {
                    self.next.set(column, row, successor);
                    sink.record(Pulse::at_cell(
                        column,
                        row,
                        dimensions,
                        PulseKind::Birth,
                        1.0,
                    ));
                } else {
                    self.next.set(column, row, current);
                }
            }
        }

        std::mem::swap(&mut self.cells, &mut self.next);
    }

    /// Resets a disc of cells to state zero.
    ///
    /// Painting and erasing both synchronise cells to the first state.
    pub fn paint(&mut self, centre: CellCoord, radius: u32) -> u32 {
        let mut painted = 0;
        for cell in self.cells.dimensions().disc(centre, radius) {
            self.cells.set(cell.column(), cell.row(), 0);
            painted += 1;
        }
        painted
    }

    /// Draws every cell with a hue proportional to its state.
    pub fn render(&self, scene: &mut Scene) {
        let states = f32::from(self.config.states.max(1));
        for (cell, state) in self.cells.iter() {
            scene.push(Sprite::cell(
                cell.column(),
                cell.row(),
                RenderStyle::Squares,
                Color::from_hsl(f32::from(state) / states * 360.0, 90.0, 55.0),
            ));
        }
    }
}
