#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Continuous ("smooth") automaton over activations in `[0, 1]`.

use convoy_core::{
    BoundaryPolicy, CellCoord, Field, Generator, GridDimensions, Pulse, PulseKind, PulseSink,
    SimulationConfig, SmoothConfig, SmoothPalette,
};
use convoy_rendering::{Color, Scene, Sprite};

const SEED_DENSITY: f64 = 0.1;
const VISIBLE_ACTIVATION: f32 = 0.01;

/// State of the continuous automaton.
#[derive(Clone, Debug)]
pub struct SmoothEngine {
    cells: Field<f32>,
    next: Field<f32>,
    config: SmoothConfig,
    boundary: BoundaryPolicy,
}

impl SmoothEngine {
    /// Seeds 10% of the cells with a uniform random activation.
    #[must_use]
    pub fn setup(
        dimensions: GridDimensions,
        config: &SimulationConfig,
        rng: &mut Generator,
    ) -> Self {
        let cells = Field::from_fn(dimensions, |_| {
            if rng.chance(SEED_DENSITY) {
                rng.next_unit() as f32
            } else {
                0.0
            }
        });
        Self::from_field(cells, config)
    }

    /// Builds an engine from an explicit activation field.
    #[must_use]
    pub fn from_field(cells: Field<f32>, config: &SimulationConfig) -> Self {
        Self {
            next: cells.clone(),
            cells,
            config: config.smooth,
            boundary: config.boundary,
        }
    }

    /// Adopts parameters that take effect on the next step.
    pub fn configure(&mut self, config: &SimulationConfig) {
        self.config = config.smooth;
        self.boundary = config.boundary;
    }

    /// Current activation field.
    #[must_use]
    pub fn cells(&self) -> &Field<f32> {
        &self.cells
    }

    /// Advances every cell by one explicit Euler step.
    ///
    /// Crossing the activation threshold upward reports a birth, downward a
    /// death, weighted by the magnitude of the applied change.
    pub fn step<S>(&mut self, sink: &mut S)
    where
        S: PulseSink + ?Sized,
    {
        let dimensions = self.cells.dimensions();
        let params = self.config.params();
        let threshold = self.config.activation_threshold;
        let offsets = self.config.neighborhood.offsets();

        for row in 0..dimensions.rows() {
            for column in 0..dimensions.columns() {
                let mut sum = 0.0;
                let mut count = 0_u32;
                for &(dx, dy) in offsets {
                    if let Some((x, y)) = dimensions.neighbor(column, row, dx, dy, self.boundary) {
                        sum += self.cells.get(x, y);
                        count += 1;
                    }
                }
                let local = if count == 0 { 0.0 } else { sum / count as f32 };

                let value = self.cells.get(column, row);
                let birth = indicator(local > params.birth_min && local < params.birth_max);
                let survive =
                    indicator(local > params.survival_min && local < params.survival_max);
                let delta = params.rate
                    * (birth * (1.0 - value) + survive * value - (1.0 - survive) * value);
                let updated = (value + delta).clamp(0.0, 1.0);
                self.next.set(column, row, updated);

                let was_active = value > threshold;
                let is_active = updated > threshold;
                if was_active != is_active {
                    let kind = if is_active {
                        PulseKind::Birth
                    } else {
                        PulseKind::Death
                    };
                    sink.record(Pulse::at_cell(column, row, dimensions, kind, delta.abs()));
                }
            }
        }

        std::mem::swap(&mut self.cells, &mut self.next);
    }

    /// Sets a disc of cells to full activation or clears it.
    pub fn paint(&mut self, centre: CellCoord, radius: u32, erase: bool) -> u32 {
        let value = if erase { 0.0 } else { 1.0 };
        let mut painted = 0;
        for cell in self.cells.dimensions().disc(centre, radius) {
            self.cells.set(cell.column(), cell.row(), value);
            painted += 1;
        }
        painted
    }

    /// Draws every visibly active cell using the configured palette.
    pub fn render(&self, scene: &mut Scene) {
        for (cell, value) in self.cells.iter() {
            if value > VISIBLE_ACTIVATION {
                scene.push(Sprite::cell_fill(
                    cell.column(),
                    cell.row(),
                    palette_color(self.config.palette, value),
                ));
            }
        }
    }
}

fn indicator(condition: bool) -> f32 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn palette_color(palette: SmoothPalette, value: f32) -> Color {
    match palette {
        SmoothPalette::Cyan => Color::from_hsl(190.0, 100.0, value * 100.0),
        SmoothPalette::Magma => {
            Color::from_hsl(20.0 + value * 40.0, 100.0, (50.0 + value * 50.0).min(95.0))
        }
        SmoothPalette::Forest => {
            Color::from_hsl(90.0 + value * 40.0, 85.0, (value * 70.0).max(20.0))
        }
        SmoothPalette::Psychedelic => Color::from_hsl(value * 360.0, 100.0, 55.0),
    }
}
