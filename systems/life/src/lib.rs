#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Discrete life-like automaton with optional species inheritance and an
//! optional consumable resource overlay.
//!
//! Cell values encode their state in a single integer:
//! - `0` is an empty cell;
//! - a positive value `species * 1000 + age` is a live cell;
//! - a negative value is a fading countdown left behind by a death, which
//!   increments toward zero every step and never counts as alive.

use convoy_core::{
    BoundaryPolicy, CellCoord, Field, Generator, GridDimensions, LifeConfig, Pulse, PulseKind,
    PulseSink, RenderStyle, ResourceConfig, ResourceField, SimulationConfig,
};
use convoy_rendering::{Color, Scene, Sprite};

/// Oldest age a live cell can reach.
pub const MAX_AGE: i32 = 999;
/// Number of species cycled through by Generations inheritance.
pub const NUM_SPECIES: i32 = 10;
/// Hue, in degrees, of each species.
pub const SPECIES_HUES: [f32; NUM_SPECIES as usize] =
    [200.0, 36.0, 300.0, 120.0, 50.0, 0.0, 240.0, 180.0, 270.0, 80.0];
/// Steps a dead cell keeps fading before it is drawn empty.
pub const FADE_STEPS: i32 = 20;
/// Resource level every cell starts with.
pub const INITIAL_RESOURCE: f32 = 100.0;

const SPECIES_STRIDE: i32 = 1_000;
const INITIAL_DENSITY: f64 = 0.25;
const SURVIVAL_FAILURE: f64 = 0.02;
const BIRTH_FAILURE: f64 = 0.05;
const STARVATION_LEVEL: f32 = 1.0;
const BIRTH_RESOURCE: f32 = 20.0;
const MAX_RESOURCE: f32 = 100.0;

/// Selects whether the automaton competes for resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Plain Classic/Generations automaton.
    Classic,
    /// Births and survival additionally depend on a resource overlay.
    ResourceConstrained,
}

/// Encodes a live cell of the provided species and age.
#[must_use]
pub const fn live_cell(species: i32, age: i32) -> i32 {
    species * SPECIES_STRIDE + age
}

/// Species of an encoded live cell.
#[must_use]
pub const fn species_of(value: i32) -> i32 {
    value / SPECIES_STRIDE
}

/// Age of an encoded live cell.
#[must_use]
pub const fn age_of(value: i32) -> i32 {
    value % SPECIES_STRIDE
}

/// State of the discrete automaton.
#[derive(Clone, Debug)]
pub struct LifeEngine {
    cells: Field<i32>,
    next: Field<i32>,
    resources: Option<ResourceField>,
    life: LifeConfig,
    rates: ResourceConfig,
    boundary: BoundaryPolicy,
}

impl LifeEngine {
    /// Seeds a fresh field where each cell is alive with probability 0.25.
    #[must_use]
    pub fn setup(
        dimensions: GridDimensions,
        config: &SimulationConfig,
        variant: Variant,
        rng: &mut Generator,
    ) -> Self {
        let generations = config.life.generations;
        let cells = Field::from_fn(dimensions, |_| {
            if !rng.chance(INITIAL_DENSITY) {
                return 0;
            }
            if generations {
                live_cell(rng.below(NUM_SPECIES as u32) as i32, 1)
            } else {
                1
            }
        });
        let resources = match variant {
            Variant::Classic => None,
            Variant::ResourceConstrained => Some(Field::filled(dimensions, INITIAL_RESOURCE)),
        };
        Self::from_fields(cells, resources, config)
    }

    /// Builds an engine from explicit fields.
    ///
    /// A resource field enables the resource-constrained variant.
    ///
    /// # Panics
    ///
    /// Panics when the resource field dimensions differ from the cell field.
    #[must_use]
    pub fn from_fields(
        cells: Field<i32>,
        resources: Option<ResourceField>,
        config: &SimulationConfig,
    ) -> Self {
        if let Some(resources) = &resources {
            assert_eq!(
                resources.dimensions(),
                cells.dimensions(),
                "resource overlay must match the cell field"
            );
        }
        Self {
            next: cells.clone(),
            cells,
            resources,
            life: config.life,
            rates: config.resources,
            boundary: config.boundary,
        }
    }

    /// Adopts parameters that take effect on the next step.
    pub fn configure(&mut self, config: &SimulationConfig) {
        self.life = config.life;
        self.rates = config.resources;
        self.boundary = config.boundary;
    }

    /// Current cell field.
    #[must_use]
    pub fn cells(&self) -> &Field<i32> {
        &self.cells
    }

    /// Resource overlay, present for the resource-constrained variant.
    #[must_use]
    pub fn resources(&self) -> Option<&ResourceField> {
        self.resources.as_ref()
    }

    /// Number of live cells.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.cells.as_slice().iter().filter(|value| **value > 0).count()
    }

    /// Advances the automaton by one step, reporting births and deaths.
    ///
    /// Resource checks read the overlay as it was before this step; the
    /// overlay is then replenished or consumed against the new field.
    pub fn step<S>(&mut self, rng: &mut Generator, sink: &mut S)
    where
        S: PulseSink + ?Sized,
    {
        let dimensions = self.cells.dimensions();
        let survival = self.life.rules.survival();
        let birth = self.life.rules.birth();

        for row in 0..dimensions.rows() {
            for column in 0..dimensions.columns() {
                let (live, oldest) = self.count_live(column, row);
                let current = self.cells.get(column, row);
                let resource = self
                    .resources
                    .as_ref()
                    .map(|resources| resources.get(column, row));

                let next = if current > 0 {
                    let mut dies = !survival.contains(live);
                    if self.life.probabilistic && rng.chance(SURVIVAL_FAILURE) {
                        dies = true;
                    }
                    if resource.is_some_and(|level| level <= STARVATION_LEVEL) {
                        dies = true;
                    }

                    if dies {
                        sink.record(Pulse::at_cell(
                            column,
                            row,
                            dimensions,
                            PulseKind::Death,
                            1.0,
                        ));
                        if self.life.fade {
                            -FADE_STEPS
                        } else {
                            0
                        }
                    } else {
                        live_cell(species_of(current), (age_of(current) + 1).min(MAX_AGE))
                    }
                } else {
                    let mut born = birth.contains(live);
                    if self.life.probabilistic && rng.chance(BIRTH_FAILURE) {
                        born = false;
                    }
                    if resource.is_some_and(|level| level < BIRTH_RESOURCE) {
                        born = false;
                    }

                    if born {
                        sink.record(Pulse::at_cell(
                            column,
                            row,
                            dimensions,
                            PulseKind::Birth,
                            1.0,
                        ));
                        if self.life.generations {
                            live_cell((species_of(oldest) + 1) % NUM_SPECIES, 1)
                        } else {
                            1
                        }
                    } else if current < 0 {
                        current + 1
                    } else {
                        0
                    }
                };
                self.next.set(column, row, next);
            }
        }

        std::mem::swap(&mut self.cells, &mut self.next);
        if let Some(resources) = &mut self.resources {
            replenish(resources, &self.cells, self.rates);
        }
    }

    /// Sets or clears a disc of cells, returning the number of cells written.
    pub fn paint(
        &mut self,
        centre: CellCoord,
        radius: u32,
        erase: bool,
        rng: &mut Generator,
    ) -> u32 {
        let mut painted = 0;
        for cell in self.cells.dimensions().disc(centre, radius) {
            let value = if erase {
                0
            } else if self.life.generations {
                live_cell(rng.below(NUM_SPECIES as u32) as i32, 1)
            } else {
                1
            };
            self.cells.set(cell.column(), cell.row(), value);
            painted += 1;
        }
        painted
    }

    /// Draws the resource overlay, live cells, and fading cells.
    pub fn render(&self, scene: &mut Scene) {
        if let Some(resources) = &self.resources {
            let soil = Color::from_rgb_u8(10, 50, 20);
            for (cell, level) in resources.iter() {
                let amount = level / MAX_RESOURCE;
                if amount > 0.01 {
                    scene.push(Sprite::cell(
                        cell.column(),
                        cell.row(),
                        RenderStyle::Squares,
                        soil.with_alpha(amount * 0.8),
                    ));
                }
            }
        }

        let ash = Color::from_rgb_u8(200, 200, 200);
        for (cell, value) in self.cells.iter() {
            if value > 0 {
                scene.push(Sprite::cell(
                    cell.column(),
                    cell.row(),
                    self.life.render_style,
                    live_color(value, self.life.generations),
                ));
            } else if value < 0 {
                let remaining = 1.0 - value.unsigned_abs() as f32 / FADE_STEPS as f32;
                scene.push(Sprite::cell(
                    cell.column(),
                    cell.row(),
                    RenderStyle::Squares,
                    ash.with_alpha(remaining * 0.4),
                ));
            }
        }
    }

    fn count_live(&self, column: u32, row: u32) -> (u32, i32) {
        let dimensions = self.cells.dimensions();
        let mut live = 0;
        let mut oldest = 0;
        for &(dx, dy) in self.life.neighborhood.offsets() {
            let Some((x, y)) = dimensions.neighbor(column, row, dx, dy, self.boundary) else {
                continue;
            };
            let value = self.cells.get(x, y);
            if value > 0 {
                live += 1;
                oldest = oldest.max(value);
            }
        }
        (live, oldest)
    }
}

fn replenish(resources: &mut ResourceField, cells: &Field<i32>, rates: ResourceConfig) {
    for (level, value) in resources
        .as_mut_slice()
        .iter_mut()
        .zip(cells.as_slice().iter())
    {
        let delta = if *value > 0 {
            -rates.consumption_rate
        } else {
            rates.regeneration_rate
        };
        *level = (*level + delta).clamp(0.0, MAX_RESOURCE);
    }
}

fn live_color(value: i32, generations: bool) -> Color {
    let age = age_of(value) as f32;
    if generations {
        let species = species_of(value).clamp(0, NUM_SPECIES - 1) as usize;
        Color::from_hsl(
            SPECIES_HUES[species],
            100.0,
            90.0 - age / MAX_AGE as f32 * 40.0,
        )
    } else {
        Color::from_hsl(210.0, 100.0, 100.0 - age.min(250.0) / 250.0 * 50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{age_of, live_cell, live_color, species_of};

    #[test]
    fn encoding_splits_species_and_age() {
        let value = live_cell(7, 42);
        assert_eq!(species_of(value), 7);
        assert_eq!(age_of(value), 42);
    }

    #[test]
    fn young_cells_are_brighter() {
        let young = live_color(1, false);
        let old = live_color(300, false);
        assert!(young.red > old.red);
    }
}
