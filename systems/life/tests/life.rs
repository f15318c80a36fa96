use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use convoy_core::{
    BoundaryPolicy, CellCoord, Field, Generator, GridDimensions, Neighborhood, Pulse, PulseKind,
    RulePreset, SimulationConfig,
};
use convoy_system_life::{live_cell, species_of, LifeEngine, Variant, FADE_STEPS};
use convoy_system_selection::TopK;

fn config(preset: RulePreset, boundary: BoundaryPolicy) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.life.rules = preset.rules();
    config.boundary = boundary;
    config
}

fn field_with(dimensions: GridDimensions, live: &[(u32, u32)]) -> Field<i32> {
    let mut cells = Field::filled(dimensions, 0);
    for &(column, row) in live {
        cells.set(column, row, 1);
    }
    cells
}

fn live_cells(engine: &LifeEngine) -> Vec<CellCoord> {
    engine
        .cells()
        .iter()
        .filter(|(_, value)| *value > 0)
        .map(|(cell, _)| cell)
        .collect()
}

fn step(engine: &mut LifeEngine) -> Vec<Pulse> {
    let mut rng = Generator::from_seed(0);
    let mut pulses = Vec::new();
    engine.step(&mut rng, &mut pulses);
    pulses
}

#[test]
fn blinker_oscillates_with_period_two() {
    let dimensions = GridDimensions::new(8, 8);
    let vertical = [(3, 2), (3, 3), (3, 4)];
    let horizontal = [(2, 3), (3, 3), (4, 3)];
    let mut engine = LifeEngine::from_fields(
        field_with(dimensions, &vertical),
        None,
        &config(RulePreset::Life, BoundaryPolicy::Wrap),
    );

    let as_cells = |cells: &[(u32, u32)]| {
        let mut cells: Vec<CellCoord> = cells
            .iter()
            .map(|&(column, row)| CellCoord::new(column, row))
            .collect();
        cells.sort_by_key(|cell| (cell.row(), cell.column()));
        cells
    };

    for generation in 0..12 {
        let _ = step(&mut engine);
        let expected = if generation % 2 == 0 {
            as_cells(&horizontal)
        } else {
            as_cells(&vertical)
        };
        assert_eq!(live_cells(&engine), expected, "generation {generation}");
    }
}

#[test]
fn blinker_step_reports_births_and_deaths() {
    let dimensions = GridDimensions::new(8, 8);
    let mut engine = LifeEngine::from_fields(
        field_with(dimensions, &[(3, 2), (3, 3), (3, 4)]),
        None,
        &config(RulePreset::Life, BoundaryPolicy::Wrap),
    );

    let pulses = step(&mut engine);
    let births = pulses
        .iter()
        .filter(|pulse| pulse.kind() == PulseKind::Birth)
        .count();
    let deaths = pulses.len() - births;
    assert_eq!(births, 2);
    assert_eq!(deaths, 2);
    assert!(pulses.iter().all(|pulse| pulse.weight() == 1.0));
}

#[test]
fn starving_cell_dies_despite_survival_rule() {
    let dimensions = GridDimensions::new(6, 6);
    let block = [(2, 2), (3, 2), (2, 3), (3, 3)];
    let mut resources = Field::filled(dimensions, 100.0);
    resources.set(2, 2, 1.0);
    resources.set(3, 3, 1.5);

    let mut engine = LifeEngine::from_fields(
        field_with(dimensions, &block),
        Some(resources),
        &config(RulePreset::Life, BoundaryPolicy::Clamp),
    );
    let pulses = step(&mut engine);

    assert!(engine.cells().get(2, 2) <= 0, "starved cell must die");
    assert!(engine.cells().get(3, 3) > 0);
    assert!(engine.cells().get(3, 2) > 0);
    assert_eq!(
        pulses
            .iter()
            .filter(|pulse| pulse.kind() == PulseKind::Death)
            .count(),
        1
    );
}

#[test]
fn scarce_resources_block_births() {
    let dimensions = GridDimensions::new(6, 6);
    let mut resources = Field::filled(dimensions, 100.0);
    resources.set(2, 3, 19.9);
    let mut engine = LifeEngine::from_fields(
        field_with(dimensions, &[(1, 2), (2, 2), (3, 2)]),
        Some(resources),
        &config(RulePreset::Life, BoundaryPolicy::Clamp),
    );
    let _ = step(&mut engine);

    assert!(engine.cells().get(2, 3) <= 0);
    assert!(engine.cells().get(2, 1) > 0);
}

#[test]
fn resources_are_consumed_and_regenerated_after_the_step() {
    let dimensions = GridDimensions::new(6, 6);
    let block = [(2, 2), (3, 2), (2, 3), (3, 3)];
    let mut resources = Field::filled(dimensions, 50.0);
    resources.set(0, 0, 99.9);
    let mut engine = LifeEngine::from_fields(
        field_with(dimensions, &block),
        Some(resources),
        &config(RulePreset::Life, BoundaryPolicy::Clamp),
    );
    let _ = step(&mut engine);

    let overlay = engine.resources().expect("resource variant");
    assert!((overlay.get(2, 2) - 46.0).abs() < 1e-4);
    assert!((overlay.get(5, 5) - 50.2).abs() < 1e-4);
    assert_eq!(overlay.get(0, 0), 100.0);
}

#[test]
fn generations_inherit_from_the_highest_encoded_parent() {
    let dimensions = GridDimensions::new(5, 5);
    let mut cells = Field::filled(dimensions, 0);
    cells.set(1, 0, live_cell(2, 5));
    cells.set(0, 1, live_cell(4, 1));
    cells.set(2, 1, live_cell(3, 9));

    let mut config = config(RulePreset::Life, BoundaryPolicy::Clamp);
    config.life.generations = true;
    let mut engine = LifeEngine::from_fields(cells, None, &config);
    let _ = step(&mut engine);

    let child = engine.cells().get(1, 1);
    assert_eq!(species_of(child), 5);
    assert_eq!(child % 1000, 1);
}

#[test]
fn dead_cells_fade_toward_zero() {
    let dimensions = GridDimensions::new(5, 5);
    let mut engine = LifeEngine::from_fields(
        field_with(dimensions, &[(2, 2)]),
        None,
        &config(RulePreset::Life, BoundaryPolicy::Clamp),
    );

    let _ = step(&mut engine);
    assert_eq!(engine.cells().get(2, 2), -FADE_STEPS);
    let _ = step(&mut engine);
    assert_eq!(engine.cells().get(2, 2), -FADE_STEPS + 1);

    for _ in 0..40 {
        let _ = step(&mut engine);
    }
    assert_eq!(engine.cells().get(2, 2), 0);
}

#[test]
fn fade_disabled_clears_immediately() {
    let dimensions = GridDimensions::new(5, 5);
    let mut config = config(RulePreset::Life, BoundaryPolicy::Clamp);
    config.life.fade = false;
    let mut engine = LifeEngine::from_fields(field_with(dimensions, &[(2, 2)]), None, &config);
    let _ = step(&mut engine);
    assert_eq!(engine.cells().get(2, 2), 0);
}

#[test]
fn clamped_edges_contribute_no_neighbours() {
    let dimensions = GridDimensions::new(5, 5);
    let parents = [(4, 1), (4, 3)];

    let mut wrapped = LifeEngine::from_fields(
        field_with(dimensions, &parents),
        None,
        &config(RulePreset::Seeds, BoundaryPolicy::Wrap),
    );
    let _ = step(&mut wrapped);
    assert!(wrapped.cells().get(0, 2) > 0);

    let mut clamped = LifeEngine::from_fields(
        field_with(dimensions, &parents),
        None,
        &config(RulePreset::Seeds, BoundaryPolicy::Clamp),
    );
    let _ = step(&mut clamped);
    assert!(clamped.cells().get(0, 2) <= 0);
}

#[test]
fn von_neumann_ignores_diagonals() {
    let dimensions = GridDimensions::new(5, 5);
    let diagonals = [(1, 1), (3, 1), (1, 3)];
    let mut config = config(RulePreset::Life, BoundaryPolicy::Clamp);
    config.life.neighborhood = Neighborhood::VonNeumann;
    let mut engine = LifeEngine::from_fields(field_with(dimensions, &diagonals), None, &config);
    let _ = step(&mut engine);
    assert!(engine.cells().get(2, 2) <= 0);
}

#[test]
fn paint_sets_and_clears_discs() {
    let dimensions = GridDimensions::new(10, 10);
    let mut engine = LifeEngine::from_fields(
        Field::filled(dimensions, 0),
        None,
        &config(RulePreset::Life, BoundaryPolicy::Clamp),
    );
    let mut rng = Generator::from_seed(1);

    let painted = engine.paint(CellCoord::new(5, 5), 1, false, &mut rng);
    assert_eq!(painted, 9);
    assert_eq!(engine.live_count(), 9);

    let erased = engine.paint(CellCoord::new(5, 5), 0, true, &mut rng);
    assert_eq!(erased, 1);
    assert_eq!(engine.live_count(), 8);
}

#[test]
fn seeded_runs_are_bit_identical() {
    let first = fingerprint_run(0xfeed);
    let second = fingerprint_run(0xfeed);
    assert_eq!(first, second);
    assert_ne!(first, fingerprint_run(0xbeef));
}

fn fingerprint_run(seed: u64) -> u64 {
    let mut config = config(RulePreset::HighLife, BoundaryPolicy::Wrap);
    config.life.generations = true;
    config.life.probabilistic = true;
    let mut rng = Generator::for_setup(seed, 0);
    let mut engine = LifeEngine::setup(
        GridDimensions::new(32, 24),
        &config,
        Variant::ResourceConstrained,
        &mut rng,
    );
    let mut selector = TopK::new(3);
    let mut hasher = DefaultHasher::new();

    for tick in 0..25 {
        engine.step(&mut rng, &mut selector);
        let summary = selector.finish(tick);
        summary.total_pulses.hash(&mut hasher);
        summary.births.hash(&mut hasher);
        engine.cells().as_slice().hash(&mut hasher);
        for level in engine.resources().expect("resource variant").as_slice() {
            level.to_bits().hash(&mut hasher);
        }
    }
    hasher.finish()
}
