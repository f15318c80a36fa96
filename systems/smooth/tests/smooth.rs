use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use convoy_core::{
    BoundaryPolicy, CellCoord, Field, Generator, GridDimensions, Neighborhood, Pulse, PulseKind,
    SimulationConfig, SmoothPreset,
};
use convoy_system_selection::TopK;
use convoy_system_smooth::SmoothEngine;

#[test]
fn zero_field_stays_zero() {
    for preset in SmoothPreset::ALL {
        for neighborhood in [Neighborhood::Moore, Neighborhood::VonNeumann] {
            let mut config = SimulationConfig::default();
            config.smooth.preset = preset;
            config.smooth.neighborhood = neighborhood;
            let mut engine =
                SmoothEngine::from_field(Field::filled(GridDimensions::new(12, 9), 0.0), &config);

            let mut pulses: Vec<Pulse> = Vec::new();
            for _ in 0..50 {
                engine.step(&mut pulses);
            }
            assert!(pulses.is_empty());
            assert!(engine.cells().as_slice().iter().all(|value| *value == 0.0));
        }
    }
}

#[test]
fn values_stay_in_unit_interval() {
    let mut config = SimulationConfig::default();
    config.smooth.preset = SmoothPreset::Mitosis;
    config.boundary = BoundaryPolicy::Wrap;
    let mut rng = Generator::for_setup(3, 0);
    let mut engine = SmoothEngine::setup(GridDimensions::new(24, 16), &config, &mut rng);
    let mut selector = TopK::new(3);

    for tick in 0..40 {
        engine.step(&mut selector);
        let summary = selector.finish(tick);
        assert!(summary.selected.len() <= 3);
        assert!(engine
            .cells()
            .as_slice()
            .iter()
            .all(|value| (0.0..=1.0).contains(value)));
    }
}

#[test]
fn isolated_active_cell_decays_and_reports_a_death() {
    let dimensions = GridDimensions::new(5, 5);
    let mut cells = Field::filled(dimensions, 0.0);
    cells.set(2, 2, 0.21);
    let config = SimulationConfig::default();
    let mut engine = SmoothEngine::from_field(cells, &config);

    let mut pulses: Vec<Pulse> = Vec::new();
    engine.step(&mut pulses);

    let rate = SmoothPreset::Liquid.params().map_or(0.0, |params| params.rate);
    let expected = 0.21 - rate * 0.21;
    assert!((engine.cells().get(2, 2) - expected).abs() < 1e-6);

    let deaths: Vec<&Pulse> = pulses
        .iter()
        .filter(|pulse| pulse.kind() == PulseKind::Death)
        .collect();
    assert_eq!(deaths.len(), 1);
    assert!((deaths[0].weight() - rate * 0.21).abs() < 1e-6);
    assert!((deaths[0].x() - 0.4).abs() < 1e-6);
}

#[test]
fn custom_thresholds_drive_births() {
    let dimensions = GridDimensions::new(3, 3);
    let mut config = SimulationConfig::default();
    config.smooth.preset = SmoothPreset::Custom;
    config.smooth.custom.birth_min = 0.1;
    config.smooth.custom.birth_max = 0.9;
    config.smooth.custom.rate = 1.0;
    config.boundary = BoundaryPolicy::Wrap;

    let mut cells = Field::filled(dimensions, 0.5);
    cells.set(1, 1, 0.0);
    let mut engine = SmoothEngine::from_field(cells, &config);
    let mut pulses: Vec<Pulse> = Vec::new();
    engine.step(&mut pulses);

    assert_eq!(engine.cells().get(1, 1), 1.0);
    assert!(pulses
        .iter()
        .any(|pulse| pulse.kind() == PulseKind::Birth && pulse.weight() == 1.0));
}

#[test]
fn paint_fills_and_clears() {
    let config = SimulationConfig::default();
    let mut engine =
        SmoothEngine::from_field(Field::filled(GridDimensions::new(8, 8), 0.0), &config);
    assert_eq!(engine.paint(CellCoord::new(0, 0), 1, false), 4);
    assert_eq!(engine.cells().get(1, 1), 1.0);
    assert_eq!(engine.paint(CellCoord::new(1, 1), 0, true), 1);
    assert_eq!(engine.cells().get(1, 1), 0.0);
}

#[test]
fn seeded_runs_are_bit_identical() {
    assert_eq!(fingerprint_run(11), fingerprint_run(11));
}

fn fingerprint_run(seed: u64) -> u64 {
    let mut config = SimulationConfig::default();
    config.smooth.preset = SmoothPreset::Coral;
    let mut rng = Generator::for_setup(seed, 2);
    let mut engine = SmoothEngine::setup(GridDimensions::new(20, 20), &config, &mut rng);
    let mut selector = TopK::new(3);
    let mut hasher = DefaultHasher::new();
    for tick in 0..30 {
        engine.step(&mut selector);
        let summary = selector.finish(tick);
        summary.total_pulses.hash(&mut hasher);
        for value in engine.cells().as_slice() {
            value.to_bits().hash(&mut hasher);
        }
    }
    hasher.finish()
}
