use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use convoy_core::{
    BoundaryPolicy, CellCoord, Field, Generator, GridDimensions, Pulse, PulseKind,
    SimulationConfig,
};
use convoy_system_cyclic::CyclicEngine;
use convoy_system_selection::TopK;

fn config(states: u16, threshold: u8, boundary: BoundaryPolicy) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.cyclic.states = states;
    config.cyclic.threshold = threshold;
    config.boundary = boundary;
    config
}

#[test]
fn cell_advances_when_enough_neighbours_hold_successor() {
    let dimensions = GridDimensions::new(3, 3);
    let mut cells = Field::filled(dimensions, 1_u16);
    cells.set(1, 1, 0);
    let mut engine = CyclicEngine::from_field(cells, &config(4, 3, BoundaryPolicy::Clamp));

    let mut pulses: Vec<Pulse> = Vec::new();
    engine.step(&mut pulses);

    assert_eq!(engine.cells().get(1, 1), 1);
    assert_eq!(engine.cells().get(0, 0), 1);
    assert_eq!(pulses.len(), 1);
    assert_eq!(pulses[0].kind(), PulseKind::Birth);
    assert_eq!(pulses[0].weight(), 1.0);
}

#[test]
fn ring_wraps_from_last_state_to_zero() {
    let dimensions = GridDimensions::new(3, 3);
    let mut cells = Field::filled(dimensions, 0_u16);
    cells.set(1, 1, 3);
    let mut engine = CyclicEngine::from_field(cells, &config(4, 8, BoundaryPolicy::Clamp));

    let mut pulses: Vec<Pulse> = Vec::new();
    engine.step(&mut pulses);
    assert_eq!(engine.cells().get(1, 1), 0);
    assert_eq!(pulses.len(), 1);
}

#[test]
fn clamped_corner_sees_only_three_neighbours() {
    let dimensions = GridDimensions::new(4, 4);
    let cells = Field::from_fn(dimensions, |cell| {
        if cell == CellCoord::new(0, 0) {
            0_u16
        } else {
            1
        }
    });

    let mut clamped =
        CyclicEngine::from_field(cells.clone(), &config(3, 4, BoundaryPolicy::Clamp));
    let mut wrapped = CyclicEngine::from_field(cells, &config(3, 4, BoundaryPolicy::Wrap));
    let mut pulses: Vec<Pulse> = Vec::new();
    clamped.step(&mut pulses);
    wrapped.step(&mut pulses);

    assert_eq!(clamped.cells().get(0, 0), 0);
    assert_eq!(wrapped.cells().get(0, 0), 1);
}

#[test]
fn paint_synchronises_cells_to_state_zero() {
    let mut engine = CyclicEngine::from_field(
        Field::filled(GridDimensions::new(6, 6), 5_u16),
        &config(8, 3, BoundaryPolicy::Clamp),
    );
    assert_eq!(engine.paint(CellCoord::new(3, 3), 1), 9);
    assert_eq!(engine.cells().get(3, 3), 0);
    assert_eq!(engine.cells().get(0, 0), 5);
}

#[test]
fn setup_states_stay_in_ring() {
    let mut rng = Generator::from_seed(5);
    let engine = CyclicEngine::setup(
        GridDimensions::new(30, 20),
        &config(6, 3, BoundaryPolicy::Wrap),
        &mut rng,
    );
    assert_eq!(engine.states(), 6);
    assert!(engine.cells().as_slice().iter().all(|state| *state < 6));
}

#[test]
fn seeded_runs_are_bit_identical() {
    let run = |seed| {
        let mut rng = Generator::for_setup(seed, 0);
        let mut engine = CyclicEngine::setup(
            GridDimensions::new(24, 24),
            &config(8, 2, BoundaryPolicy::Wrap),
            &mut rng,
        );
        let mut selector = TopK::new(3);
        let mut hasher = DefaultHasher::new();
        for tick in 0..30 {
            engine.step(&mut selector);
            selector.finish(tick).total_pulses.hash(&mut hasher);
            engine.cells().as_slice().hash(&mut hasher);
        }
        hasher.finish()
    };
    assert_eq!(run(9), run(9));
}
