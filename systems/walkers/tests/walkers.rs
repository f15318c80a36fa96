use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use convoy_core::{
    BoundaryPolicy, CellCoord, Direction, Field, Generator, GridDimensions, Pulse, PulseKind,
    SimulationConfig,
};
use convoy_system_selection::TopK;
use convoy_system_walkers::{Walker, WalkerEngine};

fn config(boundary: BoundaryPolicy, micro_steps: u32) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.boundary = boundary;
    config.walkers.micro_steps = micro_steps;
    config
}

fn single_walker(cell: CellCoord, heading: Direction, boundary: BoundaryPolicy) -> WalkerEngine {
    WalkerEngine::from_parts(
        Field::filled(GridDimensions::new(6, 4), 0),
        vec![Walker::new(cell, heading)],
        &config(boundary, 1),
    )
}

#[test]
fn walker_on_right_edge_wraps_to_first_column() {
    // North on a white cell turns clockwise to face east.
    let mut engine = single_walker(CellCoord::new(5, 2), Direction::North, BoundaryPolicy::Wrap);
    let mut pulses: Vec<Pulse> = Vec::new();
    engine.step(&mut pulses);

    let walker = engine.walkers()[0];
    assert_eq!(walker.cell(), CellCoord::new(0, 2));
    assert_eq!(walker.heading(), Direction::East);
}

#[test]
fn walker_on_right_edge_is_clamped_and_turned_back() {
    let mut engine = single_walker(CellCoord::new(5, 2), Direction::North, BoundaryPolicy::Clamp);
    let mut pulses: Vec<Pulse> = Vec::new();
    engine.step(&mut pulses);

    let walker = engine.walkers()[0];
    assert_eq!(walker.cell(), CellCoord::new(5, 2));
    assert_eq!(walker.heading(), Direction::West);
}

#[test]
fn walker_on_top_edge_is_sent_down() {
    // East on a white cell turns clockwise to face south; west turns north.
    let mut engine = single_walker(CellCoord::new(2, 0), Direction::West, BoundaryPolicy::Clamp);
    let mut pulses: Vec<Pulse> = Vec::new();
    engine.step(&mut pulses);

    let walker = engine.walkers()[0];
    assert_eq!(walker.cell(), CellCoord::new(2, 0));
    assert_eq!(walker.heading(), Direction::South);
}

#[test]
fn flips_emit_pulses_at_the_pre_move_cell() {
    let mut engine = single_walker(CellCoord::new(2, 2), Direction::North, BoundaryPolicy::Wrap);
    let mut pulses: Vec<Pulse> = Vec::new();
    engine.step(&mut pulses);

    assert_eq!(engine.cells().get(2, 2), 1);
    assert_eq!(pulses.len(), 1);
    assert_eq!(pulses[0].kind(), PulseKind::Birth);
    assert!((pulses[0].x() - 2.0 / 6.0).abs() < 1e-6);
    assert!((pulses[0].y() - 0.5).abs() < 1e-6);
}

#[test]
fn black_cell_turns_counter_clockwise_and_clears() {
    let mut cells = Field::filled(GridDimensions::new(6, 4), 0);
    cells.set(2, 2, 1);
    let mut engine = WalkerEngine::from_parts(
        cells,
        vec![Walker::new(CellCoord::new(2, 2), Direction::North)],
        &config(BoundaryPolicy::Wrap, 1),
    );
    let mut pulses: Vec<Pulse> = Vec::new();
    engine.step(&mut pulses);

    assert_eq!(engine.cells().get(2, 2), 0);
    assert_eq!(pulses[0].kind(), PulseKind::Death);
    assert_eq!(engine.walkers()[0].heading(), Direction::West);
    assert_eq!(engine.walkers()[0].cell(), CellCoord::new(1, 2));
}

#[test]
fn micro_steps_multiply_moves_per_tick() {
    let mut engine = WalkerEngine::from_parts(
        Field::filled(GridDimensions::new(20, 20), 0),
        vec![
            Walker::new(CellCoord::new(5, 5), Direction::North),
            Walker::new(CellCoord::new(14, 14), Direction::South),
        ],
        &config(BoundaryPolicy::Wrap, 10),
    );
    let mut selector = TopK::new(3);
    engine.step(&mut selector);
    let summary = selector.finish(0);
    assert_eq!(summary.total_pulses, 20);
    assert_eq!(summary.selected.len(), 3);
}

#[test]
fn setup_places_walkers_inside_small_grids() {
    let mut config = config(BoundaryPolicy::Clamp, 10);
    config.walkers.count = 32;
    let dimensions = GridDimensions::new(3, 2);
    let mut rng = Generator::from_seed(77);
    let engine = WalkerEngine::setup(dimensions, &config, &mut rng);

    assert_eq!(engine.walkers().len(), 32);
    assert!(engine
        .walkers()
        .iter()
        .all(|walker| dimensions
            .index_of(walker.cell().column(), walker.cell().row())
            .is_some()));
    assert!(engine.cells().as_slice().iter().all(|value| *value == 0));
}

#[test]
fn seeded_runs_are_bit_identical() {
    let run = |seed| {
        let mut rng = Generator::for_setup(seed, 4);
        let mut engine = WalkerEngine::setup(
            GridDimensions::new(40, 30),
            &config(BoundaryPolicy::Clamp, 10),
            &mut rng,
        );
        let mut selector = TopK::new(3);
        let mut hasher = DefaultHasher::new();
        for tick in 0..50 {
            engine.step(&mut selector);
            selector.finish(tick).births.hash(&mut hasher);
            engine.cells().as_slice().hash(&mut hasher);
            engine.walkers().hash(&mut hasher);
        }
        hasher.finish()
    };
    assert_eq!(run(21), run(21));
}
