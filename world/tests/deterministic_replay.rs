use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use convoy_core::{CellCoord, Command, Event, GridDimensions, Mode, SimulationConfig};
use convoy_world::{apply, query, World};

#[test]
fn replaying_a_command_script_is_bit_identical() {
    for mode in Mode::ALL {
        let first = replay(mode);
        let second = replay(mode);
        assert_eq!(first, second, "fingerprint mismatch for {mode:?}: {first:#x}");
    }
}

#[test]
fn reset_diverges_from_the_previous_setup() {
    let mut world = World::new(
        Mode::Cyclic,
        GridDimensions::new(20, 20),
        SimulationConfig::default(),
    );
    let before = field_fingerprint(&world);
    let mut events = Vec::new();
    apply(&mut world, Command::Reset, &mut events);
    assert_ne!(before, field_fingerprint(&world));
    assert_eq!(query::generation(&world), 1);
}

#[test]
fn resource_mode_runs_with_an_overlay() {
    let world = World::new(
        Mode::Resources,
        GridDimensions::new(16, 16),
        SimulationConfig::default(),
    );
    let query::EngineView::Life(engine) = query::engine(&world) else {
        panic!("life engine expected");
    };
    assert!(engine.resources().is_some());
}

fn replay(mode: Mode) -> u64 {
    let mut world = World::new(mode, GridDimensions::new(32, 24), SimulationConfig::default());
    let mut events = Vec::new();
    let mut hasher = DefaultHasher::new();

    for tick in 0..40_u32 {
        if tick == 10 {
            apply(
                &mut world,
                Command::Paint {
                    cell: CellCoord::new(16, 12),
                    radius: 3,
                    erase: false,
                },
                &mut events,
            );
        }
        if tick == 25 {
            apply(&mut world, Command::Reset, &mut events);
        }
        apply(&mut world, Command::Step, &mut events);
        field_fingerprint(&world).hash(&mut hasher);
    }

    for event in &events {
        if let Event::Stepped { summary } = event {
            summary.total_pulses.hash(&mut hasher);
            summary.births.hash(&mut hasher);
            for pulse in &summary.selected {
                pulse.x().to_bits().hash(&mut hasher);
                pulse.y().to_bits().hash(&mut hasher);
                pulse.weight().to_bits().hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}

fn field_fingerprint(world: &World) -> u64 {
    let mut hasher = DefaultHasher::new();
    match query::engine(world) {
        query::EngineView::Life(engine) => engine.cells().as_slice().hash(&mut hasher),
        query::EngineView::Smooth(engine) => {
            for value in engine.cells().as_slice() {
                value.to_bits().hash(&mut hasher);
            }
        }
        query::EngineView::Cyclic(engine) => engine.cells().as_slice().hash(&mut hasher),
        query::EngineView::Walkers(engine) => {
            engine.cells().as_slice().hash(&mut hasher);
            engine.walkers().hash(&mut hasher);
        }
        query::EngineView::Flock(engine) => {
            for agent in engine.agents() {
                agent.position().x.to_bits().hash(&mut hasher);
                agent.position().y.to_bits().hash(&mut hasher);
                agent.velocity().x.to_bits().hash(&mut hasher);
                agent.velocity().y.to_bits().hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}
