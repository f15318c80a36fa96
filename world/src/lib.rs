#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state for Convoy.
//!
//! The world owns the single active engine together with everything a step
//! needs: configuration, grid dimensions, the generator stream and the top-K
//! selector. Every mutation goes through [`apply`].

use convoy_core::{
    BrushConfig, CellCoord, Command, Event, Generator, GridDimensions, Mode, SimulationConfig,
};
use convoy_rendering::Scene;
use convoy_system_cyclic::CyclicEngine;
use convoy_system_flocking::FlockEngine;
use convoy_system_life::{LifeEngine, Variant};
use convoy_system_selection::TopK;
use convoy_system_smooth::SmoothEngine;
use convoy_system_walkers::WalkerEngine;
use tracing::{debug, info};

/// Closed set of engines, one per mode.
#[derive(Clone, Debug)]
enum Engine {
    Life(LifeEngine),
    Smooth(SmoothEngine),
    Cyclic(CyclicEngine),
    Walkers(WalkerEngine),
    Flock(FlockEngine),
}

impl Engine {
    fn setup(
        mode: Mode,
        dimensions: GridDimensions,
        config: &SimulationConfig,
        rng: &mut Generator,
    ) -> Self {
        match mode {
            Mode::Classic => {
                Self::Life(LifeEngine::setup(dimensions, config, Variant::Classic, rng))
            }
            Mode::Resources => Self::Life(LifeEngine::setup(
                dimensions,
                config,
                Variant::ResourceConstrained,
                rng,
            )),
            Mode::Smooth => Self::Smooth(SmoothEngine::setup(dimensions, config, rng)),
            Mode::Cyclic => Self::Cyclic(CyclicEngine::setup(dimensions, config, rng)),
            Mode::Walkers => Self::Walkers(WalkerEngine::setup(dimensions, config, rng)),
            Mode::Flock => Self::Flock(FlockEngine::setup(dimensions, config, rng)),
        }
    }

    fn configure(&mut self, config: &SimulationConfig) {
        match self {
            Self::Life(engine) => engine.configure(config),
            Self::Smooth(engine) => engine.configure(config),
            Self::Cyclic(engine) => engine.configure(config),
            Self::Walkers(engine) => engine.configure(config),
            Self::Flock(engine) => engine.configure(config),
        }
    }

    fn step(&mut self, rng: &mut Generator, selector: &mut TopK) {
        match self {
            Self::Life(engine) => engine.step(rng, selector),
            Self::Smooth(engine) => engine.step(selector),
            Self::Cyclic(engine) => engine.step(selector),
            Self::Walkers(engine) => engine.step(selector),
            Self::Flock(engine) => engine.step(selector),
        }
    }

    fn paint(&mut self, cell: CellCoord, radius: u32, erase: bool, rng: &mut Generator) -> u32 {
        match self {
            Self::Life(engine) => engine.paint(cell, radius, erase, rng),
            Self::Smooth(engine) => engine.paint(cell, radius, erase),
            Self::Cyclic(engine) => engine.paint(cell, radius),
            Self::Walkers(engine) => engine.paint(cell, radius, erase),
            Self::Flock(_) => 0,
        }
    }

    fn render(&self, scene: &mut Scene) {
        match self {
            Self::Life(engine) => engine.render(scene),
            Self::Smooth(engine) => engine.render(scene),
            Self::Cyclic(engine) => engine.render(scene),
            Self::Walkers(engine) => engine.render(scene),
            Self::Flock(engine) => engine.render(scene),
        }
    }
}

/// Represents the authoritative Convoy simulation state.
#[derive(Clone, Debug)]
pub struct World {
    mode: Mode,
    config: SimulationConfig,
    dimensions: GridDimensions,
    generation: u64,
    rng: Generator,
    engine: Engine,
    selector: TopK,
    tick: u64,
}

impl World {
    /// Creates a world with `mode` already set up at `dimensions`.
    ///
    /// The configuration must already be sanitised.
    #[must_use]
    pub fn new(mode: Mode, dimensions: GridDimensions, config: SimulationConfig) -> Self {
        let generation = 0;
        let mut rng = Generator::for_setup(config.seed, generation);
        let engine = Engine::setup(mode, dimensions, &config, &mut rng);
        Self {
            mode,
            config,
            dimensions,
            generation,
            rng,
            engine,
            selector: TopK::new(mode.selection_capacity()),
            tick: 0,
        }
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) {
        self.generation = self.generation.wrapping_add(1);
        self.rng = Generator::for_setup(self.config.seed, self.generation);
        self.engine = Engine::setup(self.mode, self.dimensions, &self.config, &mut self.rng);
        self.selector.reset(self.mode.selection_capacity());
        self.tick = 0;
        info!(
            mode = self.mode.label(),
            columns = self.dimensions.columns(),
            rows = self.dimensions.rows(),
            generation = self.generation,
            "simulation set up"
        );
        out_events.push(Event::SimulationReset {
            mode: self.mode,
            dimensions: self.dimensions,
            generation: self.generation,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Setup { dimensions } => {
            world.dimensions = dimensions;
            world.restart(out_events);
        }
        Command::Reset => world.restart(out_events),
        Command::SelectMode { mode } => {
            if mode != world.mode {
                info!(from = world.mode.label(), to = mode.label(), "mode changed");
            }
            world.mode = mode;
            out_events.push(Event::ModeChanged { mode });
            world.restart(out_events);
        }
        Command::Configure { config } => {
            let restarted = config.requires_setup(&world.config, world.mode);
            world.config = *config;
            if restarted {
                world.restart(out_events);
            } else {
                world.engine.configure(&world.config);
                debug!(mode = world.mode.label(), "configuration applied live");
            }
            out_events.push(Event::Reconfigured { restarted });
        }
        Command::Step => {
            world.engine.step(&mut world.rng, &mut world.selector);
            world.tick = world.tick.saturating_add(1);
            let summary = world.selector.finish(world.tick);
            out_events.push(Event::Stepped { summary });
        }
        Command::Paint {
            cell,
            radius,
            erase,
        } => {
            if !world.mode.accepts_paint() {
                return;
            }
            let radius = radius.min(BrushConfig::MAX_RADIUS);
            let cells = world.engine.paint(cell, radius, erase, &mut world.rng);
            if cells > 0 {
                out_events.push(Event::Painted { cells });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Engine, World};
    use convoy_core::{GridDimensions, Mode, SimulationConfig};
    use convoy_rendering::Scene;
    use convoy_system_cyclic::CyclicEngine;
    use convoy_system_flocking::FlockEngine;
    use convoy_system_life::LifeEngine;
    use convoy_system_smooth::SmoothEngine;
    use convoy_system_walkers::WalkerEngine;

    /// Borrowed view of the active engine.
    #[derive(Clone, Copy, Debug)]
    pub enum EngineView<'a> {
        /// Classic or resource-constrained automaton.
        Life(&'a LifeEngine),
        /// Continuous automaton.
        Smooth(&'a SmoothEngine),
        /// Cyclic automaton.
        Cyclic(&'a CyclicEngine),
        /// Walker agents.
        Walkers(&'a WalkerEngine),
        /// Flocking agents.
        Flock(&'a FlockEngine),
    }

    /// Active mode.
    #[must_use]
    pub fn mode(world: &World) -> Mode {
        world.mode
    }

    /// Active simulation configuration.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Grid extent of the current simulation.
    #[must_use]
    pub fn dimensions(world: &World) -> GridDimensions {
        world.dimensions
    }

    /// Number of setups performed since the world was created.
    #[must_use]
    pub fn generation(world: &World) -> u64 {
        world.generation
    }

    /// Steps taken since the last setup.
    #[must_use]
    pub fn tick(world: &World) -> u64 {
        world.tick
    }

    /// Read-only access to the active engine.
    #[must_use]
    pub fn engine(world: &World) -> EngineView<'_> {
        match &world.engine {
            Engine::Life(engine) => EngineView::Life(engine),
            Engine::Smooth(engine) => EngineView::Smooth(engine),
            Engine::Cyclic(engine) => EngineView::Cyclic(engine),
            Engine::Walkers(engine) => EngineView::Walkers(engine),
            Engine::Flock(engine) => EngineView::Flock(engine),
        }
    }

    /// Draws the active engine into `scene`.
    pub fn render(world: &World, scene: &mut Scene) {
        world.engine.render(scene);
    }
}
