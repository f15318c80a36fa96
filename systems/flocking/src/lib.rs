#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boid-like flocking agents moving in continuous world units.
//!
//! Every agent steers by alignment, cohesion and separation against the
//! neighbours it perceives. Near misses closer than the configured sound
//! distance are reported as death pulses weighted by inverse distance, so
//! the closest encounters win the top-K selection.

use convoy_core::{
    BoundaryPolicy, FlockConfig, Generator, GridDimensions, Pulse, PulseKind, PulseSink,
    SimulationConfig,
};
use convoy_rendering::{Backdrop, Color, Scene, Shape, Sprite};
use glam::Vec2;

const MIN_DISTANCE: f32 = 1e-3;
const TRAIL_WASH: f32 = 0.15;
const NOSE: Vec2 = Vec2::new(10.0, 0.0);
const TAIL_LEFT: Vec2 = Vec2::new(-5.0, 5.0);
const TAIL_RIGHT: Vec2 = Vec2::new(-5.0, -5.0);

/// Single flocking agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Agent {
    position: Vec2,
    velocity: Vec2,
}

impl Agent {
    /// Creates an agent with the provided position and velocity.
    #[must_use]
    pub const fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }

    /// Position in world units.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Velocity in world units per step.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }
}

/// State of the flocking mode.
#[derive(Clone, Debug)]
pub struct FlockEngine {
    extent: Vec2,
    dimensions: GridDimensions,
    agents: Vec<Agent>,
    steering: Vec<Vec2>,
    config: FlockConfig,
    boundary: BoundaryPolicy,
}

impl FlockEngine {
    /// Scatters agents uniformly with random headings and speeds in `[2, 4)`.
    #[must_use]
    pub fn setup(
        dimensions: GridDimensions,
        config: &SimulationConfig,
        rng: &mut Generator,
    ) -> Self {
        let width = dimensions.width_units();
        let height = dimensions.height_units();
        let agents = (0..config.flock.count)
            .map(|_| {
                let position = Vec2::new(
                    rng.next_unit() as f32 * width,
                    rng.next_unit() as f32 * height,
                );
                let heading = Vec2::new(rng.signed_unit() as f32, rng.signed_unit() as f32);
                let speed = rng.next_unit() as f32 * 2.0 + 2.0;
                Agent::new(position, set_magnitude(heading, speed))
            })
            .collect();
        Self::from_agents(dimensions, agents, config)
    }

    /// Builds an engine from an explicit agent set.
    #[must_use]
    pub fn from_agents(
        dimensions: GridDimensions,
        agents: Vec<Agent>,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            extent: Vec2::new(dimensions.width_units(), dimensions.height_units()),
            dimensions,
            steering: vec![Vec2::ZERO; agents.len()],
            agents,
            config: config.flock,
            boundary: config.boundary,
        }
    }

    /// Adopts force weights and limits; the population size needs a new setup.
    pub fn configure(&mut self, config: &SimulationConfig) {
        let count = self.config.count;
        self.config = config.flock;
        self.config.count = count;
        self.boundary = config.boundary;
    }

    /// Current agents.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Extent of the world in units.
    #[must_use]
    pub const fn extent(&self) -> Vec2 {
        self.extent
    }

    /// Grid the engine was set up for.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Advances every agent by one tick.
    ///
    /// Steering is computed against a snapshot of the previous tick so the
    /// outcome does not depend on agent order.
    pub fn step<S>(&mut self, sink: &mut S)
    where
        S: PulseSink + ?Sized,
    {
        for index in 0..self.agents.len() {
            let mut acceleration = self.edge_steering(self.agents[index].position);
            acceleration += self.flock(index, sink);
            self.steering[index] = acceleration;
        }

        let max_speed = self.config.max_speed;
        for (agent, acceleration) in self.agents.iter_mut().zip(&self.steering) {
            agent.position += agent.velocity;
            agent.velocity = (agent.velocity + *acceleration).clamp_length_max(max_speed);
            agent.position = confine(agent.position, self.extent, self.boundary);
        }
    }

    /// Draws agents as triangles pointing along their velocity over a
    /// translucent trail.
    pub fn render(&self, scene: &mut Scene) {
        scene.backdrop = Backdrop::Trail {
            wash: Color::BLACK.with_alpha(TRAIL_WASH),
        };
        let body = Color::from_hsl(190.0, 100.0, 70.0);
        for agent in &self.agents {
            let facing = Vec2::from_angle(agent.velocity.y.atan2(agent.velocity.x));
            let points = [NOSE, TAIL_LEFT, TAIL_RIGHT]
                .map(|corner| agent.position + facing.rotate(corner));
            scene.push(Sprite::new(Shape::Triangle { points }, body));
        }
    }

    fn edge_steering(&self, position: Vec2) -> Vec2 {
        if self.boundary == BoundaryPolicy::Wrap {
            return Vec2::ZERO;
        }
        let margin = self.config.edge_margin;
        let force = self.config.edge_turn_force;
        let mut steer = Vec2::ZERO;
        if position.x < margin {
            steer.x += force;
        }
        if position.x > self.extent.x - margin {
            steer.x -= force;
        }
        if position.y < margin {
            steer.y += force;
        }
        if position.y > self.extent.y - margin {
            steer.y -= force;
        }
        steer
    }

    fn flock<S>(&self, index: usize, sink: &mut S) -> Vec2
    where
        S: PulseSink + ?Sized,
    {
        let config = &self.config;
        let agent = self.agents[index];
        let mut heading = Vec2::ZERO;
        let mut centre = Vec2::ZERO;
        let mut away = Vec2::ZERO;
        let mut total = 0_u32;

        for (other_index, other) in self.agents.iter().enumerate() {
            if other_index == index {
                continue;
            }
            let distance = agent.position.distance(other.position);
            if distance >= config.perception_radius {
                continue;
            }
            let distance = distance.max(MIN_DISTANCE);
            heading += other.velocity;
            centre += other.position;
            away += (agent.position - other.position) / (distance * distance);
            total += 1;

            if distance < config.separation_sound_distance {
                sink.record(Pulse::new(
                    agent.position.x / self.extent.x,
                    agent.position.y / self.extent.y,
                    PulseKind::Death,
                    1.0 / distance,
                ));
            }
        }

        if total == 0 {
            return Vec2::ZERO;
        }
        let count = total as f32;
        let alignment = self.steer_towards(heading / count, agent.velocity);
        let cohesion = self.steer_towards(centre / count - agent.position, agent.velocity);
        let separation = self.steer_towards(away / count, agent.velocity);

        alignment * config.alignment + cohesion * config.cohesion + separation * config.separation
    }

    fn steer_towards(&self, desired: Vec2, velocity: Vec2) -> Vec2 {
        (set_magnitude(desired, self.config.max_speed) - velocity)
            .clamp_length_max(self.config.max_force)
    }
}

fn set_magnitude(vector: Vec2, magnitude: f32) -> Vec2 {
    vector.normalize_or_zero() * magnitude
}

fn confine(position: Vec2, extent: Vec2, boundary: BoundaryPolicy) -> Vec2 {
    match boundary {
        BoundaryPolicy::Wrap => Vec2::new(
            wrap_coordinate(position.x, extent.x),
            wrap_coordinate(position.y, extent.y),
        ),
        BoundaryPolicy::Clamp => position.clamp(Vec2::ZERO, extent),
    }
}

/// Folds `value` into `[0, extent)`.
fn wrap_coordinate(value: f32, extent: f32) -> f32 {
    // Tiny negative inputs round up to `extent` itself.
    let wrapped = value.rem_euclid(extent);
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::{confine, wrap_coordinate};
    use convoy_core::BoundaryPolicy;
    use glam::Vec2;

    #[test]
    fn wrapping_never_lands_on_the_far_edge() {
        assert_eq!(wrap_coordinate(-1.0e-9, 480.0), 0.0);
        assert_eq!(wrap_coordinate(-f32::EPSILON, 3.0), 0.0);
        assert_eq!(wrap_coordinate(480.0, 480.0), 0.0);
        assert_eq!(wrap_coordinate(-10.0, 480.0), 470.0);

        let extent = Vec2::new(320.0, 240.0);
        let wrapped = confine(Vec2::new(-1.0e-9, -1.0e-9), extent, BoundaryPolicy::Wrap);
        assert!(wrapped.x < extent.x && wrapped.y < extent.y);
        assert!(wrapped.x >= 0.0 && wrapped.y >= 0.0);
    }
}
