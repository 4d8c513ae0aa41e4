//! Planar kinematics: positions, velocities, and the systems that move
//! agents.

use evo_ecs::World;
use evo_system::{ParallelBounds, QueryCache, System, SystemResult};

use crate::BlackboardComponent;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

/// `position += velocity * dt` for every entity holding both.
#[derive(Default)]
pub struct MovementSystem {
    cache:   QueryCache<(Position, Velocity)>,
    min_len: usize,
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn initialize(&mut self, bounds: &ParallelBounds) {
        self.min_len = bounds.min_entities_per_task;
    }

    fn pre_execute(&mut self, world: &World) -> SystemResult<()> {
        self.cache.resolve(world);
        Ok(())
    }

    fn execute(&mut self, _world: &World, dt: f32) -> SystemResult<()> {
        self.cache.par_for_each(self.min_len, |id, (positions, velocities)| {
            if let (Some(p), Some(v)) = (positions.get(&id), velocities.get(&id)) {
                let v = *v.read();
                let mut p = p.write();
                p.x += v.dx * dt;
                p.y += v.dy * dt;
            }
        });
        Ok(())
    }
}

/// Copies each agent's requested [`Drive`](crate::Drive) into its
/// [`Velocity`].
#[derive(Default)]
pub struct SteeringSystem {
    cache:   QueryCache<(BlackboardComponent, Velocity)>,
    min_len: usize,
}

impl System for SteeringSystem {
    fn name(&self) -> &'static str {
        "steering"
    }

    fn initialize(&mut self, bounds: &ParallelBounds) {
        self.min_len = bounds.min_entities_per_task;
    }

    fn pre_execute(&mut self, world: &World) -> SystemResult<()> {
        self.cache.resolve(world);
        Ok(())
    }

    fn execute(&mut self, _world: &World, _dt: f32) -> SystemResult<()> {
        self.cache.par_for_each(self.min_len, |id, (boards, velocities)| {
            if let (Some(board), Some(velocity)) = (boards.get(&id), velocities.get(&id)) {
                let [dx, dy] = board.read().0.drive().velocity();
                *velocity.write() = Velocity { dx, dy };
            }
        });
        Ok(())
    }
}
