//! Fluent builder for a ready-to-tick [`Scheduler`].

use evo_ecs::World;

use crate::{Scheduler, SchedulerResult, System};

/// Collects systems, then registers and initializes them in one step.
///
/// ```rust,ignore
/// let mut scheduler = SchedulerBuilder::new()
///     .system(Movement::default())
///     .system(BrainDecisionSystem::default())
///     .build(&world)?;
/// scheduler.run_ticks(100, &world, 1.0, &mut NoopObserver)?;
/// ```
#[derive(Default)]
pub struct SchedulerBuilder {
    systems: Vec<Box<dyn System>>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Register every system in order and run `init_systems` against
    /// `world`'s parallelism bounds.
    pub fn build(self, world: &World) -> SchedulerResult<Scheduler> {
        let mut scheduler = Scheduler::new();
        for system in self.systems {
            scheduler.add_boxed(system)?;
        }
        scheduler.init_systems(world)?;
        Ok(scheduler)
    }
}
