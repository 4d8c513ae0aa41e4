//! The `System` trait: per-tick logic over component arenas.

use evo_core::EcsConfig;
use evo_ecs::World;

use crate::SystemResult;

/// Parallelism limits handed to every system at initialization.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParallelBounds {
    /// Worker threads in the world's pool.
    pub max_workers: usize,
    /// Smallest batch of entities one parallel task should receive.
    pub min_entities_per_task: usize,
}

impl ParallelBounds {
    pub fn from_config(config: &EcsConfig) -> Self {
        Self {
            max_workers:           config.max_workers,
            min_entities_per_task: config.min_entities_per_task.max(1),
        }
    }
}

impl Default for ParallelBounds {
    fn default() -> Self {
        Self::from_config(&EcsConfig::default())
    }
}

/// One unit of per-tick simulation logic.
///
/// The scheduler calls [`run`](Self::run) for every system concurrently each
/// tick, so systems must not depend on one another's ordering.  Inside a
/// system the three phases run in sequence:
///
/// | Phase          | Typical work                                           |
/// |----------------|--------------------------------------------------------|
/// | `pre_execute`  | resolve [`QueryCache`](crate::QueryCache)s             |
/// | `execute`      | data-parallel per-entity work                          |
/// | `post_execute` | sequential aggregation and cleanup                     |
///
/// `execute` may write only to the entity it is currently processing.
///
/// # Example
///
/// ```rust,ignore
/// struct Decay { cache: QueryCache<(Energy,)>, bounds: ParallelBounds }
///
/// impl System for Decay {
///     fn initialize(&mut self, bounds: &ParallelBounds) { self.bounds = *bounds; }
///
///     fn pre_execute(&mut self, world: &World) -> SystemResult<()> {
///         self.cache.resolve(world);
///         Ok(())
///     }
///
///     fn execute(&mut self, _world: &World, dt: f32) -> SystemResult<()> {
///         self.cache.par_for_each(self.bounds.min_entities_per_task, |id, (energy,)| {
///             if let Some(e) = energy.get(&id) { e.write().0 -= dt; }
///         });
///         Ok(())
///     }
/// }
/// ```
pub trait System: Send + Sync {
    /// Name used in logs and tick reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Called once by `Scheduler::init_systems`.
    fn initialize(&mut self, _bounds: &ParallelBounds) {}

    fn pre_execute(&mut self, _world: &World) -> SystemResult<()> {
        Ok(())
    }

    fn execute(&mut self, world: &World, dt: f32) -> SystemResult<()>;

    fn post_execute(&mut self, _world: &World) -> SystemResult<()> {
        Ok(())
    }

    /// `pre_execute`, `execute`, `post_execute`, stopping at the first error.
    fn run(&mut self, world: &World, dt: f32) -> SystemResult<()> {
        self.pre_execute(world)?;
        self.execute(world, dt)?;
        self.post_execute(world)
    }
}
