//! The `Scheduler` and its tick loop.

use std::time::{Duration, Instant};

use evo_core::{SystemId, Tick};
use evo_ecs::World;
use rayon::prelude::*;
use tracing::{debug, error, trace};

use crate::{ParallelBounds, SchedulerError, SchedulerResult, System, SystemError, TickObserver};

// ── Reports ───────────────────────────────────────────────────────────────────

/// Wall time spent in one system during one tick.
#[derive(Clone, Debug)]
pub struct SystemTiming {
    pub id:      SystemId,
    pub name:    &'static str,
    pub elapsed: Duration,
}

/// What happened during one successful [`Scheduler::tick`].
#[derive(Clone, Debug)]
pub struct TickReport {
    pub tick:    Tick,
    /// Per-system timings, in registration order.
    pub systems: Vec<SystemTiming>,
    /// Wall time of the whole tick, barrier included.
    pub elapsed: Duration,
}

impl TickReport {
    /// The slowest system of the tick, if any system ran.
    pub fn slowest(&self) -> Option<&SystemTiming> {
        self.systems.iter().max_by_key(|t| t.elapsed)
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

struct Slot {
    id:     SystemId,
    system: Box<dyn System>,
}

/// Owns the registered systems and runs them once per tick.
///
/// Lifecycle: [`add_system`](Self::add_system) any number of times, then
/// [`init_systems`](Self::init_systems) once, then [`tick`](Self::tick) or
/// [`run_ticks`](Self::run_ticks).
///
/// Every system's [`System::run`] is dispatched concurrently on the world's
/// worker pool; `tick` returns only after all of them have finished.  There
/// is no ordering between systems.  A failing system does not stop the
/// others: failures are logged and reported together once the tick's
/// barrier has been reached.
pub struct Scheduler {
    systems:     Vec<Slot>,
    initialized: bool,
    bounds:      ParallelBounds,
    now:         Tick,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            systems:     Vec::new(),
            initialized: false,
            bounds:      ParallelBounds::default(),
            now:         Tick::ZERO,
        }
    }

    // ── Setup ─────────────────────────────────────────────────────────────

    pub fn add_system(&mut self, system: impl System + 'static) -> SchedulerResult<SystemId> {
        self.add_boxed(Box::new(system))
    }

    pub fn add_boxed(&mut self, system: Box<dyn System>) -> SchedulerResult<SystemId> {
        if self.initialized {
            return Err(SchedulerError::AlreadyInitialized);
        }
        let id = SystemId(self.systems.len() as u32);
        debug!(%id, system = system.name(), "system added");
        self.systems.push(Slot { id, system });
        Ok(id)
    }

    /// Hand every system the parallelism bounds derived from `world`'s
    /// configuration.  Allowed exactly once.
    pub fn init_systems(&mut self, world: &World) -> SchedulerResult<()> {
        if self.initialized {
            return Err(SchedulerError::AlreadyInitialized);
        }
        self.bounds = ParallelBounds::from_config(world.config());
        for slot in &mut self.systems {
            slot.system.initialize(&self.bounds);
        }
        self.initialized = true;
        debug!(systems = self.systems.len(), bounds = ?self.bounds, "systems initialized");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The tick the next call to [`tick`](Self::tick) will run.
    #[inline]
    pub fn current_tick(&self) -> Tick {
        self.now
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    pub fn bounds(&self) -> &ParallelBounds {
        &self.bounds
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Run every system once with time step `dt`.
    ///
    /// The tick counter advances even when systems fail, so a failed tick is
    /// never retried implicitly.
    pub fn tick(&mut self, world: &World, dt: f32) -> SchedulerResult<TickReport> {
        if !self.initialized {
            return Err(SchedulerError::NotInitialized);
        }
        let now = self.now;
        let started = Instant::now();

        let outcomes: Vec<(SystemTiming, Result<(), SystemError>)> = world.pool().install(|| {
            self.systems
                .par_iter_mut()
                .map(|slot| {
                    let t0 = Instant::now();
                    let result = slot.system.run(world, dt);
                    let timing = SystemTiming {
                        id:      slot.id,
                        name:    slot.system.name(),
                        elapsed: t0.elapsed(),
                    };
                    (timing, result)
                })
                .collect()
        });

        self.now = now.next();
        let elapsed = started.elapsed();

        let mut systems = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (timing, result) in outcomes {
            if let Err(e) = result {
                error!(tick = %now, system = timing.name, error = %e, "system failed");
                failures.push((timing.name.to_owned(), e));
            }
            systems.push(timing);
        }
        if !failures.is_empty() {
            return Err(SchedulerError::SystemsFailed(failures));
        }

        trace!(tick = %now, systems = systems.len(), ?elapsed, "tick complete");
        Ok(TickReport { tick: now, systems, elapsed })
    }

    /// Run exactly `n` ticks, reporting to `observer`.  Stops at the first
    /// tick with a failing system.
    pub fn run_ticks<O: TickObserver>(
        &mut self,
        n:        u64,
        world:    &World,
        dt:       f32,
        observer: &mut O,
    ) -> SchedulerResult<()> {
        for _ in 0..n {
            observer.on_tick_start(self.now);
            let report = self.tick(world, dt)?;
            observer.on_tick_end(&report);
        }
        observer.on_run_end(self.now);
        Ok(())
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("systems", &self.system_names())
            .field("initialized", &self.initialized)
            .field("now", &self.now)
            .finish()
    }
}
