//! The staged, barrier-synchronized batch executor.
//!
//! # Execution contract
//!
//! For each occupied rung, lowest first:
//!
//! 1. Spawn the rung's multi-thread actions on the bounded worker pool.
//! 2. Meanwhile run the rung's main-thread actions, in order, on the calling
//!    thread.
//! 3. Barrier: wait until every spawned action of the rung has finished.
//!
//! Nothing from rung `k + 1` starts before rung `k` has fully retired in both
//! lanes.  After the last rung the batch's transition closure runs exactly
//! once, on the calling thread.
//!
//! The barrier is `rayon::ThreadPool::in_place_scope`: the scope body runs on
//! the caller, spawned jobs go to the pool, and the scope does not return
//! until all of them have completed.  If the caller is itself a worker of the
//! pool it keeps executing pool jobs while it waits, so nesting a batch
//! inside a parallel system cannot starve the pool.

use std::time::{Duration, Instant};

use evo_core::{EcsConfig, WorkerPool};
use tracing::{trace, warn};

use crate::batch::RungStage;
use crate::{ActionBatch, BatchError, BatchResult};

/// Counters describing one executed batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Rungs executed.
    pub rungs: usize,
    /// Actions executed across both lanes.
    pub actions: usize,
    /// Whether the transition closure ran.
    pub transition_ran: bool,
}

#[derive(Clone, Debug)]
pub struct StagedExecutor {
    pool:          WorkerPool,
    rung_deadline: Option<Duration>,
}

impl StagedExecutor {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool, rung_deadline: None }
    }

    /// Executor on `pool` with the rung deadline taken from `config`.
    pub fn from_config(pool: WorkerPool, config: &EcsConfig) -> Self {
        Self { pool, rung_deadline: config.rung_deadline }
    }

    pub fn with_rung_deadline(mut self, deadline: Duration) -> Self {
        self.rung_deadline = Some(deadline);
        self
    }

    #[inline]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    #[inline]
    pub fn rung_deadline(&self) -> Option<Duration> {
        self.rung_deadline
    }

    /// Run `batch` to completion.
    ///
    /// With a rung deadline configured, a rung that overruns it is still
    /// waited for in full; the remaining rungs and the transition closure
    /// are then abandoned and reported through
    /// [`BatchError::RungDeadlineExceeded`].
    pub fn execute(&self, mut batch: ActionBatch<'_>) -> BatchResult<BatchReport> {
        let mut report = BatchReport::default();
        if batch.is_empty() {
            return Ok(report);
        }

        while let Some(stage) = batch.pop_rung() {
            let RungStage { rung, main_thread, multi_thread } = stage;
            let actions = main_thread.len() + multi_thread.len();
            trace!(rung, main_thread = main_thread.len(), multi_thread = multi_thread.len(), "rung start");

            let started = Instant::now();
            self.pool.rayon().in_place_scope(|scope| {
                for action in multi_thread {
                    scope.spawn(move |_| action());
                }
                for action in main_thread {
                    action();
                }
            });
            let elapsed = started.elapsed();

            report.rungs += 1;
            report.actions += actions;
            trace!(rung, ?elapsed, "rung retired");

            if let Some(deadline) = self.rung_deadline {
                if elapsed > deadline {
                    let skipped_rungs = batch.rung_count();
                    warn!(rung, ?elapsed, ?deadline, skipped_rungs, "rung overran its deadline; abandoning batch");
                    return Err(BatchError::RungDeadlineExceeded { rung, elapsed, deadline, skipped_rungs });
                }
            }
        }

        if let Some(transition) = batch.take_transition() {
            transition();
            report.transition_ran = true;
        }
        Ok(report)
    }
}
