//! Framework configuration.
//!
//! `EcsConfig` is typically built in code by the application crate (or
//! deserialized with the `serde` feature) and handed to `WorldBuilder`.  The
//! world keeps a copy; systems receive the derived parallelism bounds in
//! `System::initialize`, and every FSM executor reads the rung deadline from
//! it.

use std::time::Duration;

use crate::{EcsError, EcsResult};

/// Historical worker cap of the staged executor.
pub const DEFAULT_MAX_WORKERS: usize = 32;

/// How a system's query cache reacts to population changes after the first
/// resolve.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueryCachePolicy {
    /// Resolve once on the first `pre_execute` and never again.  Systems
    /// observe the population that existed at their first tick.
    #[default]
    Frozen,

    /// Re-resolve whenever any queried component arena changed generation
    /// since the previous resolve.
    Refresh,
}

/// Top-level framework configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EcsConfig {
    /// Worker threads in the shared pool.  Bounds the parallelism of system
    /// scheduling, per-entity `execute` work, and multi-thread rungs.
    pub max_workers: usize,

    /// Smallest number of entities handed to one parallel task inside a
    /// system's `execute`.  Larger values reduce scheduling overhead for
    /// cheap per-entity work.
    pub min_entities_per_task: usize,

    /// Query cache refresh policy for every `QueryCache` in the world.
    pub query_cache: QueryCachePolicy,

    /// Optional wall-clock budget per rung.  The barrier still waits for the
    /// whole rung; exceeding the budget stops the batch with an error.
    pub rung_deadline: Option<Duration>,

    /// Upper bound on transitions drained back-to-back by one FSM call
    /// (flags raised by exit/enter batches chain further transitions).
    pub max_chained_transitions: usize,

    /// Master RNG seed.  The same seed always produces identical per-entity
    /// random streams.
    pub seed: u64,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_workers:             DEFAULT_MAX_WORKERS,
            min_entities_per_task:   64,
            query_cache:             QueryCachePolicy::Frozen,
            rung_deadline:           None,
            max_chained_transitions: 16,
            seed:                    0,
        }
    }
}

impl EcsConfig {
    /// Reject configurations the runtime cannot honour.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_workers == 0 {
            return Err(EcsError::Config("max_workers must be at least 1".into()));
        }
        if self.min_entities_per_task == 0 {
            return Err(EcsError::Config("min_entities_per_task must be at least 1".into()));
        }
        if self.max_chained_transitions == 0 {
            return Err(EcsError::Config("max_chained_transitions must be at least 1".into()));
        }
        if self.rung_deadline.is_some_and(|d| d.is_zero()) {
            return Err(EcsError::Config("rung_deadline must be non-zero when set".into()));
        }
        Ok(())
    }

    /// Builder-style override of `max_workers`.
    pub fn with_max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    pub fn with_query_cache(mut self, policy: QueryCachePolicy) -> Self {
        self.query_cache = policy;
        self
    }

    pub fn with_rung_deadline(mut self, deadline: Duration) -> Self {
        self.rung_deadline = Some(deadline);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
