//! The bounded worker pool shared by every parallel layer.
//!
//! One `WorkerPool` is created per world.  The scheduler runs systems inside
//! it, systems fan per-entity work out over it, and the staged executor spawns
//! multi-thread rungs on it.  Cloning is cheap (`Arc`), so every FSM can hold
//! its own handle to the same threads.

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{EcsError, EcsResult};

#[derive(Clone)]
pub struct WorkerPool {
    inner:   Arc<ThreadPool>,
    workers: usize,
}

impl WorkerPool {
    /// Spawn a pool of exactly `workers` threads.
    pub fn new(workers: usize) -> EcsResult<Self> {
        if workers == 0 {
            return Err(EcsError::Pool("a worker pool needs at least one thread".into()));
        }
        let inner = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("evo-worker-{i}"))
            .build()
            .map_err(|e| EcsError::Pool(e.to_string()))?;
        Ok(Self { inner: Arc::new(inner), workers })
    }

    /// Number of worker threads.
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The underlying rayon pool.
    #[inline]
    pub fn rayon(&self) -> &ThreadPool {
        &self.inner
    }

    /// Run `op` inside the pool so nested rayon calls use these workers.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.inner.install(op)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("workers", &self.workers).finish()
    }
}
