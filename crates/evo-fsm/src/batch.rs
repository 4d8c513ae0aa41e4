//! Behaviour action batches.
//!
//! A batch is what a behaviour hands back from one enter/tick/exit call: two
//! rung-indexed lanes of closures plus an optional transition closure.
//!
//! ```text
//!   rung 0 │ main-thread: [a, b]        multi-thread: {c, d, e}
//!   rung 1 │ main-thread: []            multi-thread: {f}
//!   rung 4 │ main-thread: [g]           multi-thread: {}
//!   ──────────────────────────────────────────────────────────
//!   then   │ transition closure (at most once)
//! ```
//!
//! Main-thread actions run in insertion order on the thread executing the
//! batch and need not be `Send`.  Multi-thread actions run on the worker
//! pool in no particular order.  See [`StagedExecutor`](crate::StagedExecutor)
//! for the execution contract.

use std::collections::BTreeMap;

/// Execution-order bucket inside a batch.
pub type Rung = u32;

pub type MainThreadAction<'a> = Box<dyn FnOnce() + 'a>;
pub type WorkerAction<'a> = Box<dyn FnOnce() + Send + 'a>;
pub type TransitionAction<'a> = Box<dyn FnOnce() + 'a>;

/// One rung taken out of a batch, ready to execute.
pub(crate) struct RungStage<'a> {
    pub rung:         Rung,
    pub main_thread:  Vec<MainThreadAction<'a>>,
    pub multi_thread: Vec<WorkerAction<'a>>,
}

/// A two-lane, rung-ordered bundle of actions.
///
/// `ActionBatch::default()` is the empty batch; executing it does nothing.
#[derive(Default)]
pub struct ActionBatch<'a> {
    main_thread:  BTreeMap<Rung, Vec<MainThreadAction<'a>>>,
    multi_thread: BTreeMap<Rung, Vec<WorkerAction<'a>>>,
    transition:   Option<TransitionAction<'a>>,
}

impl<'a> ActionBatch<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sequential action to `rung`'s main-thread list.
    pub fn main_thread(mut self, rung: Rung, action: impl FnOnce() + 'a) -> Self {
        self.push_main_thread(rung, action);
        self
    }

    /// Add a parallel action to `rung`'s multi-thread bag.
    pub fn multi_thread(mut self, rung: Rung, action: impl FnOnce() + Send + 'a) -> Self {
        self.push_multi_thread(rung, action);
        self
    }

    /// Set the closure invoked once after every rung has drained.  Replaces
    /// any previously set closure.
    pub fn on_complete(mut self, transition: impl FnOnce() + 'a) -> Self {
        self.transition = Some(Box::new(transition));
        self
    }

    pub fn push_main_thread(&mut self, rung: Rung, action: impl FnOnce() + 'a) {
        self.main_thread.entry(rung).or_default().push(Box::new(action));
    }

    pub fn push_multi_thread(&mut self, rung: Rung, action: impl FnOnce() + Send + 'a) {
        self.multi_thread.entry(rung).or_default().push(Box::new(action));
    }

    /// `true` if neither lane holds an action and there is no transition
    /// closure.
    pub fn is_empty(&self) -> bool {
        self.main_thread.is_empty() && self.multi_thread.is_empty() && self.transition.is_none()
    }

    /// Number of distinct occupied rungs across both lanes.
    pub fn rung_count(&self) -> usize {
        let mut rungs: Vec<Rung> = self.main_thread.keys().chain(self.multi_thread.keys()).copied().collect();
        rungs.sort_unstable();
        rungs.dedup();
        rungs.len()
    }

    /// Total actions across both lanes (the transition closure excluded).
    pub fn action_count(&self) -> usize {
        self.main_thread.values().map(Vec::len).sum::<usize>()
            + self.multi_thread.values().map(Vec::len).sum::<usize>()
    }

    pub fn has_transition(&self) -> bool {
        self.transition.is_some()
    }

    /// Remove and return the lowest occupied rung from both lanes.
    pub(crate) fn pop_rung(&mut self) -> Option<RungStage<'a>> {
        let next_main = self.main_thread.keys().next().copied();
        let next_multi = self.multi_thread.keys().next().copied();
        let rung = match (next_main, next_multi) {
            (None, None) => return None,
            (Some(m), None) => m,
            (None, Some(w)) => w,
            (Some(m), Some(w)) => m.min(w),
        };
        Some(RungStage {
            rung,
            main_thread:  self.main_thread.remove(&rung).unwrap_or_default(),
            multi_thread: self.multi_thread.remove(&rung).unwrap_or_default(),
        })
    }

    pub(crate) fn take_transition(&mut self) -> Option<TransitionAction<'a>> {
        self.transition.take()
    }
}

impl std::fmt::Debug for ActionBatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBatch")
            .field("rungs", &self.rung_count())
            .field("actions", &self.action_count())
            .field("transition", &self.transition.is_some())
            .finish()
    }
}
