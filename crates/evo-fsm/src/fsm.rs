//! The generic finite state machine.

use std::fmt;

use evo_core::{EcsConfig, WorkerPool};
use tracing::{debug, trace};

use crate::behaviour::{Bound, InstalledBehaviour};
use crate::{ActionBatch, Behaviour, BehaviourParams, FlagSender, FsmEnum, FsmError, FsmResult, StagedExecutor};

/// One transition that actually fired.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TransitionRecord<S, F> {
    pub from: S,
    pub flag: F,
    pub to:   S,
}

struct TransitionCell<S> {
    destination:   S,
    on_transition: Option<Box<dyn Fn() + Send + Sync>>,
}

/// Enum-indexed state machine over states `S` and flags `F`.
///
/// # Lifecycle
///
/// 1. Install behaviours ([`add_behaviour`](Self::add_behaviour)) and
///    transitions ([`set_transition`](Self::set_transition)).
/// 2. Place the machine with [`force_transition`](Self::force_transition).
/// 3. Call [`tick`](Self::tick) once per simulation step.
///
/// After placement, the state only changes through flags: a flag raised
/// while a batch runs is queued in the machine's [`FlagSender`] and applied
/// once the batch has returned, so `current` and the table never change
/// underneath a running rung.
pub struct Fsm<S: FsmEnum, F: FsmEnum> {
    current:                 Option<S>,
    behaviours:              Vec<Option<Box<dyn InstalledBehaviour<F>>>>,
    table:                   Vec<Option<TransitionCell<S>>>,
    flags:                   FlagSender<F>,
    executor:                StagedExecutor,
    max_chained_transitions: usize,
}

impl<S: FsmEnum, F: FsmEnum> Fsm<S, F> {
    /// Machine driven by `executor`, with the default chain limit of
    /// [`EcsConfig`].
    pub fn new(executor: StagedExecutor) -> Self {
        Self {
            current:                 None,
            behaviours:              (0..S::COUNT).map(|_| None).collect(),
            table:                   (0..S::COUNT * F::COUNT).map(|_| None).collect(),
            flags:                   FlagSender::new(),
            executor,
            max_chained_transitions: EcsConfig::default().max_chained_transitions,
        }
    }

    /// Machine on `pool`, with the rung deadline and chain limit from
    /// `config`.
    pub fn from_config(pool: WorkerPool, config: &EcsConfig) -> Self {
        let mut fsm = Self::new(StagedExecutor::from_config(pool, config));
        fsm.max_chained_transitions = config.max_chained_transitions;
        fsm
    }

    pub fn with_max_chained_transitions(mut self, limit: usize) -> Self {
        self.max_chained_transitions = limit.max(1);
        self
    }

    // ── Setup ─────────────────────────────────────────────────────────────

    /// Install a default-constructed `B` for `state`.
    ///
    /// Returns `false`, leaving the installed behaviour in place, if `state`
    /// already has one.
    pub fn add_behaviour<B>(&mut self, state: S, params: BehaviourParams<B::Params>) -> bool
    where
        B: Behaviour<F> + Default,
    {
        self.add_behaviour_instance(state, B::default(), params)
    }

    /// Install `behaviour` for `state`.  Same no-op rule as
    /// [`add_behaviour`](Self::add_behaviour).
    pub fn add_behaviour_instance<B>(&mut self, state: S, behaviour: B, params: BehaviourParams<B::Params>) -> bool
    where
        B: Behaviour<F>,
    {
        let slot = &mut self.behaviours[state.index()];
        if let Some(existing) = slot {
            debug!(state = state.name(), installed = existing.type_name(), "behaviour already installed");
            return false;
        }
        *slot = Some(Box::new(Bound::new(behaviour, params)));
        true
    }

    /// Map `(origin, flag)` to `destination`, overwriting the cell.
    pub fn set_transition(&mut self, origin: S, flag: F, destination: S) {
        self.table[cell_index::<S, F>(origin, flag)] = Some(TransitionCell {
            destination,
            on_transition: None,
        });
    }

    /// Like [`set_transition`](Self::set_transition), with a side effect run
    /// between the origin's exit batch and the destination's enter batch.
    pub fn set_transition_with(
        &mut self,
        origin:        S,
        flag:          F,
        destination:   S,
        on_transition: impl Fn() + Send + Sync + 'static,
    ) {
        self.table[cell_index::<S, F>(origin, flag)] = Some(TransitionCell {
            destination,
            on_transition: Some(Box::new(on_transition)),
        });
    }

    /// Set the current state directly, running no exit or enter batch.
    pub fn force_transition(&mut self, state: S) {
        debug!(state = state.name(), "forced state");
        self.current = Some(state);
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn current_state(&self) -> Option<S> {
        self.current
    }

    pub fn has_behaviour(&self, state: S) -> bool {
        self.behaviours[state.index()].is_some()
    }

    /// Destination mapped for `(origin, flag)`, if any.
    pub fn transition_target(&self, origin: S, flag: F) -> Option<S> {
        self.table[cell_index::<S, F>(origin, flag)]
            .as_ref()
            .map(|cell| cell.destination)
    }

    /// A handle for raising flags from outside the machine's own batches.
    /// Flags raised this way are applied after the next batch this machine
    /// runs.
    pub fn flag_sender(&self) -> FlagSender<F> {
        self.flags.clone()
    }

    pub fn executor(&self) -> &StagedExecutor {
        &self.executor
    }

    // ── Driving ───────────────────────────────────────────────────────────

    /// Run the current state's tick batch, then apply any flag it raised.
    ///
    /// A no-op (empty result) when the machine is unplaced or no behaviour is
    /// installed for the current state.  Returns every transition that fired,
    /// in order.
    pub fn tick(&mut self) -> FsmResult<Vec<TransitionRecord<S, F>>> {
        let Some(state) = self.current else {
            return Ok(Vec::new());
        };
        let Some(behaviour) = self.behaviours[state.index()].as_deref() else {
            trace!(state = state.name(), "no behaviour for state");
            return Ok(Vec::new());
        };
        let batch = behaviour.tick_batch(&self.flags);
        run_batch(&self.executor, &self.flags, batch)?;
        self.drain_pending()
    }

    /// Apply `flag` to the current state now.
    ///
    /// An unassigned `(current, flag)` cell is a no-op.  Otherwise runs the
    /// exiting state's exit batch, the transition side effect, moves to the
    /// destination, and runs its enter batch.  Flags raised by those batches
    /// are applied afterwards, up to the configured chain limit.
    pub fn transition(&mut self, flag: F) -> FsmResult<Vec<TransitionRecord<S, F>>> {
        let mut fired = Vec::new();
        if let Some(record) = self.apply(flag)? {
            fired.push(record);
            fired.extend(self.drain_pending()?);
        }
        Ok(fired)
    }

    fn drain_pending(&mut self) -> FsmResult<Vec<TransitionRecord<S, F>>> {
        let mut fired = Vec::new();
        let mut drained = 0;
        while let Some(flag) = self.flags.take() {
            if drained == self.max_chained_transitions {
                return Err(FsmError::TransitionChainTooLong { limit: self.max_chained_transitions });
            }
            drained += 1;
            if let Some(record) = self.apply(flag)? {
                fired.push(record);
            }
        }
        Ok(fired)
    }

    fn apply(&mut self, flag: F) -> FsmResult<Option<TransitionRecord<S, F>>> {
        let Some(origin) = self.current else {
            trace!(flag = flag.name(), "flag ignored: machine not placed");
            return Ok(None);
        };
        let Some(cell) = self.table[cell_index::<S, F>(origin, flag)].as_ref() else {
            trace!(state = origin.name(), flag = flag.name(), "unassigned transition");
            return Ok(None);
        };
        let destination = cell.destination;

        if let Some(behaviour) = self.behaviours[origin.index()].as_deref() {
            run_batch(&self.executor, &self.flags, behaviour.exit_batch(&self.flags))?;
        }
        if let Some(side_effect) = &cell.on_transition {
            side_effect();
        }
        self.current = Some(destination);
        if let Some(behaviour) = self.behaviours[destination.index()].as_deref() {
            run_batch(&self.executor, &self.flags, behaviour.enter_batch(&self.flags))?;
        }

        debug!(from = origin.name(), flag = flag.name(), to = destination.name(), "transition");
        Ok(Some(TransitionRecord { from: origin, flag, to: destination }))
    }
}

impl<S: FsmEnum, F: FsmEnum> fmt::Debug for Fsm<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm")
            .field("current", &self.current)
            .field("behaviours", &self.behaviours.iter().filter(|b| b.is_some()).count())
            .field("transitions", &self.table.iter().filter(|c| c.is_some()).count())
            .field("pending", &self.flags.pending())
            .finish()
    }
}

#[inline]
fn cell_index<S: FsmEnum, F: FsmEnum>(state: S, flag: F) -> usize {
    state.index() * F::COUNT + flag.index()
}

/// Execute one batch; on failure discard whatever flag the completed rungs
/// queued so it cannot fire on a later call.
fn run_batch<F: FsmEnum>(executor: &StagedExecutor, flags: &FlagSender<F>, batch: ActionBatch<'_>) -> FsmResult<()> {
    match executor.execute(batch) {
        Ok(report) => {
            trace!(rungs = report.rungs, actions = report.actions, "batch complete");
            Ok(())
        }
        Err(e) => {
            if let Some(flag) = flags.take() {
                debug!(flag = flag.name(), "discarding flag raised by failed batch");
            }
            Err(e.into())
        }
    }
}
