//! The `Behaviour` trait: the per-state extension point for agent logic.

use std::marker::PhantomData;

use crate::{ActionBatch, FlagSender, FsmEnum};

/// Enter/tick/exit logic bound to one FSM state.
///
/// Each hook returns a fresh [`ActionBatch`].  The batch may borrow from the
/// behaviour itself; anything it needs from outside arrives through
/// `params`, produced by the factory registered for that call site (or
/// `None` when no factory was registered, or the factory declined).
///
/// Flags are raised through `flags`, which can be cloned into the batch's
/// closures, including multi-thread ones.
///
/// # Example
///
/// ```rust,ignore
/// struct Graze;
///
/// impl Behaviour<AgentFlag> for Graze {
///     type Params = Arc<Blackboard>;
///
///     fn on_tick(&self, params: Option<Arc<Blackboard>>, flags: &FlagSender<AgentFlag>) -> ActionBatch<'_> {
///         let Some(board) = params else { return ActionBatch::default() };
///         let flags = flags.clone();
///         ActionBatch::new()
///             .multi_thread(0, { let b = Arc::clone(&board); move || b.eat(1.0) })
///             .on_complete(move || if board.is_full() { flags.raise(AgentFlag::Full); })
///     }
/// }
/// ```
pub trait Behaviour<F: FsmEnum>: Send + Sync + 'static {
    /// Per-call parameters produced by the registered factories.
    type Params: 'static;

    fn on_tick(&self, params: Option<Self::Params>, flags: &FlagSender<F>) -> ActionBatch<'_>;

    /// Default: empty batch.
    fn on_enter(&self, _params: Option<Self::Params>, _flags: &FlagSender<F>) -> ActionBatch<'_> {
        ActionBatch::default()
    }

    /// Default: empty batch.
    fn on_exit(&self, _params: Option<Self::Params>, _flags: &FlagSender<F>) -> ActionBatch<'_> {
        ActionBatch::default()
    }
}

/// Produces the parameters for one hook call.
pub type ParamFactory<P> = Box<dyn Fn() -> Option<P> + Send + Sync>;

/// Optional parameter factories for a behaviour's three call sites.
pub struct BehaviourParams<P> {
    tick:  Option<ParamFactory<P>>,
    enter: Option<ParamFactory<P>>,
    exit:  Option<ParamFactory<P>>,
}

impl<P> Default for BehaviourParams<P> {
    fn default() -> Self {
        Self { tick: None, enter: None, exit: None }
    }
}

impl<P> BehaviourParams<P> {
    /// No factories: every hook receives `None`.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn tick(mut self, factory: impl Fn() -> Option<P> + Send + Sync + 'static) -> Self {
        self.tick = Some(Box::new(factory));
        self
    }

    pub fn enter(mut self, factory: impl Fn() -> Option<P> + Send + Sync + 'static) -> Self {
        self.enter = Some(Box::new(factory));
        self
    }

    pub fn exit(mut self, factory: impl Fn() -> Option<P> + Send + Sync + 'static) -> Self {
        self.exit = Some(Box::new(factory));
        self
    }

    /// Register the same factory for all three call sites.
    pub fn all(self, factory: impl Fn() -> Option<P> + Send + Sync + Clone + 'static) -> Self {
        self.tick(factory.clone()).enter(factory.clone()).exit(factory)
    }
}

fn produce<P>(factory: &Option<ParamFactory<P>>) -> Option<P> {
    factory.as_ref().and_then(|f| f())
}

// ── Type-erased installed behaviour ───────────────────────────────────────────

/// A behaviour bound to its parameter factories, with the parameter type
/// erased so one FSM can hold behaviours of different `Params`.
pub(crate) trait InstalledBehaviour<F>: Send + Sync {
    fn tick_batch(&self, flags: &FlagSender<F>) -> ActionBatch<'_>;
    fn enter_batch(&self, flags: &FlagSender<F>) -> ActionBatch<'_>;
    fn exit_batch(&self, flags: &FlagSender<F>) -> ActionBatch<'_>;
    fn type_name(&self) -> &'static str;
}

pub(crate) struct Bound<B: Behaviour<F>, F: FsmEnum> {
    behaviour: B,
    params:    BehaviourParams<B::Params>,
    _flag:     PhantomData<fn() -> F>,
}

impl<B: Behaviour<F>, F: FsmEnum> Bound<B, F> {
    pub(crate) fn new(behaviour: B, params: BehaviourParams<B::Params>) -> Self {
        Self { behaviour, params, _flag: PhantomData }
    }
}

impl<B: Behaviour<F>, F: FsmEnum> InstalledBehaviour<F> for Bound<B, F> {
    fn tick_batch(&self, flags: &FlagSender<F>) -> ActionBatch<'_> {
        self.behaviour.on_tick(produce(&self.params.tick), flags)
    }

    fn enter_batch(&self, flags: &FlagSender<F>) -> ActionBatch<'_> {
        self.behaviour.on_enter(produce(&self.params.enter), flags)
    }

    fn exit_batch(&self, flags: &FlagSender<F>) -> ActionBatch<'_> {
        self.behaviour.on_exit(produce(&self.params.exit), flags)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<B>()
    }
}

// ── NoopBehaviour ─────────────────────────────────────────────────────────────

/// A [`Behaviour`] whose hooks all return the empty batch.
///
/// Useful for terminal states and as a placeholder in tests.
#[derive(Default, Clone, Copy, Debug)]
pub struct NoopBehaviour;

impl<F: FsmEnum> Behaviour<F> for NoopBehaviour {
    type Params = ();

    fn on_tick(&self, _params: Option<()>, _flags: &FlagSender<F>) -> ActionBatch<'_> {
        ActionBatch::default()
    }
}
