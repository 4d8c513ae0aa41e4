//! Diet-configured agent state machines.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use evo_core::{EcsResult, EntityId};
use evo_ecs::World;
use evo_fsm::{BehaviourParams, Fsm, FsmEnum, FsmResult, NoopBehaviour, StagedExecutor, TransitionRecord};
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::{AgentFlag, AgentState, Blackboard, BlackboardComponent, Diet, DietBehaviour};

pub type AgentFsm = Fsm<AgentState, AgentFlag>;

/// Build the state machine for one `diet` agent, placed in
/// [`AgentState::Idle`].
///
/// Every living state gets a [`DietBehaviour`] fed with `blackboard`;
/// [`AgentState::Dead`] gets a [`NoopBehaviour`].  Transitions into `Dead`
/// mark the blackboard dead as their side effect.
pub fn build_agent_fsm(diet: Diet, executor: StagedExecutor, blackboard: Arc<Blackboard>) -> AgentFsm {
    let mut fsm = AgentFsm::new(executor);

    for (origin, flag, destination) in diet.transitions() {
        if destination == AgentState::Dead {
            let board = Arc::clone(&blackboard);
            fsm.set_transition_with(origin, flag, destination, move || board.kill());
        } else {
            fsm.set_transition(origin, flag, destination);
        }
    }

    let profile = diet.profile();
    for state in AgentState::LIVING {
        let flees = fsm.transition_target(state, AgentFlag::Threatened).is_some();
        let board = Arc::clone(&blackboard);
        fsm.add_behaviour_instance(
            state,
            DietBehaviour::new(state, profile, flees),
            BehaviourParams::none().all(move || Some(Arc::clone(&board))),
        );
    }
    fsm.add_behaviour::<NoopBehaviour>(AgentState::Dead, BehaviourParams::none());

    fsm.force_transition(AgentState::Idle);
    debug!(%diet, "agent fsm built");
    fsm
}

/// Create an entity carrying a fresh `diet` agent: an [`AgentFsmComponent`]
/// running on the world's pool and a [`BlackboardComponent`] sharing its
/// blackboard.
pub fn spawn_agent(world: &World, diet: Diet, energy: f32) -> EcsResult<EntityId> {
    let executor = StagedExecutor::from_config(world.pool().clone(), world.config());
    let agent = AgentFsmComponent::new(diet, executor, energy);
    let entity = world.create_entity();
    world.add_component(entity, BlackboardComponent(Arc::clone(agent.blackboard())))?;
    world.add_component(entity, agent)?;
    Ok(entity)
}

/// An agent's state machine and blackboard, stored as a component.
///
/// The machine sits behind its own lock and [`tick`](Self::tick) takes
/// `&self`, so the component only ever needs a read guard.  Systems must
/// never take the component's write guard: a tick holds its read guard while
/// its batches wait on the pool, and a waiting worker may run another
/// system's job for this same agent.  [`state`](Self::state) and
/// [`is_alive`](Self::is_alive) never touch the machine's lock.
pub struct AgentFsmComponent {
    diet:       Diet,
    blackboard: Arc<Blackboard>,
    state:      AtomicUsize,
    fsm:        Mutex<AgentFsm>,
}

impl AgentFsmComponent {
    pub fn new(diet: Diet, executor: StagedExecutor, energy: f32) -> Self {
        let blackboard = Arc::new(Blackboard::new(energy));
        let fsm = build_agent_fsm(diet, executor, Arc::clone(&blackboard));
        let state = fsm.current_state().unwrap_or(AgentState::Idle).index();
        Self { diet, blackboard, state: AtomicUsize::new(state), fsm: Mutex::new(fsm) }
    }

    #[inline]
    pub fn diet(&self) -> Diet {
        self.diet
    }

    #[inline]
    pub fn blackboard(&self) -> &Arc<Blackboard> {
        &self.blackboard
    }

    /// State as of the end of the last completed tick.
    pub fn state(&self) -> AgentState {
        AgentState::from_index(self.state.load(Ordering::Acquire)).unwrap_or(AgentState::Idle)
    }

    pub fn is_alive(&self) -> bool {
        self.blackboard.vitals().alive
    }

    /// Exclusive access to the machine; blocks while a tick is running.
    pub fn fsm(&self) -> MutexGuard<'_, AgentFsm> {
        self.fsm.lock()
    }

    pub fn tick(&self) -> FsmResult<Vec<TransitionRecord<AgentState, AgentFlag>>> {
        let mut fsm = self.fsm.lock();
        let result = fsm.tick();
        if let Some(state) = fsm.current_state() {
            self.state.store(state.index(), Ordering::Release);
        }
        result
    }
}

impl std::fmt::Debug for AgentFsmComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentFsmComponent")
            .field("diet", &self.diet)
            .field("state", &self.state())
            .field("vitals", &self.blackboard.vitals())
            .finish()
    }
}
