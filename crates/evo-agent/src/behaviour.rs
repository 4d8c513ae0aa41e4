//! The diet-parameterized behaviour installed for every living state.
//!
//! Tick batch layout:
//!
//! ```text
//!   rung 0 │ multi-thread: metabolism
//!   rung 1 │ multi-thread: state action (drive update, or feeding)
//!   then   │ decide, raise at most one flag
//! ```

use std::sync::Arc;

use evo_fsm::{ActionBatch, Behaviour, FlagSender};
use tracing::trace;

use crate::{AgentFlag, AgentState, Blackboard, DietProfile, Drive, Senses, Vitals};

const METABOLISM_RUNG: u32 = 0;
const ACTION_RUNG: u32 = 1;

/// Behaviour for one living [`AgentState`] under one diet.
///
/// Receives the agent's [`Blackboard`] through its parameter factories.
pub struct DietBehaviour {
    state:   AgentState,
    profile: DietProfile,
    /// Whether the diet maps `(state, Threatened)`.
    flees:   bool,
}

impl DietBehaviour {
    pub fn new(state: AgentState, profile: DietProfile, flees: bool) -> Self {
        Self { state, profile, flees }
    }

    fn drive_for(&self, senses: &Senses) -> Drive {
        let p = &self.profile;
        match self.state {
            AgentState::Wander => Drive { speed: p.cruise_speed, heading: senses.heading },
            AgentState::Forage => Drive { speed: p.cruise_speed * 1.5, heading: senses.heading },
            AgentState::Flee => Drive {
                speed:   p.flee_speed,
                heading: [-senses.heading[0], -senses.heading[1]],
            },
            AgentState::Idle | AgentState::Eat | AgentState::Dead => Drive::STOP,
        }
    }
}

/// The single flag a `state` agent raises this tick, if any.
///
/// Starvation outranks danger, which outranks food.
pub fn decide(state: AgentState, profile: &DietProfile, flees: bool, senses: &Senses, vitals: &Vitals) -> Option<AgentFlag> {
    if !vitals.alive || state == AgentState::Dead {
        return None;
    }
    if vitals.energy <= 0.0 {
        return Some(AgentFlag::Starved);
    }
    if flees && state != AgentState::Flee && senses.threat >= profile.threat_threshold {
        return Some(AgentFlag::Threatened);
    }
    let hungry = vitals.energy < profile.capacity;
    match state {
        AgentState::Idle => Some(AgentFlag::Safe),
        AgentState::Flee => (senses.threat < profile.threat_threshold * 0.5).then_some(AgentFlag::Safe),
        AgentState::Wander => (hungry && senses.food >= profile.food_threshold).then_some(AgentFlag::FoundFood),
        AgentState::Forage if senses.food >= profile.eat_threshold => Some(AgentFlag::FoundFood),
        AgentState::Forage => (senses.food < profile.food_threshold).then_some(AgentFlag::FoodGone),
        AgentState::Eat => (!hungry || senses.food < profile.food_threshold).then_some(AgentFlag::FoodGone),
        AgentState::Dead => None,
    }
}

impl Behaviour<AgentFlag> for DietBehaviour {
    type Params = Arc<Blackboard>;

    fn on_tick(&self, params: Option<Arc<Blackboard>>, flags: &FlagSender<AgentFlag>) -> ActionBatch<'_> {
        let Some(board) = params else {
            return ActionBatch::default();
        };
        let cost = self.profile.metabolism * self.state.exertion();

        let mut batch = ActionBatch::new();
        {
            let board = Arc::clone(&board);
            batch.push_multi_thread(METABOLISM_RUNG, move || {
                board.burn(cost);
            });
        }
        {
            let board = Arc::clone(&board);
            if self.state == AgentState::Eat {
                let (bite, capacity) = (self.profile.bite, self.profile.capacity);
                batch.push_multi_thread(ACTION_RUNG, move || {
                    board.feed(bite, capacity);
                });
            } else {
                batch.push_multi_thread(ACTION_RUNG, move || board.set_drive(self.drive_for(&board.senses())));
            }
        }

        let flags = flags.clone();
        batch.on_complete(move || {
            if let Some(flag) = decide(self.state, &self.profile, self.flees, &board.senses(), &board.vitals()) {
                flags.raise(flag);
            }
        })
    }

    fn on_enter(&self, params: Option<Arc<Blackboard>>, _flags: &FlagSender<AgentFlag>) -> ActionBatch<'_> {
        let Some(board) = params else {
            return ActionBatch::default();
        };
        ActionBatch::new().main_thread(0, move || {
            trace!(state = ?self.state, energy = board.vitals().energy, "entering state");
            board.set_drive(self.drive_for(&board.senses()));
        })
    }

    fn on_exit(&self, params: Option<Arc<Blackboard>>, _flags: &FlagSender<AgentFlag>) -> ActionBatch<'_> {
        match (self.state, params) {
            (AgentState::Eat, Some(board)) => ActionBatch::new().multi_thread(0, move || board.finish_meal()),
            _ => ActionBatch::default(),
        }
    }
}
