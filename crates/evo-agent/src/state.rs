//! Agent states and decision flags.

use evo_fsm::fsm_enum;

fsm_enum! {
    /// What an agent is currently doing.
    pub enum AgentState {
        /// Freshly spawned; leaves on the first tick.
        Idle,
        Wander,
        /// Heading for a food source the brain has picked up.
        Forage,
        Eat,
        Flee,
        /// Terminal.
        Dead,
    }
}

fsm_enum! {
    /// Decisions raised by agent behaviours.
    pub enum AgentFlag {
        FoundFood,
        FoodGone,
        Threatened,
        Safe,
        Starved,
    }
}

impl AgentState {
    /// Every state except [`AgentState::Dead`].
    pub const LIVING: [AgentState; 5] = [
        AgentState::Idle,
        AgentState::Wander,
        AgentState::Forage,
        AgentState::Eat,
        AgentState::Flee,
    ];

    /// Energy burned per tick relative to the diet's base metabolism.
    pub fn exertion(self) -> f32 {
        match self {
            AgentState::Idle => 0.5,
            AgentState::Eat => 0.25,
            AgentState::Flee => 2.0,
            AgentState::Wander | AgentState::Forage => 1.0,
            AgentState::Dead => 0.0,
        }
    }
}
