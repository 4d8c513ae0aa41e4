//! Diets: the herbivore, carnivore, and scavenger wirings of the one agent
//! state machine.
//!
//! A diet contributes two things: a [`DietProfile`] of tuning constants,
//! and the set of transitions installed in the machine.  Behaviours are
//! shared; a flag the diet does not map is an ordinary no-op.

use crate::{AgentFlag, AgentState};

/// Tuning constants for one diet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DietProfile {
    /// Food signal at which a wandering agent starts foraging.
    pub food_threshold:   f32,
    /// Food signal meaning the agent has reached its food.
    pub eat_threshold:    f32,
    /// Threat signal that triggers fleeing.
    pub threat_threshold: f32,
    /// Base energy burned per tick, scaled by [`AgentState::exertion`].
    pub metabolism:       f32,
    /// Energy gained per tick while eating.
    pub bite:             f32,
    /// Energy ceiling; a full agent stops eating.
    pub capacity:         f32,
    pub cruise_speed:     f32,
    pub flee_speed:       f32,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Diet {
    Herbivore,
    Carnivore,
    Scavenger,
}

impl Diet {
    pub const ALL: [Diet; 3] = [Diet::Herbivore, Diet::Carnivore, Diet::Scavenger];

    pub fn profile(self) -> DietProfile {
        match self {
            Diet::Herbivore => DietProfile {
                food_threshold:   0.2,
                eat_threshold:    0.8,
                threat_threshold: 0.5,
                metabolism:       1.0,
                bite:             5.0,
                capacity:         100.0,
                cruise_speed:     1.0,
                flee_speed:       2.0,
            },
            Diet::Carnivore => DietProfile {
                food_threshold:   0.4,
                eat_threshold:    0.9,
                threat_threshold: f32::INFINITY,
                metabolism:       1.5,
                bite:             12.0,
                capacity:         150.0,
                cruise_speed:     1.5,
                flee_speed:       1.5,
            },
            Diet::Scavenger => DietProfile {
                food_threshold:   0.1,
                eat_threshold:    0.6,
                threat_threshold: 0.3,
                metabolism:       0.8,
                bite:             3.0,
                capacity:         80.0,
                cruise_speed:     1.2,
                flee_speed:       2.5,
            },
        }
    }

    /// `(origin, flag, destination)` triples installed for this diet.
    pub fn transitions(self) -> Vec<(AgentState, AgentFlag, AgentState)> {
        use AgentFlag::*;
        use AgentState::*;

        let mut table = vec![
            (Idle, Safe, Wander),
            (Wander, FoundFood, Forage),
            (Forage, FoundFood, Eat),
            (Forage, FoodGone, Wander),
            (Eat, FoodGone, Wander),
        ];
        table.extend(AgentState::LIVING.iter().map(|&s| (s, Starved, Dead)));

        let flees_from: &[AgentState] = match self {
            Diet::Herbivore => &[Idle, Wander, Forage, Eat],
            Diet::Carnivore => &[],
            // Scavengers only spook once committed to a meal.
            Diet::Scavenger => &[Forage, Eat],
        };
        table.extend(flees_from.iter().map(|&s| (s, Threatened, Flee)));
        if !flees_from.is_empty() {
            table.push((Flee, Safe, Wander));
        }
        table
    }
}

impl std::fmt::Display for Diet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Diet::Herbivore => "herbivore",
            Diet::Carnivore => "carnivore",
            Diet::Scavenger => "scavenger",
        };
        f.write_str(name)
    }
}
