//! `evo-agent` — evolving agents on top of the ECS and FSM core.
//!
//! Herbivores, carnivores, and scavengers share one state machine layout
//! ([`AgentState`] × [`AgentFlag`]) and one behaviour type; a [`Diet`] only
//! picks tuning constants and which transitions exist.
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`components`]  | `InputComponent`, `OutputComponent`, `NeuralNetComponent`  |
//! | [`state`]       | `AgentState`, `AgentFlag`                                  |
//! | [`blackboard`]  | `Blackboard`, `Senses`, `Vitals`, `Drive`                  |
//! | [`diet`]        | `Diet`, `DietProfile`, transition tables                   |
//! | [`behaviour`]   | `DietBehaviour`, `decide`                                  |
//! | [`agent_fsm`]   | `build_agent_fsm`, `spawn_agent`, `AgentFsmComponent`      |
//! | [`brain`]       | `BrainDecisionSystem`                                      |
//! | [`motion`]      | `Position`, `Velocity`, `MovementSystem`, `SteeringSystem` |

pub mod agent_fsm;
pub mod behaviour;
pub mod blackboard;
pub mod brain;
pub mod components;
pub mod diet;
pub mod motion;
pub mod state;


pub use agent_fsm::{AgentFsm, AgentFsmComponent, build_agent_fsm, spawn_agent};
pub use behaviour::{DietBehaviour, decide};
pub use blackboard::{Blackboard, BlackboardComponent, Drive, Senses, Vitals};
pub use brain::BrainDecisionSystem;
pub use components::{InputComponent, NeuralNetComponent, NeuronLayer, OutputComponent};
pub use diet::{Diet, DietProfile};
pub use motion::{MovementSystem, Position, SteeringSystem, Velocity};
pub use state::{AgentFlag, AgentState};
