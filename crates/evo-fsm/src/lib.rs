//! `evo-fsm` — generic state machine with staged behaviour execution.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                     |
//! |----------------|--------------------------------------------------------------|
//! | [`state`]      | `FsmEnum` trait, `fsm_enum!` macro                           |
//! | [`batch`]      | `ActionBatch`, a two-lane, rung-ordered action bundle        |
//! | [`executor`]   | `StagedExecutor`, `BatchReport`                              |
//! | [`flag`]       | `FlagSender`, the pending-transition queue                   |
//! | [`behaviour`]  | `Behaviour` trait, `BehaviourParams`, `NoopBehaviour`        |
//! | [`fsm`]        | `Fsm<S, F>`, `TransitionRecord`                              |
//! | [`error`]      | `BatchError`, `FsmError`, result aliases                     |
//!
//! # Ordering guarantees
//!
//! * Within a rung: main-thread actions run in list order on the caller;
//!   multi-thread actions are unordered.
//! * Between rungs: every action of rung `k` (both lanes) finishes before
//!   any action of rung `k + 1` starts.
//! * Across a transition: origin exit batch → side effect → destination
//!   enter batch, strictly in that order.

pub mod batch;
pub mod behaviour;
pub mod error;
pub mod executor;
pub mod flag;
pub mod fsm;
pub mod state;

#[cfg(test)]
mod tests;

pub use batch::{ActionBatch, MainThreadAction, Rung, TransitionAction, WorkerAction};
pub use behaviour::{Behaviour, BehaviourParams, NoopBehaviour, ParamFactory};
pub use error::{BatchError, BatchResult, FsmError, FsmResult};
pub use executor::{BatchReport, StagedExecutor};
pub use flag::FlagSender;
pub use fsm::{Fsm, TransitionRecord};
pub use state::FsmEnum;
