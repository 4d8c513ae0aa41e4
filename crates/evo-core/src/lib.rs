//! `evo-core` — foundational types for the `evo` ECS + staged-FSM framework.
//!
//! This crate is a dependency of every other `evo-*` crate.  It intentionally
//! has no `evo-*` dependencies and few external ones (`rand`, `rayon`,
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `EntityId`, `SystemId`                                    |
//! | [`time`]    | `Tick`                                                    |
//! | [`config`]  | `EcsConfig`, `QueryCachePolicy`                           |
//! | [`pool`]    | `WorkerPool` (bounded rayon pool shared by all layers)    |
//! | [`rng`]     | `EntityRng` (per-entity), `SimRng` (global)               |
//! | [`error`]   | `EcsError`, `EcsResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and `EcsConfig`.     |

pub mod config;
pub mod error;
pub mod ids;
pub mod pool;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{EcsConfig, QueryCachePolicy};
pub use error::{EcsError, EcsResult};
pub use ids::{EntityId, SystemId};
pub use pool::WorkerPool;
pub use rng::{EntityRng, SimRng};
pub use time::Tick;
