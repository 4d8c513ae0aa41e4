//! `evo-system` — systems and the parallel tick scheduler.
//!
//! # Tick
//!
//! ```text
//! Scheduler::tick(&world, dt):
//!   for every system, concurrently on the world's pool:
//!     pre_execute     resolve query caches
//!     execute         per-entity parallel work
//!     post_execute    sequential cleanup
//!   barrier; collect failures; advance the tick counter
//! ```
//!
//! | Module        | Contents                                            |
//! |---------------|-----------------------------------------------------|
//! | [`system`]    | `System` trait, `ParallelBounds`                    |
//! | [`cache`]     | `QueryCache<Q>`                                     |
//! | [`scheduler`] | `Scheduler`, `TickReport`, `SystemTiming`           |
//! | [`observer`]  | `TickObserver`, `NoopObserver`                      |
//! | [`builder`]   | `SchedulerBuilder`                                  |
//! | [`error`]     | `SystemError`, `SchedulerError`, result aliases     |

pub mod builder;
pub mod cache;
pub mod error;
pub mod observer;
pub mod scheduler;
pub mod system;


pub use builder::SchedulerBuilder;
pub use cache::QueryCache;
pub use error::{SchedulerError, SchedulerResult, SystemError, SystemResult};
pub use observer::{NoopObserver, TickObserver};
pub use scheduler::{Scheduler, SystemTiming, TickReport};
pub use system::{ParallelBounds, System};
