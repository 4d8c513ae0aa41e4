//! `evo-ecs` — entity/component storage for the `evo` framework.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`component`]   | `Component`, `ComponentHandle<T>`, `TypedStore<T>`, `ComponentStore` |
//! | [`registry`]    | `EntityRegistry`, `Membership`, `TagKind`                  |
//! | [`query`]       | `ComponentSet` (tuple queries)                             |
//! | [`world`]       | `World`, the explicit simulation context                   |
//! | [`builder`]     | `WorldBuilder` (fluent construction)                       |
//!
//! # Concurrency
//!
//! Everything is reachable through `&World`.  Arena maps and membership
//! records sit behind `parking_lot` locks; component values sit behind a
//! per-instance lock inside their [`ComponentHandle`].  Snapshots and
//! membership scans run on the world's bounded rayon pool.

pub mod builder;
pub mod component;
pub mod query;
pub mod registry;
pub mod world;

#[cfg(test)]
mod tests;

pub use builder::WorldBuilder;
pub use component::{Component, ComponentHandle, ComponentStore, ErasedStore, Snapshot, TypedStore};
pub use query::ComponentSet;
pub use registry::{EntityRegistry, Membership, TagKind};
pub use world::World;
