//! Fluent builder for constructing a [`World`].
//!
//! # Usage
//!
//! ```rust
//! use evo_core::EcsConfig;
//! use evo_ecs::WorldBuilder;
//!
//! struct Position { x: f32 }
//! struct Dead;
//!
//! let world = WorldBuilder::new(EcsConfig::default().with_max_workers(2))
//!     .register_component::<Position>()
//!     .register_flag::<Dead>()
//!     .build()
//!     .unwrap();
//!
//! // Registered but empty: an empty view, not `None`.
//! assert!(world.get_components::<Position>().unwrap().is_empty());
//! ```

use evo_core::{EcsConfig, EcsResult, WorkerPool};

use crate::{Component, ComponentStore, World};

pub struct WorldBuilder {
    config:     EcsConfig,
    components: ComponentStore,
    flags:      ComponentStore,
}

impl WorldBuilder {
    pub fn new(config: EcsConfig) -> Self {
        Self {
            config,
            components: ComponentStore::new(),
            flags:      ComponentStore::new(),
        }
    }

    /// Pre-register component type `T`.
    ///
    /// Calling this twice for the same `T` is harmless (second call is a
    /// no-op).  Types that are never registered are created lazily by the
    /// first `add_component`.
    pub fn register_component<T: Component>(self) -> Self {
        self.components.register::<T>();
        self
    }

    /// Pre-register flag type `T`.
    pub fn register_flag<T: Component>(self) -> Self {
        self.flags.register::<T>();
        self
    }

    /// Validate the configuration, spawn the worker pool, and return the
    /// world.
    pub fn build(self) -> EcsResult<World> {
        self.config.validate()?;
        let pool = WorkerPool::new(self.config.max_workers)?;
        tracing::debug!(
            workers = pool.workers(),
            component_types = self.components.type_count(),
            flag_types = self.flags.type_count(),
            "world built"
        );
        Ok(World::from_parts(self.config, pool, self.components, self.flags))
    }
}
