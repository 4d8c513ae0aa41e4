//! The `World`: one explicit simulation context.
//!
//! A `World` owns the entity registry, the component and flag stores, the
//! configuration, and the bounded worker pool.  There is no process-wide
//! state: systems receive `&World`, and any number of independent worlds may
//! coexist (tests build one per case).
//!
//! Every method takes `&self`, so systems running in parallel can read and
//! write through the same world.  Writes are confined by convention: a
//! system mutates only the component types it owns, and only for the entity
//! its current task is processing.

use std::any::TypeId;

use evo_core::{EcsConfig, EcsError, EcsResult, EntityId, WorkerPool};
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::registry::{EntityRegistry, Membership, TagKind};
use crate::{Component, ComponentHandle, ComponentSet, ComponentStore, Snapshot, WorldBuilder};

pub struct World {
    config:     EcsConfig,
    pool:       WorkerPool,
    registry:   EntityRegistry,
    components: ComponentStore,
    flags:      ComponentStore,
}

impl World {
    /// Build a world with `config` and no pre-registered types.
    pub fn new(config: EcsConfig) -> EcsResult<Self> {
        WorldBuilder::new(config).build()
    }

    pub(crate) fn from_parts(
        config:     EcsConfig,
        pool:       WorkerPool,
        components: ComponentStore,
        flags:      ComponentStore,
    ) -> Self {
        Self {
            config,
            pool,
            registry: EntityRegistry::new(),
            components,
            flags,
        }
    }

    #[inline]
    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    /// The shared worker pool.  Clone it to hand to FSM executors.
    #[inline]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    // ── Entities ──────────────────────────────────────────────────────────

    pub fn create_entity(&self) -> EntityId {
        let id = self.registry.create_entity();
        trace!(entity = %id, "entity created");
        id
    }

    /// Destroy `entity` and sweep every component and flag arena for it.
    pub fn remove_entity(&self, entity: EntityId) -> EcsResult<()> {
        self.registry.remove(entity).ok_or(EcsError::EntityNotFound(entity))?;
        let swept = self.components.remove_entity(entity) + self.flags.remove_entity(entity);
        trace!(entity = %entity, swept, "entity removed");
        Ok(())
    }

    #[inline]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.registry.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.registry.entity_count()
    }

    /// All live entity ids in ascending order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.registry.entity_ids()
    }

    pub fn membership(&self, entity: EntityId) -> Option<Membership> {
        self.registry.membership(entity)
    }

    // ── Components ────────────────────────────────────────────────────────

    /// Pre-create the arena for `T` so queries see an empty view instead of
    /// `None` before the first instance is added.
    pub fn register_component<T: Component>(&self) {
        self.components.register::<T>();
    }

    /// Attach `value` to `entity`.
    ///
    /// Errors with `EntityNotFound` for unknown entities and
    /// `DuplicateComponent` if `entity` already has a `T`; the existing
    /// instance is left untouched in that case.
    pub fn add_component<T: Component>(&self, entity: EntityId, value: T) -> EcsResult<ComponentHandle<T>> {
        attach(&self.registry, &self.components, TagKind::Component, entity, value)
    }

    /// The `T` attached to `entity`, or `ComponentNotFound`.
    pub fn get_component<T: Component>(&self, entity: EntityId) -> EcsResult<ComponentHandle<T>> {
        self.components.get::<T>(entity)
    }

    /// Snapshot of every entity holding `T`.  `None` if `T` was never
    /// registered.
    pub fn get_components<T: Component>(&self) -> Option<Snapshot<T>> {
        let arena = self.components.arena::<T>()?;
        Some(self.pool.install(|| arena.snapshot()))
    }

    /// Detach `T` from `entity`.  Returns whether an instance was removed;
    /// removing an absent component is not an error.
    pub fn remove_component<T: Component>(&self, entity: EntityId) -> bool {
        detach::<T>(&self.registry, &self.components, TagKind::Component, entity)
    }

    #[inline]
    pub fn contains_component_type<T: Component>(&self, entity: EntityId) -> bool {
        self.registry.contains_type(entity, TagKind::Component, TypeId::of::<T>())
    }

    /// Generation of `T`'s arena (`None` if unregistered).
    pub fn store_generation<T: Component>(&self) -> Option<u64> {
        self.components.generation::<T>()
    }

    /// Number of entities currently holding `T`.
    pub fn component_count<T: Component>(&self) -> usize {
        self.components.count::<T>()
    }

    // ── Flags ─────────────────────────────────────────────────────────────

    pub fn register_flag<T: Component>(&self) {
        self.flags.register::<T>();
    }

    pub fn add_flag<T: Component>(&self, entity: EntityId, value: T) -> EcsResult<ComponentHandle<T>> {
        attach(&self.registry, &self.flags, TagKind::Flag, entity, value)
    }

    pub fn get_flag<T: Component>(&self, entity: EntityId) -> EcsResult<ComponentHandle<T>> {
        self.flags.get::<T>(entity)
    }

    pub fn get_flags<T: Component>(&self) -> Option<Snapshot<T>> {
        let arena = self.flags.arena::<T>()?;
        Some(self.pool.install(|| arena.snapshot()))
    }

    pub fn remove_flag<T: Component>(&self, entity: EntityId) -> bool {
        detach::<T>(&self.registry, &self.flags, TagKind::Flag, entity)
    }

    #[inline]
    pub fn contains_flag_type<T: Component>(&self, entity: EntityId) -> bool {
        self.registry.contains_type(entity, TagKind::Flag, TypeId::of::<T>())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Entities carrying every component type in `types`.
    pub fn entities_with_component_types(&self, types: &[TypeId]) -> FxHashSet<EntityId> {
        self.pool.install(|| self.registry.entities_with(TagKind::Component, types))
    }

    /// Entities carrying every flag type in `types`.
    pub fn entities_with_flag_types(&self, types: &[TypeId]) -> FxHashSet<EntityId> {
        self.pool.install(|| self.registry.entities_with(TagKind::Flag, types))
    }

    /// Typed form of [`entities_with_component_types`](Self::entities_with_component_types).
    pub fn entities_with<Q: ComponentSet>(&self) -> FxHashSet<EntityId> {
        self.entities_with_component_types(&Q::type_ids())
    }

    /// Typed form of [`entities_with_flag_types`](Self::entities_with_flag_types).
    pub fn entities_with_flags<Q: ComponentSet>(&self) -> FxHashSet<EntityId> {
        self.entities_with_flag_types(&Q::type_ids())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.registry.entity_count())
            .field("component_types", &self.components.type_count())
            .field("flag_types", &self.flags.type_count())
            .field("pool", &self.pool)
            .finish()
    }
}

// ── Shared add/remove paths for components and flags ─────────────────────────

fn attach<T: Component>(
    registry: &EntityRegistry,
    store:    &ComponentStore,
    kind:     TagKind,
    entity:   EntityId,
    value:    T,
) -> EcsResult<ComponentHandle<T>> {
    if !registry.is_alive(entity) {
        return Err(EcsError::EntityNotFound(entity));
    }
    let handle = store.insert(entity, value)?;
    if let Err(e) = registry.tag(entity, kind, TypeId::of::<T>()) {
        // The entity was destroyed between the liveness check and the tag;
        // do not leave an orphaned instance behind.
        store.remove::<T>(entity);
        return Err(e);
    }
    Ok(handle)
}

fn detach<T: Component>(
    registry: &EntityRegistry,
    store:    &ComponentStore,
    kind:     TagKind,
    entity:   EntityId,
) -> bool {
    let removed = store.remove::<T>(entity);
    registry.untag(entity, kind, TypeId::of::<T>());
    removed
}
