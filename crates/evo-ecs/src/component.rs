//! Type-indexed, concurrency-safe component storage.
//!
//! # Design
//!
//! Each component type `T` lives in its own typed arena, a
//! [`TypedStore<T>`], which maps `EntityId → ComponentHandle<T>` behind a
//! `parking_lot::RwLock`.  Arenas are type-erased as `Arc<dyn ErasedStore>`
//! in a `TypeId`-keyed registry so the world can sweep all of them when an
//! entity is destroyed; every typed access goes through a monomorphized
//! downcast, never through a name lookup.
//!
//! A [`ComponentHandle`] is a shared cell (`Arc<RwLock<T>>`) tagged with its
//! owning entity.  All accessors hand out clones of the same handle, so a
//! write through one handle is visible through every other one, while the
//! arena map itself only changes on insert/remove.
//!
//! # Usage
//!
//! ```rust
//! use evo_core::EntityId;
//! use evo_ecs::ComponentStore;
//!
//! struct Health(f32);
//!
//! let store = ComponentStore::new();
//! store.insert(EntityId(0), Health(1.0)).unwrap();
//! assert!(store.insert(EntityId(0), Health(2.0)).is_err());
//! assert_eq!(store.get::<Health>(EntityId(0)).unwrap().read().0, 1.0);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use evo_core::{EcsError, EcsResult, EntityId};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Anything that can be stored per entity.
///
/// Blanket-implemented: any `Send + Sync + 'static` type is a component.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Snapshot of every handle of one component type, keyed by owner.
pub type Snapshot<T> = FxHashMap<EntityId, ComponentHandle<T>>;

// ── ComponentHandle ───────────────────────────────────────────────────────────

/// Shared, lockable reference to one stored component instance.
pub struct ComponentHandle<T> {
    owner: EntityId,
    cell:  Arc<RwLock<T>>,
}

impl<T> Clone for ComponentHandle<T> {
    fn clone(&self) -> Self {
        Self { owner: self.owner, cell: Arc::clone(&self.cell) }
    }
}

impl<T> ComponentHandle<T> {
    pub(crate) fn new(owner: EntityId, value: T) -> Self {
        Self { owner, cell: Arc::new(RwLock::new(value)) }
    }

    /// The entity this instance was attached to.
    #[inline]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.cell.read()
    }

    /// Exclusive access.  Only the system that owns `T` should call this,
    /// and only for the entity its current task is processing.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.cell.write()
    }

    /// `true` if both handles refer to the same stored instance.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Copy the current value out.
    pub fn get_cloned(&self) -> T
    where
        T: Clone,
    {
        self.cell.read().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for ComponentHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("owner", &self.owner)
            .field("value", &*self.cell.read())
            .finish()
    }
}

// ── Trait object ──────────────────────────────────────────────────────────────

/// Type-erased interface for one typed arena.
///
/// Sealed so external code cannot register arenas that break the
/// one-instance-per-entity invariant.
pub trait ErasedStore: Send + Sync + 'static + sealed::Sealed {
    /// Drop the entry for `entity`, if any.  Returns whether one existed.
    fn remove_entity(&self, entity: EntityId) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bumped on every insertion and removal.
    fn generation(&self) -> u64;

    fn type_name(&self) -> &'static str;

    #[doc(hidden)]
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

mod sealed {
    pub trait Sealed {}
}

// ── TypedStore ────────────────────────────────────────────────────────────────

/// The arena for one component type.
pub struct TypedStore<T: Component> {
    entries:    RwLock<FxHashMap<EntityId, ComponentHandle<T>>>,
    generation: AtomicU64,
}

impl<T: Component> sealed::Sealed for TypedStore<T> {}

impl<T: Component> Default for TypedStore<T> {
    fn default() -> Self {
        Self {
            entries:    RwLock::new(FxHashMap::default()),
            generation: AtomicU64::new(0),
        }
    }
}

impl<T: Component> TypedStore<T> {
    /// Insert `value` for `entity`.  A second insert for the same entity is
    /// rejected and leaves the original untouched.
    pub fn insert(&self, entity: EntityId, value: T) -> EcsResult<ComponentHandle<T>> {
        use std::collections::hash_map::Entry;

        let mut entries = self.entries.write();
        match entries.entry(entity) {
            Entry::Occupied(_) => Err(EcsError::DuplicateComponent {
                entity,
                component: std::any::type_name::<T>(),
            }),
            Entry::Vacant(slot) => {
                let handle = ComponentHandle::new(entity, value);
                slot.insert(handle.clone());
                self.generation.fetch_add(1, Ordering::AcqRel);
                Ok(handle)
            }
        }
    }

    pub fn get(&self, entity: EntityId) -> Option<ComponentHandle<T>> {
        self.entries.read().get(&entity).cloned()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.read().contains_key(&entity)
    }

    /// Remove the entry for `entity`.  Removing an absent entry is a no-op.
    pub fn remove(&self, entity: EntityId) -> bool {
        let removed = self.entries.write().remove(&entity).is_some();
        if removed {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        removed
    }

    /// Copy every handle out under a read lock, in parallel.
    ///
    /// The returned map is detached from the arena: later insertions and
    /// removals are not reflected in it.  Component values are shared, so
    /// writes through a handle are.
    pub fn snapshot(&self) -> Snapshot<T> {
        let entries = self.entries.read();
        entries
            .par_iter()
            .map(|(&id, handle)| (id, handle.clone()))
            .collect()
    }
}

impl<T: Component> ErasedStore for TypedStore<T> {
    fn remove_entity(&self, entity: EntityId) -> bool {
        self.remove(entity)
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

// ── ComponentStore ────────────────────────────────────────────────────────────

/// Registry of typed arenas, one [`TypedStore<T>`] per concrete type.
///
/// # Thread safety
///
/// All methods take `&self`.  The arena registry is behind an `RwLock` that
/// is only write-locked the first time a type is seen; after that every
/// access resolves the arena under a read lock and releases it before
/// touching the arena's own lock.
#[derive(Default)]
pub struct ComponentStore {
    arenas: RwLock<FxHashMap<TypeId, Arc<dyn ErasedStore>>>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the arena for `T`.
    ///
    /// Calling this twice for the same `T` is a no-op; existing data is not
    /// disturbed.
    pub fn register<T: Component>(&self) -> Arc<TypedStore<T>> {
        if let Some(arena) = self.arena::<T>() {
            return arena;
        }
        let erased = {
            let mut arenas = self.arenas.write();
            Arc::clone(
                arenas
                    .entry(TypeId::of::<T>())
                    .or_insert_with(|| Arc::new(TypedStore::<T>::default()) as Arc<dyn ErasedStore>),
            )
        };
        downcast(erased)
    }

    /// The arena for `T`, or `None` if `T` was never registered.
    pub fn arena<T: Component>(&self) -> Option<Arc<TypedStore<T>>> {
        let erased = self.arenas.read().get(&TypeId::of::<T>()).map(Arc::clone)?;
        Some(downcast(erased))
    }

    /// Insert `value` for `entity`, registering `T` on first use.
    pub fn insert<T: Component>(&self, entity: EntityId, value: T) -> EcsResult<ComponentHandle<T>> {
        self.register::<T>().insert(entity, value)
    }

    /// The handle for `(T, entity)`, or `ComponentNotFound`.
    pub fn get<T: Component>(&self, entity: EntityId) -> EcsResult<ComponentHandle<T>> {
        self.arena::<T>()
            .and_then(|arena| arena.get(entity))
            .ok_or(EcsError::ComponentNotFound {
                entity,
                component: std::any::type_name::<T>(),
            })
    }

    /// Snapshot of every `T`, or `None` if `T` was never registered.
    pub fn snapshot<T: Component>(&self) -> Option<Snapshot<T>> {
        self.arena::<T>().map(|arena| arena.snapshot())
    }

    /// Idempotent removal.
    pub fn remove<T: Component>(&self, entity: EntityId) -> bool {
        self.arena::<T>().is_some_and(|arena| arena.remove(entity))
    }

    /// Sweep every arena for `entity`.  Returns how many entries were removed.
    pub fn remove_entity(&self, entity: EntityId) -> usize {
        let arenas: Vec<Arc<dyn ErasedStore>> = self.arenas.read().values().map(Arc::clone).collect();
        arenas.iter().filter(|arena| arena.remove_entity(entity)).count()
    }

    /// Generation counter of `T`'s arena, or `None` if unregistered.
    pub fn generation<T: Component>(&self) -> Option<u64> {
        self.generation_of(TypeId::of::<T>())
    }

    /// Generation counter by raw `TypeId`, used by query caches.
    pub fn generation_of(&self, type_id: TypeId) -> Option<u64> {
        self.arenas.read().get(&type_id).map(|arena| arena.generation())
    }

    /// Number of entries of `T`, `0` if unregistered.
    pub fn count<T: Component>(&self) -> usize {
        self.arena::<T>().map_or(0, |arena| arena.len())
    }

    /// Number of distinct registered types.
    pub fn type_count(&self) -> usize {
        self.arenas.read().len()
    }

    /// `true` if `T` has been registered.
    pub fn contains_type<T: Component>(&self) -> bool {
        self.arenas.read().contains_key(&TypeId::of::<T>())
    }
}

fn downcast<T: Component>(erased: Arc<dyn ErasedStore>) -> Arc<TypedStore<T>> {
    match erased.into_any().downcast::<TypedStore<T>>() {
        Ok(arena) => arena,
        // Arenas are only ever inserted under `TypeId::of::<T>()` as
        // `TypedStore<T>`, so the key guarantees the concrete type.
        Err(_) => unreachable!("arena registered under the wrong TypeId"),
    }
}
