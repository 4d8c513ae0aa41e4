//! Entity identity and type-membership bookkeeping.
//!
//! Every live entity has a [`Membership`] record listing the component and
//! flag types currently attached to it.  Queries answer "which entities carry
//! all of these types?" by a parallel scan over the records, so they never
//! touch the component arenas themselves.

use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};

use evo_core::{EcsError, EcsResult, EntityId};
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// Which side of an entity's membership record a type tag belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TagKind {
    Component,
    Flag,
}

/// The component and flag types attached to one entity.
#[derive(Default, Clone, Debug)]
pub struct Membership {
    components: FxHashSet<TypeId>,
    flags:      FxHashSet<TypeId>,
}

impl Membership {
    #[inline]
    fn set(&self, kind: TagKind) -> &FxHashSet<TypeId> {
        match kind {
            TagKind::Component => &self.components,
            TagKind::Flag => &self.flags,
        }
    }

    #[inline]
    fn set_mut(&mut self, kind: TagKind) -> &mut FxHashSet<TypeId> {
        match kind {
            TagKind::Component => &mut self.components,
            TagKind::Flag => &mut self.flags,
        }
    }

    #[inline]
    pub fn contains(&self, kind: TagKind, type_id: TypeId) -> bool {
        self.set(kind).contains(&type_id)
    }

    /// `true` if every type in `types` is attached.
    #[inline]
    pub fn contains_all(&self, kind: TagKind, types: &[TypeId]) -> bool {
        let set = self.set(kind);
        types.iter().all(|t| set.contains(t))
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }
}

/// Allocates entity ids and tracks which types each entity carries.
pub struct EntityRegistry {
    next_id: AtomicU64,
    records: RwLock<FxHashMap<EntityId, Membership>>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            records: RwLock::new(FxHashMap::default()),
        }
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id and an empty membership record.
    ///
    /// Ids come from a single atomic counter, so concurrent callers always
    /// receive distinct ids and ids are never reused.
    pub fn create_entity(&self) -> EntityId {
        let id = EntityId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.records.write().insert(id, Membership::default());
        id
    }

    /// Record that `entity` now carries `type_id`.
    pub fn tag(&self, entity: EntityId, kind: TagKind, type_id: TypeId) -> EcsResult<()> {
        let mut records = self.records.write();
        let record = records.get_mut(&entity).ok_or(EcsError::EntityNotFound(entity))?;
        record.set_mut(kind).insert(type_id);
        Ok(())
    }

    /// Drop `type_id` from `entity`'s record.  Unknown entities are ignored.
    pub fn untag(&self, entity: EntityId, kind: TagKind, type_id: TypeId) {
        if let Some(record) = self.records.write().get_mut(&entity) {
            record.set_mut(kind).remove(&type_id);
        }
    }

    /// Remove `entity` and return its final membership record.
    pub fn remove(&self, entity: EntityId) -> Option<Membership> {
        self.records.write().remove(&entity)
    }

    #[inline]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.records.read().contains_key(&entity)
    }

    /// O(1) membership check.  `false` for unknown entities.
    #[inline]
    pub fn contains_type(&self, entity: EntityId, kind: TagKind, type_id: TypeId) -> bool {
        self.records
            .read()
            .get(&entity)
            .is_some_and(|record| record.contains(kind, type_id))
    }

    /// Every entity whose record is a superset of `types`.
    ///
    /// Computed by a parallel scan over all records.  The result is a set;
    /// callers must not rely on any iteration order.
    pub fn entities_with(&self, kind: TagKind, types: &[TypeId]) -> FxHashSet<EntityId> {
        let records = self.records.read();
        records
            .par_iter()
            .filter(|(_, record)| record.contains_all(kind, types))
            .map(|(&id, _)| id)
            .collect()
    }

    /// A copy of one entity's membership record.
    pub fn membership(&self, entity: EntityId) -> Option<Membership> {
        self.records.read().get(&entity).cloned()
    }

    pub fn entity_count(&self) -> usize {
        self.records.read().len()
    }

    /// All live entity ids in ascending order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.records.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
