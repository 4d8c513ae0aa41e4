//! Unit tests for evo-ecs.

use evo_core::EcsConfig;

use crate::{World, WorldBuilder};

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Health(f32);

#[derive(Debug)]
struct Herbivore;

fn small_world() -> World {
    WorldBuilder::new(EcsConfig::default().with_max_workers(4))
        .build()
        .expect("world should build")
}

// ── ComponentStore ────────────────────────────────────────────────────────────

#[cfg(test)]
mod store {
    use evo_core::{EcsError, EntityId};

    use super::*;
    use crate::ComponentStore;

    #[test]
    fn insert_and_get_same_instance() {
        let store = ComponentStore::new();
        let added = store.insert(EntityId(1), Health(0.5)).unwrap();
        let fetched = store.get::<Health>(EntityId(1)).unwrap();
        assert!(added.ptr_eq(&fetched));
        assert_eq!(fetched.owner(), EntityId(1));
    }

    #[test]
    fn duplicate_insert_keeps_original() {
        let store = ComponentStore::new();
        store.insert(EntityId(1), Health(0.5)).unwrap();
        let err = store.insert(EntityId(1), Health(9.0)).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { entity: EntityId(1), .. }));
        assert_eq!(store.get::<Health>(EntityId(1)).unwrap().get_cloned(), Health(0.5));
    }

    #[test]
    fn unregistered_type_is_none_and_not_found() {
        let store = ComponentStore::new();
        assert!(store.snapshot::<Health>().is_none());
        assert!(matches!(
            store.get::<Health>(EntityId(0)),
            Err(EcsError::ComponentNotFound { .. })
        ));
    }

    #[test]
    fn double_register_is_noop() {
        let store = ComponentStore::new();
        store.insert(EntityId(3), Health(1.5)).unwrap();
        store.register::<Health>();
        assert_eq!(store.count::<Health>(), 1);
        assert_eq!(store.type_count(), 1);
    }

    #[test]
    fn generation_moves_on_insert_and_remove_only() {
        let store = ComponentStore::new();
        store.register::<Health>();
        let g0 = store.generation::<Health>().unwrap();
        store.insert(EntityId(0), Health(1.0)).unwrap();
        let g1 = store.generation::<Health>().unwrap();
        assert!(g1 > g0);

        // Writes through a handle are not structural.
        store.get::<Health>(EntityId(0)).unwrap().write().0 = 2.0;
        assert_eq!(store.generation::<Health>().unwrap(), g1);

        assert!(store.remove::<Health>(EntityId(0)));
        assert!(store.generation::<Health>().unwrap() > g1);

        // Removing an absent entry changes nothing.
        let g2 = store.generation::<Health>().unwrap();
        assert!(!store.remove::<Health>(EntityId(0)));
        assert_eq!(store.generation::<Health>().unwrap(), g2);
    }

    #[test]
    fn two_types_do_not_interfere() {
        let store = ComponentStore::new();
        store.insert(EntityId(0), Health(1.0)).unwrap();
        store.insert(EntityId(0), Position { x: 1.0, y: 0.0, z: 0.0 }).unwrap();
        assert!(store.remove::<Health>(EntityId(0)));
        assert!(store.get::<Position>(EntityId(0)).is_ok());
        assert_eq!(store.remove_entity(EntityId(0)), 1);
    }
}

// ── World: components ─────────────────────────────────────────────────────────

#[cfg(test)]
mod components {
    use evo_core::{EcsError, EntityId};

    use super::*;

    #[test]
    fn add_then_get_returns_same_instance() {
        let world = small_world();
        let e = world.create_entity();
        let added = world.add_component(e, Health(0.25)).unwrap();
        let fetched = world.get_component::<Health>(e).unwrap();
        assert!(added.ptr_eq(&fetched));
        assert_eq!(fetched.owner(), e);
        assert!(world.contains_component_type::<Health>(e));
    }

    #[test]
    fn writes_are_visible_through_every_handle() {
        let world = small_world();
        let e = world.create_entity();
        let added = world.add_component(e, Health(0.25)).unwrap();
        added.write().0 = 0.75;
        assert_eq!(world.get_component::<Health>(e).unwrap().read().0, 0.75);
    }

    #[test]
    fn add_to_unknown_entity_fails() {
        let world = small_world();
        let err = world.add_component(EntityId(99), Health(1.0)).unwrap_err();
        assert!(matches!(err, EcsError::EntityNotFound(EntityId(99))));
        assert_eq!(world.component_count::<Health>(), 0);
    }

    #[test]
    fn duplicate_component_is_explicit_error() {
        let world = small_world();
        let e = world.create_entity();
        world.add_component(e, Health(1.0)).unwrap();
        assert!(matches!(
            world.add_component(e, Health(2.0)),
            Err(EcsError::DuplicateComponent { .. })
        ));
        assert_eq!(world.get_component::<Health>(e).unwrap().get_cloned(), Health(1.0));
    }

    #[test]
    fn missing_component_is_not_found_not_default() {
        let world = small_world();
        let e = world.create_entity();
        world.add_component(e, Health(1.0)).unwrap();
        assert!(matches!(
            world.get_component::<Velocity>(e),
            Err(EcsError::ComponentNotFound { entity, .. }) if entity == e
        ));
    }

    #[test]
    fn remove_component_twice_is_safe() {
        let world = small_world();
        let e = world.create_entity();
        world.add_component(e, Health(1.0)).unwrap();
        world.add_component(e, Position { x: 0.0, y: 0.0, z: 0.0 }).unwrap();
        assert!(world.remove_component::<Health>(e));
        assert!(!world.remove_component::<Health>(e));
        assert!(!world.contains_component_type::<Health>(e));
        // Sibling untouched.
        assert!(world.get_component::<Position>(e).is_ok());
    }

    #[test]
    fn remove_entity_cascades() {
        let world = small_world();
        let e = world.create_entity();
        let other = world.create_entity();
        world.add_component(e, Health(1.0)).unwrap();
        world.add_component(e, Position { x: 1.0, y: 2.0, z: 3.0 }).unwrap();
        world.add_flag(e, Herbivore).unwrap();
        world.add_component(other, Health(2.0)).unwrap();

        world.remove_entity(e).unwrap();

        assert!(!world.is_alive(e));
        assert!(matches!(world.get_component::<Health>(e), Err(EcsError::ComponentNotFound { .. })));
        assert!(matches!(world.get_component::<Position>(e), Err(EcsError::ComponentNotFound { .. })));
        assert!(world.get_flag::<Herbivore>(e).is_err());
        assert!(world.get_component::<Health>(other).is_ok());
        assert!(matches!(world.remove_entity(e), Err(EcsError::EntityNotFound(_))));
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let world = small_world();
        let a = world.create_entity();
        let b = world.create_entity();
        world.add_component(a, Health(1.0)).unwrap();

        let snapshot = world.get_components::<Health>().unwrap();
        world.add_component(b, Health(2.0)).unwrap();
        world.remove_component::<Health>(a);

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key(&a));
        assert_eq!(world.get_components::<Health>().unwrap().len(), 1);
        assert!(world.get_components::<Health>().unwrap().contains_key(&b));
    }

    #[test]
    fn unregistered_view_is_none_registered_is_empty() {
        let world = WorldBuilder::new(EcsConfig::default().with_max_workers(2))
            .register_component::<Velocity>()
            .build()
            .unwrap();
        assert!(world.get_components::<Health>().is_none());
        assert!(world.get_components::<Velocity>().unwrap().is_empty());
    }
}

// ── World: flags ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod flags {
    use super::*;

    #[test]
    fn flags_are_separate_from_components() {
        let world = small_world();
        let e = world.create_entity();
        world.add_flag(e, Herbivore).unwrap();
        assert!(world.contains_flag_type::<Herbivore>(e));
        assert!(!world.contains_component_type::<Herbivore>(e));
        assert!(world.get_component::<Herbivore>(e).is_err());
        assert!(world.get_flags::<Herbivore>().unwrap().contains_key(&e));
    }

    #[test]
    fn entities_with_flags() {
        let world = small_world();
        let a = world.create_entity();
        let b = world.create_entity();
        world.add_flag(a, Herbivore).unwrap();
        world.add_component(b, Health(1.0)).unwrap();
        let found = world.entities_with_flags::<(Herbivore,)>();
        assert_eq!(found.len(), 1);
        assert!(found.contains(&a));
        assert!(world.remove_flag::<Herbivore>(a));
        assert!(world.entities_with_flags::<(Herbivore,)>().is_empty());
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use std::any::TypeId;
    use std::sync::Arc;
    use std::thread;

    use evo_core::{EntityId, EntityRng};
    use rustc_hash::FxHashSet;

    use super::*;

    #[test]
    fn concurrent_creation_yields_distinct_ids() {
        let world = Arc::new(small_world());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let world = Arc::clone(&world);
                thread::spawn(move || (0..500).map(|_| world.create_entity()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = FxHashSet::default();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "{id} handed out twice");
            }
        }
        assert_eq!(seen.len(), 4_000);
        assert_eq!(world.entity_count(), 4_000);
    }

    #[test]
    fn ids_are_never_reused() {
        let world = small_world();
        let a = world.create_entity();
        world.remove_entity(a).unwrap();
        let b = world.create_entity();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn query_returns_exact_superset_matches() {
        let world = small_world();
        let mut rng = EntityRng::new(7, EntityId(0));
        let mut expected = FxHashSet::default();
        for _ in 0..300 {
            let e = world.create_entity();
            let has_pos = rng.gen_bool(0.5);
            let has_vel = rng.gen_bool(0.5);
            if has_pos {
                world.add_component(e, Position { x: 0.0, y: 0.0, z: 0.0 }).unwrap();
            }
            if has_vel {
                world.add_component(e, Velocity { x: 1.0, y: 0.0, z: 0.0 }).unwrap();
            }
            if rng.gen_bool(0.3) {
                world.add_component(e, Health(1.0)).unwrap();
            }
            if has_pos && has_vel {
                expected.insert(e);
            }
        }

        assert_eq!(world.entities_with::<(Position, Velocity)>(), expected);
        // Order of the tuple is irrelevant.
        assert_eq!(world.entities_with::<(Velocity, Position)>(), expected);
        let raw = world.entities_with_component_types(&[TypeId::of::<Position>(), TypeId::of::<Velocity>()]);
        assert_eq!(raw, expected);
    }

    #[test]
    fn empty_type_list_matches_every_entity() {
        let world = small_world();
        let a = world.create_entity();
        let b = world.create_entity();
        let all = world.entities_with_component_types(&[]);
        assert_eq!(all.len(), 2);
        assert!(all.contains(&a) && all.contains(&b));
    }

    #[test]
    fn membership_record_tracks_tags() {
        let world = small_world();
        let e = world.create_entity();
        world.add_component(e, Health(1.0)).unwrap();
        world.add_flag(e, Herbivore).unwrap();
        let m = world.membership(e).unwrap();
        assert_eq!(m.component_count(), 1);
        assert_eq!(m.flag_count(), 1);
        assert_eq!(world.entity_ids(), vec![e]);
    }
}
