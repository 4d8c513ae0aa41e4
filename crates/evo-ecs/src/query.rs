//! Typed multi-component queries.
//!
//! A [`ComponentSet`] is a tuple of component types, e.g. `(Position,
//! Velocity)`.  It knows its `TypeId`s (for registry scans), how to fetch a
//! snapshot of each member's arena, and how to read each arena's generation
//! (for cache invalidation).

use std::any::TypeId;

use crate::{Component, Snapshot, World};

/// A tuple of component types queried together.
///
/// Implemented for tuples of one to six component types.
pub trait ComponentSet: 'static {
    /// One [`Snapshot`] per member type, in tuple order.
    type Views: Send + Sync;

    fn type_ids() -> Vec<TypeId>;

    fn type_names() -> Vec<&'static str>;

    /// Snapshot every member arena.  `None` if any member type was never
    /// registered in `world`.
    fn views(world: &World) -> Option<Self::Views>;

    /// Generation of each member arena; unregistered arenas report `None`.
    fn generations(world: &World) -> Vec<Option<u64>>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Views = ($(Snapshot<$name>,)+);

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$name>()),+]
            }

            fn views(world: &World) -> Option<Self::Views> {
                Some(($(world.get_components::<$name>()?,)+))
            }

            fn generations(world: &World) -> Vec<Option<u64>> {
                vec![$(world.store_generation::<$name>()),+]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
