//! Lazily resolved, policy-driven query caches.

use std::marker::PhantomData;

use evo_core::{EntityId, QueryCachePolicy};
use evo_ecs::{ComponentSet, World};
use rayon::prelude::*;
use tracing::trace;

struct Resolved<Q: ComponentSet> {
    entities:    Vec<EntityId>,
    views:       Q::Views,
    generations: Vec<Option<u64>>,
    _query:      PhantomData<fn() -> Q>,
}

/// The entities holding every component type in `Q`, plus one snapshot per
/// type.
///
/// Resolution happens on the first [`resolve`](Self::resolve) call after
/// every queried type has been registered.  What happens afterwards depends
/// on the [`QueryCachePolicy`]:
///
/// * `Frozen`: the first result is kept for the cache's lifetime.  Entities
///   created later are never seen; removed entities keep their (detached)
///   handles.
/// * `Refresh`: the cache re-resolves whenever the generation of any queried
///   arena has moved since the previous resolve.
///
/// The policy comes from the world's [`EcsConfig`](evo_core::EcsConfig)
/// unless overridden with [`with_policy`](Self::with_policy).
pub struct QueryCache<Q: ComponentSet> {
    policy:   Option<QueryCachePolicy>,
    resolved: Option<Resolved<Q>>,
    resolves: u64,
}

impl<Q: ComponentSet> Default for QueryCache<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: ComponentSet> QueryCache<Q> {
    /// An unresolved cache following the world's policy.
    pub fn new() -> Self {
        Self { policy: None, resolved: None, resolves: 0 }
    }

    pub fn with_policy(mut self, policy: QueryCachePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Bring the cache up to date with `world` under the active policy.
    ///
    /// Returns `true` if the query was (re)run.  While any queried type is
    /// unregistered the cache stays unresolved and yields nothing.
    pub fn resolve(&mut self, world: &World) -> bool {
        let policy = self.policy.unwrap_or(world.config().query_cache);
        let generations = match (&self.resolved, policy) {
            (None, _) => Q::generations(world),
            (Some(_), QueryCachePolicy::Frozen) => return false,
            (Some(current), QueryCachePolicy::Refresh) => {
                let now = Q::generations(world);
                if now == current.generations {
                    return false;
                }
                now
            }
        };

        let Some(views) = Q::views(world) else {
            trace!(query = ?Q::type_names(), "query types not registered yet");
            return false;
        };
        let mut entities: Vec<EntityId> = world.entities_with::<Q>().into_iter().collect();
        entities.par_sort_unstable();

        trace!(query = ?Q::type_names(), entities = entities.len(), ?policy, "query resolved");
        self.resolved = Some(Resolved { entities, views, generations, _query: PhantomData });
        self.resolves += 1;
        true
    }

    /// Drop the cached result so the next `resolve` runs the query again,
    /// whatever the policy.
    pub fn invalidate(&mut self) {
        self.resolved = None;
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// How many times the query has actually run.
    #[inline]
    pub fn resolve_count(&self) -> u64 {
        self.resolves
    }

    /// Matching entities in ascending id order; empty while unresolved.
    pub fn entities(&self) -> &[EntityId] {
        self.resolved.as_ref().map(|r| r.entities.as_slice()).unwrap_or_default()
    }

    /// One snapshot per queried type, in tuple order.
    pub fn views(&self) -> Option<&Q::Views> {
        self.resolved.as_ref().map(|r| &r.views)
    }

    /// Call `f` for every cached entity on the current rayon pool, handing
    /// each task at least `min_len` entities.
    pub fn par_for_each<F>(&self, min_len: usize, f: F)
    where
        F: Fn(EntityId, &Q::Views) + Send + Sync,
    {
        let Some(resolved) = &self.resolved else { return };
        resolved
            .entities
            .par_iter()
            .with_min_len(min_len.max(1))
            .for_each(|&id| f(id, &resolved.views));
    }
}

impl<Q: ComponentSet> std::fmt::Debug for QueryCache<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("query", &Q::type_names())
            .field("policy", &self.policy)
            .field("entities", &self.entities().len())
            .field("resolves", &self.resolves)
            .finish()
    }
}
