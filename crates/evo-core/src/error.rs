//! Framework error type for the storage layer.
//!
//! Sub-crates define their own error enums (`FsmError`, `SystemError`, …) and
//! wrap `EcsError` as one variant via `From`.  Misses are always surfaced as
//! `Err` values; nothing in the storage layer hands back a default instance.

use thiserror::Error;

use crate::EntityId;

/// The top-level error type for `evo-core` / `evo-ecs`.
#[derive(Debug, Error)]
pub enum EcsError {
    #[error("{entity} already has a `{component}` component")]
    DuplicateComponent {
        entity:    EntityId,
        component: &'static str,
    },

    #[error("{entity} has no `{component}` component")]
    ComponentNotFound {
        entity:    EntityId,
        component: &'static str,
    },

    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("worker pool error: {0}")]
    Pool(String),
}

/// Shorthand result type for the storage layer.
pub type EcsResult<T> = Result<T, EcsError>;
