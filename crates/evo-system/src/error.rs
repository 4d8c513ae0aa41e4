use evo_core::EcsError;
use evo_fsm::FsmError;
use thiserror::Error;

/// Failure inside one system's `pre_execute`/`execute`/`post_execute`.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error(transparent)]
    Fsm(#[from] FsmError),

    #[error("{0}")]
    Failed(String),
}

pub type SystemResult<T> = Result<T, SystemError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler ticked before init_systems")]
    NotInitialized,

    #[error("scheduler already initialized; systems must be added before init_systems")]
    AlreadyInitialized,

    #[error("{} system(s) failed: {}", .0.len(), failed_names(.0))]
    SystemsFailed(Vec<(String, SystemError)>),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

fn failed_names(failures: &[(String, SystemError)]) -> String {
    failures
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
