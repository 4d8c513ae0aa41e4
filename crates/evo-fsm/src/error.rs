use std::time::Duration;

use thiserror::Error;

use crate::Rung;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("rung {rung} ran for {elapsed:?}, over its {deadline:?} budget; {skipped_rungs} later rung(s) not run")]
    RungDeadlineExceeded {
        rung:          Rung,
        elapsed:       Duration,
        deadline:      Duration,
        skipped_rungs: usize,
    },
}

pub type BatchResult<T> = Result<T, BatchError>;

#[derive(Debug, Error)]
pub enum FsmError {
    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("more than {limit} chained transitions in one call")]
    TransitionChainTooLong { limit: usize },
}

pub type FsmResult<T> = Result<T, FsmError>;
