//! The flag queue between a running batch and its FSM.
//!
//! Behaviours never call back into the FSM.  They raise flags through a
//! [`FlagSender`], which may be cloned into worker-thread actions; the FSM
//! drains the queued flag only after the batch (transition closure
//! included) has returned.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::FsmEnum;

/// Holds at most one pending transition request.
///
/// The first flag raised wins; any later flag raised before the FSM drains
/// the queue is dropped.
pub struct FlagSender<F> {
    pending: Arc<Mutex<Option<F>>>,
}

impl<F> Clone for FlagSender<F> {
    fn clone(&self) -> Self {
        Self { pending: Arc::clone(&self.pending) }
    }
}

impl<F: FsmEnum> FlagSender<F> {
    pub(crate) fn new() -> Self {
        Self { pending: Arc::new(Mutex::new(None)) }
    }

    /// Request a transition.  Returns `false` if another flag was already
    /// pending, in which case `flag` is dropped.
    pub fn raise(&self, flag: F) -> bool {
        let mut slot = self.pending.lock();
        match *slot {
            Some(kept) => {
                debug!(kept = kept.name(), dropped = flag.name(), "flag already pending");
                false
            }
            None => {
                *slot = Some(flag);
                true
            }
        }
    }

    /// The currently pending flag, if any, without consuming it.
    pub fn pending(&self) -> Option<F> {
        *self.pending.lock()
    }

    pub(crate) fn take(&self) -> Option<F> {
        self.pending.lock().take()
    }
}

impl<F: FsmEnum> std::fmt::Debug for FlagSender<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagSender").field("pending", &self.pending()).finish()
    }
}
