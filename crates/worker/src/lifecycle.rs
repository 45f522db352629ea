//! Worker lifecycle states

use crate::WorkerError;
use serde::{Deserialize, Serialize};

/// `Created → Entered → Running → Flushed → Terminated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    Created,
    Entered,
    Running,
    Flushed,
    Terminated,
}

impl WorkerState {
    /// Validate a transition, returning the new state.
    ///
    /// A terminated worker may be restarted (`Terminated → Created`), and
    /// a worker whose `enter` failed goes straight to `Terminated`.
    pub fn transition(self, to: WorkerState) -> Result<WorkerState, WorkerError> {
        use WorkerState::*;
        match (self, to) {
            (Created, Entered)
            | (Entered, Running)
            | (Running, Flushed)
            | (Flushed, Terminated)
            | (Created, Terminated)
            | (Terminated, Created) => Ok(to),
            (Created, Flushed) => Err(WorkerError::NotEntered(String::new())),
            (from, to) => Err(WorkerError::InvalidTransition { from, to }),
        }
    }

    /// Between a successful enter and the end of the loop
    pub fn is_active(&self) -> bool {
        matches!(self, WorkerState::Entered | WorkerState::Running)
    }
}
