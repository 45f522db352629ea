//! Worker Error Types

use crate::WorkerState;
use thiserror::Error;

/// Error type returned by the hooks of a [`Runnable`](crate::Runnable)
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Lifecycle usage errors and failures surfaced from worker hooks
#[derive(Debug, Error)]
pub enum WorkerError {
    /// `start` on a worker that is already started
    #[error("worker '{0}' is already running")]
    AlreadyRunning(String),

    /// `join`/`stop` on a worker that was never started
    #[error("worker '{0}' was not started")]
    NotStarted(String),

    /// Flush requested for a worker that never entered
    #[error("worker '{0}' cannot flush before enter")]
    NotEntered(String),

    /// Any other illegal lifecycle transition
    #[error("illegal worker transition {from:?} -> {to:?}")]
    InvalidTransition { from: WorkerState, to: WorkerState },

    /// The OS refused to create the thread
    #[error("failed to spawn worker '{name}': {reason}")]
    Spawn { name: String, reason: String },

    /// `enter` failed; the worker never ran
    #[error("worker '{name}' failed to enter: {source}")]
    Enter {
        name: String,
        #[source]
        source: TaskError,
    },

    /// The loop body failed and the loop was left early
    #[error("worker '{name}' failed while running: {source}")]
    Run {
        name: String,
        #[source]
        source: TaskError,
    },

    /// `flush` failed
    #[error("worker '{name}' failed to flush: {source}")]
    Flush {
        name: String,
        #[source]
        source: TaskError,
    },

    /// The worker thread panicked
    #[error("worker '{0}' panicked")]
    Panicked(String),
}
