//! Cooperative Worker
//!
//! One OS thread per worker running an `enter → run-loop → flush`
//! lifecycle. Stop requests are cooperative: a flag observed at the top of
//! every loop iteration, never a forced abort.

mod error;
mod lifecycle;
mod monitor;
mod worker;

pub use error::{TaskError, WorkerError};
pub use lifecycle::WorkerState;
pub use monitor::{WorkerMonitor, WorkerStatus};
pub use worker::{sleep_ms, sleep_s, Runnable, Worker, WorkerContext, WorkerReport};
