//! Synchronization Primitives
//!
//! Foundation for every concurrent component in the pipeline:
//! - `RawLock` / `ExclusiveLock<T>`: owner-tracking mutual exclusion with
//!   a scoped guard and strict release semantics
//! - `Condition`: monitor-style condition variable that never loses a signal
//! - `PeriodicTimer`: monotonic, drift-free pacing

mod condition;
mod error;
mod lock;
mod timer;

pub use condition::Condition;
pub use error::SyncError;
pub use lock::{ExclusiveLock, RawLock, ScopedLock};
pub use timer::{PeriodicTimer, TimerTick};
