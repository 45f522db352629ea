//! Synchronization Error Types

use thiserror::Error;

/// Contract violations and configuration errors raised by the primitives
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Release attempted by a thread that does not hold the lock
    #[error("lock released by a thread that does not own it")]
    NotOwner,

    /// Release attempted on a lock nobody holds
    #[error("lock released while not held")]
    NotHeld,

    /// Acquire attempted by the thread that already holds the lock
    #[error("lock is not reentrant: already held by the calling thread")]
    Reentrant,

    /// Non-blocking acquire found the lock held by another thread
    #[error("lock is held by another thread")]
    WouldBlock,

    /// Timer period is zero, negative or not finite
    #[error("invalid timer period: {0}")]
    InvalidPeriod(String),
}
