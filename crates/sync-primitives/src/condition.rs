//! Condition Variable
//!
//! Monitor-pattern condition bound to a [`RawLock`] / [`ExclusiveLock`].
//! Waiters are counted under a private lock and every signal hands out
//! explicit wake tokens, so a signal racing with a waiter that is between
//! releasing the user lock and going to sleep is never lost.

use crate::lock::{RawLock, ScopedLock};
use crate::SyncError;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Default)]
struct WaitState {
    /// Threads currently inside `wait`
    waiters: usize,
    /// Wake tokens not yet consumed
    pending: usize,
    /// Bumped by every signal; a waiter only accepts tokens issued after it arrived
    generation: u64,
}

/// Condition variable with counted waiters
#[derive(Debug, Default)]
pub struct Condition {
    state: Mutex<WaitState>,
    wake: Condvar,
}

impl Condition {
    /// Create a condition with no waiters
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically release the guard's lock, sleep until signalled, then
    /// reacquire the lock before returning.
    pub fn wait<T: ?Sized>(&self, guard: &mut ScopedLock<'_, T>) {
        // The guard proves ownership, so the raw wait cannot fail
        if let Err(e) = self.wait_inner(guard.lock().raw(), None) {
            warn!("scoped wait failed: {}", e);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    /// Returns `true` if woken by a signal, `false` on timeout.
    pub fn wait_timeout<T: ?Sized>(&self, guard: &mut ScopedLock<'_, T>, timeout: Duration) -> bool {
        match self.wait_inner(guard.lock().raw(), Some(timeout)) {
            Ok(signalled) => signalled,
            Err(e) => {
                warn!("scoped wait failed: {}", e);
                false
            }
        }
    }

    /// Wait until `condition` returns false, re-checking after every wakeup
    pub fn wait_while<T: ?Sized, F>(&self, guard: &mut ScopedLock<'_, T>, mut condition: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut **guard) {
            self.wait(guard);
        }
    }

    /// Wait on a bare [`RawLock`]. Fails with [`SyncError::NotOwner`] or
    /// [`SyncError::NotHeld`] if the caller does not hold `lock`.
    pub fn wait_raw(&self, lock: &RawLock) -> Result<(), SyncError> {
        self.wait_inner(lock, None).map(|_| ())
    }

    /// Wake at most one waiter
    pub fn signal_one(&self) {
        let mut state = self.state.lock();
        if state.waiters > state.pending {
            state.pending += 1;
            state.generation = state.generation.wrapping_add(1);
            drop(state);
            // Wake everyone; only a token holder proceeds, the rest sleep again
            self.wake.notify_all();
        }
    }

    /// Wake every current waiter
    pub fn signal_all(&self) {
        let mut state = self.state.lock();
        if state.waiters > state.pending {
            state.pending = state.waiters;
            state.generation = state.generation.wrapping_add(1);
            drop(state);
            self.wake.notify_all();
        }
    }

    /// Number of threads currently blocked in `wait`
    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters
    }

    fn wait_inner(&self, lock: &RawLock, timeout: Option<Duration>) -> Result<bool, SyncError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();

        // Registered before the user lock is released: a signaller must
        // take `state` first and therefore sees this waiter.
        lock.release()?;
        state.waiters += 1;
        let arrived = state.generation;

        let signalled = loop {
            if state.pending > 0 && state.generation != arrived {
                state.pending -= 1;
                break true;
            }
            match deadline {
                None => self.wake.wait(&mut state),
                Some(deadline) => {
                    if self.wake.wait_until(&mut state, deadline).timed_out() {
                        if state.pending > 0 && state.generation != arrived {
                            state.pending -= 1;
                            break true;
                        }
                        break false;
                    }
                }
            }
        };

        state.waiters -= 1;
        if state.pending > state.waiters {
            state.pending = state.waiters;
        }
        drop(state);

        lock.acquire()?;
        Ok(signalled)
    }
}
