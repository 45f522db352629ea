//! Owner-Tracking Exclusive Lock

use crate::SyncError;
use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::thread::{self, ThreadId};
use tracing::warn;

/// Mutual exclusion primitive that records which thread holds it.
///
/// Unlike a plain mutex, `release` is checked: a thread that does not
/// hold the lock gets [`SyncError::NotOwner`] back instead of silently
/// unlocking somebody else's critical section.
pub struct RawLock {
    /// Current holder, `None` when free
    owner: Mutex<Option<ThreadId>>,
    /// Signalled on every successful release
    released: Condvar,
}

impl RawLock {
    /// Create an unlocked lock
    pub fn new() -> Self {
        Self {
            owner: Mutex::new(None),
            released: Condvar::new(),
        }
    }

    /// Block until the calling thread holds the lock exclusively
    pub fn acquire(&self) -> Result<(), SyncError> {
        let me = thread::current().id();
        let mut owner = self.owner.lock();
        if *owner == Some(me) {
            return Err(SyncError::Reentrant);
        }
        while owner.is_some() {
            self.released.wait(&mut owner);
        }
        *owner = Some(me);
        Ok(())
    }

    /// Acquire without blocking
    pub fn try_acquire(&self) -> Result<(), SyncError> {
        let me = thread::current().id();
        let mut owner = self.owner.lock();
        match *owner {
            Some(id) if id == me => Err(SyncError::Reentrant),
            Some(_) => Err(SyncError::WouldBlock),
            None => {
                *owner = Some(me);
                Ok(())
            }
        }
    }

    /// Release the lock; only the holder may do so
    pub fn release(&self) -> Result<(), SyncError> {
        let me = thread::current().id();
        let mut owner = self.owner.lock();
        match *owner {
            None => {
                warn!("release() on a lock that is not held");
                Err(SyncError::NotHeld)
            }
            Some(id) if id != me => {
                warn!("release() by thread {:?}, lock owned by {:?}", me, id);
                Err(SyncError::NotOwner)
            }
            Some(_) => {
                *owner = None;
                drop(owner);
                self.released.notify_one();
                Ok(())
            }
        }
    }

    /// Whether any thread currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.owner.lock().is_some()
    }

    /// Whether the calling thread currently holds the lock
    pub fn is_held_by_current_thread(&self) -> bool {
        *self.owner.lock() == Some(thread::current().id())
    }
}

impl Default for RawLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RawLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawLock")
            .field("owner", &*self.owner.lock())
            .finish()
    }
}

/// Data protected by a [`RawLock`], reachable only through a [`ScopedLock`].
pub struct ExclusiveLock<T: ?Sized> {
    raw: RawLock,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is serialized by `raw`; a `ScopedLock` exists
// only while the lock is held by the thread that created it.
unsafe impl<T: ?Sized + Send> Send for ExclusiveLock<T> {}
unsafe impl<T: ?Sized + Send> Sync for ExclusiveLock<T> {}

impl<T> ExclusiveLock<T> {
    /// Wrap `value` in a new, unlocked lock
    pub fn new(value: T) -> Self {
        Self {
            raw: RawLock::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Consume the lock, returning the protected value
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> ExclusiveLock<T> {
    /// Acquire the lock for the enclosing scope.
    ///
    /// The returned guard releases the lock on every exit path, including
    /// early return and unwinding.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread already holds this lock.
    pub fn acquire(&self) -> ScopedLock<'_, T> {
        if let Err(e) = self.raw.acquire() {
            panic!("ExclusiveLock::acquire: {}", e);
        }
        ScopedLock::new(self)
    }

    /// Acquire without blocking
    pub fn try_acquire(&self) -> Result<ScopedLock<'_, T>, SyncError> {
        self.raw.try_acquire()?;
        Ok(ScopedLock::new(self))
    }

    /// Whether any thread currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Mutable access without locking; the borrow checker proves exclusivity
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub(crate) fn raw(&self) -> &RawLock {
        &self.raw
    }
}

impl<T: Default> Default for ExclusiveLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized> fmt::Debug for ExclusiveLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveLock")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

/// Scoped acquisition of an [`ExclusiveLock`]: held from construction
/// until drop. Not `Send`, so it is always released by its acquirer.
pub struct ScopedLock<'a, T: ?Sized> {
    lock: &'a ExclusiveLock<T>,
    _not_send: PhantomData<*const ()>,
}

impl<'a, T: ?Sized> ScopedLock<'a, T> {
    fn new(lock: &'a ExclusiveLock<T>) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }

    pub(crate) fn lock(&self) -> &'a ExclusiveLock<T> {
        self.lock
    }
}

impl<T: ?Sized> Deref for ScopedLock<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard proves the current thread holds the lock
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for ScopedLock<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard proves the current thread holds the lock
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for ScopedLock<'_, T> {
    fn drop(&mut self) {
        // The guard is !Send, so the holder is always the current thread
        if let Err(e) = self.lock.raw.release() {
            warn!("scoped release failed: {}", e);
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ScopedLock<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
