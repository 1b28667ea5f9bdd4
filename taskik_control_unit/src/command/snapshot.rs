//! Single-value snapshot shared between the control cycle and an
//! asynchronous writer.
//!
//! ## Protocol
//!
//! The writer replaces the whole value under a `parking_lot::Mutex` and bumps
//! a publication counter before releasing the lock. The reader keeps its own
//! cached copy and the counter value it last saw; it only takes the lock when
//! the counter moved, and then only for the duration of a `Copy`. No lock is
//! ever held across numeric work, and a reader can never observe a value that
//! is half old and half new.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Published value plus publication counter.
#[derive(Debug)]
pub struct SharedSnapshot<T: Copy> {
    value: Mutex<T>,
    published: AtomicU64,
}

impl<T: Copy> SharedSnapshot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
            published: AtomicU64::new(0),
        }
    }

    /// Replace the whole value.
    pub fn publish(&self, value: T) {
        let mut guard = self.value.lock();
        *guard = value;
        self.published.fetch_add(1, Ordering::Release);
    }

    /// Read-modify-write under the lock; the closure must be trivial.
    pub fn modify(&self, f: impl FnOnce(&mut T)) {
        let mut guard = self.value.lock();
        f(&mut *guard);
        self.published.fetch_add(1, Ordering::Release);
    }

    /// Copy of the current value.
    #[inline]
    pub fn load(&self) -> T {
        *self.value.lock()
    }

    /// Number of publications so far.
    #[inline]
    pub fn publications(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

/// Reader-side cache of a [`SharedSnapshot`], owned by the control cycle.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotReader<T: Copy> {
    cached: T,
    seen: u64,
}

impl<T: Copy> SnapshotReader<T> {
    /// Reader primed with the snapshot's current value.
    pub fn new(shared: &SharedSnapshot<T>) -> Self {
        let guard = shared.value.lock();
        Self {
            cached: *guard,
            seen: shared.published.load(Ordering::Relaxed),
        }
    }

    /// Pull the latest value if one was published since the last refresh.
    ///
    /// Returns `true` when the cached value changed.
    #[inline]
    pub fn refresh(&mut self, shared: &SharedSnapshot<T>) -> bool {
        if shared.published.load(Ordering::Acquire) == self.seen {
            return false;
        }
        let guard = shared.value.lock();
        self.cached = *guard;
        // Stable while the lock is held: writers bump it before unlocking.
        self.seen = shared.published.load(Ordering::Relaxed);
        true
    }

    #[inline]
    pub fn get(&self) -> &T {
        &self.cached
    }
}
