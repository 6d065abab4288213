use std::sync::{Condvar, MutexGuard, Mutex};
use std::time::Duration;

use crate::sync::lock_fatal;

/// Lock + condition variable shared between listeners and one wait set.
///
/// The wait set owns the coordinator; listeners only keep a `Weak` to it and
/// signal while holding both their register lock and this lock. A waiter
/// that checks readiness and goes to sleep under this lock therefore cannot
/// miss an update.
#[derive(Debug, Default)]
pub struct WaitCoordinator {
    lock: Mutex<()>,
    cond: Condvar,
}

impl WaitCoordinator {
    /// Fresh, unshared coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the shared lock.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        lock_fatal(&self.lock, "wait_coordinator")
    }

    /// Wake every waiter so it re-checks readiness.
    pub fn notify_all(&self) {
        self.cond.notify_all();
    }

    /// Sleep until notified. Spurious wakeups are possible.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn wait<'a>(&self, guard: MutexGuard<'a, ()>) -> MutexGuard<'a, ()> {
        match self.cond.wait(guard) {
            Ok(guard) => guard,
            Err(_) => {
                tracing::error!(context = "wait_coordinator", "poisoned lock");
                panic!("poisoned lock: wait_coordinator");
            }
        }
    }

    /// Sleep until notified or `timeout` elapses. The flag is true on timeout.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn wait_timeout<'a>(
        &self,
        guard: MutexGuard<'a, ()>,
        timeout: Duration,
    ) -> (MutexGuard<'a, ()>, bool) {
        match self.cond.wait_timeout(guard, timeout) {
            Ok((guard, result)) => (guard, result.timed_out()),
            Err(_) => {
                tracing::error!(context = "wait_coordinator", "poisoned lock");
                panic!("poisoned lock: wait_coordinator");
            }
        }
    }
}
