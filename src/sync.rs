//! Lock helpers shared by the listener, channel and coordinator.

use std::sync::{Mutex, MutexGuard};

/// Acquire `mutex`, treating poisoning as fatal.
///
/// A poisoned lock means a thread panicked inside a critical section (most
/// likely a user callback). Status counters behind it can no longer be
/// trusted, so there is no recovery path.
///
/// # Panics
///
/// Panics if the mutex is poisoned.
pub(crate) fn lock_fatal<'a, T>(mutex: &'a Mutex<T>, context: &'static str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => {
            tracing::error!(context, "poisoned lock");
            panic!("poisoned lock: {context}");
        }
    }
}

/// Acquire `mutex`, recovering the guard if a previous holder panicked.
///
/// For state that stays consistent across a panic in code run under the
/// lock, i.e. every mutation happens after the foreign call returns.
pub(crate) fn lock_recover<'a, T>(mutex: &'a Mutex<T>, context: &'static str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::warn!(context, "recovering lock poisoned by a panicking holder");
        mutex.clear_poison();
        poisoned.into_inner()
    })
}
