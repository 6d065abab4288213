//! Push-style notification with backlog accumulation.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::sync::lock_recover;

/// User callback invoked with the number of new events.
///
/// Whatever context the consumer needs travels inside the closure.
pub type EventCallback = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
struct ChannelState {
    callback: Option<EventCallback>,
    backlog: usize,
}

/// Optional push callback plus a backlog counter used while no callback is
/// registered.
///
/// The callback runs with the channel lock held, so once
/// `set_callback(None)` returns the previous callback is never invoked
/// again. A callback may read listener status re-entrantly but must not
/// register or clear callbacks on the same channel.
///
/// A panicking callback propagates to the thread that triggered it. The
/// channel itself stays usable: counters are only touched after the callback
/// returns, so the lock is recovered rather than treated as fatal.
#[derive(Default)]
pub struct NotificationChannel {
    state: Mutex<ChannelState>,
}

impl NotificationChannel {
    /// Channel with no callback and an empty backlog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one event: invoke the callback with 1 or grow the backlog.
    pub fn notify(&self) {
        let mut guard = lock_recover(&self.state, "notification_channel");
        let state = &mut *guard;
        match &state.callback {
            Some(callback) => callback(1),
            None => state.backlog += 1,
        }
    }

    /// Register (`Some`) or clear (`None`) the push callback.
    ///
    /// Registering flushes any backlog through the new callback in a single
    /// call before it is stored.
    pub fn set_callback(&self, callback: Option<EventCallback>) {
        let mut state = lock_recover(&self.state, "notification_channel");
        match callback {
            Some(callback) => {
                if state.backlog > 0 {
                    tracing::debug!(backlog = state.backlog, "flushing notification backlog");
                    callback(state.backlog);
                    state.backlog = 0;
                }
                state.callback = Some(callback);
            }
            None => {
                state.callback = None;
            }
        }
    }

    /// Events accumulated while no callback was registered.
    #[must_use]
    pub fn backlog(&self) -> usize {
        lock_recover(&self.state, "notification_channel").backlog
    }

    /// Whether a push callback is currently registered.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        lock_recover(&self.state, "notification_channel").callback.is_some()
    }
}

impl fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_lock() {
            Ok(state) => f
                .debug_struct("NotificationChannel")
                .field("has_callback", &state.callback.is_some())
                .field("backlog", &state.backlog)
                .finish(),
            Err(_) => f.debug_struct("NotificationChannel").finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    fn recording() -> (EventCallback, Arc<Mutex<Vec<usize>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let cb: EventCallback = Arc::new(move |n| sink.lock().unwrap().push(n));
        (cb, calls)
    }

    #[test]
    fn backlog_accumulates_without_callback() {
        let ch = NotificationChannel::new();
        ch.notify();
        ch.notify();
        assert_eq!(ch.backlog(), 2);
        assert!(!ch.has_callback());
    }

    #[test]
    fn registration_flushes_backlog_once() {
        let ch = NotificationChannel::new();
        for _ in 0..3 {
            ch.notify();
        }

        let (cb, calls) = recording();
        ch.set_callback(Some(cb));
        assert_eq!(*calls.lock().unwrap(), vec![3]);
        assert_eq!(ch.backlog(), 0);

        ch.notify();
        assert_eq!(*calls.lock().unwrap(), vec![3, 1]);
    }

    #[test]
    fn registration_without_backlog_does_not_call() {
        let ch = NotificationChannel::new();
        let (cb, calls) = recording();
        ch.set_callback(Some(cb));
        assert!(calls.lock().unwrap().is_empty());
        assert!(ch.has_callback());
    }

    #[test]
    fn clearing_resumes_backlog_from_zero() {
        let ch = NotificationChannel::new();
        ch.notify();
        ch.notify();

        let (cb, _calls) = recording();
        ch.set_callback(Some(cb));
        ch.set_callback(None);
        assert_eq!(ch.backlog(), 0);

        ch.notify();
        assert_eq!(ch.backlog(), 1);
    }

    #[test]
    fn replacing_callback_routes_to_newest() {
        let ch = NotificationChannel::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&first);
        ch.set_callback(Some(Arc::new(move |n| {
            f.fetch_add(n, Ordering::Relaxed);
        })));
        ch.notify();

        let s = Arc::clone(&second);
        ch.set_callback(Some(Arc::new(move |n| {
            s.fetch_add(n, Ordering::Relaxed);
        })));
        ch.notify();
        ch.notify();

        assert_eq!(first.load(Ordering::Relaxed), 1);
        assert_eq!(second.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn panicking_callback_leaves_channel_usable() {
        let ch = Arc::new(NotificationChannel::new());
        let armed = Arc::new(AtomicBool::new(true));
        let hits = Arc::new(AtomicUsize::new(0));

        let (a, h) = (Arc::clone(&armed), Arc::clone(&hits));
        ch.set_callback(Some(Arc::new(move |n| {
            assert!(!a.swap(false, Ordering::SeqCst), "callback failure");
            h.fetch_add(n, Ordering::SeqCst);
        })));

        let c = Arc::clone(&ch);
        assert!(thread::spawn(move || c.notify()).join().is_err());

        ch.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(ch.has_callback());

        ch.set_callback(None);
        ch.notify();
        assert_eq!(ch.backlog(), 1);
    }

    #[test]
    fn panicking_flush_keeps_backlog() {
        let ch = Arc::new(NotificationChannel::new());
        ch.notify();
        ch.notify();

        let c = Arc::clone(&ch);
        let flush = thread::spawn(move || {
            c.set_callback(Some(Arc::new(|_: usize| panic!("flush failure"))));
        });
        assert!(flush.join().is_err());

        // The failed registration stored nothing and consumed nothing.
        assert!(!ch.has_callback());
        assert_eq!(ch.backlog(), 2);

        let (cb, calls) = recording();
        ch.set_callback(Some(cb));
        assert_eq!(*calls.lock().unwrap(), vec![2]);
    }
}
