use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError, TrySendError};
use serde::{Deserialize, Serialize};

use crate::error::{EventError, EventResult};

use super::channel::EventCallback;

/// One push notification, as seen through a [`NotificationStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Number of new events this notice stands for.
    pub count: usize,
    /// When the callback fired.
    pub at: DateTime<Utc>,
}

/// Pull-style view over a listener's push callback.
///
/// The forwarding callback never blocks the transport thread: when the
/// stream buffer is full (or the stream was dropped) the notice is dropped
/// and counted instead. Dropping the stream does not unregister the
/// callback; the owner clears or replaces it on the listener.
#[derive(Debug)]
pub struct NotificationStream {
    rx: Receiver<Notice>,
    dropped: Arc<AtomicU64>,
}

impl NotificationStream {
    /// Build a stream and the callback that feeds it.
    pub(crate) fn with_capacity(capacity: usize) -> (EventCallback, Self) {
        let (tx, rx) = bounded::<Notice>(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));

        let callback_dropped = Arc::clone(&dropped);
        let callback: EventCallback = Arc::new(move |count| {
            let notice = Notice {
                count,
                at: Utc::now(),
            };
            match tx.try_send(notice) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                    callback_dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(count, "notification stream dropped notice");
                }
            }
        });

        (callback, Self { rx, dropped })
    }

    /// Receive the next notice (blocking).
    pub fn recv(&self) -> EventResult<Notice> {
        self.rx.recv().map_err(|_| EventError::Disconnected {
            path: "notification_stream".to_string(),
        })
    }

    /// Receive the next notice with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> EventResult<Notice> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => EventError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => EventError::Disconnected {
                path: "notification_stream".to_string(),
            },
        })
    }

    /// Non-blocking receive. `Ok(None)` means nothing is queued yet.
    pub fn try_recv(&self) -> EventResult<Option<Notice>> {
        match self.rx.try_recv() {
            Ok(notice) => Ok(Some(notice)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(EventError::Disconnected {
                path: "notification_stream".to_string(),
            }),
        }
    }

    /// Notices dropped because the buffer was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_counts_in_order() {
        let (cb, stream) = NotificationStream::with_capacity(8);
        cb(3);
        cb(1);

        assert_eq!(stream.try_recv().unwrap().map(|n| n.count), Some(3));
        assert_eq!(stream.recv().unwrap().count, 1);
        assert_eq!(stream.try_recv().unwrap(), None);
    }

    #[test]
    fn full_buffer_counts_drops() {
        let (cb, stream) = NotificationStream::with_capacity(1);
        cb(1);
        cb(1);
        cb(1);
        assert_eq!(stream.dropped(), 2);
        assert_eq!(stream.recv().unwrap().count, 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let (cb, stream) = NotificationStream::with_capacity(0);
        cb(5);
        assert_eq!(stream.recv().unwrap().count, 5);
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn dropped_callback_disconnects() {
        let (cb, stream) = NotificationStream::with_capacity(4);
        drop(cb);
        assert!(matches!(stream.recv(), Err(EventError::Disconnected { .. })));
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn recv_timeout_reports_duration() {
        let (_cb, stream) = NotificationStream::with_capacity(4);
        let err = stream.recv_timeout(Duration::from_millis(5)).unwrap_err();
        assert_eq!(err, EventError::Timeout { duration_ms: 5 });
    }
}
