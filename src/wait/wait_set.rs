use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{EventError, EventResult};
use crate::kind::EventKind;
use crate::listener::EventListener;

use super::coordinator::WaitCoordinator;

#[derive(Debug, Clone)]
struct WaitEntry {
    listener: Arc<EventListener>,
    kind: EventKind,
}

/// Entries that were ready when a wait returned, by registration index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadySet {
    indices: Vec<usize>,
}

impl ReadySet {
    /// Whether entry `index` was ready.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Number of ready entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Never true for a set returned by a successful wait.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Ready indices in registration order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

/// Blocks a thread until any registered (listener, kind) pair has an
/// unread event.
///
/// The wait set owns its [`WaitCoordinator`]. For the duration of
/// [`wait`](Self::wait) the coordinator is attached to every registered
/// listener; readiness is checked with the coordinator lock held and the
/// thread only sleeps on that same lock, so an update racing the check
/// always wakes it.
#[derive(Debug, Default)]
pub struct WaitSet {
    coordinator: Arc<WaitCoordinator>,
    entries: Vec<WaitEntry>,
}

impl WaitSet {
    /// Empty wait set with its own coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `kind` on `listener`. Returns the entry's index.
    ///
    /// # Errors
    ///
    /// Returns `EventError::UnsupportedKind` if the listener does not report
    /// `kind`.
    pub fn add(&mut self, listener: &Arc<EventListener>, kind: EventKind) -> EventResult<usize> {
        if !listener.is_supported(kind) {
            return Err(EventError::unsupported(kind));
        }
        self.entries.push(WaitEntry {
            listener: Arc::clone(listener),
            kind,
        });
        Ok(self.entries.len() - 1)
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Indices restart at zero.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The coordinator attached to listeners during a wait.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<WaitCoordinator> {
        &self.coordinator
    }

    /// Wait until at least one entry is ready.
    ///
    /// `None` waits indefinitely; `Some(Duration::ZERO)` polls once. An
    /// empty wait set has nothing that could become ready and returns a
    /// timeout immediately.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Timeout` if nothing became ready in time.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn wait(&self, timeout: Option<Duration>) -> EventResult<ReadySet> {
        let timeout_ms = timeout.map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        if self.entries.is_empty() {
            tracing::debug!("wait on empty wait set");
            return Err(EventError::Timeout {
                duration_ms: timeout_ms,
            });
        }

        // An unrepresentable deadline is as good as no deadline.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        for entry in &self.entries {
            entry.listener.attach_condition(&self.coordinator);
        }

        let mut guard = self.coordinator.lock();
        let ready = loop {
            let ready = self.collect_ready();
            if !ready.is_empty() {
                break ready;
            }
            match deadline {
                None => guard = self.coordinator.wait(guard),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break ready;
                    }
                    guard = self.coordinator.wait_timeout(guard, deadline - now).0;
                }
            }
        };
        drop(guard);

        for entry in &self.entries {
            entry.listener.detach_condition(&self.coordinator);
        }

        if ready.is_empty() {
            tracing::debug!(timeout_ms, "wait timed out");
            return Err(EventError::Timeout {
                duration_ms: timeout_ms,
            });
        }

        tracing::debug!(ready = ready.len(), "wait satisfied");
        Ok(ReadySet { indices: ready })
    }

    fn collect_ready(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.listener.has_event(entry.kind))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::EntityRole;
    use crate::status::StatusUpdate;

    #[test]
    fn add_rejects_unsupported_kind() {
        let listener = Arc::new(EventListener::for_role(EntityRole::Publisher));
        let mut ws = WaitSet::new();
        let err = ws.add(&listener, EventKind::MessageLost).unwrap_err();
        assert_eq!(err, EventError::unsupported(EventKind::MessageLost));
        assert!(ws.is_empty());
    }

    #[test]
    fn ready_before_wait_returns_immediately() {
        let listener = Arc::new(EventListener::for_role(EntityRole::Publisher));
        let mut ws = WaitSet::new();
        ws.add(&listener, EventKind::LivelinessLost).unwrap();
        let idx = ws.add(&listener, EventKind::OfferedDeadlineMissed).unwrap();

        listener.on_status_changed(EventKind::OfferedDeadlineMissed, StatusUpdate::counts(1, 1));

        let ready = ws.wait(None).unwrap();
        assert_eq!(ready.iter().collect::<Vec<_>>(), vec![idx]);
    }

    #[test]
    fn zero_timeout_polls() {
        let listener = Arc::new(EventListener::for_role(EntityRole::Subscription));
        let mut ws = WaitSet::new();
        ws.add(&listener, EventKind::MessageLost).unwrap();

        let err = ws.wait(Some(Duration::ZERO)).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn empty_set_times_out_immediately() {
        let ws = WaitSet::new();
        assert!(ws.wait(None).unwrap_err().is_timeout());
    }

    #[test]
    fn wait_detaches_afterwards() {
        let listener = Arc::new(EventListener::for_role(EntityRole::Publisher));
        let mut ws = WaitSet::new();
        ws.add(&listener, EventKind::LivelinessLost).unwrap();
        let _ = ws.wait(Some(Duration::from_millis(1)));

        // Only the wait set still owns the coordinator.
        assert_eq!(Arc::strong_count(ws.coordinator()), 1);
        assert_eq!(Arc::weak_count(ws.coordinator()), 0);
    }
}
