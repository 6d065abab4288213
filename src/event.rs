//! Adapter-facing event handle.
//!
//! An [`EventHandle`] binds one listener to one event kind, the way the
//! middleware API hands out event objects. Support is validated once, at
//! construction, so later calls cannot hit the unsupported-kind path.

use std::sync::Arc;

use crate::error::{EventError, EventResult};
use crate::kind::EventKind;
use crate::listener::EventListener;
use crate::notify::EventCallback;
use crate::status::StatusSnapshot;

/// A (listener, kind) pair validated once at construction, as handed to an
/// executor or a wait set.
#[derive(Debug, Clone)]
pub struct EventHandle {
    listener: Arc<EventListener>,
    kind: EventKind,
}

impl EventHandle {
    /// Bind `kind` on `listener`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::UnsupportedKind` if the listener does not report
    /// `kind`.
    pub fn new(listener: Arc<EventListener>, kind: EventKind) -> EventResult<Self> {
        if !listener.is_supported(kind) {
            return Err(EventError::unsupported(kind));
        }
        Ok(Self { listener, kind })
    }

    /// The bound kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// The listener this handle reads from.
    #[must_use]
    pub fn listener(&self) -> &Arc<EventListener> {
        &self.listener
    }

    /// True if an update arrived since the last take.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.listener.has_event(self.kind)
    }

    /// Take the current status, resetting the accumulated change.
    ///
    /// # Errors
    ///
    /// Returns `EventError::UnsupportedKind` only if the listener stopped
    /// reporting the kind, which a listener never does.
    pub fn take(&self) -> EventResult<StatusSnapshot> {
        self.listener
            .take_next_event(self.kind)
            .ok_or(EventError::unsupported(self.kind))
    }

    /// Set the listener's push callback.
    ///
    /// The callback is per listener, not per kind: every handle bound to the
    /// same listener shares it.
    pub fn set_callback(&self, callback: Option<EventCallback>) {
        self.listener.set_notification_callback(callback);
    }
}
