//! Per-entity status event listener.
//!
//! The transport calls [`EventListener::on_status_changed`] (or one of the
//! typed entry points) from its own threads. Consumers poll with
//! [`EventListener::has_event`], read with [`EventListener::take_next_event`]
//! and may register a push callback. A wait set blocks on the listener
//! through an attached [`WaitCoordinator`].
//!
//! # Locking
//!
//! Each kind has its own register lock. An update holds that lock while it
//! mutates the register, sets the dirty flag and then, for every attached
//! coordinator, takes the coordinator lock and signals. The notification
//! channel lock is taken afterwards and never nested with the others.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::{EntityRole, EventKind, SupportedKinds};
use crate::notify::{EventCallback, NotificationChannel, NotificationStream};
use crate::policy::{DdsPolicyTable, PolicyResolver};
use crate::status::{
    CountStatus, IncompatibleQosStatus, StatusRegister, StatusSnapshot, StatusUpdate,
};
use crate::sync::lock_fatal;
use crate::wait::WaitCoordinator;

/// Unique identifier for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new random listener id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Kinds the owning entity reports. Supplied by the adapter.
    pub supported: SupportedKinds,
    /// Translates transport policy ids for incompatible-QoS snapshots.
    pub policy_resolver: Arc<dyn PolicyResolver>,
}

impl ListenerConfig {
    /// Stock capability table for `role` with the DDS policy table.
    #[must_use]
    pub fn for_role(role: EntityRole) -> Self {
        Self {
            supported: role.supported_kinds(),
            policy_resolver: Arc::new(DdsPolicyTable),
        }
    }

    /// Override the capability table.
    #[must_use]
    pub fn with_supported(mut self, supported: SupportedKinds) -> Self {
        self.supported = supported;
        self
    }

    /// Use a transport-specific policy translation.
    #[must_use]
    pub fn with_policy_resolver(mut self, resolver: Arc<dyn PolicyResolver>) -> Self {
        self.policy_resolver = resolver;
        self
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::for_role(EntityRole::Publisher)
    }
}

#[derive(Debug, Default)]
struct KindSlot {
    register: StatusRegister,
    // One entry per attached wait set.
    waiters: Vec<Weak<WaitCoordinator>>,
}

/// Status registers, dirty flags and notification channel for one entity.
#[derive(Debug)]
pub struct EventListener {
    id: ListenerId,
    supported: SupportedKinds,
    policy_resolver: Arc<dyn PolicyResolver>,
    slots: [Mutex<KindSlot>; EventKind::COUNT],
    dirty: [AtomicBool; EventKind::COUNT],
    channel: NotificationChannel,
}

impl EventListener {
    /// Listener with every register zeroed and no callback registered.
    #[must_use]
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            id: ListenerId::new(),
            supported: config.supported,
            policy_resolver: config.policy_resolver,
            slots: std::array::from_fn(|_| Mutex::new(KindSlot::default())),
            dirty: std::array::from_fn(|_| AtomicBool::new(false)),
            channel: NotificationChannel::new(),
        }
    }

    /// Listener with the stock capability table for `role`.
    #[must_use]
    pub fn for_role(role: EntityRole) -> Self {
        Self::new(ListenerConfig::for_role(role))
    }

    /// Identifier used in log records.
    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Kinds this listener reports.
    #[must_use]
    pub const fn supported_kinds(&self) -> SupportedKinds {
        self.supported
    }

    /// Whether `kind` is in [`supported_kinds`](Self::supported_kinds).
    #[must_use]
    pub const fn is_supported(&self, kind: EventKind) -> bool {
        self.supported.contains(kind)
    }

    /// Record a status change reported by the transport.
    ///
    /// `kind` must be supported; violating that is a caller bug (debug
    /// assertion, ignored with a warning in release builds). `update.absolute`
    /// is trusted to be non-decreasing per kind.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned, or in debug builds if `kind`
    /// is not supported.
    pub fn on_status_changed(&self, kind: EventKind, update: StatusUpdate) {
        if !self.check_supported(kind, "on_status_changed") {
            return;
        }

        {
            let mut slot = self.lock_slot(kind);
            slot.register.update(update);
            self.dirty[kind.index()].store(true, Ordering::Relaxed);

            // Still under the register lock. A waiter holds its coordinator
            // lock from check to sleep, so it either sees the flag or is
            // asleep by the time this lock is granted.
            for waiter in &slot.waiters {
                if let Some(coordinator) = waiter.upgrade() {
                    let _wait_guard = coordinator.lock();
                    coordinator.notify_all();
                }
            }
        }

        tracing::trace!(
            listener = %self.id,
            %kind,
            absolute = update.absolute,
            delta = update.delta,
            "status changed"
        );

        // User code runs here; no internal lock other than the channel's is held.
        self.channel.notify();
    }

    // Typed entry points, one per transport callback.

    /// [`on_status_changed`](Self::on_status_changed) for
    /// [`EventKind::LivelinessLost`].
    pub fn on_liveliness_lost(&self, status: CountStatus) {
        self.on_status_changed(EventKind::LivelinessLost, status.into());
    }

    /// Offered deadline missed.
    pub fn on_offered_deadline_missed(&self, status: CountStatus) {
        self.on_status_changed(EventKind::OfferedDeadlineMissed, status.into());
    }

    /// Offered QoS incompatible; carries the offending policy.
    pub fn on_offered_incompatible_qos(&self, status: IncompatibleQosStatus) {
        self.on_status_changed(EventKind::OfferedQosIncompatible, status.into());
    }

    /// Requested deadline missed.
    pub fn on_requested_deadline_missed(&self, status: CountStatus) {
        self.on_status_changed(EventKind::RequestedDeadlineMissed, status.into());
    }

    /// Requested QoS incompatible; carries the offending policy.
    pub fn on_requested_incompatible_qos(&self, status: IncompatibleQosStatus) {
        self.on_status_changed(EventKind::RequestedQosIncompatible, status.into());
    }

    /// Message lost.
    pub fn on_message_lost(&self, status: CountStatus) {
        self.on_status_changed(EventKind::MessageLost, status.into());
    }

    /// Lock-free check for an unread change of `kind`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `kind` is not supported.
    #[must_use]
    pub fn has_event(&self, kind: EventKind) -> bool {
        if !self.check_supported(kind, "has_event") {
            return false;
        }
        self.dirty[kind.index()].load(Ordering::Relaxed)
    }

    /// Take the current status of `kind`, resetting its accumulated change.
    ///
    /// Returns `None` without touching any state if `kind` is unsupported.
    ///
    /// # Panics
    ///
    /// Panics if the register lock is poisoned.
    #[must_use]
    pub fn take_next_event(&self, kind: EventKind) -> Option<StatusSnapshot> {
        if !self.supported.contains(kind) {
            tracing::debug!(listener = %self.id, %kind, "take on unsupported event kind");
            return None;
        }

        let values = {
            let mut slot = self.lock_slot(kind);
            let values = slot.register.take();
            self.dirty[kind.index()].store(false, Ordering::Relaxed);
            values
        };

        // A kind that never saw a policy reports the transport's "invalid" id.
        let last_policy_kind = kind
            .carries_policy()
            .then(|| self.policy_resolver.resolve(values.last_policy.unwrap_or_default()));

        tracing::trace!(
            listener = %self.id,
            %kind,
            total_count = values.total_count,
            total_count_change = values.total_count_change,
            "status taken"
        );

        Some(StatusSnapshot {
            kind,
            total_count: values.total_count,
            total_count_change: values.total_count_change,
            last_policy_kind,
        })
    }

    /// Register (`Some`) or clear (`None`) the push callback.
    ///
    /// A pending backlog is delivered to the new callback in one call. The
    /// callback may call [`has_event`](Self::has_event) and
    /// [`take_next_event`](Self::take_next_event) but must not register or
    /// clear callbacks on this listener.
    pub fn set_notification_callback(&self, callback: Option<EventCallback>) {
        tracing::debug!(
            listener = %self.id,
            registered = callback.is_some(),
            "notification callback changed"
        );
        self.channel.set_callback(callback);
    }

    /// Route notifications into a bounded stream, replacing any callback.
    pub fn subscribe_stream(&self, capacity: usize) -> NotificationStream {
        let (callback, stream) = NotificationStream::with_capacity(capacity);
        self.set_notification_callback(Some(callback));
        stream
    }

    /// Notifications accumulated while no callback was registered.
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.channel.backlog()
    }

    /// Make every subsequent update signal `coordinator`.
    ///
    /// Several coordinators may be attached at once; attaching the same one
    /// twice is a no-op. Must not be called while holding the coordinator
    /// lock.
    pub fn attach_condition(&self, coordinator: &Arc<WaitCoordinator>) {
        let weak = Arc::downgrade(coordinator);
        for kind in self.supported.iter() {
            let mut slot = self.lock_slot(kind);
            // Drop entries whose wait set is gone.
            slot.waiters.retain(|w| w.strong_count() > 0);
            if !slot.waiters.iter().any(|w| Weak::ptr_eq(w, &weak)) {
                slot.waiters.push(weak.clone());
            }
        }
        tracing::debug!(listener = %self.id, "wait condition attached");
    }

    /// Stop signalling `coordinator`. Other attached coordinators are left
    /// in place.
    pub fn detach_condition(&self, coordinator: &Arc<WaitCoordinator>) {
        let weak = Arc::downgrade(coordinator);
        for kind in self.supported.iter() {
            self.lock_slot(kind).waiters.retain(|w| !Weak::ptr_eq(w, &weak));
        }
        tracing::debug!(listener = %self.id, "wait condition detached");
    }

    fn lock_slot(&self, kind: EventKind) -> MutexGuard<'_, KindSlot> {
        lock_fatal(&self.slots[kind.index()], "status_register")
    }

    fn check_supported(&self, kind: EventKind, op: &'static str) -> bool {
        let supported = self.supported.contains(kind);
        debug_assert!(
            supported,
            "{op}: event kind {kind} is not supported by listener {}",
            self.id
        );
        if !supported {
            tracing::warn!(listener = %self.id, %kind, op, "unsupported event kind");
        }
        supported
    }
}

impl Default for EventListener {
    fn default() -> Self {
        Self::new(ListenerConfig::default())
    }
}
