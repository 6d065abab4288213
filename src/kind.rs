//! Event kinds and capability sets.
//!
//! The set of status kinds is closed and known at compile time, so every
//! per-kind table in the crate is a fixed-size array indexed by
//! [`EventKind::index`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status categories reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A publisher failed to assert its liveliness in time.
    LivelinessLost,
    /// A publisher missed the deadline it offered.
    OfferedDeadlineMissed,
    /// A publisher offered QoS incompatible with a matched subscription.
    OfferedQosIncompatible,
    /// A subscription did not receive data within the requested deadline.
    RequestedDeadlineMissed,
    /// A subscription requested QoS incompatible with a matched publisher.
    RequestedQosIncompatible,
    /// A subscription lost samples.
    MessageLost,
}

impl EventKind {
    /// Number of event kinds.
    pub const COUNT: usize = 6;

    /// Every kind, in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::LivelinessLost,
        Self::OfferedDeadlineMissed,
        Self::OfferedQosIncompatible,
        Self::RequestedDeadlineMissed,
        Self::RequestedQosIncompatible,
        Self::MessageLost,
    ];

    /// Dense table slot for this kind.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::LivelinessLost => 0,
            Self::OfferedDeadlineMissed => 1,
            Self::OfferedQosIncompatible => 2,
            Self::RequestedDeadlineMissed => 3,
            Self::RequestedQosIncompatible => 4,
            Self::MessageLost => 5,
        }
    }

    /// True for kinds whose status carries the last offending QoS policy.
    #[must_use]
    pub const fn carries_policy(self) -> bool {
        matches!(self, Self::OfferedQosIncompatible | Self::RequestedQosIncompatible)
    }

    /// Stable snake_case name, matching the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LivelinessLost => "liveliness_lost",
            Self::OfferedDeadlineMissed => "offered_deadline_missed",
            Self::OfferedQosIncompatible => "offered_qos_incompatible",
            Self::RequestedDeadlineMissed => "requested_deadline_missed",
            Self::RequestedQosIncompatible => "requested_qos_incompatible",
            Self::MessageLost => "message_lost",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a topic an entity sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    /// Data writer side.
    Publisher,
    /// Data reader side.
    Subscription,
}

impl EntityRole {
    /// Stock capability table for this role.
    #[must_use]
    pub const fn supported_kinds(self) -> SupportedKinds {
        match self {
            Self::Publisher => SupportedKinds::publisher(),
            Self::Subscription => SupportedKinds::subscription(),
        }
    }
}

/// Set of event kinds an entity supports.
///
/// Serializes as a list of kind names so capability tables can live in
/// configuration files.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<EventKind>", into = "Vec<EventKind>")]
pub struct SupportedKinds {
    bits: u8,
}

impl SupportedKinds {
    /// No kinds supported.
    #[must_use]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Kinds a publisher reports.
    #[must_use]
    pub const fn publisher() -> Self {
        Self::empty()
            .with(EventKind::LivelinessLost)
            .with(EventKind::OfferedDeadlineMissed)
            .with(EventKind::OfferedQosIncompatible)
    }

    /// Kinds a subscription reports.
    #[must_use]
    pub const fn subscription() -> Self {
        Self::empty()
            .with(EventKind::RequestedDeadlineMissed)
            .with(EventKind::RequestedQosIncompatible)
            .with(EventKind::MessageLost)
    }

    /// Returns a copy of this set with `kind` added.
    #[must_use]
    pub const fn with(self, kind: EventKind) -> Self {
        Self {
            bits: self.bits | (1 << kind.index()),
        }
    }

    /// Whether `kind` is in the set.
    #[must_use]
    pub const fn contains(self, kind: EventKind) -> bool {
        self.bits & (1 << kind.index()) != 0
    }

    /// True if no kind is supported.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Number of kinds in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterates supported kinds in table order.
    pub fn iter(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<EventKind> for SupportedKinds {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Vec<EventKind>> for SupportedKinds {
    fn from(kinds: Vec<EventKind>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<SupportedKinds> for Vec<EventKind> {
    fn from(kinds: SupportedKinds) -> Self {
        kinds.iter().collect()
    }
}

impl fmt::Debug for SupportedKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_match_all() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn role_tables_are_disjoint() {
        let publisher = EntityRole::Publisher.supported_kinds();
        let subscription = EntityRole::Subscription.supported_kinds();

        assert_eq!(publisher.len(), 3);
        assert_eq!(subscription.len(), 3);
        for kind in publisher.iter() {
            assert!(!subscription.contains(kind), "{kind} in both roles");
        }
        assert!(publisher.contains(EventKind::OfferedQosIncompatible));
        assert!(subscription.contains(EventKind::MessageLost));
    }

    #[test]
    fn only_incompatible_qos_carries_policy() {
        let carrying: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|k| k.carries_policy())
            .collect();
        assert_eq!(
            carrying,
            vec![EventKind::OfferedQosIncompatible, EventKind::RequestedQosIncompatible]
        );
    }

    #[test]
    fn supported_kinds_serializes_as_names() {
        let kinds: SupportedKinds = [EventKind::MessageLost, EventKind::LivelinessLost]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&kinds).unwrap();
        assert_eq!(json, r#"["liveliness_lost","message_lost"]"#);

        let parsed: SupportedKinds =
            serde_json::from_str(r#"["requested_deadline_missed"]"#).unwrap();
        assert!(parsed.contains(EventKind::RequestedDeadlineMissed));
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn empty_set() {
        let kinds = SupportedKinds::empty();
        assert!(kinds.is_empty());
        assert_eq!(kinds.iter().count(), 0);
        assert_eq!(format!("{kinds:?}"), "{}");
    }
}
