//! QoS policy identifiers and their adapter-level codes.
//!
//! Incompatible-QoS statuses carry the identifier of the last offending
//! policy as the transport numbers it. Consumers see a [`QosPolicyKind`]
//! instead; the translation goes through a [`PolicyResolver`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw policy identifier as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(pub u32);

impl PolicyId {
    /// Wrap a raw transport identifier.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The transport's number for this policy.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "policy#{}", self.0)
    }
}

/// Adapter-level QoS policy code.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QosPolicyKind {
    #[default]
    Invalid,
    Unknown,
    Durability,
    Deadline,
    Liveliness,
    Reliability,
    History,
    Lifespan,
    Depth,
    LivelinessLeaseDuration,
    AvoidRosNamespaceConventions,
}

/// Maps transport policy identifiers to adapter codes.
///
/// `resolve` runs once per incompatible-QoS take, on the consumer's thread,
/// after the register lock has been released. It may block without stalling
/// transport updates, but it delays the caller of the take.
pub trait PolicyResolver: Send + Sync + fmt::Debug {
    /// Resolve a transport policy identifier.
    fn resolve(&self, id: PolicyId) -> QosPolicyKind;
}

/// Policy numbering used by DDS implementations (`QosPolicyId_t`).
///
/// Only the policies the adapter exposes are mapped; everything else
/// resolves to [`QosPolicyKind::Invalid`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DdsPolicyTable;

#[allow(missing_docs)]
impl DdsPolicyTable {
    pub const DURABILITY: PolicyId = PolicyId(2);
    pub const DEADLINE: PolicyId = PolicyId(4);
    pub const LIVELINESS: PolicyId = PolicyId(8);
    pub const RELIABILITY: PolicyId = PolicyId(11);
    pub const HISTORY: PolicyId = PolicyId(13);
    pub const LIFESPAN: PolicyId = PolicyId(21);
}

impl PolicyResolver for DdsPolicyTable {
    fn resolve(&self, id: PolicyId) -> QosPolicyKind {
        match id {
            Self::DURABILITY => QosPolicyKind::Durability,
            Self::DEADLINE => QosPolicyKind::Deadline,
            Self::LIVELINESS => QosPolicyKind::Liveliness,
            Self::RELIABILITY => QosPolicyKind::Reliability,
            Self::HISTORY => QosPolicyKind::History,
            Self::LIFESPAN => QosPolicyKind::Lifespan,
            _ => QosPolicyKind::Invalid,
        }
    }
}
