// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data model: identifiers, domain-role/access/registration-control
//! entries, subscription requests/publications and the publication record.

use crate::types::{ChangeType, Permission, Role, TrustLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type Uid = String;
pub type Domain = String;
pub type InterfaceName = String;
pub type Operation = String;
pub type ParticipantId = String;
pub type SubscriptionId = String;
pub type AttributeName = String;
pub type BroadcastName = String;

/// `(uid, role) -> set<domain>`. Grants `uid` editorial rights for the
/// listed domains under that role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRoleEntry {
    pub uid: Uid,
    pub role: Role,
    pub domains: HashSet<Domain>,
}

impl DomainRoleEntry {
    pub fn new(uid: impl Into<Uid>, role: Role, domains: impl IntoIterator<Item = Domain>) -> Self {
        Self {
            uid: uid.into(),
            role,
            domains: domains.into_iter().collect(),
        }
    }
}

/// Shared shape of a master/mediator access- or registration-control entry:
/// bounds the choices an inner layer may make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterControlEntry {
    pub uid: Uid,
    pub domain: Domain,
    pub interface_name: InterfaceName,
    /// Present for ACE (bound to an operation); absent (always `"*"`) for RCE,
    /// which is keyed by `(uid, domain, interfaceName)` only.
    pub operation: Operation,
    pub default_required_trust_level: TrustLevel,
    pub default_permission: Permission,
    pub possible_permissions: HashSet<Permission>,
    pub possible_required_trust_levels: HashSet<TrustLevel>,
    pub possible_required_control_entry_change_trust_levels: HashSet<TrustLevel>,
}

/// Concrete, innermost access- or registration-control entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerControlEntry {
    pub uid: Uid,
    pub domain: Domain,
    pub interface_name: InterfaceName,
    pub operation: Operation,
    pub required_trust_level: TrustLevel,
    pub permission: Permission,
}

/// QoS carried by a subscription request. Mirrors the four request shapes
/// from the four QoS shapes a subscription request may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubscriptionQos {
    Periodic {
        validity_ms: Option<i64>,
        publication_ttl_ms: i64,
        period_ms: i64,
        alert_interval_ms: i64,
    },
    OnChange {
        validity_ms: Option<i64>,
        publication_ttl_ms: i64,
        min_interval_ms: i64,
    },
    OnChangeWithKeepAlive {
        validity_ms: Option<i64>,
        publication_ttl_ms: i64,
        min_interval_ms: i64,
        max_interval_ms: i64,
    },
    Multicast {
        validity_ms: Option<i64>,
    },
}

impl SubscriptionQos {
    /// `expiryDateMs`, if the qos carries finite validity. `None` means
    /// `NO_EXPIRY`.
    pub fn validity_ms(&self) -> Option<i64> {
        match self {
            SubscriptionQos::Periodic { validity_ms, .. }
            | SubscriptionQos::OnChange { validity_ms, .. }
            | SubscriptionQos::OnChangeWithKeepAlive { validity_ms, .. }
            | SubscriptionQos::Multicast { validity_ms } => *validity_ms,
        }
    }

    pub fn publication_ttl_ms(&self) -> i64 {
        match self {
            SubscriptionQos::Periodic {
                publication_ttl_ms, ..
            }
            | SubscriptionQos::OnChange {
                publication_ttl_ms, ..
            }
            | SubscriptionQos::OnChangeWithKeepAlive {
                publication_ttl_ms, ..
            } => *publication_ttl_ms,
            SubscriptionQos::Multicast { .. } => i64::MAX,
        }
    }

    pub fn min_interval_ms(&self) -> i64 {
        match self {
            SubscriptionQos::OnChange { min_interval_ms, .. }
            | SubscriptionQos::OnChangeWithKeepAlive { min_interval_ms, .. } => *min_interval_ms,
            _ => 0,
        }
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self, SubscriptionQos::Periodic { .. })
    }

    pub fn is_multicast(&self) -> bool {
        matches!(self, SubscriptionQos::Multicast { .. })
    }

    pub fn is_on_change(&self) -> bool {
        matches!(
            self,
            SubscriptionQos::OnChange { .. } | SubscriptionQos::OnChangeWithKeepAlive { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub subscription_id: SubscriptionId,
    pub subscribe_to_name: String,
    pub qos: SubscriptionQos,
}

/// Error carried inside a `SubscriptionPublication` when admission fails, or
/// when a provider throws while reading an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionException {
    pub message: String,
    pub subscription_id: SubscriptionId,
}

impl SubscriptionException {
    pub fn new(message: impl Into<String>, subscription_id: impl Into<SubscriptionId>) -> Self {
        Self {
            message: message.into(),
            subscription_id: subscription_id.into(),
        }
    }
}

/// `{subscriptionId, response | error}`. Exactly one of the two is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubscriptionPublication {
    Response {
        subscription_id: SubscriptionId,
        value: serde_json::Value,
    },
    Error {
        subscription_id: SubscriptionId,
        error: SubscriptionException,
    },
}

impl SubscriptionPublication {
    pub fn subscription_id(&self) -> &str {
        match self {
            SubscriptionPublication::Response { subscription_id, .. }
            | SubscriptionPublication::Error { subscription_id, .. } => subscription_id,
        }
    }
}

/// A single `(ChangeType, entry)` notification delivered by a backend topic.
#[derive(Debug, Clone)]
pub struct ChangeNotification<T> {
    pub change_type: ChangeType,
    pub entry: T,
}
