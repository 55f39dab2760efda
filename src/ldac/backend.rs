// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! External collaborator traits for the local domain access controller: the
//! policy backend that provides ACEs/RCEs/DREs on demand and notifies of
//! changes, plus the capabilities directory AC consults to resolve a
//! message's recipient participant id to a domain/interface.

use crate::model::{
    ChangeNotification, DomainRoleEntry, MasterControlEntry, OwnerControlEntry, ParticipantId,
};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("policy backend unavailable: {0}")]
    Unavailable(String),
    #[error("policy backend returned malformed data: {0}")]
    Malformed(String),
}

/// External access-control policy source: fetches the three ACE kinds, the
/// three RCE kinds, and the DRE table on the first cache miss, and carries
/// the seven multicast subscriptions (3 ACE + 3 RCE + 1 DRE) that keep a
/// cached key fresh.
#[async_trait]
pub trait PolicyBackend: Send + Sync {
    async fn fetch_master_ace(
        &self,
        domain: &str,
        interface_name: &str,
    ) -> Result<Vec<MasterControlEntry>, BackendError>;

    async fn fetch_mediator_ace(
        &self,
        domain: &str,
        interface_name: &str,
    ) -> Result<Vec<MasterControlEntry>, BackendError>;

    async fn fetch_owner_ace(
        &self,
        domain: &str,
        interface_name: &str,
    ) -> Result<Vec<OwnerControlEntry>, BackendError>;

    async fn fetch_domain_roles(&self, uid: &str) -> Result<Vec<DomainRoleEntry>, BackendError>;

    /// Subscribe to ACE change notifications for a sanitized multicast
    /// partition. A no-op stub backend may ignore this.
    async fn subscribe_ace_changes(
        &self,
        domain_partition: &str,
        interface_partition: &str,
    ) -> Result<(), BackendError>;

    async fn unsubscribe_ace_changes(
        &self,
        domain_partition: &str,
        interface_partition: &str,
    ) -> Result<(), BackendError>;

    async fn fetch_master_rce(
        &self,
        domain: &str,
        interface_name: &str,
    ) -> Result<Vec<MasterControlEntry>, BackendError>;

    async fn fetch_mediator_rce(
        &self,
        domain: &str,
        interface_name: &str,
    ) -> Result<Vec<MasterControlEntry>, BackendError>;

    async fn fetch_owner_rce(
        &self,
        domain: &str,
        interface_name: &str,
    ) -> Result<Vec<OwnerControlEntry>, BackendError>;

    /// Subscribe to RCE change notifications for a sanitized multicast
    /// partition.
    async fn subscribe_rce_changes(
        &self,
        domain_partition: &str,
        interface_partition: &str,
    ) -> Result<(), BackendError>;

    async fn unsubscribe_rce_changes(
        &self,
        domain_partition: &str,
        interface_partition: &str,
    ) -> Result<(), BackendError>;

    /// Subscribe to the DRE-changed topic for a single uid's role-change
    /// notifications. Called at most once per uid (gated in `CacheState`).
    async fn subscribe_role_changes(&self, uid_partition: &str) -> Result<(), BackendError>;
}

/// A recipient participant's resolved domain/interface, as returned by the
/// local capabilities directory lookup (LOCAL_THEN_GLOBAL discovery scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEntry {
    pub participant_id: ParticipantId,
    pub domain: String,
    pub interface_name: String,
}

/// Local capabilities directory lookup AC uses to resolve a message's
/// recipient participant id. The *creator* (consumer) uid is never resolved
/// here -- it travels with the message itself.
#[async_trait]
pub trait CapabilitiesDirectory: Send + Sync {
    async fn lookup(&self, participant_id: &ParticipantId) -> Result<DiscoveryEntry, BackendError>;
}

pub type MasterAceChange = ChangeNotification<MasterControlEntry>;
pub type OwnerAceChange = ChangeNotification<OwnerControlEntry>;
pub type MasterRceChange = ChangeNotification<MasterControlEntry>;
pub type OwnerRceChange = ChangeNotification<OwnerControlEntry>;
pub type DomainRoleChange = ChangeNotification<DomainRoleEntry>;
