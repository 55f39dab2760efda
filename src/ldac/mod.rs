// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local Domain Access Controller (C3): the per-(domain,interface) cache in
//! front of the access store and algorithm, backed by an external policy
//! source on cache miss.

pub mod backend;

use crate::algorithm;
use crate::store::AccessStore;
use crate::types::{Permission, Role, TrustLevel};
use backend::{BackendError, PolicyBackend};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

const PARTITION_SEPARATOR: char = '\u{1E}';

/// Either a concrete decision or the sentinel asking the caller to retry
/// with a concrete operation name once it can deserialize the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerPermissionOutcome {
    Decided(Permission),
    OperationNeeded,
}

fn cache_key(domain: &str, interface_name: &str) -> String {
    format!("{domain}{PARTITION_SEPARATOR}{interface_name}")
}

/// Strips every character outside `[A-Za-z0-9]`, as required before using a
/// uid/domain/interfaceName as a multicast partition.
pub fn sanitize_partition(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

struct PendingRequest {
    uid: String,
    domain: String,
    interface_name: String,
    trust_level: TrustLevel,
    reply: oneshot::Sender<ConsumerPermissionOutcome>,
}

struct PendingProviderRequest {
    uid: String,
    domain: String,
    interface_name: String,
    trust_level: TrustLevel,
    reply: oneshot::Sender<Permission>,
}

#[derive(Default)]
struct CacheState {
    ace_subscriptions: std::collections::HashSet<String>,
    rce_subscriptions: std::collections::HashSet<String>,
    dre_subscriptions: std::collections::HashSet<String>,
    pending_requests: HashMap<String, Vec<PendingRequest>>,
    rce_pending_requests: HashMap<String, Vec<PendingProviderRequest>>,
}

pub struct LocalDomainAccessController {
    store: Arc<parking_lot::RwLock<AccessStore>>,
    backend: Option<Arc<dyn PolicyBackend>>,
    state: Mutex<CacheState>,
    local_only: bool,
}

impl LocalDomainAccessController {
    pub fn new(store: Arc<parking_lot::RwLock<AccessStore>>, backend: Arc<dyn PolicyBackend>) -> Self {
        Self {
            store,
            backend: Some(backend),
            state: Mutex::new(CacheState::default()),
            local_only: false,
        }
    }

    /// Local-only mode: no backend interaction, store assumed fully
    /// pre-provisioned.
    pub fn new_local_only(store: Arc<parking_lot::RwLock<AccessStore>>) -> Self {
        Self {
            store,
            backend: None,
            state: Mutex::new(CacheState::default()),
            local_only: true,
        }
    }

    /// Queries the DRE table; if `uid` is not yet subscribed for
    /// role-change notifications, subscribes.
    pub async fn has_role(&self, uid: &str, domain: &str, role: Role) -> bool {
        if let Some(backend) = self.backend.as_ref() {
            let needs_subscribe = {
                let mut state = self.state.lock().await;
                state.dre_subscriptions.insert(uid.to_string())
            };
            if needs_subscribe {
                let backend = Arc::clone(backend);
                let uid_partition = sanitize_partition(uid);
                if let Err(e) = backend.subscribe_role_changes(&uid_partition).await {
                    tracing::warn!(uid, error = %e, "role-change subscribe failed");
                }
            }
        }
        self.store.read().has_role(uid, domain, role)
    }

    /// Synchronous fast path: assumes policy for `(domain, interfaceName)`
    /// is already cached.
    pub fn get_consumer_permission_sync(
        &self,
        uid: &str,
        domain: &str,
        interface_name: &str,
        operation: &str,
        trust_level: TrustLevel,
    ) -> Permission {
        let store = self.store.read();
        let master = store.master_ace.lookup(uid, domain, interface_name, operation);
        let mediator = store.mediator_ace.lookup(uid, domain, interface_name, operation);
        let owner = store.owner_ace.lookup(uid, domain, interface_name, operation);
        algorithm::get_consumer_permission(master, mediator, owner, trust_level)
    }

    pub fn get_provider_permission_sync(
        &self,
        uid: &str,
        domain: &str,
        interface_name: &str,
        trust_level: TrustLevel,
    ) -> Permission {
        let store = self.store.read();
        let master = store.master_rce.lookup(uid, domain, interface_name, "*");
        let mediator = store.mediator_rce.lookup(uid, domain, interface_name, "*");
        let owner = store.owner_rce.lookup(uid, domain, interface_name, "*");
        algorithm::get_consumer_permission(master, mediator, owner, trust_level)
    }

    /// Provider-side asynchronous API: symmetric with
    /// `get_consumer_permission`, but keyed on RCE tables (always queried
    /// with `operation = "*"`, so there is no `operationNeeded` fallback).
    pub async fn get_provider_permission(
        &self,
        uid: &str,
        domain: &str,
        interface_name: &str,
        trust_level: TrustLevel,
    ) -> Permission {
        if self.local_only {
            return self.get_provider_permission_sync(uid, domain, interface_name, trust_level);
        }

        let key = cache_key(domain, interface_name);
        let mut state = self.state.lock().await;
        if state.rce_subscriptions.contains(&key) {
            drop(state);
            return self.get_provider_permission_sync(uid, domain, interface_name, trust_level);
        }

        let (tx, rx) = oneshot::channel();
        let is_first = !state.rce_pending_requests.contains_key(&key);
        state.rce_pending_requests.entry(key.clone()).or_default().push(PendingProviderRequest {
            uid: uid.to_string(),
            domain: domain.to_string(),
            interface_name: interface_name.to_string(),
            trust_level,
            reply: tx,
        });
        drop(state);

        if is_first {
            self.initialize_rce(key, uid.to_string()).await;
        }

        rx.await.unwrap_or(Permission::No)
    }

    /// First-pending-request path for provider permission: race three RCE
    /// fetches plus one DRE fetch; install the cache key and replay the
    /// queue on success, or deny every queued request on any failure.
    async fn initialize_rce(&self, key: String, uid_for_dre: String) {
        let backend = match &self.backend {
            Some(b) => Arc::clone(b),
            None => return,
        };
        let (domain, interface_name) = split_key(&key);

        let (master_res, mediator_res, owner_res, dre_res) = tokio::join!(
            backend.fetch_master_rce(&domain, &interface_name),
            backend.fetch_mediator_rce(&domain, &interface_name),
            backend.fetch_owner_rce(&domain, &interface_name),
            backend.fetch_domain_roles(&uid_for_dre),
        );

        let fetch_result = (|| -> Result<_, BackendError> { Ok((master_res?, mediator_res?, owner_res?, dre_res?)) })();

        match fetch_result {
            Ok((masters, mediators, owners, dres)) => {
                {
                    let mut store = self.store.write();
                    for e in masters {
                        store.master_rce.upsert(e);
                    }
                    for e in mediators {
                        store.mediator_rce.upsert(e);
                    }
                    for e in owners {
                        store.owner_rce.upsert(e);
                    }
                    for dre in dres {
                        store.put_domain_role(dre);
                    }
                    let _ = store.persist_if_configured();
                }

                let domain_partition = sanitize_partition(&domain);
                let interface_partition = sanitize_partition(&interface_name);
                let _ = backend.subscribe_rce_changes(&domain_partition, &interface_partition).await;

                let pending = {
                    let mut state = self.state.lock().await;
                    state.rce_subscriptions.insert(key.clone());
                    state.rce_pending_requests.remove(&key).unwrap_or_default()
                };

                for req in pending {
                    let permission = self.get_provider_permission_sync(&req.uid, &req.domain, &req.interface_name, req.trust_level);
                    let _ = req.reply.send(permission);
                }
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "rce initialization failed, denying queued requests");
                let pending = {
                    let mut state = self.state.lock().await;
                    state.rce_pending_requests.remove(&key).unwrap_or_default()
                };
                for req in pending {
                    let _ = req.reply.send(Permission::No);
                }
            }
        }
    }

    /// Asynchronous API: resolves to a permission if policy is cached, or
    /// `operationNeeded` / queues and fetches otherwise.
    pub async fn get_consumer_permission(
        &self,
        uid: &str,
        domain: &str,
        interface_name: &str,
        trust_level: TrustLevel,
    ) -> ConsumerPermissionOutcome {
        if self.local_only {
            return self.decide_cached(uid, domain, interface_name, trust_level);
        }

        let key = cache_key(domain, interface_name);
        let mut state = self.state.lock().await;
        if state.ace_subscriptions.contains(&key) {
            drop(state);
            return self.decide_cached(uid, domain, interface_name, trust_level);
        }

        let (tx, rx) = oneshot::channel();
        let is_first = !state.pending_requests.contains_key(&key);
        state.pending_requests.entry(key.clone()).or_default().push(PendingRequest {
            uid: uid.to_string(),
            domain: domain.to_string(),
            interface_name: interface_name.to_string(),
            trust_level,
            reply: tx,
        });
        drop(state);

        if is_first {
            self.initialize(key, uid.to_string()).await;
        }

        rx.await.unwrap_or(ConsumerPermissionOutcome::Decided(Permission::No))
    }

    fn decide_cached(
        &self,
        uid: &str,
        domain: &str,
        interface_name: &str,
        trust_level: TrustLevel,
    ) -> ConsumerPermissionOutcome {
        let store = self.store.read();
        if store.only_wildcard_operations(uid, domain, interface_name) {
            let permission = self.get_consumer_permission_sync(uid, domain, interface_name, "*", trust_level);
            ConsumerPermissionOutcome::Decided(permission)
        } else {
            ConsumerPermissionOutcome::OperationNeeded
        }
    }

    /// First-pending-request path: race three ACE fetches plus one DRE
    /// fetch; install the cache key and replay the queue on success, or
    /// resolve every queued request to `NO` on any failure.
    async fn initialize(&self, key: String, uid_for_dre: String) {
        let backend = match &self.backend {
            Some(b) => Arc::clone(b),
            None => return,
        };
        let (domain, interface_name) = split_key(&key);

        let (master_res, mediator_res, owner_res, dre_res) = tokio::join!(
            backend.fetch_master_ace(&domain, &interface_name),
            backend.fetch_mediator_ace(&domain, &interface_name),
            backend.fetch_owner_ace(&domain, &interface_name),
            backend.fetch_domain_roles(&uid_for_dre),
        );

        let fetch_result = (|| -> Result<_, BackendError> { Ok((master_res?, mediator_res?, owner_res?, dre_res?)) })();

        match fetch_result {
            Ok((masters, mediators, owners, dres)) => {
                {
                    let mut store = self.store.write();
                    for e in masters {
                        store.master_ace.upsert(e);
                    }
                    for e in mediators {
                        store.mediator_ace.upsert(e);
                    }
                    for e in owners {
                        store.owner_ace.upsert(e);
                    }
                    for dre in dres {
                        store.put_domain_role(dre);
                    }
                    let _ = store.persist_if_configured();
                }

                let domain_partition = sanitize_partition(&domain);
                let interface_partition = sanitize_partition(&interface_name);
                let _ = backend.subscribe_ace_changes(&domain_partition, &interface_partition).await;

                let pending = {
                    let mut state = self.state.lock().await;
                    state.ace_subscriptions.insert(key.clone());
                    state.pending_requests.remove(&key).unwrap_or_default()
                };

                for req in pending {
                    let outcome = self.decide_cached(&req.uid, &req.domain, &req.interface_name, req.trust_level);
                    let _ = req.reply.send(outcome);
                }
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "ace initialization failed, denying queued requests");
                let pending = {
                    let mut state = self.state.lock().await;
                    state.pending_requests.remove(&key).unwrap_or_default()
                };
                for req in pending {
                    let _ = req.reply.send(ConsumerPermissionOutcome::Decided(Permission::No));
                }
            }
        }
    }

    /// Apply a master/mediator/owner ACE change notification to the store.
    /// No cached decision is replayed -- only the store is updated.
    pub fn apply_master_ace_change(&self, change: backend::MasterAceChange) {
        let mut store = self.store.write();
        match change.change_type {
            crate::types::ChangeType::Add | crate::types::ChangeType::Update => {
                store.master_ace.upsert(change.entry);
            }
            crate::types::ChangeType::Remove => {
                store.master_ace.remove(
                    &change.entry.uid,
                    &change.entry.domain,
                    &change.entry.interface_name,
                    &change.entry.operation,
                );
            }
        }
        let _ = store.persist_if_configured();
    }

    pub fn apply_mediator_ace_change(&self, change: backend::MasterAceChange) {
        let mut store = self.store.write();
        match change.change_type {
            crate::types::ChangeType::Add | crate::types::ChangeType::Update => {
                store.mediator_ace.upsert(change.entry);
            }
            crate::types::ChangeType::Remove => {
                store.mediator_ace.remove(
                    &change.entry.uid,
                    &change.entry.domain,
                    &change.entry.interface_name,
                    &change.entry.operation,
                );
            }
        }
        let _ = store.persist_if_configured();
    }

    pub fn apply_owner_ace_change(&self, change: backend::OwnerAceChange) {
        let mut store = self.store.write();
        match change.change_type {
            crate::types::ChangeType::Add | crate::types::ChangeType::Update => {
                store.owner_ace.upsert(change.entry);
            }
            crate::types::ChangeType::Remove => {
                store.owner_ace.remove(
                    &change.entry.uid,
                    &change.entry.domain,
                    &change.entry.interface_name,
                    &change.entry.operation,
                );
            }
        }
        let _ = store.persist_if_configured();
    }

    pub fn apply_master_rce_change(&self, change: backend::MasterRceChange) {
        let mut store = self.store.write();
        match change.change_type {
            crate::types::ChangeType::Add | crate::types::ChangeType::Update => {
                store.master_rce.upsert(change.entry);
            }
            crate::types::ChangeType::Remove => {
                store.master_rce.remove(
                    &change.entry.uid,
                    &change.entry.domain,
                    &change.entry.interface_name,
                    &change.entry.operation,
                );
            }
        }
        let _ = store.persist_if_configured();
    }

    pub fn apply_mediator_rce_change(&self, change: backend::MasterRceChange) {
        let mut store = self.store.write();
        match change.change_type {
            crate::types::ChangeType::Add | crate::types::ChangeType::Update => {
                store.mediator_rce.upsert(change.entry);
            }
            crate::types::ChangeType::Remove => {
                store.mediator_rce.remove(
                    &change.entry.uid,
                    &change.entry.domain,
                    &change.entry.interface_name,
                    &change.entry.operation,
                );
            }
        }
        let _ = store.persist_if_configured();
    }

    pub fn apply_owner_rce_change(&self, change: backend::OwnerRceChange) {
        let mut store = self.store.write();
        match change.change_type {
            crate::types::ChangeType::Add | crate::types::ChangeType::Update => {
                store.owner_rce.upsert(change.entry);
            }
            crate::types::ChangeType::Remove => {
                store.owner_rce.remove(
                    &change.entry.uid,
                    &change.entry.domain,
                    &change.entry.interface_name,
                    &change.entry.operation,
                );
            }
        }
        let _ = store.persist_if_configured();
    }

    pub fn apply_domain_role_change(&self, change: backend::DomainRoleChange) {
        let mut store = self.store.write();
        match change.change_type {
            crate::types::ChangeType::Add | crate::types::ChangeType::Update => {
                store.put_domain_role(change.entry);
            }
            crate::types::ChangeType::Remove => {
                store.remove_domain_role(&change.entry.uid, change.entry.role);
            }
        }
    }

    /// Remove the cache entries for `(domain, interfaceName)` and
    /// unsubscribe from the backend's four ACE topics and three RCE topics,
    /// logging but not failing on unsubscribe errors.
    pub async fn unregister_provider(&self, domain: &str, interface_name: &str) {
        let key = cache_key(domain, interface_name);
        {
            let mut state = self.state.lock().await;
            state.ace_subscriptions.remove(&key);
            state.rce_subscriptions.remove(&key);
        }

        if let Some(backend) = &self.backend {
            let domain_partition = sanitize_partition(domain);
            let interface_partition = sanitize_partition(interface_name);
            if let Err(e) = backend.unsubscribe_ace_changes(&domain_partition, &interface_partition).await {
                tracing::warn!(domain, interface_name, error = %e, "ace unsubscribe failed");
            }
            if let Err(e) = backend.unsubscribe_rce_changes(&domain_partition, &interface_partition).await {
                tracing::warn!(domain, interface_name, error = %e, "rce unsubscribe failed");
            }
        }
    }
}

fn split_key(key: &str) -> (String, String) {
    let mut parts = key.splitn(2, PARTITION_SEPARATOR);
    let domain = parts.next().unwrap_or_default().to_string();
    let interface_name = parts.next().unwrap_or_default().to_string();
    (domain, interface_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DomainRoleEntry, MasterControlEntry, OwnerControlEntry};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn sanitizes_non_alphanumeric_characters() {
        assert_eq!(sanitize_partition("com.foo-bar_1"), "comfoobar1");
    }

    #[test]
    fn cache_key_roundtrips_through_split() {
        let key = cache_key("d", "i");
        assert_eq!(split_key(&key), ("d".to_string(), "i".to_string()));
    }

    struct StubBackend {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PolicyBackend for StubBackend {
        async fn fetch_master_ace(&self, domain: &str, interface_name: &str) -> Result<Vec<MasterControlEntry>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BackendError::Unavailable("down".into()));
            }
            Ok(vec![MasterControlEntry {
                uid: "*".into(),
                domain: domain.into(),
                interface_name: interface_name.into(),
                operation: "*".into(),
                default_required_trust_level: TrustLevel::Low,
                default_permission: Permission::Yes,
                possible_permissions: HashSet::from([Permission::Yes]),
                possible_required_trust_levels: HashSet::from([TrustLevel::Low]),
                possible_required_control_entry_change_trust_levels: HashSet::new(),
            }])
        }
        async fn fetch_mediator_ace(&self, _domain: &str, _interface_name: &str) -> Result<Vec<MasterControlEntry>, BackendError> {
            Ok(vec![])
        }
        async fn fetch_owner_ace(&self, _domain: &str, _interface_name: &str) -> Result<Vec<OwnerControlEntry>, BackendError> {
            Ok(vec![])
        }
        async fn fetch_domain_roles(&self, _uid: &str) -> Result<Vec<DomainRoleEntry>, BackendError> {
            Ok(vec![])
        }
        async fn subscribe_ace_changes(&self, _d: &str, _i: &str) -> Result<(), BackendError> {
            Ok(())
        }
        async fn unsubscribe_ace_changes(&self, _d: &str, _i: &str) -> Result<(), BackendError> {
            Ok(())
        }
        async fn fetch_master_rce(&self, domain: &str, interface_name: &str) -> Result<Vec<MasterControlEntry>, BackendError> {
            if self.fail {
                return Err(BackendError::Unavailable("down".into()));
            }
            Ok(vec![MasterControlEntry {
                uid: "*".into(),
                domain: domain.into(),
                interface_name: interface_name.into(),
                operation: "*".into(),
                default_required_trust_level: TrustLevel::Low,
                default_permission: Permission::Yes,
                possible_permissions: HashSet::from([Permission::Yes]),
                possible_required_trust_levels: HashSet::from([TrustLevel::Low]),
                possible_required_control_entry_change_trust_levels: HashSet::new(),
            }])
        }
        async fn fetch_mediator_rce(&self, _domain: &str, _interface_name: &str) -> Result<Vec<MasterControlEntry>, BackendError> {
            Ok(vec![])
        }
        async fn fetch_owner_rce(&self, _domain: &str, _interface_name: &str) -> Result<Vec<OwnerControlEntry>, BackendError> {
            Ok(vec![])
        }
        async fn subscribe_rce_changes(&self, _d: &str, _i: &str) -> Result<(), BackendError> {
            Ok(())
        }
        async fn unsubscribe_rce_changes(&self, _d: &str, _i: &str) -> Result<(), BackendError> {
            Ok(())
        }
        async fn subscribe_role_changes(&self, _uid_partition: &str) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn two_queued_calls_both_resolve_from_master_default() {
        let store = Arc::new(parking_lot::RwLock::new(AccessStore::new()));
        let backend = Arc::new(StubBackend { calls: AtomicUsize::new(0), fail: false });
        let ldac = Arc::new(LocalDomainAccessController::new(store, backend));

        let ldac1 = Arc::clone(&ldac);
        let ldac2 = Arc::clone(&ldac);
        let (r1, r2) = tokio::join!(
            ldac1.get_consumer_permission("u", "d", "i", TrustLevel::High),
            ldac2.get_consumer_permission("u", "d", "i", TrustLevel::High),
        );

        assert_eq!(r1, ConsumerPermissionOutcome::Decided(Permission::Yes));
        assert_eq!(r2, ConsumerPermissionOutcome::Decided(Permission::Yes));
    }

    #[tokio::test]
    async fn fetch_failure_denies_all_queued_requests() {
        let store = Arc::new(parking_lot::RwLock::new(AccessStore::new()));
        let backend = Arc::new(StubBackend { calls: AtomicUsize::new(0), fail: true });
        let ldac = LocalDomainAccessController::new(store, backend);

        let outcome = ldac.get_consumer_permission("u", "d", "i", TrustLevel::High).await;
        assert_eq!(outcome, ConsumerPermissionOutcome::Decided(Permission::No));
    }

    #[tokio::test]
    async fn local_only_mode_reads_store_directly() {
        let store = Arc::new(parking_lot::RwLock::new(AccessStore::new()));
        store.write().master_ace.upsert(MasterControlEntry {
            uid: "u".into(),
            domain: "d".into(),
            interface_name: "i".into(),
            operation: "specific".into(),
            default_required_trust_level: TrustLevel::Low,
            default_permission: Permission::Yes,
            possible_permissions: HashSet::from([Permission::Yes]),
            possible_required_trust_levels: HashSet::from([TrustLevel::Low]),
            possible_required_control_entry_change_trust_levels: HashSet::new(),
        });
        let ldac = LocalDomainAccessController::new_local_only(store);
        // non-wildcard-only operation set -> operationNeeded
        let outcome = ldac.get_consumer_permission("u", "d", "i", TrustLevel::High).await;
        assert_eq!(outcome, ConsumerPermissionOutcome::OperationNeeded);

        let permission = ldac.get_consumer_permission_sync("u", "d", "i", "specific", TrustLevel::High);
        assert_eq!(permission, Permission::Yes);
    }

    #[tokio::test]
    async fn provider_permission_queues_behind_a_single_rce_fetch() {
        let store = Arc::new(parking_lot::RwLock::new(AccessStore::new()));
        let backend = Arc::new(StubBackend { calls: AtomicUsize::new(0), fail: false });
        let ldac = Arc::new(LocalDomainAccessController::new(store, backend));

        let ldac1 = Arc::clone(&ldac);
        let ldac2 = Arc::clone(&ldac);
        let (r1, r2) = tokio::join!(
            ldac1.get_provider_permission("u", "d", "i", TrustLevel::High),
            ldac2.get_provider_permission("u", "d", "i", TrustLevel::High),
        );

        assert_eq!(r1, Permission::Yes);
        assert_eq!(r2, Permission::Yes);
    }

    #[tokio::test]
    async fn provider_permission_fetch_failure_denies_queued_requests() {
        let store = Arc::new(parking_lot::RwLock::new(AccessStore::new()));
        let backend = Arc::new(StubBackend { calls: AtomicUsize::new(0), fail: true });
        let ldac = LocalDomainAccessController::new(store, backend);

        let permission = ldac.get_provider_permission("u", "d", "i", TrustLevel::High).await;
        assert_eq!(permission, Permission::No);
    }

    #[tokio::test]
    async fn has_role_subscribes_for_role_changes_only_once_per_uid() {
        let store = Arc::new(parking_lot::RwLock::new(AccessStore::new()));
        let backend = Arc::new(StubBackend { calls: AtomicUsize::new(0), fail: false });
        let ldac = LocalDomainAccessController::new(store, backend);

        assert!(!ldac.has_role("alice", "d", Role::Master).await);
        assert!(ldac.state.lock().await.dre_subscriptions.contains("alice"));

        // second call for the same uid does not panic or deadlock re-subscribing
        assert!(!ldac.has_role("alice", "d", Role::Master).await);
    }
}
