// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scenario 4: a REQUEST whose ACEs carry non-wildcard operations forces
//! the controller through the operationNeeded fallback, which deserializes
//! the payload, extracts `methodName`, and re-queries with that operation.

use async_trait::async_trait;
use cc_access_core::controller::{AccessController, ConsumerPermissionDecision, InboundMessage, MessageType};
use cc_access_core::ldac::backend::{BackendError, CapabilitiesDirectory, DiscoveryEntry};
use cc_access_core::ldac::LocalDomainAccessController;
use cc_access_core::model::MasterControlEntry;
use cc_access_core::store::AccessStore;
use cc_access_core::types::{Permission, TrustLevel};
use std::collections::HashSet;
use std::sync::Arc;

struct IdentityCapabilities;

#[async_trait]
impl CapabilitiesDirectory for IdentityCapabilities {
    async fn lookup(&self, participant_id: &String) -> Result<DiscoveryEntry, BackendError> {
        Ok(DiscoveryEntry { participant_id: participant_id.clone(), domain: "d".into(), interface_name: "i".into() })
    }
}

#[tokio::test]
async fn scenario_4_operation_needed_fallback_resolves_named_operation() {
    let store = Arc::new(parking_lot::RwLock::new(AccessStore::new()));
    store.write().master_ace.upsert(MasterControlEntry {
        uid: "consumer1".into(),
        domain: "d".into(),
        interface_name: "i".into(),
        operation: "foo".into(),
        default_required_trust_level: TrustLevel::Low,
        default_permission: Permission::Yes,
        possible_permissions: HashSet::from([Permission::Yes]),
        possible_required_trust_levels: HashSet::from([TrustLevel::Low]),
        possible_required_control_entry_change_trust_levels: HashSet::new(),
    });

    let ldac = Arc::new(LocalDomainAccessController::new_local_only(store));
    let ac = AccessController::new(ldac, Arc::new(IdentityCapabilities), []);

    let message = InboundMessage {
        message_type: MessageType::Request,
        recipient_participant_id: "consumer1".into(),
        creator_uid: "consumer1".into(),
        encrypted: false,
        payload: serde_json::json!({"methodName": "foo"}),
    };

    let decision = ac.has_consumer_permission(&message).await;
    assert_eq!(decision, ConsumerPermissionDecision::Yes);
}
