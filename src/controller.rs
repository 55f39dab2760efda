// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Access Controller (C4): per-message consumer-permission gate in front of
//! the LDAC, plus the synchronous provider-side check.

use crate::ldac::backend::{CapabilitiesDirectory, DiscoveryEntry};
use crate::ldac::{ConsumerPermissionOutcome, LocalDomainAccessController};
use crate::types::{Permission, TrustLevel};
use std::cell::Cell;
use std::collections::HashSet;
use std::sync::Arc;

/// The nine message types from the external interface, as far as AC cares
/// about them: whether they're correlated by id at a higher layer (and so
/// need no per-message ACL), and, for the operation-needed fallback, how to
/// extract the operation name from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Request,
    OneWay,
    Reply,
    SubscriptionRequest,
    BroadcastSubscriptionRequest,
    MulticastSubscriptionRequest,
    SubscriptionReply,
    Publication,
    Multicast,
}

impl MessageType {
    fn is_correlated_by_id(self) -> bool {
        matches!(
            self,
            MessageType::Reply | MessageType::Publication | MessageType::SubscriptionReply | MessageType::Multicast
        )
    }
}

#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_type: MessageType,
    pub recipient_participant_id: String,
    pub creator_uid: String,
    pub encrypted: bool,
    /// Raw payload, deserialized on the operation-needed fallback path
    /// according to `message_type`.
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerPermissionDecision {
    Yes,
    No,
    Retry,
}

thread_local! {
    /// Set by the cluster controller's own administrative paths around an
    /// internal provider registration; `hasProviderPermission` always
    /// grants while this is `true`.
    static INTERNAL_PROVIDER: Cell<bool> = const { Cell::new(false) };
}

/// RAII guard that marks the current thread as registering an internal
/// provider for the duration of its scope.
pub struct InternalProviderGuard(());

impl InternalProviderGuard {
    pub fn enter() -> Self {
        INTERNAL_PROVIDER.with(|flag| flag.set(true));
        Self(())
    }
}

impl Drop for InternalProviderGuard {
    fn drop(&mut self) {
        INTERNAL_PROVIDER.with(|flag| flag.set(false));
    }
}

fn is_internal_provider() -> bool {
    INTERNAL_PROVIDER.with(|flag| flag.get())
}

pub struct AccessController {
    ldac: Arc<LocalDomainAccessController>,
    capabilities: Arc<dyn CapabilitiesDirectory>,
    whitelisted_participant_ids: HashSet<String>,
}

impl AccessController {
    pub fn new(
        ldac: Arc<LocalDomainAccessController>,
        capabilities: Arc<dyn CapabilitiesDirectory>,
        whitelisted_participant_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            ldac,
            capabilities,
            whitelisted_participant_ids: whitelisted_participant_ids.into_iter().collect(),
        }
    }

    pub fn needs_consumer_permission_check(&self, message: &InboundMessage) -> bool {
        if self.whitelisted_participant_ids.contains(&message.recipient_participant_id) {
            return false;
        }
        !message.message_type.is_correlated_by_id()
    }

    pub async fn has_consumer_permission(&self, message: &InboundMessage) -> ConsumerPermissionDecision {
        if !self.needs_consumer_permission_check(message) {
            return ConsumerPermissionDecision::Yes;
        }

        let recipient = match self.capabilities.lookup(&message.recipient_participant_id).await {
            Ok(entry) => entry,
            Err(_) => return ConsumerPermissionDecision::Retry,
        };

        let outcome = self
            .ldac
            .get_consumer_permission(&message.creator_uid, &recipient.domain, &recipient.interface_name, TrustLevel::High)
            .await;

        match outcome {
            ConsumerPermissionOutcome::Decided(permission) => Self::convert(permission),
            ConsumerPermissionOutcome::OperationNeeded => {
                debug_assert!(!message.encrypted, "encrypted messages must not reach the operation-needed fallback");
                self.operation_needed_fallback(message, &recipient).await
            }
        }
    }

    async fn operation_needed_fallback(&self, message: &InboundMessage, recipient: &DiscoveryEntry) -> ConsumerPermissionDecision {
        let operation = match extract_operation(message) {
            Some(op) if !op.is_empty() => op,
            _ => return ConsumerPermissionDecision::No,
        };

        let permission = self.ldac.get_consumer_permission_sync(
            &message.creator_uid,
            &recipient.domain,
            &recipient.interface_name,
            &operation,
            TrustLevel::High,
        );
        Self::convert(permission)
    }

    fn convert(permission: Permission) -> ConsumerPermissionDecision {
        match permission.normalize() {
            Permission::Yes => ConsumerPermissionDecision::Yes,
            Permission::No | Permission::Ask => {
                debug_assert_ne!(permission, Permission::Ask, "Ask must already be normalized to No");
                ConsumerPermissionDecision::No
            }
        }
    }

    pub fn has_provider_permission(&self, uid: &str, trust_level: TrustLevel, domain: &str, interface_name: &str) -> bool {
        if is_internal_provider() {
            return true;
        }
        self.ldac.get_provider_permission_sync(uid, domain, interface_name, trust_level).is_granted()
    }
}

fn extract_operation(message: &InboundMessage) -> Option<String> {
    let field = match message.message_type {
        MessageType::OneWay | MessageType::Request => "methodName",
        MessageType::SubscriptionRequest
        | MessageType::BroadcastSubscriptionRequest
        | MessageType::MulticastSubscriptionRequest => "subscribeToName",
        _ => return None,
    };
    message.payload.get(field)?.as_str().map(str::to_string)
}
