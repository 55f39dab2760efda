// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! External collaborators the publication manager calls out to: the
//! transport-level publication sender and the provider-side request caller
//! (attribute getters / listener registration).

use crate::model::{AttributeName, BroadcastName, SubscriptionId, SubscriptionPublication};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CallerError {
    #[error("no request interpreter for this provider/interface")]
    NoRequestInterpreter,
    #[error("provider threw while reading attribute: {0}")]
    ProviderException(String),
}

/// Sends subscription replies and publications for a single subscription.
#[async_trait]
pub trait PublicationSender: Send + Sync {
    async fn send_subscription_reply(&self, subscription_id: &SubscriptionId, error: Option<String>);
    async fn send_publication(&self, publication: SubscriptionPublication, ttl_ms: i64);
}

/// Callback the manager registers with a `RequestCaller` to receive
/// on-change attribute/broadcast values pushed from the provider side.
pub trait ChangeListener: Send + Sync {
    fn on_change(&self, value: serde_json::Value);
}

/// Provider-side collaborator: reads attributes by name-convention getter
/// and lets the manager register on-change/broadcast listeners.
#[async_trait]
pub trait RequestCaller: Send + Sync {
    async fn get_attribute(&self, attribute_name: &AttributeName) -> Result<serde_json::Value, CallerError>;

    fn register_attribute_listener(&self, attribute_name: &AttributeName, listener: std::sync::Arc<dyn ChangeListener>);
    fn unregister_attribute_listener(&self, attribute_name: &AttributeName);

    fn register_broadcast_listener(&self, broadcast_name: &BroadcastName, listener: std::sync::Arc<dyn ChangeListener>);
    fn unregister_broadcast_listener(&self, broadcast_name: &BroadcastName);
}

pub const NO_EXPIRY: i64 = i64::MAX;
