// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Demo binary driving the access-control core end to end against an
//! in-memory stub backend: loads (or defaults) configuration, provisions a
//! few access entries, then runs a handful of scripted consumer-permission
//! checks and logs the resulting decisions.

use cc_access_core::controller::{AccessController, InboundMessage, MessageType};
use cc_access_core::ldac::backend::{BackendError, CapabilitiesDirectory, DiscoveryEntry, PolicyBackend};
use cc_access_core::ldac::LocalDomainAccessController;
use cc_access_core::model::{DomainRoleEntry, MasterControlEntry, OwnerControlEntry};
use cc_access_core::store::AccessStore;
use cc_access_core::types::{Permission, TrustLevel};
use cc_access_core::CoreConfig;
use async_trait::async_trait;
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// cc-access-demo - scripted run of the access-control core
#[derive(Parser, Debug)]
#[command(name = "cc-access-demo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (YAML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

struct StaticBackend;

#[async_trait]
impl PolicyBackend for StaticBackend {
    async fn fetch_master_ace(&self, _domain: &str, _interface_name: &str) -> Result<Vec<MasterControlEntry>, BackendError> {
        Ok(Vec::new())
    }
    async fn fetch_mediator_ace(&self, _domain: &str, _interface_name: &str) -> Result<Vec<MasterControlEntry>, BackendError> {
        Ok(Vec::new())
    }
    async fn fetch_owner_ace(&self, _domain: &str, _interface_name: &str) -> Result<Vec<OwnerControlEntry>, BackendError> {
        Ok(Vec::new())
    }
    async fn fetch_domain_roles(&self, _uid: &str) -> Result<Vec<DomainRoleEntry>, BackendError> {
        Ok(Vec::new())
    }
    async fn subscribe_ace_changes(&self, _domain_partition: &str, _interface_partition: &str) -> Result<(), BackendError> {
        Ok(())
    }
    async fn unsubscribe_ace_changes(&self, _domain_partition: &str, _interface_partition: &str) -> Result<(), BackendError> {
        Ok(())
    }
    async fn fetch_master_rce(&self, _domain: &str, _interface_name: &str) -> Result<Vec<MasterControlEntry>, BackendError> {
        Ok(Vec::new())
    }
    async fn fetch_mediator_rce(&self, _domain: &str, _interface_name: &str) -> Result<Vec<MasterControlEntry>, BackendError> {
        Ok(Vec::new())
    }
    async fn fetch_owner_rce(&self, _domain: &str, _interface_name: &str) -> Result<Vec<OwnerControlEntry>, BackendError> {
        Ok(Vec::new())
    }
    async fn subscribe_rce_changes(&self, _domain_partition: &str, _interface_partition: &str) -> Result<(), BackendError> {
        Ok(())
    }
    async fn unsubscribe_rce_changes(&self, _domain_partition: &str, _interface_partition: &str) -> Result<(), BackendError> {
        Ok(())
    }
    async fn subscribe_role_changes(&self, _uid_partition: &str) -> Result<(), BackendError> {
        Ok(())
    }
}

struct StaticCapabilities;

#[async_trait]
impl CapabilitiesDirectory for StaticCapabilities {
    async fn lookup(&self, participant_id: &String) -> Result<DiscoveryEntry, BackendError> {
        Ok(DiscoveryEntry {
            participant_id: participant_id.clone(),
            domain: "vehicle".into(),
            interface_name: "speed".into(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(true).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = if let Some(path) = args.config {
        info!(?path, "loading configuration");
        CoreConfig::from_file(&path)?
    } else {
        CoreConfig::default()
    };
    config.validate()?;

    let mut store = AccessStore::with_snapshot_path(config.store_snapshot_path.clone());
    store.master_ace.upsert(MasterControlEntry {
        uid: "*".into(),
        domain: "vehicle".into(),
        interface_name: "speed".into(),
        operation: "*".into(),
        default_required_trust_level: TrustLevel::Low,
        default_permission: Permission::No,
        possible_permissions: HashSet::from([Permission::No, Permission::Yes]),
        possible_required_trust_levels: HashSet::from([TrustLevel::Low, TrustLevel::Mid]),
        possible_required_control_entry_change_trust_levels: HashSet::new(),
    });
    store.owner_ace.upsert(OwnerControlEntry {
        uid: "driver1".into(),
        domain: "vehicle".into(),
        interface_name: "speed".into(),
        operation: "*".into(),
        required_trust_level: TrustLevel::Mid,
        permission: Permission::Yes,
    });

    let store = Arc::new(parking_lot::RwLock::new(store));
    let ldac = Arc::new(LocalDomainAccessController::new(Arc::clone(&store), Arc::new(StaticBackend)));
    let ac = AccessController::new(Arc::clone(&ldac), Arc::new(StaticCapabilities), config.whitelisted_participant_ids.clone());

    let granted = ldac
        .get_consumer_permission("driver1", "vehicle", "speed", TrustLevel::High)
        .await;
    info!(?granted, "driver1 at HIGH trust");

    let denied = ldac
        .get_consumer_permission("stranger", "vehicle", "speed", TrustLevel::High)
        .await;
    info!(?denied, "stranger at HIGH trust");

    let message = InboundMessage {
        message_type: MessageType::Request,
        recipient_participant_id: "driver1".into(),
        creator_uid: "driver1".into(),
        encrypted: false,
        payload: serde_json::json!({"methodName": "getSpeed"}),
    };
    let decision = ac.has_consumer_permission(&message).await;
    info!(?decision, "access-controller decision for driver1's request");

    Ok(())
}
