// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scenario 7: wildcard precedence in the access store.

use cc_access_core::model::MasterControlEntry;
use cc_access_core::store::AccessStore;
use cc_access_core::types::{Permission, TrustLevel};
use std::collections::HashSet;

fn ace(uid: &str, default_permission: Permission) -> MasterControlEntry {
    MasterControlEntry {
        uid: uid.into(),
        domain: "d".into(),
        interface_name: "i".into(),
        operation: "*".into(),
        default_required_trust_level: TrustLevel::Low,
        default_permission,
        possible_permissions: HashSet::from([Permission::No, Permission::Yes]),
        possible_required_trust_levels: HashSet::from([TrustLevel::Low]),
        possible_required_control_entry_change_trust_levels: HashSet::new(),
    }
}

#[test]
fn scenario_7_wildcard_precedence() {
    let mut store = AccessStore::new();
    store.master_ace.upsert(ace("*", Permission::No));
    store.master_ace.upsert(ace("alice", Permission::Yes));

    let alice_row = store.master_ace.lookup("alice", "d", "i", "anything").unwrap();
    assert_eq!(alice_row.uid, "alice");
    assert_eq!(alice_row.default_permission, Permission::Yes);

    let bob_row = store.master_ace.lookup("bob", "d", "i", "anything").unwrap();
    assert_eq!(bob_row.uid, "*");
    assert_eq!(bob_row.default_permission, Permission::No);
}
