// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory keyed storage of access/registration/role entries with
//! wildcard precedence, backed by a JSON snapshot on disk.

pub mod persistence;
pub mod radix;

use crate::error::CoreError;
use crate::model::{DomainRoleEntry, MasterControlEntry, OwnerControlEntry};
use crate::types::{wildcard_last_cmp, Role, WILDCARD};
use radix::{wildcard_suffix_prefix, PrefixIndex};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Common key fields shared by master/mediator/owner access- and
/// registration-control entries. RCE entries always carry `operation ==
/// "*"`, collapsing the 4-probe lookup below to a 2-probe uid lookup -- this
/// is how "keyed by (uid, domain, interfaceName) only" is modeled without a
/// second entry type.
pub trait Keyed {
    fn uid(&self) -> &str;
    fn domain(&self) -> &str;
    fn interface_name(&self) -> &str;
    fn operation(&self) -> &str;
}

impl Keyed for MasterControlEntry {
    fn uid(&self) -> &str {
        &self.uid
    }
    fn domain(&self) -> &str {
        &self.domain
    }
    fn interface_name(&self) -> &str {
        &self.interface_name
    }
    fn operation(&self) -> &str {
        &self.operation
    }
}

impl Keyed for OwnerControlEntry {
    fn uid(&self) -> &str {
        &self.uid
    }
    fn domain(&self) -> &str {
        &self.domain
    }
    fn interface_name(&self) -> &str {
        &self.interface_name
    }
    fn operation(&self) -> &str {
        &self.operation
    }
}

/// Primary composite key with a custom comparator:
/// `"*"` sorts strictly after every other string on `uid` and `operation`;
/// `domain`/`interfaceName` are plain lexicographic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeKey {
    pub domain: String,
    pub interface_name: String,
    pub uid: String,
    pub operation: String,
}

impl PartialOrd for CompositeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompositeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.domain
            .cmp(&other.domain)
            .then_with(|| self.interface_name.cmp(&other.interface_name))
            .then_with(|| wildcard_last_cmp(&self.uid, &other.uid))
            .then_with(|| wildcard_last_cmp(&self.operation, &other.operation))
    }
}

impl<E: Keyed> From<&E> for CompositeKey {
    fn from(e: &E) -> Self {
        Self {
            domain: e.domain().to_string(),
            interface_name: e.interface_name().to_string(),
            uid: e.uid().to_string(),
            operation: e.operation().to_string(),
        }
    }
}

/// One of the six indexed tables: a primary composite index ordered by the
/// wildcard-last comparator, plus a radix-style prefix index for domain
/// patterns ending in `*`.
#[derive(Debug, Clone)]
pub struct IndexedTable<E> {
    primary: BTreeMap<CompositeKey, E>,
    wildcard_domain: PrefixIndex<Vec<E>>,
}

impl<E> Default for IndexedTable<E> {
    fn default() -> Self {
        Self {
            primary: BTreeMap::new(),
            wildcard_domain: PrefixIndex::new(),
        }
    }
}

/// JSON object keys must be strings, so `CompositeKey` (a struct, not a
/// string) can't serialize as a `BTreeMap` key directly; the table is
/// flattened to its entry list and the index rebuilt via `upsert` on load.
impl<E: Keyed + Clone + Serialize> Serialize for IndexedTable<E> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.iter_all().collect::<Vec<_>>().serialize(serializer)
    }
}

impl<'de, E: Keyed + Clone + Deserialize<'de>> Deserialize<'de> for IndexedTable<E> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<E>::deserialize(deserializer)?;
        let mut table = Self::default();
        for entry in entries {
            table.upsert(entry);
        }
        Ok(table)
    }
}

impl<E: Keyed + Clone> IndexedTable<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `entry` at its primary key.
    pub fn upsert(&mut self, entry: E) {
        if let Some(prefix) = wildcard_suffix_prefix(entry.domain()).map(str::to_string) {
            let key_uid = entry.uid().to_string();
            let key_iface = entry.interface_name().to_string();
            let key_op = entry.operation().to_string();
            self.wildcard_domain.insert_with(&prefix, move |bucket| {
                bucket.retain(|e| {
                    !(e.uid() == key_uid && e.interface_name() == key_iface && e.operation() == key_op)
                });
                bucket.push(entry);
            });
        } else {
            let key = CompositeKey::from(&entry);
            self.primary.insert(key, entry);
        }
    }

    pub fn remove(&mut self, uid: &str, domain: &str, interface_name: &str, operation: &str) -> bool {
        if let Some(prefix) = wildcard_suffix_prefix(domain) {
            self.remove_from_wildcard_bucket(prefix, uid, interface_name, operation)
        } else {
            let key = CompositeKey {
                domain: domain.to_string(),
                interface_name: interface_name.to_string(),
                uid: uid.to_string(),
                operation: operation.to_string(),
            };
            self.primary.remove(&key).is_some()
        }
    }

    fn remove_from_wildcard_bucket(
        &mut self,
        prefix: &str,
        uid: &str,
        interface_name: &str,
        operation: &str,
    ) -> bool {
        let mut removed = false;
        for (p, bucket) in self.wildcard_domain.iter_mut() {
            if p == prefix {
                let before = bucket.len();
                bucket.retain(|e| !(e.uid() == uid && e.interface_name() == interface_name && e.operation() == operation));
                removed = bucket.len() != before;
                break;
            }
        }
        removed
    }

    /// Probe exact, wildcard
    /// operation, wildcard uid, then both wildcard, for the requested
    /// `(domain, interfaceName)`; if nothing is found there, fall back to
    /// the longest matching (and then ancestor) domain-prefix buckets.
    pub fn lookup(&self, uid: &str, domain: &str, interface_name: &str, operation: &str) -> Option<&E> {
        if let Some(hit) = Self::probe_primary(&self.primary, domain, interface_name, uid, operation) {
            return Some(hit);
        }
        for bucket in self.wildcard_domain.matching(domain) {
            if let Some(hit) = Self::probe_bucket(bucket, interface_name, uid, operation) {
                return Some(hit);
            }
        }
        None
    }

    fn probe_primary<'a>(
        primary: &'a BTreeMap<CompositeKey, E>,
        domain: &str,
        interface_name: &str,
        uid: &str,
        operation: &str,
    ) -> Option<&'a E> {
        for (probe_uid, probe_op) in Self::probe_order(uid, operation) {
            let key = CompositeKey {
                domain: domain.to_string(),
                interface_name: interface_name.to_string(),
                uid: probe_uid.to_string(),
                operation: probe_op.to_string(),
            };
            if let Some(e) = primary.get(&key) {
                return Some(e);
            }
        }
        None
    }

    fn probe_bucket<'a>(bucket: &'a [E], interface_name: &str, uid: &str, operation: &str) -> Option<&'a E> {
        let candidates: Vec<&E> = bucket.iter().filter(|e| e.interface_name() == interface_name).collect();
        for (probe_uid, probe_op) in Self::probe_order(uid, operation) {
            if let Some(e) = candidates.iter().find(|e| e.uid() == probe_uid && e.operation() == probe_op) {
                return Some(e);
            }
        }
        None
    }

    fn probe_order<'a>(uid: &'a str, operation: &'a str) -> [(&'a str, &'a str); 4] {
        [
            (uid, operation),
            (uid, WILDCARD),
            (WILDCARD, operation),
            (WILDCARD, WILDCARD),
        ]
    }

    /// All entries whose `(uid, domain, interfaceName)` matches exactly
    /// (no wildcard probing) -- used by `onlyWildcardOperations`.
    pub fn operations_for(&self, uid: &str, domain: &str, interface_name: &str) -> Vec<&str> {
        self.primary
            .iter()
            .filter(|(k, _)| k.domain == domain && k.interface_name == interface_name && k.uid == uid)
            .map(|(k, _)| k.operation.as_str())
            .collect()
    }

    /// All entries whose `domain` is in `domains` (used by the editable
    /// query).
    pub fn entries_for_domains<'a>(&'a self, domains: &std::collections::HashSet<String>) -> Vec<&'a E> {
        self.primary
            .iter()
            .filter(|(k, _)| domains.contains(&k.domain))
            .map(|(_, v)| v)
            .chain(
                self.wildcard_domain
                    .iter()
                    .flat_map(|(_, bucket)| bucket.iter())
                    .filter(|e| domains.contains(e.domain())),
            )
            .collect()
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.wildcard_domain.iter().map(|(_, b)| b.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &E> {
        self.primary
            .values()
            .chain(self.wildcard_domain.iter().flat_map(|(_, b)| b.iter()))
    }

    /// Table-by-table union used by `AccessStore::merge`: conflicting
    /// primary keys are replaced by the incoming value.
    pub fn merge(&mut self, other: &Self) {
        for (k, v) in &other.primary {
            self.primary.insert(k.clone(), v.clone());
        }
        for (prefix, bucket) in other.wildcard_domain.iter() {
            for entry in bucket {
                self.upsert(entry.clone());
                let _ = prefix;
            }
        }
    }
}

/// True iff, across
/// master/mediator/owner, the union of operations for `(uid,domain,iface)`
/// is empty or equals `{"*"}`.
pub fn only_wildcard_operations(
    master: &IndexedTable<MasterControlEntry>,
    mediator: &IndexedTable<MasterControlEntry>,
    owner: &IndexedTable<OwnerControlEntry>,
    uid: &str,
    domain: &str,
    interface_name: &str,
) -> bool {
    let mut ops: std::collections::HashSet<&str> = std::collections::HashSet::new();
    ops.extend(master.operations_for(uid, domain, interface_name));
    ops.extend(mediator.operations_for(uid, domain, interface_name));
    ops.extend(
        owner
            .iter_all()
            .filter(|e| e.uid() == uid && e.domain() == domain && e.interface_name() == interface_name)
            .map(|e| e.operation()),
    );
    ops.is_empty() || (ops.len() == 1 && ops.contains(WILDCARD))
}

/// The access store: six indexed tables (master/mediator/owner x
/// access/registration) plus the domain-role table, with atomic JSON
/// snapshot persistence.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AccessStore {
    pub master_ace: IndexedTable<MasterControlEntry>,
    pub mediator_ace: IndexedTable<MasterControlEntry>,
    pub owner_ace: IndexedTable<OwnerControlEntry>,
    pub master_rce: IndexedTable<MasterControlEntry>,
    pub mediator_rce: IndexedTable<MasterControlEntry>,
    pub owner_rce: IndexedTable<OwnerControlEntry>,
    #[serde(with = "domain_role_table")]
    pub domain_roles: BTreeMap<(String, RoleKey), DomainRoleEntry>,
    #[serde(skip)]
    snapshot_path: Option<PathBuf>,
}

/// JSON object keys must be strings, so the `(uid, RoleKey)` composite key
/// of the DRE table is serialized as a flat list of entries and rebuilt into
/// the map on load.
mod domain_role_table {
    use super::{DomainRoleEntry, RoleKey};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<(String, RoleKey), DomainRoleEntry>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        map.values().collect::<Vec<_>>().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(String, RoleKey), DomainRoleEntry>, D::Error> {
        let entries = Vec::<DomainRoleEntry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| ((entry.uid.clone(), entry.role.into()), entry))
            .collect())
    }
}

/// `Role` doesn't implement `Ord`/serde key usage directly as a map key
/// alongside a `String`; this thin wrapper gives the `(uid, role)` primary
/// key of the DRE table a total order for deterministic snapshotting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoleKey {
    Master,
    Owner,
}

impl From<Role> for RoleKey {
    fn from(r: Role) -> Self {
        match r {
            Role::Master => RoleKey::Master,
            Role::Owner => RoleKey::Owner,
        }
    }
}

impl AccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot_path(path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub fn set_snapshot_path(&mut self, path: impl Into<PathBuf>) {
        self.snapshot_path = Some(path.into());
    }

    /// Persist to the configured snapshot path, if any. No-op otherwise.
    pub fn persist_if_configured(&self) -> Result<(), CoreError> {
        if let Some(path) = &self.snapshot_path {
            persistence::save(self, path)?;
        }
        Ok(())
    }

    pub fn put_domain_role(&mut self, entry: DomainRoleEntry) {
        self.domain_roles
            .insert((entry.uid.clone(), entry.role.into()), entry);
        let _ = self.persist_if_configured();
    }

    pub fn remove_domain_role(&mut self, uid: &str, role: Role) -> bool {
        let removed = self.domain_roles.remove(&(uid.to_string(), role.into())).is_some();
        if removed {
            let _ = self.persist_if_configured();
        }
        removed
    }

    pub fn has_role(&self, uid: &str, domain: &str, role: Role) -> bool {
        self.domain_roles
            .get(&(uid.to_string(), role.into()))
            .is_some_and(|dre| dre.domains.contains(domain))
    }

    pub fn domains_for(&self, uid: &str, role: Role) -> std::collections::HashSet<String> {
        self.domain_roles
            .get(&(uid.to_string(), role.into()))
            .map(|dre| dre.domains.clone())
            .unwrap_or_default()
    }

    /// Master ACEs the given uid may edit: every entry in `master_ace`
    /// whose domain is one this uid holds the master role over.
    pub fn get_editable_master_access_control_entries(&self, uid: &str) -> Vec<&MasterControlEntry> {
        let domains = self.domains_for(uid, Role::Master);
        self.master_ace.entries_for_domains(&domains)
    }

    /// Mediator ACEs the given uid may edit. The original keys mediator
    /// edit rights off the same master role as master ACEs -- there is no
    /// separate mediator role.
    pub fn get_editable_mediator_access_control_entries(&self, uid: &str) -> Vec<&MasterControlEntry> {
        let domains = self.domains_for(uid, Role::Master);
        self.mediator_ace.entries_for_domains(&domains)
    }

    /// Owner ACEs the given uid may edit.
    pub fn get_editable_owner_access_control_entries(&self, uid: &str) -> Vec<&OwnerControlEntry> {
        let domains = self.domains_for(uid, Role::Owner);
        self.owner_ace.entries_for_domains(&domains)
    }

    /// Master RCEs (registration-control entries) the given uid may edit.
    pub fn get_editable_master_registration_control_entries(&self, uid: &str) -> Vec<&MasterControlEntry> {
        let domains = self.domains_for(uid, Role::Master);
        self.master_rce.entries_for_domains(&domains)
    }

    /// Mediator RCEs the given uid may edit.
    pub fn get_editable_mediator_registration_control_entries(&self, uid: &str) -> Vec<&MasterControlEntry> {
        let domains = self.domains_for(uid, Role::Master);
        self.mediator_rce.entries_for_domains(&domains)
    }

    /// Owner RCEs the given uid may edit.
    pub fn get_editable_owner_registration_control_entries(&self, uid: &str) -> Vec<&OwnerControlEntry> {
        let domains = self.domains_for(uid, Role::Owner);
        self.owner_rce.entries_for_domains(&domains)
    }

    pub fn only_wildcard_operations(&self, uid: &str, domain: &str, interface_name: &str) -> bool {
        only_wildcard_operations(&self.master_ace, &self.mediator_ace, &self.owner_ace, uid, domain, interface_name)
    }

    pub fn only_wildcard_registration_operations(&self, uid: &str, domain: &str, interface_name: &str) -> bool {
        only_wildcard_operations(&self.master_rce, &self.mediator_rce, &self.owner_rce, uid, domain, interface_name)
    }

    /// `merge(other)`: table-by-table union; conflicting primary keys are
    /// replaced by the incoming value. Any single table's merge is
    /// infallible here (in-memory unions cannot fail), but the signature
    /// returns `Result` so a future backing store that can fail partway
    /// (e.g. a disk-backed table) aborts the whole operation cleanly.
    pub fn merge(&mut self, other: &AccessStore) -> Result<(), CoreError> {
        self.master_ace.merge(&other.master_ace);
        self.mediator_ace.merge(&other.mediator_ace);
        self.owner_ace.merge(&other.owner_ace);
        self.master_rce.merge(&other.master_rce);
        self.mediator_rce.merge(&other.mediator_rce);
        self.owner_rce.merge(&other.owner_rce);
        for (k, v) in &other.domain_roles {
            self.domain_roles.insert(k.clone(), v.clone());
        }
        self.persist_if_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Permission, TrustLevel};
    use std::collections::HashSet;

    fn ace(uid: &str, domain: &str, iface: &str, op: &str, perm: Permission) -> MasterControlEntry {
        MasterControlEntry {
            uid: uid.into(),
            domain: domain.into(),
            interface_name: iface.into(),
            operation: op.into(),
            default_required_trust_level: TrustLevel::Low,
            default_permission: perm,
            possible_permissions: HashSet::from([perm]),
            possible_required_trust_levels: HashSet::from([TrustLevel::Low]),
            possible_required_control_entry_change_trust_levels: HashSet::new(),
        }
    }

    #[test]
    fn specific_uid_beats_wildcard_uid_default() {
        let mut table = IndexedTable::<MasterControlEntry>::new();
        table.upsert(ace("*", "d", "i", "*", Permission::No));
        table.upsert(ace("alice", "d", "i", "*", Permission::Yes));

        let alice_hit = table.lookup("alice", "d", "i", "anyOp").unwrap();
        assert_eq!(alice_hit.default_permission, Permission::Yes);

        let bob_hit = table.lookup("bob", "d", "i", "anyOp").unwrap();
        assert_eq!(bob_hit.default_permission, Permission::No);
    }

    #[test]
    fn exact_operation_beats_wildcard_operation() {
        let mut table = IndexedTable::<MasterControlEntry>::new();
        table.upsert(ace("alice", "d", "i", "*", Permission::No));
        table.upsert(ace("alice", "d", "i", "foo", Permission::Yes));

        let hit = table.lookup("alice", "d", "i", "foo").unwrap();
        assert_eq!(hit.default_permission, Permission::Yes);
        let hit2 = table.lookup("alice", "d", "i", "bar").unwrap();
        assert_eq!(hit2.default_permission, Permission::No);
    }

    #[test]
    fn hierarchical_domain_wildcard_merges_ancestors() {
        let mut table = IndexedTable::<MasterControlEntry>::new();
        table.upsert(ace("alice", "com.*", "i", "*", Permission::No));
        table.upsert(ace("alice", "com.foo.*", "i", "*", Permission::Yes));

        let hit = table.lookup("alice", "com.foo.bar", "i", "op").unwrap();
        assert_eq!(hit.default_permission, Permission::Yes);

        let hit2 = table.lookup("alice", "com.other", "i", "op").unwrap();
        assert_eq!(hit2.default_permission, Permission::No);
    }

    #[test]
    fn only_wildcard_operations_true_when_absent_or_wildcard_only() {
        let master = IndexedTable::<MasterControlEntry>::new();
        let mediator = IndexedTable::<MasterControlEntry>::new();
        let owner = IndexedTable::<OwnerControlEntry>::new();
        assert!(only_wildcard_operations(&master, &mediator, &owner, "u", "d", "i"));

        let mut master2 = IndexedTable::<MasterControlEntry>::new();
        master2.upsert(ace("u", "d", "i", "*", Permission::Yes));
        assert!(only_wildcard_operations(&master2, &mediator, &owner, "u", "d", "i"));

        let mut master3 = IndexedTable::<MasterControlEntry>::new();
        master3.upsert(ace("u", "d", "i", "foo", Permission::Yes));
        assert!(!only_wildcard_operations(&master3, &mediator, &owner, "u", "d", "i"));
    }

    #[test]
    fn merge_replaces_conflicting_primary_keys() {
        let mut a = AccessStore::new();
        a.master_ace.upsert(ace("alice", "d", "i", "foo", Permission::No));
        let mut b = AccessStore::new();
        b.master_ace.upsert(ace("alice", "d", "i", "foo", Permission::Yes));

        a.merge(&b).unwrap();
        let hit = a.master_ace.lookup("alice", "d", "i", "foo").unwrap();
        assert_eq!(hit.default_permission, Permission::Yes);
    }

    #[test]
    fn domain_role_entry_grants_role_over_domains() {
        let mut store = AccessStore::new();
        store.put_domain_role(DomainRoleEntry::new("alice", Role::Master, ["d1".to_string(), "d2".to_string()]));
        assert!(store.has_role("alice", "d1", Role::Master));
        assert!(!store.has_role("alice", "d3", Role::Master));
        assert!(!store.has_role("bob", "d1", Role::Master));
    }

    #[test]
    fn editable_entries_are_scoped_to_the_uids_role_domains() {
        let mut store = AccessStore::new();
        store.put_domain_role(DomainRoleEntry::new("alice", Role::Master, ["d1".to_string()]));
        store.put_domain_role(DomainRoleEntry::new("alice", Role::Owner, ["d2".to_string()]));
        store.master_ace.upsert(ace("bob", "d1", "i", "foo", Permission::Yes));
        store.master_ace.upsert(ace("bob", "d2", "i", "foo", Permission::Yes));
        store.mediator_ace.upsert(ace("bob", "d1", "i", "foo", Permission::Yes));
        store.owner_ace.upsert(OwnerControlEntry {
            uid: "bob".into(),
            domain: "d2".into(),
            interface_name: "i".into(),
            operation: "foo".into(),
            required_trust_level: TrustLevel::Low,
            permission: Permission::Yes,
        });

        assert_eq!(store.get_editable_master_access_control_entries("alice").len(), 1);
        assert_eq!(store.get_editable_mediator_access_control_entries("alice").len(), 1);
        assert_eq!(store.get_editable_owner_access_control_entries("alice").len(), 1);
        assert!(store.get_editable_master_registration_control_entries("alice").is_empty());
        assert!(store.get_editable_mediator_registration_control_entries("alice").is_empty());
        assert!(store.get_editable_owner_registration_control_entries("alice").is_empty());
    }
}
