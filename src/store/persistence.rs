// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Atomic JSON snapshot persistence for the access store.
//!
//! A missing file is not an error -- it means "start empty". A corrupt file
//! is logged and treated as empty rather than propagated, since the access
//! store is rebuildable from the backend and refusing to start on a torn
//! write would be worse than losing the local cache.

use super::AccessStore;
use crate::error::CoreError;
use std::path::Path;

pub fn load(path: &Path) -> Result<AccessStore, CoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no access-store snapshot, starting empty");
            return Ok(AccessStore::with_snapshot_path(path));
        }
        Err(e) => return Err(CoreError::Persistence(e)),
    };

    match serde_json::from_str::<AccessStore>(&content) {
        Ok(mut store) => {
            store.set_snapshot_path(path);
            Ok(store)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt access-store snapshot, starting empty");
            Ok(AccessStore::with_snapshot_path(path))
        }
    }
}

/// Write-then-rename: a crash mid-write leaves the previous snapshot (or no
/// snapshot) intact, never a half-written one.
pub fn save(store: &AccessStore, path: &Path) -> Result<(), CoreError> {
    let tmp_path = tmp_path_for(path);
    let json = serde_json::to_string_pretty(store)?;
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::path::PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MasterControlEntry;
    use crate::types::{Permission, TrustLevel};
    use std::collections::HashSet;

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = load(&path).unwrap();
        assert!(store.master_ace.is_empty());
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();
        let store = load(&path).unwrap();
        assert!(store.master_ace.is_empty());
    }

    #[test]
    fn round_trips_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = AccessStore::new();
        store.master_ace.upsert(MasterControlEntry {
            uid: "alice".into(),
            domain: "d".into(),
            interface_name: "i".into(),
            operation: "*".into(),
            default_required_trust_level: TrustLevel::Low,
            default_permission: Permission::Yes,
            possible_permissions: HashSet::from([Permission::Yes]),
            possible_required_trust_levels: HashSet::from([TrustLevel::Low]),
            possible_required_control_entry_change_trust_levels: HashSet::new(),
        });
        save(&store, &path).unwrap();

        let loaded = load(&path).unwrap();
        let hit = loaded.master_ace.lookup("alice", "d", "i", "anyOp").unwrap();
        assert_eq!(hit.default_permission, Permission::Yes);
    }
}
