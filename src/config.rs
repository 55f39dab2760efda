// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime configuration for the access-control and publication-manager core.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration, loadable from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Fixed additive fudge added to every expiry-relative deadline to
    /// absorb clock skew and in-flight latency.
    #[serde(default = "default_ttl_uplift_ms")]
    pub ttl_uplift_ms: i64,

    /// When true, LDAC performs no backend interaction: queries go directly
    /// against the access store, which is assumed fully pre-provisioned.
    #[serde(default)]
    pub local_only: bool,

    /// Recipient participant ids exempt from the consumer-permission check
    /// (`AccessController::needsConsumerPermissionCheck`).
    #[serde(default)]
    pub whitelisted_participant_ids: Vec<String>,

    /// Number of worker threads backing the publication manager's scheduler.
    #[serde(default = "default_publication_threads")]
    pub publication_scheduler_threads: usize,

    /// Path to the access-store JSON snapshot file.
    #[serde(default = "default_store_path")]
    pub store_snapshot_path: PathBuf,
}

fn default_ttl_uplift_ms() -> i64 {
    10_000
}

fn default_publication_threads() -> usize {
    4
}

fn default_store_path() -> PathBuf {
    PathBuf::from("access-store.json")
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ttl_uplift_ms: default_ttl_uplift_ms(),
            local_only: false,
            whitelisted_participant_ids: Vec::new(),
            publication_scheduler_threads: default_publication_threads(),
            store_snapshot_path: default_store_path(),
        }
    }
}

impl CoreConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Save configuration to a YAML file.
    pub fn to_file(&self, path: &Path) -> Result<(), CoreError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn ttl_uplift(&self) -> Duration {
        Duration::from_millis(self.ttl_uplift_ms.max(0) as u64)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.publication_scheduler_threads == 0 {
            return Err(CoreError::Config(
                "publication_scheduler_threads cannot be 0".into(),
            ));
        }
        if self.ttl_uplift_ms < 0 {
            return Err(CoreError::Config("ttl_uplift_ms cannot be negative".into()));
        }
        Ok(())
    }
}
