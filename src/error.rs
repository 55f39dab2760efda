// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Infrastructure error types.
//!
//! Protocol-level outcomes (`Permission::NO`, `operationNeeded`, `RETRY`,
//! `SubscriptionException`) are NOT represented here -- they are first-class
//! return values documented alongside the component that produces them.
//! `CoreError` covers configuration and persistence/backend failures only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("persistence I/O error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("persistence encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("access-policy backend error: {0}")]
    Backend(String),

    #[error("table merge failed: {0}")]
    Merge(String),
}
