// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Core scalar types shared across the access-control and publication
//! components.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The wildcard token. Distinct semantics from any other string: it sorts
/// strictly after every other value on the fields where wildcarding applies.
pub const WILDCARD: &str = "*";

/// Totally ordered trust classification of a requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrustLevel {
    None,
    Low,
    Mid,
    High,
}

impl TrustLevel {
    /// Three-way comparison, kept as an explicit free function for parity
    /// with callers that want the original `TrustLevelComparator`-style API
    /// rather than operator overloads.
    pub fn compare(a: TrustLevel, b: TrustLevel) -> Ordering {
        a.cmp(&b)
    }
}

/// A consumer or provider permission decision. `Ask` is recognized but the
/// core always treats it as a non-grant (`Ask` == `No` in every decision
/// path); no code path may assert on encountering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    No,
    Ask,
    Yes,
}

impl Permission {
    /// Collapses `Ask` into `No`, the uniform rule mandated by this spec.
    pub fn normalize(self) -> Permission {
        match self {
            Permission::Ask => Permission::No,
            other => other,
        }
    }

    pub fn is_granted(self) -> bool {
        matches!(self.normalize(), Permission::Yes)
    }
}

/// Editorial role a user may hold over a set of domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Master,
    Owner,
}

/// Kind of change carried by a backend change-notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Add,
    Update,
    Remove,
}

/// Orders `"*"` strictly after every other string; used by the access
/// store's primary composite index so specific entries shadow wildcard
/// entries during ordered traversal.
pub fn wildcard_last_cmp(a: &str, b: &str) -> Ordering {
    match (a == WILDCARD, b == WILDCARD) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}
