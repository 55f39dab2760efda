// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wildcard-suffix storage: supports hierarchical policy patterns like
//! `"com.foo.*"` where a lookup for a concrete string returns the union of
//! everything stored at the longest matching prefix *and* every ancestor
//! prefix (broader rules set at shorter prefixes combine with narrower
//! overrides).
//!
//! The original (`RadixTree.h`) is a compressed trie with node splitting;
//! this implementation keeps only the externally observable behavior
//! (longest-match-plus-ancestors merge) behind a flat prefix map, since no
//! invariant in this spec depends on the internal node layout.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps stripped-wildcard prefixes (e.g. `"com.foo."` for the pattern
/// `"com.foo.*"`) to a bag of values. A single tree backs all six access
/// tables by using `V` as a per-entry-kind bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefixIndex<V> {
    by_prefix: HashMap<String, V>,
}

impl<V: Default> PrefixIndex<V> {
    pub fn new() -> Self {
        Self {
            by_prefix: HashMap::new(),
        }
    }

    /// Insert/merge `value` under `prefix` (the original pattern with its
    /// trailing `*` already stripped).
    pub fn insert_with(&mut self, prefix: &str, merge: impl FnOnce(&mut V)) {
        let entry = self.by_prefix.entry(prefix.to_string()).or_default();
        merge(entry);
    }

    /// All buckets whose prefix is a prefix of `key`, longest match first.
    /// This is the "longest matching prefix and all ancestor prefixes" set
    /// from this implementation.
    pub fn matching(&self, key: &str) -> Vec<&V> {
        let mut hits: Vec<(&String, &V)> = self
            .by_prefix
            .iter()
            .filter(|(prefix, _)| key.starts_with(prefix.as_str()))
            .collect();
        hits.sort_by_key(|b| std::cmp::Reverse(b.0.len()));
        hits.into_iter().map(|(_, v)| v).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.by_prefix.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut V)> {
        self.by_prefix.iter_mut()
    }

    pub fn remove_empty(&mut self, is_empty: impl Fn(&V) -> bool) {
        self.by_prefix.retain(|_, v| !is_empty(v));
    }
}

/// Splits a stored pattern into `(is_wildcard_suffixed, prefix)`. Patterns
/// ending in `*` (and longer than the bare wildcard token) are hierarchical;
/// the bare `"*"` token itself is handled by the ordinary wildcard-precedence
/// lookup, not by this index.
pub fn wildcard_suffix_prefix(pattern: &str) -> Option<&str> {
    if pattern == "*" {
        return None;
    }
    pattern.strip_suffix('*')
}
