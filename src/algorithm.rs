// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Access/registration permission algorithm and the validator that gates it.
//!
//! Mirrors the original `Validator<Tag>` template: one generic validator and
//! decision function shared by the access (consumer) and registration
//! (provider) entry triples, parameterized over the entry kind via the
//! `ControlEntry` trait rather than a C++-style tag type.

use crate::model::{MasterControlEntry, OwnerControlEntry};
use crate::types::{Permission, TrustLevel};

/// Common shape a master/mediator entry in either the access or
/// registration chain exposes to the algorithm.
pub trait OuterEntry {
    fn default_permission(&self) -> Permission;
    fn default_required_trust_level(&self) -> TrustLevel;
    fn possible_permissions(&self) -> &std::collections::HashSet<Permission>;
    fn possible_required_trust_levels(&self) -> &std::collections::HashSet<TrustLevel>;
}

impl OuterEntry for MasterControlEntry {
    fn default_permission(&self) -> Permission {
        self.default_permission
    }
    fn default_required_trust_level(&self) -> TrustLevel {
        self.default_required_trust_level
    }
    fn possible_permissions(&self) -> &std::collections::HashSet<Permission> {
        &self.possible_permissions
    }
    fn possible_required_trust_levels(&self) -> &std::collections::HashSet<TrustLevel> {
        &self.possible_required_trust_levels
    }
}

/// Common shape the concrete (owner) entry exposes to the algorithm.
pub trait InnerEntry {
    fn permission(&self) -> Permission;
    fn required_trust_level(&self) -> TrustLevel;
}

impl InnerEntry for OwnerControlEntry {
    fn permission(&self) -> Permission {
        self.permission
    }
    fn required_trust_level(&self) -> TrustLevel {
        self.required_trust_level
    }
}

/// Validates a master/mediator/owner triple and, once valid, decides the
/// permission for a given trust level.
pub struct Validator<'a, M: OuterEntry, O: InnerEntry> {
    master: Option<&'a M>,
    mediator: Option<&'a M>,
    owner: Option<&'a O>,
}

impl<'a, M: OuterEntry, O: InnerEntry> Validator<'a, M, O> {
    pub fn new(master: Option<&'a M>, mediator: Option<&'a M>, owner: Option<&'a O>) -> Self {
        Self { master, mediator, owner }
    }

    pub fn is_valid(&self) -> bool {
        self.is_owner_valid()
    }

    pub fn is_mediator_valid(&self) -> bool {
        let (mediator, master) = match (self.mediator, self.master) {
            (Some(mediator), Some(master)) => (mediator, master),
            _ => return true,
        };

        let permission_ok = master.possible_permissions().contains(&mediator.default_permission())
            && mediator
                .possible_permissions()
                .is_subset(master.possible_permissions());

        let trust_ok = master
            .possible_required_trust_levels()
            .contains(&mediator.default_required_trust_level())
            && mediator
                .possible_required_trust_levels()
                .is_subset(master.possible_required_trust_levels());

        permission_ok && trust_ok
    }

    pub fn is_owner_valid(&self) -> bool {
        if let Some(mediator) = self.mediator {
            self.is_mediator_valid() && self.validate_owner(mediator)
        } else if let Some(master) = self.master {
            self.validate_owner(master)
        } else {
            true
        }
    }

    fn validate_owner(&self, target: &M) -> bool {
        let owner = match self.owner {
            Some(owner) => owner,
            None => return true,
        };
        target.possible_permissions().contains(&owner.permission())
            && target
                .possible_required_trust_levels()
                .contains(&owner.required_trust_level())
    }

    /// `innermost present entry`: owner, else mediator, else master. Returns
    /// `(requiredTrustLevel, permission)`.
    fn innermost(&self) -> Option<(TrustLevel, Permission)> {
        if let Some(owner) = self.owner {
            Some((owner.required_trust_level(), owner.permission()))
        } else if let Some(mediator) = self.mediator {
            Some((mediator.default_required_trust_level(), mediator.default_permission()))
        } else {
            self.master
                .map(|master| (master.default_required_trust_level(), master.default_permission()))
        }
    }

    /// `getConsumerPermission`/`getProviderPermission`: invalid triple or no
    /// entries at all yields `NO`; otherwise the innermost entry's
    /// permission is granted only if `trust_level >= required`.
    pub fn decide(&self, trust_level: TrustLevel) -> Permission {
        if !self.is_valid() {
            return Permission::No;
        }
        match self.innermost() {
            Some((required, permission)) if trust_level >= required => permission.normalize(),
            Some(_) => Permission::No,
            None => Permission::No,
        }
    }
}

/// Convenience entry point matching
/// `getConsumerPermission(masterOpt, mediatorOpt, ownerOpt, trustLevel)`.
pub fn get_consumer_permission(
    master: Option<&MasterControlEntry>,
    mediator: Option<&MasterControlEntry>,
    owner: Option<&OwnerControlEntry>,
    trust_level: TrustLevel,
) -> Permission {
    Validator::new(master, mediator, owner).decide(trust_level)
}

/// Symmetric provider-side entry point; registration control entries share
/// the same struct shapes (`operation` pinned to `"*"`), so this is the same
/// function under a name matching the provider-side variant.
pub fn get_provider_permission(
    master: Option<&MasterControlEntry>,
    mediator: Option<&MasterControlEntry>,
    owner: Option<&OwnerControlEntry>,
    trust_level: TrustLevel,
) -> Permission {
    get_consumer_permission(master, mediator, owner, trust_level)
}
