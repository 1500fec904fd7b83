//! Translation of scope decisions into filter specs

use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use super::types::{FilterSpec, ResourceDescriptor};
use crate::error::AccessWarning;
use crate::org::{OrgUnitType, SubtreeIndex};
use crate::scope::{ScopeDecision, ScopeType};
use crate::types::{User, UserId};

/// Turns a [`ScopeDecision`] into a [`FilterSpec`]
///
/// Subordinates for `TEAM` scope come from an external reporting lookup;
/// the caller resolves them and passes them in.
#[derive(Debug, Clone, Copy)]
pub struct FilterTranslator<'a> {
    subtree: &'a SubtreeIndex,
}

impl<'a> FilterTranslator<'a> {
    pub fn new(subtree: &'a SubtreeIndex) -> Self {
        Self { subtree }
    }

    /// Build the filter for `decision` on a resource shaped like `descriptor`
    pub fn translate(
        &self,
        decision: &ScopeDecision,
        user: &User,
        descriptor: &ResourceDescriptor,
        subordinates: &HashSet<UserId>,
    ) -> FilterSpec {
        let spec = match decision.scope_type {
            ScopeType::All => FilterSpec::NoFilter,
            ScopeType::BusinessUnit => self.org_filter(user, descriptor, OrgUnitType::BusinessUnit),
            ScopeType::Department => self.org_filter(user, descriptor, OrgUnitType::Department),
            ScopeType::Team => {
                let mut ids: BTreeSet<UserId> = subordinates.iter().copied().collect();
                ids.insert(user.id);
                Self::owner_filter(descriptor, ids)
            }
            // no native project partition on these resources
            ScopeType::Project | ScopeType::Own => {
                Self::owner_filter(descriptor, BTreeSet::from([user.id]))
            }
            ScopeType::FinanceOnly if descriptor.is_finance_tagged(false) => FilterSpec::NoFilter,
            ScopeType::FinanceOnly | ScopeType::None => FilterSpec::DenyAll,
        };

        debug!(
            user_id = user.id,
            resource_type = %descriptor.resource_type,
            scope = %decision.scope_type,
            filter = spec.kind(),
            "filter translated"
        );

        spec
    }

    /// Subtree of the user's unit of `unit_type`, degrading toward owner ids
    fn org_filter(
        &self,
        user: &User,
        descriptor: &ResourceDescriptor,
        unit_type: OrgUnitType,
    ) -> FilterSpec {
        let Some(org_field) = descriptor.org_field.clone() else {
            AccessWarning::DescriptorMismatch {
                resource_type: descriptor.resource_type.clone(),
                missing_field: "org",
            }
            .log();
            return Self::owner_filter(descriptor, BTreeSet::from([user.id]));
        };

        let Some(home) = user.primary_unit() else {
            AccessWarning::MissingMembership(user.id).log();
            return Self::owner_filter(descriptor, BTreeSet::from([user.id]));
        };

        let anchor = match self.subtree.tree().ancestor_of_type(home, unit_type) {
            Some(unit) => unit.id,
            None => {
                debug!(
                    user_id = user.id,
                    unit = home,
                    wanted = %unit_type,
                    "no enclosing unit of requested type, using the user's own unit"
                );
                home
            }
        };

        FilterSpec::AllowedOrgIds {
            org_field,
            ids: self.subtree.descendant_ids(anchor).into_iter().collect(),
        }
    }

    fn owner_filter(descriptor: &ResourceDescriptor, ids: BTreeSet<UserId>) -> FilterSpec {
        if descriptor.owner_field.is_none() && descriptor.manager_field.is_none() {
            AccessWarning::DescriptorMismatch {
                resource_type: descriptor.resource_type.clone(),
                missing_field: "owner",
            }
            .log();
            return FilterSpec::DenyAll;
        }

        FilterSpec::AllowedOwnerIds {
            owner_field: descriptor.owner_field.clone(),
            manager_field: descriptor.manager_field.clone(),
            ids,
        }
    }
}
