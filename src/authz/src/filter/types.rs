//! Descriptor and filter types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{OrgUnitId, ResourceType, UserId};

/// Caller-supplied description of a resource's storage shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub resource_type: ResourceType,

    /// Field holding the owner user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_field: Option<String>,

    /// Field holding the org unit id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_field: Option<String>,

    /// Field holding the responsible manager id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_field: Option<String>,

    /// Invoices, payments and the like; `None` defers to configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finance_tagged: Option<bool>,
}

impl ResourceDescriptor {
    /// Descriptor with no fields declared
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            owner_field: None,
            org_field: None,
            manager_field: None,
            finance_tagged: None,
        }
    }

    pub fn with_owner_field(mut self, field: impl Into<String>) -> Self {
        self.owner_field = Some(field.into());
        self
    }

    pub fn with_org_field(mut self, field: impl Into<String>) -> Self {
        self.org_field = Some(field.into());
        self
    }

    pub fn with_manager_field(mut self, field: impl Into<String>) -> Self {
        self.manager_field = Some(field.into());
        self
    }

    pub fn finance_tagged(mut self, tagged: bool) -> Self {
        self.finance_tagged = Some(tagged);
        self
    }

    /// Explicit tag if stated, otherwise `default`
    pub fn is_finance_tagged(&self, default: bool) -> bool {
        self.finance_tagged.unwrap_or(default)
    }

    /// True when neither owner, org nor manager field is declared
    pub fn declares_no_fields(&self) -> bool {
        self.owner_field.is_none() && self.org_field.is_none() && self.manager_field.is_none()
    }
}

/// One concrete record to check against a [`FilterSpec`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub org_unit_id: Option<OrgUnitId>,
    #[serde(default)]
    pub manager_id: Option<UserId>,
}

impl EntityRef {
    pub fn new(owner_id: Option<UserId>, org_unit_id: Option<OrgUnitId>) -> Self {
        Self {
            owner_id,
            org_unit_id,
            manager_id: None,
        }
    }

    pub fn with_manager(mut self, manager_id: UserId) -> Self {
        self.manager_id = Some(manager_id);
        self
    }
}

/// How a caller must restrict its query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSpec {
    /// No restriction
    NoFilter,

    /// Owner (or responsible manager) must be one of `ids`
    AllowedOwnerIds {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner_field: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        manager_field: Option<String>,
        ids: BTreeSet<UserId>,
    },

    /// Org unit must be one of `ids`
    AllowedOrgIds {
        org_field: String,
        ids: BTreeSet<OrgUnitId>,
    },

    /// Nothing is visible
    DenyAll,
}

impl FilterSpec {
    /// Short label, also used as a metrics key
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoFilter => "no_filter",
            Self::AllowedOwnerIds { .. } => "allowed_owner_ids",
            Self::AllowedOrgIds { .. } => "allowed_org_ids",
            Self::DenyAll => "deny_all",
        }
    }

    pub fn is_deny_all(&self) -> bool {
        matches!(self, Self::DenyAll)
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::NoFilter)
    }

    /// Evaluate the filter against one entity
    ///
    /// Missing entity attributes never match.
    pub fn permits(&self, entity: &EntityRef) -> bool {
        match self {
            Self::NoFilter => true,
            Self::DenyAll => false,
            Self::AllowedOrgIds { ids, .. } => {
                entity.org_unit_id.map_or(false, |org| ids.contains(&org))
            }
            Self::AllowedOwnerIds {
                owner_field,
                manager_field,
                ids,
            } => {
                let owner_match = owner_field.is_some()
                    && entity.owner_id.map_or(false, |owner| ids.contains(&owner));
                let manager_match = manager_field.is_some()
                    && entity.manager_id.map_or(false, |manager| ids.contains(&manager));
                owner_match || manager_match
            }
        }
    }
}
