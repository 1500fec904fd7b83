//! Core identity types

use serde::{Deserialize, Serialize};

use crate::scope::ScopeType;

/// User identifier
pub type UserId = i64;

/// Organizational unit identifier
pub type OrgUnitId = i64;

/// Role identifier
pub type RoleId = i64;

/// Resource type name (e.g., "contract", "invoice")
pub type ResourceType = String;

/// Link between a user and an org unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
    /// Org unit the user belongs to
    pub unit_id: OrgUnitId,

    /// Whether this is the user's primary unit
    #[serde(default)]
    pub primary: bool,
}

/// Authenticated user as supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,

    /// Whether the account is active
    #[serde(default = "default_true")]
    pub active: bool,

    /// Superusers see everything
    #[serde(default)]
    pub superuser: bool,

    /// Org units the user belongs to
    #[serde(default)]
    pub memberships: Vec<OrgMembership>,

    /// Assigned role codes
    #[serde(default)]
    pub roles: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Create an active, non-superuser user with no roles or memberships
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            active: true,
            superuser: false,
            memberships: Vec::new(),
            roles: Vec::new(),
        }
    }

    /// Add a role code
    pub fn with_role(mut self, code: impl Into<String>) -> Self {
        self.roles.push(code.into());
        self
    }

    /// Add a non-primary membership
    pub fn member_of(mut self, unit_id: OrgUnitId) -> Self {
        self.memberships.push(OrgMembership { unit_id, primary: false });
        self
    }

    /// Add a primary membership, demoting any previous primary
    pub fn primary_member_of(mut self, unit_id: OrgUnitId) -> Self {
        for m in &mut self.memberships {
            m.primary = false;
        }
        self.memberships.push(OrgMembership { unit_id, primary: true });
        self
    }

    /// Mark as superuser
    pub fn superuser(mut self) -> Self {
        self.superuser = true;
        self
    }

    /// Mark as inactive
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// The unit used for org-based scopes: primary membership, else the first
    pub fn primary_unit(&self) -> Option<OrgUnitId> {
        self.memberships
            .iter()
            .find(|m| m.primary)
            .or_else(|| self.memberships.first())
            .map(|m| m.unit_id)
    }

    /// Whether the user holds the role code (regardless of role activity)
    pub fn has_role(&self, code: &str) -> bool {
        self.roles.iter().any(|r| r == code)
    }
}

/// Role definition from the durable configuration store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier
    pub id: RoleId,

    /// Unique role code (e.g., "sales_manager")
    pub code: String,

    /// Human readable name
    pub name: String,

    /// Inactive roles grant nothing
    #[serde(default = "default_true")]
    pub active: bool,

    /// Legacy single-scope mode: applies to every resource type without
    /// a per-resource assignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scope: Option<ScopeType>,
}

impl Role {
    /// Create an active role with no default scope
    pub fn new(id: RoleId, code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            id,
            name: code.clone(),
            code,
            active: true,
            default_scope: None,
        }
    }

    /// Set the legacy default scope
    pub fn with_default_scope(mut self, scope: ScopeType) -> Self {
        self.default_scope = Some(scope);
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Mark as inactive
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}
