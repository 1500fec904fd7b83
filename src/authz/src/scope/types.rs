/// Scope type definitions
///
/// Provides the closed set of scope types with their permissiveness order,
/// scope rules and the per-call decision value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::types::{ResourceType, RoleId, UserId};

/// Errors that can occur when parsing scope types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Empty scope string provided
    EmptyScope,
    /// Not one of the known scope types
    UnknownScope(String),
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyScope => write!(f, "Scope cannot be empty"),
            Self::UnknownScope(s) => write!(f, "Unknown scope type: {}", s),
        }
    }
}

impl std::error::Error for ScopeError {}

/// Data visibility granted to a user for a resource type
///
/// Ordering follows permissiveness: `All` is the greatest, `None` the
/// least, so `max()` over a set of scopes picks the most permissive one.
///
/// ```
/// use orgscope_authz::scope::ScopeType;
///
/// assert!(ScopeType::Department > ScopeType::Own);
/// assert_eq!(
///     [ScopeType::Own, ScopeType::Team, ScopeType::FinanceOnly].into_iter().max(),
///     Some(ScopeType::Team)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeType {
    All,
    BusinessUnit,
    Department,
    Team,
    Project,
    Own,
    FinanceOnly,
    None,
}

impl ScopeType {
    /// Every scope type, most permissive first
    pub const ORDERED: [ScopeType; 8] = [
        ScopeType::All,
        ScopeType::BusinessUnit,
        ScopeType::Department,
        ScopeType::Team,
        ScopeType::Project,
        ScopeType::Own,
        ScopeType::FinanceOnly,
        ScopeType::None,
    ];

    /// Rank in the permissiveness order, higher is broader
    pub fn permissiveness(self) -> u8 {
        match self {
            Self::All => 7,
            Self::BusinessUnit => 6,
            Self::Department => 5,
            Self::Team => 4,
            Self::Project => 3,
            Self::Own => 2,
            Self::FinanceOnly => 1,
            Self::None => 0,
        }
    }

    /// Scopes that filter by org subtree
    pub fn is_org_based(self) -> bool {
        matches!(self, Self::BusinessUnit | Self::Department)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::BusinessUnit => "BUSINESS_UNIT",
            Self::Department => "DEPARTMENT",
            Self::Team => "TEAM",
            Self::Project => "PROJECT",
            Self::Own => "OWN",
            Self::FinanceOnly => "FINANCE_ONLY",
            Self::None => "NONE",
        }
    }
}

impl PartialOrd for ScopeType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScopeType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.permissiveness().cmp(&other.permissiveness())
    }
}

impl FromStr for ScopeType {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ScopeError::EmptyScope);
        }

        Self::ORDERED
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ScopeError::UnknownScope(trimmed.to_string()))
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope granted for one resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeRule {
    pub resource_type: ResourceType,
    pub scope_type: ScopeType,

    /// Opaque settings for custom scopes, carried but not interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_config: Option<serde_json::Value>,
}

/// Binds a scope rule to a role; unique per (role, resource type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleScopeAssignment {
    pub role_id: RoleId,

    #[serde(flatten)]
    pub rule: ScopeRule,
}

impl RoleScopeAssignment {
    pub fn new(role_id: RoleId, resource_type: impl Into<String>, scope_type: ScopeType) -> Self {
        Self {
            role_id,
            rule: ScopeRule {
                resource_type: resource_type.into(),
                scope_type,
                custom_config: None,
            },
        }
    }
}

/// Why a decision came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeSource {
    /// Superuser override
    Superuser,
    /// Inactive account
    InactiveUser,
    /// Per-resource role assignment
    RoleMapping,
    /// Role's legacy default scope
    RoleDefault,
    /// No role mapped the resource type
    Fallback,
    /// Capped by a finance role
    FinanceOverride,
}

/// Effective scope for one (user, resource type) call. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDecision {
    pub user_id: UserId,
    pub resource_type: ResourceType,
    pub scope_type: ScopeType,
    pub source: ScopeSource,

    /// Role that produced the decision, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ScopeDecision {
    pub fn new(
        user_id: UserId,
        resource_type: impl Into<String>,
        scope_type: ScopeType,
        source: ScopeSource,
    ) -> Self {
        Self {
            user_id,
            resource_type: resource_type.into(),
            scope_type,
            source,
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}
