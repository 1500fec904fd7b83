//! Error types for the scope engine
//!
//! Two tiers live here. [`AuthzError`] is returned to callers and only covers
//! failures the engine cannot absorb. [`AccessWarning`] covers recoverable
//! data problems: they are logged and the engine keeps going with a
//! restrictive answer.

use thiserror::Error;

use crate::types::{OrgUnitId, RoleId, UserId};

/// Scope engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Resource type has no scope rules and the caller declared no fields
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Engine configuration could not be loaded
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A collaborator repository failed
    #[error("Repository error: {0}")]
    Repository(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for scope engine operations
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Recoverable problems found while resolving access.
///
/// None of these abort a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessWarning {
    /// None of the user's active roles maps the resource type
    #[error("no scope mapping for resource type '{resource_type}' (roles: {roles:?}), falling back to OWN")]
    ConfigurationGap {
        resource_type: String,
        roles: Vec<String>,
    },

    /// Org unit parent id does not resolve
    #[error("org unit {unit} references missing parent {parent}, treated as root")]
    DanglingParent { unit: OrgUnitId, parent: OrgUnitId },

    /// Org unit id listed twice
    #[error("org unit {0} is defined more than once, later definition ignored")]
    DuplicateUnit(OrgUnitId),

    /// Parent links loop back on themselves
    #[error("org tree cycle detected through units {0:?}")]
    Cycle(Vec<OrgUnitId>),

    /// Org unit id was requested but is not in the tree
    #[error("org unit {0} not found")]
    MissingUnit(OrgUnitId),

    /// Scope assignment references an unknown role
    #[error("scope assignment references unknown role id {0}")]
    UnknownRole(RoleId),

    /// Two assignments for one (role, resource type) pair
    #[error("duplicate scope assignment for role '{role}' on '{resource_type}', first one kept")]
    DuplicateAssignment { role: String, resource_type: String },

    /// Org-based scope requested for a user with no org membership
    #[error("user {0} has no org membership, org scope degraded to own records")]
    MissingMembership(UserId),

    /// Descriptor lacks the field the filter needs
    #[error("descriptor for '{resource_type}' has no {missing_field} field, filter degraded")]
    DescriptorMismatch {
        resource_type: String,
        missing_field: &'static str,
    },
}

impl AccessWarning {
    /// True for org-tree and assignment data integrity problems
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            Self::DanglingParent { .. }
                | Self::DuplicateUnit(_)
                | Self::Cycle(_)
                | Self::MissingUnit(_)
                | Self::UnknownRole(_)
                | Self::DuplicateAssignment { .. }
        )
    }

    /// Emit this warning through `tracing`
    pub(crate) fn log(&self) {
        if self.is_integrity_error() {
            tracing::warn!(kind = "integrity", "{}", self);
        } else {
            tracing::warn!(kind = "configuration", "{}", self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_classification() {
        assert!(AccessWarning::Cycle(vec![1, 2]).is_integrity_error());
        assert!(AccessWarning::DanglingParent { unit: 4, parent: 9 }.is_integrity_error());
        assert!(!AccessWarning::ConfigurationGap {
            resource_type: "invoice".to_string(),
            roles: vec![],
        }
        .is_integrity_error());
        assert!(!AccessWarning::DescriptorMismatch {
            resource_type: "contract".to_string(),
            missing_field: "org",
        }
        .is_integrity_error());
    }

    #[test]
    fn test_error_display() {
        let err = AuthzError::UnknownResourceType("widget".to_string());
        assert_eq!(err.to_string(), "Unknown resource type: widget");
    }
}
