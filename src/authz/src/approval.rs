//! Approval gating
//!
//! Decides whether a user may act as approver on one approval step.
//! Role-pinned steps only check role membership; all other steps require
//! org authority that grows with the approval level.

use tracing::debug;

use crate::scope::{ScopeResolver, ScopeType};
use crate::types::User;

/// Approval checks layered on top of scope resolution
#[derive(Debug, Clone, Copy)]
pub struct ApprovalGate<'a> {
    resolver: ScopeResolver<'a>,
}

impl<'a> ApprovalGate<'a> {
    pub fn new(resolver: ScopeResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Whether `user` may approve a step of `level` on `resource_type`
    ///
    /// Level 0 is treated as level 1. A blank `required_role` counts as none.
    pub fn can_approve(
        &self,
        user: &User,
        level: u32,
        required_role: Option<&str>,
        resource_type: &str,
    ) -> bool {
        if user.superuser {
            return true;
        }

        if !user.active {
            debug!(user_id = user.id, "inactive user cannot approve");
            return false;
        }

        if let Some(role) = required_role.map(str::trim).filter(|r| !r.is_empty()) {
            let allowed = self.resolver.holds_active_role(user, role);
            debug!(user_id = user.id, role, allowed, "role-pinned approval");
            return allowed;
        }

        let scope = self.resolver.resolve(user, resource_type).scope_type;
        let allowed = Self::scope_permits(scope, level);
        debug!(user_id = user.id, resource_type, level, %scope, allowed, "scope-gated approval");
        allowed
    }

    /// Level 1 needs team-wide authority or broader, level 2+ needs `ALL`
    pub fn scope_permits(scope: ScopeType, level: u32) -> bool {
        if level <= 1 {
            matches!(
                scope,
                ScopeType::All | ScopeType::BusinessUnit | ScopeType::Department | ScopeType::Team
            )
        } else {
            scope == ScopeType::All
        }
    }
}
