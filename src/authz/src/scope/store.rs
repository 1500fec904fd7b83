/// Read-only scope rule lookup
///
/// Built from one snapshot of roles and assignments. Finance markers come
/// from [`EngineConfig`] and are matched exactly, never by substring.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::types::{RoleScopeAssignment, ScopeRule, ScopeType};
use crate::config::EngineConfig;
use crate::error::AccessWarning;
use crate::types::{Role, RoleId};

/// (role, resource type) -> scope lookup
#[derive(Debug, Clone, Default)]
pub struct ScopeRuleStore {
    /// Roles by code
    roles: HashMap<String, Role>,
    /// role code -> resource type -> rule
    assignments: HashMap<String, HashMap<String, ScopeRule>>,
    /// Resource types with at least one assignment
    resource_types: HashSet<String>,
    finance_roles: HashSet<String>,
    finance_resource_types: HashSet<String>,
    issues: Vec<AccessWarning>,
}

impl ScopeRuleStore {
    /// Build the store from role and assignment configuration
    pub fn build(
        roles: impl IntoIterator<Item = Role>,
        assignments: impl IntoIterator<Item = RoleScopeAssignment>,
        config: &EngineConfig,
    ) -> Self {
        let mut store = Self {
            finance_roles: config.finance_roles.iter().cloned().collect(),
            finance_resource_types: config.finance_resource_types.iter().cloned().collect(),
            ..Self::default()
        };

        let mut codes_by_id: HashMap<RoleId, String> = HashMap::new();
        for role in roles {
            if store.roles.contains_key(&role.code) {
                debug!(role = %role.code, "duplicate role code ignored");
                continue;
            }
            codes_by_id.insert(role.id, role.code.clone());
            store.roles.insert(role.code.clone(), role);
        }

        for assignment in assignments {
            let Some(code) = codes_by_id.get(&assignment.role_id) else {
                store.record(AccessWarning::UnknownRole(assignment.role_id));
                continue;
            };

            let per_role = store.assignments.entry(code.clone()).or_default();
            if per_role.contains_key(&assignment.rule.resource_type) {
                let warning = AccessWarning::DuplicateAssignment {
                    role: code.clone(),
                    resource_type: assignment.rule.resource_type.clone(),
                };
                store.record(warning);
                continue;
            }

            store.resource_types.insert(assignment.rule.resource_type.clone());
            per_role.insert(assignment.rule.resource_type.clone(), assignment.rule);
        }

        debug!(
            roles = store.roles.len(),
            resource_types = store.resource_types.len(),
            "scope rule store built"
        );

        store
    }

    /// Scope a role grants on a resource type
    ///
    /// A per-resource assignment wins over the role's legacy default.
    /// Role activity is not considered here.
    pub fn lookup_scope(&self, role_code: &str, resource_type: &str) -> Option<ScopeType> {
        self.lookup_assigned(role_code, resource_type)
            .or_else(|| self.roles.get(role_code).and_then(|r| r.default_scope))
    }

    /// Scope from a per-resource assignment only
    pub fn lookup_assigned(&self, role_code: &str, resource_type: &str) -> Option<ScopeType> {
        self.lookup_rule(role_code, resource_type).map(|r| r.scope_type)
    }

    pub fn lookup_rule(&self, role_code: &str, resource_type: &str) -> Option<&ScopeRule> {
        self.assignments
            .get(role_code)
            .and_then(|per_role| per_role.get(resource_type))
    }

    pub fn role(&self, code: &str) -> Option<&Role> {
        self.roles.get(code)
    }

    /// Known and active
    pub fn is_active_role(&self, code: &str) -> bool {
        self.roles.get(code).map(|r| r.active).unwrap_or(false)
    }

    /// Exact match against the configured finance role codes
    pub fn is_finance_role(&self, code: &str) -> bool {
        self.finance_roles.contains(code)
    }

    /// Whether the resource type is finance-tagged by configuration
    pub fn is_finance_resource(&self, resource_type: &str) -> bool {
        self.finance_resource_types.contains(resource_type)
    }

    /// Whether any assignment targets the resource type
    pub fn has_rules_for(&self, resource_type: &str) -> bool {
        self.resource_types.contains(resource_type)
    }

    /// Known to the engine through assignments or finance configuration
    pub fn is_registered(&self, resource_type: &str) -> bool {
        self.has_rules_for(resource_type) || self.is_finance_resource(resource_type)
    }

    /// Integrity problems found while building
    pub fn integrity_issues(&self) -> &[AccessWarning] {
        &self.issues
    }

    fn record(&mut self, warning: AccessWarning) {
        warning.log();
        self.issues.push(warning);
    }
}
