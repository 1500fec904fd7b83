/// Effective scope resolution
///
/// Precedence, strictly in order:
///
/// 1. Superuser → `ALL`, nothing else is consulted.
/// 2. Inactive user → `NONE`.
/// 3. Most permissive scope among the user's active roles.
/// 4. No mapping at all → `OWN` (logged as a configuration gap).
/// 5. Holding an active finance role caps the result at `FINANCE_ONLY`.
///    A role-derived `ALL` is capped only when `finance_caps_all` is set.

use tracing::debug;

use super::store::ScopeRuleStore;
use super::types::{ScopeDecision, ScopeSource, ScopeType};
use crate::error::AccessWarning;
use crate::types::User;

/// Resolves a single effective scope per (user, resource type)
///
/// Stateless over a borrowed [`ScopeRuleStore`]; construct one per call or
/// keep it alongside the store.
#[derive(Debug, Clone, Copy)]
pub struct ScopeResolver<'a> {
    store: &'a ScopeRuleStore,
    finance_caps_all: bool,
}

impl<'a> ScopeResolver<'a> {
    /// Resolver with finance capping of role-derived `ALL` enabled
    pub fn new(store: &'a ScopeRuleStore) -> Self {
        Self {
            store,
            finance_caps_all: true,
        }
    }

    pub fn with_finance_caps_all(mut self, caps_all: bool) -> Self {
        self.finance_caps_all = caps_all;
        self
    }

    pub fn store(&self) -> &'a ScopeRuleStore {
        self.store
    }

    /// Resolve the effective scope of `user` on `resource_type`
    pub fn resolve(&self, user: &User, resource_type: &str) -> ScopeDecision {
        if user.superuser {
            return ScopeDecision::new(user.id, resource_type, ScopeType::All, ScopeSource::Superuser);
        }

        if !user.active {
            debug!(user_id = user.id, "inactive user resolves to NONE");
            return ScopeDecision::new(user.id, resource_type, ScopeType::None, ScopeSource::InactiveUser);
        }

        let active_roles = self.active_roles(user);

        let mut best: Option<(ScopeType, ScopeSource, &str)> = None;
        for &code in &active_roles {
            let candidate = match self.store.lookup_assigned(code, resource_type) {
                Some(scope) => Some((scope, ScopeSource::RoleMapping)),
                None => self
                    .store
                    .role(code)
                    .and_then(|r| r.default_scope)
                    .map(|scope| (scope, ScopeSource::RoleDefault)),
            };

            if let Some((scope, source)) = candidate {
                // ties keep the earlier role
                if best.map_or(true, |(current, _, _)| scope > current) {
                    best = Some((scope, source, code));
                }
            }
        }

        let mut decision = match best {
            Some((scope, source, code)) => {
                ScopeDecision::new(user.id, resource_type, scope, source).with_role(code)
            }
            None => {
                AccessWarning::ConfigurationGap {
                    resource_type: resource_type.to_string(),
                    roles: active_roles.iter().map(|r| r.to_string()).collect(),
                }
                .log();
                ScopeDecision::new(user.id, resource_type, ScopeType::Own, ScopeSource::Fallback)
            }
        };

        if let Some(finance_role) = active_roles.iter().find(|c| self.store.is_finance_role(c)) {
            let capped = decision.scope_type != ScopeType::All || self.finance_caps_all;
            if capped && decision.scope_type != ScopeType::FinanceOnly {
                debug!(
                    user_id = user.id,
                    resource_type,
                    nominal = %decision.scope_type,
                    role = %finance_role,
                    "finance role caps scope"
                );
                decision = ScopeDecision::new(
                    user.id,
                    resource_type,
                    ScopeType::FinanceOnly,
                    ScopeSource::FinanceOverride,
                )
                .with_role(*finance_role);
            }
        }

        debug!(
            user_id = user.id,
            resource_type,
            scope = %decision.scope_type,
            source = ?decision.source,
            "scope resolved"
        );

        decision
    }

    /// Role codes held by the user that exist and are active, in user order
    pub fn active_roles<'u>(&self, user: &'u User) -> Vec<&'u str> {
        user.roles
            .iter()
            .map(String::as_str)
            .filter(|code| match self.store.role(code) {
                Some(role) if role.active => true,
                Some(_) => {
                    debug!(user_id = user.id, role = %code, "skipping inactive role");
                    false
                }
                None => {
                    debug!(user_id = user.id, role = %code, "skipping unknown role");
                    false
                }
            })
            .collect()
    }

    /// Whether the user holds an active role with exactly this code
    pub fn holds_active_role(&self, user: &User, code: &str) -> bool {
        user.has_role(code) && self.store.is_active_role(code)
    }
}
