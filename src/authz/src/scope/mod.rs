/// Scope resolution module
///
/// Maps a user's roles to a single effective [`ScopeType`] per resource
/// type, using a read-only [`ScopeRuleStore`] built from the role and
/// assignment configuration.
///
/// # Examples
///
/// ```
/// use orgscope_authz::config::EngineConfig;
/// use orgscope_authz::scope::{RoleScopeAssignment, ScopeResolver, ScopeRuleStore, ScopeType};
/// use orgscope_authz::types::{Role, User};
///
/// let store = ScopeRuleStore::build(
///     vec![Role::new(1, "sales"), Role::new(2, "dept_head")],
///     vec![
///         RoleScopeAssignment::new(1, "contract", ScopeType::Own),
///         RoleScopeAssignment::new(2, "contract", ScopeType::Department),
///     ],
///     &EngineConfig::default(),
/// );
///
/// let user = User::new(10).with_role("sales").with_role("dept_head");
/// let decision = ScopeResolver::new(&store).resolve(&user, "contract");
/// assert_eq!(decision.scope_type, ScopeType::Department);
/// ```

mod types;
mod store;
mod resolver;

#[cfg(test)]
mod tests;

pub use types::{RoleScopeAssignment, ScopeDecision, ScopeError, ScopeRule, ScopeSource, ScopeType};
pub use store::ScopeRuleStore;
pub use resolver::ScopeResolver;
