/// Comprehensive test suite for scope module
///
/// Tests cover:
/// - Superuser and inactive-user overrides
/// - Multi-role precedence
/// - Legacy default scopes
/// - Fallback to OWN
/// - Finance capping

use super::*;
use crate::config::EngineConfig;
use crate::types::{Role, User};

fn store() -> ScopeRuleStore {
    ScopeRuleStore::build(
        vec![
            Role::new(1, "sales"),
            Role::new(2, "dept_head"),
            Role::new(3, "director"),
            Role::new(4, "finance"),
            Role::new(5, "legacy_manager").with_default_scope(ScopeType::BusinessUnit),
            Role::new(6, "suspended").deactivated(),
            Role::new(7, "auditor"),
        ],
        vec![
            RoleScopeAssignment::new(1, "contract", ScopeType::Own),
            RoleScopeAssignment::new(2, "contract", ScopeType::Department),
            RoleScopeAssignment::new(3, "contract", ScopeType::All),
            RoleScopeAssignment::new(3, "invoice", ScopeType::All),
            RoleScopeAssignment::new(4, "contract", ScopeType::Department),
            RoleScopeAssignment::new(5, "contract", ScopeType::Team),
            RoleScopeAssignment::new(6, "contract", ScopeType::All),
            RoleScopeAssignment::new(7, "contract", ScopeType::None),
        ],
        &EngineConfig::default(),
    )
}

fn resolve(user: &User, resource_type: &str) -> ScopeDecision {
    let store = store();
    ScopeResolver::new(&store).resolve(user, resource_type)
}

// ============================================================================
// Override Tests
// ============================================================================

#[test]
fn test_superuser_always_all() {
    let user = User::new(1).superuser().with_role("sales").with_role("finance");
    for resource_type in ["contract", "invoice", "never-configured"] {
        let decision = resolve(&user, resource_type);
        assert_eq!(decision.scope_type, ScopeType::All);
        assert_eq!(decision.source, ScopeSource::Superuser);
    }
}

#[test]
fn test_inactive_superuser_still_all() {
    let user = User::new(1).superuser().deactivated();
    assert_eq!(resolve(&user, "contract").scope_type, ScopeType::All);
}

#[test]
fn test_inactive_user_resolves_none() {
    let user = User::new(2).with_role("director").deactivated();
    let decision = resolve(&user, "contract");
    assert_eq!(decision.scope_type, ScopeType::None);
    assert_eq!(decision.source, ScopeSource::InactiveUser);
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
fn test_most_permissive_wins() {
    let user = User::new(3).with_role("sales").with_role("dept_head");
    let decision = resolve(&user, "contract");
    assert_eq!(decision.scope_type, ScopeType::Department);
    assert_eq!(decision.source, ScopeSource::RoleMapping);
    assert_eq!(decision.role.as_deref(), Some("dept_head"));
}

#[test]
fn test_precedence_independent_of_role_order() {
    let a = User::new(3).with_role("sales").with_role("dept_head");
    let b = User::new(3).with_role("dept_head").with_role("sales");
    assert_eq!(resolve(&a, "contract").scope_type, resolve(&b, "contract").scope_type);
}

#[test]
fn test_none_mapping_loses_to_any_other() {
    let user = User::new(4).with_role("auditor").with_role("sales");
    assert_eq!(resolve(&user, "contract").scope_type, ScopeType::Own);

    let only_auditor = User::new(4).with_role("auditor");
    assert_eq!(resolve(&only_auditor, "contract").scope_type, ScopeType::None);
}

#[test]
fn test_inactive_role_ignored() {
    let user = User::new(5).with_role("suspended").with_role("sales");
    assert_eq!(resolve(&user, "contract").scope_type, ScopeType::Own);
}

#[test]
fn test_unknown_role_ignored() {
    let user = User::new(5).with_role("ghost").with_role("dept_head");
    assert_eq!(resolve(&user, "contract").scope_type, ScopeType::Department);
}

#[test]
fn test_legacy_default_scope() {
    let user = User::new(6).with_role("legacy_manager");

    let mapped = resolve(&user, "contract");
    assert_eq!(mapped.scope_type, ScopeType::Team);
    assert_eq!(mapped.source, ScopeSource::RoleMapping);

    let defaulted = resolve(&user, "lead");
    assert_eq!(defaulted.scope_type, ScopeType::BusinessUnit);
    assert_eq!(defaulted.source, ScopeSource::RoleDefault);
}

// ============================================================================
// Fallback Tests
// ============================================================================

#[test]
fn test_fallback_to_own() {
    let user = User::new(7).with_role("sales");
    let decision = resolve(&user, "invoice");
    assert_eq!(decision.scope_type, ScopeType::Own);
    assert_eq!(decision.source, ScopeSource::Fallback);
    assert!(decision.role.is_none());
}

#[test]
fn test_no_roles_falls_back_to_own() {
    assert_eq!(resolve(&User::new(8), "contract").scope_type, ScopeType::Own);
}

// ============================================================================
// Finance Tests
// ============================================================================

#[test]
fn test_finance_role_caps_org_scope() {
    let user = User::new(9).with_role("finance");
    let decision = resolve(&user, "contract");
    assert_eq!(decision.scope_type, ScopeType::FinanceOnly);
    assert_eq!(decision.source, ScopeSource::FinanceOverride);
    assert_eq!(decision.role.as_deref(), Some("finance"));
}

#[test]
fn test_finance_role_caps_fallback() {
    let user = User::new(9).with_role("finance");
    assert_eq!(resolve(&user, "lead").scope_type, ScopeType::FinanceOnly);
}

#[test]
fn test_finance_role_caps_role_derived_all_by_default() {
    let user = User::new(10).with_role("director").with_role("finance");
    assert_eq!(resolve(&user, "contract").scope_type, ScopeType::FinanceOnly);
}

#[test]
fn test_finance_cap_exempts_all_when_disabled() {
    let store = store();
    let resolver = ScopeResolver::new(&store).with_finance_caps_all(false);

    let user = User::new(10).with_role("director").with_role("finance");
    assert_eq!(resolver.resolve(&user, "contract").scope_type, ScopeType::All);

    let plain = User::new(11).with_role("finance");
    assert_eq!(resolver.resolve(&plain, "contract").scope_type, ScopeType::FinanceOnly);
}

#[test]
fn test_finance_match_is_exact() {
    let store = ScopeRuleStore::build(
        vec![Role::new(1, "finance_intern")],
        vec![RoleScopeAssignment::new(1, "contract", ScopeType::Team)],
        &EngineConfig::default(),
    );
    let user = User::new(12).with_role("finance_intern");
    assert_eq!(ScopeResolver::new(&store).resolve(&user, "contract").scope_type, ScopeType::Team);
}

#[test]
fn test_inactive_finance_role_does_not_cap() {
    let store = ScopeRuleStore::build(
        vec![Role::new(1, "sales"), Role::new(2, "finance").deactivated()],
        vec![RoleScopeAssignment::new(1, "contract", ScopeType::Team)],
        &EngineConfig::default(),
    );
    let user = User::new(13).with_role("sales").with_role("finance");
    assert_eq!(ScopeResolver::new(&store).resolve(&user, "contract").scope_type, ScopeType::Team);
}

// ============================================================================
// Helper Tests
// ============================================================================

#[test]
fn test_holds_active_role() {
    let store = store();
    let resolver = ScopeResolver::new(&store);
    let user = User::new(14).with_role("sales").with_role("suspended");

    assert!(resolver.holds_active_role(&user, "sales"));
    assert!(!resolver.holds_active_role(&user, "suspended"));
    assert!(!resolver.holds_active_role(&user, "director"));
    assert_eq!(resolver.active_roles(&user), vec!["sales"]);
}
