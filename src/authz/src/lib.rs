//! # OrgScope Access Control
//!
//! Hierarchical data-scope access control for multi-unit organizations.
//! Given a user, their roles and org memberships, the engine decides which
//! records of a resource type the user may see and whether they may approve
//! a workflow step.
//!
//! ## Features
//!
//! - **Scope resolution**: one effective scope per (user, resource type),
//!   most permissive role wins, finance roles capped to finance resources
//! - **Query filters**: scope decisions become owner-id or org-id filters
//!   the caller applies to its own storage
//! - **Org subtree lookup** by materialized path or child-link walk
//! - **Approval gating** that scales required authority with the level
//! - **Snapshot and decision caching** invalidated by repository version
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use orgscope_authz::{AccessEngine, EngineConfig, FilterSpec, ResourceDescriptor, User};
//! use orgscope_authz::org::{OrgUnit, OrgUnitType};
//! use orgscope_authz::repository::{ConfigData, InMemoryConfigRepository, StaticSubordinates};
//! use orgscope_authz::scope::{RoleScopeAssignment, ScopeType};
//! use orgscope_authz::types::Role;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repository = InMemoryConfigRepository::from_data(ConfigData {
//!         org_units: vec![
//!             OrgUnit::new(1, "acme", OrgUnitType::Company),
//!             OrgUnit::new(2, "legal", OrgUnitType::Department).with_parent(1),
//!         ],
//!         roles: vec![Role::new(1, "counsel")],
//!         scope_assignments: vec![RoleScopeAssignment::new(1, "contract", ScopeType::Department)],
//!     });
//!
//!     let engine = AccessEngine::new(
//!         EngineConfig::default(),
//!         Arc::new(repository),
//!         Arc::new(StaticSubordinates::new()),
//!     )?;
//!
//!     let user = User::new(7).with_role("counsel").primary_member_of(2);
//!     let descriptor = ResourceDescriptor::new("contract").with_org_field("department_id");
//!
//!     let filter = engine.build_filter(&user, "contract", &descriptor).await?;
//!     assert!(matches!(filter, FilterSpec::AllowedOrgIds { .. }));
//!
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod error;
pub mod config;
pub mod org;
pub mod scope;
pub mod filter;
pub mod approval;
pub mod repository;
pub mod engine;

// Re-export commonly used types
pub use types::{OrgMembership, OrgUnitId, ResourceType, Role, RoleId, User, UserId};
pub use error::{AccessWarning, AuthzError, Result};
pub use config::EngineConfig;
pub use org::{OrgTree, OrgUnit, OrgUnitType, SubtreeIndex};
pub use scope::{ScopeDecision, ScopeResolver, ScopeRuleStore, ScopeSource, ScopeType};
pub use filter::{EntityRef, FilterSpec, FilterTranslator, ResourceDescriptor};
pub use approval::ApprovalGate;
pub use repository::{ConfigData, ConfigRepository, InMemoryConfigRepository, StaticSubordinates, SubordinateLookup};
pub use engine::{AccessEngine, MetricsCollector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
