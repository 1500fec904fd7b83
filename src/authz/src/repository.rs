//! Collaborator interfaces and in-memory implementations
//!
//! The engine only reads from these. Administrative edits go through the
//! in-memory repository's write methods, each of which bumps the version
//! counter so cached snapshots are rebuilt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::org::OrgUnit;
use crate::scope::RoleScopeAssignment;
use crate::types::{Role, RoleId, UserId};

/// Durable configuration store (org units, roles, scope assignments)
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// All org units
    async fn org_units(&self) -> Result<Vec<OrgUnit>>;

    /// All roles
    async fn roles(&self) -> Result<Vec<Role>>;

    /// All (role, resource type) scope assignments
    async fn scope_assignments(&self) -> Result<Vec<RoleScopeAssignment>>;

    /// Monotonic counter that changes on every administrative edit
    async fn version(&self) -> Result<u64>;
}

/// Organizational-reporting service
#[async_trait]
pub trait SubordinateLookup: Send + Sync {
    /// Direct reports of `user_id`
    async fn subordinate_ids(&self, user_id: UserId) -> Result<HashSet<UserId>>;
}

/// Full configuration content, also the JSON snapshot file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default)]
    pub org_units: Vec<OrgUnit>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub scope_assignments: Vec<RoleScopeAssignment>,
}

impl ConfigData {
    /// Parse from JSON text
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[derive(Debug, Default)]
struct VersionedData {
    data: ConfigData,
    version: u64,
}

/// In-memory configuration repository
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigRepository {
    state: Arc<RwLock<VersionedData>>,
}

impl InMemoryConfigRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding `data`
    pub fn from_data(data: ConfigData) -> Self {
        Self {
            state: Arc::new(RwLock::new(VersionedData { data, version: 1 })),
        }
    }

    /// Replace everything
    pub async fn replace_all(&self, data: ConfigData) {
        let mut state = self.state.write().await;
        state.data = data;
        state.version += 1;
    }

    /// Insert or replace an org unit by id
    pub async fn upsert_unit(&self, unit: OrgUnit) {
        let mut state = self.state.write().await;
        match state.data.org_units.iter_mut().find(|u| u.id == unit.id) {
            Some(existing) => *existing = unit,
            None => state.data.org_units.push(unit),
        }
        state.version += 1;
    }

    /// Insert or replace a role by id
    pub async fn upsert_role(&self, role: Role) {
        let mut state = self.state.write().await;
        match state.data.roles.iter_mut().find(|r| r.id == role.id) {
            Some(existing) => *existing = role,
            None => state.data.roles.push(role),
        }
        state.version += 1;
    }

    /// Assign a scope, replacing any assignment for the same (role, resource type)
    pub async fn assign_scope(&self, assignment: RoleScopeAssignment) {
        let mut state = self.state.write().await;
        let existing = state.data.scope_assignments.iter_mut().find(|a| {
            a.role_id == assignment.role_id && a.rule.resource_type == assignment.rule.resource_type
        });
        match existing {
            Some(slot) => *slot = assignment,
            None => state.data.scope_assignments.push(assignment),
        }
        state.version += 1;
    }

    /// Remove the assignment for (role, resource type); returns whether one existed
    pub async fn remove_assignment(&self, role_id: RoleId, resource_type: &str) -> bool {
        let mut state = self.state.write().await;
        let before = state.data.scope_assignments.len();
        state
            .data
            .scope_assignments
            .retain(|a| !(a.role_id == role_id && a.rule.resource_type == resource_type));
        let removed = state.data.scope_assignments.len() != before;
        if removed {
            state.version += 1;
        }
        removed
    }

    /// Copy of the current content
    pub async fn data(&self) -> ConfigData {
        self.state.read().await.data.clone()
    }
}

#[async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn org_units(&self) -> Result<Vec<OrgUnit>> {
        Ok(self.state.read().await.data.org_units.clone())
    }

    async fn roles(&self) -> Result<Vec<Role>> {
        Ok(self.state.read().await.data.roles.clone())
    }

    async fn scope_assignments(&self) -> Result<Vec<RoleScopeAssignment>> {
        Ok(self.state.read().await.data.scope_assignments.clone())
    }

    async fn version(&self) -> Result<u64> {
        Ok(self.state.read().await.version)
    }
}

/// Fixed manager -> direct reports table
#[derive(Debug, Clone, Default)]
pub struct StaticSubordinates {
    reports: HashMap<UserId, HashSet<UserId>>,
}

impl StaticSubordinates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(mut self, manager: UserId, report: UserId) -> Self {
        self.reports.entry(manager).or_default().insert(report);
        self
    }
}

#[async_trait]
impl SubordinateLookup for StaticSubordinates {
    async fn subordinate_ids(&self, user_id: UserId) -> Result<HashSet<UserId>> {
        Ok(self.reports.get(&user_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::OrgUnitType;
    use crate::scope::ScopeType;

    #[tokio::test]
    async fn test_version_bumps_on_edit() {
        let repo = InMemoryConfigRepository::new();
        let v0 = repo.version().await.unwrap();

        repo.upsert_unit(OrgUnit::new(1, "acme", OrgUnitType::Company)).await;
        let v1 = repo.version().await.unwrap();
        assert!(v1 > v0);

        repo.upsert_role(Role::new(1, "sales")).await;
        repo.assign_scope(RoleScopeAssignment::new(1, "contract", ScopeType::Own)).await;
        assert!(repo.version().await.unwrap() > v1);
    }

    #[tokio::test]
    async fn test_assign_scope_replaces_pair() {
        let repo = InMemoryConfigRepository::new();
        repo.assign_scope(RoleScopeAssignment::new(1, "contract", ScopeType::Own)).await;
        repo.assign_scope(RoleScopeAssignment::new(1, "contract", ScopeType::Team)).await;
        repo.assign_scope(RoleScopeAssignment::new(1, "lead", ScopeType::Own)).await;

        let assignments = repo.scope_assignments().await.unwrap();
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].rule.scope_type, ScopeType::Team);
    }

    #[tokio::test]
    async fn test_remove_assignment() {
        let repo = InMemoryConfigRepository::new();
        repo.assign_scope(RoleScopeAssignment::new(1, "contract", ScopeType::Own)).await;
        let version = repo.version().await.unwrap();

        assert!(!repo.remove_assignment(1, "lead").await);
        assert_eq!(repo.version().await.unwrap(), version);

        assert!(repo.remove_assignment(1, "contract").await);
        assert!(repo.scope_assignments().await.unwrap().is_empty());
        assert!(repo.version().await.unwrap() > version);
    }

    #[tokio::test]
    async fn test_upsert_unit_replaces_by_id() {
        let repo = InMemoryConfigRepository::new();
        repo.upsert_unit(OrgUnit::new(1, "acme", OrgUnitType::Company)).await;
        repo.upsert_unit(OrgUnit::new(1, "acme", OrgUnitType::Company).with_name("Acme Inc")).await;

        let units = repo.org_units().await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "Acme Inc");
    }

    #[tokio::test]
    async fn test_static_subordinates() {
        let lookup = StaticSubordinates::new().with_report(1, 2).with_report(1, 3);
        assert_eq!(lookup.subordinate_ids(1).await.unwrap(), HashSet::from([2, 3]));
        assert!(lookup.subordinate_ids(2).await.unwrap().is_empty());
    }

    #[test]
    fn test_config_data_json() {
        let data = ConfigData::from_json(
            r#"{
                "org_units": [{"id": 1, "code": "acme", "name": "Acme", "type": "COMPANY"}],
                "roles": [{"id": 1, "code": "sales", "name": "Sales", "default_scope": "OWN"}],
                "scope_assignments": [{"role_id": 1, "resource_type": "contract", "scope_type": "TEAM"}]
            }"#,
        )
        .unwrap();

        assert_eq!(data.org_units.len(), 1);
        assert_eq!(data.roles[0].default_scope, Some(ScopeType::Own));
        assert!(data.roles[0].active);
        assert_eq!(data.scope_assignments[0].rule.scope_type, ScopeType::Team);
    }
}
