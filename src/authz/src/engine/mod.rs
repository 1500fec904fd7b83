//! Access engine
//!
//! Composes scope resolution, filter translation and approval gating over a
//! cached snapshot of the configuration repository.

pub mod cache;
pub mod metrics;

pub use cache::{AccessSnapshot, CacheStats, DecisionCache, DecisionKey, SnapshotCache};
pub use metrics::{EngineMetrics, MetricsCollector};

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::approval::ApprovalGate;
use crate::config::EngineConfig;
use crate::error::{AuthzError, Result};
use crate::filter::{EntityRef, FilterSpec, FilterTranslator, ResourceDescriptor};
use crate::repository::{ConfigRepository, SubordinateLookup};
use crate::scope::{ScopeDecision, ScopeResolver, ScopeType};
use crate::types::{OrgUnitId, User, UserId};

/// Field names used for the implicit descriptor of [`AccessEngine::can_access_entity`]
const ENTITY_OWNER_FIELD: &str = "owner_id";
const ENTITY_ORG_FIELD: &str = "org_unit_id";

/// Main entry point for access-control questions
///
/// # Architecture
///
/// ```text
/// ConfigRepository ─→ SnapshotCache ─→ ScopeResolver ─→ FilterTranslator ─→ FilterSpec
///                          │                │  ↑
///                          │                │  └── SubordinateLookup (TEAM)
///                          ↓                ↓
///                    [DecisionCache]   ApprovalGate ─→ bool
/// ```
///
/// Every operation works on one immutable snapshot, so concurrent requests
/// never coordinate beyond the cache locks.
pub struct AccessEngine {
    config: EngineConfig,
    repository: Arc<dyn ConfigRepository>,
    subordinates: Arc<dyn SubordinateLookup>,
    snapshots: SnapshotCache,
    decisions: Option<DecisionCache>,
    metrics: Arc<MetricsCollector>,
}

impl AccessEngine {
    /// Create an engine over the given collaborators
    pub fn new(
        config: EngineConfig,
        repository: Arc<dyn ConfigRepository>,
        subordinates: Arc<dyn SubordinateLookup>,
    ) -> Result<Self> {
        config.validate()?;

        let ttl = config.cache.ttl();
        let decisions = config
            .cache
            .enabled
            .then(|| DecisionCache::new(config.cache.max_decisions, ttl));

        info!(
            cache = config.cache.enabled,
            ttl_secs = config.cache.ttl_secs,
            finance_caps_all = config.finance_caps_all,
            "AccessEngine initialized"
        );

        Ok(Self {
            snapshots: SnapshotCache::new(ttl, config.cache.enabled),
            decisions,
            metrics: Arc::new(MetricsCollector::new()),
            config,
            repository,
            subordinates,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Effective scope of `user` on `resource_type`
    pub async fn resolve_scope(&self, user: &User, resource_type: &str) -> Result<ScopeDecision> {
        let start = Instant::now();
        let result = self.resolve_inner(user, resource_type).await;
        self.finish(&result, start).await;
        result.map(|(_, decision)| decision)
    }

    /// Query filter for `user` on `resource_type`
    ///
    /// Fails with `UnknownResourceType` when nothing is configured for the
    /// type and the descriptor declares no fields. A descriptor that leaves
    /// `finance_tagged` unset inherits `finance_resource_types`.
    pub async fn build_filter(
        &self,
        user: &User,
        resource_type: &str,
        descriptor: &ResourceDescriptor,
    ) -> Result<FilterSpec> {
        let start = Instant::now();
        let result = self.filter_inner(user, resource_type, descriptor).await;
        self.finish(&result, start).await;
        result
    }

    /// Whether `user` may see one entity with the given owner and org unit
    ///
    /// The descriptor is derived from the attributes the entity carries;
    /// finance tagging is left to configuration.
    pub async fn can_access_entity(
        &self,
        user: &User,
        resource_type: &str,
        owner_id: Option<UserId>,
        org_unit_id: Option<OrgUnitId>,
    ) -> Result<bool> {
        let mut descriptor = ResourceDescriptor::new(resource_type);
        if owner_id.is_some() {
            descriptor = descriptor.with_owner_field(ENTITY_OWNER_FIELD);
        }
        if org_unit_id.is_some() {
            descriptor = descriptor.with_org_field(ENTITY_ORG_FIELD);
        }

        self.can_access(user, resource_type, &descriptor, &EntityRef::new(owner_id, org_unit_id))
            .await
    }

    /// Whether `user` may see `entity`, shaped like `descriptor`
    pub async fn can_access(
        &self,
        user: &User,
        resource_type: &str,
        descriptor: &ResourceDescriptor,
        entity: &EntityRef,
    ) -> Result<bool> {
        let spec = self.build_filter(user, resource_type, descriptor).await?;
        let allowed = spec.permits(entity);
        self.metrics.record_entity_check(allowed).await;

        debug!(user_id = user.id, resource_type, filter = spec.kind(), allowed, "entity check");
        Ok(allowed)
    }

    /// Whether `user` may approve a step of `level` on `resource_type`
    pub async fn can_approve(
        &self,
        user: &User,
        level: u32,
        required_role: Option<&str>,
        resource_type: &str,
    ) -> Result<bool> {
        Self::check_resource_type(resource_type)?;
        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.metrics.record_error().await;
                return Err(e);
            }
        };

        let gate = ApprovalGate::new(self.resolver(&snapshot));
        let granted = gate.can_approve(user, level, required_role, resource_type);
        self.metrics.record_approval(granted).await;
        Ok(granted)
    }

    /// Drop cached snapshot and decisions
    pub fn invalidate(&self) {
        self.snapshots.invalidate();
        if let Some(cache) = &self.decisions {
            cache.clear();
        }
        info!("access caches invalidated");
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.decisions.as_ref().map(DecisionCache::stats)
    }

    /// Current snapshot, rebuilt from the repository when stale
    pub async fn snapshot(&self) -> Result<Arc<AccessSnapshot>> {
        let version = self.repository.version().await?;
        if let Some(snapshot) = self.snapshots.get(version) {
            return Ok(snapshot);
        }

        let (units, roles, assignments) = tokio::try_join!(
            self.repository.org_units(),
            self.repository.roles(),
            self.repository.scope_assignments()
        )?;

        let snapshot = Arc::new(AccessSnapshot::build(version, units, roles, assignments, &self.config));
        self.snapshots.install(Arc::clone(&snapshot));
        if let Some(cache) = &self.decisions {
            cache.clear();
        }
        self.metrics.record_snapshot_reload().await;

        info!(
            version,
            units = snapshot.tree().len(),
            path_index = snapshot.subtree.uses_path_index(),
            "access snapshot loaded"
        );
        Ok(snapshot)
    }

    // Private helper methods

    fn resolver<'s>(&self, snapshot: &'s AccessSnapshot) -> ScopeResolver<'s> {
        ScopeResolver::new(&snapshot.rules).with_finance_caps_all(self.config.finance_caps_all)
    }

    fn check_resource_type(resource_type: &str) -> Result<()> {
        if resource_type.trim().is_empty() {
            return Err(AuthzError::InvalidInput("resource type must not be empty".to_string()));
        }
        Ok(())
    }

    async fn resolve_inner(
        &self,
        user: &User,
        resource_type: &str,
    ) -> Result<(Arc<AccessSnapshot>, ScopeDecision)> {
        Self::check_resource_type(resource_type)?;
        let snapshot = self.snapshot().await?;
        let decision = self.decide(&snapshot, user, resource_type).await;
        Ok((snapshot, decision))
    }

    /// Cached or freshly resolved decision against `snapshot`
    async fn decide(&self, snapshot: &AccessSnapshot, user: &User, resource_type: &str) -> ScopeDecision {
        let key = self
            .decisions
            .as_ref()
            .map(|_| DecisionKey::new(snapshot.version, user, resource_type));

        if let (Some(cache), Some(key)) = (&self.decisions, &key) {
            if let Some(decision) = cache.get(key) {
                self.metrics.record_cache_hit().await;
                self.metrics.record_resolution(decision.scope_type).await;
                return decision;
            }
            self.metrics.record_cache_miss().await;
        }

        let decision = self.resolver(snapshot).resolve(user, resource_type);

        if let (Some(cache), Some(key)) = (&self.decisions, key) {
            cache.put(key, decision.clone());
        }
        self.metrics.record_resolution(decision.scope_type).await;

        decision
    }

    async fn filter_inner(
        &self,
        user: &User,
        resource_type: &str,
        descriptor: &ResourceDescriptor,
    ) -> Result<FilterSpec> {
        if descriptor.resource_type != resource_type {
            debug!(
                resource_type,
                descriptor = %descriptor.resource_type,
                "descriptor names a different resource type"
            );
        }

        Self::check_resource_type(resource_type)?;
        let snapshot = self.snapshot().await?;

        if !snapshot.rules.is_registered(resource_type) && descriptor.declares_no_fields() {
            return Err(AuthzError::UnknownResourceType(resource_type.to_string()));
        }

        let descriptor = match descriptor.finance_tagged {
            Some(_) => Cow::Borrowed(descriptor),
            None => Cow::Owned(
                descriptor
                    .clone()
                    .finance_tagged(snapshot.rules.is_finance_resource(resource_type)),
            ),
        };

        let decision = self.decide(&snapshot, user, resource_type).await;

        let subordinates = if decision.scope_type == ScopeType::Team {
            self.subordinates_of(user.id).await
        } else {
            HashSet::new()
        };

        let spec = FilterTranslator::new(&snapshot.subtree).translate(&decision, user, &descriptor, &subordinates);
        self.metrics.record_filter(&spec).await;
        Ok(spec)
    }

    /// Direct reports, or none when the reporting service fails
    async fn subordinates_of(&self, user_id: UserId) -> HashSet<UserId> {
        match self.subordinates.subordinate_ids(user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(user_id, error = %e, "subordinate lookup failed, TEAM scope limited to self");
                HashSet::new()
            }
        }
    }

    async fn finish<T>(&self, result: &Result<T>, start: Instant) {
        if result.is_err() {
            self.metrics.record_error().await;
        }
        self.metrics.record_latency(start.elapsed()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::{OrgUnit, OrgUnitType};
    use crate::repository::{ConfigData, InMemoryConfigRepository, StaticSubordinates};
    use crate::scope::{RoleScopeAssignment, ScopeSource};
    use crate::types::Role;
    use async_trait::async_trait;

    fn data() -> ConfigData {
        ConfigData {
            org_units: vec![
                OrgUnit::new(1, "acme", OrgUnitType::Company),
                OrgUnit::new(2, "sales", OrgUnitType::BusinessUnit).with_parent(1),
            ],
            roles: vec![Role::new(1, "sales"), Role::new(2, "lead")],
            scope_assignments: vec![
                RoleScopeAssignment::new(1, "contract", ScopeType::Own),
                RoleScopeAssignment::new(2, "contract", ScopeType::Team),
            ],
        }
    }

    fn engine_with(repo: InMemoryConfigRepository) -> AccessEngine {
        AccessEngine::new(
            EngineConfig::default(),
            Arc::new(repo),
            Arc::new(StaticSubordinates::new().with_report(5, 6)),
        )
        .unwrap()
    }

    struct FailingSubordinates;

    #[async_trait]
    impl SubordinateLookup for FailingSubordinates {
        async fn subordinate_ids(&self, _user_id: UserId) -> Result<HashSet<UserId>> {
            Err(AuthzError::Repository("reporting service down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_engine_creation() {
        let engine = engine_with(InMemoryConfigRepository::from_data(data()));
        assert!(engine.cache_stats().is_some());
        assert!(engine.config().finance_caps_all);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.cache.max_decisions = 0;

        let result = AccessEngine::new(
            config,
            Arc::new(InMemoryConfigRepository::new()),
            Arc::new(StaticSubordinates::new()),
        );
        assert!(matches!(result, Err(AuthzError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_empty_resource_type_rejected() {
        let engine = engine_with(InMemoryConfigRepository::from_data(data()));
        let user = User::new(1).with_role("sales");

        assert!(matches!(engine.resolve_scope(&user, " ").await, Err(AuthzError::InvalidInput(_))));
        assert!(matches!(engine.can_approve(&user, 1, None, "").await, Err(AuthzError::InvalidInput(_))));
        assert_eq!(engine.metrics().get_metrics().await.error_count, 1);
    }

    #[tokio::test]
    async fn test_decision_cache_hit() {
        let engine = engine_with(InMemoryConfigRepository::from_data(data()));
        let user = User::new(1).with_role("sales");

        engine.resolve_scope(&user, "contract").await.unwrap();
        engine.resolve_scope(&user, "contract").await.unwrap();

        let stats = engine.cache_stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_team_scope_uses_subordinates() {
        let engine = engine_with(InMemoryConfigRepository::from_data(data()));
        let lead = User::new(5).with_role("lead");
        let descriptor = ResourceDescriptor::new("contract").with_owner_field("owner_id");

        let spec = engine.build_filter(&lead, "contract", &descriptor).await.unwrap();
        match spec {
            FilterSpec::AllowedOwnerIds { ids, .. } => assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![5, 6]),
            other => panic!("expected owner filter, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subordinate_failure_degrades_to_self() {
        let engine = AccessEngine::new(
            EngineConfig::default(),
            Arc::new(InMemoryConfigRepository::from_data(data())),
            Arc::new(FailingSubordinates),
        )
        .unwrap();
        let lead = User::new(5).with_role("lead");
        let descriptor = ResourceDescriptor::new("contract").with_owner_field("owner_id");

        let spec = engine.build_filter(&lead, "contract", &descriptor).await.unwrap();
        assert!(spec.permits(&EntityRef::new(Some(5), None)));
        assert!(!spec.permits(&EntityRef::new(Some(6), None)));
    }

    #[tokio::test]
    async fn test_snapshot_reload_on_version_change() {
        let repo = InMemoryConfigRepository::from_data(data());
        let engine = engine_with(repo.clone());
        let user = User::new(1).with_role("sales");

        let before = engine.resolve_scope(&user, "contract").await.unwrap();
        assert_eq!(before.scope_type, ScopeType::Own);

        repo.assign_scope(RoleScopeAssignment::new(1, "contract", ScopeType::All)).await;

        let after = engine.resolve_scope(&user, "contract").await.unwrap();
        assert_eq!(after.scope_type, ScopeType::All);
        assert_eq!(after.source, ScopeSource::RoleMapping);
        assert_eq!(engine.metrics().get_metrics().await.snapshot_reloads, 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let engine = engine_with(InMemoryConfigRepository::from_data(data()));
        let first = engine.snapshot().await.unwrap();
        let again = engine.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        engine.invalidate();
        let reloaded = engine.snapshot().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let mut config = EngineConfig::default();
        config.cache.enabled = false;
        let engine = AccessEngine::new(
            config,
            Arc::new(InMemoryConfigRepository::from_data(data())),
            Arc::new(StaticSubordinates::new()),
        )
        .unwrap();

        let user = User::new(1).with_role("sales");
        engine.resolve_scope(&user, "contract").await.unwrap();
        engine.resolve_scope(&user, "contract").await.unwrap();

        assert!(engine.cache_stats().is_none());
        assert_eq!(engine.metrics().get_metrics().await.snapshot_reloads, 2);
    }
}
