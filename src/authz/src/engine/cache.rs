//! Snapshot and decision caches
//!
//! Org units, roles and scope rules change rarely, so one immutable
//! [`AccessSnapshot`] is shared by every request until the repository
//! version moves, the TTL lapses, or someone calls `invalidate`.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::org::{OrgTree, OrgUnit, SubtreeIndex};
use crate::scope::{RoleScopeAssignment, ScopeDecision, ScopeRuleStore};
use crate::types::{Role, User, UserId};

/// Read-only view of the configuration for one repository version
#[derive(Debug)]
pub struct AccessSnapshot {
    pub version: u64,
    pub subtree: SubtreeIndex,
    pub rules: ScopeRuleStore,
}

impl AccessSnapshot {
    /// Build the tree, subtree index and rule store, logging integrity issues
    pub fn build(
        version: u64,
        units: Vec<OrgUnit>,
        roles: Vec<Role>,
        assignments: Vec<RoleScopeAssignment>,
        config: &EngineConfig,
    ) -> Self {
        let tree = OrgTree::build(units);
        let rules = ScopeRuleStore::build(roles, assignments, config);

        let issues = tree.integrity_issues().len() + rules.integrity_issues().len();
        if issues > 0 {
            warn!(version, issues, "access snapshot built with integrity issues");
        }

        Self {
            version,
            subtree: SubtreeIndex::new(Arc::new(tree)),
            rules,
        }
    }

    pub fn tree(&self) -> &OrgTree {
        self.subtree.tree()
    }
}

struct CachedSnapshot {
    snapshot: Arc<AccessSnapshot>,
    loaded_at: Instant,
}

/// Holds the current [`AccessSnapshot`]
pub struct SnapshotCache {
    current: RwLock<Option<CachedSnapshot>>,
    ttl: Duration,
    enabled: bool,
}

impl SnapshotCache {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            current: RwLock::new(None),
            ttl,
            enabled,
        }
    }

    /// Cached snapshot if it matches `version` and is still fresh
    pub fn get(&self, version: u64) -> Option<Arc<AccessSnapshot>> {
        if !self.enabled {
            return None;
        }

        let current = self.current.read();
        let cached = current.as_ref()?;

        if cached.snapshot.version != version {
            debug!(cached = cached.snapshot.version, version, "snapshot version changed");
            return None;
        }
        if cached.loaded_at.elapsed() > self.ttl {
            debug!(version, "snapshot expired");
            return None;
        }

        Some(Arc::clone(&cached.snapshot))
    }

    pub fn install(&self, snapshot: Arc<AccessSnapshot>) {
        if !self.enabled {
            return;
        }
        *self.current.write() = Some(CachedSnapshot {
            snapshot,
            loaded_at: Instant::now(),
        });
    }

    /// Drop the held snapshot so the next request reloads
    pub fn invalidate(&self) {
        *self.current.write() = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

/// Everything a [`ScopeDecision`] depends on besides the snapshot
///
/// Role codes are sorted so the same role set hits the same entry
/// regardless of the order the identity provider lists them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionKey {
    snapshot_version: u64,
    user_id: UserId,
    active: bool,
    superuser: bool,
    roles: Vec<String>,
    resource_type: String,
}

impl DecisionKey {
    pub fn new(snapshot_version: u64, user: &User, resource_type: &str) -> Self {
        let mut roles = user.roles.clone();
        roles.sort();
        roles.dedup();

        Self {
            snapshot_version,
            user_id: user.id,
            active: user.active,
            superuser: user.superuser,
            roles,
            resource_type: resource_type.to_string(),
        }
    }
}

#[derive(Clone)]
struct CachedEntry {
    decision: ScopeDecision,
    cached_at: Instant,
}

impl CachedEntry {
    fn new(decision: ScopeDecision) -> Self {
        Self {
            decision,
            cached_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Bounded, TTL-limited memo of resolved scope decisions
pub struct DecisionCache {
    entries: Arc<DashMap<DecisionKey, CachedEntry>>,
    capacity: usize,
    ttl: Duration,
    stats: Arc<DashMap<&'static str, usize>>,
}

impl DecisionCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
            ttl,
            stats: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, key: &DecisionKey) -> Option<ScopeDecision> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired(self.ttl) {
                drop(entry);
                self.entries.remove(key);
                self.increment_stat("expirations");
                self.increment_stat("misses");
                return None;
            }

            self.increment_stat("hits");
            return Some(entry.decision.clone());
        }

        self.increment_stat("misses");
        None
    }

    pub fn put(&self, key: DecisionKey, decision: ScopeDecision) {
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(key, CachedEntry::new(decision));
    }

    /// Drop every entry; statistics are kept
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            expirations: self.get_stat("expirations"),
            entries: self.entries.len(),
            max_entries: self.capacity,
        }
    }

    /// Remove expired entries, then the oldest tenth if still full
    fn evict_oldest(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| !entry.is_expired(ttl));
        if self.entries.len() < self.capacity {
            return;
        }

        let mut ages: Vec<(DecisionKey, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().cached_at))
            .collect();
        ages.sort_by_key(|(_, cached_at)| *cached_at);

        let to_remove = (self.capacity / 10).max(1);
        for (key, _) in ages.into_iter().take(to_remove) {
            self.entries.remove(&key);
        }
        self.increment_stat("evictions");
    }

    fn increment_stat(&self, key: &'static str) {
        *self.stats.entry(key).or_insert(0) += 1;
    }

    fn get_stat(&self, key: &'static str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

/// Decision cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub expirations: usize,
    pub entries: usize,
    pub max_entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
