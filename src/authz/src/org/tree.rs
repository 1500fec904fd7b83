/// Arena-backed organization tree
///
/// Built once from the full unit list. Malformed input never fails the
/// build: dangling parents become roots, duplicate ids are dropped and
/// cycles are detected and reported, all through [`AccessWarning`].

use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

use super::types::{OrgUnit, OrgUnitType};
use crate::error::AccessWarning;
use crate::types::OrgUnitId;

/// Read-only organization tree
#[derive(Debug, Clone, Default)]
pub struct OrgTree {
    /// Units in insertion order
    units: Vec<OrgUnit>,
    /// Unit id -> arena slot
    index: HashMap<OrgUnitId, usize>,
    /// Effective parent per arena slot (dangling parents removed)
    parents: Vec<Option<OrgUnitId>>,
    /// Unit id -> child ids
    children: HashMap<OrgUnitId, Vec<OrgUnitId>>,
    /// Units without an effective parent
    roots: Vec<OrgUnitId>,
    /// Whether every unit carries a path/depth consistent with its parent
    paths_consistent: bool,
    /// Integrity problems found while building
    issues: Vec<AccessWarning>,
}

impl OrgTree {
    /// Build a tree from the full set of units
    pub fn build(units: impl IntoIterator<Item = OrgUnit>) -> Self {
        let mut tree = Self::default();

        for unit in units {
            if tree.index.contains_key(&unit.id) {
                tree.record(AccessWarning::DuplicateUnit(unit.id));
                continue;
            }
            tree.index.insert(unit.id, tree.units.len());
            tree.units.push(unit);
        }

        tree.parents = Vec::with_capacity(tree.units.len());
        for slot in 0..tree.units.len() {
            let id = tree.units[slot].id;
            let declared = tree.units[slot].parent_id;
            let parent = match declared {
                Some(p) if p == id => {
                    tree.record(AccessWarning::Cycle(vec![id]));
                    None
                }
                Some(p) if tree.index.contains_key(&p) => Some(p),
                Some(p) => {
                    tree.record(AccessWarning::DanglingParent { unit: id, parent: p });
                    None
                }
                None => None,
            };

            tree.parents.push(parent);
            match parent {
                Some(p) => tree.children.entry(p).or_default().push(id),
                None => tree.roots.push(id),
            }
        }

        let reachable = tree.reachable_from_roots();
        let has_cycles = reachable.len() < tree.units.len();
        if has_cycles {
            tree.detect_cycles(reachable);
        }

        tree.paths_consistent = !has_cycles && tree.check_paths();

        debug!(
            units = tree.units.len(),
            roots = tree.roots.len(),
            paths_consistent = tree.paths_consistent,
            issues = tree.issues.len(),
            "org tree built"
        );

        tree
    }

    /// Look up a unit by id
    pub fn get_unit(&self, id: OrgUnitId) -> Option<&OrgUnit> {
        self.index.get(&id).map(|&slot| &self.units[slot])
    }

    pub fn contains(&self, id: OrgUnitId) -> bool {
        self.index.contains_key(&id)
    }

    /// Effective parent id (`None` for roots and dangling references)
    pub fn parent_id_of(&self, id: OrgUnitId) -> Option<OrgUnitId> {
        self.index.get(&id).and_then(|&slot| self.parents[slot])
    }

    /// Ordered chain from the root down to `id`, inclusive
    ///
    /// Empty when `id` is unknown. On cyclic data the walk stops at the
    /// first revisited unit.
    pub fn parent_chain(&self, id: OrgUnitId) -> Vec<&OrgUnit> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id);

        while let Some(unit_id) = current {
            let Some(unit) = self.get_unit(unit_id) else {
                break;
            };
            if !seen.insert(unit_id) {
                debug!(unit = unit_id, "parent chain revisits unit, stopping");
                break;
            }
            chain.push(unit);
            current = self.parent_id_of(unit_id);
        }

        chain.reverse();
        chain
    }

    /// Nearest unit of `unit_type` walking upward from `id` (inclusive)
    pub fn ancestor_of_type(&self, id: OrgUnitId, unit_type: OrgUnitType) -> Option<&OrgUnit> {
        self.parent_chain(id)
            .into_iter()
            .rev()
            .find(|u| u.unit_type == unit_type)
    }

    /// Direct children of `id`
    pub fn children(&self, id: OrgUnitId) -> Vec<&OrgUnit> {
        self.child_ids(id)
            .iter()
            .filter_map(|c| self.get_unit(*c))
            .collect()
    }

    pub fn child_ids(&self, id: OrgUnitId) -> &[OrgUnitId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[OrgUnitId] {
        &self.roots
    }

    pub fn units(&self) -> impl Iterator<Item = &OrgUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Whether subtree lookups can use the materialized path
    pub fn has_consistent_paths(&self) -> bool {
        self.paths_consistent
    }

    /// Integrity problems found while building
    pub fn integrity_issues(&self) -> &[AccessWarning] {
        &self.issues
    }

    /// Recompute `path`, `depth` and effective `parent_id` for every unit
    /// reachable from a root
    ///
    /// Units trapped in a cycle come back with `path` and `depth` cleared.
    pub fn materialize_paths(&self) -> Vec<OrgUnit> {
        let mut out = self.units.clone();
        for unit in &mut out {
            unit.path = None;
            unit.depth = None;
        }

        let mut queue: VecDeque<(OrgUnitId, String, u32)> = self
            .roots
            .iter()
            .map(|&r| (r, OrgUnit::child_path(None, r), 1))
            .collect();

        while let Some((id, path, depth)) = queue.pop_front() {
            let Some(&slot) = self.index.get(&id) else {
                continue;
            };
            for &child in self.child_ids(id) {
                queue.push_back((child, OrgUnit::child_path(Some(&path), child), depth + 1));
            }
            out[slot].parent_id = self.parents[slot];
            out[slot].path = Some(path);
            out[slot].depth = Some(depth);
        }

        out
    }

    fn record(&mut self, warning: AccessWarning) {
        warning.log();
        self.issues.push(warning);
    }

    fn reachable_from_roots(&self) -> HashSet<OrgUnitId> {
        let mut seen: HashSet<OrgUnitId> = HashSet::with_capacity(self.units.len());
        let mut queue: VecDeque<OrgUnitId> = self.roots.iter().copied().collect();

        while let Some(id) = queue.pop_front() {
            if seen.insert(id) {
                queue.extend(self.child_ids(id).iter().copied());
            }
        }

        seen
    }

    /// Walk the parent links of every unreachable unit and report each loop once
    fn detect_cycles(&mut self, reachable: HashSet<OrgUnitId>) {
        let mut settled = reachable;
        let ids: Vec<OrgUnitId> = self.units.iter().map(|u| u.id).collect();

        for id in ids {
            if settled.contains(&id) {
                continue;
            }

            let mut trail: Vec<OrgUnitId> = Vec::new();
            let mut on_trail: HashSet<OrgUnitId> = HashSet::new();
            let mut current = Some(id);

            while let Some(unit_id) = current {
                if settled.contains(&unit_id) {
                    break;
                }
                if !on_trail.insert(unit_id) {
                    let start = trail.iter().position(|&t| t == unit_id).unwrap_or(0);
                    let cycle = trail[start..].to_vec();
                    self.record(AccessWarning::Cycle(cycle));
                    break;
                }
                trail.push(unit_id);
                current = self.parent_id_of(unit_id);
            }

            settled.extend(trail);
        }
    }

    fn check_paths(&self) -> bool {
        self.units.iter().enumerate().all(|(slot, unit)| {
            let (Some(path), Some(depth)) = (unit.path.as_deref(), unit.depth) else {
                return false;
            };

            match self.parents[slot] {
                None => {
                    unit.parent_id.is_none()
                        && depth == 1
                        && path == OrgUnit::child_path(None, unit.id)
                }
                Some(p) => match self.get_unit(p) {
                    Some(parent) => {
                        parent.depth.map(|d| d + 1) == Some(depth)
                            && parent
                                .path
                                .as_deref()
                                .map(|pp| OrgUnit::child_path(Some(pp), unit.id) == path)
                                .unwrap_or(false)
                    }
                    None => false,
                },
            }
        })
    }
}
