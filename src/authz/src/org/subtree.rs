/// Subtree computation over the org tree
///
/// Uses a sorted path index (single prefix range scan) when the tree's
/// materialized paths are consistent, and an iterative breadth-first walk
/// over child links otherwise.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::ops::Bound;
use std::sync::Arc;

use super::tree::OrgTree;
use crate::error::AccessWarning;
use crate::types::OrgUnitId;

/// Answers "which units are at or below this one"
#[derive(Debug, Clone)]
pub struct SubtreeIndex {
    tree: Arc<OrgTree>,
    /// Materialized path -> unit id, present only for consistent trees
    by_path: Option<BTreeMap<String, OrgUnitId>>,
}

impl SubtreeIndex {
    /// Create an index over `tree`
    pub fn new(tree: Arc<OrgTree>) -> Self {
        let by_path = tree.has_consistent_paths().then(|| {
            tree.units()
                .filter_map(|u| u.path.clone().map(|p| (p, u.id)))
                .collect()
        });

        Self { tree, by_path }
    }

    pub fn tree(&self) -> &OrgTree {
        &self.tree
    }

    /// Whether lookups go through the path index
    pub fn uses_path_index(&self) -> bool {
        self.by_path.is_some()
    }

    /// `unit_id` plus all of its descendants
    ///
    /// An id missing from the tree yields just `{unit_id}`.
    pub fn descendant_ids(&self, unit_id: OrgUnitId) -> HashSet<OrgUnitId> {
        if !self.tree.contains(unit_id) {
            AccessWarning::MissingUnit(unit_id).log();
            return HashSet::from([unit_id]);
        }

        match self.descendants_by_path(unit_id) {
            Some(ids) => ids,
            None => self.descendants_by_walk(unit_id),
        }
    }

    /// Prefix scan over the path index; `None` when the index is unavailable
    pub fn descendants_by_path(&self, unit_id: OrgUnitId) -> Option<HashSet<OrgUnitId>> {
        let index = self.by_path.as_ref()?;
        let prefix = self.tree.get_unit(unit_id)?.path.as_deref()?;

        let ids = index
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(_, &id)| id)
            .collect();

        Some(ids)
    }

    /// Breadth-first walk over child links
    ///
    /// A revisited unit means the data is cyclic: it is reported and that
    /// branch stops there.
    pub fn descendants_by_walk(&self, unit_id: OrgUnitId) -> HashSet<OrgUnitId> {
        let mut visited = HashSet::from([unit_id]);
        let mut queue = VecDeque::from([unit_id]);

        while let Some(current) = queue.pop_front() {
            for &child in self.tree.child_ids(current) {
                if visited.insert(child) {
                    queue.push_back(child);
                } else {
                    AccessWarning::Cycle(vec![current, child]).log();
                }
            }
        }

        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::{OrgUnit, OrgUnitType};

    fn tree(with_paths: bool) -> Arc<OrgTree> {
        let units = vec![
            OrgUnit::new(1, "acme", OrgUnitType::Company),
            OrgUnit::new(2, "sales", OrgUnitType::BusinessUnit).with_parent(1),
            OrgUnit::new(3, "emea", OrgUnitType::Department).with_parent(2),
            OrgUnit::new(4, "north", OrgUnitType::Team).with_parent(3),
            OrgUnit::new(5, "south", OrgUnitType::Team).with_parent(3),
            OrgUnit::new(6, "ops", OrgUnitType::BusinessUnit).with_parent(1),
            OrgUnit::new(35, "apac", OrgUnitType::Department).with_parent(2),
        ];
        let raw = OrgTree::build(units);
        if with_paths {
            Arc::new(OrgTree::build(raw.materialize_paths()))
        } else {
            Arc::new(raw)
        }
    }

    fn sorted(ids: HashSet<OrgUnitId>) -> Vec<OrgUnitId> {
        let mut v: Vec<_> = ids.into_iter().collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_path_index_subtree() {
        let index = SubtreeIndex::new(tree(true));
        assert!(index.uses_path_index());
        assert_eq!(sorted(index.descendant_ids(3)), vec![3, 4, 5]);
        assert_eq!(sorted(index.descendant_ids(2)), vec![2, 3, 4, 5, 35]);
        assert_eq!(sorted(index.descendant_ids(1)).len(), 7);
    }

    #[test]
    fn test_prefix_does_not_leak_into_sibling_ids() {
        // "/1/2/3/" must not match "/1/2/35/"
        let index = SubtreeIndex::new(tree(true));
        assert!(!index.descendant_ids(3).contains(&35));
    }

    #[test]
    fn test_walk_subtree() {
        let index = SubtreeIndex::new(tree(false));
        assert!(!index.uses_path_index());
        assert!(index.descendants_by_path(3).is_none());
        assert_eq!(sorted(index.descendant_ids(3)), vec![3, 4, 5]);
        assert_eq!(sorted(index.descendant_ids(4)), vec![4]);
    }

    #[test]
    fn test_path_and_walk_agree() {
        let index = SubtreeIndex::new(tree(true));
        for id in [1, 2, 3, 4, 5, 6, 35] {
            assert_eq!(index.descendants_by_path(id), Some(index.descendants_by_walk(id)));
        }
    }

    #[test]
    fn test_missing_unit_yields_itself() {
        let index = SubtreeIndex::new(tree(true));
        assert_eq!(sorted(index.descendant_ids(404)), vec![404]);
    }

    #[test]
    fn test_walk_terminates_on_cycle() {
        let units = vec![
            OrgUnit::new(2, "a", OrgUnitType::Department).with_parent(3),
            OrgUnit::new(3, "b", OrgUnitType::Department).with_parent(2),
            OrgUnit::new(4, "c", OrgUnitType::Team).with_parent(3),
        ];
        let index = SubtreeIndex::new(Arc::new(OrgTree::build(units)));
        assert_eq!(sorted(index.descendant_ids(2)), vec![2, 3, 4]);
    }
}
