//! Organizational hierarchy
//!
//! Units live in a flat arena addressed by integer id, so every traversal is
//! an iterative walk guarded by a visited set instead of pointer chasing.
//!
//! Two input shapes are tolerated:
//!
//! - **Materialized paths**: every unit carries `path` (`/1/3/7/`) and
//!   `depth`, consistent with its parent. Subtree queries become a single
//!   prefix range scan.
//! - **Parent links only**: `path`/`depth` are absent or inconsistent.
//!   Subtree queries fall back to a breadth-first walk over child links.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use orgscope_authz::org::{OrgTree, OrgUnit, OrgUnitType, SubtreeIndex};
//!
//! let tree = Arc::new(OrgTree::build(vec![
//!     OrgUnit::new(1, "acme", OrgUnitType::Company),
//!     OrgUnit::new(2, "sales", OrgUnitType::BusinessUnit).with_parent(1),
//!     OrgUnit::new(3, "emea", OrgUnitType::Department).with_parent(2),
//! ]));
//!
//! let index = SubtreeIndex::new(tree);
//! let ids = index.descendant_ids(2);
//! assert!(ids.contains(&2) && ids.contains(&3) && !ids.contains(&1));
//! ```

mod types;
mod tree;
mod subtree;

pub use types::{OrgUnit, OrgUnitType};
pub use tree::OrgTree;
pub use subtree::SubtreeIndex;
