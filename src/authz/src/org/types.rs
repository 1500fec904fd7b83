/// Org unit definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::OrgUnitId;

/// Kind of organizational unit, from broadest to narrowest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgUnitType {
    Company,
    BusinessUnit,
    Department,
    Team,
}

impl fmt::Display for OrgUnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Company => "COMPANY",
            Self::BusinessUnit => "BUSINESS_UNIT",
            Self::Department => "DEPARTMENT",
            Self::Team => "TEAM",
        };
        f.write_str(s)
    }
}

/// A node in the organization tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgUnit {
    /// Unit identifier
    pub id: OrgUnitId,

    /// Short unique code
    pub code: String,

    /// Display name
    pub name: String,

    /// Unit kind
    #[serde(rename = "type")]
    pub unit_type: OrgUnitType,

    /// Parent unit, `None` for roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<OrgUnitId>,

    /// Materialized ancestor path, e.g. `/1/3/7/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Depth in the tree, roots are 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

impl OrgUnit {
    /// Create a root unit without a materialized path
    pub fn new(id: OrgUnitId, code: impl Into<String>, unit_type: OrgUnitType) -> Self {
        let code = code.into();
        Self {
            id,
            name: code.clone(),
            code,
            unit_type,
            parent_id: None,
            path: None,
            depth: None,
        }
    }

    pub fn with_parent(mut self, parent_id: OrgUnitId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the materialized path and depth
    pub fn with_path(mut self, path: impl Into<String>, depth: u32) -> Self {
        self.path = Some(path.into());
        self.depth = Some(depth);
        self
    }

    /// Path of a child of `parent_path` with id `id`
    ///
    /// ```
    /// use orgscope_authz::org::OrgUnit;
    ///
    /// assert_eq!(OrgUnit::child_path(Some("/1/3/"), 7), "/1/3/7/");
    /// assert_eq!(OrgUnit::child_path(None, 1), "/1/");
    /// ```
    pub fn child_path(parent_path: Option<&str>, id: OrgUnitId) -> String {
        match parent_path {
            Some(p) => format!("{}{}/", p, id),
            None => format!("/{}/", id),
        }
    }
}
