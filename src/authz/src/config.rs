//! Engine configuration loading

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{AuthzError, Result};

/// Scope engine configuration
///
/// Passed to the engine at construction; every field has a default so an
/// empty TOML document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Role codes recognized as finance personnel (exact match)
    #[serde(default = "default_finance_roles")]
    pub finance_roles: Vec<String>,

    /// Resource types that are finance-tagged unless a descriptor says otherwise
    #[serde(default = "default_finance_resource_types")]
    pub finance_resource_types: Vec<String>,

    /// Whether a finance role also caps a role-derived ALL scope.
    /// Superusers are never capped.
    #[serde(default = "default_true")]
    pub finance_caps_all: bool,

    #[serde(default)]
    pub cache: CacheSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_decisions")]
    pub max_decisions: usize,
}

impl CacheSection {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
            max_decisions: default_max_decisions(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            finance_roles: default_finance_roles(),
            finance_resource_types: default_finance_resource_types(),
            finance_caps_all: true,
            cache: CacheSection::default(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)
            .map_err(|e| AuthzError::Configuration(format!("invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading engine config");
        Self::from_toml_str(&content)
    }

    /// Reject configurations that would make finance matching ambiguous
    pub fn validate(&self) -> Result<()> {
        if let Some(empty) = self
            .finance_roles
            .iter()
            .chain(self.finance_resource_types.iter())
            .find(|s| s.trim().is_empty())
        {
            return Err(AuthzError::Configuration(format!(
                "finance markers must be non-empty, got {:?}",
                empty
            )));
        }

        if self.cache.enabled && self.cache.max_decisions == 0 {
            return Err(AuthzError::Configuration(
                "cache.max_decisions must be positive when the cache is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_finance_roles() -> Vec<String> {
    vec!["finance".to_string(), "accountant".to_string(), "cashier".to_string()]
}

fn default_finance_resource_types() -> Vec<String> {
    vec!["invoice".to_string(), "payment".to_string(), "receipt".to_string()]
}

fn default_ttl_secs() -> u64 {
    60
}

fn default_max_decisions() -> usize {
    10_000
}
