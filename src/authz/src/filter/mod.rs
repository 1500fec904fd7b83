//! Scope decision → query filter translation
//!
//! Callers describe their resource with a [`ResourceDescriptor`] (which
//! columns hold the owner, org unit and responsible manager, and whether the
//! resource is finance-tagged). The [`FilterTranslator`] turns a
//! [`ScopeDecision`](crate::scope::ScopeDecision) into a [`FilterSpec`] the
//! caller applies to its own query, or evaluates against one entity with
//! [`FilterSpec::permits`].

mod types;
mod translator;

pub use types::{EntityRef, FilterSpec, ResourceDescriptor};
pub use translator::FilterTranslator;
