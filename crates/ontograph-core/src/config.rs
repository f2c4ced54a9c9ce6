//! # Knowledge Base Configuration
//!
//! Runtime knobs for recovery and housekeeping behavior, loadable from TOML:
//!
//! ```toml
//! unresolved_inverse = "skip"
//! prune_role_registry = true
//! suppress_irreflexive_self_loops = true
//! ```

use crate::types::{OntographError, Result};
use serde::{Deserialize, Serialize};

/// What the inverse rule does when the target has no field for the inverse property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InversePolicy {
    /// Fail the triggering write with `UnresolvedInverse`.
    #[default]
    Abort,
    /// Log a warning and continue with the remaining rules.
    Skip,
}

/// Configuration for a `KnowledgeBase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KnowledgeBaseConfig {
    /// Recovery policy for an unresolved inverse (default: abort).
    pub unresolved_inverse: InversePolicy,
    /// Whether `sweep()` also drops dead role registry entries (default: true).
    pub prune_role_registry: bool,
    /// Whether inferred `(x, x)` relations of irreflexive properties are dropped (default: true).
    pub suppress_irreflexive_self_loops: bool,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            unresolved_inverse: InversePolicy::Abort,
            prune_role_registry: true,
            suppress_irreflexive_self_loops: true,
        }
    }
}

impl KnowledgeBaseConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| OntographError::Config(e.to_string()))
    }

    /// Set the unresolved-inverse policy.
    #[must_use]
    pub fn with_unresolved_inverse(mut self, policy: InversePolicy) -> Self {
        self.unresolved_inverse = policy;
        self
    }

    /// Enable or disable role registry pruning during sweeps.
    #[must_use]
    pub fn with_prune_role_registry(mut self, prune: bool) -> Self {
        self.prune_role_registry = prune;
        self
    }

    /// Enable or disable suppression of inferred irreflexive self-loops.
    #[must_use]
    pub fn with_suppress_irreflexive_self_loops(mut self, suppress: bool) -> Self {
        self.suppress_irreflexive_self_loops = suppress;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = KnowledgeBaseConfig::from_toml_str("").expect("parse");
        assert_eq!(config, KnowledgeBaseConfig::default());
    }

    #[test]
    fn toml_overrides_selected_keys() {
        let config = KnowledgeBaseConfig::from_toml_str(
            "unresolved_inverse = \"skip\"\nprune_role_registry = false\n",
        )
        .expect("parse");
        assert_eq!(config.unresolved_inverse, InversePolicy::Skip);
        assert!(!config.prune_role_registry);
        assert!(config.suppress_irreflexive_self_loops);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = KnowledgeBaseConfig::from_toml_str("max_depth = 3");
        assert!(matches!(result, Err(OntographError::Config(_))));
    }

    #[test]
    fn builder_setters() {
        let config = KnowledgeBaseConfig::default()
            .with_unresolved_inverse(InversePolicy::Skip)
            .with_suppress_irreflexive_self_loops(false);
        assert_eq!(config.unresolved_inverse, InversePolicy::Skip);
        assert!(!config.suppress_irreflexive_self_loops);
    }
}
