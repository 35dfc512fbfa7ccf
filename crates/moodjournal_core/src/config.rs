//! Store behavior configuration.
//!
//! Hosts may embed `StoreConfig` in their own settings files; every field has
//! a default, so partial documents deserialize.

use serde::{Deserialize, Serialize};

/// Parent used by a save that names no parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultParentPolicy {
    /// Chain onto the most recently saved version in the whole store.
    #[default]
    MostRecentOverall,
    /// Start a new lineage; edits must name their parent explicitly.
    NewRoot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub default_parent: DefaultParentPolicy,
    /// Re-derive a root's postings from its remaining entries on delete.
    pub prune_index_on_delete: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_parent: DefaultParentPolicy::MostRecentOverall,
            prune_index_on_delete: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultParentPolicy, StoreConfig};

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"default_parent":"new_root"}"#).unwrap();
        assert_eq!(config.default_parent, DefaultParentPolicy::NewRoot);
        assert!(config.prune_index_on_delete);

        let config: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
    }
}
