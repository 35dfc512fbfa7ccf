//! Version chain record.

use crate::model::document::Digest;
use serde::{Deserialize, Serialize};

/// Why a version record was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionAction {
    /// First record of a chain; no parent.
    Created,
    /// Record derived from a parent version.
    Edited,
}

impl VersionAction {
    /// Derives the action from whether a parent was resolved.
    pub fn for_parent(parent_hash: Option<&str>) -> Self {
        if parent_hash.is_some() {
            Self::Edited
        } else {
            Self::Created
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Edited => "edited",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "edited" => Some(Self::Edited),
            _ => None,
        }
    }
}

/// One node of a document lineage.
///
/// `root_hash` names the first record of the chain and is stable across edits,
/// so it doubles as the logical document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub hash: Digest,
    pub parent_hash: Option<Digest>,
    pub timestamp: String,
    pub action: VersionAction,
    pub root_hash: Digest,
}

impl VersionRecord {
    /// Builds a record whose action follows from `parent_hash`.
    pub fn new(
        hash: impl Into<Digest>,
        parent_hash: Option<Digest>,
        root_hash: impl Into<Digest>,
        timestamp: impl Into<String>,
    ) -> Self {
        let action = VersionAction::for_parent(parent_hash.as_deref());
        Self {
            hash: hash.into(),
            parent_hash,
            timestamp: timestamp.into(),
            action,
            root_hash: root_hash.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_hash.is_none()
    }
}
