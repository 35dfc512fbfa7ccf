//! Caller document and content-addressed entry.
//!
//! # Invariants
//! - Field declaration order of `Document` is the canonical serialization
//!   order used for hashing. Reordering, renaming or adding fields changes
//!   every digest and therefore the identity of all stored content.

use serde::{Deserialize, Serialize};

/// Lowercase hex SHA-256 digest of a document's canonical form.
pub type Digest = String;

/// User-authored journal document.
///
/// Opaque to the core apart from hashing and the searchable text it exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub description: String,
    pub affirmations: Vec<String>,
    pub mood: String,
    /// Authoring timestamp as supplied by the caller.
    pub timestamp: String,
}

impl Document {
    /// Creates a document with no affirmations and an empty mood tag.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            affirmations: Vec::new(),
            mood: String::new(),
            timestamp: timestamp.into(),
        }
    }

    /// Text fed to the inverted index. Affirmations are not indexed.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// Immutable content-addressed row of the entry store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub hash: Digest,
    pub content: Document,
    /// Save time, RFC 3339 UTC.
    pub timestamp: String,
    pub root_hash: Digest,
}
