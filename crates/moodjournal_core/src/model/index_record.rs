//! Inverted index record shapes and the legacy upgrade transform.
//!
//! # Responsibility
//! - Describe a posting list as persisted (`StoredIndexRecord`, possibly in
//!   the v1 entry-hash shape) and as used by search (`IndexRecord`).
//! - Convert the former into the latter without losing a posting.
//!
//! # Invariants
//! - `upgrade_index_record` is pure and idempotent: upgrading an already
//!   upgraded record yields the same postings.

use crate::model::document::Digest;
use std::collections::BTreeSet;

/// Posting list keyed by a lowercase token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub word: String,
    pub root_hashes: BTreeSet<Digest>,
}

impl IndexRecord {
    pub fn empty(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            root_hashes: BTreeSet::new(),
        }
    }
}

/// Raw `search_index` row.
///
/// `entry_hashes` is the v1 posting field; `root_hashes` the current one.
/// A row may carry either, both (written by mixed versions), or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredIndexRecord {
    pub word: String,
    pub entry_hashes: Option<BTreeSet<Digest>>,
    pub root_hashes: Option<BTreeSet<Digest>>,
}

impl StoredIndexRecord {
    pub fn is_legacy(&self) -> bool {
        self.entry_hashes.is_some()
    }
}

/// Converts a stored row into the root-hash shape.
///
/// Legacy entry hashes are mapped to their root through `root_of`; hashes it
/// cannot resolve are kept verbatim so the posting survives.
pub fn upgrade_index_record<F>(stored: StoredIndexRecord, mut root_of: F) -> IndexRecord
where
    F: FnMut(&str) -> Option<Digest>,
{
    let mut root_hashes = stored.root_hashes.unwrap_or_default();
    for entry_hash in stored.entry_hashes.unwrap_or_default() {
        let root = root_of(entry_hash.as_str()).unwrap_or(entry_hash);
        root_hashes.insert(root);
    }

    IndexRecord {
        word: stored.word,
        root_hashes,
    }
}

#[cfg(test)]
mod tests {
    use super::{upgrade_index_record, StoredIndexRecord};
    use std::collections::BTreeSet;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn legacy_postings_are_mapped_to_roots() {
        let stored = StoredIndexRecord {
            word: "calm".to_string(),
            entry_hashes: Some(set(&["e1", "e2"])),
            root_hashes: None,
        };

        let upgraded = upgrade_index_record(stored, |hash| match hash {
            "e1" => Some("r1".to_string()),
            "e2" => Some("r1".to_string()),
            _ => None,
        });

        assert_eq!(upgraded.word, "calm");
        assert_eq!(upgraded.root_hashes, set(&["r1"]));
    }

    #[test]
    fn unresolved_legacy_hashes_are_kept() {
        let stored = StoredIndexRecord {
            word: "calm".to_string(),
            entry_hashes: Some(set(&["orphan"])),
            root_hashes: Some(set(&["r9"])),
        };

        let upgraded = upgrade_index_record(stored, |_| None);
        assert_eq!(upgraded.root_hashes, set(&["orphan", "r9"]));
    }

    #[test]
    fn upgrade_is_idempotent() {
        let stored = StoredIndexRecord {
            word: "steady".to_string(),
            entry_hashes: Some(set(&["e1"])),
            root_hashes: None,
        };
        let first = upgrade_index_record(stored, |_| Some("r1".to_string()));

        let again = upgrade_index_record(
            StoredIndexRecord {
                word: first.word.clone(),
                entry_hashes: None,
                root_hashes: Some(first.root_hashes.clone()),
            },
            |_| Some("unused".to_string()),
        );
        assert_eq!(again, first);
        assert!(!StoredIndexRecord::default().is_legacy());
    }
}
