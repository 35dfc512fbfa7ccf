//! Journal domain model.
//!
//! # Responsibility
//! - Define the caller-owned `Document` and the three persisted record shapes
//!   (`Entry`, `VersionRecord`, `IndexRecord`).
//!
//! # Invariants
//! - `Entry::hash` is the digest of `Entry::content`.
//! - A `VersionRecord` without parent is its own root.
//! - Index postings are sets of root hashes.

pub mod document;
pub mod index_record;
pub mod version;
