//! Repository layer over the three journal tables.
//!
//! # Responsibility
//! - Define data access contracts for entries, versions and the index.
//! - Isolate SQLite query details from the transaction envelope.
//!
//! # Invariants
//! - Repositories never open transactions themselves; callers scope them so
//!   several repositories can share one atomic unit.
//! - Lookup misses are `None`/empty results, never errors.

pub mod entry_repo;
pub mod index_repo;
pub mod version_repo;
