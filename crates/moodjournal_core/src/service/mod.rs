//! Journal use-case services.
//!
//! # Responsibility
//! - Wrap multi-table writes into atomic transactions.
//! - Expose the operations callers use; keep UI layers away from storage.

pub mod journal_store;
