//! Keyword search over the inverted index.
//!
//! # Responsibility
//! - Tokenize text identically for indexing and querying.
//! - Resolve matched roots to their latest entries.

pub mod coordinator;
pub mod tokenize;
