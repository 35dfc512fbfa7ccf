//! Content addressing primitives.
//!
//! # Responsibility
//! - Turn a `Document` into its stable digest.
//!
//! # Invariants
//! - Digests are lowercase hex SHA-256, 64 characters long.

pub mod hasher;
