//! Search coordinator.
//!
//! # Responsibility
//! - Turn free text into the latest entry of every matching document.
//!
//! # Invariants
//! - Query tokens are OR-ed: one shared token is enough to match.
//! - Each root contributes at most one entry, its latest version.
//! - Results are ordered by `timestamp DESC, hash ASC`.
//! - Dangling root/version/entry references are skipped, not raised.

use crate::db::DbError;
use crate::model::document::Entry;
use crate::repo::entry_repo::{EntryRepository, RepoError, SqliteEntryRepository};
use crate::repo::index_repo::{IndexRepository, SqliteIndexRepository};
use crate::repo::version_repo::{SqliteVersionRepository, VersionRepository};
use crate::search::tokenize::unique_tokens;
use log::{debug, warn};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for storage access and row decoding.
#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    Repo(RepoError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Search options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// User query text.
    pub text: String,
    /// Maximum number of entries to return; `None` returns every match.
    pub limit: Option<u32>,
}

impl SearchQuery {
    /// Creates an unlimited query.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: None,
        }
    }
}

/// Runs `query` against the index and returns matching entries, newest first.
///
/// Callers wanting a consistent view across concurrent writers should run this
/// inside a transaction on `conn`.
pub fn search_entries(conn: &Connection, query: &SearchQuery) -> SearchResult<Vec<Entry>> {
    let tokens = unique_tokens(&query.text);
    if tokens.is_empty() || query.limit == Some(0) {
        return Ok(Vec::new());
    }

    let index = SqliteIndexRepository::new(conn);
    let mut roots = BTreeSet::new();
    for token in &tokens {
        roots.extend(index.lookup(token)?);
    }

    let versions = SqliteVersionRepository::new(conn);
    let entries = SqliteEntryRepository::new(conn);
    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    for root_hash in roots {
        // A root without chain (legacy posting) falls back to the entry itself.
        let latest_hash = match versions.latest_for(&root_hash)? {
            Some(record) => record.hash,
            None => root_hash.clone(),
        };
        if !seen.insert(latest_hash.clone()) {
            continue;
        }

        match entries.get_entry(&latest_hash)? {
            Some(entry) => hits.push(entry),
            None => warn!(
                "event=search_resolve module=search status=degraded error_code=dangling_entry root_hash={} hash={}",
                root_hash, latest_hash
            ),
        }
    }

    hits.sort_by(|left, right| {
        right
            .timestamp
            .cmp(&left.timestamp)
            .then_with(|| left.hash.cmp(&right.hash))
    });
    if let Some(limit) = query.limit {
        hits.truncate(limit as usize);
    }

    debug!(
        "event=search module=search status=ok tokens={} hits={}",
        tokens.len(),
        hits.len()
    );
    Ok(hits)
}
