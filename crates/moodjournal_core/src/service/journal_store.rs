//! Journal store handle and transaction envelope.
//!
//! # Responsibility
//! - Own one migrated SQLite connection and the store configuration.
//! - Run save/delete/clear across entries, versions and index atomically.
//! - Serve reads (lookup, history, search) from a single committed snapshot.
//!
//! # Invariants
//! - Write paths use `BEGIN IMMEDIATE`: the default-parent read and all three
//!   table writes happen under one write lock, so concurrent saves through
//!   separate handles never link to the same prior record by accident.
//! - A failed write rolls back; no table advances alone.
//! - Re-saving content that already has a version record never appends a
//!   second row. Without a parent, or with itself as parent, the save is a
//!   no-op. Saved on top of another record (a revert), the existing record is
//!   re-stamped so it becomes the latest of its root.

use crate::config::{DefaultParentPolicy, StoreConfig};
use crate::content::hasher::{digest, DigestError};
use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::document::{Digest, Document, Entry};
use crate::model::version::VersionRecord;
use crate::repo::entry_repo::{EntryRepository, RepoError, SqliteEntryRepository};
use crate::repo::index_repo::{IndexRepository, SqliteIndexRepository};
use crate::repo::version_repo::{SqliteVersionRepository, VersionRepository};
use crate::search::coordinator::{search_entries, SearchError, SearchQuery};
use chrono::{SecondsFormat, Utc};
use log::{debug, error, info};
use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

pub type JournalResult<T> = Result<T, JournalError>;

/// Error surfaced by journal store operations.
#[derive(Debug)]
pub enum JournalError {
    Db(DbError),
    Digest(DigestError),
    Repo(RepoError),
    Search(SearchError),
    /// Connection schema is not at the version this binary writes.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for JournalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Digest(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for JournalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Digest(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for JournalError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for JournalError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<DigestError> for JournalError {
    fn from(value: DigestError) -> Self {
        Self::Digest(value)
    }
}

impl From<RepoError> for JournalError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SearchError> for JournalError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

/// Outcome of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub hash: Digest,
    /// Timestamp of the version record describing `hash`.
    pub timestamp: String,
    pub version: VersionRecord,
    /// `true` when the content was already versioned and nothing was appended.
    pub deduplicated: bool,
    /// `true` when an existing record was moved to this save's timestamp
    /// because it was saved again on top of another record.
    pub restamped: bool,
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub entry_removed: bool,
    pub version_removed: bool,
    /// Postings dropped while re-deriving the root's index entries.
    pub postings_pruned: usize,
}

impl DeleteOutcome {
    pub fn removed_anything(&self) -> bool {
        self.entry_removed || self.version_removed
    }
}

/// Explicit handle to one journal database.
///
/// Independent handles (including several in-memory ones) can coexist; there
/// is no process-wide store.
pub struct JournalStore {
    conn: Connection,
    config: StoreConfig,
}

impl JournalStore {
    /// Opens or creates the journal database at `path`, migrating as needed.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> JournalResult<Self> {
        let conn = open_db(path)?;
        Ok(Self { conn, config })
    }

    /// Opens a private in-memory journal.
    pub fn open_in_memory(config: StoreConfig) -> JournalResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self { conn, config })
    }

    /// Wraps a connection the caller already migrated.
    pub fn try_new(conn: Connection, config: StoreConfig) -> JournalResult<Self> {
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(JournalError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Content digest of `document`.
    pub fn hash(&self, document: &Document) -> JournalResult<Digest> {
        Ok(digest(document)?)
    }

    /// Saves `document` stamped with the current UTC time.
    ///
    /// `parent_hash = None` follows [`StoreConfig::default_parent`].
    pub fn save(
        &mut self,
        document: &Document,
        parent_hash: Option<&str>,
    ) -> JournalResult<SaveReceipt> {
        let timestamp = now_timestamp();
        self.save_with_timestamp(document, parent_hash, &timestamp)
    }

    /// Saves `document` with a caller-provided timestamp.
    ///
    /// Used by import paths where the version time already exists externally.
    /// Timestamps must share one sortable format (RFC 3339 UTC).
    pub fn save_with_timestamp(
        &mut self,
        document: &Document,
        parent_hash: Option<&str>,
        timestamp: &str,
    ) -> JournalResult<SaveReceipt> {
        let started_at = Instant::now();
        let hash = digest(document)?;

        match self.save_in_tx(document, hash.as_str(), parent_hash, timestamp) {
            Ok(receipt) => {
                info!(
                    "event=journal_save module=service status=ok hash={} root_hash={} action={} deduplicated={} restamped={} duration_ms={}",
                    receipt.hash,
                    receipt.version.root_hash,
                    receipt.version.action.as_str(),
                    receipt.deduplicated,
                    receipt.restamped,
                    started_at.elapsed().as_millis()
                );
                Ok(receipt)
            }
            Err(err) => {
                error!(
                    "event=journal_save module=service status=error hash={} duration_ms={} error={}",
                    hash,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn save_in_tx(
        &mut self,
        document: &Document,
        hash: &str,
        parent_hash: Option<&str>,
        timestamp: &str,
    ) -> JournalResult<SaveReceipt> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let entries = SqliteEntryRepository::new(&tx);
        let versions = SqliteVersionRepository::new(&tx);
        let index = SqliteIndexRepository::new(&tx);

        let parent_hash = match parent_hash {
            Some(parent) => Some(parent.to_string()),
            None => match self.config.default_parent {
                DefaultParentPolicy::MostRecentOverall => {
                    versions.most_recent_overall()?.map(|record| record.hash)
                }
                DefaultParentPolicy::NewRoot => None,
            },
        }
        // A record cannot be its own parent.
        .filter(|parent| parent != hash);

        if let Some(existing) = versions.get_version(hash)? {
            // Heals an entry or postings lost outside this envelope.
            entries.put_entry(&Entry {
                hash: hash.to_string(),
                content: document.clone(),
                timestamp: existing.timestamp.clone(),
                root_hash: existing.root_hash.clone(),
            })?;
            index.update_index(document, hash, &existing.root_hash)?;

            let (version, restamped) = match parent_hash.as_deref() {
                None => (existing, false),
                Some(parent) => {
                    let version =
                        versions
                            .restamp_version(hash, timestamp)?
                            .ok_or_else(|| {
                                RepoError::InvalidData(format!(
                                    "version `{hash}` vanished while re-stamping"
                                ))
                            })?;
                    debug!(
                        "event=journal_restamp module=service status=ok hash={} parent_hash={} root_hash={}",
                        hash, parent, version.root_hash
                    );
                    (version, true)
                }
            };
            tx.commit()?;

            return Ok(SaveReceipt {
                hash: hash.to_string(),
                timestamp: version.timestamp.clone(),
                version,
                deduplicated: true,
                restamped,
            });
        }

        let root_hash = versions.resolve_root(hash, parent_hash.as_deref())?;
        let record = VersionRecord::new(hash, parent_hash, root_hash.as_str(), timestamp);

        entries.put_entry(&Entry {
            hash: hash.to_string(),
            content: document.clone(),
            timestamp: timestamp.to_string(),
            root_hash: root_hash.clone(),
        })?;
        versions.append_version(&record)?;
        index.update_index(document, hash, &root_hash)?;
        tx.commit()?;

        Ok(SaveReceipt {
            hash: hash.to_string(),
            timestamp: timestamp.to_string(),
            version: record,
            deduplicated: false,
            restamped: false,
        })
    }

    pub fn get_by_hash(&self, hash: &str) -> JournalResult<Option<Entry>> {
        Ok(SqliteEntryRepository::new(&self.conn).get_entry(hash)?)
    }

    /// All entries, oldest first.
    pub fn get_all(&self) -> JournalResult<Vec<Entry>> {
        Ok(SqliteEntryRepository::new(&self.conn).list_entries()?)
    }

    /// Whole-store history ordered by timestamp.
    pub fn get_version_chain(&self) -> JournalResult<Vec<VersionRecord>> {
        Ok(SqliteVersionRepository::new(&self.conn).list_versions()?)
    }

    /// Lineage of one document, oldest first.
    pub fn get_lineage(&self, root_hash: &str) -> JournalResult<Vec<VersionRecord>> {
        Ok(SqliteVersionRepository::new(&self.conn).chain_for(root_hash)?)
    }

    /// Current version of one document.
    pub fn get_latest(&self, root_hash: &str) -> JournalResult<Option<VersionRecord>> {
        Ok(SqliteVersionRepository::new(&self.conn).latest_for(root_hash)?)
    }

    /// Keyword search; see [`SearchQuery`] for limits.
    pub fn search(&self, text: &str) -> JournalResult<Vec<Entry>> {
        self.search_with(&SearchQuery::new(text))
    }

    pub fn search_with(&self, query: &SearchQuery) -> JournalResult<Vec<Entry>> {
        // Read transaction pins one snapshot for all index/version/entry reads.
        let tx = self.conn.unchecked_transaction()?;
        let hits = search_entries(&tx, query)?;
        tx.commit()?;
        Ok(hits)
    }

    /// Removes the entry and version record stored under `hash`.
    ///
    /// With `prune_index_on_delete`, the removed entry's tokens drop the
    /// affected root unless an entry still stored under that root carries them.
    /// Unknown hashes are not an error.
    pub fn delete(&mut self, hash: &str) -> JournalResult<DeleteOutcome> {
        let prune = self.config.prune_index_on_delete;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let entries = SqliteEntryRepository::new(&tx);
        let versions = SqliteVersionRepository::new(&tx);
        let index = SqliteIndexRepository::new(&tx);

        let removed_entry = entries.get_entry(hash)?;
        let root_hash = match versions.get_version(hash)? {
            Some(record) => Some(record.root_hash),
            None => removed_entry.as_ref().map(|entry| entry.root_hash.clone()),
        };

        let mut outcome = DeleteOutcome {
            entry_removed: entries.delete_entry(hash)?,
            version_removed: versions.delete_version(hash)?,
            postings_pruned: 0,
        };

        // Without stored content the affected tokens are unknown; search
        // skips whatever postings stay behind.
        if let (true, Some(root_hash), Some(removed)) =
            (prune, root_hash.as_deref(), removed_entry.as_ref())
        {
            let remaining = entries
                .list_entries_for_root(root_hash)?
                .into_iter()
                .map(|entry| entry.content)
                .collect::<Vec<_>>();
            outcome.postings_pruned = index.prune_root(root_hash, &removed.content, &remaining)?;
        }
        tx.commit()?;

        info!(
            "event=journal_delete module=service status=ok hash={} entry_removed={} version_removed={} postings_pruned={}",
            hash, outcome.entry_removed, outcome.version_removed, outcome.postings_pruned
        );
        Ok(outcome)
    }

    /// Empties entries, versions and index in one transaction.
    pub fn clear_all(&mut self) -> JournalResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let entries = SqliteEntryRepository::new(&tx).clear_entries()?;
        let versions = SqliteVersionRepository::new(&tx).clear_versions()?;
        let tokens = SqliteIndexRepository::new(&tx).clear_index()?;
        tx.commit()?;

        info!(
            "event=journal_clear module=service status=ok entries={} versions={} tokens={}",
            entries, versions, tokens
        );
        Ok(())
    }
}

/// Current UTC time as RFC 3339 with millisecond precision and `Z` suffix.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::now_timestamp;

    #[test]
    fn now_timestamp_is_utc_millis() {
        let value = now_timestamp();
        assert!(value.ends_with('Z'));
        assert_eq!(value.len(), "2026-01-01T00:00:00.000Z".len());
    }
}
