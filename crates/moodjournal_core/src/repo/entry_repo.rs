//! Content-addressed entry store.
//!
//! # Responsibility
//! - Persist immutable `Entry` rows keyed by their content digest.
//! - Own the repository error type shared by all journal tables.
//!
//! # Invariants
//! - Writes verify `entry.hash == digest(entry.content)` before touching SQL.
//! - Re-putting identical content is a no-op; putting different content under
//!   an existing hash is rejected as corruption.
//! - Reads reject rows whose content no longer hashes to their key.

use crate::content::hasher::{canonical_json, digest_bytes, DigestError};
use crate::db::DbError;
use crate::model::document::{Digest, Document, Entry};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ENTRY_SELECT_SQL: &str = "SELECT
    hash,
    content,
    timestamp,
    root_hash
FROM entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for journal persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Digest(DigestError),
    /// Entry key does not match the digest of its content.
    DigestMismatch {
        hash: Digest,
        computed: Digest,
    },
    /// A different payload is already stored under this hash.
    ContentConflict(Digest),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Digest(err) => write!(f, "{err}"),
            Self::DigestMismatch { hash, computed } => write!(
                f,
                "entry hash `{hash}` does not match content digest `{computed}`"
            ),
            Self::ContentConflict(hash) => {
                write!(f, "different content already stored under hash `{hash}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted journal data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Digest(err) => Some(err),
            Self::DigestMismatch { .. } | Self::ContentConflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<DigestError> for RepoError {
    fn from(value: DigestError) -> Self {
        Self::Digest(value)
    }
}

/// Repository interface for the entry store.
pub trait EntryRepository {
    /// Idempotent upsert keyed by `entry.hash`. Returns `true` when a new row
    /// was written.
    fn put_entry(&self, entry: &Entry) -> RepoResult<bool>;
    fn get_entry(&self, hash: &str) -> RepoResult<Option<Entry>>;
    /// Returns all entries ordered by `timestamp ASC, hash ASC`.
    fn list_entries(&self) -> RepoResult<Vec<Entry>>;
    fn list_entries_for_root(&self, root_hash: &str) -> RepoResult<Vec<Entry>>;
    /// Removes one entry. Does not touch versions or the index.
    fn delete_entry(&self, hash: &str) -> RepoResult<bool>;
    fn clear_entries(&self) -> RepoResult<usize>;
}

/// SQLite-backed entry store.
///
/// Works on plain connections and on open transactions alike, since
/// `rusqlite::Transaction` derefs to `Connection`.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn put_entry(&self, entry: &Entry) -> RepoResult<bool> {
        let content = canonical_json(&entry.content)?;
        let computed = digest_bytes(content.as_bytes());
        if computed != entry.hash {
            return Err(RepoError::DigestMismatch {
                hash: entry.hash.clone(),
                computed,
            });
        }

        let inserted = self.conn.execute(
            "INSERT INTO entries (hash, content, timestamp, root_hash)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(hash) DO NOTHING;",
            params![
                entry.hash.as_str(),
                content.as_str(),
                entry.timestamp.as_str(),
                entry.root_hash.as_str(),
            ],
        )?;
        if inserted == 1 {
            return Ok(true);
        }

        let stored: String = self.conn.query_row(
            "SELECT content FROM entries WHERE hash = ?1;",
            [entry.hash.as_str()],
            |row| row.get(0),
        )?;
        if stored != content {
            error!(
                "event=entry_put module=repo status=error error_code=content_conflict hash={}",
                entry.hash
            );
            return Err(RepoError::ContentConflict(entry.hash.clone()));
        }

        debug!(
            "event=entry_put module=repo status=unchanged hash={}",
            entry.hash
        );
        Ok(false)
    }

    fn get_entry(&self, hash: &str) -> RepoResult<Option<Entry>> {
        let row = self
            .conn
            .query_row(
                &format!("{ENTRY_SELECT_SQL} WHERE hash = ?1;"),
                [hash],
                read_raw_entry,
            )
            .optional()?;

        row.map(RawEntry::into_entry).transpose()
    }

    fn list_entries(&self) -> RepoResult<Vec<Entry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} ORDER BY timestamp ASC, hash ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(read_raw_entry(row)?.into_entry()?);
        }
        Ok(entries)
    }

    fn list_entries_for_root(&self, root_hash: &str) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE root_hash = ?1
             ORDER BY timestamp ASC, hash ASC;"
        ))?;
        let mut rows = stmt.query([root_hash])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(read_raw_entry(row)?.into_entry()?);
        }
        Ok(entries)
    }

    fn delete_entry(&self, hash: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM entries WHERE hash = ?1;", [hash])?;
        Ok(changed > 0)
    }

    fn clear_entries(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM entries;", [])?)
    }
}

struct RawEntry {
    hash: String,
    content: String,
    timestamp: String,
    root_hash: String,
}

impl RawEntry {
    fn into_entry(self) -> RepoResult<Entry> {
        let computed = digest_bytes(self.content.as_bytes());
        if computed != self.hash {
            return Err(RepoError::InvalidData(format!(
                "content of entry `{}` hashes to `{computed}`",
                self.hash
            )));
        }

        let content: Document = serde_json::from_str(&self.content).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid document json in entries.content for `{}`: {err}",
                self.hash
            ))
        })?;

        Ok(Entry {
            hash: self.hash,
            content,
            timestamp: self.timestamp,
            root_hash: self.root_hash,
        })
    }
}

fn read_raw_entry(row: &Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        hash: row.get("hash")?,
        content: row.get("content")?,
        timestamp: row.get("timestamp")?,
        root_hash: row.get("root_hash")?,
    })
}
