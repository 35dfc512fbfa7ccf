//! Append-only version chain.
//!
//! # Responsibility
//! - Persist `VersionRecord` rows and resolve lineage roots.
//! - Answer chain, latest-per-root and latest-overall queries.
//!
//! # Invariants
//! - A record with parent `P` carries the root of `P`'s record; a record
//!   without parent is its own root.
//! - Order is `timestamp`, then insertion `seq`. Timestamps are caller-supplied
//!   and may collide; `seq` makes the later append win.

use crate::model::document::Digest;
use crate::model::version::{VersionAction, VersionRecord};
use crate::repo::entry_repo::{RepoError, RepoResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};

const VERSION_SELECT_SQL: &str = "SELECT
    hash,
    parent_hash,
    root_hash,
    action,
    timestamp
FROM versions";

/// Repository interface for the version chain.
pub trait VersionRepository {
    fn get_version(&self, hash: &str) -> RepoResult<Option<VersionRecord>>;
    /// Returns the root for a record `hash` appended under `parent_hash`.
    ///
    /// A missing parent record degrades to treating `parent_hash` as the root.
    fn resolve_root(&self, hash: &str, parent_hash: Option<&str>) -> RepoResult<Digest>;
    fn append_version(&self, record: &VersionRecord) -> RepoResult<()>;
    /// Moves an existing record to `timestamp` and the end of insertion order.
    ///
    /// Parent and root stay as they are. Returns the updated record, or `None`
    /// when no record exists for `hash`.
    fn restamp_version(&self, hash: &str, timestamp: &str) -> RepoResult<Option<VersionRecord>>;
    /// Full lineage of one root, oldest first.
    fn chain_for(&self, root_hash: &str) -> RepoResult<Vec<VersionRecord>>;
    fn latest_for(&self, root_hash: &str) -> RepoResult<Option<VersionRecord>>;
    fn most_recent_overall(&self) -> RepoResult<Option<VersionRecord>>;
    /// Whole-store history, oldest first.
    fn list_versions(&self) -> RepoResult<Vec<VersionRecord>>;
    fn delete_version(&self, hash: &str) -> RepoResult<bool>;
    fn clear_versions(&self) -> RepoResult<usize>;
}

/// SQLite-backed version chain.
pub struct SqliteVersionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVersionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_versions(
        &self,
        sql: &str,
        bind: impl rusqlite::Params,
    ) -> RepoResult<Vec<VersionRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_version_row(row)?);
        }
        Ok(records)
    }

    fn query_one(
        &self,
        sql: &str,
        bind: impl rusqlite::Params,
    ) -> RepoResult<Option<VersionRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_version_row(row)?)),
            None => Ok(None),
        }
    }
}

impl VersionRepository for SqliteVersionRepository<'_> {
    fn get_version(&self, hash: &str) -> RepoResult<Option<VersionRecord>> {
        self.query_one(&format!("{VERSION_SELECT_SQL} WHERE hash = ?1;"), [hash])
    }

    fn resolve_root(&self, hash: &str, parent_hash: Option<&str>) -> RepoResult<Digest> {
        let Some(parent_hash) = parent_hash else {
            return Ok(hash.to_string());
        };

        let parent_root: Option<String> = self
            .conn
            .query_row(
                "SELECT root_hash FROM versions WHERE hash = ?1;",
                [parent_hash],
                |row| row.get(0),
            )
            .optional()?;

        match parent_root {
            Some(root) => Ok(root),
            None => {
                warn!(
                    "event=version_resolve_root module=repo status=degraded error_code=dangling_parent hash={} parent_hash={}",
                    hash, parent_hash
                );
                Ok(parent_hash.to_string())
            }
        }
    }

    fn append_version(&self, record: &VersionRecord) -> RepoResult<()> {
        if record.action != VersionAction::for_parent(record.parent_hash.as_deref()) {
            return Err(RepoError::InvalidData(format!(
                "version `{}` has action `{}` inconsistent with its parent",
                record.hash,
                record.action.as_str()
            )));
        }

        self.conn.execute(
            "INSERT INTO versions (hash, parent_hash, root_hash, action, timestamp, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, (SELECT COALESCE(MAX(seq), 0) + 1 FROM versions));",
            params![
                record.hash.as_str(),
                record.parent_hash.as_deref(),
                record.root_hash.as_str(),
                record.action.as_str(),
                record.timestamp.as_str(),
            ],
        )?;
        Ok(())
    }

    fn restamp_version(&self, hash: &str, timestamp: &str) -> RepoResult<Option<VersionRecord>> {
        let changed = self.conn.execute(
            "UPDATE versions
             SET timestamp = ?2,
                 seq = (SELECT COALESCE(MAX(seq), 0) + 1 FROM versions)
             WHERE hash = ?1;",
            params![hash, timestamp],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_version(hash)
    }

    fn chain_for(&self, root_hash: &str) -> RepoResult<Vec<VersionRecord>> {
        self.query_versions(
            &format!(
                "{VERSION_SELECT_SQL}
                 WHERE root_hash = ?1
                 ORDER BY timestamp ASC, seq ASC;"
            ),
            [root_hash],
        )
    }

    fn latest_for(&self, root_hash: &str) -> RepoResult<Option<VersionRecord>> {
        self.query_one(
            &format!(
                "{VERSION_SELECT_SQL}
                 WHERE root_hash = ?1
                 ORDER BY timestamp DESC, seq DESC
                 LIMIT 1;"
            ),
            [root_hash],
        )
    }

    fn most_recent_overall(&self) -> RepoResult<Option<VersionRecord>> {
        self.query_one(
            &format!("{VERSION_SELECT_SQL} ORDER BY timestamp DESC, seq DESC LIMIT 1;"),
            [],
        )
    }

    fn list_versions(&self) -> RepoResult<Vec<VersionRecord>> {
        self.query_versions(
            &format!("{VERSION_SELECT_SQL} ORDER BY timestamp ASC, seq ASC;"),
            [],
        )
    }

    fn delete_version(&self, hash: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM versions WHERE hash = ?1;", [hash])?;
        Ok(changed > 0)
    }

    fn clear_versions(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM versions;", [])?)
    }
}

fn parse_version_row(row: &Row<'_>) -> RepoResult<VersionRecord> {
    let hash: String = row.get("hash")?;
    let action_text: String = row.get("action")?;
    let action = VersionAction::parse(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid action `{action_text}` in versions.action for `{hash}`"
        ))
    })?;

    Ok(VersionRecord {
        hash,
        parent_hash: row.get("parent_hash")?,
        timestamp: row.get("timestamp")?,
        action,
        root_hash: row.get("root_hash")?,
    })
}
