//! Inverted index from word token to root hashes.
//!
//! # Responsibility
//! - Maintain one posting set per token over document title + description.
//! - Upgrade v1 rows (entry-hash postings) to root-hash postings.
//!
//! # Invariants
//! - Postings are sets; adding an existing root is a no-op.
//! - Token rows are never deleted except by a full clear.
//! - Read paths upgrade legacy rows in memory only; write paths persist the
//!   upgraded shape and drop the legacy field in the same statement.

use crate::model::document::{Digest, Document};
use crate::model::index_record::{upgrade_index_record, IndexRecord, StoredIndexRecord};
use crate::repo::entry_repo::{RepoError, RepoResult};
use crate::search::tokenize::unique_tokens;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeSet, HashMap};

/// Repository interface for the inverted index.
pub trait IndexRepository {
    /// Indexes `document` under `root_hash`. Returns the number of tokens whose
    /// posting set changed.
    fn update_index(
        &self,
        document: &Document,
        entry_hash: &str,
        root_hash: &str,
    ) -> RepoResult<usize>;
    /// Posting set of one token, empty when the token is unknown.
    fn lookup(&self, token: &str) -> RepoResult<BTreeSet<Digest>>;
    fn get_record(&self, word: &str) -> RepoResult<Option<IndexRecord>>;
    /// Removes `root_hash` from the postings of tokens that occur in `removed`
    /// but no longer in any of `remaining`. Only those token rows are read.
    /// Returns the number of postings removed.
    fn prune_root(
        &self,
        root_hash: &str,
        removed: &Document,
        remaining: &[Document],
    ) -> RepoResult<usize>;
    fn clear_index(&self) -> RepoResult<usize>;
}

/// SQLite-backed inverted index.
pub struct SqliteIndexRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIndexRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_stored(&self, word: &str) -> RepoResult<Option<StoredIndexRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT word, entry_hashes, root_hashes FROM search_index WHERE word = ?1;",
                [word],
                read_raw_index_row,
            )
            .optional()?;
        row.map(RawIndexRow::into_stored).transpose()
    }

    fn upgrade(&self, stored: StoredIndexRecord) -> RepoResult<IndexRecord> {
        let mut roots: HashMap<String, String> = HashMap::new();
        if let Some(entry_hashes) = stored.entry_hashes.as_ref() {
            for entry_hash in entry_hashes {
                let root: Option<String> = self
                    .conn
                    .query_row(
                        "SELECT root_hash FROM versions WHERE hash = ?1;",
                        [entry_hash.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(root) = root {
                    roots.insert(entry_hash.clone(), root);
                }
            }
        }

        Ok(upgrade_index_record(stored, |entry_hash| {
            roots.get(entry_hash).cloned()
        }))
    }

    fn write_record(&self, record: &IndexRecord) -> RepoResult<()> {
        let encoded = serde_json::to_string(&record.root_hashes).map_err(|err| {
            RepoError::InvalidData(format!(
                "cannot encode postings for `{}`: {err}",
                record.word
            ))
        })?;
        self.conn.execute(
            "INSERT INTO search_index (word, entry_hashes, root_hashes)
             VALUES (?1, NULL, ?2)
             ON CONFLICT(word) DO UPDATE SET
                root_hashes = excluded.root_hashes,
                entry_hashes = NULL;",
            params![record.word.as_str(), encoded],
        )?;
        Ok(())
    }
}

impl IndexRepository for SqliteIndexRepository<'_> {
    fn update_index(
        &self,
        document: &Document,
        entry_hash: &str,
        root_hash: &str,
    ) -> RepoResult<usize> {
        let mut changed = 0;
        for token in unique_tokens(&document.searchable_text()) {
            let (mut record, was_legacy) = match self.load_stored(&token)? {
                Some(stored) => {
                    let was_legacy = stored.is_legacy();
                    (self.upgrade(stored)?, was_legacy)
                }
                None => (IndexRecord::empty(token.as_str()), false),
            };

            let inserted = record.root_hashes.insert(root_hash.to_string());
            if inserted || was_legacy {
                self.write_record(&record)?;
            }
            if was_legacy {
                info!(
                    "event=index_upgrade module=repo status=ok word_len={}",
                    token.chars().count()
                );
            }
            if inserted {
                changed += 1;
            }
        }

        debug!(
            "event=index_update module=repo status=ok entry_hash={} root_hash={} changed={}",
            entry_hash, root_hash, changed
        );
        Ok(changed)
    }

    fn lookup(&self, token: &str) -> RepoResult<BTreeSet<Digest>> {
        Ok(self
            .get_record(token)?
            .map(|record| record.root_hashes)
            .unwrap_or_default())
    }

    fn get_record(&self, word: &str) -> RepoResult<Option<IndexRecord>> {
        match self.load_stored(word)? {
            Some(stored) => Ok(Some(self.upgrade(stored)?)),
            None => Ok(None),
        }
    }

    fn prune_root(
        &self,
        root_hash: &str,
        removed: &Document,
        remaining: &[Document],
    ) -> RepoResult<usize> {
        let keep: BTreeSet<String> = remaining
            .iter()
            .flat_map(|document| unique_tokens(&document.searchable_text()))
            .collect();

        let mut pruned = 0;
        for word in unique_tokens(&removed.searchable_text()).difference(&keep) {
            let Some(stored) = self.load_stored(word)? else {
                continue;
            };
            let mut record = self.upgrade(stored)?;
            if record.root_hashes.remove(root_hash) {
                self.write_record(&record)?;
                pruned += 1;
            }
        }

        debug!(
            "event=index_prune module=repo status=ok root_hash={} removed={}",
            root_hash, pruned
        );
        Ok(pruned)
    }

    fn clear_index(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM search_index;", [])?)
    }
}

struct RawIndexRow {
    word: String,
    entry_hashes: Option<String>,
    root_hashes: Option<String>,
}

impl RawIndexRow {
    fn into_stored(self) -> RepoResult<StoredIndexRecord> {
        let entry_hashes = decode_postings(&self.word, "entry_hashes", self.entry_hashes)?;
        let root_hashes = decode_postings(&self.word, "root_hashes", self.root_hashes)?;
        Ok(StoredIndexRecord {
            word: self.word,
            entry_hashes,
            root_hashes,
        })
    }
}

fn read_raw_index_row(row: &Row<'_>) -> rusqlite::Result<RawIndexRow> {
    Ok(RawIndexRow {
        word: row.get("word")?,
        entry_hashes: row.get("entry_hashes")?,
        root_hashes: row.get("root_hashes")?,
    })
}

fn decode_postings(
    word: &str,
    column: &str,
    value: Option<String>,
) -> RepoResult<Option<BTreeSet<Digest>>> {
    value
        .map(|text| {
            serde_json::from_str::<BTreeSet<Digest>>(&text).map_err(|err| {
                RepoError::InvalidData(format!(
                    "invalid postings in search_index.{column} for `{word}`: {err}"
                ))
            })
        })
        .transpose()
}
