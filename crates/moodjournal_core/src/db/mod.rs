//! Journal database files and schema.
//!
//! A journal lives in one SQLite file. Hosts may pass that file directly or
//! only a data directory, in which case the file is `DEFAULT_DB_FILE_NAME`
//! inside it. Every open runs pending migrations before any table is touched;
//! the applied step is mirrored to `PRAGMA user_version`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// File name used when a host only supplies a data directory.
pub const DEFAULT_DB_FILE_NAME: &str = "moodjournal.sqlite3";

/// Maps a host-supplied location to the journal database file.
///
/// Existing directories resolve to `DEFAULT_DB_FILE_NAME` inside them. Any
/// other path is taken as the database file itself.
pub fn database_path(location: impl AsRef<Path>) -> PathBuf {
    let location = location.as_ref();
    if location.is_dir() {
        location.join(DEFAULT_DB_FILE_NAME)
    } else {
        location.to_path_buf()
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A migration step failed; nothing from the pending batch was kept.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Migration { version, source } => {
                write!(f, "journal schema migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "journal schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
