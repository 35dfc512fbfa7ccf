//! Core storage engine for the mood journal.
//! Content-addressed entries, per-document version chains and an inverted
//! keyword index, kept consistent behind one transaction envelope.

pub mod config;
pub mod content;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{DefaultParentPolicy, StoreConfig};
pub use content::hasher::{digest, DigestError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Digest, Document, Entry};
pub use model::index_record::IndexRecord;
pub use model::version::{VersionAction, VersionRecord};
pub use repo::entry_repo::{EntryRepository, RepoError, RepoResult, SqliteEntryRepository};
pub use repo::index_repo::{IndexRepository, SqliteIndexRepository};
pub use repo::version_repo::{SqliteVersionRepository, VersionRepository};
pub use search::coordinator::{search_entries, SearchError, SearchQuery, SearchResult};
pub use search::tokenize::tokenize;
pub use service::journal_store::{
    now_timestamp, DeleteOutcome, JournalError, JournalResult, JournalStore, SaveReceipt,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
