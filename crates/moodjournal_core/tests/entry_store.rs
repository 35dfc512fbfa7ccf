use moodjournal_core::db::open_db_in_memory;
use moodjournal_core::{digest, Document, Entry, EntryRepository, RepoError, SqliteEntryRepository};

fn entry_for(document: Document, timestamp: &str) -> Entry {
    let hash = digest(&document).unwrap();
    Entry {
        root_hash: hash.clone(),
        hash,
        content: document,
        timestamp: timestamp.to_string(),
    }
}

fn sample(title: &str) -> Document {
    let mut document = Document::new(title, "body text", "2026-03-01T10:00:00.000Z");
    document.affirmations = vec!["I am enough".to_string()];
    document.mood = "hopeful".to_string();
    document
}

#[test]
fn put_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::new(&conn);
    let entry = entry_for(sample("first"), "2026-03-01T10:00:01.000Z");

    assert!(repo.put_entry(&entry).unwrap());
    let loaded = repo.get_entry(&entry.hash).unwrap().unwrap();
    assert_eq!(loaded, entry);
}

#[test]
fn put_identical_content_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::new(&conn);
    let entry = entry_for(sample("twice"), "2026-03-01T10:00:01.000Z");

    assert!(repo.put_entry(&entry).unwrap());
    assert!(!repo.put_entry(&entry).unwrap());
    assert_eq!(repo.list_entries().unwrap().len(), 1);
}

#[test]
fn put_rejects_hash_that_does_not_match_content() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::new(&conn);
    let mut entry = entry_for(sample("tampered"), "2026-03-01T10:00:01.000Z");
    entry.content.title = "changed after hashing".to_string();

    let err = repo.put_entry(&entry).unwrap_err();
    assert!(matches!(err, RepoError::DigestMismatch { .. }));
    assert!(repo.list_entries().unwrap().is_empty());
}

#[test]
fn put_reports_conflicting_stored_payload() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::new(&conn);
    let entry = entry_for(sample("conflict"), "2026-03-01T10:00:01.000Z");
    conn.execute(
        "INSERT INTO entries (hash, content, timestamp, root_hash) VALUES (?1, '{}', 't', ?1);",
        [entry.hash.as_str()],
    )
    .unwrap();

    let err = repo.put_entry(&entry).unwrap_err();
    assert!(matches!(err, RepoError::ContentConflict(ref hash) if hash == &entry.hash));
}

#[test]
fn get_rejects_corrupted_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::new(&conn);
    let entry = entry_for(sample("corrupt"), "2026-03-01T10:00:01.000Z");
    repo.put_entry(&entry).unwrap();
    conn.execute(
        "UPDATE entries SET content = '{\"title\":\"x\"}' WHERE hash = ?1;",
        [entry.hash.as_str()],
    )
    .unwrap();

    let err = repo.get_entry(&entry.hash).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn get_unknown_hash_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::new(&conn);
    assert!(repo.get_entry("missing").unwrap().is_none());
}

#[test]
fn delete_and_list_by_root() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::new(&conn);
    let first = entry_for(sample("one"), "2026-03-01T10:00:01.000Z");
    let mut second = entry_for(sample("two"), "2026-03-01T10:00:02.000Z");
    second.root_hash = first.hash.clone();
    repo.put_entry(&first).unwrap();
    repo.put_entry(&second).unwrap();

    let under_root = repo.list_entries_for_root(&first.hash).unwrap();
    assert_eq!(under_root.len(), 2);
    assert_eq!(under_root[0].hash, first.hash);

    assert!(repo.delete_entry(&first.hash).unwrap());
    assert!(!repo.delete_entry(&first.hash).unwrap());
    assert_eq!(repo.list_entries().unwrap(), vec![second]);

    assert_eq!(repo.clear_entries().unwrap(), 1);
    assert!(repo.list_entries().unwrap().is_empty());
}
