use moodjournal_core::db::open_db_in_memory;
use moodjournal_core::{
    RepoError, SqliteVersionRepository, VersionAction, VersionRecord, VersionRepository,
};

#[test]
fn record_without_parent_is_its_own_root() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVersionRepository::new(&conn);

    assert_eq!(repo.resolve_root("h1", None).unwrap(), "h1");
    let record = VersionRecord::new("h1", None, "h1", "2026-01-01T00:00:00.000Z");
    assert_eq!(record.action, VersionAction::Created);
    assert!(record.is_root());
    repo.append_version(&record).unwrap();

    assert_eq!(repo.get_version("h1").unwrap(), Some(record));
}

#[test]
fn child_inherits_root_of_parent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVersionRepository::new(&conn);
    repo.append_version(&VersionRecord::new("h1", None, "h1", "2026-01-01T00:00:00.000Z"))
        .unwrap();

    let root = repo.resolve_root("h2", Some("h1")).unwrap();
    assert_eq!(root, "h1");
    let second = VersionRecord::new("h2", Some("h1".to_string()), root, "2026-01-01T00:01:00.000Z");
    assert_eq!(second.action, VersionAction::Edited);
    repo.append_version(&second).unwrap();

    assert_eq!(repo.resolve_root("h3", Some("h2")).unwrap(), "h1");
}

#[test]
fn dangling_parent_becomes_root() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVersionRepository::new(&conn);
    assert_eq!(repo.resolve_root("h2", Some("gone")).unwrap(), "gone");
}

#[test]
fn append_rejects_action_inconsistent_with_parent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVersionRepository::new(&conn);
    let mut record = VersionRecord::new("h1", None, "h1", "2026-01-01T00:00:00.000Z");
    record.action = VersionAction::Edited;

    let err = repo.append_version(&record).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn chain_is_ordered_and_latest_uses_insertion_tiebreak() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVersionRepository::new(&conn);
    let same_time = "2026-01-01T00:05:00.000Z";
    repo.append_version(&VersionRecord::new("h1", None, "h1", "2026-01-01T00:00:00.000Z"))
        .unwrap();
    repo.append_version(&VersionRecord::new("hb", Some("h1".to_string()), "h1", same_time))
        .unwrap();
    repo.append_version(&VersionRecord::new("ha", Some("hb".to_string()), "h1", same_time))
        .unwrap();
    repo.append_version(&VersionRecord::new("x1", None, "x1", "2025-12-31T00:00:00.000Z"))
        .unwrap();

    let chain: Vec<_> = repo
        .chain_for("h1")
        .unwrap()
        .into_iter()
        .map(|record| record.hash)
        .collect();
    assert_eq!(chain, vec!["h1", "hb", "ha"]);

    assert_eq!(repo.latest_for("h1").unwrap().unwrap().hash, "ha");
    assert_eq!(repo.latest_for("x1").unwrap().unwrap().hash, "x1");
    assert!(repo.latest_for("nope").unwrap().is_none());
    assert_eq!(repo.most_recent_overall().unwrap().unwrap().hash, "ha");
}

#[test]
fn list_versions_spans_all_roots_in_time_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVersionRepository::new(&conn);
    assert!(repo.most_recent_overall().unwrap().is_none());

    repo.append_version(&VersionRecord::new("b", None, "b", "2026-01-02T00:00:00.000Z"))
        .unwrap();
    repo.append_version(&VersionRecord::new("a", None, "a", "2026-01-01T00:00:00.000Z"))
        .unwrap();

    let hashes: Vec<_> = repo
        .list_versions()
        .unwrap()
        .into_iter()
        .map(|record| record.hash)
        .collect();
    assert_eq!(hashes, vec!["a", "b"]);

    assert!(repo.delete_version("a").unwrap());
    assert!(!repo.delete_version("a").unwrap());
    assert_eq!(repo.clear_versions().unwrap(), 1);
}

#[test]
fn restamp_moves_record_to_latest_without_touching_lineage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVersionRepository::new(&conn);
    let stamp = "2026-01-01T00:05:00.000Z";
    repo.append_version(&VersionRecord::new("h1", None, "h1", "2026-01-01T00:00:00.000Z"))
        .unwrap();
    repo.append_version(&VersionRecord::new("h2", Some("h1".to_string()), "h1", stamp))
        .unwrap();

    let restamped = repo.restamp_version("h1", stamp).unwrap().unwrap();
    assert_eq!(restamped.timestamp, stamp);
    assert!(restamped.parent_hash.is_none());
    assert_eq!(restamped.root_hash, "h1");
    assert_eq!(restamped.action, VersionAction::Created);

    // Same timestamp as h2: the re-stamped record still wins on insertion order.
    assert_eq!(repo.latest_for("h1").unwrap().unwrap().hash, "h1");
    assert_eq!(repo.most_recent_overall().unwrap().unwrap().hash, "h1");
    assert!(repo.restamp_version("missing", stamp).unwrap().is_none());
}
