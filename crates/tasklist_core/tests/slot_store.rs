use rusqlite::Connection;
use tasklist_core::db::{open_db, open_db_in_memory};
use tasklist_core::{FileSlotStore, SlotError, SlotStore, SqliteSlotStore};

#[test]
fn sqlite_store_reads_none_then_upserts() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSlotStore::try_new(&conn).unwrap();

    assert_eq!(store.read_slot("todos").unwrap(), None);

    store.write_slot("todos", "[]").unwrap();
    store.write_slot("todos", "[{\"id\":1}]").unwrap();
    store.write_slot("archive", "[]").unwrap();

    assert_eq!(
        store.read_slot("todos").unwrap().as_deref(),
        Some("[{\"id\":1}]")
    );
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM kv_slots;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 2);
}

#[test]
fn sqlite_store_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasklist.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteSlotStore::try_new(&conn).unwrap();
        store.write_slot("todos", "[1]").unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteSlotStore::try_new(&conn).unwrap();
    assert_eq!(store.read_slot("todos").unwrap().as_deref(), Some("[1]"));
}

#[test]
fn sqlite_store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteSlotStore::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        SlotError::UninitializedConnection {
            expected_version: 1,
            actual_version: 0
        }
    ));
}

#[test]
fn sqlite_store_rejects_connection_missing_slot_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();
    let err = SqliteSlotStore::try_new(&conn).err().unwrap();
    assert!(matches!(err, SlotError::MissingSchema("kv_slots")));
}

#[test]
fn sqlite_store_rejects_invalid_keys_before_touching_sql() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSlotStore::try_new(&conn).unwrap();
    assert!(matches!(
        store.write_slot("", "[]"),
        Err(SlotError::InvalidKey(_))
    ));
    assert!(matches!(
        store.read_slot("a/b"),
        Err(SlotError::InvalidKey(_))
    ));
}

#[test]
fn file_store_reports_io_error_when_directory_disappears() {
    let dir = tempfile::tempdir().unwrap();
    let slots = dir.path().join("slots");
    let store = FileSlotStore::open(&slots).unwrap();
    std::fs::remove_dir_all(&slots).unwrap();

    let err = store.write_slot("todos", "[]").unwrap_err();
    assert!(matches!(err, SlotError::Io(_)));
}
