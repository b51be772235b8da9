//! Unit tests for the watchlog database layer (connection + migrations).

use watchlog::database::migrations::{self, CURRENT_SCHEMA_VERSION};
use watchlog::database::Database;

fn object_exists(conn: &rusqlite::Connection, kind: &str, name: &str) -> bool {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = ?1 AND name = ?2",
        [kind, name],
        |row| row.get(0),
    )
    .unwrap_or(false)
}

#[test]
fn test_open_in_memory_succeeds() {
    assert!(Database::open_in_memory().is_ok());
}

#[test]
fn test_migrations_create_history_table_and_indexes() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();

    assert!(object_exists(conn, "table", "history"));
    assert!(object_exists(conn, "table", "schema_version"));
    assert!(object_exists(conn, "index", "idx_history_url_epoch"));
    assert!(object_exists(conn, "index", "idx_history_epoch"));
}

#[test]
fn test_run_all_restores_dropped_history_at_current_version() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.connection();
    conn.execute_batch("DROP TABLE history;").unwrap();

    migrations::run_all(conn).unwrap();

    assert!(object_exists(conn, "table", "history"));
    assert!(object_exists(conn, "index", "idx_history_url_epoch"));
    assert!(object_exists(conn, "index", "idx_history_epoch"));
    assert_eq!(migrations::get_schema_version(conn), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_history_columns() {
    let db = Database::open_in_memory().unwrap();
    let mut stmt = db.connection().prepare("PRAGMA table_info(history)").unwrap();
    let columns: Vec<(String, bool)> = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, bool>(3)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(
        columns,
        vec![
            ("kind".to_string(), true),
            ("title".to_string(), true),
            ("external_id".to_string(), false),
            ("url".to_string(), true),
            ("observed_at".to_string(), true),
            ("epoch".to_string(), true),
        ]
    );
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(
        migrations::get_schema_version(db.connection()),
        CURRENT_SCHEMA_VERSION
    );
}

#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    assert!(migrations::run_all(db.connection()).is_ok());
    assert_eq!(
        migrations::get_schema_version(db.connection()),
        CURRENT_SCHEMA_VERSION
    );
}

#[test]
fn test_unique_url_epoch_is_enforced() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.connection();
    let insert = "INSERT INTO history (kind, title, url, observed_at, epoch) \
                  VALUES ('video', 't', 'https://a', 'x', 10)";
    conn.execute(insert, []).unwrap();
    assert!(conn.execute(insert, []).is_err());
}

#[test]
fn test_v2_collapses_existing_duplicates() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE history (
             kind TEXT NOT NULL, title TEXT NOT NULL, external_id TEXT,
             url TEXT NOT NULL, observed_at TEXT NOT NULL, epoch INTEGER NOT NULL);
         INSERT INTO history VALUES ('video', 'first', NULL, 'https://a', 'x', 10);
         INSERT INTO history VALUES ('video', 'second', NULL, 'https://a', 'x', 10);
         INSERT INTO history VALUES ('video', 'other', NULL, 'https://b', 'x', 10);",
    )
    .unwrap();

    migrations::run_all(&conn).unwrap();

    let titles: Vec<String> = conn
        .prepare("SELECT title FROM history ORDER BY rowid")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(titles, vec!["first".to_string(), "other".to_string()]);
}

#[test]
fn test_open_file_database_persists_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("history.db");

    {
        let db = Database::open(&db_path).expect("open file db failed");
        db.connection()
            .execute(
                "INSERT INTO history (kind, title, url, observed_at, epoch) \
                 VALUES ('live', 'room', 'https://live/1', 'x', 5)",
                [],
            )
            .unwrap();
    }

    let db = Database::open(&db_path).expect("reopen file db failed");
    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
