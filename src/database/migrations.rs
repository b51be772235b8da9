//! Schema migrations for the watchlog SQLite database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// Safe to call on every startup and before every full read of the store.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Create history table")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Unique (url, epoch) and epoch ordering index")?;
    }

    // The recorded version says nothing about whether the table survived.
    ensure_history_schema(conn)
}

const HISTORY_TABLE_DDL: &str = "
    CREATE TABLE IF NOT EXISTS history (
        kind TEXT NOT NULL,
        title TEXT NOT NULL,
        external_id TEXT,
        url TEXT NOT NULL,
        observed_at TEXT NOT NULL,
        epoch INTEGER NOT NULL
    );
";

const HISTORY_INDEX_DDL: &str = "
    CREATE UNIQUE INDEX IF NOT EXISTS idx_history_url_epoch ON history(url, epoch);
    CREATE INDEX IF NOT EXISTS idx_history_epoch ON history(epoch DESC);
";

/// Recreates the history table and its indexes when they are missing.
fn ensure_history_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(HISTORY_TABLE_DDL)?;
    conn.execute_batch(HISTORY_INDEX_DDL)
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: the history table.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(HISTORY_TABLE_DDL)
}

/// V2: one row per (url, epoch), plus an index for newest-first reads.
///
/// Rows that already violate the constraint are collapsed to the earliest copy
/// before the unique index is built.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "DELETE FROM history
         WHERE rowid NOT IN (SELECT MIN(rowid) FROM history GROUP BY url, epoch);",
    )?;
    conn.execute_batch(HISTORY_INDEX_DDL)
}
