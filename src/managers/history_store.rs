//! History Store for watchlog.
//!
//! Implements `HistoryStoreTrait`: reading the stored history newest first,
//! appending new records, and refreshing the head record in place, backed by
//! SQLite via `rusqlite`. Values are always bound as parameters; column names
//! only ever come from [`Column`].

use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{params, Connection, ToSql};

use crate::database::migrations;
use crate::types::errors::SyncError;
use crate::types::record::{Record, RecordKind, RecordList};

/// Columns of the `history` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Kind,
    Title,
    ExternalId,
    Url,
    ObservedAt,
    Epoch,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Kind => "kind",
            Column::Title => "title",
            Column::ExternalId => "external_id",
            Column::Url => "url",
            Column::ObservedAt => "observed_at",
            Column::Epoch => "epoch",
        }
    }

    /// Only the time fields of a stored record may change after insertion.
    pub fn is_mutable(&self) -> bool {
        matches!(self, Column::ObservedAt | Column::Epoch)
    }
}

/// A value bound into a `history` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Null,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Text(s) => ToSqlOutput::from(s.as_str()),
            FieldValue::Integer(i) => ToSqlOutput::from(*i),
            FieldValue::Null => ToSqlOutput::Owned(Value::Null),
        })
    }
}

/// Trait defining history store operations.
pub trait HistoryStoreTrait {
    fn read_all(&self) -> Result<RecordList, SyncError>;
    fn append_many(&mut self, records: &[Record]) -> Result<usize, SyncError>;
    fn update_field(
        &mut self,
        match_column: Column,
        match_value: &FieldValue,
        target_column: Column,
        new_value: &FieldValue,
    ) -> Result<usize, SyncError>;
    fn refresh_head(
        &mut self,
        url: &str,
        old_epoch: i64,
        new_epoch: i64,
        observed_at: &str,
    ) -> Result<usize, SyncError>;
    fn count(&self) -> Result<usize, SyncError>;
}

/// History store backed by a SQLite connection.
pub struct HistoryStore<'a> {
    conn: &'a Connection,
}

impl<'a> HistoryStore<'a> {
    /// Creates a new `HistoryStore` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
        let kind: String = row.get(0)?;
        let kind = kind.parse::<RecordKind>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Record {
            kind,
            title: row.get(1)?,
            external_id: row.get(2)?,
            url: row.get(3)?,
            observed_at: row.get(4)?,
            epoch: row.get(5)?,
        })
    }
}

fn persistence(e: rusqlite::Error) -> SyncError {
    SyncError::PersistenceError(e.to_string())
}

impl<'a> HistoryStoreTrait for HistoryStore<'a> {
    /// Returns every stored record, newest first. Creates the table when missing.
    fn read_all(&self) -> Result<RecordList, SyncError> {
        migrations::run_all(self.conn).map_err(persistence)?;

        let mut stmt = self
            .conn
            .prepare(
                "SELECT kind, title, external_id, url, observed_at, epoch \
                 FROM history ORDER BY epoch DESC, rowid ASC",
            )
            .map_err(persistence)?;

        let rows = stmt.query_map([], Self::row_to_record).map_err(persistence)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(persistence)?);
        }
        Ok(RecordList::new(records))
    }

    /// Inserts the records in one transaction and returns how many rows were added.
    ///
    /// A record whose `(url, epoch)` is already stored is skipped. Any other
    /// failure rolls the whole batch back.
    fn append_many(&mut self, records: &[Record]) -> Result<usize, SyncError> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction().map_err(persistence)?;
        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO history \
                     (kind, title, external_id, url, observed_at, epoch) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(persistence)?;

            for record in records {
                inserted += stmt
                    .execute(params![
                        record.kind.as_str(),
                        record.title,
                        record.external_id,
                        record.url,
                        record.observed_at,
                        record.epoch,
                    ])
                    .map_err(persistence)?;
            }
        }
        tx.commit().map_err(persistence)?;
        Ok(inserted)
    }

    /// Sets `target_column` on the most recent row whose `match_column` equals
    /// `match_value`, i.e. the first match in [`read_all`](Self::read_all)
    /// order. Returns the number of rows changed, which is 0 when nothing matches.
    fn update_field(
        &mut self,
        match_column: Column,
        match_value: &FieldValue,
        target_column: Column,
        new_value: &FieldValue,
    ) -> Result<usize, SyncError> {
        if !target_column.is_mutable() {
            return Err(SyncError::PersistenceError(format!(
                "column '{}' cannot be updated",
                target_column.as_str()
            )));
        }

        let sql = format!(
            "UPDATE history SET {target} = ?1 WHERE rowid = (\
                 SELECT rowid FROM history WHERE {matched} = ?2 \
                 ORDER BY epoch DESC, rowid ASC LIMIT 1)",
            target = target_column.as_str(),
            matched = match_column.as_str(),
        );
        self.conn
            .execute(&sql, params![new_value, match_value])
            .map_err(persistence)
    }

    /// Moves the stored head record `(url, old_epoch)` to `new_epoch` and its
    /// formatted time in a single statement.
    fn refresh_head(
        &mut self,
        url: &str,
        old_epoch: i64,
        new_epoch: i64,
        observed_at: &str,
    ) -> Result<usize, SyncError> {
        self.conn
            .execute(
                "UPDATE history SET epoch = ?1, observed_at = ?2 WHERE url = ?3 AND epoch = ?4",
                params![new_epoch, observed_at, url, old_epoch],
            )
            .map_err(persistence)
    }

    fn count(&self) -> Result<usize, SyncError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))
            .map_err(persistence)?;
        Ok(n as usize)
    }
}
