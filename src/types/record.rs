use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::SyncError;

/// What kind of activity a history record describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Video,
    Live,
}

impl RecordKind {
    /// Column value stored in the `kind` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Video => "video",
            RecordKind::Live => "live",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(RecordKind::Video),
            "live" => Ok(RecordKind::Live),
            other => Err(SyncError::MalformedRecord(format!(
                "unknown record kind: {}",
                other
            ))),
        }
    }
}

/// One normalized viewing-history entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub title: String,
    /// Content identifier (the BV id for videos). Live rooms have none.
    pub external_id: Option<String>,
    pub url: String,
    /// Local time rendered from `epoch`.
    pub observed_at: String,
    /// Seconds since the UNIX epoch; the ordering key.
    pub epoch: i64,
}

impl Record {
    /// Two records describe the same activity when their URLs match.
    pub fn same_activity(&self, other: &Record) -> bool {
        self.url == other.url
    }
}

/// Records ordered newest first by `epoch`.
///
/// The ordering is established on construction, so code holding a `RecordList`
/// can treat the first element as the head record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordList {
    records: Vec<Record>,
}

impl RecordList {
    /// Builds a list from records in any order.
    ///
    /// Sorting is stable, so records sharing an epoch keep their relative order.
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| b.epoch.cmp(&a.epoch));
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the newest record, if any.
    pub fn head(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Keeps only the `n` newest records.
    pub fn truncate(&mut self, n: usize) {
        self.records.truncate(n);
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl From<Vec<Record>> for RecordList {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl IntoIterator for RecordList {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
