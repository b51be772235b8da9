//! Delta Detector for watchlog.
//!
//! Compares the stored history against a fresh fetch and decides what the store
//! needs: nothing, a timestamp refresh of the head record, or new rows.

use crate::types::record::{Record, RecordList};

/// What a sync cycle should do with a fresh fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing newer than the stored head.
    NoChange,
    /// The stored head is still being watched; move it to the newer time.
    HeadRefresh {
        url: String,
        previous_epoch: i64,
        epoch: i64,
        observed_at: String,
    },
    /// Records newer than the stored head, newest first.
    NewRecords(Vec<Record>),
}

impl Outcome {
    /// Short name used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::NoChange => "no_change",
            Outcome::HeadRefresh { .. } => "head_refresh",
            Outcome::NewRecords(_) => "new_records",
        }
    }

    pub fn is_no_change(&self) -> bool {
        matches!(self, Outcome::NoChange)
    }
}

/// Classifies `fresh` against `old`. Both lists are newest first.
///
/// - An empty `fresh` is always `NoChange`.
/// - An empty `old` takes all of `fresh`.
/// - If the newest fresh record has the stored head's URL and a later epoch, the
///   head is refreshed; the rest of `fresh` is not consulted.
/// - Otherwise the leading run of fresh records newer than the stored head is new.
///
/// Only the head is matched by URL. An older item watched again later comes back
/// as a new record.
pub fn detect(old: &RecordList, fresh: &RecordList) -> Outcome {
    let Some(newest) = fresh.head() else {
        return Outcome::NoChange;
    };

    let Some(head) = old.head() else {
        return Outcome::NewRecords(fresh.as_slice().to_vec());
    };

    if newest.epoch > head.epoch && newest.same_activity(head) {
        return Outcome::HeadRefresh {
            url: head.url.clone(),
            previous_epoch: head.epoch,
            epoch: newest.epoch,
            observed_at: newest.observed_at.clone(),
        };
    }

    let added: Vec<Record> = fresh
        .iter()
        .take_while(|record| record.epoch > head.epoch)
        .cloned()
        .collect();

    if added.is_empty() {
        Outcome::NoChange
    } else {
        Outcome::NewRecords(added)
    }
}
