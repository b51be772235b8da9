//! Record Normalizer for watchlog.
//!
//! Turns raw API entries into [`Record`]s: picks the kind, builds the canonical
//! URL, and renders the epoch as a local timestamp.

use std::fmt;

use chrono::{Local, TimeZone};
use tracing::warn;

use crate::types::errors::SyncError;
use crate::types::page::RawEntry;
use crate::types::record::{Record, RecordKind};

/// Prefix of the canonical page for a video, completed by its BV id.
pub const VIDEO_URL_PREFIX: &str = "https://www.bilibili.com/video/";

/// Format of `Record::observed_at`.
pub const OBSERVED_AT_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Business value the API uses for live rooms.
const LIVE_BUSINESS: &str = "live";

/// `value` as given, unless it is missing or only whitespace.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Maps raw entries to records, rendering times in `Tz`.
#[derive(Debug, Clone)]
pub struct RecordNormalizer<Tz: TimeZone = Local> {
    tz: Tz,
}

impl RecordNormalizer<Local> {
    /// Normalizer that renders times in the machine's local zone.
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl Default for RecordNormalizer<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Tz> RecordNormalizer<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    pub fn with_timezone(tz: Tz) -> Self {
        Self { tz }
    }

    /// Renders `epoch` as `YYYY/MM/DD HH:MM:SS` in this normalizer's zone.
    pub fn format_epoch(&self, epoch: i64) -> Result<String, SyncError> {
        self.tz
            .timestamp_opt(epoch, 0)
            .single()
            .map(|dt| dt.format(OBSERVED_AT_FORMAT).to_string())
            .ok_or_else(|| {
                SyncError::MalformedRecord(format!("timestamp out of range: {}", epoch))
            })
    }

    /// Converts one raw entry.
    ///
    /// # Errors
    /// `SyncError::MalformedRecord` when the timestamp or title is missing, or when
    /// the field needed for the URL (BV id for videos, `uri` for live rooms) is absent.
    pub fn normalize(&self, raw: &RawEntry) -> Result<Record, SyncError> {
        let epoch = raw
            .view_at
            .ok_or_else(|| SyncError::MalformedRecord("missing view_at".to_string()))?;

        let title = non_empty(raw.title.as_deref())
            .ok_or_else(|| SyncError::MalformedRecord("missing title".to_string()))?
            .to_string();

        let meta = raw.history.as_ref();
        let kind = match meta.and_then(|m| m.business.as_deref()) {
            Some(LIVE_BUSINESS) => RecordKind::Live,
            _ => RecordKind::Video,
        };

        let (external_id, url) = match kind {
            RecordKind::Video => {
                let bvid = non_empty(meta.and_then(|m| m.bvid.as_deref())).ok_or_else(|| {
                    SyncError::MalformedRecord(format!("video '{}' has no bvid", title))
                })?;
                (Some(bvid.to_string()), format!("{}{}", VIDEO_URL_PREFIX, bvid))
            }
            RecordKind::Live => {
                let uri = non_empty(raw.uri.as_deref()).ok_or_else(|| {
                    SyncError::MalformedRecord(format!("live room '{}' has no uri", title))
                })?;
                (None, uri.to_string())
            }
        };

        let observed_at = self.format_epoch(epoch)?;

        Ok(Record {
            kind,
            title,
            external_id,
            url,
            observed_at,
            epoch,
        })
    }

    /// Converts a page of raw entries, skipping and logging the malformed ones.
    pub fn normalize_all(&self, entries: &[RawEntry]) -> Vec<Record> {
        entries
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| match self.normalize(raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(index, "Skipping history entry: {}", e);
                    None
                }
            })
            .collect()
    }
}
