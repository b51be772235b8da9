//! History Fetcher for watchlog.
//!
//! Pages through a [`HistorySource`] until enough valid records are collected.

use std::fmt;
use std::time::Duration;

use chrono::TimeZone;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::services::history_source::HistorySource;
use crate::services::record_normalizer::RecordNormalizer;
use crate::types::errors::SyncError;
use crate::types::page::Cursor;
use crate::types::record::RecordList;

/// Entries requested per page.
pub const PAGE_SIZE: usize = 20;

/// Accumulates normalized records across pages.
pub struct HistoryFetcher<'a, S: ?Sized, Tz: TimeZone> {
    source: &'a S,
    normalizer: &'a RecordNormalizer<Tz>,
    page_timeout: Duration,
}

impl<'a, S, Tz> HistoryFetcher<'a, S, Tz>
where
    S: HistorySource + ?Sized,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    pub fn new(source: &'a S, normalizer: &'a RecordNormalizer<Tz>, page_timeout: Duration) -> Self {
        Self {
            source,
            normalizer,
            page_timeout,
        }
    }

    /// Returns the `n` newest valid records, or fewer when the source runs out.
    ///
    /// Malformed entries are skipped and do not count towards `n`.
    ///
    /// # Errors
    /// `UpstreamTimeout` when a page takes longer than the page timeout,
    /// `UpstreamError` for any other source failure. Records gathered from
    /// earlier pages are discarded in both cases.
    pub async fn fetch(&self, n: usize) -> Result<RecordList, SyncError> {
        let mut records = Vec::with_capacity(n);
        let mut cursor = Cursor::default();
        let mut pages = 0usize;

        while records.len() < n {
            let page = match timeout(self.page_timeout, self.source.get_page(&cursor, PAGE_SIZE)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(SyncError::UpstreamTimeout(format!(
                        "page {} took longer than {:?}",
                        pages + 1,
                        self.page_timeout
                    )))
                }
            };
            pages += 1;

            let raw_count = page.entries.len();
            let valid = self.normalizer.normalize_all(&page.entries);
            debug!(page = pages, raw_count, valid = valid.len(), "Fetched history page");
            records.extend(valid);

            if !page.has_more || raw_count == 0 {
                break;
            }
            if page.next_cursor == cursor {
                warn!(page = pages, "Source returned the same cursor; stopping");
                break;
            }
            cursor = page.next_cursor;
        }

        let mut list = RecordList::new(records);
        list.truncate(n);
        Ok(list)
    }
}
