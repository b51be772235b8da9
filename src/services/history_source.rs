//! History Source for watchlog.
//!
//! Defines the `HistorySource` seam the fetcher pages through, and the
//! `HttpHistorySource` implementation that talks to the cursor-paginated
//! viewing-history endpoint. Session cookies are owned here and never leave
//! this module.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::types::errors::SyncError;
use crate::types::page::{Cursor, HistoryPage, RawEntry};
use crate::types::settings::SourceSettings;

/// Path of the cursor-paginated history endpoint, relative to the API base.
pub const HISTORY_CURSOR_PATH: &str = "/x/web-interface/history/cursor";

/// Trait defining a paginated source of raw history entries.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Returns up to `page_size` entries starting at `cursor`.
    async fn get_page(&self, cursor: &Cursor, page_size: usize) -> Result<HistoryPage, SyncError>;
}

#[async_trait]
impl<S: HistorySource + ?Sized> HistorySource for Arc<S> {
    async fn get_page(&self, cursor: &Cursor, page_size: usize) -> Result<HistoryPage, SyncError> {
        (**self).get_page(cursor, page_size).await
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<CursorData>,
}

#[derive(Debug, Deserialize)]
struct CursorData {
    #[serde(default)]
    cursor: Option<Cursor>,
    #[serde(default)]
    list: Option<Vec<serde_json::Value>>,
}

/// Decodes one response body into a page.
///
/// Entries that do not match the expected shape are kept as empty entries so the
/// normalizer can reject them individually instead of failing the whole page.
pub fn decode_page(body: &str) -> Result<HistoryPage, SyncError> {
    let envelope: ApiEnvelope = serde_json::from_str(body)
        .map_err(|e| SyncError::UpstreamError(format!("invalid response body: {}", e)))?;

    if envelope.code != 0 {
        return Err(SyncError::UpstreamError(format!(
            "API returned code {}: {}",
            envelope.code, envelope.message
        )));
    }

    let data = envelope
        .data
        .ok_or_else(|| SyncError::UpstreamError("response has no data".to_string()))?;

    let entries: Vec<RawEntry> = data
        .list
        .unwrap_or_default()
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                debug!("Undecodable history entry: {}", e);
                RawEntry::default()
            })
        })
        .collect();

    let next_cursor = data.cursor.unwrap_or_default();
    let has_more = !entries.is_empty() && next_cursor.max != 0;

    Ok(HistoryPage {
        entries,
        next_cursor,
        has_more,
    })
}

fn transport(e: reqwest::Error) -> SyncError {
    if e.is_timeout() {
        SyncError::UpstreamTimeout(e.to_string())
    } else {
        SyncError::UpstreamError(e.to_string())
    }
}

/// History source backed by the remote HTTP API.
pub struct HttpHistorySource {
    client: reqwest::Client,
    endpoint: String,
    cookie: Option<String>,
}

impl HttpHistorySource {
    /// Builds a client for `settings.api_base` whose requests give up after `timeout`.
    pub fn new(settings: &SourceSettings, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::ConfigurationError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}{}",
                settings.api_base.trim_end_matches('/'),
                HISTORY_CURSOR_PATH
            ),
            cookie: settings.cookie.clone().filter(|c| !c.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl HistorySource for HttpHistorySource {
    async fn get_page(&self, cursor: &Cursor, page_size: usize) -> Result<HistoryPage, SyncError> {
        let mut request = self.client.get(&self.endpoint).query(&[
            ("ps", page_size.to_string()),
            ("max", cursor.max.to_string()),
            ("view_at", cursor.view_at.to_string()),
            ("business", cursor.business.clone()),
        ]);
        if let Some(cookie) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, cookie.as_str());
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UpstreamError(format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(transport)?;
        decode_page(&body)
    }
}
