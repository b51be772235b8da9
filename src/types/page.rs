use serde::{Deserialize, Serialize};

/// Continuation token handed back by the history API.
///
/// The default value requests the newest page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cursor {
    #[serde(default)]
    pub max: i64,
    #[serde(default)]
    pub view_at: i64,
    #[serde(default)]
    pub business: String,
}

impl Cursor {
    /// Returns true for the cursor that addresses the newest page.
    pub fn is_start(&self) -> bool {
        self.max == 0 && self.view_at == 0 && self.business.is_empty()
    }
}

/// Per-entry metadata nested under `history` in the API response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawHistoryMeta {
    #[serde(default)]
    pub oid: Option<i64>,
    #[serde(default)]
    pub bvid: Option<String>,
    #[serde(default)]
    pub business: Option<String>,
}

/// One history entry as returned by the remote API, before normalization.
///
/// Every field is optional so a single bad entry never fails a whole page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub view_at: Option<i64>,
    #[serde(default)]
    pub history: Option<RawHistoryMeta>,
}

/// A bounded batch of raw entries plus the cursor for the next batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub entries: Vec<RawEntry>,
    pub next_cursor: Cursor,
    pub has_more: bool,
}
