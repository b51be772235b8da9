use serde::{Deserialize, Serialize};

use crate::platform;

/// Top-level settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WatchlogSettings {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub source: SourceSettings,
}

impl WatchlogSettings {
    /// Checks values that would make the sync loop unusable.
    pub fn validate(&self) -> Result<(), String> {
        if self.store.path.trim().is_empty() {
            return Err("store.path must not be empty".to_string());
        }
        if self.sync.interval_secs == 0 {
            return Err("sync.interval_secs must be greater than zero".to_string());
        }
        if self.sync.fetch_count == 0 {
            return Err("sync.fetch_count must be greater than zero".to_string());
        }
        if self.sync.page_timeout_secs == 0 {
            return Err("sync.page_timeout_secs must be greater than zero".to_string());
        }
        if self.source.api_base.trim().is_empty() {
            return Err("source.api_base must not be empty".to_string());
        }
        Ok(())
    }
}

/// Where the history table lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    pub path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: platform::get_data_dir()
                .join("history.db")
                .to_string_lossy()
                .to_string(),
        }
    }
}

/// Timing and sizing of each sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    pub interval_secs: u64,
    pub fetch_count: usize,
    pub page_timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            fetch_count: 10,
            page_timeout_secs: 10,
        }
    }
}

/// Remote API endpoint and session material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSettings {
    pub api_base: String,
    pub user_agent: String,
    /// Raw `Cookie` header value (SESSDATA, bili_jct, buvid3, DedeUserID).
    #[serde(default)]
    pub cookie: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.bilibili.com".to_string(),
            user_agent: format!("watchlog/{}", env!("CARGO_PKG_VERSION")),
            cookie: None,
        }
    }
}
