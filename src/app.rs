//! App Core for watchlog.
//!
//! Wires validated settings into a database, an HTTP history source, and the
//! sync loop that drives them.

use std::path::Path;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::database::connection::Database;
use crate::services::history_source::HttpHistorySource;
use crate::services::record_normalizer::RecordNormalizer;
use crate::services::sync_loop::SyncLoop;
use crate::types::errors::SyncError;
use crate::types::settings::WatchlogSettings;

/// Central application struct owning the sync loop.
pub struct App {
    pub settings: WatchlogSettings,
    pub sync_loop: SyncLoop<HttpHistorySource>,
}

impl App {
    /// Validates `settings`, opens the store, and builds the loop.
    ///
    /// # Errors
    /// `SyncError::ConfigurationError` for invalid settings, an unusable store
    /// path, or an HTTP client that cannot be built. None of these are retried.
    pub fn new(settings: WatchlogSettings) -> Result<Self, SyncError> {
        settings.validate().map_err(SyncError::ConfigurationError)?;

        let store_path = Path::new(&settings.store.path);
        if let Some(parent) = store_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SyncError::ConfigurationError(format!(
                        "cannot create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let db = Database::open(store_path).map_err(|e| {
            SyncError::ConfigurationError(format!(
                "cannot open store {}: {}",
                store_path.display(),
                e
            ))
        })?;

        let source = HttpHistorySource::new(
            &settings.source,
            Duration::from_secs(settings.sync.page_timeout_secs),
        )?;

        info!(store = %store_path.display(), endpoint = source.endpoint(), "Store opened");

        let sync_loop = SyncLoop::new(source, db, RecordNormalizer::local(), &settings.sync);

        Ok(Self {
            settings,
            sync_loop,
        })
    }

    /// Runs the sync loop until `shutdown` fires.
    pub async fn run(&mut self, shutdown: watch::Receiver<bool>) {
        self.sync_loop.run(shutdown).await;
    }
}
