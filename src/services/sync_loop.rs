//! Sync Loop for watchlog.
//!
//! Runs fetch → detect → persist cycles on a timer. A failed cycle is logged
//! and skipped; only the caller's shutdown signal ends the loop.

use std::fmt;
use std::time::Duration;

use chrono::{Local, TimeZone};
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::database::Database;
use crate::managers::history_store::{HistoryStore, HistoryStoreTrait};
use crate::services::delta_detector::{detect, Outcome};
use crate::services::history_fetcher::HistoryFetcher;
use crate::services::history_source::HistorySource;
use crate::services::record_normalizer::RecordNormalizer;
use crate::types::errors::SyncError;
use crate::types::settings::SyncSettings;

/// Phase of the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Fetching,
    Reconciling,
    Persisting,
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The store was empty when the cycle started.
    pub bootstrap: bool,
    pub fetched: usize,
    pub outcome: Outcome,
    pub inserted: usize,
    pub refreshed: usize,
}

/// Single-writer synchronization loop over one history store.
pub struct SyncLoop<S, Tz: TimeZone = Local> {
    source: S,
    db: Database,
    normalizer: RecordNormalizer<Tz>,
    fetch_count: usize,
    interval: Duration,
    page_timeout: Duration,
    state: SyncState,
    cycles: u64,
}

impl<S, Tz> SyncLoop<S, Tz>
where
    S: HistorySource,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    pub fn new(
        source: S,
        db: Database,
        normalizer: RecordNormalizer<Tz>,
        settings: &SyncSettings,
    ) -> Self {
        Self {
            source,
            db,
            normalizer,
            fetch_count: settings.fetch_count,
            interval: Duration::from_secs(settings.interval_secs),
            page_timeout: Duration::from_secs(settings.page_timeout_secs),
            state: SyncState::Idle,
            cycles: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Number of cycles started by [`SyncLoop::run`].
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn transition(&mut self, next: SyncState) {
        debug!(from = ?self.state, to = ?next, "Sync state change");
        self.state = next;
    }

    /// Runs one cycle to completion.
    ///
    /// The store is only written in the persisting phase, and every write there
    /// is a single transaction or statement.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, SyncError> {
        let old = HistoryStore::new(self.db.connection()).read_all()?;
        let bootstrap = old.is_empty();

        self.transition(SyncState::Fetching);
        let fetched = HistoryFetcher::new(&self.source, &self.normalizer, self.page_timeout)
            .fetch(self.fetch_count)
            .await;
        let fresh = match fetched {
            Ok(fresh) => fresh,
            Err(e) => {
                self.transition(SyncState::Idle);
                return Err(e);
            }
        };

        self.transition(SyncState::Reconciling);
        let outcome = detect(&old, &fresh);
        let mut report = CycleReport {
            bootstrap,
            fetched: fresh.len(),
            outcome,
            inserted: 0,
            refreshed: 0,
        };

        if report.outcome.is_no_change() {
            self.transition(SyncState::Idle);
            return Ok(report);
        }

        self.transition(SyncState::Persisting);
        let persisted = self.persist(&report.outcome);
        self.transition(SyncState::Idle);

        match persisted {
            Ok((inserted, refreshed)) => {
                report.inserted = inserted;
                report.refreshed = refreshed;
                Ok(report)
            }
            Err(e) => Err(e),
        }
    }

    /// Applies an outcome to the store; returns `(inserted, refreshed)` row counts.
    fn persist(&mut self, outcome: &Outcome) -> Result<(usize, usize), SyncError> {
        let mut store = HistoryStore::new(self.db.connection());
        match outcome {
            Outcome::NoChange => Ok((0, 0)),
            Outcome::HeadRefresh {
                url,
                previous_epoch,
                epoch,
                observed_at,
            } => {
                info!(%url, from = previous_epoch, to = epoch, "Current item still in progress; refreshing time");
                let refreshed = store.refresh_head(url, *previous_epoch, *epoch, observed_at)?;
                Ok((0, refreshed))
            }
            Outcome::NewRecords(records) => {
                info!(count = records.len(), "New history records detected");
                let inserted = store.append_many(records)?;
                Ok((inserted, 0))
            }
        }
    }

    /// Runs cycles until `shutdown` turns true or its sender is dropped.
    ///
    /// After a successful bootstrap into an empty store the next cycle starts
    /// immediately; otherwise cycles are `interval` apart.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            fetch_count = self.fetch_count,
            "Sync loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.cycles += 1;
            let span = info_span!("cycle", n = self.cycles);
            let result = self.run_cycle().instrument(span).await;

            let delay = match &result {
                Ok(report) => {
                    if report.outcome.is_no_change() {
                        info!(cycle = self.cycles, "No new history records");
                    } else {
                        info!(
                            cycle = self.cycles,
                            outcome = report.outcome.label(),
                            inserted = report.inserted,
                            refreshed = report.refreshed,
                            "Cycle complete"
                        );
                    }
                    if report.bootstrap && report.inserted > 0 {
                        Duration::ZERO
                    } else {
                        self.interval
                    }
                }
                Err(e) if e.is_retryable() => {
                    warn!(cycle = self.cycles, "Cycle skipped: {}", e);
                    self.interval
                }
                Err(e) => {
                    error!(cycle = self.cycles, "Cycle failed: {}", e);
                    self.interval
                }
            };

            if delay.is_zero() {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(cycles = self.cycles, "Sync loop stopped");
    }
}
