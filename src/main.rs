//! watchlog daemon: keeps a local SQLite copy of the remote viewing history.
//!
//! Settings come from `settings.json` in the platform config directory (or the
//! file named by `WATCHLOG_CONFIG`), with `WATCHLOG_DB_PATH` and
//! `WATCHLOG_INTERVAL_SECS` taking precedence. Logging follows `RUST_LOG`.

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use watchlog::app::App;
use watchlog::services::settings_engine::{SettingsEngine, SettingsEngineTrait, ENV_CONFIG};
use watchlog::types::errors::SyncError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("watchlog=info")),
        )
        .init();

    let mut engine = SettingsEngine::new(std::env::var(ENV_CONFIG).ok());
    let settings = engine
        .load()
        .and_then(|_| engine.apply_overrides(|key| std::env::var(key).ok()))
        .map(|_| engine.get_settings().clone())
        .map_err(SyncError::from);

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            error!(config = engine.get_config_path(), "{}", e);
            return Err(e.into());
        }
    };

    info!(config = engine.get_config_path(), "Starting watchlog");

    let mut app = match App::new(settings) {
        Ok(app) => app,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => {
                error!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
        let _ = shutdown_tx.send(true);
    });

    app.run(shutdown_rx).await;
    Ok(())
}
