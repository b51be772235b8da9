// watchlog services
// Services implement the sync pipeline: source, fetcher, normalizer, delta detection, loop, settings.

pub mod delta_detector;
pub mod history_fetcher;
pub mod history_source;
pub mod record_normalizer;
pub mod settings_engine;
pub mod sync_loop;
