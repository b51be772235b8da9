//! Property-based tests for WatchlogSettings persistence.
//!
//! Valid settings written by the engine read back unchanged, both through
//! serde directly and through a save/load cycle on disk.

use proptest::prelude::*;
use watchlog::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use watchlog::types::settings::{SourceSettings, StoreSettings, SyncSettings, WatchlogSettings};

fn arb_store() -> impl Strategy<Value = StoreSettings> {
    "/[a-z]{1,8}(/[a-z0-9_]{1,8}){0,3}\\.db".prop_map(|path| StoreSettings { path })
}

fn arb_sync() -> impl Strategy<Value = SyncSettings> {
    (1u64..3600, 1usize..500, 1u64..120).prop_map(|(interval_secs, fetch_count, page_timeout_secs)| {
        SyncSettings {
            interval_secs,
            fetch_count,
            page_timeout_secs,
        }
    })
}

fn arb_source() -> impl Strategy<Value = SourceSettings> {
    (
        "https://[a-z]{3,10}\\.(com|net)",
        "[a-zA-Z0-9/. ]{1,20}",
        proptest::option::of("SESSDATA=[a-f0-9]{8}; bili_jct=[a-f0-9]{8}"),
    )
        .prop_map(|(api_base, user_agent, cookie)| SourceSettings {
            api_base,
            user_agent,
            cookie,
        })
}

fn arb_settings() -> impl Strategy<Value = WatchlogSettings> {
    (arb_store(), arb_sync(), arb_source()).prop_map(|(store, sync, source)| WatchlogSettings {
        store,
        sync,
        source,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn settings_json_roundtrip(settings in arb_settings()) {
        prop_assert!(settings.validate().is_ok());
        let json = serde_json::to_string(&settings).expect("serialize");
        let back: WatchlogSettings = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn set_values_survive_reload(sync in arb_sync()) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json").to_string_lossy().to_string();

        let mut engine = SettingsEngine::new(Some(path.clone()));
        engine.load().expect("load defaults");
        engine.set_value("sync.interval_secs", serde_json::json!(sync.interval_secs)).expect("interval");
        engine.set_value("sync.fetch_count", serde_json::json!(sync.fetch_count)).expect("fetch_count");
        engine.set_value("sync.page_timeout_secs", serde_json::json!(sync.page_timeout_secs)).expect("timeout");

        let mut reloaded = SettingsEngine::new(Some(path));
        let settings = reloaded.load().expect("reload");
        prop_assert_eq!(settings.sync, sync);
    }
}
