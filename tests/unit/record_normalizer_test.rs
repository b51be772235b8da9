//! Unit tests for RecordNormalizer: kind mapping, URL construction, time
//! rendering, and rejection of malformed entries.

#[path = "../common/mod.rs"]
mod common;

use chrono::FixedOffset;
use common::{raw_live, raw_video, utc_normalizer};
use rstest::rstest;
use watchlog::services::record_normalizer::RecordNormalizer;
use watchlog::types::errors::SyncError;
use watchlog::types::page::RawEntry;
use watchlog::types::record::RecordKind;

#[test]
fn test_video_entry() {
    let record = utc_normalizer().normalize(&raw_video("BV1GJ411x7h7", 1700000000)).unwrap();

    assert_eq!(record.kind, RecordKind::Video);
    assert_eq!(record.title, "Video BV1GJ411x7h7");
    assert_eq!(record.external_id.as_deref(), Some("BV1GJ411x7h7"));
    assert_eq!(record.url, "https://www.bilibili.com/video/BV1GJ411x7h7");
    assert_eq!(record.observed_at, "2023/11/14 22:13:20");
    assert_eq!(record.epoch, 1700000000);
}

#[test]
fn test_live_entry_uses_direct_uri() {
    let record = utc_normalizer().normalize(&raw_live(21452505, 1700000000)).unwrap();

    assert_eq!(record.kind, RecordKind::Live);
    assert_eq!(record.url, "https://live.bilibili.com/21452505");
    assert_eq!(record.external_id, None);
}

#[test]
fn test_title_and_live_uri_stored_as_received() {
    let mut video = raw_video("BV1", 10);
    video.title = Some("  spaced title ".to_string());
    let mut live = raw_live(7, 20);
    live.uri = Some(" https://live.bilibili.com/7".to_string());

    let normalizer = utc_normalizer();

    assert_eq!(normalizer.normalize(&video).unwrap().title, "  spaced title ");
    assert_eq!(
        normalizer.normalize(&live).unwrap().url,
        " https://live.bilibili.com/7"
    );
}

#[rstest]
#[case(Some("archive"), RecordKind::Video)]
#[case(Some("pgc"), RecordKind::Video)]
#[case(Some("article"), RecordKind::Video)]
#[case(None, RecordKind::Video)]
#[case(Some("live"), RecordKind::Live)]
fn test_business_maps_to_kind(#[case] business: Option<&str>, #[case] expected: RecordKind) {
    let mut raw = raw_video("BV1", 10);
    raw.uri = Some("https://live.bilibili.com/1".to_string());
    raw.history.as_mut().unwrap().business = business.map(str::to_string);

    assert_eq!(utc_normalizer().normalize(&raw).unwrap().kind, expected);
}

#[test]
fn test_time_rendered_in_normalizer_zone() {
    let tz = FixedOffset::east_opt(8 * 3600).unwrap();
    let normalizer = RecordNormalizer::with_timezone(tz);

    assert_eq!(normalizer.format_epoch(0).unwrap(), "1970/01/01 08:00:00");
}

fn without_view_at() -> RawEntry {
    RawEntry { view_at: None, ..raw_video("BV1", 10) }
}

fn without_title() -> RawEntry {
    RawEntry { title: None, ..raw_video("BV1", 10) }
}

fn blank_title() -> RawEntry {
    RawEntry { title: Some("   ".to_string()), ..raw_video("BV1", 10) }
}

fn video_without_bvid() -> RawEntry {
    let mut raw = raw_video("BV1", 10);
    raw.history.as_mut().unwrap().bvid = Some(String::new());
    raw
}

fn video_without_history() -> RawEntry {
    RawEntry { history: None, ..raw_video("BV1", 10) }
}

fn live_without_uri() -> RawEntry {
    RawEntry { uri: None, ..raw_live(7, 10) }
}

fn out_of_range_time() -> RawEntry {
    RawEntry { view_at: Some(i64::MAX), ..raw_video("BV1", 10) }
}

#[rstest]
#[case::missing_timestamp(without_view_at())]
#[case::missing_title(without_title())]
#[case::blank_title(blank_title())]
#[case::video_without_bvid(video_without_bvid())]
#[case::video_without_history(video_without_history())]
#[case::live_without_uri(live_without_uri())]
#[case::out_of_range_time(out_of_range_time())]
#[case::empty_entry(RawEntry::default())]
fn test_malformed_entries_rejected(#[case] raw: RawEntry) {
    assert!(matches!(
        utc_normalizer().normalize(&raw),
        Err(SyncError::MalformedRecord(_))
    ));
}

#[test]
fn test_normalize_all_skips_only_malformed_entries() {
    let entries = vec![
        raw_video("BV3", 300),
        without_view_at(),
        raw_live(2, 200),
        RawEntry::default(),
        raw_video("BV1", 100),
    ];

    let records = utc_normalizer().normalize_all(&entries);

    let epochs: Vec<i64> = records.iter().map(|r| r.epoch).collect();
    assert_eq!(epochs, vec![300, 200, 100]);
}
