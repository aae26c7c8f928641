//! Integration tests for practice statistics persistence
//!
//! Covers the full save/load/export/merge cycle with real files, plus
//! the corruption fallback path.

use chrono::{Local, TimeZone};

use metrobeat::{StatsStore, format_duration};

fn at(secs: i64) -> chrono::DateTime<Local> {
    Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");

    let (mut store, recovered) = StatsStore::load(path.clone());
    assert!(recovered.is_none(), "missing file is not corruption");

    store.start_session(at(0));
    store.end_session(at(300));
    store.save().unwrap();

    let (reloaded, recovered) = StatsStore::load(path);
    assert!(recovered.is_none());
    assert_eq!(reloaded.data(), store.data());

    let day = reloaded.data().values().next().unwrap();
    assert_eq!(day.total_duration_ms, 300_000);
    assert_eq!(format_duration(day.total_duration_ms), "00:05:00");
}

#[test]
fn test_corrupt_file_falls_back_to_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    std::fs::write(&path, "definitely not json").unwrap();

    let (store, recovered) = StatsStore::load(path.clone());
    assert!(store.data().is_empty());
    assert!(recovered.is_some(), "the swallowed error is reported");

    // The store remains usable and can overwrite the corrupt file
    let mut store = store;
    store.start_session(at(0));
    store.end_session(at(60));
    store.save().unwrap();

    let (reloaded, recovered) = StatsStore::load(path);
    assert!(recovered.is_none());
    assert_eq!(reloaded.data().len(), 1);
}

#[test]
fn test_export_import_merge_doubles_counts() {
    let mut store = StatsStore::in_memory();
    store.start_session(at(0));
    store.end_session(at(120));
    store.start_session(at(500));
    store.end_session(at(560));

    let export = store.export().unwrap();

    // Merging one's own export is not idempotent by design: sessions
    // concatenate and totals double
    store.import_merge(&export).unwrap();
    let day = store.data().values().next().unwrap();
    assert_eq!(day.sessions.len(), 4);
    assert_eq!(day.total_duration_ms, 2 * 180_000);

    // A second import doubles again
    store.import_merge(&export).unwrap();
    let day = store.data().values().next().unwrap();
    assert_eq!(day.sessions.len(), 6);
    assert_eq!(day.total_duration_ms, 3 * 180_000);
}

#[test]
fn test_merge_brings_in_unknown_dates() {
    let mut store = StatsStore::in_memory();
    store.start_session(at(0));
    store.end_session(at(60));

    let export = store.export().unwrap();

    let mut other = StatsStore::in_memory();
    other.start_session(at(200_000)); // a later day
    other.end_session(at(200_060));
    other.import_merge(&export).unwrap();

    assert_eq!(other.data().len(), 2);
}

#[test]
fn test_malformed_import_applies_nothing() {
    let mut store = StatsStore::in_memory();
    store.start_session(at(0));
    store.end_session(at(60));
    let before = store.export().unwrap();

    assert!(store.import_merge("").is_err());
    assert!(store.import_merge("{\"2024-01-01\": 42}").is_err());
    assert!(store.import_merge("[]").is_err());

    assert_eq!(store.export().unwrap(), before);
}
