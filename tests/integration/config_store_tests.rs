//! Integration tests for config persistence through `StoredConfig`.
//!
//! Uses an in-memory `StoragePort` so the postcard blob path is the same
//! one the board runs against NVS.

use hydrapurr::adapters::storage::StoredConfig;
use hydrapurr::app::ports::{ConfigError, ConfigPort, StoragePort};
use hydrapurr::config::{SubjectEntry, SystemConfig};

use super::mock_hw::MockStorage;

#[test]
fn fresh_storage_yields_defaults() {
    let store = StoredConfig::new(MockStorage::default());
    assert_eq!(store.load().unwrap(), SystemConfig::default());
}

#[test]
fn subjects_and_timings_survive_round_trip() {
    let mut store = StoredConfig::new(MockStorage::default());
    let mut cfg = SystemConfig::default();
    cfg.lick.max_bout_gap_ms = 2_500;
    cfg.reader.reset_on_success = true;
    cfg.subjects.push(SubjectEntry {
        tag_key: "ABCDEF0123456789ABCDEF0123".into(),
        name: "mia".into(),
    });

    store.save(&cfg).unwrap();
    assert_eq!(store.load().unwrap(), cfg);
}

#[test]
fn invalid_config_is_rejected_before_write() {
    let mut store = StoredConfig::new(MockStorage::default());
    let mut cfg = SystemConfig::default();
    cfg.subjects[0].tag_key = "not-hex".into();

    assert!(matches!(
        store.save(&cfg),
        Err(ConfigError::ValidationFailed(_))
    ));
    assert_eq!(store.storage().writes, 0);
}

#[test]
fn truncated_blob_reports_corruption() {
    let mut store = StoredConfig::new(MockStorage::default());
    store.save(&SystemConfig::default()).unwrap();

    let mut buf = [0u8; 2048];
    let len = store.storage().read("hydrapurr", "syscfg", &mut buf).unwrap();
    store
        .storage_mut()
        .write("hydrapurr", "syscfg", &buf[..len / 2])
        .unwrap();

    assert_eq!(store.load(), Err(ConfigError::Corrupted));
}

#[test]
fn clear_falls_back_to_defaults() {
    let mut store = StoredConfig::new(MockStorage::default());
    let mut cfg = SystemConfig::default();
    cfg.poll_interval_ms = 25;
    store.save(&cfg).unwrap();

    store.clear().unwrap();
    assert!(!store.storage().exists("hydrapurr", "syscfg"));
    assert_eq!(store.load().unwrap(), SystemConfig::default());
}
