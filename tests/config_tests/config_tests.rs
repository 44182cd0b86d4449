//! Configuration Tests
//!
//! Tests verify:
//! - Defaults
//! - YAML parsing with partial documents
//! - Environment-style overrides
//! - Validation

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use emberkv::config::{Config, WalSyncStrategy};
use emberkv::EmberError;
use tempfile::TempDir;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.wal_dir, PathBuf::from("./emberkv_data/wal"));
    assert!(!config.use_segmented_logs);
    assert_eq!(config.segment_size, 1000);
    assert_eq!(config.wal_sync_strategy, WalSyncStrategy::EveryWrite);
    assert_eq!(config.memtable_size_limit, 4 * 1024 * 1024);
    assert_eq!(config.listen_addr, "127.0.0.1:6370");
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_yaml_gives_defaults() {
    let config = Config::from_yaml("").unwrap();

    assert_eq!(config.segment_size, Config::default().segment_size);
}

#[test]
fn test_partial_yaml_keeps_other_defaults() {
    let yaml = r#"
wal_dir: /var/lib/emberkv/wal
use_segmented_logs: true
segment_size: 250
wal_sync_strategy:
  mode: every_n_entries
  count: 16
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.wal_dir, PathBuf::from("/var/lib/emberkv/wal"));
    assert!(config.use_segmented_logs);
    assert_eq!(config.segment_size, 250);
    assert_eq!(
        config.wal_sync_strategy,
        WalSyncStrategy::EveryNEntries { count: 16 }
    );
    assert_eq!(config.sst_dir, PathBuf::from("./emberkv_data/sstables"));
    assert_eq!(config.worker_threads, 8);
}

#[test]
fn test_invalid_yaml_is_config_error() {
    let result = Config::from_yaml("segment_size: [not, a, number]");

    assert!(matches!(result, Err(EmberError::Config(_))));
}

#[test]
fn test_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("emberkv.yaml");
    fs::write(&path, "listen_addr: 0.0.0.0:7000\nmemtable_size_limit: 2048\n").unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.listen_addr, "0.0.0.0:7000");
    assert_eq!(config.memtable_size_limit, 2048);
}

#[test]
fn test_missing_explicit_file_is_error() {
    let temp = TempDir::new().unwrap();

    let result = Config::from_file(&temp.path().join("absent.yaml"));

    assert!(matches!(result, Err(EmberError::Config(_))));
}

#[test]
fn test_overrides_apply() {
    let mut config = Config::default();

    config
        .apply_overrides(lookup(&[
            ("EMBERKV_WAL_DIR", "/tmp/wal"),
            ("EMBERKV_USE_SEGMENTED_LOGS", "true"),
            ("EMBERKV_SEGMENT_SIZE", "42"),
            ("EMBERKV_MEMTABLE_SIZE", "1024"),
            ("EMBERKV_LISTEN_ADDR", "127.0.0.1:9999"),
        ]))
        .unwrap();

    assert_eq!(config.wal_dir, PathBuf::from("/tmp/wal"));
    assert!(config.use_segmented_logs);
    assert_eq!(config.segment_size, 42);
    assert_eq!(config.memtable_size_limit, 1024);
    assert_eq!(config.listen_addr, "127.0.0.1:9999");
    // Untouched
    assert_eq!(config.worker_threads, 8);
}

#[test]
fn test_bad_override_value_is_error() {
    let mut config = Config::default();

    let result = config.apply_overrides(lookup(&[("EMBERKV_SEGMENT_SIZE", "lots")]));
    assert!(matches!(result, Err(EmberError::Config(_))));

    let result = config.apply_overrides(lookup(&[("EMBERKV_USE_SEGMENTED_LOGS", "maybe")]));
    assert!(matches!(result, Err(EmberError::Config(_))));
}

#[test]
fn test_validation() {
    let config = Config::builder().worker_threads(0).build();
    assert!(matches!(config.validate(), Err(EmberError::Config(_))));

    let config = Config::builder().wal_dir("").build();
    assert!(matches!(config.validate(), Err(EmberError::Config(_))));

    let config = Config::builder()
        .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 0 })
        .build();
    assert!(matches!(config.validate(), Err(EmberError::Config(_))));
}

#[test]
fn test_builder_data_dir() {
    let config = Config::builder().data_dir("/data/ember").build();

    assert_eq!(config.wal_dir, PathBuf::from("/data/ember/wal"));
    assert_eq!(config.sst_dir, PathBuf::from("/data/ember/sstables"));
}
