//! Tests for WAL recovery
//!
//! These tests verify:
//! - Sets and deletes replay into the final key state
//! - Files are applied in the given order
//! - Replay is repeatable
//! - Malformed records abort the replay

use std::fs;

use emberkv::config::WalSyncStrategy;
use emberkv::wal::{RecoveryStats, Wal, WalMode, WalRecovery};
use emberkv::EmberError;
use tempfile::TempDir;

#[test]
fn test_replay_applies_sets_and_deletes() {
    let temp = TempDir::new().unwrap();
    let wal = Wal::open(temp.path(), WalMode::SingleFile, WalSyncStrategy::EveryWrite).unwrap();
    wal.append_set(b"a", b"1").unwrap();
    wal.append_set(b"b", b"2").unwrap();
    wal.append_set(b"a", b"3").unwrap();
    wal.append_delete(b"b").unwrap();
    wal.append_delete(b"never-set").unwrap();

    let (index, stats) = WalRecovery::replay(&wal.segment_paths().unwrap()).unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(index.get(b"a".as_slice()).map(|v| v.as_ref()), Some(b"3".as_slice()));
    assert_eq!(
        stats,
        RecoveryStats {
            files_replayed: 1,
            entries_applied: 5,
            sets: 3,
            deletes: 2,
            live_keys: 1,
        }
    );
}

#[test]
fn test_replay_across_segments_keeps_order() {
    let temp = TempDir::new().unwrap();
    let wal = Wal::open(
        temp.path(),
        WalMode::Segmented { segment_size: 2 },
        WalSyncStrategy::EveryWrite,
    )
    .unwrap();
    for i in 0..7 {
        wal.append_set(b"counter", i.to_string().as_bytes()).unwrap();
    }

    let paths = wal.segment_paths().unwrap();
    assert_eq!(paths.len(), 4);
    let (index, stats) = WalRecovery::replay(&paths).unwrap();

    assert_eq!(stats.files_replayed, 4);
    assert_eq!(index.get(b"counter".as_slice()).map(|v| v.as_ref()), Some(b"6".as_slice()));
}

#[test]
fn test_replay_twice_gives_same_state() {
    let temp = TempDir::new().unwrap();
    let wal = Wal::open(temp.path(), WalMode::SingleFile, WalSyncStrategy::EveryWrite).unwrap();
    wal.append_set(b"x", b"1").unwrap();
    wal.append_set(b"y", b"2").unwrap();
    wal.append_delete(b"x").unwrap();
    let paths = wal.segment_paths().unwrap();

    let (first, _) = WalRecovery::replay(&paths).unwrap();
    let (second, _) = WalRecovery::replay(&paths).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_no_files_gives_empty_index() {
    let (index, stats) = WalRecovery::replay(&[]).unwrap();

    assert!(index.is_empty());
    assert_eq!(stats, RecoveryStats::default());
}

#[test]
fn test_malformed_record_fails_replay() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wal.log");
    fs::write(
        &path,
        "{\"op\":\"SET\",\"key\":\"a\",\"value\":\"1\"}\nthis is not json\n",
    )
    .unwrap();

    let result = WalRecovery::replay(&[path]);
    assert!(matches!(result, Err(EmberError::WalCorruption(_))));
}
