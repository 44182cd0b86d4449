//! MemTable Tests
//!
//! Tests verify:
//! - Basic set/get operations
//! - Size tracking across inserts and updates
//! - Sorted iteration
//! - Visitor errors stopping iteration
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use emberkv::memtable::MemTable;
use emberkv::EmberError;

fn set(memtable: &MemTable, key: &str, value: &str) -> usize {
    memtable.set(key.as_bytes().to_vec(), Bytes::copy_from_slice(value.as_bytes()))
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.entry_count(), 0);
    assert_eq!(memtable.size(), 0);
    assert!(memtable.is_empty());
}

#[test]
fn test_set_and_get() {
    let memtable = MemTable::new();

    set(&memtable, "key1", "value1");

    assert_eq!(memtable.get(b"key1"), Some(Bytes::from_static(b"value1")));
    assert_eq!(memtable.get(b"nonexistent"), None);
}

#[test]
fn test_set_overwrites_existing() {
    let memtable = MemTable::new();

    set(&memtable, "key", "old");
    set(&memtable, "key", "new");

    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get(b"key"), Some(Bytes::from_static(b"new")));
}

#[test]
fn test_empty_value_is_stored() {
    let memtable = MemTable::new();

    set(&memtable, "key", "");

    assert_eq!(memtable.get(b"key"), Some(Bytes::new()));
    assert!(!memtable.is_empty());
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_size_counts_key_and_value() {
    let memtable = MemTable::new();

    assert_eq!(set(&memtable, "abc", "12345"), 8);
    assert_eq!(set(&memtable, "k", "v"), 10);
    assert_eq!(memtable.size(), 10);
}

#[test]
fn test_update_adjusts_by_value_delta() {
    let memtable = MemTable::new();

    set(&memtable, "key", "short");
    assert_eq!(memtable.size(), 8);

    // Longer value grows by the difference only
    assert_eq!(set(&memtable, "key", "much longer"), 14);

    // Shorter value shrinks it again
    assert_eq!(set(&memtable, "key", "x"), 4);
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_iterate_in_sorted_order() {
    let memtable = MemTable::new();
    set(&memtable, "charlie", "3");
    set(&memtable, "alpha", "1");
    set(&memtable, "bravo", "2");

    let mut seen = Vec::new();
    memtable
        .iterate(|key, value| {
            seen.push((key.to_vec(), value.to_vec()));
            Ok(())
        })
        .unwrap();

    assert_eq!(
        seen,
        vec![
            (b"alpha".to_vec(), b"1".to_vec()),
            (b"bravo".to_vec(), b"2".to_vec()),
            (b"charlie".to_vec(), b"3".to_vec()),
        ]
    );
}

#[test]
fn test_iterate_uses_bytewise_order() {
    let memtable = MemTable::new();
    set(&memtable, "b", "");
    set(&memtable, "B", "");
    set(&memtable, "a", "");
    set(&memtable, "10", "");
    set(&memtable, "9", "");

    let mut keys = Vec::new();
    memtable
        .iterate(|key, _| {
            keys.push(String::from_utf8(key.to_vec()).unwrap());
            Ok(())
        })
        .unwrap();

    assert_eq!(keys, vec!["10", "9", "B", "a", "b"]);
}

#[test]
fn test_iterate_stops_at_first_error() {
    let memtable = MemTable::new();
    for key in ["a", "b", "c", "d"] {
        set(&memtable, key, "v");
    }

    let mut visited = 0;
    let result = memtable.iterate(|key, _| {
        visited += 1;
        if key == b"b" {
            return Err(EmberError::Storage("stop".to_string()));
        }
        Ok(())
    });

    assert!(matches!(result, Err(EmberError::Storage(_))));
    assert_eq!(visited, 2);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_and_readers() {
    let memtable = Arc::new(MemTable::new());
    let mut handles = Vec::new();

    for t in 0..4 {
        let memtable = Arc::clone(&memtable);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let key = format!("t{}-k{:03}", t, i);
                memtable.set(key.clone().into_bytes(), Bytes::from(key.clone()));
                assert_eq!(memtable.get(key.as_bytes()), Some(Bytes::from(key)));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memtable.entry_count(), 400);
    // Each key and value are 7 bytes
    assert_eq!(memtable.size(), 400 * 14);
}
