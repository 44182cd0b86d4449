//! Tests for SSTable files
//!
//! These tests verify:
//! - The exact on-disk layout
//! - File naming
//! - Sequential iteration and truncated files

use std::fs;
use std::path::{Path, PathBuf};

use emberkv::storage::{sstable_path, SSTableBuilder, SSTableIterator};
use emberkv::EmberError;
use tempfile::TempDir;

fn write_table(dir: &Path, id: u64, entries: &[(&str, &str)]) -> PathBuf {
    let mut builder = SSTableBuilder::create(dir, id).unwrap();
    for (key, value) in entries {
        builder.write_entry(key.as_bytes(), value.as_bytes()).unwrap();
    }
    builder.finish().unwrap().path
}

#[test]
fn test_table_name_is_zero_padded() {
    let path = sstable_path(Path::new("/data"), 7);
    assert!(path.ends_with("sstable_000007.sst"));

    let path = sstable_path(Path::new("/data"), 1234567);
    assert!(path.ends_with("sstable_1234567.sst"));
}

#[test]
fn test_exact_bytes_on_disk() {
    let temp = TempDir::new().unwrap();
    let path = write_table(
        temp.path(),
        0,
        &[("key1", "value1"), ("key2", "value2")],
    );

    let mut expected = Vec::new();
    for (key, value) in [(b"key1", b"value1"), (b"key2", b"value2")] {
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(key);
        expected.extend_from_slice(&6u32.to_le_bytes());
        expected.extend_from_slice(value);
    }
    assert_eq!(fs::read(&path).unwrap(), expected);
    assert_eq!(expected.len(), 36);
}

#[test]
fn test_finish_reports_size_and_id() {
    let temp = TempDir::new().unwrap();
    let mut builder = SSTableBuilder::create(temp.path(), 3).unwrap();
    builder.write_entry(b"a", b"").unwrap();
    builder.write_entry(b"bb", b"ccc").unwrap();
    assert_eq!(builder.entry_count(), 2);

    let table = builder.finish().unwrap();
    assert_eq!(table.id, 3);
    assert_eq!(table.path, sstable_path(temp.path(), 3));
    assert_eq!(table.file_size, fs::metadata(&table.path).unwrap().len());
    assert_eq!(table.file_size, (4 + 1 + 4) + (4 + 2 + 4 + 3));
}

#[test]
fn test_iterator_returns_entries_in_file_order() {
    let temp = TempDir::new().unwrap();
    let path = write_table(
        temp.path(),
        0,
        &[("apple", "red"), ("banana", ""), ("cherry", "dark red")],
    );

    let entries: Vec<_> = SSTableIterator::open(&path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        entries,
        vec![
            (b"apple".to_vec(), b"red".to_vec()),
            (b"banana".to_vec(), Vec::new()),
            (b"cherry".to_vec(), b"dark red".to_vec()),
        ]
    );
}

#[test]
fn test_iterator_on_empty_file() {
    let temp = TempDir::new().unwrap();
    let path = write_table(temp.path(), 0, &[]);

    assert_eq!(SSTableIterator::open(&path).unwrap().count(), 0);
}

#[test]
fn test_iterator_detects_truncated_record() {
    let temp = TempDir::new().unwrap();
    let path = write_table(temp.path(), 0, &[("key1", "value1"), ("key2", "value2")]);
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    let mut iter = SSTableIterator::open(&path).unwrap();
    assert!(iter.next().unwrap().is_ok());
    assert!(matches!(iter.next(), Some(Err(EmberError::Storage(_)))));
    assert!(iter.next().is_none());
}

#[test]
fn test_create_truncates_existing_file() {
    let temp = TempDir::new().unwrap();
    let path = sstable_path(temp.path(), 0);
    fs::write(&path, b"leftover bytes from a failed flush").unwrap();

    let path = write_table(temp.path(), 0, &[("k", "v")]);

    assert_eq!(fs::metadata(&path).unwrap().len(), 10);
}
