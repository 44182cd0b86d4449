//! Storage Manager
//!
//! Owns the active memtable and the list of flushed SSTables.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Apply writes to the memtable and flush at the size limit
//! - Create new SSTables from MemTable flushes
//! - Track SSTable lifecycle

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::Result;
use crate::memtable::MemTable;

use super::sstable::parse_sstable_id;
use super::{SSTable, SSTableBuilder};

/// Manages the memtable → SSTable pipeline
///
/// ## Concurrency:
/// - Mutating methods take `&mut self`; the engine holds its exclusive
///   lock across "apply + maybe flush", so a flush never races a write.
/// - The id counter is plain state owned here, not a shared global.
pub struct StorageManager {
    /// Directory where SSTables are stored
    sst_dir: PathBuf,

    /// Flush once the memtable reaches this many bytes
    size_limit: usize,

    /// Newest, not yet flushed writes
    memtable: MemTable,

    /// Flushed tables, ordered oldest → newest
    sstables: Vec<SSTable>,

    /// Id for the next flush
    next_sstable_id: u64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Discover existing SSTable files
    /// 3. Resume ids after the highest one found
    pub fn open(path: &Path, size_limit: usize) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut sstables = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            if let Some(id) = parse_sstable_id(&file_path) {
                let file_size = fs::metadata(&file_path)?.len();
                sstables.push(SSTable {
                    id,
                    path: file_path,
                    file_size,
                });
            }
        }
        sstables.sort_by_key(|t| t.id);

        // Next ID = max + 1, or 0 if no SSTables exist
        let next_sstable_id = sstables.last().map(|t| t.id + 1).unwrap_or(0);

        tracing::debug!(
            dir = %path.display(),
            sstables = sstables.len(),
            next_sstable_id,
            "opened sstable storage"
        );

        Ok(Self {
            sst_dir: path.to_path_buf(),
            size_limit,
            memtable: MemTable::new(),
            sstables,
            next_sstable_id,
        })
    }

    /// Apply a write to the memtable, flushing if it reaches the limit
    ///
    /// Returns the new table when this write triggered a flush.
    pub fn set(&mut self, key: Vec<u8>, value: Bytes) -> Result<Option<SSTable>> {
        let new_size = self.memtable.set(key, value);
        if new_size >= self.size_limit {
            return self.flush();
        }
        Ok(None)
    }

    /// Flush the memtable to a new SSTable
    ///
    /// The table list, id counter and memtable change only after the table
    /// is completely written. On error the current memtable stays in place
    /// and the id is reused by the next attempt. An empty memtable is not
    /// flushed.
    pub fn flush(&mut self) -> Result<Option<SSTable>> {
        if self.memtable.is_empty() {
            return Ok(None);
        }

        let id = self.next_sstable_id;
        let mut builder = SSTableBuilder::create(&self.sst_dir, id)?;
        self.memtable
            .iterate(|key, value| builder.write_entry(key, value))?;
        let entries = builder.entry_count();
        let table = builder.finish()?;

        self.sstables.push(table.clone());
        self.next_sstable_id += 1;
        self.memtable = MemTable::new();

        tracing::info!(
            id = table.id,
            entries,
            bytes = table.file_size,
            path = %table.path.display(),
            "flushed memtable"
        );
        Ok(Some(table))
    }

    /// Replace the memtable with one holding `entries`
    ///
    /// Used after WAL replay so unflushed writes are flushed again later.
    /// No flush happens here; the next write checks the limit.
    pub fn restore_memtable<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (Vec<u8>, Bytes)>,
    {
        let memtable = MemTable::new();
        for (key, value) in entries {
            memtable.set(key, value);
        }
        let size = memtable.size();
        self.memtable = memtable;
        size
    }

    pub fn memtable(&self) -> &MemTable {
        &self.memtable
    }

    /// Flushed tables, oldest first
    pub fn sstables(&self) -> &[SSTable] {
        &self.sstables
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.len()
    }

    /// Get the next SSTable ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id
    }

    pub fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Get the data directory path
    pub fn sst_dir(&self) -> &Path {
        &self.sst_dir
    }
}
