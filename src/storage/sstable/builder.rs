//! SSTable Builder
//!
//! Writes sorted key-value entries to a new SSTable file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{EmberError, Result};

use super::{sstable_path, SSTable, LEN_PREFIX_SIZE};

/// Builder for one new SSTable
///
/// A builder dropped before `finish` leaves a partial file behind; the
/// table is only published by `finish`.
pub struct SSTableBuilder {
    id: u64,
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    entry_count: u64,
    bytes_written: u64,
}

impl SSTableBuilder {
    /// Create the (empty) file for table `id` in `dir`
    ///
    /// The directory is created if missing; an existing file with the same
    /// name is truncated.
    pub fn create(dir: &Path, id: u64) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = sstable_path(dir, id);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        tracing::debug!(path = %path.display(), id, "created sstable");

        Ok(Self {
            id,
            path,
            writer: BufWriter::new(file),
            entry_count: 0,
            bytes_written: 0,
        })
    }

    /// Append one record: key_len | key | value_len | value
    pub fn write_entry(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let key_len = length_prefix("key", key)?;
        let value_len = length_prefix("value", value)?;

        self.writer.write_all(&key_len.to_le_bytes())?;
        self.writer.write_all(key)?;
        self.writer.write_all(&value_len.to_le_bytes())?;
        self.writer.write_all(value)?;

        self.entry_count += 1;
        self.bytes_written += (2 * LEN_PREFIX_SIZE + key.len() + value.len()) as u64;
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Flush buffered data, fsync and return the table handle
    pub fn finish(mut self) -> Result<SSTable> {
        self.writer.flush()?;
        let file = self.writer.into_inner().map_err(|e| {
            EmberError::Storage(format!("Failed to flush SSTable: {}", e))
        })?;
        file.sync_all()?;

        Ok(SSTable {
            id: self.id,
            path: self.path,
            file_size: self.bytes_written,
        })
    }
}

fn length_prefix(what: &str, bytes: &[u8]) -> Result<u32> {
    u32::try_from(bytes.len()).map_err(|_| {
        EmberError::Storage(format!(
            "{} of {} bytes exceeds the SSTable length limit",
            what,
            bytes.len()
        ))
    })
}
