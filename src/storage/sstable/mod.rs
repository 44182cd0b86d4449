//! SSTable Module
//!
//! Sorted String Table - immutable on-disk snapshot of one flushed memtable.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Data (variable, repeated until EOF)                     │
//! │   [KeyLen: u32 LE][Key][ValLen: u32 LE][Value]          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! No header, index or footer. Records appear in ascending key order.
//! Keys and values are limited to `u32::MAX` bytes each.

mod builder;
mod iterator;

use std::path::{Path, PathBuf};

pub use builder::SSTableBuilder;
pub use iterator::SSTableIterator;

/// Size of each length prefix
pub(crate) const LEN_PREFIX_SIZE: usize = 4;

pub const SSTABLE_PREFIX: &str = "sstable_";
pub const SSTABLE_EXTENSION: &str = "sst";

/// Handle to one table on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SSTable {
    /// Flush sequence number, unique and increasing
    pub id: u64,
    pub path: PathBuf,
    pub file_size: u64,
}

/// Path of the table with the given id: `sstable_000042.sst`
pub fn sstable_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{}{:06}.{}", SSTABLE_PREFIX, id, SSTABLE_EXTENSION))
}

/// "sstable_000042.sst" → Some(42)
pub(crate) fn parse_sstable_id(path: &Path) -> Option<u64> {
    if path.extension()?.to_str()? != SSTABLE_EXTENSION {
        return None;
    }
    let name = path.file_stem()?.to_str()?;
    name.strip_prefix(SSTABLE_PREFIX)?.parse().ok()
}
