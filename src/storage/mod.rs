//! Storage Module
//!
//! Persistent storage layer: the active memtable and the immutable tables
//! it is flushed into.
//!
//! ## Responsibilities
//! - Track the memtable size and flush it when it crosses the limit
//! - Write each flush as one new SSTable with an increasing id
//! - Discover existing tables on startup so ids keep increasing
//!
//! Reads never consult tables; the engine serves them from memory and
//! rebuilds that state from the WAL on restart.

mod manager;
mod sstable;

pub use manager::StorageManager;
pub use sstable::{
    sstable_path, SSTable, SSTableBuilder, SSTableIterator, SSTABLE_EXTENSION, SSTABLE_PREFIX,
};
