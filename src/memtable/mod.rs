//! MemTable Module
//!
//! Holds writes that have not been flushed to an SSTable yet.
//!
//! The table is a `BTreeMap` so a flush can stream entries in ascending
//! byte-wise key order without sorting. Its size estimate is
//! Σ(len(key) + len(value)) over live entries; the storage manager
//! compares it against the configured limit after every write.

mod table;

pub use table::MemTable;
