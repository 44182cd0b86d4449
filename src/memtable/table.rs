//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::Result;

struct Inner {
    data: BTreeMap<Vec<u8>, Bytes>,
    /// Σ(len(key) + len(value)) over live entries
    size: usize,
}

/// In-memory sorted table for recent writes
///
/// `set` takes the write lock; `get`, `size` and `iterate` share the read
/// lock. A flush iterates a table nobody writes to anymore: the engine
/// swaps in a fresh table under its own exclusive lock.
pub struct MemTable {
    inner: RwLock<Inner>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                data: BTreeMap::new(),
                size: 0,
            }),
        }
    }

    /// Insert or update a key; returns the new size estimate
    pub fn set(&self, key: Vec<u8>, value: Bytes) -> usize {
        let mut inner = self.inner.write();
        let added = value.len();
        let key_len = key.len();
        match inner.data.insert(key, value) {
            Some(old) => inner.size = inner.size - old.len() + added,
            None => inner.size += key_len + added,
        }
        inner.size
    }

    /// Get the current value for a key
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.inner.read().data.get(key).cloned()
    }

    /// Approximate size in bytes
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    pub fn entry_count(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }

    /// Visit every entry once in ascending byte-wise key order
    ///
    /// Stops at, and returns, the first error from `visitor`.
    pub fn iterate<F>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        let inner = self.inner.read();
        for (key, value) in inner.data.iter() {
            visitor(key, value)?;
        }
        Ok(())
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
