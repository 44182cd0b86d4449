//! SSTable Iterator
//!
//! Sequential iteration over all entries in an SSTable.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::error::{EmberError, Result};

use super::LEN_PREFIX_SIZE;

/// Iterator over SSTable entries in file (sorted key) order
pub struct SSTableIterator {
    path: PathBuf,
    reader: BufReader<File>,
    done: bool,
}

impl SSTableIterator {
    /// Open a table file for sequential reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            done: false,
        })
    }

    /// `Ok(None)` only at a clean record boundary
    fn read_entry(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let mut prefix = [0u8; LEN_PREFIX_SIZE];
        // Distinguish clean EOF (no bytes) from a torn length prefix
        let mut filled = 0;
        while filled < LEN_PREFIX_SIZE {
            match self.reader.read(&mut prefix[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < LEN_PREFIX_SIZE {
            return Err(self.truncated());
        }

        let key = self.read_chunk(u32::from_le_bytes(prefix) as usize)?;

        let mut value_prefix = [0u8; LEN_PREFIX_SIZE];
        self.reader
            .read_exact(&mut value_prefix)
            .map_err(|e| self.map_eof(e))?;
        let value = self.read_chunk(u32::from_le_bytes(value_prefix) as usize)?;

        Ok(Some((key, value)))
    }

    fn read_chunk(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf).map_err(|e| self.map_eof(e))?;
        Ok(buf)
    }

    fn map_eof(&self, e: std::io::Error) -> EmberError {
        if e.kind() == ErrorKind::UnexpectedEof {
            self.truncated()
        } else {
            EmberError::Io(e)
        }
    }

    fn truncated(&self) -> EmberError {
        EmberError::Storage(format!("{} ends mid-record", self.path.display()))
    }
}

impl Iterator for SSTableIterator {
    /// (key, value)
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
