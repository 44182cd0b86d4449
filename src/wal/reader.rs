//! WAL Reader
//!
//! Sequential decoding of one log file, record by record.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{EmberError, Result};

use super::segment::RECORD_DELIMITER;
use super::LogEntry;

/// Reads entries from a WAL file in append order
pub struct WalReader {
    path: PathBuf,
    reader: BufReader<File>,
    /// 1-based number of the last line read
    line: usize,
    /// Set after EOF or the first error
    done: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            line: 0,
            done: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the next entry; `Ok(None)` at end of file
    pub fn next_entry(&mut self) -> Result<Option<LogEntry>> {
        let mut buf = Vec::new();
        let n = self.reader.read_until(RECORD_DELIMITER, &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line += 1;
        if buf.last() == Some(&RECORD_DELIMITER) {
            buf.pop();
        }

        LogEntry::decode(&buf).map(Some).map_err(|e| {
            EmberError::WalCorruption(format!(
                "{}:{}: malformed record: {}",
                self.path.display(),
                self.line,
                e
            ))
        })
    }

    /// Line number of the entry most recently returned
    pub fn line(&self) -> usize {
        self.line
    }
}

impl Iterator for WalReader {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_entry() {
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
