//! WAL Writer
//!
//! The durability boundary in front of the engine. Every mutation is
//! encoded and appended here before it becomes visible in memory.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::{Config, WalSyncStrategy};
use crate::error::{EmberError, Result};

use super::segment::{LogSegment, SegmentedLog};
use super::LogEntry;

/// File name of the single-file backend inside the WAL directory
pub const SINGLE_LOG_FILENAME: &str = "wal.log";

/// Backend layout, fixed when the WAL is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalMode {
    /// One append-only file, never rotated
    SingleFile,

    /// Rotating segments of `segment_size` entries
    Segmented { segment_size: usize },
}

/// Storage behind the WAL
///
/// The single-file backend is one unbounded segment with base offset 0.
#[derive(Debug)]
pub enum WalBackend {
    SingleFile(LogSegment),
    Segmented(SegmentedLog),
}

impl WalBackend {
    fn open(dir: &Path, mode: WalMode) -> Result<Self> {
        match mode {
            WalMode::SingleFile => {
                let path = dir.join(SINGLE_LOG_FILENAME);
                Ok(WalBackend::SingleFile(LogSegment::open(&path, 0)?))
            }
            WalMode::Segmented { segment_size } => {
                Ok(WalBackend::Segmented(SegmentedLog::open(dir, segment_size)?))
            }
        }
    }

    fn append(&mut self, record: &[u8], sync: bool) -> Result<u64> {
        match self {
            WalBackend::SingleFile(file) => file.append(record, sync),
            WalBackend::Segmented(log) => log.append_with_sync(record, sync),
        }
    }

    fn read(&self, offset: u64) -> Result<Vec<u8>> {
        match self {
            WalBackend::SingleFile(file) => file.read(offset),
            WalBackend::Segmented(log) => log.read(offset),
        }
    }

    fn segment_paths(&self) -> Vec<PathBuf> {
        match self {
            WalBackend::SingleFile(file) => vec![file.path().to_path_buf()],
            WalBackend::Segmented(log) => log.segment_paths(),
        }
    }

    fn active_path(&self) -> PathBuf {
        match self {
            WalBackend::SingleFile(file) => file.path().to_path_buf(),
            WalBackend::Segmented(log) => log.active_segment_path().to_path_buf(),
        }
    }

    fn next_offset(&self) -> u64 {
        match self {
            WalBackend::SingleFile(file) => file.next_offset(),
            WalBackend::Segmented(log) => log.next_offset(),
        }
    }

    fn sync(&self) -> Result<()> {
        match self {
            WalBackend::SingleFile(file) => file.sync(),
            WalBackend::Segmented(log) => log.sync(),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self {
            WalBackend::SingleFile(file) => file.close(),
            WalBackend::Segmented(log) => log.close(),
        }
    }
}

struct WalState {
    /// `None` after close
    backend: Option<WalBackend>,
    sync_strategy: WalSyncStrategy,
    /// Appends since the last fsync
    unsynced: usize,
}

/// Write-ahead log
///
/// ## Concurrency:
/// - All appends are serialized by an internal mutex, independent of any
///   lock held by the caller, so the on-disk order is total.
pub struct Wal {
    dir: PathBuf,
    mode: WalMode,
    state: Mutex<WalState>,
}

impl Wal {
    /// Open or create a WAL in `dir`
    pub fn open(dir: &Path, mode: WalMode, sync_strategy: WalSyncStrategy) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let backend = WalBackend::open(dir, mode)?;

        tracing::info!(
            dir = %dir.display(),
            ?mode,
            next_offset = backend.next_offset(),
            "opened write-ahead log"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            mode,
            state: Mutex::new(WalState {
                backend: Some(backend),
                sync_strategy,
                unsynced: 0,
            }),
        })
    }

    /// Open the WAL described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let mode = if config.use_segmented_logs {
            WalMode::Segmented {
                segment_size: config.segment_size,
            }
        } else {
            WalMode::SingleFile
        };
        Self::open(&config.wal_dir, mode, config.wal_sync_strategy)
    }

    /// Log a `Set`; returns the record's offset
    pub fn append_set(&self, key: &[u8], value: &[u8]) -> Result<u64> {
        self.append(&LogEntry::set(key, value)?)
    }

    /// Log a `Delete`; returns the record's offset
    pub fn append_delete(&self, key: &[u8]) -> Result<u64> {
        self.append(&LogEntry::delete(key)?)
    }

    /// Encode and append an entry
    ///
    /// Encoding happens before the lock is taken; an entry that cannot be
    /// encoded never touches the log. When the sync strategy calls for an
    /// fsync it happens as part of the append, and a failed fsync removes
    /// the record again: `Err` always means the entry will not be replayed.
    pub fn append(&self, entry: &LogEntry) -> Result<u64> {
        let record = entry.encode()?;

        let mut state = self.state.lock();
        let WalState {
            backend,
            sync_strategy,
            unsynced,
        } = &mut *state;
        let backend = backend.as_mut().ok_or(EmberError::Closed("WAL"))?;

        let due = match *sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => *unsynced + 1 >= count,
        };
        let offset = backend.append(&record, due)?;
        *unsynced = if due { 0 } else { *unsynced + 1 };

        Ok(offset)
    }

    /// Read back the entry at `offset`
    pub fn read(&self, offset: u64) -> Result<LogEntry> {
        let state = self.state.lock();
        let backend = state.backend.as_ref().ok_or(EmberError::Closed("WAL"))?;
        LogEntry::decode(&backend.read(offset)?)
    }

    /// Log files to replay, in offset order
    pub fn segment_paths(&self) -> Result<Vec<PathBuf>> {
        let state = self.state.lock();
        let backend = state.backend.as_ref().ok_or(EmberError::Closed("WAL"))?;
        Ok(backend.segment_paths())
    }

    /// File currently receiving appends
    pub fn active_path(&self) -> Result<PathBuf> {
        let state = self.state.lock();
        let backend = state.backend.as_ref().ok_or(EmberError::Closed("WAL"))?;
        Ok(backend.active_path())
    }

    /// Offset the next append will be assigned
    pub fn next_offset(&self) -> Result<u64> {
        let state = self.state.lock();
        let backend = state.backend.as_ref().ok_or(EmberError::Closed("WAL"))?;
        Ok(backend.next_offset())
    }

    /// Force sync to disk
    pub fn sync(&self) -> Result<()> {
        let mut state = self.state.lock();
        let backend = state.backend.as_ref().ok_or(EmberError::Closed("WAL"))?;
        backend.sync()?;
        state.unsynced = 0;
        Ok(())
    }

    /// Sync and close the backend; later calls fail with `Closed`
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.backend.take() {
            Some(mut backend) => {
                backend.close()?;
                tracing::info!(dir = %self.dir.display(), "closed write-ahead log");
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().backend.is_none()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mode(&self) -> WalMode {
        self.mode
    }
}
