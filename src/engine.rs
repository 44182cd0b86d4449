//! Engine Module
//!
//! The storage engine facade that coordinates all components.
//!
//! ## Responsibilities
//! - Route mutations through WAL → memory
//! - Trigger flushes when the MemTable is full
//! - Serve reads from the in-memory key index
//! - Rebuild the index and memtable from the WAL on startup

use bytes::Bytes;
use parking_lot::RwLock;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{Command, Response};
use crate::storage::{SSTable, StorageManager};
use crate::wal::{KeyIndex, RecoveryStats, Wal, WalRecovery};

/// Everything guarded by the engine lock
struct EngineState {
    /// Every live key; the read path
    index: KeyIndex,

    /// Memtable and flushed tables
    storage: StorageManager,
}

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (set/delete/flush/recovery): hold the `state` write lock for
///   the whole "WAL append → apply → maybe flush" sequence, so no write is
///   lost or applied twice across a memtable swap.
/// - **Reads** (get): share the `state` read lock.
/// - The WAL serializes its own appends behind a separate mutex.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write-ahead log for durability
    wal: Wal,

    state: RwLock<EngineState>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// Opens the WAL and the table directory. Memory starts empty; call
    /// [`Engine::recover_from_wal`] before serving requests.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let wal = Wal::from_config(&config)?;
        let storage = StorageManager::open(&config.sst_dir, config.memtable_size_limit)?;

        tracing::info!(
            wal_dir = %config.wal_dir.display(),
            sst_dir = %config.sst_dir.display(),
            segmented = config.use_segmented_logs,
            memtable_size_limit = config.memtable_size_limit,
            "engine opened"
        );

        Ok(Self {
            config,
            wal,
            state: RwLock::new(EngineState {
                index: KeyIndex::new(),
                storage,
            }),
        })
    }

    /// Open the engine and replay its WAL
    pub fn open_and_recover(config: Config) -> Result<Self> {
        let engine = Self::open(config)?;
        engine.recover_from_wal()?;
        Ok(engine)
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Response> {
        match command {
            Command::Get { key } => Ok(match self.get(&key) {
                Some(value) => Response::Value(value),
                None => Response::Nil,
            }),
            Command::Set { key, value } => {
                self.set(&key, &value)?;
                Ok(Response::Ok)
            }
            Command::Delete { key } => {
                self.delete(&key)?;
                Ok(Response::Ok)
            }
            Command::Ping => Ok(Response::Pong),
        }
    }

    /// Get a value by key from the in-memory index
    ///
    /// Flushed tables are not consulted.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.state.read().index.get(key).cloned()
    }

    /// Set a key-value pair
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to WAL (durability point); on failure nothing changes
    /// 3. Apply to index and MemTable (visibility point)
    /// 4. Flush synchronously if the MemTable reached its limit
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut state = self.state.write();

        self.wal.append_set(key, value)?;

        let value = Bytes::copy_from_slice(value);
        state.index.insert(key.to_vec(), value.clone());
        state.storage.set(key.to_vec(), value)?;

        Ok(())
    }

    /// Delete a key
    ///
    /// The delete is logged and removed from the index. The MemTable is
    /// not touched and no tombstone reaches a table.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let mut state = self.state.write();

        self.wal.append_delete(key)?;
        state.index.remove(key);

        Ok(())
    }

    /// Flush memtable to disk regardless of its size
    pub fn flush(&self) -> Result<Option<SSTable>> {
        self.state.write().storage.flush()
    }

    /// Rebuild in-memory state by replaying every WAL file in order
    ///
    /// Replays into a fresh index; only if the whole replay succeeds does
    /// it replace the current index, and the memtable is rebuilt from the
    /// recovered live keys. A malformed record is returned as an error and
    /// leaves memory untouched.
    pub fn recover_from_wal(&self) -> Result<RecoveryStats> {
        let mut state = self.state.write();

        let paths = self.wal.segment_paths()?;
        let (index, stats) = WalRecovery::replay(&paths)?;

        let EngineState { index: live, storage } = &mut *state;
        let memtable_size = storage.restore_memtable(
            index
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        *live = index;

        tracing::info!(
            files = stats.files_replayed,
            entries = stats.entries_applied,
            sets = stats.sets,
            deletes = stats.deletes,
            live_keys = stats.live_keys,
            memtable_size,
            "WAL recovery complete"
        );

        Ok(stats)
    }

    /// Close the WAL
    ///
    /// The memtable is not flushed; recovery rebuilds it from the WAL on
    /// the next start. Later writes fail.
    pub fn close(&self) -> Result<()> {
        let _state = self.state.write();
        self.wal.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn wal(&self) -> &Wal {
        &self.wal
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().index.is_empty()
    }

    /// Copy of the whole in-memory index
    pub fn snapshot(&self) -> KeyIndex {
        self.state.read().index.clone()
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.state.read().storage.memtable().size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.state.read().storage.memtable().entry_count()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.state.read().storage.sstable_count()
    }

    /// Flushed tables, oldest first
    pub fn sstables(&self) -> Vec<SSTable> {
        self.state.read().storage.sstables().to_vec()
    }

    pub fn next_sstable_id(&self) -> u64 {
        self.state.read().storage.next_sstable_id()
    }
}
