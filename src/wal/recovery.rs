//! WAL Recovery
//!
//! Rebuilds the in-memory key index by replaying log files in offset order.
//! Tables on disk are never consulted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::Result;

use super::{OperationType, WalReader};

/// Live key → value map rebuilt from the WAL
pub type KeyIndex = BTreeMap<Vec<u8>, Bytes>;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Log files replayed
    pub files_replayed: usize,

    /// Entries applied across all files
    pub entries_applied: u64,

    pub sets: u64,

    pub deletes: u64,

    /// Keys present once replay finished
    pub live_keys: usize,
}

/// Handles WAL replay after restart or crash
pub struct WalRecovery;

impl WalRecovery {
    /// Replay `paths` in order into a fresh index
    ///
    /// The first malformed record aborts the replay and is returned as
    /// `WalCorruption`; nothing partial is handed back.
    pub fn replay(paths: &[PathBuf]) -> Result<(KeyIndex, RecoveryStats)> {
        let mut index = KeyIndex::new();
        let mut stats = RecoveryStats::default();

        for path in paths {
            Self::replay_file(path, &mut index, &mut stats)?;
        }
        stats.live_keys = index.len();

        Ok((index, stats))
    }

    /// Apply every entry in one file to `index`
    pub fn replay_file(path: &Path, index: &mut KeyIndex, stats: &mut RecoveryStats) -> Result<()> {
        let mut applied = 0u64;
        for entry in WalReader::open(path)? {
            let entry = entry?;
            match entry.operation {
                OperationType::Set => {
                    index.insert(
                        entry.key_bytes().to_vec(),
                        Bytes::copy_from_slice(entry.value_bytes()),
                    );
                    stats.sets += 1;
                }
                OperationType::Delete => {
                    index.remove(entry.key_bytes());
                    stats.deletes += 1;
                }
            }
            applied += 1;
        }

        stats.entries_applied += applied;
        stats.files_replayed += 1;
        tracing::debug!(path = %path.display(), entries = applied, "replayed log file");
        Ok(())
    }
}
