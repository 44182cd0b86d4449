//! Configuration for EmberKV
//!
//! Centralized configuration with sensible defaults. Values come from, in
//! increasing precedence: built-in defaults, an optional YAML file, and
//! `EMBERKV_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EmberError, Result};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "emberkv.yaml";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "EMBERKV_";

/// Main configuration for an EmberKV instance
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the write-ahead log
    ///   {wal_dir}/
    ///     ├── wal.log              (single-file backend)
    ///     └── wal-<base>.seg       (segmented backend)
    pub wal_dir: PathBuf,

    /// Use the segmented log backend instead of a single append-only file
    pub use_segmented_logs: bool,

    /// Entries per log segment before rotating
    pub segment_size: usize,

    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // MemTable / SSTable Configuration
    // -------------------------------------------------------------------------
    /// Directory where flushed SSTables are written
    pub sst_dir: PathBuf,

    /// Max size of memtable before flush (in bytes)
    pub memtable_size_limit: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of connection worker threads
    pub worker_threads: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for WalSyncStrategy {
    fn default() -> Self {
        WalSyncStrategy::EveryWrite
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_dir: PathBuf::from("./emberkv_data/wal"),
            use_segmented_logs: false,
            segment_size: 1000,
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            sst_dir: PathBuf::from("./emberkv_data/sstables"),
            memtable_size_limit: 4 * 1024 * 1024, // 4 MB
            listen_addr: "127.0.0.1:6370".to_string(),
            worker_threads: 8,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from defaults, a YAML file and the environment
    ///
    /// With `Some(path)` the file must exist. With `None`, `emberkv.yaml`
    /// in the working directory is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.exists() {
                    Self::from_file(implicit)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            EmberError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse YAML text
    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| EmberError::Config(e.to_string()))
    }

    /// Apply `EMBERKV_*` overrides using `lookup` to resolve variable names
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

        if let Some(v) = var("WAL_DIR") {
            self.wal_dir = PathBuf::from(v);
        }
        if let Some(v) = var("USE_SEGMENTED_LOGS") {
            self.use_segmented_logs = parse_bool("USE_SEGMENTED_LOGS", &v)?;
        }
        if let Some(v) = var("SEGMENT_SIZE") {
            self.segment_size = parse_number("SEGMENT_SIZE", &v)?;
        }
        if let Some(v) = var("SST_DIR") {
            self.sst_dir = PathBuf::from(v);
        }
        if let Some(v) = var("MEMTABLE_SIZE") {
            self.memtable_size_limit = parse_number("MEMTABLE_SIZE", &v)?;
        }
        if let Some(v) = var("LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = var("WORKER_THREADS") {
            self.worker_threads = parse_number("WORKER_THREADS", &v)?;
        }
        Ok(())
    }

    /// Reject configurations the engine cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.wal_dir.as_os_str().is_empty() {
            return Err(EmberError::Config("wal_dir must not be empty".into()));
        }
        if self.sst_dir.as_os_str().is_empty() {
            return Err(EmberError::Config("sst_dir must not be empty".into()));
        }
        if self.worker_threads == 0 {
            return Err(EmberError::Config("worker_threads must be at least 1".into()));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(EmberError::Config("wal sync count must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(EmberError::Config(format!(
            "{}{}: expected a boolean, got '{}'",
            ENV_PREFIX, name, other
        ))),
    }
}

fn parse_number(name: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        EmberError::Config(format!(
            "{}{}: expected a non-negative integer, got '{}'",
            ENV_PREFIX, name, value
        ))
    })
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Put the WAL and SSTable directories under a single root
    pub fn data_dir(mut self, path: impl AsRef<Path>) -> Self {
        let root = path.as_ref();
        self.config.wal_dir = root.join("wal");
        self.config.sst_dir = root.join("sstables");
        self
    }

    /// Set the WAL directory
    pub fn wal_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wal_dir = path.into();
        self
    }

    /// Choose between the segmented and single-file WAL backends
    pub fn use_segmented_logs(mut self, enabled: bool) -> Self {
        self.config.use_segmented_logs = enabled;
        self
    }

    /// Set the number of entries per log segment
    pub fn segment_size(mut self, entries: usize) -> Self {
        self.config.segment_size = entries;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the SSTable directory
    pub fn sst_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.sst_dir = path.into();
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of connection worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
