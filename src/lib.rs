//! # EmberKV
//!
//! An embeddable single-node key-value store. Every mutation is logged to
//! a write-ahead log, applied in memory, and periodically written out as an
//! immutable SSTable. On startup the log is replayed to rebuild memory.
//!
//! ## Write path
//!
//! ```text
//!  set(k, v) ──► Wal::append_set ──► KeyIndex + MemTable ──► size >= limit?
//!                (durability)        (visibility)             │ yes
//!                                                             ▼
//!                                          sstable_<id>.sst, fresh MemTable
//! ```
//!
//! ## Recovery path
//!
//! ```text
//!  wal.log  or  wal-0.seg, wal-N.seg, ...  ──► WalRecovery::replay ──► KeyIndex
//! ```
//!
//! Reads are answered from the key index only; tables are write-once
//! snapshots that nothing reads back at runtime.
//!
//! ## Quick start
//!
//! ```no_run
//! use emberkv::{Config, Engine};
//!
//! # fn main() -> emberkv::Result<()> {
//! let config = Config::builder().data_dir("./data").build();
//! let engine = Engine::open_and_recover(config)?;
//! engine.set(b"greeting", b"hello")?;
//! assert_eq!(engine.get(b"greeting").as_deref(), Some(&b"hello"[..]));
//! engine.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod memtable;
pub mod network;
pub mod protocol;
pub mod storage;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::Engine;
pub use error::{EmberError, Result};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
