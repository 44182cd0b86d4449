//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append log entries before any mutation becomes visible
//! - Assign contiguous offsets, rotating segment files when full
//! - Point reads by offset
//! - Replay for crash recovery
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ {"op":"SET","key":"k1","value":"v1"}\n      │  offset base+0
//! │ {"op":"DEL","key":"k1"}\n                   │  offset base+1
//! │ ...                                         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Records are newline-delimited; the segment store rejects records that
//! contain a newline. There is no checksum.

mod entry;
mod reader;
mod recovery;
mod segment;
mod writer;

pub use entry::{LogEntry, OperationType};
pub use reader::WalReader;
pub use recovery::{KeyIndex, RecoveryStats, WalRecovery};
pub use segment::{
    segment_path, LogSegment, SegmentedLog, DEFAULT_SEGMENT_SIZE, RECORD_DELIMITER,
    SEGMENT_EXTENSION, SEGMENT_PREFIX,
};
pub use writer::{Wal, WalBackend, WalMode, SINGLE_LOG_FILENAME};
