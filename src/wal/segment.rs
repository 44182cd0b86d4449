//! Segmented log
//!
//! Append-only storage of opaque, newline-delimited records addressed by a
//! logical offset and split across bounded segment files.
//!
//! Segments are named `wal-{base_offset}.seg` with the base offset in
//! decimal. A segment covers offsets `[base_offset, next_offset)`; the
//! segment after it always starts at its `next_offset`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{EmberError, Result};

/// Entries per segment when none (or zero) is configured
pub const DEFAULT_SEGMENT_SIZE: usize = 1000;

pub const SEGMENT_PREFIX: &str = "wal-";
pub const SEGMENT_EXTENSION: &str = ".seg";

/// Separates records inside a log file
pub const RECORD_DELIMITER: u8 = b'\n';

// =============================================================================
// Log Segment
// =============================================================================

/// One file-backed, contiguous range of log offsets
#[derive(Debug)]
pub struct LogSegment {
    path: PathBuf,
    /// `None` once closed
    file: Option<File>,
    base_offset: u64,
    next_offset: u64,
}

impl LogSegment {
    /// Create (or open empty) a segment starting at `base_offset`
    pub(crate) fn create(path: &Path, base_offset: u64) -> Result<Self> {
        let mut segment = Self::open(path, base_offset)?;
        // A pre-existing file under this name would break offset accounting.
        if segment.len() != 0 {
            segment.close()?;
            return Err(EmberError::WalCorruption(format!(
                "new segment {} already holds records",
                path.display()
            )));
        }
        Ok(segment)
    }

    /// Open a log file and count its complete records
    ///
    /// A trailing record without its delimiter is the remains of an
    /// interrupted append; it is truncated away.
    pub(crate) fn open(path: &Path, base_offset: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let (records, valid_len) = scan_records(&file)?;
        let file_len = file.metadata()?.len();
        if valid_len < file_len {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = file_len - valid_len,
                "truncating partial record at end of log file"
            );
            file.set_len(valid_len)?;
            file.sync_data()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            base_offset,
            next_offset: base_offset + records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Number of records held
    pub fn len(&self) -> u64 {
        self.next_offset - self.base_offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.base_offset && offset < self.next_offset
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or(EmberError::Closed("log segment"))
    }

    /// Append one record and return its offset, syncing it if `sync`
    ///
    /// On failure, of the write or of the sync, any bytes that reached the
    /// file are cut off again and `next_offset` is unchanged.
    pub(crate) fn append(&mut self, record: &[u8], sync: bool) -> Result<u64> {
        check_record(record)?;
        let file = self.file()?;

        let mut framed = Vec::with_capacity(record.len() + 1);
        framed.extend_from_slice(record);
        framed.push(RECORD_DELIMITER);

        write_framed(file, &framed, |f| if sync { f.sync_data() } else { Ok(()) })?;

        let offset = self.next_offset;
        self.next_offset += 1;
        Ok(offset)
    }

    /// Read the record stored at `offset`
    pub(crate) fn read(&self, offset: u64) -> Result<Vec<u8>> {
        if !self.contains(offset) {
            return Err(EmberError::OffsetNotFound(offset));
        }
        let mut file = self.file()?;
        file.seek(SeekFrom::Start(0))?;

        let mut reader = BufReader::new(file);
        let mut record = Vec::new();
        for _ in 0..=(offset - self.base_offset) {
            record.clear();
            let n = reader.read_until(RECORD_DELIMITER, &mut record)?;
            if n == 0 || record.last() != Some(&RECORD_DELIMITER) {
                return Err(EmberError::WalCorruption(format!(
                    "{} ends before offset {}",
                    self.path.display(),
                    offset
                )));
            }
        }
        record.pop();
        Ok(record)
    }

    pub(crate) fn sync(&self) -> Result<()> {
        self.file()?.sync_data()?;
        Ok(())
    }

    /// Sync and release the file handle; idempotent
    pub(crate) fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// Write one framed record, then run `sync`; a failure of either
/// truncates the file back to its previous length
fn write_framed<F>(file: &File, framed: &[u8], sync: F) -> io::Result<()>
where
    F: FnOnce(&File) -> io::Result<()>,
{
    let mut handle = file;
    let len_before = handle.metadata()?.len();
    let result = handle.write_all(framed).and_then(|()| sync(file));
    if let Err(e) = result {
        if let Err(trunc) = file.set_len(len_before) {
            tracing::error!(
                error = %trunc,
                "failed to roll back partial log record"
            );
        }
        return Err(e);
    }
    Ok(())
}

/// Count newline-terminated records; returns `(records, bytes they span)`
fn scan_records(file: &File) -> Result<(u64, u64)> {
    let mut handle = file;
    handle.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(handle);

    let mut records = 0u64;
    let mut valid_len = 0u64;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(RECORD_DELIMITER, &mut buf)?;
        if n == 0 || buf.last() != Some(&RECORD_DELIMITER) {
            break;
        }
        records += 1;
        valid_len += n as u64;
    }
    Ok((records, valid_len))
}

fn check_record(record: &[u8]) -> Result<()> {
    if record.contains(&RECORD_DELIMITER) {
        return Err(EmberError::InvalidRecord(
            "record contains the newline delimiter".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// Segmented Log
// =============================================================================

/// Ordered set of segments; the last one is active and receives appends
#[derive(Debug)]
pub struct SegmentedLog {
    dir: PathBuf,
    segment_size: usize,
    /// Sorted by base offset
    segments: Vec<LogSegment>,
    closed: bool,
}

impl SegmentedLog {
    /// Open the log in `dir`, reloading any existing segments
    ///
    /// Creates segment 0 when the directory holds none.
    pub fn open(dir: &Path, segment_size: usize) -> Result<Self> {
        let segment_size = if segment_size == 0 {
            DEFAULT_SEGMENT_SIZE
        } else {
            segment_size
        };
        fs::create_dir_all(dir)?;

        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                if let Some(base) = parse_segment_name(&path)? {
                    found.push((base, path));
                }
            }
        }
        found.sort_unstable();

        let mut segments: Vec<LogSegment> = Vec::with_capacity(found.len().max(1));
        for (base, path) in found {
            // e.g. "wal-0.seg" next to "wal-00.seg"
            if let Some(prev) = segments.last() {
                if prev.base_offset() == base {
                    return Err(EmberError::WalCorruption(format!(
                        "segments {} and {} share base offset {}",
                        prev.path().display(),
                        path.display(),
                        base
                    )));
                }
            }
            let segment = LogSegment::open(&path, base)?;
            if let Some(prev) = segments.last() {
                if prev.next_offset() != segment.base_offset() {
                    return Err(EmberError::WalCorruption(format!(
                        "segment {} starts at offset {} but the previous segment ends at {}",
                        segment.path().display(),
                        segment.base_offset(),
                        prev.next_offset()
                    )));
                }
            }
            segments.push(segment);
        }

        if segments.is_empty() {
            segments.push(LogSegment::create(&segment_path(dir, 0), 0)?);
        }

        let log = Self {
            dir: dir.to_path_buf(),
            segment_size,
            segments,
            closed: false,
        };
        tracing::debug!(
            dir = %dir.display(),
            segments = log.segments.len(),
            next_offset = log.next_offset(),
            "opened segmented log"
        );
        Ok(log)
    }

    /// Append a record, rotating first if the active segment is full
    pub fn append(&mut self, record: &[u8]) -> Result<u64> {
        self.append_with_sync(record, false)
    }

    /// Append a record and, if `sync`, fsync it before returning
    ///
    /// An error means the record is not in the log.
    pub fn append_with_sync(&mut self, record: &[u8], sync: bool) -> Result<u64> {
        self.ensure_open()?;
        check_record(record)?;

        if self.active().len() >= self.segment_size as u64 {
            self.rotate()?;
        }
        let active = self.active_mut();
        active.append(record, sync)
    }

    /// Read the record at `offset`
    pub fn read(&self, offset: u64) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.segments
            .iter()
            .find(|s| s.contains(offset))
            .ok_or(EmberError::OffsetNotFound(offset))?
            .read(offset)
    }

    /// Segment file paths in creation (offset) order
    pub fn segment_paths(&self) -> Vec<PathBuf> {
        self.segments.iter().map(|s| s.path().to_path_buf()).collect()
    }

    pub fn active_segment_path(&self) -> &Path {
        self.active().path()
    }

    pub fn segments(&self) -> &[LogSegment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// Offset the next appended record will get
    pub fn next_offset(&self) -> u64 {
        self.active().next_offset()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Sync the active segment to disk
    pub fn sync(&self) -> Result<()> {
        self.ensure_open()?;
        self.active().sync()
    }

    /// Close every segment; later appends and reads fail
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        for segment in &mut self.segments {
            segment.close()?;
        }
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(EmberError::Closed("segmented log"));
        }
        Ok(())
    }

    fn active(&self) -> &LogSegment {
        // `open` guarantees at least one segment
        &self.segments[self.segments.len() - 1]
    }

    fn active_mut(&mut self) -> &mut LogSegment {
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }

    fn rotate(&mut self) -> Result<()> {
        self.active().sync()?;
        let base = self.active().next_offset();
        let segment = LogSegment::create(&segment_path(&self.dir, base), base)?;
        tracing::debug!(path = %segment.path().display(), base_offset = base, "rotated log segment");
        self.segments.push(segment);
        Ok(())
    }
}

/// Path of the segment whose first offset is `base_offset`
pub fn segment_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{}{}{}", SEGMENT_PREFIX, base_offset, SEGMENT_EXTENSION))
}

/// "wal-42.seg" → Some(42); unrelated files → None; "wal-x.seg" → error
fn parse_segment_name(path: &Path) -> Result<Option<u64>> {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return Ok(None),
    };
    let digits = match name
        .strip_prefix(SEGMENT_PREFIX)
        .and_then(|rest| rest.strip_suffix(SEGMENT_EXTENSION))
    {
        Some(digits) => digits,
        None => return Ok(None),
    };
    digits.parse().map(Some).map_err(|_| {
        EmberError::WalCorruption(format!(
            "cannot parse base offset from segment name {}",
            name
        ))
    })
}
