//! Append-only observation stream feeding the heatmap.
//!
//! The record schema is an [`Observation`] carrying its `camera_id`. The
//! fusion tracker is the only writer (via [`ObservationLog::append`]); the
//! heatmap aggregator is the only reader. Records are expected in roughly
//! chronological order, which is what makes the cheap staleness check in
//! [`ObservationLog::prune_older_than`] valid.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use eagleeye_core::observation::Observation;
use eagleeye_core::types::Timestamp;

use crate::error::StoreError;

/// A durable, ordered, replayable stream of observation records.
pub trait ObservationLog: Send + Sync {
    /// Append `records` in order.
    fn append(&self, records: &[Observation]) -> Result<(), StoreError>;

    /// Drop records whose timestamp is before `cutoff`. Returns how many
    /// were removed.
    fn prune_older_than(&self, cutoff: Timestamp) -> Result<usize, StoreError>;

    /// Records with a timestamp at or after `cutoff`, in log order.
    fn read_since(&self, cutoff: Timestamp) -> Result<Vec<Observation>, StoreError>;
}

// ---------------------------------------------------------------------------
// JSON-Lines file
// ---------------------------------------------------------------------------

/// [`ObservationLog`] backed by a JSON-Lines file, one record per line.
///
/// Malformed lines and records without a timestamp are skipped with a
/// warning when reading or pruning. Every operation holds `file_lock`, so an
/// append never lands in a file that a concurrent prune is about to replace.
#[derive(Debug)]
pub struct JsonlObservationLog {
    path: PathBuf,
    file_lock: Mutex<()>,
}

/// Outcome of decoding one line of the log.
enum LogLine {
    Blank,
    Record(Observation, Timestamp),
    Invalid,
}

impl JsonlObservationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> MutexGuard<'_, ()> {
        self.file_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn decode(&self, line: &str) -> LogLine {
        if line.trim().is_empty() {
            return LogLine::Blank;
        }
        match serde_json::from_str::<Observation>(line) {
            Ok(obs) => match obs.timestamp {
                Some(ts) => LogLine::Record(obs, ts),
                None => {
                    tracing::warn!(path = %self.path.display(), "Skipping observation without timestamp");
                    LogLine::Invalid
                }
            },
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Skipping malformed log line");
                LogLine::Invalid
            }
        }
    }

    /// All lines of the file; a missing file reads as empty.
    fn read_lines(&self) -> Result<Vec<String>, StoreError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::io(&self.path, e))
    }

    fn write_records(&self, path: &Path, records: &[Observation], append: bool) -> Result<(), StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;

        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record).map_err(|e| StoreError::json(path, e))?;
            writer.write_all(b"\n").map_err(|e| StoreError::io(path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(path, e))
    }
}

impl ObservationLog for JsonlObservationLog {
    fn append(&self, records: &[Observation]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let _guard = self.lock_file();
        self.write_records(&self.path, records, true)?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "Observation log appended");
        Ok(())
    }

    fn prune_older_than(&self, cutoff: Timestamp) -> Result<usize, StoreError> {
        let _guard = self.lock_file();
        let lines = self.read_lines()?;

        // The oldest record sits at the head of the log; if it is fresh,
        // so is everything after it.
        let oldest = lines.iter().find_map(|l| match self.decode(l) {
            LogLine::Record(_, ts) => Some(ts),
            LogLine::Blank | LogLine::Invalid => None,
        });
        match oldest {
            None => return Ok(0),
            Some(ts) if ts >= cutoff => return Ok(0),
            Some(_) => {}
        }

        let mut kept = Vec::new();
        let mut removed = 0usize;
        for line in &lines {
            match self.decode(line) {
                LogLine::Record(obs, ts) if ts >= cutoff => kept.push(obs),
                LogLine::Record(..) => removed += 1,
                LogLine::Blank | LogLine::Invalid => {}
            }
        }

        let tmp = self.path.with_extension("jsonl.tmp");
        self.write_records(&tmp, &kept, false)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        tracing::info!(path = %self.path.display(), removed, kept = kept.len(), "Observation log pruned");
        Ok(removed)
    }

    fn read_since(&self, cutoff: Timestamp) -> Result<Vec<Observation>, StoreError> {
        let lines = {
            let _guard = self.lock_file();
            self.read_lines()?
        };
        Ok(lines
            .iter()
            .filter_map(|line| match self.decode(line) {
                LogLine::Record(obs, ts) if ts >= cutoff => Some(obs),
                _ => None,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// [`ObservationLog`] held in memory. Useful in tests and for running
/// without a writable data directory.
#[derive(Debug, Default)]
pub struct MemoryObservationLog {
    records: Mutex<Vec<Observation>>,
}

impl MemoryObservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything currently in the log.
    pub fn records(&self) -> Vec<Observation> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Observation>> {
        // A poisoned lock only means a writer panicked mid-push; the Vec is
        // still structurally sound.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ObservationLog for MemoryObservationLog {
    fn append(&self, records: &[Observation]) -> Result<(), StoreError> {
        self.lock().extend_from_slice(records);
        Ok(())
    }

    fn prune_older_than(&self, cutoff: Timestamp) -> Result<usize, StoreError> {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|o| o.timestamp.is_some_and(|ts| ts >= cutoff));
        Ok(before - records.len())
    }

    fn read_since(&self, cutoff: Timestamp) -> Result<Vec<Observation>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .filter(|o| o.timestamp.is_some_and(|ts| ts >= cutoff))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
