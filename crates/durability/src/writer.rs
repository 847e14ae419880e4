//! Record log writer with durability mode support.
//!
//! The writer appends pre-encoded frames to `records.log`. A commit is one
//! `write_all` of one buffer, so a batch is a single durable unit. If the
//! write or the required sync fails, the file is truncated back to its length
//! before the commit and nothing of it survives a reopen.

use crate::mode::DurabilityMode;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Cumulative log operation counters.
///
/// These counters accumulate over the lifetime of the writer and are never
/// reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCounters {
    /// Total commits that wrote data
    pub commits: u64,
    /// Total sync/fsync calls
    pub sync_calls: u64,
    /// Total bytes written
    pub bytes_written: u64,
}

/// Record log writer with configurable durability modes.
///
/// # Durability Modes
///
/// - `Cache`: no file; commits succeed without I/O
/// - `Always`: fsync after every commit
/// - `Standard`: write through to the OS on every commit, fsync when the
///   interval has elapsed, on [`flush`](Self::flush), and on drop
pub struct RecordLogWriter {
    /// Open log file (None when DurabilityMode::Cache)
    file: Option<File>,

    /// Log path
    path: PathBuf,

    /// Durability mode
    durability: DurabilityMode,

    /// Committed length of the log in bytes
    len: u64,

    /// Last fsync time (for Standard mode)
    last_sync_time: Instant,

    /// Whether there is data written but not yet fsynced
    has_unsynced_data: bool,

    counters: LogCounters,
}

impl RecordLogWriter {
    /// Open the log for appending, creating it if needed.
    ///
    /// The caller is responsible for having truncated any torn tail first
    /// (see [`RecordLogWriter::truncate_to`]).
    pub fn open(path: impl AsRef<Path>, durability: DurabilityMode) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        // For Cache mode, don't create any files
        if !durability.requires_log() {
            return Ok(RecordLogWriter {
                file: None,
                path,
                durability,
                len: 0,
                last_sync_time: Instant::now(),
                has_unsynced_data: false,
                counters: LogCounters::default(),
            });
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let len = file.metadata()?.len();

        Ok(RecordLogWriter {
            file: Some(file),
            path,
            durability,
            len,
            last_sync_time: Instant::now(),
            has_unsynced_data: false,
            counters: LogCounters::default(),
        })
    }

    /// Truncate an existing log to `valid_end` bytes and sync it.
    ///
    /// Used by recovery to discard a torn trailing frame.
    pub fn truncate_to(path: impl AsRef<Path>, valid_end: u64) -> io::Result<()> {
        let file = OpenOptions::new().write(true).open(path.as_ref())?;
        file.set_len(valid_end)?;
        file.sync_all()
    }

    /// Commit one buffer of encoded frames.
    ///
    /// Respects the configured durability mode:
    /// - `Cache`: No-op, returns immediately
    /// - `Always`: Writes and fsyncs before returning
    /// - `Standard`: Writes, fsyncs if the interval is overdue
    ///
    /// On error the log is rolled back to its previous length.
    pub fn commit(&mut self, frames: &[u8]) -> io::Result<()> {
        if frames.is_empty() {
            return Ok(());
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };

        let prev_len = self.len;
        let result = file.write_all(frames).and_then(|_| {
            if self.durability.requires_immediate_fsync() {
                file.sync_data()
            } else {
                Ok(())
            }
        });

        if let Err(e) = result {
            // Roll back; report the write error, not the rollback result
            let _ = file.set_len(prev_len);
            return Err(e);
        }

        self.len = prev_len + frames.len() as u64;
        self.counters.commits += 1;
        self.counters.bytes_written += frames.len() as u64;

        if self.durability.requires_immediate_fsync() {
            self.counters.sync_calls += 1;
            self.last_sync_time = Instant::now();
        } else {
            self.has_unsynced_data = true;
            // The frames are written; a failed periodic sync is retried by the
            // next flush and must not fail this commit
            if let Err(e) = self.sync_if_overdue() {
                tracing::warn!(
                    target: "hippocampus::durability",
                    path = %self.path.display(),
                    error = %e,
                    "Periodic sync failed"
                );
            }
        }

        Ok(())
    }

    /// Force all committed data to disk, regardless of durability mode.
    pub fn flush(&mut self) -> io::Result<()> {
        if let Some(ref file) = self.file {
            if self.has_unsynced_data {
                file.sync_data()?;
                self.counters.sync_calls += 1;
            }
        }
        self.last_sync_time = Instant::now();
        self.has_unsynced_data = false;
        Ok(())
    }

    /// Sync if the Standard interval has elapsed and there is unsynced data.
    ///
    /// Returns `true` if a sync was performed.
    pub fn sync_if_overdue(&mut self) -> io::Result<bool> {
        if !self.has_unsynced_data {
            return Ok(false);
        }

        if let DurabilityMode::Standard { interval_ms } = self.durability {
            if self.last_sync_time.elapsed().as_millis() as u64 >= interval_ms {
                self.flush()?;
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Committed length of the log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Check whether nothing has been committed
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the log path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the durability mode
    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }

    /// Get a snapshot of cumulative counters
    pub fn counters(&self) -> LogCounters {
        self.counters.clone()
    }
}

impl Drop for RecordLogWriter {
    fn drop(&mut self) {
        if self.has_unsynced_data {
            if let Some(ref file) = self.file {
                if let Err(e) = file.sync_data() {
                    tracing::warn!(
                        target: "hippocampus::durability",
                        path = %self.path.display(),
                        error = %e,
                        "Final sync of record log failed"
                    );
                }
            }
        }
    }
}

impl std::fmt::Debug for RecordLogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLogWriter")
            .field("path", &self.path)
            .field("durability", &self.durability)
            .field("len", &self.len)
            .finish()
    }
}
