//! Record log reader for replay on open.
//!
//! Replay policy:
//! - a trailing strict prefix of a frame is a torn write; everything before it
//!   is returned and `valid_end` marks where the log should be truncated
//! - a complete frame with invalid contents is corruption and fails the read,
//!   as is a dimension or length field above the configured limits
//! - read failures are I/O errors and fail the read

use crate::frame::{decode_frame, FrameError};
use hippocampus_core::{HippoError, HippoResult, Limits, NewRecord};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Why replay stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStopReason {
    /// Every byte of the log was consumed
    EndOfData,
    /// The log ends with an incomplete frame starting at `offset`
    PartialRecord {
        /// Byte offset of the incomplete frame
        offset: u64,
    },
}

/// Result of replaying a record log
#[derive(Debug, Clone)]
pub struct LogReadResult {
    /// Records in log order; the position is the record id
    pub records: Vec<NewRecord>,
    /// Dimension of the records (the expected one, or the first record's)
    pub dim: Option<usize>,
    /// End of the last complete frame
    pub valid_end: u64,
    /// Length of the file as found
    pub file_len: u64,
    /// Why reading stopped
    pub stop_reason: ReadStopReason,
}

impl LogReadResult {
    /// Check whether the log needs truncating to `valid_end`
    pub fn needs_truncation(&self) -> bool {
        self.valid_end < self.file_len
    }

    /// Number of trailing bytes that will be discarded
    pub fn discarded_bytes(&self) -> u64 {
        self.file_len - self.valid_end
    }
}

/// Record log reader
#[derive(Debug, Clone)]
pub struct RecordLogReader {
    path: PathBuf,
    expected_dim: Option<usize>,
    limits: Limits,
}

impl RecordLogReader {
    /// Create a reader for the log at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        RecordLogReader {
            path: path.as_ref().to_path_buf(),
            expected_dim: None,
            limits: Limits::default(),
        }
    }

    /// Require every frame to carry this dimension
    ///
    /// Without it, the first frame establishes the dimension.
    pub fn with_expected_dim(mut self, dim: Option<usize>) -> Self {
        self.expected_dim = dim;
        self
    }

    /// Size limits the log was written under
    ///
    /// A frame declaring a larger dimension or length is corruption, not a
    /// torn tail.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Read every complete record
    ///
    /// A missing log reads as empty.
    pub fn read_all(&self) -> HippoResult<LogReadResult> {
        let buffer = match std::fs::read(&self.path) {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(HippoError::io(
                    format!("reading record log {}", self.path.display()),
                    e,
                ))
            }
        };

        let mut records = Vec::new();
        let mut dim = self.expected_dim;
        let mut offset = 0usize;
        let mut stop_reason = ReadStopReason::EndOfData;

        while offset < buffer.len() {
            match decode_frame(&buffer[offset..], dim, &self.limits) {
                Ok((record, consumed)) => {
                    dim.get_or_insert(record.vector.dim());
                    records.push(record);
                    offset += consumed;
                }
                Err(FrameError::Incomplete) => {
                    // Partial record at end - expected after a crash mid-write
                    tracing::debug!(
                        target: "hippocampus::durability",
                        path = %self.path.display(),
                        offset,
                        trailing = buffer.len() - offset,
                        "Partial record at end of log"
                    );
                    stop_reason = ReadStopReason::PartialRecord {
                        offset: offset as u64,
                    };
                    break;
                }
                Err(FrameError::Invalid(reason)) => {
                    return Err(HippoError::Corruption {
                        path: self.path.clone(),
                        offset: offset as u64,
                        reason,
                    });
                }
            }
        }

        Ok(LogReadResult {
            records,
            dim,
            valid_end: offset as u64,
            file_len: buffer.len() as u64,
            stop_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_frame;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_log(path: &Path, records: &[NewRecord]) -> Vec<usize> {
        let mut buf = Vec::new();
        let mut ends = Vec::new();
        for record in records {
            encode_frame(&mut buf, record, &Limits::default()).unwrap();
            ends.push(buf.len());
        }
        std::fs::write(path, &buf).unwrap();
        ends
    }

    fn sample() -> Vec<NewRecord> {
        vec![
            NewRecord::new(vec![0.0, 0.0], b"a".to_vec()),
            NewRecord::new(vec![1.0, 0.0], b"b".to_vec()).with_metadata(json!({"tag": "fact"})),
            NewRecord::new(vec![0.0, 1.0], b"c".to_vec()),
        ]
    }

    #[test]
    fn test_missing_log_is_empty() {
        let dir = tempdir().unwrap();
        let result = RecordLogReader::new(dir.path().join("records.log"))
            .read_all()
            .unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.dim, None);
        assert_eq!(result.stop_reason, ReadStopReason::EndOfData);
    }

    #[test]
    fn test_read_all_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        write_log(&path, &sample());

        let result = RecordLogReader::new(&path).read_all().unwrap();
        assert_eq!(result.records, sample());
        assert_eq!(result.dim, Some(2));
        assert!(!result.needs_truncation());
    }

    #[test]
    fn test_torn_tail_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        let ends = write_log(&path, &sample());

        // Cut in the middle of the third frame
        let cut = ends[1] + 5;
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..cut]).unwrap();

        let result = RecordLogReader::new(&path)
            .with_expected_dim(Some(2))
            .read_all()
            .unwrap();
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.valid_end, ends[1] as u64);
        assert_eq!(result.discarded_bytes(), 5);
        assert_eq!(
            result.stop_reason,
            ReadStopReason::PartialRecord {
                offset: ends[1] as u64
            }
        );
    }

    #[test]
    fn test_dimension_disagreement_is_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        let mut records = sample();
        records.push(NewRecord::new(vec![1.0, 2.0, 3.0], Vec::new()));
        let ends = write_log(&path, &records);

        let err = RecordLogReader::new(&path).read_all().unwrap_err();
        match err {
            HippoError::Corruption { offset, .. } => assert_eq!(offset, ends[2] as u64),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn test_damaged_length_mid_log_is_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        let ends = write_log(&path, &sample());

        // value_len of the second frame points far past the end of the file
        let mut bytes = std::fs::read(&path).unwrap();
        let at = ends[0] + 12;
        bytes[at..at + 4].copy_from_slice(&0x7fff_ffffu32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        match RecordLogReader::new(&path).read_all().unwrap_err() {
            HippoError::Corruption { offset, .. } => assert_eq!(offset, ends[0] as u64),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn test_expected_dim_applies_to_first_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.log");
        write_log(&path, &sample());

        let err = RecordLogReader::new(&path)
            .with_expected_dim(Some(3))
            .read_all()
            .unwrap_err();
        assert!(err.is_io());
    }
}
