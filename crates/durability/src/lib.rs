//! Durability layer for Hippocampus
//!
//! This crate handles everything that touches disk:
//!
//! - Record frames: the append-only on-disk record encoding
//! - Durability modes: Always, Standard (default), Cache
//! - Record log writer with rollback on failed commits
//! - Record log reader with torn-tail detection for replay
//! - Per-index MANIFEST and directory layout

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod frame;
pub mod manifest;
pub mod mode;
pub mod paths;
pub mod reader;
pub mod writer;

pub use frame::{decode_frame, encode_frame, FrameError, LENGTH_PREFIX_SIZE};
pub use manifest::{IndexManifest, MANIFEST_FORMAT_VERSION};
pub use mode::DurabilityMode;
pub use paths::{IndexPaths, LOG_FILE, MANIFEST_FILE};
pub use reader::{LogReadResult, ReadStopReason, RecordLogReader};
pub use writer::{LogCounters, RecordLogWriter};
