//! Core types for Hippocampus
//!
//! This crate defines the foundational types used throughout the system:
//! - Vector: fixed-dimension `f32` vectors with text and binary codecs
//! - DistanceMetric: Euclidean and cosine distance
//! - MetadataFilter: exact-match filtering over record metadata
//! - Record, SearchQuery, SearchMatch, IndexInfo: record and query types
//! - Limits: size limits and index name validation
//! - Error: the error type shared by every crate

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod filter;
pub mod limits;
pub mod record;
pub mod vector;

pub use distance::{squared_euclidean, DistanceMetric};
pub use error::{DecodeError, HippoError, HippoResult, ParseError};
pub use filter::{validate_metadata, MetadataFilter};
pub use limits::{validate_index_name, Limits, MAX_INDEX_NAME_BYTES};
pub use record::{
    IndexInfo, NewRecord, Record, RecordId, SearchMatch, SearchQuery, DEFAULT_TOP_K,
};
pub use vector::{Vector, FORMAT_PRECISION, VECTOR_HEADER_SIZE};
