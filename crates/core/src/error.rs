//! Error types for Hippocampus
//!
//! Every fallible operation in the workspace returns [`HippoResult`]. The
//! variants follow the failure taxonomy of the engine: textual and binary
//! vector errors, dimension disagreements, catalog lookups, batch rejection,
//! and fatal I/O (which includes log corruption detected during replay).
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Hippocampus operations
pub type HippoResult<T> = std::result::Result<T, HippoError>;

/// Errors produced while parsing the bracketed textual vector form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was not enclosed in `[` and `]`
    #[error("vector literal must be enclosed in '[' and ']'")]
    Unbracketed,

    /// A component was empty, not a number, or not finite
    #[error("invalid token {token:?} at position {position}")]
    InvalidToken {
        /// Zero-based component index
        position: usize,
        /// The offending token after trimming
        token: String,
    },
}

/// Errors produced while decoding the binary vector form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes than the header declares
    #[error("truncated vector: header declares {declared} bytes, {available} available")]
    Truncated {
        /// Bytes required by the header (header included)
        declared: usize,
        /// Bytes actually present
        available: usize,
    },

    /// Header declares a zero dimension
    #[error("invalid vector dimension {dim} in header")]
    InvalidDimension {
        /// Declared dimension
        dim: u32,
    },

    /// Bytes remain after the declared payload
    #[error("{extra} trailing bytes after vector payload")]
    TrailingBytes {
        /// Number of unexpected bytes
        extra: usize,
    },
}

/// Error type for the Hippocampus engine
#[derive(Debug, Error)]
pub enum HippoError {
    /// Malformed textual vector
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Malformed binary vector
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Vector length differs from the index dimension
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension declared by the index
        expected: usize,
        /// Length of the provided vector
        got: usize,
    },

    /// Requested dimension disagrees with the one already declared
    #[error("index '{name}' already declared with dimension {existing}, requested {requested}")]
    DimensionConflict {
        /// Index name (or store path)
        name: String,
        /// Persisted dimension
        existing: usize,
        /// Dimension the caller asked for
        requested: usize,
    },

    /// Index already exists (strict create)
    #[error("index already exists: {name}")]
    AlreadyExists {
        /// Index name
        name: String,
    },

    /// Index does not exist or was dropped
    #[error("index not found: {name}")]
    NotFound {
        /// Index name
        name: String,
    },

    /// One item of a batch failed validation; nothing was written
    #[error("batch item {index} rejected: {source}")]
    Batch {
        /// Position of the failing item within the batch
        index: usize,
        /// Why the item was rejected
        #[source]
        source: Box<HippoError>,
    },

    /// Search query vector length differs from the index dimension
    #[error("query dimension mismatch: index has {expected}, query has {got}")]
    QueryDimensionMismatch {
        /// Dimension declared by the index
        expected: usize,
        /// Length of the query vector
        got: usize,
    },

    /// Vector contains NaN or infinite components
    #[error("invalid vector: {reason}")]
    InvalidVector {
        /// Description of the problem
        reason: String,
    },

    /// Index name failed validation
    #[error("invalid index name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Any other invalid argument
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem
        message: String,
    },

    /// Durable write, sync, or open failure
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What the engine was doing
        context: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Record log contents are structurally invalid
    #[error("corrupt record log {path}: {reason} (offset {offset})")]
    Corruption {
        /// Log file
        path: PathBuf,
        /// Byte offset of the offending frame
        offset: u64,
        /// What was wrong
        reason: String,
    },

    /// Serialization/deserialization error (manifest, metadata)
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    Config(String),

    /// Catalog directory is held by another process
    #[error("catalog at '{path}' is already in use by another process")]
    Locked {
        /// Catalog root
        path: PathBuf,
    },
}

impl HippoError {
    /// Wrap an `io::Error` with a short description of the failed action
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        HippoError::Io {
            context: context.into(),
            source,
        }
    }

    /// Shorthand for [`HippoError::InvalidInput`]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        HippoError::InvalidInput {
            message: message.into(),
        }
    }

    /// Shorthand for [`HippoError::NotFound`]
    pub fn not_found(name: impl Into<String>) -> Self {
        HippoError::NotFound { name: name.into() }
    }

    /// Attach a batch position to an item error
    pub fn in_batch(self, index: usize) -> Self {
        HippoError::Batch {
            index,
            source: Box::new(self),
        }
    }

    /// Check if this error indicates the index was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, HippoError::NotFound { .. })
    }

    /// Check if this error is a validation error detected before any mutation
    pub fn is_validation_error(&self) -> bool {
        match self {
            HippoError::Parse(_)
            | HippoError::Decode(_)
            | HippoError::DimensionMismatch { .. }
            | HippoError::DimensionConflict { .. }
            | HippoError::QueryDimensionMismatch { .. }
            | HippoError::InvalidVector { .. }
            | HippoError::InvalidName { .. }
            | HippoError::InvalidInput { .. } => true,
            HippoError::Batch { source, .. } => source.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error belongs to the fatal I/O class (I/O or corruption)
    pub fn is_io(&self) -> bool {
        matches!(self, HippoError::Io { .. } | HippoError::Corruption { .. })
    }
}

impl From<serde_json::Error> for HippoError {
    fn from(e: serde_json::Error) -> Self {
        HippoError::Serialization(e.to_string())
    }
}
