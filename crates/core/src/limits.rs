//! Size limits and index name validation
//!
//! Limits are checked before anything is written, so a violation is always a
//! validation error and never leaves a partial record behind.

use crate::error::{HippoError, HippoResult};

/// Maximum index name length in bytes
pub const MAX_INDEX_NAME_BYTES: usize = 128;

/// Size limits enforced on every append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum vector dimension (default: 65536)
    pub max_dim: usize,

    /// Maximum opaque value size in bytes (default: 16MB)
    pub max_value_bytes: usize,

    /// Maximum encoded metadata size in bytes (default: 1MB)
    pub max_metadata_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_dim: 65_536,
            max_value_bytes: 16 * 1024 * 1024,
            max_metadata_bytes: 1024 * 1024,
        }
    }
}

impl Limits {
    /// Check a declared index dimension
    pub fn validate_dim(&self, dim: usize) -> HippoResult<()> {
        if dim == 0 {
            return Err(HippoError::invalid_input("dimension must be at least 1"));
        }
        if dim > self.max_dim {
            return Err(HippoError::invalid_input(format!(
                "dimension {} exceeds maximum of {}",
                dim, self.max_dim
            )));
        }
        Ok(())
    }

    /// Check an opaque value length
    pub fn validate_value_len(&self, len: usize) -> HippoResult<()> {
        if len > self.max_value_bytes {
            return Err(HippoError::invalid_input(format!(
                "value of {} bytes exceeds maximum of {}",
                len, self.max_value_bytes
            )));
        }
        Ok(())
    }

    /// Check an encoded metadata length
    pub fn validate_metadata_len(&self, len: usize) -> HippoResult<()> {
        if len > self.max_metadata_bytes {
            return Err(HippoError::invalid_input(format!(
                "metadata of {} bytes exceeds maximum of {}",
                len, self.max_metadata_bytes
            )));
        }
        Ok(())
    }
}

/// Validate an index name
///
/// Index names become directory names under the catalog root, so anything
/// that could escape or collide with catalog files is rejected.
pub fn validate_index_name(name: &str) -> HippoResult<()> {
    let reject = |reason: &str| {
        Err(HippoError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return reject("index name cannot be empty");
    }

    if name.len() > MAX_INDEX_NAME_BYTES {
        return reject("index name cannot exceed 128 bytes");
    }

    if name.contains('/') || name.contains('\\') {
        return reject("index name cannot contain path separators");
    }

    if name.contains('\0') {
        return reject("index name cannot contain null bytes");
    }

    // Hidden files and catalog-internal entries
    if name.starts_with('.') || name.starts_with('_') {
        return reject("index names starting with '.' or '_' are reserved");
    }

    Ok(())
}
