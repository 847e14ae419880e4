//! Index directory structure
//!
//! Every index is a directory under the catalog's `indexes/` directory:
//!
//! ```text
//! <root>/indexes/<name>/
//! ├── MANIFEST       # MessagePack IndexManifest
//! └── records.log    # Append-only record frames
//! ```

use std::path::{Path, PathBuf};

/// Manifest file name
pub const MANIFEST_FILE: &str = "MANIFEST";

/// Record log file name
pub const LOG_FILE: &str = "records.log";

/// Index directory paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    dir: PathBuf,
}

impl IndexPaths {
    /// Create paths from the index directory
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        IndexPaths {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the index directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the MANIFEST file path
    pub fn manifest(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Get the record log path
    pub fn log(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    /// Check if an index exists at this path
    ///
    /// An index exists if either its manifest or its record log is present.
    pub fn exists(&self) -> bool {
        self.manifest().exists() || self.log().exists()
    }
}
