//! Per-index MANIFEST
//!
//! MessagePack-encoded `{format_version, name, dim, metric, created_at}`.
//! Written once when the index is created (or when a log is found without
//! one) and never modified afterwards.

use chrono::{DateTime, Utc};
use hippocampus_core::{DistanceMetric, HippoError, HippoResult};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Current manifest format version
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ManifestRepr {
    format_version: u32,
    name: String,
    dim: u32,
    metric: u8,
    created_at: DateTime<Utc>,
}

/// Persisted index properties
#[derive(Debug, Clone, PartialEq)]
pub struct IndexManifest {
    /// Index name
    pub name: String,
    /// Declared dimension
    pub dim: usize,
    /// Distance metric
    pub metric: DistanceMetric,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl IndexManifest {
    /// Create a manifest stamped with the current time
    pub fn new(name: impl Into<String>, dim: usize, metric: DistanceMetric) -> Self {
        IndexManifest {
            name: name.into(),
            dim,
            metric,
            created_at: Utc::now(),
        }
    }

    /// Serialize to MessagePack
    pub fn to_bytes(&self) -> HippoResult<Vec<u8>> {
        let repr = ManifestRepr {
            format_version: MANIFEST_FORMAT_VERSION,
            name: self.name.clone(),
            dim: self.dim as u32,
            metric: self.metric.to_byte(),
            created_at: self.created_at,
        };
        rmp_serde::to_vec(&repr)
            .map_err(|e| HippoError::Serialization(format!("encoding manifest: {}", e)))
    }

    /// Deserialize from MessagePack
    pub fn from_bytes(bytes: &[u8]) -> HippoResult<Self> {
        let repr: ManifestRepr = rmp_serde::from_slice(bytes)
            .map_err(|e| HippoError::Serialization(format!("decoding manifest: {}", e)))?;

        if repr.format_version != MANIFEST_FORMAT_VERSION {
            return Err(HippoError::Serialization(format!(
                "unsupported manifest format version {}",
                repr.format_version
            )));
        }
        if repr.dim == 0 {
            return Err(HippoError::Serialization(
                "manifest declares dimension 0".to_string(),
            ));
        }
        let metric = DistanceMetric::from_byte(repr.metric).ok_or_else(|| {
            HippoError::Serialization(format!("unknown metric tag {}", repr.metric))
        })?;

        Ok(IndexManifest {
            name: repr.name,
            dim: repr.dim as usize,
            metric,
            created_at: repr.created_at,
        })
    }

    /// Load the manifest at `path`, or `None` if there is none
    pub fn load(path: &Path) -> HippoResult<Option<Self>> {
        match std::fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HippoError::io(
                format!("reading manifest {}", path.display()),
                e,
            )),
        }
    }

    /// Write the manifest to `path` atomically (temp file, fsync, rename)
    pub fn write(&self, path: &Path) -> HippoResult<()> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        let context = || format!("writing manifest {}", path.display());

        let mut file = std::fs::File::create(&tmp).map_err(|e| HippoError::io(context(), e))?;
        file.write_all(&bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| HippoError::io(context(), e))?;
        std::fs::rename(&tmp, path).map_err(|e| HippoError::io(context(), e))?;
        Ok(())
    }
}
