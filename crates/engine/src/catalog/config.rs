//! Catalog configuration via `hippocampus.toml`
//!
//! On first open, a default `hippocampus.toml` is created in the catalog
//! root. To change settings, edit the file and reopen the catalog.

use crate::search::SearchOptions;
use crate::store::StoreOptions;
use hippocampus_core::{DistanceMetric, HippoError, HippoResult, Limits};
use hippocampus_durability::DurabilityMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed in the catalog root.
pub const CONFIG_FILE_NAME: &str = "hippocampus.toml";

/// Upper bound on `search.band_dims`
pub const MAX_BAND_DIMS: usize = 64;

/// Search tuning, persisted under `[search]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Leading coordinates kept in the band index (0 disables it)
    #[serde(default = "default_band_dims")]
    pub band_dims: usize,
    /// Minimum records before the band index is used
    #[serde(default = "default_accelerate_min_records")]
    pub accelerate_min_records: usize,
    /// Minimum candidates before distances are computed in parallel
    #[serde(default = "default_parallel_min_records")]
    pub parallel_min_records: usize,
}

fn default_band_dims() -> usize {
    4
}

fn default_accelerate_min_records() -> usize {
    1024
}

fn default_parallel_min_records() -> usize {
    16_384
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            band_dims: default_band_dims(),
            accelerate_min_records: default_accelerate_min_records(),
            parallel_min_records: default_parallel_min_records(),
        }
    }
}

/// Catalog configuration loaded from `hippocampus.toml`.
///
/// # Example
///
/// ```toml
/// durability = "standard"
/// default_metric = "euclidean"
///
/// [search]
/// band_dims = 4
/// accelerate_min_records = 1024
/// parallel_min_records = 16384
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HippoConfig {
    /// Durability mode: `"standard"` or `"always"`.
    #[serde(default = "default_durability_str")]
    pub durability: String,
    /// Metric used by `create` when none is given: `"euclidean"` or `"cosine"`.
    #[serde(default = "default_metric_str")]
    pub default_metric: String,
    /// Search tuning.
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_durability_str() -> String {
    "standard".to_string()
}

fn default_metric_str() -> String {
    "euclidean".to_string()
}

impl Default for HippoConfig {
    fn default() -> Self {
        Self {
            durability: default_durability_str(),
            default_metric: default_metric_str(),
            search: SearchConfig::default(),
        }
    }
}

impl HippoConfig {
    /// Parse the durability string into a `DurabilityMode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"standard"` or `"always"`.
    pub fn durability_mode(&self) -> HippoResult<DurabilityMode> {
        DurabilityMode::parse(&self.durability).ok_or_else(|| {
            HippoError::Config(format!(
                "invalid durability mode '{}' in {}. Expected \"standard\" or \"always\".",
                self.durability, CONFIG_FILE_NAME
            ))
        })
    }

    /// Parse the default metric.
    pub fn metric(&self) -> HippoResult<DistanceMetric> {
        DistanceMetric::parse(&self.default_metric).ok_or_else(|| {
            HippoError::Config(format!(
                "invalid default_metric '{}' in {}. Expected \"euclidean\" or \"cosine\".",
                self.default_metric, CONFIG_FILE_NAME
            ))
        })
    }

    /// Validate every field eagerly.
    pub fn validate(&self) -> HippoResult<()> {
        self.durability_mode()?;
        self.metric()?;
        if self.search.band_dims > MAX_BAND_DIMS {
            return Err(HippoError::Config(format!(
                "search.band_dims = {} exceeds maximum of {}",
                self.search.band_dims, MAX_BAND_DIMS
            )));
        }
        if self.search.parallel_min_records == 0 {
            return Err(HippoError::Config(
                "search.parallel_min_records must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Store options for a catalog using this configuration.
    pub fn store_options(&self, durability: DurabilityMode) -> StoreOptions {
        StoreOptions {
            durability,
            limits: Limits::default(),
            band_dims: self.search.band_dims,
        }
    }

    /// Search options for a catalog using this configuration.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            accelerate_min_records: self.search.accelerate_min_records,
            parallel_min_records: self.search.parallel_min_records,
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Hippocampus catalog configuration
#
# Durability mode: "standard" (default) or "always"
#   "standard" = write through to the OS on every insert, fsync every ~100ms
#   "always"   = fsync every insert, zero data loss on power failure
durability = "standard"

# Metric for indexes created without an explicit one: "euclidean" or "cosine"
default_metric = "euclidean"

[search]
# Leading coordinates kept in the band index of Euclidean indexes (0 = off)
band_dims = 4
# Use the band index once an index holds at least this many records
accelerate_min_records = 1024
# Compute distances on all cores once a scan has at least this many candidates
parallel_min_records = 16384
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> HippoResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HippoError::io(format!("reading config file {}", path.display()), e))?;
        let config: HippoConfig = toml::from_str(&content).map_err(|e| {
            HippoError::Config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> HippoResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                HippoError::io(format!("writing default config file {}", path.display()), e)
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> HippoResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HippoError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| HippoError::io(format!("writing config file {}", path.display()), e))
    }
}
