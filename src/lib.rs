//! Hippocampus - persistent named vector indexes
//!
//! Each index holds fixed-dimension vectors with an opaque value and optional
//! JSON metadata. Records are appended to a durable log and searched with a
//! distance cutoff, an acceptance threshold, a result limit and an optional
//! exact-match metadata filter.
//!
//! # Quick Start
//!
//! ```ignore
//! use hippocampus::{Hippocampus, Vector};
//!
//! let db = Hippocampus::open("/var/data/memories")?;
//! db.create_index("facts", 2)?;
//!
//! let vector = Vector::new(vec![0.0, 1.0]).encode();
//! let id = db.insert("facts", &vector, b"the sky is blue", None)?;
//!
//! let hits = db.search("facts", &vector, 0.5, 0.5, 10, None)?;
//! assert_eq!(hits[0].record_id, id);
//! ```
//!
//! # Architecture
//!
//! Vectors cross this boundary in their binary form and are decoded here.
//! Everything else is delegated to the [`IndexCatalog`]; the facade holds no
//! engine logic of its own.

use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub use hippocampus_core::{
    DistanceMetric, HippoError, HippoResult, IndexInfo, MetadataFilter, NewRecord, Record,
    RecordId, SearchMatch, SearchQuery, Vector, DEFAULT_TOP_K,
};
pub use hippocampus_durability::DurabilityMode;
pub use hippocampus_engine::{HippoConfig, IndexCatalog, SearchConfig};

/// One item of [`Hippocampus::batch_insert`]
#[derive(Debug, Clone, Copy)]
pub struct BatchItem<'a> {
    /// Binary-encoded vector
    pub vector: &'a [u8],
    /// Opaque payload
    pub value: &'a [u8],
    /// Optional metadata document (must be a JSON object)
    pub metadata: Option<&'a JsonValue>,
}

/// Handle to a catalog of vector indexes
#[derive(Debug, Clone)]
pub struct Hippocampus {
    catalog: Arc<IndexCatalog>,
}

impl Hippocampus {
    /// Open (or create) the catalog at `path`
    ///
    /// Handles opened for the same path in one process share state.
    pub fn open<P: AsRef<Path>>(path: P) -> HippoResult<Self> {
        let catalog = IndexCatalog::open(path)?;
        Ok(Hippocampus { catalog })
    }

    /// Open the catalog at `path` with an explicit configuration
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: HippoConfig) -> HippoResult<Self> {
        let catalog = IndexCatalog::open_with_config(path, config)?;
        Ok(Hippocampus { catalog })
    }

    /// Catalog that keeps everything in memory
    pub fn in_memory() -> Self {
        Hippocampus {
            catalog: IndexCatalog::in_memory(),
        }
    }

    /// Underlying catalog
    pub fn catalog(&self) -> &Arc<IndexCatalog> {
        &self.catalog
    }

    /// Create an index, or confirm an existing one has the same dimension
    pub fn create_index(&self, name: &str, dim: u32) -> HippoResult<()> {
        self.catalog.create(name, dim as usize)?;
        Ok(())
    }

    /// Create an index with an explicit distance metric
    pub fn create_index_with_metric(
        &self,
        name: &str,
        dim: u32,
        metric: DistanceMetric,
    ) -> HippoResult<()> {
        self.catalog.create_with_metric(name, dim as usize, metric)?;
        Ok(())
    }

    /// Insert one record
    pub fn insert(
        &self,
        name: &str,
        vector: &[u8],
        value: &[u8],
        metadata: Option<&JsonValue>,
    ) -> HippoResult<RecordId> {
        let store = self.catalog.open_index(name)?;
        let vector = Vector::decode(vector)?;
        store.append(vector, value.to_vec(), metadata.cloned())
    }

    /// Insert several records atomically
    ///
    /// A decode or validation failure of item `i` rejects the whole batch with
    /// `Batch { index: i, .. }`.
    pub fn batch_insert(&self, name: &str, items: &[BatchItem<'_>]) -> HippoResult<Vec<RecordId>> {
        let store = self.catalog.open_index(name)?;
        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let vector = Vector::decode(item.vector)
                    .map_err(|e| HippoError::from(e).in_batch(i))?;
                Ok(NewRecord {
                    vector,
                    value: item.value.to_vec(),
                    metadata: item.metadata.cloned(),
                })
            })
            .collect::<HippoResult<Vec<_>>>()?;
        debug!(target: "hippocampus::api", index = name, count = records.len(), "Batch insert");
        store.append_batch(records)
    }

    /// Search an index
    ///
    /// `filter`, when given, must be a JSON object of exact-match conditions.
    pub fn search(
        &self,
        name: &str,
        query_vector: &[u8],
        epsilon: f32,
        threshold: f32,
        top_k: u32,
        filter: Option<&JsonValue>,
    ) -> HippoResult<Vec<SearchMatch>> {
        let mut query = SearchQuery::new(Vector::decode(query_vector)?)
            .with_epsilon(epsilon)
            .with_threshold(threshold)
            .with_top_k(top_k);
        if let Some(document) = filter {
            query = query.with_filter(MetadataFilter::from_document(document)?);
        }
        self.catalog.search(name, &query)
    }

    /// Drop an index and delete its data
    pub fn drop_index(&self, name: &str) -> HippoResult<()> {
        self.catalog.drop_index(name)
    }

    /// Names of every index, sorted
    pub fn list_indexes(&self) -> HippoResult<Vec<String>> {
        self.catalog.list()
    }

    /// Metadata of one index
    pub fn index_info(&self, name: &str) -> HippoResult<IndexInfo> {
        self.catalog.info(name)
    }

    /// Force every open index to disk
    pub fn flush(&self) -> HippoResult<()> {
        self.catalog.flush()
    }
}
