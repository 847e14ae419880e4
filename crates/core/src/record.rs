//! Record, query and result types
//!
//! Records are immutable once written. Their identifiers are assigned by the
//! record store, increase monotonically, and are never reused.

use crate::distance::DistanceMetric;
use crate::error::{HippoError, HippoResult};
use crate::filter::MetadataFilter;
use crate::vector::Vector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Identifier of a record within one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Create a new RecordId
    pub fn new(id: u64) -> Self {
        RecordId(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record to be appended: vector, opaque value, optional metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Embedding
    pub vector: Vector,
    /// Opaque payload (e.g. a display string)
    #[serde(default)]
    pub value: Vec<u8>,
    /// Optional metadata object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

impl NewRecord {
    /// Create a new record input
    pub fn new(vector: impl Into<Vector>, value: impl Into<Vec<u8>>) -> Self {
        NewRecord {
            vector: vector.into(),
            value: value.into(),
            metadata: None,
        }
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A stored record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Assigned identifier
    pub id: RecordId,
    /// Embedding
    pub vector: Vector,
    /// Opaque payload
    pub value: Vec<u8>,
    /// Optional metadata object
    pub metadata: Option<JsonValue>,
}

impl Record {
    /// Assign an identifier to a record input
    pub fn from_new(id: RecordId, new: NewRecord) -> Self {
        Record {
            id,
            vector: new.vector,
            value: new.value,
            metadata: new.metadata,
        }
    }
}

/// Default number of results when the caller does not say
pub const DEFAULT_TOP_K: u32 = 10;

/// Nearest-neighbor query
///
/// `epsilon` and `threshold` are both inclusive upper bounds on distance; a
/// record must satisfy both. They default to `+inf` (no cutoff).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Query embedding
    pub query_vector: Vector,
    /// Absolute maximum distance
    pub epsilon: f32,
    /// Application-level maximum distance
    pub threshold: f32,
    /// Maximum number of results
    pub top_k: u32,
    /// Optional exact-match metadata filter
    pub metadata_filter: Option<MetadataFilter>,
}

impl SearchQuery {
    /// Query with no cutoffs and the default `top_k`
    pub fn new(query_vector: impl Into<Vector>) -> Self {
        SearchQuery {
            query_vector: query_vector.into(),
            epsilon: f32::INFINITY,
            threshold: f32::INFINITY,
            top_k: DEFAULT_TOP_K,
            metadata_filter: None,
        }
    }

    /// Set the absolute distance cutoff
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the acceptance distance cutoff
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the result limit
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the metadata filter
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.metadata_filter = Some(filter);
        self
    }

    /// The effective distance bound (the tighter of the two cutoffs)
    pub fn bound(&self) -> f32 {
        self.epsilon.min(self.threshold)
    }

    /// Check whether a distance passes both cutoffs
    pub fn accepts(&self, distance: f32) -> bool {
        distance <= self.epsilon && distance <= self.threshold
    }

    /// Reject NaN cutoffs and non-finite query components
    pub fn validate(&self) -> HippoResult<()> {
        if self.epsilon.is_nan() || self.threshold.is_nan() {
            return Err(HippoError::invalid_input(
                "epsilon and threshold must not be NaN",
            ));
        }
        self.query_vector.validate_finite()
    }
}

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Matching record
    pub record_id: RecordId,
    /// Distance from the query vector
    pub distance: f32,
    /// Opaque payload of the record
    pub value: Vec<u8>,
    /// Metadata of the record
    pub metadata: Option<JsonValue>,
}

/// Index metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name
    pub name: String,
    /// Declared dimension
    pub dim: usize,
    /// Distance metric
    pub metric: DistanceMetric,
    /// Number of committed records
    pub record_count: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let q = SearchQuery::new(vec![1.0, 2.0]);
        assert_eq!(q.epsilon, f32::INFINITY);
        assert_eq!(q.threshold, f32::INFINITY);
        assert_eq!(q.top_k, DEFAULT_TOP_K);
        assert!(q.metadata_filter.is_none());
    }

    #[test]
    fn test_query_cutoffs_are_independent() {
        let q = SearchQuery::new(vec![0.0])
            .with_epsilon(2.0)
            .with_threshold(1.0);
        assert_eq!(q.bound(), 1.0);
        assert!(q.accepts(1.0));
        assert!(!q.accepts(1.5));

        let q = q.with_epsilon(0.5);
        assert_eq!(q.bound(), 0.5);
        assert!(!q.accepts(0.75));
    }

    #[test]
    fn test_query_validate() {
        assert!(SearchQuery::new(vec![0.0]).validate().is_ok());
        assert!(SearchQuery::new(vec![0.0])
            .with_epsilon(f32::NAN)
            .validate()
            .is_err());
        assert!(SearchQuery::new(vec![f32::NAN]).validate().is_err());
    }

    #[test]
    fn test_record_id_ordering() {
        assert!(RecordId::new(1) < RecordId::new(2));
        assert_eq!(RecordId::new(7).to_string(), "7");
    }
}
