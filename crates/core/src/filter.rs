//! Metadata filtering for vector search
//!
//! A filter is an exact-match conjunction over top-level metadata keys: every
//! key in the filter must be present in the record's metadata with an equal
//! value. Values may be any JSON type. Numbers compare exactly by numeric
//! value: `1` matches `1.0`, but no tolerance is applied and large integers
//! are never rounded through `f64`. Arrays and objects compare structurally
//! with the same rule applied to nested numbers.

use crate::error::{HippoError, HippoResult};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};
use std::collections::BTreeMap;

/// Metadata filter for search (equality only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Top-level field equality
    /// All conditions must match (AND semantics)
    pub equals: BTreeMap<String, JsonValue>,
}

impl MetadataFilter {
    /// Create an empty filter (matches all)
    pub fn new() -> Self {
        MetadataFilter {
            equals: BTreeMap::new(),
        }
    }

    /// Add an equality condition
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.equals.insert(field.into(), value.into());
        self
    }

    /// Build a filter from a JSON document
    ///
    /// The document must be an object; each of its entries becomes one
    /// equality condition.
    pub fn from_document(document: &JsonValue) -> HippoResult<Self> {
        let obj = document.as_object().ok_or_else(|| {
            HippoError::invalid_input(format!(
                "metadata filter must be a JSON object, got {}",
                json_type_name(document)
            ))
        })?;
        Ok(MetadataFilter {
            equals: obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    /// Check if metadata matches this filter
    ///
    /// Returns true if all conditions match.
    /// Returns false if metadata is None (or not an object) and the filter is non-empty.
    pub fn matches(&self, metadata: Option<&JsonValue>) -> bool {
        if self.equals.is_empty() {
            return true;
        }

        let Some(obj) = metadata.and_then(JsonValue::as_object) else {
            return false;
        };

        self.equals.iter().all(|(key, expected)| {
            obj.get(key)
                .is_some_and(|actual| json_values_equal(expected, actual))
        })
    }

    /// Check if filter is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    /// Get the number of conditions in the filter
    pub fn len(&self) -> usize {
        self.equals.len()
    }
}

/// Check that a metadata document is acceptable for storage
///
/// Metadata must be a JSON object when present.
pub fn validate_metadata(metadata: Option<&JsonValue>) -> HippoResult<()> {
    match metadata {
        None | Some(JsonValue::Object(_)) => Ok(()),
        Some(other) => Err(HippoError::invalid_input(format!(
            "metadata must be a JSON object, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => numbers_equal(x, y),
        (JsonValue::Array(xs), JsonValue::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_values_equal(x, y))
        }
        (JsonValue::Object(xs), JsonValue::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (as_integer(x), as_integer(y)) {
        (Some(a), Some(b)) => a == b,
        (Some(i), None) => y.as_f64().is_some_and(|f| float_equals_integer(f, i)),
        (None, Some(i)) => x.as_f64().is_some_and(|f| float_equals_integer(f, i)),
        (None, None) => x.as_f64() == y.as_f64(),
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn float_equals_integer(f: f64, i: i128) -> bool {
    // Casting an integral f64 within range is exact; out of range saturates
    f.fract() == 0.0 && f as i128 == i
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
