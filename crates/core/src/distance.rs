//! Distance metrics
//!
//! Scores are distances: lower = more similar, `0` for identical inputs.
//! Accumulation happens in `f64` and the result is narrowed to `f32` once, so
//! high-dimensional inputs do not lose precision to cancellation.
//!
//! No implicit normalization of vectors. Vectors are used as-is.

use crate::error::{HippoError, HippoResult};
use serde::{Deserialize, Serialize};

/// Distance function used by an index
///
/// Fixed per index at creation time and persisted in the index manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance: `sqrt(sum((a - b)^2))`
    /// Range: [0, inf)
    #[default]
    Euclidean,

    /// Cosine distance: `1 - dot(a,b) / (||a|| * ||b||)`
    /// Range: [0, 2]
    Cosine,
}

impl DistanceMetric {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Cosine => "cosine",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "euclidean" | "l2" => Some(DistanceMetric::Euclidean),
            "cosine" => Some(DistanceMetric::Cosine),
            _ => None,
        }
    }

    /// Serialization value for the manifest
    pub fn to_byte(&self) -> u8 {
        match self {
            DistanceMetric::Euclidean => 0,
            DistanceMetric::Cosine => 1,
        }
    }

    /// Deserialization from the manifest
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(DistanceMetric::Euclidean),
            1 => Some(DistanceMetric::Cosine),
            _ => None,
        }
    }

    /// Distance between two vectors of equal length
    ///
    /// Mismatched lengths are a precondition violation reported as
    /// `DimensionMismatch` (with `a` as the reference length); inputs are never
    /// padded or truncated.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> HippoResult<f32> {
        if a.len() != b.len() {
            return Err(HippoError::DimensionMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        Ok(self.distance_unchecked(a, b))
    }

    /// Distance without the length check
    ///
    /// Callers guarantee `a.len() == b.len()`.
    pub fn distance_unchecked(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in distance computation");
        match self {
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::Cosine => cosine_distance(a, b),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Squared Euclidean distance accumulated in f64
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum()
}

/// Euclidean distance (L2 distance)
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean(a, b).sqrt() as f32
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        // Undefined angle: identical zero vectors are at distance 0
        return if norm_a == norm_b { 0.0 } else { 1.0 };
    }

    let cos = dot / (norm_a.sqrt() * norm_b.sqrt());
    (1.0 - cos).clamp(0.0, 2.0) as f32
}
