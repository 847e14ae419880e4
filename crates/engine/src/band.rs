//! Coordinate band index for Euclidean pre-filtering
//!
//! For each of the first `min(dim, band_dims)` coordinates the index keeps a
//! sorted list of `(coordinate, record id)`. Euclidean distance is never
//! smaller than the difference on any single coordinate, so every record
//! within distance `b` of the query lies inside `[q_d - b, q_d + b]` on every
//! indexed coordinate `d`. Searching the narrowest such band yields a
//! candidate superset; exact distances then decide membership.
//!
//! The bound is widened slightly before use so that `f32` rounding of the
//! final distance can never push a qualifying record outside its band.

use hippocampus_core::Record;
use std::sync::Arc;

/// Relative widening applied to the search bound
const BOUND_SLACK: f64 = 1e-5;

/// Inserts larger than this re-sort a column instead of shifting it
const RESORT_THRESHOLD: usize = 32;

/// Sorted per-coordinate columns over a record set
#[derive(Debug, Clone, Default)]
pub struct BandIndex {
    columns: Vec<Vec<(f32, u64)>>,
}

impl BandIndex {
    /// Create an empty index over the first `min(dim, band_dims)` coordinates
    pub fn new(dim: usize, band_dims: usize) -> Self {
        BandIndex {
            columns: vec![Vec::new(); dim.min(band_dims)],
        }
    }

    /// Number of indexed coordinates
    pub fn dims(&self) -> usize {
        self.columns.len()
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Check whether no records are indexed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add records (already assigned ids) to every column
    pub fn extend(&mut self, records: &[Arc<Record>]) {
        for (d, column) in self.columns.iter_mut().enumerate() {
            if records.len() > RESORT_THRESHOLD {
                column.extend(
                    records
                        .iter()
                        .map(|r| (r.vector.as_slice()[d], r.id.as_u64())),
                );
                column.sort_unstable_by(compare_entries);
            } else {
                for r in records {
                    let entry = (r.vector.as_slice()[d], r.id.as_u64());
                    let pos = column.partition_point(|e| compare_entries(e, &entry).is_lt());
                    column.insert(pos, entry);
                }
            }
        }
    }

    /// Candidate record ids for a query and a finite, non-negative bound
    ///
    /// Returns ids in ascending order, or `None` if the index has no columns.
    pub fn candidates(&self, query: &[f32], bound: f32) -> Option<Vec<u64>> {
        let widened = bound as f64 * (1.0 + BOUND_SLACK) + f64::MIN_POSITIVE;

        let (column, lo, hi) = self
            .columns
            .iter()
            .enumerate()
            .map(|(d, column)| {
                let center = query[d] as f64;
                let (lower, upper) = (center - widened, center + widened);
                let lo = column.partition_point(|&(c, _)| (c as f64) < lower);
                let hi = column.partition_point(|&(c, _)| (c as f64) <= upper);
                (column, lo, hi.max(lo))
            })
            .min_by_key(|&(_, lo, hi)| hi - lo)?;

        let mut ids: Vec<u64> = column[lo..hi].iter().map(|&(_, id)| id).collect();
        ids.sort_unstable();
        Some(ids)
    }
}

fn compare_entries(a: &(f32, u64), b: &(f32, u64)) -> std::cmp::Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}
