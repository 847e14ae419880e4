//! Nearest-neighbor search over a snapshot
//!
//! Pipeline, identical for every execution strategy:
//! 1. Drop records that fail the metadata filter
//! 2. Compute the distance to the query vector
//! 3. Keep records with `distance <= epsilon && distance <= threshold`
//! 4. Sort by (distance asc, record id asc)
//! 5. Truncate to `top_k`
//!
//! Strategies differ only in which records reach step 1. The flat scan visits
//! every record. The band scan visits the candidates of the coordinate band
//! index, a superset of every record that can pass step 3. Large candidate
//! sets are evaluated in parallel with rayon; the total order of step 4 keeps
//! the output deterministic.

use crate::snapshot::Snapshot;
use hippocampus_core::{HippoError, HippoResult, Record, RecordId, SearchMatch, SearchQuery};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Search tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Use the band index only for snapshots with at least this many records
    pub accelerate_min_records: usize,
    /// Evaluate distances in parallel from this many candidates on
    pub parallel_min_records: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            accelerate_min_records: 1024,
            parallel_min_records: 16_384,
        }
    }
}

/// How a query visits records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Every record in id order
    Flat,
    /// Band index candidates in id order
    Band,
}

/// Executes queries against snapshots
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    options: SearchOptions,
}

impl SearchEngine {
    /// Create an engine with the given options
    pub fn new(options: SearchOptions) -> Self {
        SearchEngine { options }
    }

    /// Engine options
    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// Run a query, choosing the strategy automatically
    pub fn search(&self, snapshot: &Snapshot, query: &SearchQuery) -> HippoResult<Vec<SearchMatch>> {
        let strategy = self.plan(snapshot, query);
        self.search_with(snapshot, query, strategy)
    }

    /// Run a query with the flat scan
    ///
    /// This is the reference every other strategy must match.
    pub fn flat_search(
        &self,
        snapshot: &Snapshot,
        query: &SearchQuery,
    ) -> HippoResult<Vec<SearchMatch>> {
        self.search_with(snapshot, query, ScanStrategy::Flat)
    }

    /// Strategy the engine would use for this query
    pub fn plan(&self, snapshot: &Snapshot, query: &SearchQuery) -> ScanStrategy {
        let bound = query.bound();
        if snapshot.band().is_some_and(|b| b.dims() > 0)
            && snapshot.len() >= self.options.accelerate_min_records
            && bound.is_finite()
        {
            ScanStrategy::Band
        } else {
            ScanStrategy::Flat
        }
    }

    /// Run a query with an explicit strategy
    ///
    /// `Band` falls back to `Flat` when the snapshot has no band index or the
    /// bound is not finite.
    pub fn search_with(
        &self,
        snapshot: &Snapshot,
        query: &SearchQuery,
        strategy: ScanStrategy,
    ) -> HippoResult<Vec<SearchMatch>> {
        let start = Instant::now();

        if query.query_vector.dim() != snapshot.dim() {
            return Err(HippoError::QueryDimensionMismatch {
                expected: snapshot.dim(),
                got: query.query_vector.dim(),
            });
        }
        query.validate()?;

        let bound = query.bound();
        if query.top_k == 0 || bound < 0.0 || snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let q = query.query_vector.as_slice();
        let band_ids = match strategy {
            ScanStrategy::Band if bound.is_finite() => {
                snapshot.band().and_then(|band| band.candidates(q, bound))
            }
            _ => None,
        };

        let evaluate = |record: &Record| -> Option<(f32, RecordId)> {
            if let Some(filter) = &query.metadata_filter {
                if !filter.matches(record.metadata.as_ref()) {
                    return None;
                }
            }
            let distance = snapshot
                .metric()
                .distance_unchecked(record.vector.as_slice(), q);
            query.accepts(distance).then_some((distance, record.id))
        };

        let parallel = self.options.parallel_min_records;
        let lookup = |id: &u64| snapshot.get(RecordId::new(*id)).and_then(|r| evaluate(r));
        let (candidates, mut hits): (usize, Vec<(f32, RecordId)>) = match &band_ids {
            Some(ids) if ids.len() >= parallel => {
                (ids.len(), ids.par_iter().filter_map(lookup).collect())
            }
            Some(ids) => (ids.len(), ids.iter().filter_map(lookup).collect()),
            None if snapshot.len() >= parallel => {
                let chunks: Vec<&[Arc<Record>]> = snapshot.chunks().collect();
                (
                    snapshot.len(),
                    chunks
                        .par_iter()
                        .flat_map_iter(|chunk| chunk.iter().filter_map(|r| evaluate(r)))
                        .collect(),
                )
            }
            None => (
                snapshot.len(),
                snapshot.records().filter_map(|r| evaluate(r)).collect(),
            ),
        };

        let k = query.top_k as usize;
        if hits.len() > k {
            hits.select_nth_unstable_by(k, compare_hits);
            hits.truncate(k);
        }
        hits.sort_unstable_by(compare_hits);

        let matches: Vec<SearchMatch> = hits
            .into_iter()
            .filter_map(|(distance, id)| {
                let record = snapshot.get(id)?;
                Some(SearchMatch {
                    record_id: id,
                    distance,
                    value: record.value.clone(),
                    metadata: record.metadata.clone(),
                })
            })
            .collect();

        let used = if band_ids.is_some() {
            ScanStrategy::Band
        } else {
            ScanStrategy::Flat
        };
        debug!(
            target: "hippocampus::search",
            strategy = ?used,
            records = snapshot.len(),
            candidates,
            results = matches.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Search completed"
        );

        Ok(matches)
    }
}

/// Ascending distance, then ascending id
fn compare_hits(a: &(f32, RecordId), b: &(f32, RecordId)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RecordStore, StoreOptions};
    use hippocampus_core::{DistanceMetric, MetadataFilter, NewRecord, Vector};
    use serde_json::json;

    fn store(metric: DistanceMetric, points: &[&[f32]]) -> RecordStore {
        let dim = points[0].len();
        let store = RecordStore::in_memory("t", dim, metric, &StoreOptions::default()).unwrap();
        store
            .append_batch(
                points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| NewRecord::new(p.to_vec(), format!("r{i}").into_bytes()))
                    .collect(),
            )
            .unwrap();
        store
    }

    fn ids(matches: &[SearchMatch]) -> Vec<u64> {
        matches.iter().map(|m| m.record_id.as_u64()).collect()
    }

    #[test]
    fn test_tie_broken_by_id() {
        let s = store(DistanceMetric::Euclidean, &[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0]]);
        let query = SearchQuery::new(vec![0.0, 0.0])
            .with_epsilon(1.5)
            .with_threshold(1.5)
            .with_top_k(2);
        let results = SearchEngine::default().search(&s.snapshot(), &query).unwrap();
        assert_eq!(ids(&results), vec![0, 1]);
        assert_eq!(results[0].distance, 0.0);
        assert_eq!(results[1].distance, 1.0);
        assert_eq!(results[1].value, b"r1");
    }

    #[test]
    fn test_both_cutoffs_apply() {
        let s = store(DistanceMetric::Euclidean, &[&[0.0], &[1.0], &[2.0], &[3.0]]);
        let engine = SearchEngine::default();
        let snapshot = s.snapshot();

        let loose_threshold = SearchQuery::new(vec![0.0]).with_epsilon(1.0).with_threshold(10.0);
        assert_eq!(ids(&engine.search(&snapshot, &loose_threshold).unwrap()), vec![0, 1]);

        let loose_epsilon = SearchQuery::new(vec![0.0]).with_epsilon(10.0).with_threshold(2.0);
        assert_eq!(ids(&engine.search(&snapshot, &loose_epsilon).unwrap()), vec![0, 1, 2]);
    }

    #[test]
    fn test_top_k_zero_is_empty() {
        let s = store(DistanceMetric::Euclidean, &[&[0.0]]);
        let query = SearchQuery::new(vec![0.0]).with_top_k(0);
        assert!(SearchEngine::default().search(&s.snapshot(), &query).unwrap().is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let s = store(DistanceMetric::Euclidean, &[&[0.0, 0.0]]);
        let err = SearchEngine::default()
            .search(&s.snapshot(), &SearchQuery::new(vec![0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            HippoError::QueryDimensionMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn test_nan_cutoff_rejected() {
        let s = store(DistanceMetric::Euclidean, &[&[0.0]]);
        let query = SearchQuery::new(vec![0.0]).with_threshold(f32::NAN);
        let err = SearchEngine::default().search(&s.snapshot(), &query).unwrap_err();
        assert!(matches!(err, HippoError::InvalidInput { .. }));
    }

    #[test]
    fn test_filter_excludes_nearest() {
        let s = RecordStore::in_memory("t", 1, DistanceMetric::Euclidean, &StoreOptions::default())
            .unwrap();
        s.append(Vector::new(vec![0.0]), b"near".to_vec(), Some(json!({"tag": "opinion"})))
            .unwrap();
        s.append(Vector::new(vec![5.0]), b"far".to_vec(), Some(json!({"tag": "fact"})))
            .unwrap();
        s.append(Vector::new(vec![0.1]), b"bare".to_vec(), None).unwrap();

        let query = SearchQuery::new(vec![0.0]).with_filter(MetadataFilter::new().eq("tag", "fact"));
        let results = SearchEngine::default().search(&s.snapshot(), &query).unwrap();
        assert_eq!(ids(&results), vec![1]);
        assert_eq!(results[0].metadata, Some(json!({"tag": "fact"})));
    }

    #[test]
    fn test_cosine_ranking() {
        let s = store(DistanceMetric::Cosine, &[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]]);
        let results = SearchEngine::default()
            .search(&s.snapshot(), &SearchQuery::new(vec![2.0, 0.0]))
            .unwrap();
        assert_eq!(ids(&results), vec![0, 2, 1]);
        assert!(results[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_band_strategy_selected_and_equivalent() {
        let points: Vec<Vec<f32>> = (0..64)
            .map(|i| vec![(i % 8) as f32, (i / 8) as f32, 0.5])
            .collect();
        let refs: Vec<&[f32]> = points.iter().map(Vec::as_slice).collect();
        let s = store(DistanceMetric::Euclidean, &refs);
        let engine = SearchEngine::new(SearchOptions {
            accelerate_min_records: 10,
            parallel_min_records: 32,
        });
        let snapshot = s.snapshot();

        let query = SearchQuery::new(vec![3.0, 4.0, 0.5]).with_epsilon(1.0).with_top_k(64);
        assert_eq!(engine.plan(&snapshot, &query), ScanStrategy::Band);
        assert_eq!(
            engine.plan(&snapshot, &SearchQuery::new(vec![3.0, 4.0, 0.5])),
            ScanStrategy::Flat
        );

        let band = engine.search(&snapshot, &query).unwrap();
        let flat = engine.flat_search(&snapshot, &query).unwrap();
        assert_eq!(band, flat);
        // (3,4) itself, then its four axis neighbours
        assert_eq!(ids(&band), vec![35, 27, 34, 36, 43]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let points: Vec<Vec<f32>> = (0..200).map(|i| vec![(i % 17) as f32, (i % 5) as f32]).collect();
        let refs: Vec<&[f32]> = points.iter().map(Vec::as_slice).collect();
        let s = store(DistanceMetric::Euclidean, &refs);
        let snapshot = s.snapshot();
        let query = SearchQuery::new(vec![8.0, 2.0]).with_top_k(50);

        let sequential = SearchEngine::default().flat_search(&snapshot, &query).unwrap();
        let parallel = SearchEngine::new(SearchOptions {
            accelerate_min_records: usize::MAX,
            parallel_min_records: 1,
        })
        .search(&snapshot, &query)
        .unwrap();
        assert_eq!(sequential, parallel);
    }
}
