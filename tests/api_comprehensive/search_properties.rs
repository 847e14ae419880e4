//! Search ordering, cutoffs and filtering through the facade

use crate::common::*;
use hippocampus::{DistanceMetric, Hippocampus, RecordId};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

fn three_points() -> Hippocampus {
    let db = Hippocampus::in_memory();
    db.create_index("plane", 2).unwrap();
    for p in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]] {
        db.insert("plane", &vec_bytes(&p), b"", None).unwrap();
    }
    db
}

#[test]
fn ties_are_broken_by_id() {
    let db = three_points();
    let hits = db
        .search("plane", &vec_bytes(&[0.0, 0.0]), 1.5, 1.5, 2, None)
        .unwrap();
    let got: Vec<(u64, f32)> = hits
        .iter()
        .map(|m| (m.record_id.as_u64(), m.distance))
        .collect();
    assert_eq!(got, vec![(0, 0.0), (1, 1.0)]);
}

#[test]
fn both_cutoffs_apply() {
    let db = three_points();
    let q = vec_bytes(&[0.0, 0.0]);
    let by_epsilon = db.search("plane", &q, 0.5, 10.0, 10, None).unwrap();
    let by_threshold = db.search("plane", &q, 10.0, 0.5, 10, None).unwrap();
    assert_eq!(by_epsilon.len(), 1);
    assert_eq!(by_threshold.len(), 1);

    // Cutoffs are inclusive
    let inclusive = db.search("plane", &q, 1.0, 1.0, 10, None).unwrap();
    assert_eq!(inclusive.len(), 3);
}

#[test]
fn top_k_zero_and_negative_cutoff_are_empty() {
    let db = three_points();
    let q = vec_bytes(&[0.0, 0.0]);
    assert!(db.search("plane", &q, 1.0, 1.0, 0, None).unwrap().is_empty());
    assert!(db
        .search("plane", &q, -1.0, f32::INFINITY, 10, None)
        .unwrap()
        .is_empty());
}

#[test]
fn nan_cutoff_is_rejected() {
    let db = three_points();
    let err = db
        .search("plane", &vec_bytes(&[0.0, 0.0]), f32::NAN, 1.0, 1, None)
        .unwrap_err();
    assert!(err.is_validation_error());
}

#[test]
fn filter_excludes_nearest_record() {
    let db = Hippocampus::in_memory();
    db.create_index("notes", 2).unwrap();
    db.insert("notes", &vec_bytes(&[0.0, 0.0]), b"untagged", None)
        .unwrap();
    db.insert(
        "notes",
        &vec_bytes(&[0.1, 0.0]),
        b"opinion",
        Some(&json!({"tag": "opinion"})),
    )
    .unwrap();
    db.insert(
        "notes",
        &vec_bytes(&[3.0, 0.0]),
        b"fact",
        Some(&json!({"tag": "fact", "source": "wiki"})),
    )
    .unwrap();

    let hits = db
        .search(
            "notes",
            &vec_bytes(&[0.0, 0.0]),
            f32::INFINITY,
            f32::INFINITY,
            10,
            Some(&json!({"tag": "fact"})),
        )
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record_id, RecordId::new(2));
    assert_eq!(hits[0].value, b"fact");
}

#[test]
fn cosine_index_ranks_by_angle() {
    let db = Hippocampus::in_memory();
    db.create_index_with_metric("angles", 2, DistanceMetric::Cosine)
        .unwrap();
    db.insert("angles", &vec_bytes(&[10.0, 0.0]), b"x", None)
        .unwrap();
    db.insert("angles", &vec_bytes(&[0.0, 1.0]), b"y", None)
        .unwrap();

    let hits = db
        .search("angles", &vec_bytes(&[1.0, 0.1]), 2.0, 2.0, 2, None)
        .unwrap();
    assert_eq!(hits[0].value, b"x");
    assert!(hits[0].distance < hits[1].distance);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn unbounded_search_returns_every_record_sorted(
        points in prop::collection::vec(prop::array::uniform3(-100.0f32..100.0), 1..60),
        query in prop::array::uniform3(-100.0f32..100.0),
    ) {
        let db = Hippocampus::in_memory();
        db.create_index("cloud", 3).unwrap();
        for p in &points {
            db.insert("cloud", &vec_bytes(p), b"", None).unwrap();
        }

        let n = points.len() as u32;
        let hits = db
            .search("cloud", &vec_bytes(&query), f32::INFINITY, f32::INFINITY, n, None)
            .unwrap();

        prop_assert_eq!(hits.len(), points.len());
        let ids: HashSet<_> = hits.iter().map(|m| m.record_id).collect();
        prop_assert_eq!(ids.len(), points.len());
        prop_assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }
}
