//! The six boundary operations and their error taxonomy

use crate::common::*;
use hippocampus::{BatchItem, HippoError, Hippocampus, RecordId};
use serde_json::json;

#[test]
fn create_insert_search_roundtrip() {
    let t = TestDb::new();
    t.db.create_index("facts", 3).unwrap();

    let meta = json!({"tag": "fact"});
    let id = t
        .db
        .insert("facts", &vec_bytes(&[1.0, 2.0, 3.0]), b"payload", Some(&meta))
        .unwrap();
    assert_eq!(id, RecordId::new(0));

    let hits = t
        .db
        .search("facts", &vec_bytes(&[1.0, 2.0, 3.0]), 0.1, 0.1, 5, None)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record_id, id);
    assert_eq!(hits[0].distance, 0.0);
    assert_eq!(hits[0].value, b"payload");
    assert_eq!(hits[0].metadata, Some(meta));
}

#[test]
fn create_index_is_idempotent() {
    let db = Hippocampus::in_memory();
    db.create_index("facts", 4).unwrap();
    db.insert("facts", &vec_bytes(&[0.0; 4]), b"", None).unwrap();
    db.create_index("facts", 4).unwrap();
    assert_eq!(db.index_info("facts").unwrap().record_count, 1);

    assert!(matches!(
        db.create_index("facts", 8),
        Err(HippoError::DimensionConflict { .. })
    ));
}

#[test]
fn wrong_dimension_insert_leaves_count_unchanged() {
    let db = Hippocampus::in_memory();
    db.create_index("facts", 4).unwrap();
    db.insert("facts", &vec_bytes(&[1.0; 4]), b"", None).unwrap();

    let err = db
        .insert("facts", &vec_bytes(&[1.0; 3]), b"", None)
        .unwrap_err();
    assert!(matches!(
        err,
        HippoError::DimensionMismatch {
            expected: 4,
            got: 3
        }
    ));
    assert_eq!(db.index_info("facts").unwrap().record_count, 1);
}

#[test]
fn batch_with_bad_item_is_rejected_whole() {
    let db = Hippocampus::in_memory();
    db.create_index("facts", 2).unwrap();

    let good = vec_bytes(&[1.0, 1.0]);
    let bad = vec_bytes(&[1.0, 1.0, 1.0]);
    let items: Vec<BatchItem<'_>> = (0..5)
        .map(|i| BatchItem {
            vector: if i == 2 { bad.as_slice() } else { good.as_slice() },
            value: b"v",
            metadata: None,
        })
        .collect();

    let err = db.batch_insert("facts", &items).unwrap_err();
    assert!(matches!(err, HippoError::Batch { index: 2, .. }));
    assert_eq!(db.index_info("facts").unwrap().record_count, 0);
}

#[test]
fn batch_with_undecodable_item_reports_its_position() {
    let db = Hippocampus::in_memory();
    db.create_index("facts", 2).unwrap();

    let good = vec_bytes(&[1.0, 1.0]);
    let truncated = &good[..6];
    let items = [
        BatchItem {
            vector: &good,
            value: b"",
            metadata: None,
        },
        BatchItem {
            vector: truncated,
            value: b"",
            metadata: None,
        },
    ];
    let err = db.batch_insert("facts", &items).unwrap_err();
    match err {
        HippoError::Batch { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, HippoError::Decode(_)));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn batch_ids_are_consecutive() {
    let db = Hippocampus::in_memory();
    db.create_index("facts", 1).unwrap();
    db.insert("facts", &vec_bytes(&[0.0]), b"", None).unwrap();

    let v = vec_bytes(&[1.0]);
    let items = vec![
        BatchItem {
            vector: &v,
            value: b"a",
            metadata: None,
        };
        3
    ];
    let ids = db.batch_insert("facts", &items).unwrap();
    assert_eq!(ids, vec![RecordId::new(1), RecordId::new(2), RecordId::new(3)]);
}

#[test]
fn operations_on_missing_index_are_not_found() {
    let db = Hippocampus::in_memory();
    let v = vec_bytes(&[1.0]);
    assert!(db.insert("nope", &v, b"", None).unwrap_err().is_not_found());
    assert!(db
        .search("nope", &v, 1.0, 1.0, 1, None)
        .unwrap_err()
        .is_not_found());
    assert!(db.drop_index("nope").unwrap_err().is_not_found());
}

#[test]
fn search_rejects_query_of_wrong_dimension() {
    let db = Hippocampus::in_memory();
    db.create_index("facts", 2).unwrap();
    let err = db
        .search("facts", &vec_bytes(&[1.0]), 1.0, 1.0, 1, None)
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
fn non_object_metadata_is_rejected() {
    let db = Hippocampus::in_memory();
    db.create_index("facts", 1).unwrap();
    let err = db
        .insert("facts", &vec_bytes(&[1.0]), b"", Some(&json!([1, 2])))
        .unwrap_err();
    assert!(err.is_validation_error(), "{err}");

    let err = db
        .search("facts", &vec_bytes(&[1.0]), 1.0, 1.0, 1, Some(&json!("tag")))
        .unwrap_err();
    assert!(err.is_validation_error(), "{err}");
}

#[test]
fn list_and_drop() {
    let t = TestDb::new();
    t.db.create_index("b", 1).unwrap();
    t.db.create_index("a", 1).unwrap();
    assert_eq!(t.db.list_indexes().unwrap(), vec!["a", "b"]);

    t.db.drop_index("a").unwrap();
    assert_eq!(t.db.list_indexes().unwrap(), vec!["b"]);

    let t = t.reopen();
    assert_eq!(t.db.list_indexes().unwrap(), vec!["b"]);
}

#[test]
fn second_handle_shares_the_catalog() {
    let t = TestDb::new();
    t.db.create_index("facts", 1).unwrap();
    let other = Hippocampus::open(t.path()).unwrap();
    other
        .insert("facts", &vec_bytes(&[1.0]), b"", None)
        .unwrap();
    assert_eq!(t.db.index_info("facts").unwrap().record_count, 1);
}
