//! Simulated crashes: the log is cut short after the catalog is released.
//!
//! Policy: a torn final record is discarded and the log truncated to the last
//! complete record; every complete record is recovered.

use crate::common::*;
use hippocampus::{BatchItem, RecordId};
use std::fs::OpenOptions;
use std::path::Path;

fn cut_log(root: &Path, index: &str, len: u64) {
    let file = OpenOptions::new()
        .write(true)
        .open(log_path(root, index))
        .unwrap();
    file.set_len(len).unwrap();
}

fn log_len(t: &TestDb, index: &str) -> u64 {
    std::fs::metadata(log_path(t.path(), index)).unwrap().len()
}

#[test]
fn records_survive_clean_reopen() {
    let t = TestDb::new_strict();
    t.db.create_index("facts", 2).unwrap();
    for i in 0..10 {
        t.db.insert("facts", &vec_bytes(&[i as f32, 0.0]), &[i as u8], None)
            .unwrap();
    }

    let t = t.reopen();
    let info = t.db.index_info("facts").unwrap();
    assert_eq!(info.record_count, 10);
    assert_eq!(info.dim, 2);

    let hits = t
        .db
        .search("facts", &vec_bytes(&[9.0, 0.0]), 0.5, 0.5, 1, None)
        .unwrap();
    assert_eq!(hits[0].record_id, RecordId::new(9));
    assert_eq!(hits[0].value, vec![9u8]);
}

#[test]
fn cut_at_record_boundary_recovers_prefix() {
    let t = TestDb::new_strict();
    t.db.create_index("facts", 2).unwrap();
    t.db.insert("facts", &vec_bytes(&[1.0, 1.0]), b"first", None)
        .unwrap();
    t.db.flush().unwrap();
    let boundary = log_len(&t, "facts");

    let v = vec_bytes(&[2.0, 2.0]);
    let batch = vec![
        BatchItem {
            vector: &v,
            value: b"batch",
            metadata: None,
        };
        4
    ];
    t.db.batch_insert("facts", &batch).unwrap();

    let dir = t.close();
    cut_log(dir.path(), "facts", boundary);

    let t = TestDb::open_at(dir);
    assert_eq!(t.db.index_info("facts").unwrap().record_count, 1);
}

#[test]
fn cut_inside_record_discards_torn_tail() {
    let t = TestDb::new_strict();
    t.db.create_index("facts", 4).unwrap();
    for i in 0..3 {
        t.db.insert("facts", &vec_bytes(&[i as f32; 4]), b"payload", None)
            .unwrap();
    }
    let full = log_len(&t, "facts");
    let per_record = full / 3;

    let dir = t.close();
    cut_log(dir.path(), "facts", full - per_record / 2);

    let t = TestDb::open_at(dir);
    assert_eq!(t.db.index_info("facts").unwrap().record_count, 2);
    assert_eq!(log_len(&t, "facts"), 2 * per_record);

    // The next id reuses the discarded position
    let id = t
        .db
        .insert("facts", &vec_bytes(&[7.0; 4]), b"new", None)
        .unwrap();
    assert_eq!(id, RecordId::new(2));
}
