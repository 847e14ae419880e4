//! Record store: durable, append-only records of one index
//!
//! ## Locking
//!
//! - `writer` (Mutex): held by `append`/`append_batch` for the whole
//!   validate → encode → write → publish sequence, so writes to one index are
//!   serialized and never interleave at the byte level
//! - `state` (RwLock): held exclusively only while publishing committed
//!   records; `snapshot()` takes it shared and clones an `Arc`
//!
//! Records become visible only after the log write succeeded, and a batch
//! becomes visible all at once.
//!
//! ## Ids
//!
//! A record's id is its position in the log. Ids are monotonic and never
//! reused because records are never removed.

use crate::snapshot::{Snapshot, StoreState};
use hippocampus_core::{
    DistanceMetric, HippoError, HippoResult, IndexInfo, Limits, NewRecord, Record, RecordId,
    Vector,
};
use hippocampus_durability::{
    encode_frame, DurabilityMode, IndexManifest, IndexPaths, RecordLogReader, RecordLogWriter,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Options shared by every store of a catalog
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    /// Log sync policy
    pub durability: DurabilityMode,
    /// Size limits checked on append
    pub limits: Limits,
    /// Number of leading coordinates kept in the band index
    pub band_dims: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            durability: DurabilityMode::default(),
            limits: Limits::default(),
            band_dims: 4,
        }
    }
}

/// Durable record storage for one index
pub struct RecordStore {
    name: String,
    paths: Option<IndexPaths>,
    manifest: IndexManifest,
    limits: Limits,
    writer: Mutex<RecordLogWriter>,
    state: RwLock<Arc<StoreState>>,
    dropped: AtomicBool,
}

impl RecordStore {
    /// Open the store in `dir`, creating it with `dim` if it does not exist
    ///
    /// An existing store must have been declared with the same `dim`, else
    /// `DimensionConflict`. Its persisted metric is kept; `metric` only applies
    /// to a newly created store.
    pub fn open_or_create(
        dir: impl AsRef<Path>,
        name: &str,
        dim: usize,
        metric: DistanceMetric,
        options: &StoreOptions,
    ) -> HippoResult<Self> {
        options.limits.validate_dim(dim)?;
        Self::load(dir.as_ref(), name, Some((dim, metric)), options)
    }

    /// Open an existing store in `dir`
    ///
    /// Fails with `NotFound` when the directory holds neither a manifest nor
    /// any record.
    pub fn open_existing(
        dir: impl AsRef<Path>,
        name: &str,
        options: &StoreOptions,
    ) -> HippoResult<Self> {
        Self::load(dir.as_ref(), name, None, options)
    }

    /// Create a store that keeps records in memory only
    pub fn in_memory(
        name: &str,
        dim: usize,
        metric: DistanceMetric,
        options: &StoreOptions,
    ) -> HippoResult<Self> {
        options.limits.validate_dim(dim)?;
        let writer = RecordLogWriter::open(Path::new(""), DurabilityMode::Cache)
            .map_err(|e| HippoError::io("creating in-memory log", e))?;
        Ok(Self::assemble(
            name,
            None,
            IndexManifest::new(name, dim, metric),
            Vec::new(),
            writer,
            options,
        ))
    }

    fn load(
        dir: &Path,
        name: &str,
        requested: Option<(usize, DistanceMetric)>,
        options: &StoreOptions,
    ) -> HippoResult<Self> {
        let paths = IndexPaths::from_dir(dir);
        let manifest = IndexManifest::load(&paths.manifest())?;

        if let (Some(m), Some((dim, _))) = (&manifest, requested) {
            if m.dim != dim {
                return Err(HippoError::DimensionConflict {
                    name: name.to_string(),
                    existing: m.dim,
                    requested: dim,
                });
            }
        }

        let log_path = paths.log();
        let replay = RecordLogReader::new(&log_path)
            .with_expected_dim(manifest.as_ref().map(|m| m.dim))
            .with_limits(options.limits.clone())
            .read_all()?;

        let manifest = match (manifest, replay.dim, requested) {
            (Some(m), _, _) => m,
            // Log without manifest: the first record declares the dimension
            (None, Some(log_dim), requested) => {
                if let Some((dim, _)) = requested {
                    if dim != log_dim {
                        return Err(HippoError::DimensionConflict {
                            name: name.to_string(),
                            existing: log_dim,
                            requested: dim,
                        });
                    }
                }
                let metric = requested.map(|(_, m)| m).unwrap_or_default();
                Self::write_manifest(&paths, IndexManifest::new(name, log_dim, metric))?
            }
            (None, None, Some((dim, metric))) => {
                Self::write_manifest(&paths, IndexManifest::new(name, dim, metric))?
            }
            (None, None, None) => return Err(HippoError::not_found(name)),
        };

        if replay.needs_truncation() {
            warn!(
                target: "hippocampus::store",
                index = name,
                valid_end = replay.valid_end,
                discarded_bytes = replay.discarded_bytes(),
                "Discarding torn record at end of log"
            );
            RecordLogWriter::truncate_to(&log_path, replay.valid_end)
                .map_err(|e| HippoError::io(format!("truncating {}", log_path.display()), e))?;
        }

        let writer = RecordLogWriter::open(&log_path, options.durability)
            .map_err(|e| HippoError::io(format!("opening {}", log_path.display()), e))?;

        info!(
            target: "hippocampus::store",
            index = name,
            dim = manifest.dim,
            metric = %manifest.metric,
            records = replay.records.len(),
            "Replay complete"
        );

        Ok(Self::assemble(
            name,
            Some(paths),
            manifest,
            replay.records,
            writer,
            options,
        ))
    }

    fn write_manifest(paths: &IndexPaths, manifest: IndexManifest) -> HippoResult<IndexManifest> {
        std::fs::create_dir_all(paths.dir()).map_err(|e| {
            HippoError::io(format!("creating index directory {}", paths.dir().display()), e)
        })?;
        manifest.write(&paths.manifest())?;
        Ok(manifest)
    }

    fn assemble(
        name: &str,
        paths: Option<IndexPaths>,
        manifest: IndexManifest,
        records: Vec<NewRecord>,
        writer: RecordLogWriter,
        options: &StoreOptions,
    ) -> Self {
        let mut state = StoreState::new(manifest.dim, manifest.metric, options.band_dims);
        state.extend(
            records
                .into_iter()
                .enumerate()
                .map(|(i, r)| Arc::new(Record::from_new(RecordId::new(i as u64), r)))
                .collect(),
        );

        RecordStore {
            name: name.to_string(),
            paths,
            manifest,
            limits: options.limits.clone(),
            writer: Mutex::new(writer),
            state: RwLock::new(Arc::new(state)),
            dropped: AtomicBool::new(false),
        }
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dimension
    pub fn dim(&self) -> usize {
        self.manifest.dim
    }

    /// Distance metric
    pub fn metric(&self) -> DistanceMetric {
        self.manifest.metric
    }

    /// Index directory (None for in-memory stores)
    pub fn dir(&self) -> Option<&Path> {
        self.paths.as_ref().map(IndexPaths::dir)
    }

    /// Number of committed records
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// Check whether no records are committed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index metadata
    pub fn info(&self) -> IndexInfo {
        IndexInfo {
            name: self.name.clone(),
            dim: self.manifest.dim,
            metric: self.manifest.metric,
            record_count: self.len() as u64,
            created_at: self.manifest.created_at,
        }
    }

    /// Consistent view of every record committed so far
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read().clone();
        Snapshot::new(self.manifest.dim, self.manifest.metric, state)
    }

    /// Append one record and return its id
    pub fn append(
        &self,
        vector: Vector,
        value: Vec<u8>,
        metadata: Option<JsonValue>,
    ) -> HippoResult<RecordId> {
        let record = NewRecord {
            vector,
            value,
            metadata,
        };

        let mut writer = self.writer.lock();
        self.ensure_live()?;

        let mut frame = Vec::new();
        self.encode_checked(&mut frame, &record)?;

        writer
            .commit(&frame)
            .map_err(|e| HippoError::io(format!("appending to index '{}'", self.name), e))?;

        let id = self.publish(vec![record]);
        debug!(target: "hippocampus::store", index = %self.name, id = id.as_u64(), bytes = frame.len(), "Appended record");
        Ok(id)
    }

    /// Append a batch of records as one durable unit
    ///
    /// Every item is validated before anything is written. If item `i` is
    /// invalid the call fails with `Batch { index: i, .. }` and the store is
    /// unchanged.
    pub fn append_batch(&self, records: Vec<NewRecord>) -> HippoResult<Vec<RecordId>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut writer = self.writer.lock();
        self.ensure_live()?;

        let mut frames = Vec::new();
        for (i, record) in records.iter().enumerate() {
            self.encode_checked(&mut frames, record)
                .map_err(|e| e.in_batch(i))?;
        }

        writer.commit(&frames).map_err(|e| {
            HippoError::io(format!("appending batch to index '{}'", self.name), e)
        })?;

        let count = records.len();
        let first = self.publish(records);
        debug!(
            target: "hippocampus::store",
            index = %self.name,
            first_id = first.as_u64(),
            count,
            bytes = frames.len(),
            "Appended batch"
        );
        Ok((0..count as u64)
            .map(|i| RecordId::new(first.as_u64() + i))
            .collect())
    }

    /// Force committed records to disk
    pub fn flush(&self) -> HippoResult<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| HippoError::io(format!("syncing index '{}'", self.name), e))
    }

    /// Sync if the Standard-mode interval has elapsed
    pub fn sync_if_overdue(&self) -> HippoResult<bool> {
        self.writer
            .lock()
            .sync_if_overdue()
            .map_err(|e| HippoError::io(format!("syncing index '{}'", self.name), e))
    }

    /// Mark the store as dropped; later appends fail with `NotFound`
    ///
    /// Waits for an in-flight write to finish. Existing snapshots stay valid.
    pub fn mark_dropped(&self) {
        let _writer = self.writer.lock();
        self.dropped.store(true, Ordering::SeqCst);
    }

    /// Check whether the store was dropped
    pub fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    fn ensure_live(&self) -> HippoResult<()> {
        if self.is_dropped() {
            return Err(HippoError::not_found(&self.name));
        }
        Ok(())
    }

    fn encode_checked(&self, buf: &mut Vec<u8>, record: &NewRecord) -> HippoResult<()> {
        if record.vector.dim() != self.manifest.dim {
            return Err(HippoError::DimensionMismatch {
                expected: self.manifest.dim,
                got: record.vector.dim(),
            });
        }
        record.vector.validate_finite()?;
        encode_frame(buf, record, &self.limits)?;
        Ok(())
    }

    /// Make committed records visible; returns the first assigned id
    ///
    /// Caller holds the writer lock.
    fn publish(&self, records: Vec<NewRecord>) -> RecordId {
        let mut state = self.state.write();
        let first = state.len() as u64;
        let records = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| Arc::new(Record::from_new(RecordId::new(first + i as u64), r)))
            .collect();
        Arc::make_mut(&mut *state).extend(records);
        RecordId::new(first)
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("name", &self.name)
            .field("dim", &self.manifest.dim)
            .field("metric", &self.manifest.metric)
            .field("records", &self.len())
            .field("dropped", &self.is_dropped())
            .finish()
    }
}
