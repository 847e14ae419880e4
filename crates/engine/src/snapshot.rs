//! Point-in-time views of a record store
//!
//! A [`Snapshot`] shares the store's state by reference count. Appends that
//! happen after the snapshot was taken copy the state before mutating it, so
//! a snapshot never changes and never observes a partial batch.
//!
//! Records are kept in chunks of [`CHUNK_LEN`]. Full chunks are sealed and
//! shared by every later state, so that copy touches at most one open chunk
//! of records plus the band columns. Band columns are copied whole; a band
//! insert already shifts its column, so the copy stays within the same order
//! of cost as the append itself.

use crate::band::BandIndex;
use hippocampus_core::{DistanceMetric, Record, RecordId};
use std::sync::Arc;

/// Records per sealed chunk
pub const CHUNK_LEN: usize = 1024;

/// In-memory state of one index
#[derive(Debug, Clone, Default)]
pub(crate) struct StoreState {
    /// Full chunks in id order, never modified once sealed
    sealed: Vec<Arc<[Arc<Record>]>>,
    /// Records after the last sealed chunk
    open: Vec<Arc<Record>>,
    /// Coordinate bands (Euclidean indexes only)
    pub(crate) band: Option<BandIndex>,
}

impl StoreState {
    pub(crate) fn new(dim: usize, metric: DistanceMetric, band_dims: usize) -> Self {
        let band = (metric == DistanceMetric::Euclidean && band_dims > 0)
            .then(|| BandIndex::new(dim, band_dims));
        StoreState {
            sealed: Vec::new(),
            open: Vec::new(),
            band,
        }
    }

    /// Number of records
    pub(crate) fn len(&self) -> usize {
        self.sealed.len() * CHUNK_LEN + self.open.len()
    }

    /// Record at position `index` (which is also its id)
    pub(crate) fn get(&self, index: usize) -> Option<&Arc<Record>> {
        let sealed_len = self.sealed.len() * CHUNK_LEN;
        if index < sealed_len {
            self.sealed[index / CHUNK_LEN].get(index % CHUNK_LEN)
        } else {
            self.open.get(index - sealed_len)
        }
    }

    /// Records in id order, one slice per chunk
    pub(crate) fn chunks(&self) -> impl Iterator<Item = &[Arc<Record>]> + '_ {
        self.sealed
            .iter()
            .map(|chunk| &chunk[..])
            .chain(std::iter::once(self.open.as_slice()))
    }

    /// Append records whose ids continue the current sequence
    pub(crate) fn extend(&mut self, records: Vec<Arc<Record>>) {
        debug_assert!(records
            .iter()
            .enumerate()
            .all(|(i, r)| r.id.as_u64() == (self.len() + i) as u64));
        if let Some(band) = self.band.as_mut() {
            band.extend(&records);
        }
        for record in records {
            self.open.push(record);
            if self.open.len() == CHUNK_LEN {
                let full = std::mem::replace(&mut self.open, Vec::with_capacity(CHUNK_LEN));
                self.sealed.push(Arc::from(full));
            }
        }
    }
}

/// Immutable, consistent view of all records committed to a store
#[derive(Debug, Clone)]
pub struct Snapshot {
    dim: usize,
    metric: DistanceMetric,
    state: Arc<StoreState>,
}

impl Snapshot {
    pub(crate) fn new(dim: usize, metric: DistanceMetric, state: Arc<StoreState>) -> Self {
        Snapshot { dim, metric, state }
    }

    /// Dimension of every record
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Distance metric of the index
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Check whether there are no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records in ascending id order
    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.chunks().flatten().map(Arc::as_ref)
    }

    /// Records in ascending id order, as contiguous chunks
    pub fn chunks(&self) -> impl Iterator<Item = &[Arc<Record>]> + '_ {
        self.state.chunks()
    }

    /// Look up a record by id
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        usize::try_from(id.as_u64())
            .ok()
            .and_then(|i| self.state.get(i))
            .map(Arc::as_ref)
    }

    /// Coordinate band index, when the index keeps one
    pub fn band(&self) -> Option<&BandIndex> {
        self.state.band.as_ref()
    }
}
