//! Index engine for Hippocampus
//!
//! This crate ties the durable record log to in-memory search:
//! - RecordStore: one index, append-only, replayed on open
//! - Snapshot: immutable view used by every query
//! - SearchEngine: filtered, bounded nearest-neighbor queries
//! - IndexCatalog: named indexes under one root, process lock, background sync
//!
//! The engine is the only component that knows about:
//! - Catalog layout and configuration
//! - Visibility of committed records
//! - Choice of scan strategy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod band;
pub mod catalog;
pub mod search;
pub mod snapshot;
pub mod store;

pub use band::BandIndex;
pub use catalog::{HippoConfig, IndexCatalog, SearchConfig, CONFIG_FILE_NAME, OPEN_CATALOGS};
pub use search::{ScanStrategy, SearchEngine, SearchOptions};
pub use snapshot::Snapshot;
pub use store::{RecordStore, StoreOptions};
