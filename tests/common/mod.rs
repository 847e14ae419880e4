//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use hippocampus::{HippoConfig, Hippocampus, Vector};
use std::path::Path;
use tempfile::TempDir;

/// Catalog on a temporary directory that lives as long as the wrapper
pub struct TestDb {
    pub db: Hippocampus,
    pub dir: TempDir,
}

impl TestDb {
    /// Standard durability (the default)
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let db = Hippocampus::open(dir.path()).expect("open catalog");
        TestDb { db, dir }
    }

    /// Always durability: every insert is fsynced before it returns
    pub fn new_strict() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let db = Hippocampus::open_with_config(dir.path(), always_config()).expect("open catalog");
        TestDb { db, dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Release the catalog, keeping its directory
    pub fn close(self) -> TempDir {
        let TestDb { db, dir } = self;
        drop(db);
        dir
    }

    /// Open a catalog released with [`TestDb::close`]
    pub fn open_at(dir: TempDir) -> Self {
        let db = Hippocampus::open(dir.path()).expect("reopen catalog");
        TestDb { db, dir }
    }

    /// Release the catalog and open it again from disk
    pub fn reopen(self) -> Self {
        Self::open_at(self.close())
    }
}

pub fn always_config() -> HippoConfig {
    HippoConfig {
        durability: "always".to_string(),
        ..HippoConfig::default()
    }
}

/// Binary form of a vector literal
pub fn vec_bytes(components: &[f32]) -> Vec<u8> {
    Vector::new(components.to_vec()).encode()
}

/// Log file of an index inside a catalog root
pub fn log_path(root: &Path, index: &str) -> std::path::PathBuf {
    root.join("indexes").join(index).join("records.log")
}
