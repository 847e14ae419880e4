//! Global catalog registry for singleton management
//!
//! Ensures only one IndexCatalog instance exists per filesystem path.
//! Uses weak references so a catalog is released when its last handle drops.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Weak;

use super::IndexCatalog;

/// Global registry of open catalogs (canonical root -> weak reference)
///
/// Uses parking_lot::Mutex so a panic elsewhere cannot poison it.
pub static OPEN_CATALOGS: Lazy<Mutex<HashMap<PathBuf, Weak<IndexCatalog>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
