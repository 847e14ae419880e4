//! Index catalog: named indexes under one root directory
//!
//! ```text
//! <root>/
//! ├── hippocampus.toml    # catalog configuration
//! ├── .lock               # exclusive process lock
//! └── indexes/
//!     └── <name>/         # one RecordStore per index
//! ```
//!
//! Stores are opened lazily on first use and kept open until the index is
//! dropped or the catalog is released. Create, open and drop of one name are
//! serialized by a per-name lock; the shared map is only locked to look up or
//! publish a store, never while a log is replayed. Opening the same root twice in one
//! process returns the same `Arc<IndexCatalog>`; a second process is refused
//! with `Locked`.

pub mod config;
pub mod registry;

pub use config::{HippoConfig, SearchConfig, CONFIG_FILE_NAME};
pub use registry::OPEN_CATALOGS;

use crate::search::SearchEngine;
use crate::store::{RecordStore, StoreOptions};
use hippocampus_core::{
    validate_index_name, DistanceMetric, HippoError, HippoResult, IndexInfo, SearchMatch,
    SearchQuery,
};
use hippocampus_durability::{DurabilityMode, IndexPaths};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Directory under the root that holds one subdirectory per index
pub const INDEXES_DIR: &str = "indexes";

type StoreMap = Arc<RwLock<BTreeMap<String, Arc<RecordStore>>>>;
type NameLocks = Mutex<HashMap<String, Arc<Mutex<()>>>>;

/// Process-wide registry of named indexes
pub struct IndexCatalog {
    /// Canonical root (None for in-memory catalogs)
    root: Option<PathBuf>,
    config: HippoConfig,
    durability: DurabilityMode,
    default_metric: DistanceMetric,
    store_options: StoreOptions,
    engine: SearchEngine,
    stores: StoreMap,
    name_locks: NameLocks,
    flush_shutdown: Arc<AtomicBool>,
    flush_handle: Mutex<Option<JoinHandle<()>>>,
    _lock_file: Option<File>,
}

impl IndexCatalog {
    /// Open the catalog at `path`, reading (or creating) `hippocampus.toml`
    ///
    /// Returns the already-open instance if this process has one for `path`.
    pub fn open(path: impl AsRef<Path>) -> HippoResult<Arc<Self>> {
        let root = path.as_ref();
        create_dir(root)?;

        let config_path = root.join(CONFIG_FILE_NAME);
        HippoConfig::write_default_if_missing(&config_path)?;
        let config = HippoConfig::from_file(&config_path)?;

        Self::open_with_mode_and_config(root, config)
    }

    /// Open the catalog at `path` with an explicit configuration
    ///
    /// The configuration is written to `hippocampus.toml` so later
    /// [`IndexCatalog::open`] calls pick it up.
    pub fn open_with_config(path: impl AsRef<Path>, config: HippoConfig) -> HippoResult<Arc<Self>> {
        let root = path.as_ref();
        config.validate()?;
        create_dir(root)?;
        config.write_to_file(&root.join(CONFIG_FILE_NAME))?;
        Self::open_with_mode_and_config(root, config)
    }

    fn open_with_mode_and_config(root: &Path, config: HippoConfig) -> HippoResult<Arc<Self>> {
        let durability = config.durability_mode()?;
        let canonical = root
            .canonicalize()
            .map_err(|e| HippoError::io(format!("resolving {}", root.display()), e))?;

        // Hold the registry lock for the whole open so two threads cannot
        // both create an instance for the same root
        let mut registry = OPEN_CATALOGS.lock();
        if let Some(catalog) = registry.get(&canonical).and_then(|w| w.upgrade()) {
            info!(target: "hippocampus::catalog", path = ?canonical, "Returning existing catalog instance");
            return Ok(catalog);
        }

        let lock_path = canonical.join(".lock");
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| HippoError::io(format!("opening lock file {}", lock_path.display()), e))?;
        fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| HippoError::Locked {
            path: canonical.clone(),
        })?;

        create_dir(&canonical.join(INDEXES_DIR))?;

        let stores: StoreMap = Arc::new(RwLock::new(BTreeMap::new()));
        let flush_shutdown = Arc::new(AtomicBool::new(false));
        let flush_handle = spawn_flush_thread(durability, &stores, &flush_shutdown)?;

        let catalog = Arc::new(IndexCatalog {
            root: Some(canonical.clone()),
            default_metric: config.metric()?,
            store_options: config.store_options(durability),
            engine: SearchEngine::new(config.search_options()),
            config,
            durability,
            stores,
            name_locks: Mutex::new(HashMap::new()),
            flush_shutdown,
            flush_handle: Mutex::new(flush_handle),
            _lock_file: Some(lock_file),
        });

        registry.insert(canonical.clone(), Arc::downgrade(&catalog));
        info!(
            target: "hippocampus::catalog",
            path = ?canonical,
            durability = %durability,
            "Opened catalog"
        );
        Ok(catalog)
    }

    /// Create a catalog with no disk I/O
    ///
    /// Not registered in the global registry: each call creates a new,
    /// independent instance whose data is gone when it is dropped.
    pub fn in_memory() -> Arc<Self> {
        Self::in_memory_with_config(HippoConfig::default())
    }

    /// Create an in-memory catalog with explicit search tuning
    ///
    /// The configured durability is ignored; nothing is ever written.
    pub fn in_memory_with_config(config: HippoConfig) -> Arc<Self> {
        let durability = DurabilityMode::Cache;
        Arc::new(IndexCatalog {
            root: None,
            default_metric: config.metric().unwrap_or_default(),
            store_options: config.store_options(durability),
            engine: SearchEngine::new(config.search_options()),
            config,
            durability,
            stores: Arc::new(RwLock::new(BTreeMap::new())),
            name_locks: Mutex::new(HashMap::new()),
            flush_shutdown: Arc::new(AtomicBool::new(false)),
            flush_handle: Mutex::new(None),
            _lock_file: None,
        })
    }

    /// Catalog root (None for in-memory catalogs)
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Active configuration
    pub fn config(&self) -> &HippoConfig {
        &self.config
    }

    /// Durability mode of every store
    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }

    /// Metric used by [`IndexCatalog::create`]
    pub fn default_metric(&self) -> DistanceMetric {
        self.default_metric
    }

    /// Search engine configured for this catalog
    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Create an index with the default metric, or return the existing one
    ///
    /// An existing index with the same `dim` is returned as is, whatever its
    /// metric; a different `dim` is `DimensionConflict`.
    pub fn create(&self, name: &str, dim: usize) -> HippoResult<Arc<RecordStore>> {
        self.create_with_metric(name, dim, self.default_metric)
    }

    /// Create an index with an explicit metric, or return the existing one
    pub fn create_with_metric(
        &self,
        name: &str,
        dim: usize,
        metric: DistanceMetric,
    ) -> HippoResult<Arc<RecordStore>> {
        self.create_inner(name, dim, metric, false)
    }

    /// Create an index, failing with `AlreadyExists` if the name is taken
    pub fn create_exclusive(
        &self,
        name: &str,
        dim: usize,
        metric: DistanceMetric,
    ) -> HippoResult<Arc<RecordStore>> {
        self.create_inner(name, dim, metric, true)
    }

    fn create_inner(
        &self,
        name: &str,
        dim: usize,
        metric: DistanceMetric,
        exclusive: bool,
    ) -> HippoResult<Arc<RecordStore>> {
        validate_index_name(name)?;
        self.store_options.limits.validate_dim(dim)?;

        let name_lock = self.name_lock(name);
        let _guard = name_lock.lock();

        let cached = self.stores.read().get(name).cloned();
        let existing = match cached {
            Some(store) => Some(store),
            None => self.load_from_disk(name)?,
        };

        if let Some(store) = existing {
            if exclusive {
                return Err(HippoError::AlreadyExists {
                    name: name.to_string(),
                });
            }
            if store.dim() != dim {
                return Err(HippoError::DimensionConflict {
                    name: name.to_string(),
                    existing: store.dim(),
                    requested: dim,
                });
            }
            self.stores
                .write()
                .insert(name.to_string(), Arc::clone(&store));
            return Ok(store);
        }

        let store = match &self.root {
            Some(root) => RecordStore::open_or_create(
                index_dir(root, name),
                name,
                dim,
                metric,
                &self.store_options,
            )?,
            None => RecordStore::in_memory(name, dim, metric, &self.store_options)?,
        };
        let store = Arc::new(store);
        self.stores
            .write()
            .insert(name.to_string(), Arc::clone(&store));

        info!(target: "hippocampus::catalog", index = name, dim, metric = %metric, "Created index");
        Ok(store)
    }

    /// Open an existing index
    pub fn open_index(&self, name: &str) -> HippoResult<Arc<RecordStore>> {
        validate_index_name(name)?;

        if let Some(store) = self.stores.read().get(name) {
            return Ok(Arc::clone(store));
        }

        let name_lock = self.name_lock(name);
        let _guard = name_lock.lock();
        // Another thread may have opened it while we waited
        if let Some(store) = self.stores.read().get(name) {
            return Ok(Arc::clone(store));
        }
        let store = self
            .load_from_disk(name)?
            .ok_or_else(|| HippoError::not_found(name))?;
        self.stores
            .write()
            .insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Lock serializing create, open and drop of one index name
    fn name_lock(&self, name: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.name_locks.lock().entry(name.to_string()).or_default())
    }

    /// Open a store that exists on disk but is not in the map yet
    fn load_from_disk(&self, name: &str) -> HippoResult<Option<Arc<RecordStore>>> {
        let Some(root) = &self.root else {
            return Ok(None);
        };
        let dir = index_dir(root, name);
        if !IndexPaths::from_dir(&dir).exists() {
            return Ok(None);
        }
        let store = RecordStore::open_existing(&dir, name, &self.store_options)?;
        info!(
            target: "hippocampus::catalog",
            index = name,
            records = store.len(),
            "Opened index"
        );
        Ok(Some(Arc::new(store)))
    }

    /// Drop an index and delete its files
    ///
    /// Outstanding handles to the store are marked dropped: their snapshots
    /// stay readable, their appends fail with `NotFound`. The files are
    /// removed first; if that fails the index stays open and registered.
    pub fn drop_index(&self, name: &str) -> HippoResult<()> {
        validate_index_name(name)?;

        let name_lock = self.name_lock(name);
        let _guard = name_lock.lock();

        let on_disk = match &self.root {
            Some(root) => {
                let dir = index_dir(root, name);
                let exists = IndexPaths::from_dir(&dir).exists();
                if exists {
                    std::fs::remove_dir_all(&dir).map_err(|e| {
                        HippoError::io(format!("removing index directory {}", dir.display()), e)
                    })?;
                }
                exists
            }
            None => false,
        };

        let removed = self.stores.write().remove(name);
        if let Some(store) = &removed {
            store.mark_dropped();
        }
        if removed.is_none() && !on_disk {
            return Err(HippoError::not_found(name));
        }

        info!(target: "hippocampus::catalog", index = name, "Dropped index");
        Ok(())
    }

    /// Names of every index, sorted
    pub fn list(&self) -> HippoResult<Vec<String>> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();

        if let Some(root) = &self.root {
            let dir = root.join(INDEXES_DIR);
            let entries = std::fs::read_dir(&dir)
                .map_err(|e| HippoError::io(format!("listing {}", dir.display()), e))?;
            for entry in entries {
                let entry =
                    entry.map_err(|e| HippoError::io(format!("listing {}", dir.display()), e))?;
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if validate_index_name(&name).is_ok()
                    && IndexPaths::from_dir(entry.path()).exists()
                {
                    names.push(name);
                }
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Metadata of one index
    pub fn info(&self, name: &str) -> HippoResult<IndexInfo> {
        Ok(self.open_index(name)?.info())
    }

    /// Search one index
    pub fn search(&self, name: &str, query: &SearchQuery) -> HippoResult<Vec<SearchMatch>> {
        let store = self.open_index(name)?;
        self.engine.search(&store.snapshot(), query)
    }

    /// Force every open store to disk
    pub fn flush(&self) -> HippoResult<()> {
        let stores: Vec<Arc<RecordStore>> = self.stores.read().values().cloned().collect();
        for store in stores {
            store.flush()?;
        }
        Ok(())
    }
}

impl Drop for IndexCatalog {
    fn drop(&mut self) {
        // Stop the background flush thread
        self.flush_shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.flush_handle.lock().take() {
            let _ = handle.join();
        }

        // Final flush to persist any remaining data
        if let Err(e) = self.flush() {
            warn!(target: "hippocampus::catalog", error = %e, "Final flush failed");
        }

        if let Some(root) = &self.root {
            let mut registry = OPEN_CATALOGS.lock();
            // A newer instance may already be registered for this root
            if registry
                .get(root)
                .is_some_and(|weak| weak.strong_count() == 0)
            {
                registry.remove(root);
            }
        }
    }
}

impl std::fmt::Debug for IndexCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCatalog")
            .field("root", &self.root)
            .field("durability", &self.durability)
            .field("open_indexes", &self.stores.read().len())
            .finish()
    }
}

fn index_dir(root: &Path, name: &str) -> PathBuf {
    root.join(INDEXES_DIR).join(name)
}

fn create_dir(path: &Path) -> HippoResult<()> {
    std::fs::create_dir_all(path)
        .map_err(|e| HippoError::io(format!("creating directory {}", path.display()), e))
}

/// Spawn the Standard-mode background sync thread
fn spawn_flush_thread(
    durability: DurabilityMode,
    stores: &StoreMap,
    shutdown: &Arc<AtomicBool>,
) -> HippoResult<Option<JoinHandle<()>>> {
    let DurabilityMode::Standard { interval_ms } = durability else {
        return Ok(None);
    };
    let stores = Arc::clone(stores);
    let shutdown = Arc::clone(shutdown);
    let interval = std::time::Duration::from_millis(interval_ms.max(1));

    let handle = std::thread::Builder::new()
        .name("hippocampus-flush".to_string())
        .spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                std::thread::sleep(interval);
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                let open: Vec<Arc<RecordStore>> = stores.read().values().cloned().collect();
                for store in open {
                    if let Err(e) = store.sync_if_overdue() {
                        warn!(
                            target: "hippocampus::catalog",
                            index = store.name(),
                            error = %e,
                            "Background sync failed"
                        );
                    }
                }
            }
        })
        .map_err(|e| HippoError::io("spawning flush thread", e))?;
    Ok(Some(handle))
}
