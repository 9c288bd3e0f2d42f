/// Memoized dataset loading
///
/// A dataset is read once per source and then shared: every later request
/// for the same source returns the same `Arc<Dataset>`. The cache key is the
/// source identity only (canonical path plus column layout); filter
/// selections never reach the cache.
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::schema::CsvLayout;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

type CacheKey = (PathBuf, CsvLayout);

#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<CacheKey, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        DatasetCache::default()
    }

    /// Returns the cached dataset for `path`, loading it on first use.
    ///
    /// Failed loads are not cached; the next call retries.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<Dataset>> {
        self.load_with_layout(path, CsvLayout::default())
    }

    pub fn load_with_layout(&self, path: impl AsRef<Path>, layout: CsvLayout) -> Result<Arc<Dataset>> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .map_err(|e| DashboardError::io(path, e))?;
        let key = (canonical, layout);

        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(dataset) = entries.get(&key) {
            debug!("dataset cache hit for {}", key.0.display());
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(Dataset::from_path_with_layout(&key.0, key.1.clone())?);
        entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drops the cached entry for `path` under every layout.
    pub fn invalidate(&self, path: impl AsRef<Path>) {
        let Ok(canonical) = path.as_ref().canonicalize() else {
            return;
        };
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.retain(|(p, _), _| *p != canonical);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The process-wide cache.
pub fn shared_cache() -> &'static DatasetCache {
    static CACHE: OnceLock<DatasetCache> = OnceLock::new();
    CACHE.get_or_init(DatasetCache::new)
}

/// Loads `path` through the process-wide cache.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<Dataset>> {
    shared_cache().load(path)
}
