//! Shared store handles keyed by store path.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::{RecordStore, MEMORY_PATH};

struct StoreEntry {
    store: Arc<RecordStore>,
    schema: OnceLock<Result<(), String>>,
}

/// Registry of open record stores, one per store path.
///
/// The registry is owned by the host and shared by every render. Looking up
/// or creating an entry is serialized by one mutex; schema creation is
/// guarded per entry, so it runs exactly once per path and concurrent first
/// users wait for it to finish before they issue queries.
#[derive(Default)]
pub struct StoreRegistry {
    entries: Mutex<HashMap<String, Arc<StoreEntry>>>,
}

impl StoreRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the initialized store for `path`, opening it on first use.
    ///
    /// Parent directories of file-backed stores are created as needed.
    /// A schema failure is remembered: later opens of the same path report
    /// it again instead of retrying.
    pub fn open(&self, path: &str) -> StoreResult<Arc<RecordStore>> {
        let path = path.trim();
        if path.is_empty() {
            return Err(StoreError::MissingPath);
        }
        if path != MEMORY_PATH {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let entry = {
            let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
            match entries.get(path) {
                Some(entry) => Arc::clone(entry),
                None => {
                    let entry = Arc::new(StoreEntry {
                        store: Arc::new(RecordStore::open(path)?),
                        schema: OnceLock::new(),
                    });
                    entries.insert(path.to_string(), Arc::clone(&entry));
                    debug!(path, "registered record store");
                    entry
                }
            }
        };

        let schema = entry
            .schema
            .get_or_init(|| entry.store.init_schema().map_err(|e| e.to_string()));
        if let Err(message) = schema {
            warn!(path, error = %message, "record store unusable");
            return Err(StoreError::Schema(message.clone()));
        }
        Ok(Arc::clone(&entry.store))
    }

    /// Returns true if `path` has been opened through this registry.
    pub fn is_open(&self, path: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(path.trim()))
            .unwrap_or(false)
    }

    /// Number of distinct store paths opened so far.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
