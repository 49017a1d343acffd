//! JSON-file backed store
//!
//! The whole session lives in one JSON object keyed by the logical names.
//! Reads are served from an in-memory copy loaded when the store is opened;
//! every write is saved to disk before returning.

use super::{SessionStore, StoreError, StoreKey};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FileStore {
    storage_path: PathBuf,
    cache: Mutex<Map<String, Value>>,
}

impl FileStore {
    /// Opens (or creates) the store file at `storage_path`.
    pub fn open<P: Into<PathBuf>>(storage_path: P) -> Result<Self, StoreError> {
        let store = Self {
            storage_path: storage_path.into(),
            cache: Mutex::new(Map::new()),
        };
        store.load_from_disk()?;
        debug!(path = %store.storage_path.display(), "session store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn load_from_disk(&self) -> Result<(), StoreError> {
        if !self.storage_path.exists() {
            if let Some(parent) = self.storage_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.storage_path, "{}")?;
        }

        let content = fs::read_to_string(&self.storage_path)?;
        let entries = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(path = %self.storage_path.display(), "session store file unreadable, starting empty");
                Map::new()
            }
        };

        *self.cache.lock() = entries;
        Ok(())
    }

    fn save_to_disk(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.storage_path, json)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn put(&self, key: StoreKey, value: Value) -> Result<(), StoreError> {
        let mut cache = self.cache.lock();
        cache.insert(key.as_str().to_string(), value);
        self.save_to_disk(&cache)
    }

    fn get(&self, key: StoreKey) -> Option<Value> {
        self.cache.lock().get(key.as_str()).cloned()
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        let mut cache = self.cache.lock();
        for key in StoreKey::ALL {
            cache.remove(key.as_str());
        }
        self.save_to_disk(&cache)
    }
}
