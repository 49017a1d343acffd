use super::{SessionStore, StoreError, StoreKey};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// Process-local store, nothing touches disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<StoreKey, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn put(&self, key: StoreKey, value: Value) -> Result<(), StoreError> {
        self.entries.lock().insert(key, value);
        Ok(())
    }

    fn get(&self, key: StoreKey) -> Option<Value> {
        self.entries.lock().get(&key).cloned()
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        self.entries.lock().clear();
        Ok(())
    }
}
