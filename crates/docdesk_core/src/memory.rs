//! crates/docdesk_core/src/memory.rs
//!
//! An in-process `KeyValueStorage`, used by tests and by embedders that do not
//! need the session to outlive the process.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::ports::{KeyValueStorage, PortError, PortResult};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> PortResult<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PortError::Storage("memory storage lock poisoned".to_string()))?;
        Ok(f(&mut entries))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }
}
