//! In-memory store
//!
//! BTreeMap-based store with RwLock for concurrency.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::Result;
use super::KeyValueStore;

/// Volatile key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.read().keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        self.data.write().clear();
        Ok(())
    }
}
