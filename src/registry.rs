//! Table Registry
//!
//! Hands out one shared [`Table`] per name over a single store.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, TableError};
use crate::store::KeyValueStore;
use crate::table::{Table, COUNTER_SUFFIX, SEPARATOR};

type AnyTable = Arc<dyn Any + Send + Sync>;

/// Registry of open tables
///
/// Construct once per store and share it. Repeated lookups of a name return
/// the same `Arc`, so every handle sees the same counter and records.
pub struct TableRegistry {
    store: Arc<dyn KeyValueStore>,
    tables: Mutex<HashMap<String, AnyTable>>,
}

impl TableRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Get the table `name`, opening it on first use
    ///
    /// A name is bound to the record type it was first opened with; asking
    /// for it with another type fails with `TableTypeMismatch`.
    pub fn table<T>(&self, name: &str) -> Result<Arc<Table<T>>>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let mut tables = self.tables.lock();

        if let Some(existing) = tables.get(name) {
            return Arc::clone(existing)
                .downcast::<Table<T>>()
                .map_err(|_| TableError::TableTypeMismatch {
                    name: name.to_string(),
                });
        }

        let table = Arc::new(Table::<T>::open(name, Arc::clone(&self.store))?);
        tables.insert(name.to_string(), Arc::clone(&table) as AnyTable);
        Ok(table)
    }

    /// Names opened through this registry, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Names of every table that has a counter in the store, sorted
    ///
    /// Includes tables opened by earlier processes against the same store.
    pub fn persisted_table_names(&self) -> Result<Vec<String>> {
        let suffix = format!("{}{}", SEPARATOR, COUNTER_SUFFIX);
        let mut names: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_suffix(&suffix).map(str::to_string))
            .filter(|name| !name.is_empty() && !name.contains(SEPARATOR))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }
}
