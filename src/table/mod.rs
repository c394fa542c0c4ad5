//! Table Module
//!
//! A named collection of records with auto-incrementing primary keys, laid
//! out in a flat key-value store.
//!
//! ## Responsibilities
//! - Namespace every key under `"<name>:"`
//! - Issue primary keys from a persisted counter that never goes backwards
//! - CRUD on individual records, bulk truncation
//! - Ordered, paginated retrieval (full scan, sort, slice)
//!
//! ## Counter Protocol
//! The counter holds the last pkey issued, -1 before the first create. It
//! lives at `"<name>:max"` and is only ever incremented, so truncation and
//! deletion leave gaps rather than letting a pkey be reused.

mod keys;
mod slot;

pub use keys::{TableKeys, COUNTER_SUFFIX, SEPARATOR};
pub use slot::{OrderBy, OrderedRetrieval, Record};

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, TableError};
use crate::store::KeyValueStore;

/// Primary key of a record
pub type PrimaryKey = u64;

/// Counter value before any pkey has been issued
pub const NO_PRIMARY_KEY: i64 = -1;

/// A table of `T` records
///
/// Obtained from [`TableRegistry`](crate::TableRegistry), which guarantees one
/// instance per name.
///
/// ## Concurrency:
/// `max_primary_key` is a Mutex held across the counter read-increment-write
/// and across truncation, so a shared `Arc<Table<T>>` never issues the same
/// pkey twice. Nothing guards against other processes writing the same store.
pub struct Table<T> {
    keys: TableKeys,
    store: Arc<dyn KeyValueStore>,

    /// Cached copy of the persisted counter
    max_primary_key: Mutex<i64>,

    _record: PhantomData<fn() -> T>,
}

impl<T> Table<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the table `name`, loading its counter or initializing it to -1
    pub(crate) fn open(name: &str, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let keys = TableKeys::new(name)?;

        let max_primary_key = match store.get(keys.counter_key())? {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(value) if value >= NO_PRIMARY_KEY => value,
                _ => {
                    return Err(TableError::CorruptCounter {
                        key: keys.counter_key().to_string(),
                        value: raw,
                    })
                }
            },
            None => {
                store.set(keys.counter_key(), &NO_PRIMARY_KEY.to_string())?;
                NO_PRIMARY_KEY
            }
        };

        info!(table = name, max_primary_key, "table opened");

        Ok(Self {
            keys,
            store,
            max_primary_key: Mutex::new(max_primary_key),
            _record: PhantomData,
        })
    }

    /// Insert `data` under a freshly issued pkey and return it
    pub fn create(&self, data: &T) -> Result<PrimaryKey> {
        let value = serde_json::to_string(data).map_err(TableError::Serialization)?;

        let mut max = self.max_primary_key.lock();
        let next = max.checked_add(1).ok_or_else(|| self.counter_exhausted(*max))?;
        let pkey = PrimaryKey::try_from(next).map_err(|_| self.counter_exhausted(*max))?;
        self.store.set(self.keys.counter_key(), &next.to_string())?;
        *max = next;

        self.store.set(&self.keys.record_key(pkey), &value)?;

        debug!(table = self.name(), pkey, "record created");
        Ok(pkey)
    }

    /// Fetch the record at `pkey`, `None` if there is none
    pub fn read(&self, pkey: PrimaryKey) -> Result<Option<T>> {
        let key = self.keys.record_key(pkey);
        match self.store.get(&key)? {
            Some(raw) => decode(&key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Overwrite the record at `pkey`
    ///
    /// Existence is not checked: updating a pkey that was never issued (or was
    /// deleted) writes a record there without touching the counter. A pkey
    /// above the counter will later be overwritten by `create`.
    pub fn update(&self, pkey: PrimaryKey, data: &T) -> Result<()> {
        let value = serde_json::to_string(data).map_err(TableError::Serialization)?;
        self.store.set(&self.keys.record_key(pkey), &value)?;
        debug!(table = self.name(), pkey, "record updated");
        Ok(())
    }

    /// Remove the record at `pkey`. Missing records are ignored.
    pub fn delete(&self, pkey: PrimaryKey) -> Result<()> {
        self.store.remove(&self.keys.record_key(pkey))?;
        debug!(table = self.name(), pkey, "record deleted");
        Ok(())
    }

    /// Delete by textual key suffix, as typed by a user
    ///
    /// The counter suffix is refused with `InvalidOperation`: removing it
    /// would restart pkey issuance at 0 on the next open.
    pub fn delete_raw(&self, suffix: &str) -> Result<()> {
        if suffix == COUNTER_SUFFIX {
            return Err(TableError::InvalidOperation(format!(
                "'{}' is the counter of table '{}' and cannot be deleted",
                self.keys.counter_key(),
                self.name()
            )));
        }
        let pkey = suffix.parse::<PrimaryKey>().map_err(|_| {
            TableError::InvalidArgument(format!("'{}' is not a primary key", suffix))
        })?;
        self.delete(pkey)
    }

    /// Number of live records
    pub fn count(&self) -> Result<usize> {
        Ok(self
            .store
            .keys()?
            .iter()
            .filter(|key| self.keys.decode(key).is_some())
            .count())
    }

    /// Delete every record, keeping the counter
    pub fn truncate(&self) -> Result<()> {
        let _max = self.max_primary_key.lock();

        let mut removed = 0usize;
        for key in self.store.keys()? {
            if self.keys.decode(&key).is_some() {
                self.store.remove(&key)?;
                removed += 1;
            }
        }

        info!(table = self.name(), removed, "table truncated");
        Ok(())
    }

    /// Last pkey issued, -1 if none
    pub fn max_primary_key(&self) -> i64 {
        *self.max_primary_key.lock()
    }

    /// Put the counter back to -1 so the next create issues pkey 0
    ///
    /// Records are left alone; truncate first or they will be overwritten.
    pub fn reset_max_primary_key(&self) -> Result<()> {
        let mut max = self.max_primary_key.lock();
        self.store.set(self.keys.counter_key(), &NO_PRIMARY_KEY.to_string())?;
        *max = NO_PRIMARY_KEY;
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.keys.name()
    }

    pub fn keys(&self) -> &TableKeys {
        &self.keys
    }

    fn counter_exhausted(&self, value: i64) -> TableError {
        TableError::CorruptCounter {
            key: self.keys.counter_key().to_string(),
            value: value.to_string(),
        }
    }

    /// Every live record, pkey ascending
    fn scan(&self) -> Result<Vec<Record<T>>> {
        let mut records = Vec::new();
        for key in self.store.keys()? {
            let Some(pkey) = self.keys.decode(&key) else {
                continue;
            };
            // Removed between enumeration and fetch
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            records.push(Record {
                pkey,
                data: decode(&key, &raw)?,
            });
        }
        // Store enumeration order is lexicographic ("t:10" before "t:2")
        records.sort_by_key(|r| r.pkey);
        Ok(records)
    }
}

impl<T> OrderedRetrieval<T> for Table<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Full scan, then sort, then slice. Cost is O(keys in the store)
    /// regardless of `count`.
    fn slot(&self, offset: usize, count: usize, order_by: &OrderBy<T>) -> Result<Vec<Record<T>>> {
        let mut records = self.scan()?;
        order_by.sort(&mut records);
        debug!(
            table = self.name(),
            offset,
            count,
            order = ?order_by,
            scanned = records.len(),
            "slot"
        );
        Ok(slot::paginate(records, offset, count))
    }
}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.keys.name())
            .field("max_primary_key", &*self.max_primary_key.lock())
            .finish()
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| TableError::Deserialization {
        key: key.to_string(),
        source,
    })
}
