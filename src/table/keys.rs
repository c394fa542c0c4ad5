//! Key encoding
//!
//! Maps a table's records and counter into the flat key space:
//!
//! ```text
//! todos:0      record, pkey 0
//! todos:17     record, pkey 17
//! todos:max    counter (last pkey issued)
//! ```

use crate::error::{Result, TableError};
use super::PrimaryKey;

/// Separator between table name and key suffix
pub const SEPARATOR: char = ':';

/// Suffix of the reserved counter key
pub const COUNTER_SUFFIX: &str = "max";

/// The namespace a single table occupies in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableKeys {
    name: String,
    /// `"<name>:"`
    prefix: String,
    /// `"<name>:max"`
    counter: String,
}

impl TableKeys {
    /// Build the namespace for `name`
    ///
    /// Names must be non-empty and free of the separator, otherwise one
    /// table's prefix could swallow another table's keys.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(TableError::InvalidArgument(
                "table name must not be empty".to_string(),
            ));
        }
        if name.contains(SEPARATOR) {
            return Err(TableError::InvalidArgument(format!(
                "table name '{}' must not contain '{}'",
                name, SEPARATOR
            )));
        }

        let prefix = format!("{}{}", name, SEPARATOR);
        let counter = format!("{}{}", prefix, COUNTER_SUFFIX);
        Ok(Self {
            name: name.to_string(),
            prefix,
            counter,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key a record with `pkey` is stored under
    pub fn record_key(&self, pkey: PrimaryKey) -> String {
        format!("{}{}", self.prefix, pkey)
    }

    /// Key the counter is stored under
    pub fn counter_key(&self) -> &str {
        &self.counter
    }

    /// Whether `key` lies in this table's namespace (counter included)
    pub fn owns(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }

    /// Decode a record key back to its pkey
    ///
    /// `None` for keys outside the namespace, the counter key, and suffixes
    /// that are not a decimal pkey.
    pub fn decode(&self, key: &str) -> Option<PrimaryKey> {
        let suffix = key.strip_prefix(&self.prefix)?;
        if suffix == COUNTER_SUFFIX {
            return None;
        }
        let pkey: PrimaryKey = suffix.parse().ok()?;
        // Only the canonical spelling, so that decode and record_key agree
        (suffix == pkey.to_string()).then_some(pkey)
    }
}
