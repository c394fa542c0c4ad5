//! Store Module
//!
//! The flat key-value substrate that tables are built on.
//!
//! ## Responsibilities
//! - String-keyed get/set/remove
//! - Enumerate every stored key (order unspecified)
//! - Clear everything (test harnesses only, tables never call it)
//!
//! ## Implementations
//! - [`MemoryStore`]: BTreeMap behind a RwLock, nothing survives the process
//! - [`LogStore`]: append-only checksummed log with an in-memory index,
//!   replayed on open

mod memory;
mod log;

pub use self::memory::MemoryStore;
pub use self::log::{LogEntry, LogRecovery, LogStore, LogWriter, Operation, RecoveryResult, HEADER_SIZE};

use crate::error::Result;

/// A flat, synchronous, string-keyed dictionary.
///
/// All methods take `&self`; implementations use interior mutability so a
/// single store can be shared by every table through an `Arc`.
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored at `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` at `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<()>;

    /// Every key currently stored, in unspecified order
    fn keys(&self) -> Result<Vec<String>>;

    /// Remove every key
    fn clear(&self) -> Result<()>;
}
