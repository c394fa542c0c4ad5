//! Log-structured persistent store
//!
//! Every mutation is appended to a single checksummed log file; an in-memory
//! index answers reads. The index is rebuilt by replaying the log on open.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Entry 1                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Entry 2                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Superseded entries are dropped by compaction, which rewrites the live key
//! set into a fresh file and renames it over the old log.

mod entry;
mod writer;
mod recovery;

pub use entry::{LogEntry, Operation, HEADER_SIZE};
pub use writer::LogWriter;
pub use recovery::{LogRecovery, RecoveryResult};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use super::KeyValueStore;

/// Persistent key-value store backed by an append-only log
///
/// ## Concurrency:
/// - `writer`: Mutex, held for the whole of every mutation so writes are
///   serialized and the log order matches the index order
/// - `index`: RwLock, many concurrent readers
pub struct LogStore {
    config: Config,

    /// Path of the live log file
    path: PathBuf,

    /// Current contents, rebuilt from the log on open
    index: RwLock<BTreeMap<String, String>>,

    writer: Mutex<LogWriter>,

    /// Entries appended since the log was last rewritten
    appended_since_compaction: AtomicU64,

    recovery: RecoveryResult,
}

impl LogStore {
    const LOG_FILENAME: &'static str = "store.log";
    const COMPACT_FILENAME: &'static str = "store.log.compact";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Recover the log, truncating any torn tail
    /// 3. Replay entries into the index
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let path = config.data_dir.join(Self::LOG_FILENAME);

        // A compaction interrupted before its rename leaves a stale temp file
        let compact_path = config.data_dir.join(Self::COMPACT_FILENAME);
        if compact_path.exists() {
            fs::remove_file(&compact_path)?;
        }

        let (entries, recovery) = LogRecovery::recover(&path)?;

        let mut index = BTreeMap::new();
        for entry in entries {
            apply(&mut index, entry.operation);
        }

        info!(
            path = %path.display(),
            entries = recovery.entries_recovered,
            keys = index.len(),
            truncated = recovery.was_truncated,
            "log store opened"
        );

        let writer = LogWriter::open(&path, config.sync_strategy, recovery.last_lsn + 1)?;

        Ok(Self {
            appended_since_compaction: AtomicU64::new(recovery.entries_recovered),
            config,
            path,
            index: RwLock::new(index),
            writer: Mutex::new(writer),
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Force buffered entries to disk
    pub fn sync(&self) -> Result<()> {
        self.writer.lock().sync()
    }

    /// Rewrite the log so it holds exactly one entry per live key
    pub fn compact(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        self.compact_locked(&mut writer)
    }

    /// Append `operation` and apply it to the index (called with no locks held)
    fn write(&self, operation: Operation) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.append(operation.clone())?;
        apply(&mut self.index.write(), operation);

        let appended = self.appended_since_compaction.fetch_add(1, Ordering::SeqCst) + 1;
        let threshold = self.config.compaction_threshold;
        if threshold > 0 && appended >= threshold {
            self.compact_locked(&mut writer)?;
        }

        Ok(())
    }

    /// Compaction body (called with the writer lock held)
    fn compact_locked(&self, writer: &mut LogWriter) -> Result<()> {
        writer.flush()?;

        let compact_path = self.config.data_dir.join(Self::COMPACT_FILENAME);
        let live = {
            let index = self.index.read();
            let mut fresh = LogWriter::create(&compact_path, self.config.sync_strategy)?;
            for (key, value) in index.iter() {
                fresh.append(Operation::Set {
                    key: key.clone(),
                    value: value.clone(),
                })?;
            }
            fresh.sync()?;
            index.len()
        };

        fs::rename(&compact_path, &self.path)?;
        *writer = LogWriter::open(&self.path, self.config.sync_strategy, live as u64 + 1)?;
        self.appended_since_compaction.store(0, Ordering::SeqCst);

        info!(path = %self.path.display(), keys = live, "log compacted");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Path of the log file
    pub fn log_path(&self) -> &Path {
        &self.path
    }

    /// What recovery found when this store was opened
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl KeyValueStore for LogStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.index.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!(key, "log set");
        self.write(Operation::Set {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.index.read().contains_key(key) {
            return Ok(());
        }
        debug!(key, "log remove");
        self.write(Operation::Remove { key: key.to_string() })
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.index.read().keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        self.write(Operation::Clear)
    }
}

/// Apply one logged operation to the index
fn apply(index: &mut BTreeMap<String, String>, operation: Operation) {
    match operation {
        Operation::Set { key, value } => {
            index.insert(key, value);
        }
        Operation::Remove { key } => {
            index.remove(&key);
        }
        Operation::Clear => index.clear(),
    }
}
