//! Configuration for kvtable
//!
//! Centralized configuration for the persistent log store, with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a kvtable store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── store.log        (append-only key-value log)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the log
    pub sync_strategy: SyncStrategy,

    /// Entries appended since the last compaction before the log is rewritten.
    /// Zero disables automatic compaction.
    pub compaction_threshold: u64,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./kvtable_data"),
            sync_strategy: SyncStrategy::EveryNEntries { count: 100 },
            compaction_threshold: 10_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the log sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the automatic compaction threshold (0 disables it)
    pub fn compaction_threshold(mut self, entries: u64) -> Self {
        self.config.compaction_threshold = entries;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
