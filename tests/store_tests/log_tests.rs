//! Tests for LogStore
//!
//! These tests verify:
//! - Basic get/set/remove/clear
//! - Persistence across reopen
//! - Recovery from torn and corrupt tails
//! - Compaction (manual and automatic)
//! - Tables on top of a persistent store

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::Arc;

use kvtable::config::{Config, SyncStrategy};
use kvtable::store::{KeyValueStore, LogRecovery, LogStore};
use kvtable::{OrderBy, OrderedRetrieval, TableRegistry};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(SyncStrategy::EveryWrite) // Sync every write for test reliability
        .compaction_threshold(0)
        .build()
}

fn setup_temp_store() -> (TempDir, LogStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = LogStore::open(test_config(&temp_dir)).unwrap();
    (temp_dir, store)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_open_creates_directory_and_log() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let store = LogStore::open(Config::builder().data_dir(&data_dir).build()).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("store.log").exists());
    assert!(store.is_empty());
}

#[test]
fn test_set_get_remove() {
    let (_temp, store) = setup_temp_store();

    store.set("todos:0", "\"a\"").unwrap();
    assert_eq!(store.get("todos:0").unwrap(), Some("\"a\"".to_string()));

    store.remove("todos:0").unwrap();
    assert_eq!(store.get("todos:0").unwrap(), None);
    assert!(store.is_empty());
}

#[test]
fn test_remove_missing_does_not_grow_log() {
    let (_temp, store) = setup_temp_store();
    store.set("k", "v").unwrap();
    let before = fs::metadata(store.log_path()).unwrap().len();

    store.remove("missing").unwrap();

    assert_eq!(fs::metadata(store.log_path()).unwrap().len(), before);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_replays_log() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = LogStore::open(test_config(&temp_dir)).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.set("a", "3").unwrap();
        store.remove("b").unwrap();
    }

    let store = LogStore::open(test_config(&temp_dir)).unwrap();

    assert_eq!(store.get("a").unwrap(), Some("3".to_string()));
    assert_eq!(store.get("b").unwrap(), None);
    assert_eq!(store.recovery().entries_recovered, 4);
    assert!(!store.recovery().was_truncated);
}

#[test]
fn test_clear_is_persisted() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = LogStore::open(test_config(&temp_dir)).unwrap();
        store.set("a", "1").unwrap();
        store.clear().unwrap();
        store.set("b", "2").unwrap();
    }

    let store = LogStore::open(test_config(&temp_dir)).unwrap();

    assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
}

#[test]
fn test_buffered_writes_flush_on_drop() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(SyncStrategy::EveryNEntries { count: 1000 })
        .compaction_threshold(0)
        .build();
    {
        let store = LogStore::open(config.clone()).unwrap();
        store.set("a", "1").unwrap();
    }

    let store = LogStore::open(config).unwrap();
    assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_torn_tail_is_truncated() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = {
        let store = LogStore::open(test_config(&temp_dir)).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.log_path().to_path_buf()
    };
    let valid_len = fs::metadata(&log_path).unwrap().len();

    // Half a header from an interrupted append
    let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
    file.write_all(&[0, 0, 0, 0, 0, 0, 0, 3, 0xAB]).unwrap();
    drop(file);

    let store = LogStore::open(test_config(&temp_dir)).unwrap();

    assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
    assert_eq!(store.get("b").unwrap(), Some("2".to_string()));
    assert!(store.recovery().was_truncated);
    assert_eq!(store.recovery().bytes_discarded, 9);
    assert_eq!(fs::metadata(&log_path).unwrap().len(), valid_len);

    // Appends after recovery land on a clean boundary
    store.set("c", "3").unwrap();
    drop(store);
    let store = LogStore::open(test_config(&temp_dir)).unwrap();
    assert_eq!(store.len(), 3);
}

#[test]
fn test_corrupt_entry_discards_remainder() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = {
        let store = LogStore::open(test_config(&temp_dir)).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.log_path().to_path_buf()
    };

    // Flip the last payload byte of the second entry
    let mut bytes = fs::read(&log_path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&log_path, &bytes).unwrap();

    let report = LogRecovery::verify(&log_path).unwrap();
    assert_eq!(report.entries_recovered, 1);
    assert!(report.was_truncated);

    let store = LogStore::open(test_config(&temp_dir)).unwrap();
    assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
    assert_eq!(store.get("b").unwrap(), None);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_manual_compaction_shrinks_log() {
    let (temp_dir, store) = setup_temp_store();
    for i in 0..50 {
        store.set("hot", &i.to_string()).unwrap();
    }
    let before = fs::metadata(store.log_path()).unwrap().len();

    store.compact().unwrap();

    let after = fs::metadata(store.log_path()).unwrap().len();
    assert!(after < before);
    assert_eq!(store.get("hot").unwrap(), Some("49".to_string()));

    store.set("cold", "x").unwrap();
    drop(store);
    let store = LogStore::open(test_config(&temp_dir)).unwrap();
    assert_eq!(store.get("hot").unwrap(), Some("49".to_string()));
    assert_eq!(store.get("cold").unwrap(), Some("x".to_string()));
    assert_eq!(store.recovery().entries_recovered, 2);
}

#[test]
fn test_automatic_compaction() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(SyncStrategy::EveryWrite)
        .compaction_threshold(10)
        .build();
    {
        let store = LogStore::open(config.clone()).unwrap();
        for i in 0..10 {
            store.set("k", &i.to_string()).unwrap();
        }
    }

    let store = LogStore::open(config).unwrap();

    assert_eq!(store.recovery().entries_recovered, 1);
    assert_eq!(store.get("k").unwrap(), Some("9".to_string()));
}

// =============================================================================
// Table Integration Tests
// =============================================================================

#[test]
fn test_tables_persist_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = Arc::new(LogStore::open(test_config(&temp_dir)).unwrap());
        let registry = TableRegistry::new(store);
        let todos = registry.table::<String>("todos").unwrap();
        for s in ["a", "b", "c"] {
            todos.create(&s.to_string()).unwrap();
        }
        todos.delete(1).unwrap();
    }

    let store = Arc::new(LogStore::open(test_config(&temp_dir)).unwrap());
    let registry = TableRegistry::new(store);
    let todos = registry.table::<String>("todos").unwrap();

    assert_eq!(todos.max_primary_key(), 2);
    assert_eq!(todos.count().unwrap(), 2);
    let res = todos.slot(0, 10, &OrderBy::Descending).unwrap();
    assert_eq!(res.iter().map(|r| r.pkey).collect::<Vec<_>>(), vec![2, 0]);
    assert_eq!(todos.create(&"d".to_string()).unwrap(), 3);
}
