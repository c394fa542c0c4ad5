//! Tests for MemoryStore

use kvtable::store::{KeyValueStore, MemoryStore};

#[test]
fn test_new_store_is_empty() {
    let store = MemoryStore::new();
    assert!(store.is_empty());
    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn test_set_get_overwrite() {
    let store = MemoryStore::new();

    store.set("k", "v1").unwrap();
    store.set("k", "v2").unwrap();

    assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_missing_is_noop() {
    let store = MemoryStore::new();
    store.set("k", "v").unwrap();

    store.remove("other").unwrap();
    store.remove("k").unwrap();

    assert_eq!(store.get("k").unwrap(), None);
    assert!(store.is_empty());
}

#[test]
fn test_keys_and_clear() {
    let store = MemoryStore::new();
    store.set("b", "2").unwrap();
    store.set("a", "1").unwrap();

    let mut keys = store.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

    store.clear().unwrap();
    assert!(store.keys().unwrap().is_empty());
}
