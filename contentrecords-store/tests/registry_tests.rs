use std::sync::Arc;
use std::thread;

use contentrecords_store::{FieldValues, StoreError, StoreRegistry, MEMORY_PATH};
use tempfile::TempDir;

#[test]
fn open_reuses_live_handle() {
    let registry = StoreRegistry::new();
    let a = registry.open(MEMORY_PATH).unwrap();
    let b = registry.open(MEMORY_PATH).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 1);
}

#[test]
fn memory_store_is_shared_across_opens() {
    let registry = StoreRegistry::new();
    let id = registry
        .open(MEMORY_PATH)
        .unwrap()
        .create("article", &FieldValues::new())
        .unwrap();
    assert!(registry.open(" :memory: ").unwrap().fetch_by_id(id, "article").is_ok());
}

#[test]
fn empty_path_is_rejected() {
    let registry = StoreRegistry::new();
    assert!(matches!(registry.open("  "), Err(StoreError::MissingPath)));
    assert!(registry.is_empty());
}

#[test]
fn file_store_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/records.db");
    let path = path.to_str().unwrap();

    let registry = StoreRegistry::new();
    let store = registry.open(path).unwrap();
    let id = store.create("article", &FieldValues::new()).unwrap();

    assert!(registry.is_open(path));
    // a fresh registry sees the persisted data
    let other = StoreRegistry::new();
    assert!(other.open(path).unwrap().fetch_by_id(id, "article").is_ok());
}

#[test]
fn concurrent_first_open_initializes_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("concurrent.db").to_str().unwrap().to_string();
    let registry = Arc::new(StoreRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let path = path.clone();
            thread::spawn(move || {
                let store = registry.open(&path).unwrap();
                let mut values = FieldValues::new();
                values.insert("n".into(), i.to_string());
                store.create("article", &values).unwrap()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.open(&path).unwrap().count_by_type("article").unwrap(), 8);
}
