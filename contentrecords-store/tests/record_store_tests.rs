use std::sync::Arc;
use std::thread;

use contentrecords_store::{default_values, FieldValues, RecordStore, StoreError};
use contentrecords_tree::{collect_binds, Node};
use pretty_assertions::assert_eq;
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

fn values(pairs: &[(&str, &str)]) -> FieldValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn store() -> RecordStore {
    RecordStore::open_in_memory().unwrap()
}

fn file_store(dir: &TempDir) -> (RecordStore, String) {
    let path = dir.path().join("records.db").to_str().unwrap().to_string();
    let store = RecordStore::open(&path).unwrap();
    store.init_schema().unwrap();
    (store, path)
}

/// Makes every field insert fail from a second connection.
fn fail_field_inserts(path: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER fail_fields BEFORE INSERT ON record_fields
         BEGIN SELECT RAISE(ABORT, 'field insert rejected'); END;",
    )
    .unwrap();
}

// ── create / fetch ───────────────────────────────────────────────

#[test]
fn create_then_fetch_returns_same_fields() {
    let store = store();
    let id = store
        .create("article", &values(&[("title", "A"), ("body", "B")]))
        .unwrap();
    let record = store.fetch_by_id(id, "article").unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.fields, values(&[("title", "A"), ("body", "B")]));
}

#[test]
fn create_assigns_increasing_ids() {
    let store = store();
    let a = store.create("article", &FieldValues::new()).unwrap();
    let b = store.create("article", &FieldValues::new()).unwrap();
    assert!(b > a);
}

#[test]
fn fetch_zero_id_is_error() {
    assert!(matches!(store().fetch_by_id(0, ""), Err(StoreError::MissingId)));
}

#[test]
fn fetch_missing_is_not_found() {
    assert!(matches!(
        store().fetch_by_id(99, ""),
        Err(StoreError::NotFound { id: 99 })
    ));
}

#[test]
fn fetch_is_type_scoped() {
    let store = store();
    let id = store.create("article", &values(&[("title", "A")])).unwrap();
    assert!(matches!(store.fetch_by_id(id, "page"), Err(StoreError::NotFound { .. })));
    assert!(store.fetch_by_id(id, "").is_ok());
}

// ── update (replace) ─────────────────────────────────────────────

#[test]
fn update_replaces_all_fields_rather_than_merging() {
    let store = store();
    let id = store
        .create("article", &values(&[("title", "A"), ("body", "B")]))
        .unwrap();

    store.update(id, "article", &values(&[("title", "C")])).unwrap();

    let record = store.fetch_by_id(id, "article").unwrap();
    assert_eq!(record.fields, values(&[("title", "C")]));
    assert_eq!(record.get("body"), None);
}

#[test]
fn update_missing_record_is_not_found() {
    let store = store();
    let err = store.update(42, "article", &values(&[("title", "C")])).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { id: 42 }));
}

#[test]
fn update_with_wrong_type_leaves_record_untouched() {
    let store = store();
    let id = store.create("article", &values(&[("title", "A")])).unwrap();
    assert!(store.update(id, "page", &values(&[("title", "X")])).is_err());
    assert_eq!(store.fetch_by_id(id, "article").unwrap().get("title"), Some("A"));
}

// ── update_field ─────────────────────────────────────────────────

#[test]
fn update_field_changes_only_that_field() {
    let store = store();
    let id = store
        .create("article", &values(&[("title", "A"), ("body", "B")]))
        .unwrap();

    store.update_field(id, "article", "body", "X").unwrap();

    let record = store.fetch_by_id(id, "article").unwrap();
    assert_eq!(record.fields, values(&[("title", "A"), ("body", "X")]));
}

#[test]
fn update_field_inserts_missing_field() {
    let store = store();
    let id = store.create("article", &values(&[("title", "A")])).unwrap();
    store.update_field(id, "article", "subtitle", "S").unwrap();
    assert_eq!(store.fetch_by_id(id, "").unwrap().get("subtitle"), Some("S"));
}

#[test]
fn update_field_on_missing_record_is_not_found() {
    let store = store();
    let err = store.update_field(7, "article", "body", "X").unwrap_err();
    assert!(matches!(err, StoreError::NotFound { id: 7 }));
    // nothing was inserted for the phantom record
    assert!(store.fetch_records("SELECT record_id FROM record_fields", "").unwrap().is_empty());
}

#[test]
fn update_field_requires_bind_key() {
    let store = store();
    let id = store.create("", &FieldValues::new()).unwrap();
    assert!(matches!(
        store.update_field(id, "", "  ", "X"),
        Err(StoreError::MissingBindKey)
    ));
}

// ── delete ───────────────────────────────────────────────────────

#[test]
fn delete_removes_record_and_fields() {
    let store = store();
    let id = store.create("article", &values(&[("title", "A")])).unwrap();
    store.delete(id, "article").unwrap();

    assert!(matches!(store.fetch_by_id(id, ""), Err(StoreError::NotFound { .. })));
    let orphans = store
        .fetch_ids("SELECT record_id FROM record_fields", "")
        .unwrap();
    assert!(orphans.is_empty());
}

#[test]
fn delete_wrong_type_keeps_fields() {
    let store = store();
    let id = store.create("article", &values(&[("title", "A")])).unwrap();
    assert!(matches!(store.delete(id, "page"), Err(StoreError::NotFound { .. })));
    assert_eq!(store.fetch_by_id(id, "article").unwrap().get("title"), Some("A"));
}

// ── fetch_ids ────────────────────────────────────────────────────

#[test]
fn default_ids_are_ordered_and_type_scoped() {
    let store = store();
    let a = store.create("article", &FieldValues::new()).unwrap();
    let _page = store.create("page", &FieldValues::new()).unwrap();
    let b = store.create("article", &FieldValues::new()).unwrap();

    assert_eq!(store.fetch_ids("", "article").unwrap(), vec![a, b]);
    assert_eq!(store.fetch_ids("", "").unwrap().len(), 3);
}

#[test]
fn custom_query_reads_first_column() {
    let store = store();
    let a = store.create("article", &values(&[("title", "A")])).unwrap();
    let b = store.create("article", &values(&[("title", "B")])).unwrap();

    let ids = store
        .fetch_ids("SELECT id, type FROM records ORDER BY id DESC", "ignored")
        .unwrap();
    assert_eq!(ids, vec![b, a]);
}

#[test]
fn custom_query_accepts_text_ids_and_skips_nulls() {
    let store = store();
    let ids = store
        .fetch_ids("SELECT '12' UNION ALL SELECT NULL UNION ALL SELECT 'x'", "")
        .unwrap();
    assert_eq!(ids, vec![12]);
}

#[test]
fn invalid_custom_query_is_error() {
    let err = store().fetch_ids("SELECT FROM nowhere", "").unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
}

#[test]
fn fetch_by_ids_skips_missing() {
    let store = store();
    let a = store.create("article", &values(&[("title", "A")])).unwrap();
    let records = store.fetch_by_ids(&[a, 999], "article").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, a);
}

// ── count / seed ─────────────────────────────────────────────────

#[test]
fn count_by_type() {
    let store = store();
    store.create("article", &FieldValues::new()).unwrap();
    store.create("page", &FieldValues::new()).unwrap();
    assert_eq!(store.count_by_type("article").unwrap(), 1);
    assert_eq!(store.count_by_type("").unwrap(), 2);
}

fn article_template() -> Node {
    Node::from(json!({
        "@name": "article",
        "10": {"@bind": {"field": "title", "path": "value"}, "value": "Hello"},
        "20": {"@bind": {"field": "views", "path": "value"}, "value": 3},
        "30": {"@bind": {"field": "missing", "path": "nowhere.value"}}
    }))
}

#[test]
fn default_values_read_template_in_place() {
    let template = article_template();
    let binds = collect_binds(&template, "");
    assert_eq!(
        default_values(&template, &binds),
        values(&[("title", "Hello"), ("views", "3"), ("missing", "")])
    );
}

#[test]
fn seed_if_empty_is_idempotent() {
    let store = store();
    let template = article_template();
    let binds = collect_binds(&template, "");

    let first = store.seed_if_empty(&template, &binds, "article").unwrap();
    let second = store.seed_if_empty(&template, &binds, "article").unwrap();

    assert!(first.is_some());
    assert_eq!(second, None);
    assert_eq!(store.count_by_type("article").unwrap(), 1);
    let record = store.fetch_by_id(first.unwrap(), "article").unwrap();
    assert_eq!(record.get("title"), Some("Hello"));
}

#[test]
fn seed_never_overwrites_existing_records() {
    let store = store();
    let id = store.create("article", &values(&[("title", "Mine")])).unwrap();
    let template = article_template();
    let binds = collect_binds(&template, "");

    assert_eq!(store.seed_if_empty(&template, &binds, "article").unwrap(), None);
    assert_eq!(store.fetch_by_id(id, "").unwrap().get("title"), Some("Mine"));
}

#[test]
fn concurrent_seeding_creates_one_record() {
    let dir = TempDir::new().unwrap();
    let (store, _) = file_store(&dir);
    let store = Arc::new(store);
    let template = article_template();
    let binds = collect_binds(&template, "");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            let template = template.clone();
            let binds = binds.clone();
            thread::spawn(move || store.seed_if_empty(&template, &binds, "article").unwrap())
        })
        .collect();
    let seeded = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Option::is_some)
        .count();

    assert_eq!(seeded, 1);
    assert_eq!(store.count_by_type("article").unwrap(), 1);
}

// ── rollback ─────────────────────────────────────────────────────

#[test]
fn failed_create_leaves_no_partial_record() {
    let dir = TempDir::new().unwrap();
    let (store, path) = file_store(&dir);
    fail_field_inserts(&path);

    let result = store.create("article", &values(&[("title", "Half")]));

    assert!(matches!(result, Err(StoreError::Database(_))));
    assert_eq!(store.count_by_type("").unwrap(), 0);
}

#[test]
fn failed_update_keeps_old_fields() {
    let dir = TempDir::new().unwrap();
    let (store, path) = file_store(&dir);
    let id = store
        .create("article", &values(&[("title", "Old"), ("body", "Text")]))
        .unwrap();
    fail_field_inserts(&path);

    let result = store.update(id, "article", &values(&[("title", "New")]));

    assert!(matches!(result, Err(StoreError::Database(_))));
    let record = store.fetch_by_id(id, "article").unwrap();
    assert_eq!(record.fields, values(&[("title", "Old"), ("body", "Text")]));
}

#[test]
fn failed_update_field_keeps_record() {
    let dir = TempDir::new().unwrap();
    let (store, path) = file_store(&dir);
    let id = store.create("article", &values(&[("title", "Old")])).unwrap();
    fail_field_inserts(&path);

    let result = store.update_field(id, "article", "body", "New");

    assert!(matches!(result, Err(StoreError::Database(_))));
    let record = store.fetch_by_id(id, "article").unwrap();
    assert_eq!(record.fields, values(&[("title", "Old")]));
}
