//! Record store: merge, delete and snapshot persistence across backends

use rust_decimal::Decimal;
use std::sync::Arc;
use tempfile::tempdir;

use sms_expense_tracker::models::{Category, ExpenseRecord};
use sms_expense_tracker::persistence::{KeyValueStore, MemoryStore, SledStore};
use sms_expense_tracker::store::{RecordStore, DEFAULT_SNAPSHOT_KEY};
use sms_expense_tracker::TrackerError;

fn record(id: &str, amount: i64, description: &str) -> ExpenseRecord {
    ExpenseRecord::new(id, Decimal::new(amount, 0), "05/06/2024", description, Category::Others)
}

#[test]
fn test_sled_backed_store_persists_every_mutation() {
    let dir = tempdir().unwrap();
    let backend: Arc<dyn KeyValueStore> = Arc::new(SledStore::open(&dir.path().join("db")).unwrap());

    let mut store = RecordStore::load(backend.clone(), DEFAULT_SNAPSHOT_KEY).unwrap();
    assert!(store.is_empty());

    store.merge(vec![record("a", 10, "Rs 10 paid"), record("b", 20, "Rs 20 paid")]);
    assert!(store.delete("a"));

    let reloaded = RecordStore::load(backend, DEFAULT_SNAPSHOT_KEY).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.snapshot()[0].id(), "b");
}

#[test]
fn test_equal_ids_keep_first_merged() {
    let mut store = RecordStore::new(Arc::new(MemoryStore::new()), DEFAULT_SNAPSHOT_KEY);

    store.merge(vec![record("x", 100, "first")]);
    let added = store.merge(vec![record("x", 999, "second")]);

    assert!(added.is_empty());
    assert_eq!(store.get("x").map(ExpenseRecord::amount), Some(Decimal::new(100, 0)));
    assert_eq!(store.get("x").map(ExpenseRecord::description), Some("first"));
}

#[test]
fn test_delete_unknown_id_is_noop() {
    let mut store = RecordStore::new(Arc::new(MemoryStore::new()), DEFAULT_SNAPSHOT_KEY);
    store.merge(vec![record("a", 1, "Rs 1 paid")]);

    assert!(!store.delete("zzz"));
    assert_eq!(store.len(), 1);
    assert!(store.delete("a"));
    assert!(!store.contains("a"));
}

#[test]
fn test_corrupt_snapshot_is_fatal_unless_reset() {
    let backend = Arc::new(MemoryStore::with_entry(DEFAULT_SNAPSHOT_KEY, b"[{\"id\":"));

    let err = RecordStore::load(backend.clone(), DEFAULT_SNAPSHOT_KEY).unwrap_err();
    assert!(matches!(err, TrackerError::CorruptSnapshot { .. }));

    assert!(RecordStore::open(backend.clone(), DEFAULT_SNAPSHOT_KEY, false).is_err());
    let store = RecordStore::open(backend.clone(), DEFAULT_SNAPSHOT_KEY, true).unwrap();
    assert!(store.is_empty());

    // the unreadable blob is kept aside for inspection
    let quarantined = backend.get(&format!("{DEFAULT_SNAPSHOT_KEY}.corrupt")).unwrap();
    assert_eq!(quarantined.as_deref(), Some(&b"[{\"id\":"[..]));
}
