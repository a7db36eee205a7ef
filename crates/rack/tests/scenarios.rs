//! End-to-end scenarios S1-S7 from the store's testable-properties suite.

use rack::entry::{Entry, Id};
use rack::store::{GetResult, PutKey, Store, StoreConfig};
use rack::tag::TagRecord;
use rack::value::Value;
use rack_testing_fixtures::{author, book, register_all};

fn store() -> Store {
    let mut store = Store::open(StoreConfig::temporary()).unwrap();
    register_all(&mut store).unwrap();
    store
}

#[test]
fn s1_insert_and_canonical_key() {
    let store = store();
    store.put(PutKey::Unique, book("A", "X", 1)).unwrap();

    assert_eq!(store.keys().unwrap(), vec!["book_0".to_string()]);
    let entry = store.get_entry("book_0").unwrap();
    assert_eq!(entry.field("rating"), Some(&Value::Integer(1)));
}

#[test]
fn s2_unique_increments() {
    let store = store();
    store.put(PutKey::Unique, book("A", "X", 0)).unwrap();
    let b1 = store.put(PutKey::Unique, book("B", "X", 0)).unwrap();
    let b2 = store.put(PutKey::Unique, book("C", "Y", 0)).unwrap();

    assert_eq!(b1.canonical_key(), Some("book_1".to_string()));
    assert_eq!(b2.canonical_key(), Some("book_2".to_string()));
}

#[test]
fn s3_multi_condition_query() {
    let store = store();
    store.put(PutKey::Unique, book("The A", "A.B. Cee", 1)).unwrap();
    store.put(PutKey::Unique, book("The B", "A.B. Cee", 4)).unwrap();
    store.put(PutKey::Unique, book("Untouched", "Nobody", 2)).unwrap();
    store.put(PutKey::Unique, book("E Up!", "B.C. Dea", 4)).unwrap();

    let results = store
        .query_all(r#"book: 3 <= rating <= 5 ; author -> "A.B. Cee", "B.C. Dea""#)
        .unwrap();
    let ids: Vec<_> = results.iter().filter_map(|e| e.id.explicit()).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn s4_case_insensitive_starts_with() {
    let store = store();
    store.put(PutKey::Unique, book("The A", "A.B. Cee", 1)).unwrap();
    store.put(PutKey::Unique, book("The B", "A.B. Cee", 1)).unwrap();
    store.put(PutKey::Unique, book("Other", "A.B. Cee", 1)).unwrap();

    let results = store.query_all(r#"book: title <%. "the""#).unwrap();
    let ids: Vec<_> = results.iter().filter_map(|e| e.id.explicit()).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn s5_fk_resolution() {
    let store = store();
    let b0 = store.put(PutKey::Unique, book("The A", "A.B. Cee", 1)).unwrap();
    let b1 = store.put(PutKey::Unique, book("The B", "A.B. Cee", 4)).unwrap();
    let a0 = store
        .put(
            PutKey::Unique,
            author("A.B. Cee", &[&b0.canonical_key().unwrap(), &b1.canonical_key().unwrap()]),
        )
        .unwrap();

    let loaded = store.get_entry(&a0.canonical_key().unwrap()).unwrap();
    let view = loaded.cached_view("books").unwrap();
    let titles: Vec<_> = view.as_many().iter().map(|e| e.field("title").unwrap().to_string()).collect();
    assert_eq!(titles, vec!["\"The A\"", "\"The B\""]);
}

#[test]
fn s6_tag_as_persisted_query() {
    let store = store();
    store
        .make_once("hot", TagRecord::with_fk_query("hot", "book: rating >= 4"))
        .unwrap();

    store.put(PutKey::Unique, book("A", "X", 1)).unwrap();
    store.put(PutKey::Unique, book("B", "X", 4)).unwrap();

    let GetResult::Value(Value::List(hits)) = store.get("tag_hot").unwrap() else {
        panic!("expected a list of books");
    };
    assert_eq!(hits.len(), 1);

    // Re-put book_0 (b4's sibling) with a rating bump, verify the tag is live.
    let mut fields = std::collections::BTreeMap::new();
    fields.insert("title".to_string(), Value::String("A".into()));
    fields.insert("author".to_string(), Value::String("X".into()));
    fields.insert("rating".to_string(), Value::Integer(9));
    store
        .put(PutKey::Literal("book_0"), Entry::new("book", Id::Explicit(0), fields))
        .unwrap();

    let GetResult::Value(Value::List(hits)) = store.get("tag_hot").unwrap() else {
        panic!("expected a list of books");
    };
    assert_eq!(hits.len(), 2);
}

#[test]
fn s7_backup_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(StoreConfig::file(dir.path().join("db"), true)).unwrap();
    register_all(&mut store).unwrap();

    store.put(PutKey::Unique, book("A", "X", 1)).unwrap();
    store.put(PutKey::Unique, book("B", "Y", 2)).unwrap();
    store.make_once("hot", TagRecord::new("hot", Value::Bool(true))).unwrap();

    let before = store.items().unwrap();
    store.backup(Some("snap")).unwrap();
    store.restore(Some("snap")).unwrap();

    let after = store.items().unwrap();
    assert_eq!(before, after);
}
