//! Foreign-key resolver (spec §4.5): lazy expansion of `fk_X` fields into
//! the materialized `X` projected view.

use crate::entry::{Entry, Key, View};
use crate::error::RackError;
use crate::model::FieldKind;
use crate::store::Store;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashSet;

thread_local! {
    /// Per-call-chain cycle guard (spec §5: "not shared across calls").
    static IN_PROGRESS: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Eagerly resolve every `fk_X` field on `entry` into its `X` view
/// (spec §4.6: `get(key)` returns "the decoded entry (with FK views)").
/// Entries fetched *during* this resolution are left unresolved — FK
/// resolution is one level deep by default (spec §4.5).
pub fn resolve_all(store: &Store, entry: &Entry) -> Result<(), RackError> {
    let schema = store.registry().schema_for(&entry.type_name)?;
    for field in schema.fields {
        if let FieldKind::ForeignKey { view_name } = field.kind {
            ensure_view(store, entry, field.name, view_name)?;
        }
    }
    Ok(())
}

/// Resolve one view on demand and cache it (spec §4.5: "computed on
/// demand and cached per-load; it is never written back").
pub fn ensure_view(
    store: &Store,
    entry: &Entry,
    fk_field: &str,
    view_name: &str,
) -> Result<(), RackError> {
    if entry.cached_view(view_name).is_some() {
        return Ok(());
    }

    let raw = entry.field(fk_field).cloned().unwrap_or(Value::Null);
    if raw.is_null() {
        entry.cache_view(view_name, View::Empty);
        return Ok(());
    }

    let guard_key = format!(
        "{}#{view_name}",
        entry.canonical_key().unwrap_or_else(|| format!("{}_?", entry.type_name))
    );

    let already_in_progress =
        IN_PROGRESS.with(|set| !set.borrow_mut().insert(guard_key.clone()));
    if already_in_progress {
        tracing::warn!(key = %guard_key, "fk resolution cycle detected; breaking with an empty view");
        entry.cache_view(view_name, View::Empty);
        return Ok(());
    }

    let resolved = resolve_raw(store, &raw);
    IN_PROGRESS.with(|set| {
        set.borrow_mut().remove(&guard_key);
    });

    entry.cache_view(view_name, resolved?);
    Ok(())
}

fn resolve_raw(store: &Store, raw: &Value) -> Result<View, RackError> {
    match raw {
        Value::String(s) if Key::looks_like_query(s) => {
            let entries = store.query_all_plain(s)?;
            Ok(View::Many(entries))
        }
        Value::String(key) => match store.fetch_plain(key) {
            Ok(entry) => Ok(View::One(Box::new(entry))),
            Err(err) if err.is_not_found() => Ok(View::Empty),
            Err(err) => Err(err),
        },
        Value::List(items) => {
            let mut out = Vec::new();
            for item in items {
                let Value::String(key) = item else { continue };
                match store.fetch_plain(key) {
                    Ok(entry) => out.push(entry),
                    Err(err) if err.is_not_found() => continue,
                    Err(err) => return Err(err),
                }
            }
            Ok(View::Many(out))
        }
        _ => Ok(View::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Id;
    use crate::model::{EntityModel, FieldKind as FK, FieldModel};
    use crate::store::{PutKey, StoreConfig};
    use std::collections::BTreeMap;

    const BOOK_FIELDS: &[FieldModel] = &[FieldModel::required("title", FK::String)];
    const BOOK: EntityModel = EntityModel {
        type_name: "book",
        fields: BOOK_FIELDS,
    };
    const AUTHOR_FIELDS: &[FieldModel] = &[
        FieldModel::required("name", FK::String),
        FieldModel::required(
            "fk_books",
            FK::ForeignKey {
                view_name: "books",
            },
        ),
    ];
    const AUTHOR: EntityModel = EntityModel {
        type_name: "author",
        fields: AUTHOR_FIELDS,
    };

    fn store() -> Store {
        let mut store = Store::open(StoreConfig::temporary()).unwrap();
        store.register(BOOK).unwrap();
        store.register(AUTHOR).unwrap();
        store
    }

    fn book(title: &str) -> Entry {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), Value::String(title.into()));
        Entry::new("book", Id::Auto, fields)
    }

    #[test]
    fn resolves_key_list_in_order() {
        let store = store();
        let b0 = store.put(PutKey::Unique, book("The A")).unwrap();
        let b1 = store.put(PutKey::Unique, book("The B")).unwrap();

        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Value::String("A.B. Cee".into()));
        fields.insert(
            "fk_books".to_string(),
            Value::List(vec![
                Value::String(b0.canonical_key().unwrap()),
                Value::String(b1.canonical_key().unwrap()),
            ]),
        );
        let author = store
            .put(PutKey::Unique, Entry::new("author", Id::Auto, fields))
            .unwrap();

        let loaded = store.get_entry(&author.canonical_key().unwrap()).unwrap();
        let view = loaded.cached_view("books").unwrap();
        let titles: Vec<_> = view
            .as_many()
            .iter()
            .map(|e| e.field("title").unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["\"The A\"", "\"The B\""]);
    }
}
