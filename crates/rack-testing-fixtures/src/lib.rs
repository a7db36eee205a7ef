//! Shared entry-type fixtures used by `rack`'s integration tests and the
//! crate's own doc examples: a small `Book`/`Author` graph exercising
//! plain fields, defaults, and a foreign key.

use rack::define_entry;
use rack::model::FieldKind;
use rack::value::Value;

define_entry! {
    pub const BOOK = "book" {
        title: FieldKind::String;
        author: FieldKind::String;
        rating: FieldKind::Integer, default = Value::Integer(0);
    }
}

define_entry! {
    pub const AUTHOR = "author" {
        name: FieldKind::String;
        fk_books: FieldKind::ForeignKey { view_name: "books" }, default = Value::Null;
    }
}

/// Register both fixture schemas on a fresh store.
pub fn register_all(store: &mut rack::store::Store) -> Result<(), rack::error::RackError> {
    store.register(BOOK)?;
    store.register(AUTHOR)?;
    Ok(())
}

#[must_use]
pub fn book(title: &str, author: &str, rating: i64) -> rack::entry::Entry {
    let mut fields = std::collections::BTreeMap::new();
    fields.insert("title".to_string(), Value::String(title.to_string()));
    fields.insert("author".to_string(), Value::String(author.to_string()));
    fields.insert("rating".to_string(), Value::Integer(rating));
    rack::entry::Entry::new("book", rack::entry::Id::Auto, fields)
}

#[must_use]
pub fn author(name: &str, book_keys: &[&str]) -> rack::entry::Entry {
    let mut fields = std::collections::BTreeMap::new();
    fields.insert("name".to_string(), Value::String(name.to_string()));
    let keys = book_keys.iter().map(|k| Value::String((*k).to_string())).collect();
    fields.insert("fk_books".to_string(), Value::List(keys));
    rack::entry::Entry::new("author", rack::entry::Id::Auto, fields)
}
