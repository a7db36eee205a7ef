//! Entry envelope, the `UNIQUE` sentinel, and canonical-key modeling
//! (spec §3.1, §3.4, §9 "re-architecting dynamic patterns").

use crate::value::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;

///
/// Id
///
/// `Explicit` is a concrete, assigned id. `Auto` is the `UNIQUE` sentinel
/// in id position: "assign at insert time" (spec §3.4).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Id {
    Explicit(u64),
    Auto,
}

impl Id {
    #[must_use]
    pub const fn explicit(&self) -> Option<u64> {
        match self {
            Self::Explicit(id) => Some(*id),
            Self::Auto => None,
        }
    }
}

///
/// Key
///
/// Disambiguated key shapes accepted at the store's API boundary
/// (spec §4.6, §9). `Unique` is the `UNIQUE` sentinel used as the *key*
/// in a `put` call.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Key {
    Canonical { type_name: String, id: u64 },
    Name(String),
    Query(String),
    Unique,
}

impl Key {
    #[must_use]
    pub fn canonical(type_name: impl Into<String>, id: u64) -> Self {
        Self::Canonical {
            type_name: type_name.into(),
            id,
        }
    }

    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Render the canonical key string: `"{type}_{id}"` or `"tag_{name}"`.
    /// `Query` and `Unique` have no literal rendering.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Canonical { type_name, id } => Some(format!("{type_name}_{id}")),
            Self::Name(name) => Some(format!("tag_{name}")),
            Self::Query(_) | Self::Unique => None,
        }
    }

    /// Classify a raw key string the way `Store` does at its boundary
    /// (spec §4.6 "Query classification heuristic"): a query iff it
    /// contains `:`. Tag-name vs. literal-key disambiguation happens in
    /// `Store`, which knows the registry and can check tag existence.
    #[must_use]
    pub fn looks_like_query(raw: &str) -> bool {
        raw.contains(':')
    }
}

///
/// Entry
///
/// A decoded record: its type tag, id, and declared field values
/// (non-FK fields hold their literal value; FK fields hold the raw
/// stored form — key list, single key, or query string — never the
/// resolved view). Projected views are attached lazily in `views` and
/// are never part of the serialized form or of equality.
///

#[derive(Clone, Debug)]
pub struct Entry {
    pub type_name: String,
    pub id: Id,
    pub fields: BTreeMap<String, Value>,
    pub(crate) views: RefCell<BTreeMap<String, View>>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.id == other.id && self.fields == other.fields
    }
}

impl Entry {
    #[must_use]
    pub fn new(type_name: impl Into<String>, id: Id, fields: BTreeMap<String, Value>) -> Self {
        Self {
            type_name: type_name.into(),
            id,
            fields,
            views: RefCell::new(BTreeMap::new()),
        }
    }

    /// The canonical key for this entry, if its id has been assigned.
    #[must_use]
    pub fn canonical_key(&self) -> Option<String> {
        self.id.explicit().map(|id| format!("{}_{id}", self.type_name))
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Ordered field iterator: the "thin generated reflection" mixin
    /// convenience noted as out of scope for deep specification in
    /// spec §1, implemented here as a plain accessor rather than dynamic
    /// attribute injection (spec §9).
    #[must_use]
    pub fn fields_of(&self) -> Vec<(&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    #[must_use]
    pub(crate) fn cached_view(&self, name: &str) -> Option<View> {
        self.views.borrow().get(name).cloned()
    }

    pub(crate) fn cache_view(&self, name: &str, view: View) {
        self.views.borrow_mut().insert(name.to_string(), view);
    }
}

///
/// View
///
/// A materialized foreign-key projection. `One` is used when the raw
/// field value was a single key string; `Many` is used for a key list or
/// an embedded query (spec §4.5, component F).
///

#[derive(Clone, Debug)]
pub enum View {
    One(Box<Entry>),
    Many(Vec<Entry>),
    Empty,
}

impl View {
    #[must_use]
    pub fn as_many(&self) -> Vec<&Entry> {
        match self {
            Self::One(e) => vec![e.as_ref()],
            Self::Many(items) => items.iter().collect(),
            Self::Empty => Vec::new(),
        }
    }
}

impl crate::query::eval::Row for Entry {
    fn field(&self, name: &str) -> Option<Value> {
        Entry::field(self, name).cloned()
    }
}
