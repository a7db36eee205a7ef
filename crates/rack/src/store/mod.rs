//! The store façade (spec §4.6): mapping-style access over the KV engine,
//! `UNIQUE`-id assignment, query execution, sort, and pretty-printing.

pub mod backup;
pub mod kv;

use crate::codec;
use crate::entry::{Entry, Id, Key};
use crate::error::{ErrorClass, ErrorOrigin, RackError};
use crate::model::{EntityModel, SchemaRegistry};
use crate::query::{self, Diagnostic};
use crate::relation;
use crate::tag::{TagRecord, TAG_TYPE_NAME};
use crate::value::Value;
use kv::{KvEngine, SledEngine};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

///
/// StoreConfig
///
/// Where the KV file lives and whether to wipe it first (spec §5:
/// `wipe=True` truncates without prompting).
///

pub struct StoreConfig {
    kind: StoreKind,
}

enum StoreKind {
    File { path: PathBuf, wipe: bool },
    #[cfg(any(test, feature = "test-util"))]
    Temporary,
}

impl StoreConfig {
    #[must_use]
    pub fn file(path: impl Into<PathBuf>, wipe: bool) -> Self {
        Self {
            kind: StoreKind::File {
                path: path.into(),
                wipe,
            },
        }
    }

    #[cfg(any(test, feature = "test-util"))]
    #[must_use]
    pub fn temporary() -> Self {
        Self {
            kind: StoreKind::Temporary,
        }
    }
}

///
/// GetResult
///
/// The three shapes `Store::get` can return, dispatched on the key's
/// classification (spec §4.6): a canonical key yields a decoded entry, a
/// tag name yields its `data` value, a query yields a list of entries.
///

#[derive(Clone, Debug)]
pub enum GetResult {
    Entry(Entry),
    Many(Vec<Entry>),
    Value(Value),
}

///
/// PutKey
///
/// `Unique` requests id assignment (or uses `entry.id` if already
/// explicit); `Literal` pins the canonical key and is checked against the
/// entry's own type/id for consistency.
///

pub enum PutKey<'a> {
    Unique,
    Literal(&'a str),
}

///
/// Store
///

pub struct Store {
    registry: SchemaRegistry,
    kv: Box<dyn KvEngine>,
    backup_dir: PathBuf,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Store {
    pub fn open(config: StoreConfig) -> Result<Self, RackError> {
        let (kv, backup_dir): (Box<dyn KvEngine>, PathBuf) = match config.kind {
            StoreKind::File { path, wipe } => {
                let engine = SledEngine::open(&path, wipe)?;
                let dir = path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
                (Box::new(engine), dir)
            }
            #[cfg(any(test, feature = "test-util"))]
            StoreKind::Temporary => (Box::new(SledEngine::temporary()), std::env::temp_dir()),
        };
        Ok(Self {
            registry: SchemaRegistry::new(),
            kv,
            backup_dir,
            diagnostics: RefCell::new(Vec::new()),
        })
    }

    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self, RackError> {
        Self::open(StoreConfig::file(path, false))
    }

    pub fn register(&mut self, model: EntityModel) -> Result<(), RackError> {
        self.registry.register(model)
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Dispatch on key classification (spec §4.6): canonical key, tag name,
    /// or query string.
    pub fn get(&self, key: &str) -> Result<GetResult, RackError> {
        if let Some(target) = query_target(key) {
            if target == TAG_TYPE_NAME {
                return Err(RackError::new(
                    ErrorClass::Schema,
                    ErrorOrigin::Query,
                    "querying the built-in 'tag' type is not supported",
                ));
            }
            if self.registry.is_registered(target) || self.contains(&format!("tag_{target}"))? {
                return Ok(GetResult::Many(self.query_all(key)?));
            }
        }

        if let Some(name) = key.strip_prefix("tag_") {
            return self.get_tag(name).map(GetResult::Value);
        }

        let entry = self.fetch_plain(key)?;
        relation::resolve_all(self, &entry)?;
        Ok(GetResult::Entry(entry))
    }

    /// Convenience for callers that know `key` is a canonical entry key.
    pub fn get_entry(&self, key: &str) -> Result<Entry, RackError> {
        match self.get(key)? {
            GetResult::Entry(e) => Ok(e),
            _ => Err(RackError::new(
                ErrorClass::Key,
                ErrorOrigin::Store,
                format!("'{key}' did not resolve to a single entry"),
            )),
        }
    }

    fn get_tag(&self, name: &str) -> Result<Value, RackError> {
        let key = format!("tag_{name}");
        let raw = self.kv.get(&key)?.ok_or_else(|| RackError::key_not_found(&key))?;
        let json: serde_json::Value = serde_json::from_slice(&raw)?;
        let tag = TagRecord::decode(&json)?;
        match &tag.fk_data {
            Some(_) => {
                let view = tag_view(self, &tag)?;
                let items = view
                    .as_many()
                    .into_iter()
                    .map(|e| Value::from(codec::encode(e)))
                    .collect();
                Ok(Value::List(items))
            }
            None => Ok(tag.data),
        }
    }

    /// Decode a canonical entry key without resolving FK views. Used
    /// internally (and by the relation resolver) to keep FK expansion one
    /// level deep (spec §4.5).
    pub(crate) fn fetch_plain(&self, key: &str) -> Result<Entry, RackError> {
        let raw = self.kv.get(key)?.ok_or_else(|| RackError::key_not_found(key))?;
        let json: serde_json::Value = serde_json::from_slice(&raw)?;
        codec::decode(&self.registry, &json)
    }

    pub fn put(&self, key: PutKey<'_>, entry: Entry) -> Result<Entry, RackError> {
        self.registry.schema_for(&entry.type_name)?;

        let resolved = match key {
            PutKey::Unique => {
                let id = match entry.id {
                    Id::Explicit(id) => id,
                    Id::Auto => self.next_id(&entry.type_name)?,
                };
                Entry::new(entry.type_name.clone(), Id::Explicit(id), entry.fields.clone())
            }
            PutKey::Literal(literal) => {
                let Id::Explicit(id) = entry.id else {
                    return Err(RackError::new(
                        ErrorClass::Key,
                        ErrorOrigin::Store,
                        "put with a literal key requires an entry with an explicit id",
                    ));
                };
                let canonical = format!("{}_{id}", entry.type_name);
                if canonical != literal {
                    return Err(RackError::key_mismatch(literal, canonical));
                }
                entry
            }
        };

        let canonical_key = resolved
            .canonical_key()
            .expect("resolved entry always has an explicit id");
        let bytes = serde_json::to_vec(&codec::encode(&resolved))?;
        self.kv.put(&canonical_key, &bytes)?;
        Ok(resolved)
    }

    pub fn put_tag(&self, tag: TagRecord) -> Result<TagRecord, RackError> {
        let bytes = serde_json::to_vec(&tag.encode())?;
        self.kv.put(&tag.canonical_key(), &bytes)?;
        Ok(tag)
    }

    pub fn delete(&self, key: &str) -> Result<(), RackError> {
        if !self.contains(key)? {
            return Err(RackError::key_not_found(key));
        }
        self.kv.delete(key)
    }

    pub fn contains(&self, key: &str) -> Result<bool, RackError> {
        Ok(self.kv.get(key)?.is_some())
    }

    /// First match or `None`, never an error for "not found" (spec §4.6).
    pub fn exists(&self, query_or_key: &str) -> Result<Option<Entry>, RackError> {
        match self.get(query_or_key) {
            Ok(GetResult::Entry(e)) => Ok(Some(e)),
            Ok(GetResult::Many(mut entries)) => Ok(if entries.is_empty() {
                None
            } else {
                Some(entries.remove(0))
            }),
            Ok(GetResult::Value(_)) => Ok(None),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// `max(id for type) + 1`, or `0` if the type has no stored entries
    /// (spec §4.6 "UNIQUE id assignment rule").
    pub fn next_id(&self, type_name: &str) -> Result<u64, RackError> {
        let prefix = format!("{type_name}_");
        let max = self
            .kv
            .iter_keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).and_then(|s| s.parse::<u64>().ok()))
            .max();
        Ok(max.map_or(0, |m| m + 1))
    }

    pub fn count(&self, type_name: &str) -> Result<usize, RackError> {
        let prefix = format!("{type_name}_");
        Ok(self.kv.iter_keys()?.into_iter().filter(|k| k.starts_with(&prefix)).count())
    }

    /// Full ordered key listing (spec §4.7 sort order: schema-registration
    /// rank, then id; tags last, by name).
    pub fn keys(&self) -> Result<Vec<String>, RackError> {
        let mut keys = self.kv.iter_keys()?;
        keys.sort_by(|a, b| self.sort_key(a).cmp(&self.sort_key(b)));
        Ok(keys)
    }

    /// Decoded, FK-resolved entries for every non-tag key, in sort order.
    pub fn values(&self) -> Result<Vec<Entry>, RackError> {
        let mut out = Vec::new();
        for key in self.keys()? {
            if key.starts_with("tag_") {
                continue;
            }
            let entry = self.fetch_plain(&key)?;
            relation::resolve_all(self, &entry)?;
            out.push(entry);
        }
        Ok(out)
    }

    pub fn items(&self) -> Result<Vec<(String, Entry)>, RackError> {
        let mut out = Vec::new();
        for key in self.keys()? {
            if key.starts_with("tag_") {
                continue;
            }
            let entry = self.fetch_plain(&key)?;
            relation::resolve_all(self, &entry)?;
            out.push((key, entry));
        }
        Ok(out)
    }

    /// Single-pass scan, entries eagerly FK-resolved (spec §4.6).
    pub fn query_all(&self, query_str: &str) -> Result<Vec<Entry>, RackError> {
        let mut entries = self.query_all_plain(query_str)?;
        for entry in &entries {
            relation::resolve_all(self, entry)?;
        }
        entries.sort_by_key(Entry::id_sort_key);
        Ok(entries)
    }

    /// Same scan without eager FK resolution on the results — used by the
    /// relation resolver so an embedded query inside an `fk_X` field stays
    /// one level deep (spec §4.5).
    pub(crate) fn query_all_plain(&self, query_str: &str) -> Result<Vec<Entry>, RackError> {
        self.diagnostics.borrow_mut().clear();
        let ast = query::parse(query_str, &self.registry)?;

        if ast.target == TAG_TYPE_NAME {
            return Err(RackError::new(
                ErrorClass::Schema,
                ErrorOrigin::Query,
                "querying the built-in 'tag' type is not supported",
            ));
        }

        if !self.registry.is_registered(&ast.target) {
            return self.query_tag_instance(&ast);
        }

        let prefix = format!("{}_", ast.target);
        let mut matches = Vec::new();
        for key in self.kv.iter_keys()? {
            if !key.starts_with(&prefix) {
                continue;
            }
            let entry = self.fetch_plain(&key)?;
            match query::eval(&ast, &entry) {
                Ok(true) => matches.push(entry),
                Ok(false) => {}
                Err(err) => self.diagnostics.borrow_mut().push(Diagnostic {
                    key: key.clone(),
                    message: err.message,
                }),
            }
        }
        matches.sort_by_key(Entry::id_sort_key);
        Ok(matches)
    }

    /// `ast.target` names a tag, not a registered type (spec §4.3 grammar,
    /// §4.6 classification heuristic): evaluate against that one tag record
    /// instead of scanning a prefix range. An absent tag matches nothing.
    fn query_tag_instance(&self, ast: &query::Ast) -> Result<Vec<Entry>, RackError> {
        let key = format!("tag_{}", ast.target);
        let Some(raw) = self.kv.get(&key)? else {
            return Ok(Vec::new());
        };
        let json: serde_json::Value = serde_json::from_slice(&raw)?;
        let tag = TagRecord::decode(&json)?;
        match query::eval(ast, &tag) {
            Ok(true) => Ok(vec![tag_as_entry(&tag)]),
            Ok(false) => Ok(Vec::new()),
            Err(err) => {
                self.diagnostics.borrow_mut().push(Diagnostic { key, message: err.message });
                Ok(Vec::new())
            }
        }
    }

    /// Install a persisted tag if absent; no-op otherwise (spec §4.6). Used
    /// to attach an `fk_data` query that re-runs on every subsequent read.
    pub fn make_once(&self, name: &str, tag: TagRecord) -> Result<(), RackError> {
        let key = format!("tag_{name}");
        if self.contains(&key)? {
            return Ok(());
        }
        self.put_tag(tag)?;
        Ok(())
    }

    /// `sled` iterates lexicographically by key regardless of insertion
    /// order, so reordering storage has no observable effect here; this is
    /// the no-op branch spec §9 allows.
    pub fn sort(&self) -> Result<(), RackError> {
        tracing::debug!("sort() is a no-op: the backing kv engine is already key-ordered");
        Ok(())
    }

    pub fn pretty_entry(entry: &Entry) -> Result<String, RackError> {
        Ok(serde_json::to_string_pretty(&codec::encode(entry))?)
    }

    /// Pretty-printed JSON for a single `get` (spec §4.6 "pretty-print"
    /// bullet): whichever `GetResult` shape `key_or_query` resolves to.
    pub fn pretty(&self, key_or_query: &str) -> Result<String, RackError> {
        let json = match self.get(key_or_query)? {
            GetResult::Entry(entry) => codec::encode(&entry),
            GetResult::Many(entries) => {
                serde_json::Value::Array(entries.iter().map(codec::encode).collect())
            }
            GetResult::Value(value) => serde_json::Value::from(value),
        };
        Ok(serde_json::to_string_pretty(&json)?)
    }

    /// Pretty-printed JSON dump of every stored key (registered entries and
    /// tags alike), in `keys()` sort order.
    pub fn pretty_store(&self) -> Result<String, RackError> {
        let mut map = serde_json::Map::new();
        for key in self.keys()? {
            let raw = self.kv.get(&key)?.unwrap_or_default();
            let value: serde_json::Value = serde_json::from_slice(&raw)?;
            map.insert(key, value);
        }
        Ok(serde_json::to_string_pretty(&serde_json::Value::Object(map))?)
    }

    pub fn close(&self) -> Result<(), RackError> {
        self.kv.close()
    }

    fn sort_key(&self, key: &str) -> (usize, u64, String) {
        if let Some(name) = key.strip_prefix("tag_") {
            return (usize::MAX, 0, name.to_string());
        }
        if let Some((type_name, id)) = split_canonical(key) {
            let rank = self.registry.type_rank(type_name).unwrap_or(usize::MAX - 1);
            return (rank, id, String::new());
        }
        (usize::MAX - 1, 0, key.to_string())
    }
}

/// Wrap a matched tag record as a pseudo-entry so a tag-instance query result
/// can travel through the same `Vec<Entry>` path as any other query
/// (`type_name = "tag"`, a dummy id — a tag has no numeric identity).
fn tag_as_entry(tag: &TagRecord) -> Entry {
    let mut fields = std::collections::BTreeMap::new();
    fields.insert("name".to_string(), Value::String(tag.name.clone()));
    fields.insert("data".to_string(), tag.data.clone());
    if let Some(fk) = &tag.fk_data {
        fields.insert("fk_data".to_string(), fk.clone());
    }
    Entry::new(TAG_TYPE_NAME, Id::Explicit(0), fields)
}

fn tag_view(store: &Store, tag: &TagRecord) -> Result<crate::entry::View, RackError> {
    let Some(raw) = &tag.fk_data else {
        return Ok(crate::entry::View::Empty);
    };
    let host = Entry::new(TAG_TYPE_NAME, Id::Explicit(0), {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("fk_data".to_string(), raw.clone());
        fields
    });
    relation::ensure_view(store, &host, "fk_data", "data")?;
    Ok(host.cached_view("data").unwrap_or(crate::entry::View::Empty))
}

fn query_target(raw: &str) -> Option<&str> {
    if !Key::looks_like_query(raw) {
        return None;
    }
    raw.split_once(':').map(|(target, _)| target.trim())
}

fn split_canonical(key: &str) -> Option<(&str, u64)> {
    let (type_name, id) = key.rsplit_once('_')?;
    let id = id.parse::<u64>().ok()?;
    Some((type_name, id))
}

impl Entry {
    fn id_sort_key(&self) -> u64 {
        self.id.explicit().unwrap_or(0)
    }
}


impl PartialEq for GetResult {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Entry(a), Self::Entry(b)) => a == b,
            (Self::Many(a), Self::Many(b)) => a == b,
            (Self::Value(a), Self::Value(b)) => a == b,
            _ => false,
        }
    }
}
