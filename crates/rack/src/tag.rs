//! The built-in `tag` entry type (spec §3.2): a named slot for an
//! arbitrary JSON value or a persisted query. Tags are addressed by a
//! human-chosen name rather than a numeric id, and reading a tag returns
//! its `data` field (after resolving `fk_data`, if present) rather than
//! the tag record itself — both departures from the generic `Entry`
//! model, so tags get their own small codec instead of reusing
//! `codec::encode`/`decode`.

use crate::error::{ErrorClass, ErrorOrigin, RackError};
use crate::model::{EntityModel, FieldKind, FieldModel};
use crate::value::Value;

pub const TAG_TYPE_NAME: &str = "tag";

const TAG_FIELDS: &[FieldModel] = &[
    FieldModel::required("name", FieldKind::String),
    FieldModel::with_default("data", FieldKind::Null, || Value::Null),
    FieldModel::with_default("fk_data", FieldKind::ForeignKey { view_name: "data" }, || {
        Value::Null
    }),
];

#[must_use]
pub const fn tag_schema() -> EntityModel {
    EntityModel {
        type_name: TAG_TYPE_NAME,
        fields: TAG_FIELDS,
    }
}

///
/// TagRecord
///
/// A decoded tag: its name (used to build the canonical key `tag_{name}`),
/// its raw `data` value, and the raw (unresolved) `fk_data` value if one
/// was stored.
///

#[derive(Clone, Debug, PartialEq)]
pub struct TagRecord {
    pub name: String,
    pub data: Value,
    pub fk_data: Option<Value>,
}

impl TagRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            fk_data: None,
        }
    }

    #[must_use]
    pub fn with_fk_query(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Value::Null,
            fk_data: Some(Value::String(query.into())),
        }
    }

    #[must_use]
    pub fn canonical_key(&self) -> String {
        format!("tag_{}", self.name)
    }

    pub fn encode(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("type".to_string(), serde_json::Value::String(TAG_TYPE_NAME.to_string()));
        map.insert("name".to_string(), serde_json::Value::String(self.name.clone()));
        map.insert("data".to_string(), self.data.clone().into());
        if let Some(fk) = &self.fk_data {
            map.insert("fk_data".to_string(), fk.clone().into());
        }
        serde_json::Value::Object(map)
    }

    pub fn decode(map: &serde_json::Value) -> Result<Self, RackError> {
        let obj = map.as_object().ok_or_else(|| {
            RackError::new(ErrorClass::Field, ErrorOrigin::Codec, "encoded tag is not a JSON object")
        })?;
        let type_name = obj.get("type").and_then(serde_json::Value::as_str);
        if type_name != Some(TAG_TYPE_NAME) {
            return Err(RackError::new(
                ErrorClass::Schema,
                ErrorOrigin::Codec,
                "not a tag record",
            ));
        }
        let name = obj
            .get("name")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| RackError::new(ErrorClass::Field, ErrorOrigin::Codec, "tag missing 'name'"))?
            .to_string();
        let data = obj.get("data").cloned().map(Value::from).unwrap_or(Value::Null);
        let fk_data = obj.get("fk_data").cloned().map(Value::from);
        Ok(Self { name, data, fk_data })
    }

    /// Expose `name`/`data`/`fk_data` as a `(field, value)` pair lookup, the
    /// same shape `Entry::field` exposes, so a tag can stand in as a query
    /// target row: a query whose target names an existing tag (spec §4.3
    /// grammar, §4.6 classification heuristic) is evaluated against the one
    /// tag record with that name, via this accessor (see `Store::query_all`).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::String(self.name.clone())),
            "data" => Some(self.data.clone()),
            "fk_data" => self.fk_data.clone(),
            _ => None,
        }
    }
}

impl crate::query::eval::Row for TagRecord {
    fn field(&self, name: &str) -> Option<Value> {
        Self::field(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let tag = TagRecord::new("hot", Value::Bool(true));
        let decoded = TagRecord::decode(&tag.encode()).unwrap();
        assert_eq!(tag, decoded);
    }

    #[test]
    fn canonical_key_uses_name_not_a_number() {
        let tag = TagRecord::new("hot", Value::Null);
        assert_eq!(tag.canonical_key(), "tag_hot");
    }
}
