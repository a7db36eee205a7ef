//! Entry codec (spec §4.2): entry instance <-> JSON-shaped map, enforcing
//! the `id`/`type` envelope.

use crate::entry::{Entry, Id};
use crate::error::{ErrorClass, ErrorOrigin, RackError};
use crate::model::{FieldKind, SchemaRegistry};
use crate::value::Value;
use std::collections::BTreeMap;

const ENVELOPE_KEYS: &[&str] = &["id", "type"];

/// Emit the declared non-FK fields, the FK fields as stored (never
/// resolved), and the `{id, type}` envelope. Projected views are never
/// part of the encoded form because they never enter `Entry::fields`.
pub fn encode(entry: &Entry) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert("type".to_string(), serde_json::Value::String(entry.type_name.clone()));
    let id = match entry.id {
        Id::Explicit(id) => serde_json::Value::from(id),
        Id::Auto => serde_json::Value::String("UNIQUE".to_string()),
    };
    map.insert("id".to_string(), id);
    for (name, value) in &entry.fields {
        map.insert(name.clone(), serde_json::Value::from(value.clone()));
    }
    serde_json::Value::Object(map)
}

/// Look up the schema by `map.type`, fill missing optional fields with
/// their defaults, and reject unknown fields (spec §4.2).
pub fn decode(registry: &SchemaRegistry, map: &serde_json::Value) -> Result<Entry, RackError> {
    let obj = map.as_object().ok_or_else(|| {
        RackError::new(
            ErrorClass::Field,
            ErrorOrigin::Codec,
            "encoded entry is not a JSON object",
        )
    })?;

    let type_name = obj
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            RackError::new(ErrorClass::Field, ErrorOrigin::Codec, "missing 'type' field")
        })?;

    let schema = registry.schema_for(type_name)?;

    let id = decode_id(obj)?;

    let mut fields = BTreeMap::new();
    for field in schema.fields {
        match obj.get(field.name) {
            Some(raw) => {
                let value = Value::from(raw.clone());
                if !kind_matches(field.kind, &value) {
                    return Err(RackError::new(
                        ErrorClass::Field,
                        ErrorOrigin::Codec,
                        format!(
                            "field '{}' on type '{type_name}' does not match its declared kind {:?}",
                            field.name, field.kind
                        ),
                    ));
                }
                fields.insert(field.name.to_string(), value);
            }
            None => {
                if let Some(default) = field.default {
                    fields.insert(field.name.to_string(), default());
                } else {
                    return Err(RackError::new(
                        ErrorClass::Field,
                        ErrorOrigin::Codec,
                        format!("missing required field '{}' on type '{type_name}'", field.name),
                    ));
                }
            }
        }
    }

    for key in obj.keys() {
        if ENVELOPE_KEYS.contains(&key.as_str()) {
            continue;
        }
        if schema.field(key).is_none() {
            return Err(RackError::new(
                ErrorClass::Field,
                ErrorOrigin::Codec,
                format!("unknown field '{key}' on type '{type_name}'"),
            ));
        }
    }

    Ok(Entry::new(type_name, id, fields))
}

/// Does `value`'s runtime shape match `kind` (spec §4.2 "FieldError on type
/// mismatch")? An `fk_X` field's raw stored form is a single key, a key
/// list, a query string, or absent — never literally shaped like a
/// `ForeignKey` value, so it accepts a string, a list, or null.
fn kind_matches(kind: FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::String => matches!(value, Value::String(_)),
        FieldKind::Integer => matches!(value, Value::Integer(_)),
        FieldKind::Float => matches!(value, Value::Float(_)),
        FieldKind::Bool => matches!(value, Value::Bool(_)),
        FieldKind::List => matches!(value, Value::List(_)),
        FieldKind::Map => matches!(value, Value::Map(_)),
        FieldKind::Null => matches!(value, Value::Null),
        FieldKind::ForeignKey { .. } => {
            matches!(value, Value::String(_) | Value::List(_) | Value::Null)
        }
    }
}

fn decode_id(obj: &serde_json::Map<String, serde_json::Value>) -> Result<Id, RackError> {
    match obj.get("id") {
        Some(serde_json::Value::String(s)) if s == "UNIQUE" => Ok(Id::Auto),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .map(Id::Explicit)
            .ok_or_else(|| RackError::new(ErrorClass::Field, ErrorOrigin::Codec, "id must be a non-negative integer")),
        _ => Err(RackError::new(
            ErrorClass::Field,
            ErrorOrigin::Codec,
            "missing or malformed 'id' field",
        )),
    }
}
