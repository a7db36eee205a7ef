//! Tagged value model (spec §3.3) shared by entry fields and query literals.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

///
/// Value
///
/// A tagged scalar/list/map value. Used both as the declared-field storage
/// representation (§3.1) and as a query literal (§3.3). Lists are
/// homogeneous only by convention; operators treat them as ordered
/// sequences.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Structural equality, case-sensitive.
    #[must_use]
    pub fn eq_structural(&self, other: &Self) -> bool {
        self == other
    }

    /// Equality after lowercasing strings on both sides; non-strings fall
    /// back to structural equality (spec §4.3, `==.`).
    #[must_use]
    pub fn eq_ci(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => self.eq_structural(other),
        }
    }

    /// Numeric-or-lexical ordering; `None` when the two values aren't
    /// comparable (spec §4.3, `<`, `<=`, `>`, `>=`).
    #[must_use]
    pub fn order_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::List(a), Self::List(b)) => order_cmp_list(a, b),
            _ => None,
        }
    }

    /// `self` starts-with / ends-with `other`, case-sensitive (`<%`, `%>`).
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> Option<bool> {
        as_str_pair(self, other).map(|(a, b)| a.starts_with(b))
    }

    #[must_use]
    pub fn ends_with(&self, other: &Self) -> Option<bool> {
        as_str_pair(self, other).map(|(a, b)| a.ends_with(b))
    }

    #[must_use]
    pub fn starts_with_ci(&self, other: &Self) -> Option<bool> {
        as_str_pair(self, other).map(|(a, b)| a.to_lowercase().starts_with(&b.to_lowercase()))
    }

    #[must_use]
    pub fn ends_with_ci(&self, other: &Self) -> Option<bool> {
        as_str_pair(self, other).map(|(a, b)| a.to_lowercase().ends_with(&b.to_lowercase()))
    }

    /// `self ∈ other`: `other` must be a list or a string (spec §4.3, `->`).
    #[must_use]
    pub fn member_of(&self, other: &Self) -> Option<bool> {
        match other {
            Self::List(items) => Some(items.iter().any(|item| item == self)),
            Self::String(haystack) => match self {
                Self::String(needle) => Some(haystack.contains(needle.as_str())),
                _ => None,
            },
            _ => None,
        }
    }

    #[must_use]
    pub fn member_of_ci(&self, other: &Self) -> Option<bool> {
        match other {
            Self::List(items) => Some(items.iter().any(|item| item.eq_ci(self))),
            Self::String(haystack) => match self {
                Self::String(needle) => {
                    Some(haystack.to_lowercase().contains(&needle.to_lowercase()))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Literal-encoded rendering used by `Query::statement` (spec §4.3.1):
    /// strings quoted, lists comma-joined, booleans as `True`/`False`.
    #[must_use]
    pub fn literal_encode(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("{s:?}"),
            Self::List(items) => items
                .iter()
                .map(Self::literal_encode)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Map(_) => {
                // Not a sanctioned query literal shape; render as JSON for
                // diagnostics only.
                serde_json::to_string(&serde_json::Value::from(self.clone()))
                    .unwrap_or_default()
            }
        }
    }
}

fn as_str_pair<'a>(a: &'a Value, b: &'a Value) -> Option<(&'a str, &'a str)> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some((a.as_str(), b.as_str())),
        _ => None,
    }
}

fn order_cmp_list(a: &[Value], b: &[Value]) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.order_cmp(y) {
            Some(Ordering::Equal) => continue,
            other => return other,
        }
    }
    a.len().partial_cmp(&b.len())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal_encode())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Integer(i) => Self::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f).map_or(Self::Null, Self::from),
            Value::String(s) => Self::String(s),
            Value::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Map(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ci_equality() {
        let a = Value::String("Hello".into());
        let b = Value::String("hello".into());
        assert!(a.eq_ci(&b));
        assert!(!a.eq_structural(&b));
    }

    #[test]
    fn ordering_mixed_numeric() {
        let a = Value::Integer(3);
        let b = Value::Float(3.5);
        assert_eq!(a.order_cmp(&b), Some(Ordering::Less));
    }

    #[test]
    fn member_of_list() {
        let needle = Value::String("A.B. Cee".into());
        let haystack = Value::List(vec![
            Value::String("A.B. Cee".into()),
            Value::String("B.C. Dea".into()),
        ]);
        assert_eq!(needle.member_of(&haystack), Some(true));
    }

    #[test]
    fn literal_encode_list_and_bool() {
        let v = Value::List(vec![Value::Bool(true), Value::Integer(1)]);
        assert_eq!(v.literal_encode(), "True, 1");
    }
}
