use crate::value::Value;

///
/// FieldKind
///
/// Declared semantic type of one field (spec §3.1). `ForeignKey` marks a
/// field whose name begins with `fk_`; its `view_name` is the projected
/// attribute name materialized on read (the `fk_` prefix stripped).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Bool,
    List,
    Map,
    Null,
    ForeignKey { view_name: &'static str },
}

///
/// FieldModel
///
/// Runtime field metadata: name, declared kind, and an optional default
/// used by the codec when a field is missing from a decoded map.
///

#[derive(Clone, Copy)]
pub struct FieldModel {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: Option<fn() -> Value>,
}

impl FieldModel {
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            default: None,
        }
    }

    #[must_use]
    pub const fn with_default(name: &'static str, kind: FieldKind, default: fn() -> Value) -> Self {
        Self {
            name,
            kind,
            default: Some(default),
        }
    }

    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        matches!(self.kind, FieldKind::ForeignKey { .. })
    }
}

///
/// EntityModel
///
/// Minimal runtime model for one registered entry type: its external
/// `type` tag and its ordered, declared field list. Field order is not
/// semantically significant (the codec keys by name) but is kept stable
/// for deterministic `fields()` iteration and pretty-printing.
///

#[derive(Clone, Copy)]
pub struct EntityModel {
    pub type_name: &'static str,
    pub fields: &'static [FieldModel],
}

impl EntityModel {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn foreign_keys(&self) -> impl Iterator<Item = &FieldModel> {
        self.fields.iter().filter(|f| f.is_foreign_key())
    }

    /// Validate the `fk_X` vs `X` naming collision rule from spec §3.1.
    #[must_use]
    pub fn has_view_collision(&self) -> Option<&'static str> {
        for fk in self.foreign_keys() {
            let FieldKind::ForeignKey { view_name } = fk.kind else {
                continue;
            };
            if self.fields.iter().any(|f| f.name == view_name) {
                return Some(view_name);
            }
        }
        None
    }
}
