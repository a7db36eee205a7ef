use crate::error::{ErrorClass, ErrorOrigin, RackError};
use crate::model::entity::EntityModel;
use std::collections::HashMap;

///
/// SchemaRegistry
///
/// Per-store registry of entry schemas (spec §4.1). Registration order is
/// stable and defines the sort order used by the store's `sort()`
/// operation. Not a process-wide singleton: a registry is injected at
/// store construction (spec §9).
///

#[derive(Default)]
pub struct SchemaRegistry {
    order: Vec<&'static str>,
    schemas: HashMap<&'static str, EntityModel>,
}

impl SchemaRegistry {
    /// A fresh registry pre-seeded with the built-in `tag` schema (spec
    /// §3.2). `tag` is exempt from the ordinary `fk_X`/`X` collision rule:
    /// its `fk_data` view deliberately overrides the sibling `data` field
    /// rather than living alongside it, so it is inserted directly instead
    /// of going through `register`.
    #[must_use]
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        schemas.insert(crate::tag::TAG_TYPE_NAME, crate::tag::tag_schema());
        Self {
            order: Vec::new(),
            schemas,
        }
    }

    /// Register a schema. Rejects a duplicate `type_name` and a forbidden
    /// `fk_X`/`X` view-name collision.
    pub fn register(&mut self, model: EntityModel) -> Result<(), RackError> {
        if self.schemas.contains_key(model.type_name) {
            return Err(RackError::new(
                ErrorClass::Schema,
                ErrorOrigin::Registry,
                format!("duplicate type registration: {}", model.type_name),
            ));
        }
        if let Some(view_name) = model.has_view_collision() {
            return Err(RackError::new(
                ErrorClass::Field,
                ErrorOrigin::Registry,
                format!(
                    "field '{view_name}' collides with the projected view of an fk_ field on type '{}'",
                    model.type_name
                ),
            ));
        }
        self.order.push(model.type_name);
        self.schemas.insert(model.type_name, model);
        Ok(())
    }

    pub fn schema_for(&self, type_name: &str) -> Result<&EntityModel, RackError> {
        self.schemas.get(type_name).ok_or_else(|| {
            RackError::new(
                ErrorClass::Schema,
                ErrorOrigin::Registry,
                format!("unknown type: {type_name}"),
            )
        })
    }

    #[must_use]
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    #[must_use]
    pub fn all_registered_types(&self) -> &[&'static str] {
        &self.order
    }

    /// Position of `type_name` in registration order, used to group
    /// entries for `Store::sort` (spec §4.7). `None` for the `tag` type,
    /// which always sorts last.
    #[must_use]
    pub fn type_rank(&self, type_name: &str) -> Option<usize> {
        self.order.iter().position(|t| *t == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::{FieldKind, FieldModel};

    const BOOK_FIELDS: &[FieldModel] = &[FieldModel::required("title", FieldKind::String)];
    const BOOK: EntityModel = EntityModel {
        type_name: "book",
        fields: BOOK_FIELDS,
    };

    #[test]
    fn rejects_duplicate_registration() {
        let mut reg = SchemaRegistry::new();
        reg.register(BOOK).unwrap();
        let err = reg.register(BOOK).unwrap_err();
        assert_eq!(err.class, ErrorClass::Schema);
    }

    #[test]
    fn unknown_type_is_schema_error() {
        let reg = SchemaRegistry::new();
        let err = reg.schema_for("book").unwrap_err();
        assert_eq!(err.class, ErrorClass::Schema);
    }

    #[test]
    fn registration_order_is_stable() {
        const AUTHOR: EntityModel = EntityModel {
            type_name: "author",
            fields: &[],
        };
        let mut reg = SchemaRegistry::new();
        reg.register(BOOK).unwrap();
        reg.register(AUTHOR).unwrap();
        assert_eq!(reg.all_registered_types(), &["book", "author"]);
        assert_eq!(reg.type_rank("book"), Some(0));
        assert_eq!(reg.type_rank("author"), Some(1));
    }
}
