//! `define_entry!`: the thin generated-reflection convenience spec §9
//! asks for instead of dynamic attribute injection — a field descriptor
//! table built once, at compile time, rather than per `register` call.

/// Declare an entry type's schema as a `const EntityModel`.
///
/// ```ignore
/// define_entry! {
///     pub const BOOK = "book" {
///         title: FieldKind::String;
///         author: FieldKind::String;
///         rating: FieldKind::Integer, default = Value::Integer(0);
///         fk_authors: FieldKind::ForeignKey { view_name: "authors" };
///     }
/// }
/// ```
#[macro_export]
macro_rules! define_entry {
    (
        $vis:vis const $name:ident = $type_name:literal {
            $( $field:ident : $kind:expr $(, default = $default:expr)? );* $(;)?
        }
    ) => {
        $vis const $name: $crate::model::EntityModel = $crate::model::EntityModel {
            type_name: $type_name,
            fields: &[
                $( $crate::__define_entry_field!($field, $kind $(, $default)?) ),*
            ],
        };
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __define_entry_field {
    ($field:ident, $kind:expr) => {
        $crate::model::FieldModel::required(stringify!($field), $kind)
    };
    ($field:ident, $kind:expr, $default:expr) => {
        $crate::model::FieldModel::with_default(stringify!($field), $kind, || $default)
    };
}
