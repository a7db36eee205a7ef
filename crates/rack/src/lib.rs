//! `rack`: an embedded, single-process document store with a textual
//! query language and lazy foreign-key resolution.
#![warn(unreachable_pub)]

pub mod macros;

pub mod codec;
pub mod entry;
pub mod error;
pub mod model;
pub mod query;
pub mod relation;
pub mod store;
pub mod tag;
pub mod value;

///
/// Prelude
///
/// Domain vocabulary only; errors, the store, and the kv engine trait are
/// reached through their own modules.
///

pub mod prelude {
    pub use crate::entry::{Entry, Id, Key, View};
    pub use crate::model::{EntityModel, FieldKind, FieldModel, SchemaRegistry};
    pub use crate::query::{Ast, Op};
    pub use crate::tag::TagRecord;
    pub use crate::value::Value;
}
