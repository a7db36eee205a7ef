pub mod entity;
pub mod registry;

pub use entity::{EntityModel, FieldKind, FieldModel};
pub use registry::SchemaRegistry;
