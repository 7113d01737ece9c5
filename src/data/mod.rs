//! Data module: value kinds, typed arrays, and tables
#![warn(missing_docs)]

pub mod array;
pub mod kind;
pub mod named_tables;
pub mod table;
pub mod typed_array;
pub mod value;

pub use array::{Array, ArrayValue, Value};
pub use kind::ValueKind;
pub use named_tables::NamedTables;
pub use table::Table;
pub use typed_array::{
    DOMAIN_KEY, POINT_INDICES_DOMAIN, ROLE_KEY, SELECTION_ROLE, TypedArray,
};
pub use value::{
    Color, FloatComponents, Handle, Matrix4, Normal3, Point2, Point3, Point4, Texture3, Vector2,
    Vector3,
};
