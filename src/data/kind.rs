//! Value-kind tags for type-erased arrays.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshError;

/// The fixed set of element kinds an [`Array`](crate::data::array::Array) can hold.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    /// Also the index and count kind used by structure tables.
    U64,
    /// Double-precision float; selection weights use this kind.
    F64,
    String,
    Point2,
    Point3,
    Point4,
    Vector2,
    Vector3,
    Normal3,
    Texture3,
    Color,
    Matrix4,
    Handle,
}

impl ValueKind {
    pub const ALL: [ValueKind; 21] = [
        ValueKind::Bool,
        ValueKind::I8,
        ValueKind::I16,
        ValueKind::I32,
        ValueKind::I64,
        ValueKind::U8,
        ValueKind::U16,
        ValueKind::U32,
        ValueKind::U64,
        ValueKind::F64,
        ValueKind::String,
        ValueKind::Point2,
        ValueKind::Point3,
        ValueKind::Point4,
        ValueKind::Vector2,
        ValueKind::Vector3,
        ValueKind::Normal3,
        ValueKind::Texture3,
        ValueKind::Color,
        ValueKind::Matrix4,
        ValueKind::Handle,
    ];

    /// Returns a stable string label for the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::I8 => "i8",
            ValueKind::I16 => "i16",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::U8 => "u8",
            ValueKind::U16 => "u16",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::F64 => "f64",
            ValueKind::String => "string",
            ValueKind::Point2 => "point2",
            ValueKind::Point3 => "point3",
            ValueKind::Point4 => "point4",
            ValueKind::Vector2 => "vector2",
            ValueKind::Vector3 => "vector3",
            ValueKind::Normal3 => "normal3",
            ValueKind::Texture3 => "texture3",
            ValueKind::Color => "color",
            ValueKind::Matrix4 => "matrix4",
            ValueKind::Handle => "handle",
        }
    }

    /// Parse a kind from its label.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }

    /// True for kinds compared by ULP distance rather than exact equality.
    pub fn is_floating(self) -> bool {
        matches!(
            self,
            ValueKind::F64
                | ValueKind::Point2
                | ValueKind::Point3
                | ValueKind::Point4
                | ValueKind::Vector2
                | ValueKind::Vector3
                | ValueKind::Normal3
                | ValueKind::Texture3
                | ValueKind::Color
                | ValueKind::Matrix4
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::parse(s).ok_or_else(|| MeshError::UnknownKind(s.to_string()))
    }
}
