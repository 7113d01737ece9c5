//! Type-erased arrays over the closed set of value kinds.
//!
//! [`Array`] is a tagged union with one variant per [`ValueKind`], each
//! wrapping a statically typed [`TypedArray`]. Callers pick the element type
//! once, through [`ArrayValue`], and get typed slices back; the dynamic path
//! ([`Value`], [`Array::push_value`]) checks kinds at runtime and never
//! coerces between them.
//!
//! Code that must handle every kind generically (printing, diffing, resizing)
//! goes through the [`ArrayVisitor`] family instead of matching on variants.

use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

use crate::data::kind::ValueKind;
use crate::data::typed_array::TypedArray;
use crate::data::value::{
    Color, Handle, Matrix4, Normal3, Point2, Point3, Point4, Texture3, Vector2, Vector3,
};
use crate::difference::{Accumulator, Difference};
use crate::mesh_error::MeshError;

/// Element types that can live in an [`Array`].
pub trait ArrayValue:
    Clone + Debug + Default + Display + PartialEq + Difference + Send + Sync + Sized + 'static
{
    /// Kind tag for this concrete type.
    const KIND: ValueKind;

    /// Wrap a typed array into the tagged container.
    fn wrap(array: TypedArray<Self>) -> Array;
    /// Borrow a typed array if the tag matches.
    fn unwrap(array: &Array) -> Option<&TypedArray<Self>>;
    /// Mutably borrow a typed array if the tag matches.
    fn unwrap_mut(array: &mut Array) -> Option<&mut TypedArray<Self>>;
    /// Box a single value into a dynamic [`Value`].
    fn into_value(self) -> Value;
    /// Extract a single value if the tag matches.
    fn from_value(value: Value) -> Option<Self>;
}

/// Visits the typed array behind an [`Array`].
pub trait ArrayVisitor {
    type Output;
    fn visit<T: ArrayValue>(self, array: &TypedArray<T>) -> Self::Output;
}

/// Mutably visits the typed array behind an [`Array`].
pub trait ArrayVisitorMut {
    type Output;
    fn visit<T: ArrayValue>(self, array: &mut TypedArray<T>) -> Self::Output;
}

/// Visits two arrays at once; `visit` runs only when both have the same kind.
pub trait ArrayPairVisitor {
    type Output;
    fn visit<T: ArrayValue>(self, a: &TypedArray<T>, b: &TypedArray<T>) -> Self::Output;
    fn kind_mismatch(self, a: &Array, b: &Array) -> Self::Output;
}

macro_rules! value_kinds {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        /// A type-erased array of one fixed [`ValueKind`].
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "kind", content = "array", rename_all = "snake_case")]
        pub enum Array {
            $($variant(TypedArray<$ty>),)+
        }

        /// A single dynamically typed value.
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "kind", content = "value", rename_all = "snake_case")]
        pub enum Value {
            $($variant($ty),)+
        }

        impl Array {
            /// Kind tag of the wrapped array.
            pub fn kind(&self) -> ValueKind {
                match self {
                    $(Array::$variant(_) => ValueKind::$variant,)+
                }
            }

            /// A new, empty array of `kind`.
            pub fn empty(kind: ValueKind) -> Self {
                match kind {
                    $(ValueKind::$variant => Array::$variant(TypedArray::new()),)+
                }
            }

            pub fn visit<V: ArrayVisitor>(&self, visitor: V) -> V::Output {
                match self {
                    $(Array::$variant(a) => visitor.visit(a),)+
                }
            }

            pub fn visit_mut<V: ArrayVisitorMut>(&mut self, visitor: V) -> V::Output {
                match self {
                    $(Array::$variant(a) => visitor.visit(a),)+
                }
            }

            pub fn visit_pair<V: ArrayPairVisitor>(&self, other: &Array, visitor: V) -> V::Output {
                match (self, other) {
                    $((Array::$variant(a), Array::$variant(b)) => visitor.visit(a, b),)+
                    _ => visitor.kind_mismatch(self, other),
                }
            }
        }

        impl Value {
            pub fn kind(&self) -> ValueKind {
                match self {
                    $(Value::$variant(_) => ValueKind::$variant,)+
                }
            }
        }

        impl Difference for Value {
            fn difference(&self, other: &Self, acc: &mut Accumulator) {
                match (self, other) {
                    $((Value::$variant(a), Value::$variant(b)) => a.difference(b, acc),)+
                    _ => acc.exact(false),
                }
            }
        }

        $(
            impl ArrayValue for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn wrap(array: TypedArray<Self>) -> Array {
                    Array::$variant(array)
                }

                fn unwrap(array: &Array) -> Option<&TypedArray<Self>> {
                    if let Array::$variant(a) = array { Some(a) } else { None }
                }

                fn unwrap_mut(array: &mut Array) -> Option<&mut TypedArray<Self>> {
                    if let Array::$variant(a) = array { Some(a) } else { None }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Option<Self> {
                    if let Value::$variant(v) = value { Some(v) } else { None }
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )+
    };
}

value_kinds! {
    Bool => bool,
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
    U8 => u8,
    U16 => u16,
    U32 => u32,
    U64 => u64,
    F64 => f64,
    String => String,
    Point2 => Point2,
    Point3 => Point3,
    Point4 => Point4,
    Vector2 => Vector2,
    Vector3 => Vector3,
    Normal3 => Normal3,
    Texture3 => Texture3,
    Color => Color,
    Matrix4 => Matrix4,
    Handle => Handle,
}

// -----------------------------------------------------------------------------
// Kind-generic operations
// -----------------------------------------------------------------------------

struct Len;
impl ArrayVisitor for Len {
    type Output = usize;
    fn visit<T: ArrayValue>(self, array: &TypedArray<T>) -> usize {
        array.len()
    }
}

struct Metadata;
impl ArrayVisitor for Metadata {
    type Output = BTreeMap<String, String>;
    fn visit<T: ArrayValue>(self, array: &TypedArray<T>) -> Self::Output {
        array.metadata().clone()
    }
}

struct MetadataValue<'a>(&'a str);
impl ArrayVisitor for MetadataValue<'_> {
    type Output = Option<String>;
    fn visit<T: ArrayValue>(self, array: &TypedArray<T>) -> Option<String> {
        array.metadata_value(self.0).map(str::to_string)
    }
}

struct SetMetadata<'a>(&'a str, &'a str);
impl ArrayVisitorMut for SetMetadata<'_> {
    type Output = Option<String>;
    fn visit<T: ArrayValue>(self, array: &mut TypedArray<T>) -> Option<String> {
        array.set_metadata_value(self.0, self.1)
    }
}

struct Resize(usize);
impl ArrayVisitorMut for Resize {
    type Output = ();
    fn visit<T: ArrayValue>(self, array: &mut TypedArray<T>) {
        array.resize(self.0, T::default());
    }
}

struct CloneType;
impl ArrayVisitor for CloneType {
    type Output = Array;
    fn visit<T: ArrayValue>(self, array: &TypedArray<T>) -> Array {
        T::wrap(array.clone_type())
    }
}

struct CloneRange(usize, usize);
impl ArrayVisitor for CloneRange {
    type Output = Result<Array, MeshError>;
    fn visit<T: ArrayValue>(self, array: &TypedArray<T>) -> Result<Array, MeshError> {
        array.clone_range(self.0, self.1).map(T::wrap)
    }
}

struct GetValue(usize);
impl ArrayVisitor for GetValue {
    type Output = Option<Value>;
    fn visit<T: ArrayValue>(self, array: &TypedArray<T>) -> Option<Value> {
        array.get(self.0).cloned().map(T::into_value)
    }
}

struct RenderValues;
impl ArrayVisitor for RenderValues {
    type Output = Vec<String>;
    fn visit<T: ArrayValue>(self, array: &TypedArray<T>) -> Vec<String> {
        array.iter().map(ToString::to_string).collect()
    }
}

impl Array {
    /// Wrap a typed array.
    pub fn from_typed<T: ArrayValue>(array: TypedArray<T>) -> Self {
        T::wrap(array)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.visit(Len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow as `TypedArray<T>`, or `None` if the kind differs.
    pub fn typed<T: ArrayValue>(&self) -> Option<&TypedArray<T>> {
        T::unwrap(self)
    }

    pub fn typed_mut<T: ArrayValue>(&mut self) -> Option<&mut TypedArray<T>> {
        T::unwrap_mut(self)
    }

    /// Like [`Array::typed`] but reports a `TypeMismatch` for array `name`.
    pub fn try_typed<T: ArrayValue>(&self, name: &str) -> Result<&TypedArray<T>, MeshError> {
        let found = self.kind();
        T::unwrap(self).ok_or_else(|| MeshError::TypeMismatch {
            name: name.to_string(),
            expected: T::KIND,
            found,
        })
    }

    pub fn try_typed_mut<T: ArrayValue>(
        &mut self,
        name: &str,
    ) -> Result<&mut TypedArray<T>, MeshError> {
        let found = self.kind();
        T::unwrap_mut(self).ok_or_else(|| MeshError::TypeMismatch {
            name: name.to_string(),
            expected: T::KIND,
            found,
        })
    }

    /// Append a dynamically typed value.
    ///
    /// # Errors
    /// Returns `TypeMismatch` if `value` is not of this array's kind.
    pub fn push_value(&mut self, value: Value) -> Result<(), MeshError> {
        struct Push(Value);
        impl ArrayVisitorMut for Push {
            type Output = Result<(), ValueKind>;
            fn visit<T: ArrayValue>(self, array: &mut TypedArray<T>) -> Self::Output {
                let kind = self.0.kind();
                let v = T::from_value(self.0).ok_or(kind)?;
                array.push(v);
                Ok(())
            }
        }
        let expected = self.kind();
        self.visit_mut(Push(value))
            .map_err(|found| MeshError::TypeMismatch {
                name: String::new(),
                expected,
                found,
            })
    }

    /// Element `index` as a dynamic value.
    pub fn get_value(&self, index: usize) -> Option<Value> {
        self.visit(GetValue(index))
    }

    /// Copy of the array metadata.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        self.visit(Metadata)
    }

    pub fn metadata_value(&self, key: &str) -> Option<String> {
        self.visit(MetadataValue(key))
    }

    pub fn set_metadata_value(&mut self, key: &str, value: &str) -> Option<String> {
        self.visit_mut(SetMetadata(key, value))
    }

    /// Resize, filling new cells with the kind's default value.
    pub fn resize(&mut self, new_len: usize) {
        self.visit_mut(Resize(new_len))
    }

    /// An empty array of the same kind and metadata.
    pub fn clone_type(&self) -> Array {
        self.visit(CloneType)
    }

    /// Copy of the half-open range `[begin, end)`.
    pub fn clone_range(&self, begin: usize, end: usize) -> Result<Array, MeshError> {
        self.visit(CloneRange(begin, end))
    }

    /// Each element rendered with its `Display` impl, for dumps.
    pub fn render_values(&self) -> Vec<String> {
        self.visit(RenderValues)
    }
}

impl<T: ArrayValue> From<TypedArray<T>> for Array {
    fn from(array: TypedArray<T>) -> Self {
        T::wrap(array)
    }
}
