//! Geometric value types stored in typed arrays.
//!
//! All composite kinds are `repr(transparent)` wrappers around `f64` arrays so
//! their components can be viewed as a flat `&[f64]` (see
//! [`FloatComponents`]) by the difference engine and by writers.

use std::fmt;
use std::ops::{Index, IndexMut};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Flat view of the floating-point components of a composite value.
pub trait FloatComponents {
    /// Components in storage order.
    fn components(&self) -> &[f64];
}

macro_rules! float_tuple {
    ($(#[$meta:meta])* $name:ident, $n:literal, [$($field:ident),+]) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub [f64; $n]);

        impl $name {
            #[inline]
            pub const fn new($($field: f64),+) -> Self {
                Self([$($field),+])
            }
        }

        impl FloatComponents for $name {
            #[inline]
            fn components(&self) -> &[f64] {
                &self.0
            }
        }

        impl From<[f64; $n]> for $name {
            fn from(v: [f64; $n]) -> Self {
                Self(v)
            }
        }

        impl Index<usize> for $name {
            type Output = f64;
            #[inline]
            fn index(&self, i: usize) -> &f64 {
                &self.0[i]
            }
        }

        impl IndexMut<usize> for $name {
            #[inline]
            fn index_mut(&mut self, i: usize) -> &mut f64 {
                &mut self.0[i]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_components(f, &self.0)
            }
        }
    };
}

fn write_components(f: &mut fmt::Formatter<'_>, components: &[f64]) -> fmt::Result {
    for (i, c) in components.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

float_tuple!(
    /// A location in parameter or texture space.
    Point2, 2, [x, y]
);
float_tuple!(
    /// A location in 3D space; the element type of mesh point arrays.
    Point3, 3, [x, y, z]
);
float_tuple!(
    /// A homogeneous (rational) control point, e.g. for NURBS.
    Point4, 4, [x, y, z, w]
);
float_tuple!(Vector2, 2, [x, y]);
float_tuple!(Vector3, 3, [x, y, z]);
float_tuple!(
    /// A surface normal; not required to be unit length.
    Normal3, 3, [x, y, z]
);
float_tuple!(Texture3, 3, [s, t, u]);
float_tuple!(
    /// Linear RGB color.
    Color, 3, [red, green, blue]
);

impl Point3 {
    /// Component-wise offset by `v`.
    #[inline]
    pub fn translated(self, v: Vector3) -> Point3 {
        Point3::new(self[0] + v[0], self[1] + v[1], self[2] + v[2])
    }

    /// Vector from the origin to this point.
    #[inline]
    pub fn to_vector(self) -> Vector3 {
        Vector3(self.0)
    }
}

impl Normal3 {
    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.0.iter().map(|c| c * c).sum::<f64>().sqrt()
    }
}

/// Row-major 4x4 transformation matrix.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Matrix4(pub [[f64; 4]; 4]);

impl Matrix4 {
    pub const IDENTITY: Matrix4 = Matrix4([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
}

impl Default for Matrix4 {
    fn default() -> Self {
        Matrix4::IDENTITY
    }
}

impl FloatComponents for Matrix4 {
    #[inline]
    fn components(&self) -> &[f64] {
        bytemuck::cast_slice(&self.0)
    }
}

impl fmt::Display for Matrix4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_components(f, self.components())
    }
}

/// Opaque reference to an object owned outside the mesh (a material, a node).
///
/// The mesh never dereferences handles; it only stores and compares them.
/// `Handle::NULL` is the "no object" reference.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Serialize,
    Deserialize,
)]
#[repr(transparent)]
pub struct Handle(pub u64);

impl Handle {
    pub const NULL: Handle = Handle(0);

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}
