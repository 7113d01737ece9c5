use std::collections::BTreeMap;

use itertools::{EitherOrBoth, Itertools};

use crate::data::array::{Array, ArrayPairVisitor, ArrayValue};
use crate::data::named_tables::NamedTables;
use crate::data::table::Table;
use crate::data::typed_array::TypedArray;
use crate::data::value::{
    Color, FloatComponents, Handle, Matrix4, Normal3, Point2, Point3, Point4, Texture3, Vector2,
    Vector3,
};
use crate::mesh::selection::{MeshSelection, SelectionStorage};
use crate::mesh::{AttributeScope, FrozenMesh, Mesh, Primitive, Primitives};

use super::{Accumulator, Difference, ulps_between};

// -----------------------------------------------------------------------------
// Leaves
// -----------------------------------------------------------------------------

macro_rules! exact_difference {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Difference for $ty {
                #[inline]
                fn difference(&self, other: &Self, acc: &mut Accumulator) {
                    acc.exact(self == other);
                }
            }
        )+
    };
}

exact_difference!(bool, i8, i16, i32, i64, u8, u16, u32, u64, String, Handle);

impl Difference for f64 {
    #[inline]
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        acc.ulps(ulps_between(*self, *other));
    }
}

macro_rules! component_difference {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Difference for $ty {
                fn difference(&self, other: &Self, acc: &mut Accumulator) {
                    let distance = self
                        .components()
                        .iter()
                        .zip(other.components())
                        .map(|(a, b)| ulps_between(*a, *b))
                        .fold(0.0, f64::max);
                    acc.ulps(distance);
                }
            }
        )+
    };
}

component_difference!(Point2, Point3, Point4, Vector2, Vector3, Normal3, Texture3, Color, Matrix4);

impl<T: Difference> Difference for Option<T> {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        match (self, other) {
            (Some(a), Some(b)) => a.difference(b, acc),
            (None, None) => {}
            _ => acc.exact(false),
        }
    }
}

impl Difference for BTreeMap<String, String> {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        for pair in self.iter().merge_join_by(other.iter(), |a, b| a.0.cmp(b.0)) {
            match pair {
                EitherOrBoth::Both((key, a), (_, b)) => {
                    acc.scoped_name(key, |acc| acc.exact(a == b));
                }
                EitherOrBoth::Left((key, _)) | EitherOrBoth::Right((key, _)) => acc.missing(key),
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Arrays and tables
// -----------------------------------------------------------------------------

impl<T: Difference> Difference for TypedArray<T> {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        acc.scoped_name("metadata", |acc| {
            self.metadata().difference(other.metadata(), acc)
        });
        if self.len() != other.len() {
            acc.scoped_name("size", |acc| acc.exact(false));
        }
        for (i, (a, b)) in self.iter().zip(other.iter()).enumerate() {
            acc.scoped_index(i, |acc| a.difference(b, acc));
        }
    }
}

struct PairDifference<'a>(&'a mut Accumulator);

impl ArrayPairVisitor for PairDifference<'_> {
    type Output = ();

    fn visit<T: ArrayValue>(self, a: &TypedArray<T>, b: &TypedArray<T>) {
        a.difference(b, self.0);
    }

    fn kind_mismatch(self, a: &Array, b: &Array) {
        log::debug!("difference: array kinds {} and {} differ", a.kind(), b.kind());
        self.0.scoped_name("kind", |acc| acc.exact(false));
    }
}

impl Difference for Array {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        self.visit_pair(other, PairDifference(acc));
    }
}

impl Difference for Table {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        for (name, a) in self.iter() {
            match other.get(name) {
                Some(b) => acc.scoped_name(name, |acc| a.difference(b, acc)),
                None => acc.missing(name),
            }
        }
        for name in other.names().filter(|n| !self.contains(n)) {
            acc.missing(name);
        }
    }
}

impl Difference for NamedTables {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        for (name, a) in self.iter() {
            match other.get(name) {
                Some(b) => acc.scoped_name(name, |acc| a.difference(b, acc)),
                None => acc.missing(name),
            }
        }
        for (name, _) in other.iter().filter(|(n, _)| !self.contains(n)) {
            acc.missing(name);
        }
    }
}

// -----------------------------------------------------------------------------
// Mesh structures
// -----------------------------------------------------------------------------

impl Difference for Primitive {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        acc.scoped_name("kind", |acc| acc.exact(self.kind() == other.kind()));
        acc.scoped_name("structure", |acc| {
            self.structure().difference(other.structure(), acc)
        });
        for scope in AttributeScope::ALL {
            match (self.attributes(scope), other.attributes(scope)) {
                (Some(a), Some(b)) => acc.scoped_name(scope.as_str(), |acc| a.difference(b, acc)),
                (None, None) => {}
                _ => acc.missing(scope.as_str()),
            }
        }
    }
}

impl Difference for Primitives {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        for (i, pair) in self.iter().zip_longest(other.iter()).enumerate() {
            acc.scoped_index(i, |acc| match pair {
                EitherOrBoth::Both(a, b) => a.difference(b, acc),
                EitherOrBoth::Left(_) | EitherOrBoth::Right(_) => acc.exact(false),
            });
        }
    }
}

impl Difference for Mesh {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        acc.scoped_name("points", |acc| self.points.difference(&other.points, acc));
        acc.scoped_name("point_selection", |acc| {
            self.point_selection.difference(&other.point_selection, acc)
        });
        acc.scoped_name("point_attributes", |acc| {
            self.point_attributes.difference(&other.point_attributes, acc)
        });
        acc.scoped_name("primitives", |acc| {
            self.primitives.difference(&other.primitives, acc)
        });
    }
}

impl Difference for FrozenMesh {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        if self.ptr_eq(other) {
            return;
        }
        Mesh::difference(self, other, acc);
    }
}

impl Difference for SelectionStorage {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        acc.scoped_name("component", |acc| {
            acc.exact(self.component() == other.component())
        });
        self.table().difference(&other.table(), acc);
    }
}

impl Difference for MeshSelection {
    fn difference(&self, other: &Self, acc: &mut Accumulator) {
        for (i, pair) in self.storages().iter().zip_longest(other.storages()).enumerate() {
            acc.scoped_index(i, |acc| match pair {
                EitherOrBoth::Both(a, b) => a.difference(b, acc),
                EitherOrBoth::Left(_) | EitherOrBoth::Right(_) => acc.exact(false),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::kind::ValueKind;
    use crate::difference::test;

    #[test]
    fn metadata_participates() {
        let a = TypedArray::<u64>::from(vec![1]).with_metadata("mesh:domain", "/points/indices()");
        let b = TypedArray::<u64>::from(vec![1]);
        let acc = test(&a, &b);
        assert!(!acc.is_equal());
        assert_eq!(acc.mismatches()[0].path, "metadata/mesh:domain");
    }

    #[test]
    fn array_kinds_never_match() {
        let a = Array::empty(ValueKind::U64);
        let b = Array::empty(ValueKind::I64);
        assert!(!test(&a, &b).is_equal());
    }

    #[test]
    fn table_names_visited_from_both_sides() {
        let mut a = Table::new();
        a.create::<f64>("x").unwrap();
        let mut b = Table::new();
        b.create::<f64>("y").unwrap();
        let acc = test(&a, &b);
        let paths: Vec<_> = acc.mismatches().iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, ["x", "y"]);
    }

    #[test]
    fn table_column_order_is_irrelevant() {
        let mut a = Table::new();
        a.create::<f64>("x").unwrap();
        a.create::<u8>("y").unwrap();
        let mut b = Table::new();
        b.create::<u8>("y").unwrap();
        b.create::<f64>("x").unwrap();
        assert!(test(&a, &b).is_equal());
    }

    #[test]
    fn length_mismatch_still_compares_prefix() {
        let a = TypedArray::<f64>::from(vec![1.0, 2.0]);
        let b = TypedArray::<f64>::from(vec![1.0, 2.5, 3.0]);
        let acc = test(&a, &b);
        let paths: Vec<_> = acc.mismatches().iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, ["size", "1"]);
    }

    #[test]
    fn points_presence_matters() {
        let a = Mesh::new();
        let mut b = Mesh::new();
        b.create_points().unwrap();
        let acc = test(&a, &b);
        assert!(!acc.is_equal());
        assert_eq!(acc.ulps_max(), f64::INFINITY);
        assert_eq!(acc.mismatches()[0].path, "points");
    }

    #[test]
    fn extra_primitive_is_a_mismatch() {
        let mut a = Mesh::new();
        a.primitives_mut().create("polyhedron");
        let b = Mesh::new();
        let acc = test(&a, &b);
        assert_eq!(acc.mismatches()[0].path, "primitives/0");
    }
}
