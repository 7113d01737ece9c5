//! The owning mesh container.
//!
//! A [`Mesh`] is a shared point array plus an ordered list of heterogeneous
//! [`Primitive`]s that reference those points by integer index. The container
//! is deliberately schema-free: what a primitive's tables mean is decided by
//! its kind and checked by [`validation`].
//!
//! # Lifecycle
//!
//! Meshes are built through `&mut` access by a single producer, then handed
//! off as a [`FrozenMesh`] that any number of readers may share across
//! threads. A frozen mesh cannot grow; consumers that need to derive a new
//! mesh call [`FrozenMesh::to_mesh`] and edit the copy.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::table::Table;
use crate::data::typed_array::{ROLE_KEY, SELECTION_ROLE, TypedArray};
use crate::data::value::Point3;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;

pub mod primitive;
pub mod selection;
pub mod validation;

pub use primitive::{AttributeScope, Primitive, Primitives};
pub use selection::{ComponentKind, MeshSelection, SelectionStorage};

/// Mesh: points, per-point data, and primitives.
///
/// # Invariants
///
/// - When both exist, `point_selection` has one weight per point.
/// - `point_attributes` has one row per point (or no columns).
/// - Presence is meaningful: a mesh without a points array differs from a
///   mesh with an empty one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub(crate) points: Option<TypedArray<Point3>>,
    pub(crate) point_selection: Option<TypedArray<f64>>,
    #[serde(default)]
    pub(crate) point_attributes: Table,
    #[serde(default)]
    pub(crate) primitives: Primitives,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the (empty) points array.
    ///
    /// # Errors
    /// `AlreadyExists` if the mesh already has one.
    pub fn create_points(&mut self) -> Result<&mut TypedArray<Point3>, MeshError> {
        if self.points.is_some() {
            return Err(MeshError::AlreadyExists("points"));
        }
        log::trace!("mesh: create points");
        Ok(self.points.insert(TypedArray::new()))
    }

    /// Create the (empty) point-selection array, tagged with the selection role.
    ///
    /// # Errors
    /// `AlreadyExists` if the mesh already has one.
    pub fn create_point_selection(&mut self) -> Result<&mut TypedArray<f64>, MeshError> {
        if self.point_selection.is_some() {
            return Err(MeshError::AlreadyExists("point_selection"));
        }
        log::trace!("mesh: create point_selection");
        Ok(self
            .point_selection
            .insert(TypedArray::new().with_metadata(ROLE_KEY, SELECTION_ROLE)))
    }

    pub fn points(&self) -> Option<&TypedArray<Point3>> {
        self.points.as_ref()
    }

    pub fn points_mut(&mut self) -> Option<&mut TypedArray<Point3>> {
        self.points.as_mut()
    }

    pub fn point_selection(&self) -> Option<&TypedArray<f64>> {
        self.point_selection.as_ref()
    }

    pub fn point_selection_mut(&mut self) -> Option<&mut TypedArray<f64>> {
        self.point_selection.as_mut()
    }

    /// Number of points, 0 when the points array is absent.
    pub fn point_count(&self) -> usize {
        self.points.as_ref().map_or(0, TypedArray::len)
    }

    /// Append `point`, returning its index.
    ///
    /// Same bookkeeping as the polyhedron builders: the points array and
    /// `point_selection` are created if missing, the new point gets selection
    /// weight `0.0`, and `point_attributes` grows by one default row.
    pub fn add_point(&mut self, point: Point3) -> usize {
        self.append_points(&[point])
    }

    /// Append `points`, keeping per-point data in step. Returns the index of
    /// the first new point.
    pub(crate) fn append_points(&mut self, points: &[Point3]) -> usize {
        let target = self.points.get_or_insert_with(TypedArray::new);
        let offset = target.len();
        target.extend_from_slice(points);
        let total = target.len();
        self.point_selection
            .get_or_insert_with(|| TypedArray::new().with_metadata(ROLE_KEY, SELECTION_ROLE))
            .resize(total, 0.0);
        self.point_attributes.set_row_count(total);
        offset
    }

    /// Per-point attribute arrays.
    pub fn point_attributes(&self) -> &Table {
        &self.point_attributes
    }

    pub fn point_attributes_mut(&mut self) -> &mut Table {
        &mut self.point_attributes
    }

    pub fn primitives(&self) -> &Primitives {
        &self.primitives
    }

    pub fn primitives_mut(&mut self) -> &mut Primitives {
        &mut self.primitives
    }

    /// End construction and share the mesh read-only.
    pub fn freeze(self) -> FrozenMesh {
        self.debug_assert_invariants();
        FrozenMesh(Arc::new(self))
    }
}

impl DebugInvariants for Mesh {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        let points = self.point_count();
        if let Some(selection) = &self.point_selection {
            if selection.len() != points {
                return Err(MeshError::Cardinality {
                    table: "mesh".into(),
                    array: "point_selection".into(),
                    expected: points,
                    found: selection.len(),
                });
            }
        }
        if !self.point_attributes.is_empty() {
            self.point_attributes
                .require_row_count("point_attributes", points)?;
        }
        Ok(())
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.points {
            None => writeln!(f, "points: none")?,
            Some(points) => {
                writeln!(f, "points [{}]", points.len())?;
                for (i, p) in points.iter().enumerate() {
                    writeln!(f, "  {i}: {p}")?;
                }
            }
        }
        match &self.point_selection {
            None => writeln!(f, "point_selection: none")?,
            Some(selection) => {
                writeln!(f, "point_selection [{}]", selection.len())?;
                for (i, w) in selection.iter().enumerate() {
                    writeln!(f, "  {i}: {w}")?;
                }
            }
        }
        if !self.point_attributes.is_empty() {
            writeln!(f, "point_attributes:")?;
            write!(f, "{:2}", self.point_attributes)?;
        }
        writeln!(f, "primitives [{}]", self.primitives.len())?;
        for primitive in &self.primitives {
            write!(f, "{primitive:2}")?;
        }
        Ok(())
    }
}

/// Read-only, cheaply clonable mesh shared between threads.
#[derive(Clone, Debug, PartialEq)]
pub struct FrozenMesh(Arc<Mesh>);

impl FrozenMesh {
    /// Owned, editable copy.
    pub fn to_mesh(&self) -> Mesh {
        Mesh::clone(&self.0)
    }

    /// True if both handles share one allocation.
    pub fn ptr_eq(&self, other: &FrozenMesh) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for FrozenMesh {
    type Target = Mesh;

    fn deref(&self) -> &Mesh {
        &self.0
    }
}

impl From<Mesh> for FrozenMesh {
    fn from(mesh: Mesh) -> Self {
        mesh.freeze()
    }
}

impl fmt::Display for FrozenMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}
