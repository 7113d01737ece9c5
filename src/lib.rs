#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-tables
//!
//! mesh-tables is a generic mesh data model: an open-ended, typed, columnar
//! container able to represent arbitrary geometric primitive kinds without a
//! closed class hierarchy, together with a tolerance-aware structural
//! difference engine used to verify that mesh-producing operations behave
//! identically across platforms and algorithm changes.
//!
//! ## Features
//! - Typed arrays with string metadata, grouped into equal-length tables
//! - Primitives described by a kind name plus structure and attribute tables
//! - The polyhedron (polygon mesh) schema with builders, validation, and
//!   derived lookups
//! - Range-compressed selections merged into per-component weight arrays
//! - Recursive ULP-tolerant difference over meshes and every part of them
//! - Optional `rayon` worker pool for batch validation and comparison
//!
//! ## Usage
//!
//! ```
//! use mesh_tables::prelude::*;
//!
//! let mut mesh = Mesh::new();
//! polyhedron::create_from_polygons(
//!     &mut mesh,
//!     &[
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     &[3],
//!     &[0, 1, 2],
//!     Handle::NULL,
//! )
//! .unwrap();
//! validation::is_valid(&mesh).unwrap();
//!
//! let copy = mesh.clone();
//! assert!(difference::test(&mesh, &copy).is_equal());
//! ```
//!
//! ## Sharing
//! Meshes are built by a single producer through `&mut` access. Call
//! [`Mesh::freeze`](mesh::Mesh::freeze) to obtain a [`FrozenMesh`](mesh::FrozenMesh),
//! a cheap `Arc` handle that readers on other threads can clone freely.

pub mod context;
pub mod data;
pub mod debug_invariants;
pub mod difference;
pub mod mesh;
pub mod mesh_error;
pub mod polyhedron;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::context::{ChangeSet, OperationContext};
    pub use crate::data::{
        Array, ArrayValue, Color, Handle, Matrix4, NamedTables, Normal3, Point2, Point3, Point4,
        Table, Texture3, TypedArray, Value, ValueKind, Vector2, Vector3,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::difference::{self, Accumulator, Difference};
    pub use crate::mesh::validation::{self, ValidationOptions};
    pub use crate::mesh::{
        AttributeScope, ComponentKind, FrozenMesh, Mesh, MeshSelection, Primitive, Primitives,
    };
    pub use crate::mesh_error::MeshError;
    pub use crate::polyhedron::{self, Polyhedron, ShellType};
}
