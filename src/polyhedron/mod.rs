//! The polyhedron (polygon mesh) primitive schema.
//!
//! A polyhedron is stored as a split-edge structure across five structure
//! tables:
//!
//! | table    | arrays |
//! |----------|--------|
//! | `shell`  | `shell_types: i32` |
//! | `face`   | `face_shells`, `face_first_loops`, `face_loop_counts: u64`; `face_selections: f64`; `face_materials: handle` |
//! | `loop`   | `loop_first_edges: u64` |
//! | `edge`   | `clockwise_edges: u64`; `edge_selections: f64` |
//! | `vertex` | `vertex_points: u64`; `vertex_selections: f64` |
//!
//! Each face owns a contiguous run of loops (the first is the outer boundary,
//! the rest are holes). Each loop is a cycle of edges linked through
//! `clockwise_edges`; edge `e` starts at point `vertex_points[e]`, so the
//! `edge` and `vertex` tables always have the same row count.
//!
//! [`validate`] checks all of this and returns a borrowed [`Polyhedron`]
//! view; [`builders`] appends well-formed geometry; [`analysis`] derives
//! adjacency lookups from a validated view.

use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::data::array::{Array, ArrayValue};
use crate::data::named_tables::NamedTables;
use crate::data::table::{Column, Table};
use crate::data::typed_array::{
    DOMAIN_KEY, POINT_INDICES_DOMAIN, ROLE_KEY, SELECTION_ROLE, TypedArray,
};
use crate::data::value::{Handle, Point3};
use crate::mesh::validation::ValidationOptions;
use crate::mesh::{AttributeScope, Mesh, Primitive};
use crate::mesh_error::MeshError;

pub mod analysis;
pub mod builders;

pub use builders::{
    add_cylinder, add_face, add_grid, add_quadrilateral, add_shell, add_torus, add_triangle,
    create_from_polygons,
};

/// Primitive kind name.
pub const KIND: &str = "polyhedron";

pub const SHELL: &str = "shell";
pub const FACE: &str = "face";
pub const LOOP: &str = "loop";
pub const EDGE: &str = "edge";
pub const VERTEX: &str = "vertex";

pub const SHELL_TYPES: &str = "shell_types";
pub const FACE_SHELLS: &str = "face_shells";
pub const FACE_FIRST_LOOPS: &str = "face_first_loops";
pub const FACE_LOOP_COUNTS: &str = "face_loop_counts";
pub const FACE_SELECTIONS: &str = "face_selections";
pub const FACE_MATERIALS: &str = "face_materials";
pub const LOOP_FIRST_EDGES: &str = "loop_first_edges";
pub const CLOCKWISE_EDGES: &str = "clockwise_edges";
pub const EDGE_SELECTIONS: &str = "edge_selections";
pub const VERTEX_POINTS: &str = "vertex_points";
pub const VERTEX_SELECTIONS: &str = "vertex_selections";

/// How the faces of a shell are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ShellType {
    /// Plain polygons.
    Polygons = 0,
    /// A Catmull-Clark subdivision cage.
    CatmullClark = 1,
}

impl ShellType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ShellType::Polygons),
            1 => Some(ShellType::CatmullClark),
            _ => None,
        }
    }
}

/// A new, empty polyhedron primitive with every table, array, and attribute
/// scope of the schema in place.
pub fn new_primitive() -> Primitive {
    let mut primitive = Primitive::new(KIND);
    *primitive.structure_mut() = schema();
    for scope in [
        AttributeScope::Constant,
        AttributeScope::Face,
        AttributeScope::Edge,
        AttributeScope::Vertex,
    ] {
        primitive.attributes_mut(scope);
    }
    primitive
}

fn column<T: ArrayValue>(name: &str, array: TypedArray<T>) -> Column {
    (name.to_string(), Array::from_typed(array))
}

fn schema() -> NamedTables {
    let selection = || TypedArray::<f64>::new().with_metadata(ROLE_KEY, SELECTION_ROLE);
    let tables = [
        (SHELL, vec![column(SHELL_TYPES, TypedArray::<i32>::new())]),
        (
            FACE,
            vec![
                column(FACE_SHELLS, TypedArray::<u64>::new()),
                column(FACE_FIRST_LOOPS, TypedArray::<u64>::new()),
                column(FACE_LOOP_COUNTS, TypedArray::<u64>::new()),
                column(FACE_SELECTIONS, selection()),
                column(FACE_MATERIALS, TypedArray::<Handle>::new()),
            ],
        ),
        (LOOP, vec![column(LOOP_FIRST_EDGES, TypedArray::<u64>::new())]),
        (
            EDGE,
            vec![
                column(CLOCKWISE_EDGES, TypedArray::<u64>::new()),
                column(EDGE_SELECTIONS, selection()),
            ],
        ),
        (
            VERTEX,
            vec![
                column(
                    VERTEX_POINTS,
                    TypedArray::<u64>::new().with_metadata(DOMAIN_KEY, POINT_INDICES_DOMAIN),
                ),
                column(VERTEX_SELECTIONS, selection()),
            ],
        ),
    ];
    NamedTables::from_tables_unchecked(
        tables
            .into_iter()
            .map(|(name, columns)| (name.to_string(), Table::from_columns_unchecked(columns)))
            .collect(),
    )
}

/// Append an empty polyhedron to `mesh`, returning its primitive index.
pub fn create(mesh: &mut Mesh) -> usize {
    log::trace!("polyhedron: create");
    mesh.primitives_mut().push(new_primitive())
}

/// Borrowed, validated view of a polyhedron primitive.
///
/// Every structural index (shells, loops, edges) is in range, every face
/// owns at least one loop, and every loop closes, so analysis helpers index
/// those slices directly. `vertex_points` is bounds-checked against `points`
/// only when point indices were checked, so helpers that read point
/// positions return `None` on a dangling index.
#[derive(Clone, Copy, Debug)]
pub struct Polyhedron<'a> {
    pub shell_types: &'a [i32],
    pub face_shells: &'a [u64],
    pub face_first_loops: &'a [u64],
    pub face_loop_counts: &'a [u64],
    pub face_selections: &'a [f64],
    pub face_materials: &'a [Handle],
    pub loop_first_edges: &'a [u64],
    pub clockwise_edges: &'a [u64],
    pub edge_selections: &'a [f64],
    pub vertex_points: &'a [u64],
    pub vertex_selections: &'a [f64],
    pub constant_attributes: Option<&'a Table>,
    pub face_attributes: Option<&'a Table>,
    pub edge_attributes: Option<&'a Table>,
    pub vertex_attributes: Option<&'a Table>,
    /// The owning mesh's points.
    pub points: &'a [Point3],
}

/// Validate `primitive` as a polyhedron of `mesh` with all checks enabled.
///
/// # Errors
/// - `InvalidArgument` if the primitive is not a polyhedron.
/// - `NotFound` / `TypeMismatch` for missing or mistyped tables and arrays.
/// - `MetadataMismatch` if selection or point-index metadata is missing.
/// - `Cardinality` if table sizes disagree.
/// - `IndexOutOfRange` for any dangling index.
/// - `Topology` if a loop's clockwise chain does not return to its first edge.
pub fn validate<'a>(mesh: &'a Mesh, primitive: &'a Primitive) -> Result<Polyhedron<'a>, MeshError> {
    validate_with(mesh, primitive, &ValidationOptions::all())
}

/// Registry entry point used by [`crate::mesh::validation`].
pub fn validate_primitive(
    mesh: &Mesh,
    primitive: &Primitive,
    options: &ValidationOptions,
) -> Result<(), MeshError> {
    validate_with(mesh, primitive, options).map(|_| ())
}

/// [`validate`] with explicit toggles.
pub fn validate_with<'a>(
    mesh: &'a Mesh,
    primitive: &'a Primitive,
    options: &ValidationOptions,
) -> Result<Polyhedron<'a>, MeshError> {
    if primitive.kind() != KIND {
        return Err(MeshError::InvalidArgument(format!(
            "expected a `{KIND}` primitive, found `{}`",
            primitive.kind()
        )));
    }
    let structure = primitive.structure();
    let shell = structure.lookup(SHELL)?;
    let face = structure.lookup(FACE)?;
    let loops = structure.lookup(LOOP)?;
    let edge = structure.lookup(EDGE)?;
    let vertex = structure.lookup(VERTEX)?;
    for (name, table) in [(SHELL, shell), (FACE, face), (LOOP, loops), (EDGE, edge), (VERTEX, vertex)] {
        table.validate_cardinality(name)?;
    }

    let face_selections = face.array::<f64>(FACE_SELECTIONS)?;
    let edge_selections = edge.array::<f64>(EDGE_SELECTIONS)?;
    let vertex_points = vertex.array::<u64>(VERTEX_POINTS)?;
    let vertex_selections = vertex.array::<f64>(VERTEX_SELECTIONS)?;
    face_selections.require_metadata(FACE_SELECTIONS, ROLE_KEY, SELECTION_ROLE)?;
    edge_selections.require_metadata(EDGE_SELECTIONS, ROLE_KEY, SELECTION_ROLE)?;
    vertex_points.require_metadata(VERTEX_POINTS, DOMAIN_KEY, POINT_INDICES_DOMAIN)?;
    vertex_selections.require_metadata(VERTEX_SELECTIONS, ROLE_KEY, SELECTION_ROLE)?;

    let view = Polyhedron {
        shell_types: shell.array::<i32>(SHELL_TYPES)?.as_slice(),
        face_shells: face.array::<u64>(FACE_SHELLS)?.as_slice(),
        face_first_loops: face.array::<u64>(FACE_FIRST_LOOPS)?.as_slice(),
        face_loop_counts: face.array::<u64>(FACE_LOOP_COUNTS)?.as_slice(),
        face_selections: face_selections.as_slice(),
        face_materials: face.array::<Handle>(FACE_MATERIALS)?.as_slice(),
        loop_first_edges: loops.array::<u64>(LOOP_FIRST_EDGES)?.as_slice(),
        clockwise_edges: edge.array::<u64>(CLOCKWISE_EDGES)?.as_slice(),
        edge_selections: edge_selections.as_slice(),
        vertex_points: vertex_points.as_slice(),
        vertex_selections: vertex_selections.as_slice(),
        constant_attributes: primitive.attributes(AttributeScope::Constant),
        face_attributes: primitive.attributes(AttributeScope::Face),
        edge_attributes: primitive.attributes(AttributeScope::Edge),
        vertex_attributes: primitive.attributes(AttributeScope::Vertex),
        points: mesh.points().map_or(&[][..], TypedArray::as_slice),
    };

    let loop_count = view.loop_first_edges.len();
    let expected_loops = total_loops(view.face_loop_counts, loop_count)?;
    loops.require_row_count(LOOP, expected_loops.as_())?;
    vertex.require_row_count(VERTEX, edge.row_count())?;

    check_bounds(FACE_SHELLS, view.face_shells, view.shell_types.len())?;
    let loop_limit: u64 = loop_count.as_();
    for (f, (&first, &count)) in view
        .face_first_loops
        .iter()
        .zip(view.face_loop_counts)
        .enumerate()
    {
        // Every face needs at least its outer boundary.
        if count == 0 {
            return Err(MeshError::IndexOutOfRange {
                array: FACE_LOOP_COUNTS.into(),
                index: f,
                value: count,
                bound: loop_count,
            });
        }
        if first >= loop_limit || count > loop_limit - first {
            return Err(MeshError::IndexOutOfRange {
                array: FACE_FIRST_LOOPS.into(),
                index: f,
                value: first,
                bound: loop_count,
            });
        }
    }
    let edge_count = view.clockwise_edges.len();
    check_bounds(LOOP_FIRST_EDGES, view.loop_first_edges, edge_count)?;
    check_bounds(CLOCKWISE_EDGES, view.clockwise_edges, edge_count)?;
    check_loops_close(&view)?;
    if options.check_point_indices {
        check_bounds(VERTEX_POINTS, view.vertex_points, view.points.len())?;
    }

    if options.check_attribute_cardinality {
        let anchors = [
            (AttributeScope::Constant, view.constant_attributes, 1),
            (AttributeScope::Face, view.face_attributes, view.face_count()),
            (AttributeScope::Edge, view.edge_attributes, edge_count),
            (AttributeScope::Vertex, view.vertex_attributes, edge_count),
        ];
        for (scope, table, rows) in anchors {
            if let Some(table) = table.filter(|t| !t.is_empty()) {
                table.require_row_count(scope.as_str(), rows)?;
            }
        }
    }

    Ok(view)
}

// Sum of per-face loop counts; an overflowing sum cannot match any loop table.
fn total_loops(counts: &[u64], loop_count: usize) -> Result<u64, MeshError> {
    let mut total = 0u64;
    for (f, &count) in counts.iter().enumerate() {
        total = total
            .checked_add(count)
            .ok_or_else(|| MeshError::IndexOutOfRange {
                array: FACE_LOOP_COUNTS.into(),
                index: f,
                value: count,
                bound: loop_count,
            })?;
    }
    Ok(total)
}

fn check_bounds(array: &str, values: &[u64], bound: usize) -> Result<(), MeshError> {
    let limit: u64 = bound.as_();
    match values.iter().enumerate().find(|(_, v)| **v >= limit) {
        Some((index, &value)) => Err(MeshError::IndexOutOfRange {
            array: array.to_string(),
            index,
            value,
            bound,
        }),
        None => Ok(()),
    }
}

// Requires every clockwise edge to be in range. Slow/fast pointers either see
// the slow walker return to the loop's first edge, or meet inside a cycle that
// excludes it.
fn check_loops_close(view: &Polyhedron<'_>) -> Result<(), MeshError> {
    let next = |e: u64| -> u64 { view.clockwise_edges[AsPrimitive::<usize>::as_(e)] };
    for (loop_index, &first) in view.loop_first_edges.iter().enumerate() {
        let mut slow = first;
        let mut fast = first;
        loop {
            slow = next(slow);
            fast = next(next(fast));
            if slow == first {
                break;
            }
            if slow == fast {
                return Err(MeshError::Topology {
                    primitive: KIND.into(),
                    loop_index,
                    reason: format!(
                        "clockwise chain from edge {first} cycles without returning to it"
                    ),
                });
            }
        }
    }
    Ok(())
}

impl<'a> Polyhedron<'a> {
    pub fn shell_count(&self) -> usize {
        self.shell_types.len()
    }

    pub fn face_count(&self) -> usize {
        self.face_first_loops.len()
    }

    pub fn loop_count(&self) -> usize {
        self.loop_first_edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.clockwise_edges.len()
    }

    /// Edges of `loop_index` in clockwise order, starting at its first edge.
    pub fn loop_edges(&self, loop_index: usize) -> LoopEdges<'a> {
        let first = self.loop_first_edges[loop_index];
        LoopEdges {
            clockwise_edges: self.clockwise_edges,
            first,
            next: Some(first),
        }
    }

    /// Loop indices owned by `face`, outer boundary first.
    pub fn face_loops(&self, face: usize) -> std::ops::Range<usize> {
        let first: usize = self.face_first_loops[face].as_();
        let count: usize = self.face_loop_counts[face].as_();
        first..first + count
    }
}

/// Iterator over one loop's edge chain.
#[derive(Clone, Debug)]
pub struct LoopEdges<'a> {
    clockwise_edges: &'a [u64],
    first: u64,
    next: Option<u64>,
}

impl Iterator for LoopEdges<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let edge = self.next?;
        let following = self.clockwise_edges[AsPrimitive::<usize>::as_(edge)];
        self.next = (following != self.first).then_some(following);
        Some(edge.as_())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::value::Point3;

    fn triangle_mesh() -> Mesh {
        let mut m = Mesh::new();
        create_from_polygons(
            &mut m,
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[3],
            &[0, 1, 2],
            Handle::NULL,
        )
        .unwrap();
        m
    }

    fn structure_mut(m: &mut Mesh) -> &mut NamedTables {
        m.primitives_mut().get_mut(0).unwrap().structure_mut()
    }

    #[test]
    fn new_primitive_has_full_schema() {
        let p = new_primitive();
        assert_eq!(p.kind(), KIND);
        let names: Vec<_> = p.structure().iter().map(|(n, _)| n).collect();
        assert_eq!(names, [SHELL, FACE, LOOP, EDGE, VERTEX]);
        let face = p.structure().lookup(FACE).unwrap();
        let columns: Vec<_> = face.iter().map(|(n, _)| n).collect();
        assert_eq!(
            columns,
            [FACE_SHELLS, FACE_FIRST_LOOPS, FACE_LOOP_COUNTS, FACE_SELECTIONS, FACE_MATERIALS]
        );
        assert_eq!(
            face.lookup(FACE_SELECTIONS).unwrap().metadata_value(ROLE_KEY).as_deref(),
            Some(SELECTION_ROLE)
        );
        let vertex = p.structure().lookup(VERTEX).unwrap();
        assert_eq!(
            vertex.array::<u64>(VERTEX_POINTS).unwrap().metadata_value(DOMAIN_KEY),
            Some(POINT_INDICES_DOMAIN)
        );
        assert!(p.attributes(AttributeScope::Constant).is_some());
        assert!(p.attributes(AttributeScope::Uniform).is_none());
    }

    #[test]
    fn empty_polyhedron_validates() {
        let mut m = Mesh::new();
        create(&mut m);
        let view = validate(&m, m.primitives().get(0).unwrap()).unwrap();
        assert_eq!(view.face_count(), 0);
    }

    #[test]
    fn wrong_kind_rejected() {
        let m = Mesh::new();
        let p = Primitive::new("particle");
        assert!(matches!(validate(&m, &p), Err(MeshError::InvalidArgument(_))));
    }

    #[test]
    fn missing_metadata_detected() {
        let mut m = triangle_mesh();
        structure_mut(&mut m)
            .lookup_mut(EDGE)
            .unwrap()
            .array_mut::<f64>(EDGE_SELECTIONS)
            .unwrap()
            .erase_metadata_value(ROLE_KEY);
        let err = validate(&m, m.primitives().get(0).unwrap()).unwrap_err();
        assert!(matches!(err, MeshError::MetadataMismatch { found: None, .. }));
    }

    #[test]
    fn dangling_clockwise_edge_detected() {
        let mut m = triangle_mesh();
        structure_mut(&mut m)
            .lookup_mut(EDGE)
            .unwrap()
            .array_mut::<u64>(CLOCKWISE_EDGES)
            .unwrap()
            .as_mut_slice()[2] = 9;
        let err = validate(&m, m.primitives().get(0).unwrap()).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                array: CLOCKWISE_EDGES.into(),
                index: 2,
                value: 9,
                bound: 3,
            }
        );
    }

    #[test]
    fn loop_that_never_returns_is_a_topology_error() {
        let mut m = triangle_mesh();
        // 0 -> 1 -> 2 -> 1: edge 0 is a tail into the 1-2 cycle.
        structure_mut(&mut m)
            .lookup_mut(EDGE)
            .unwrap()
            .array_mut::<u64>(CLOCKWISE_EDGES)
            .unwrap()
            .assign([1, 2, 1]);
        let err = validate(&m, m.primitives().get(0).unwrap()).unwrap_err();
        assert!(matches!(err, MeshError::Topology { loop_index: 0, .. }));
    }

    #[test]
    fn loop_count_must_match_face_loop_counts() {
        let mut m = triangle_mesh();
        structure_mut(&mut m)
            .lookup_mut(FACE)
            .unwrap()
            .array_mut::<u64>(FACE_LOOP_COUNTS)
            .unwrap()
            .as_mut_slice()[0] = 2;
        let err = validate(&m, m.primitives().get(0).unwrap()).unwrap_err();
        assert!(matches!(err, MeshError::Cardinality { ref table, .. } if table == LOOP));
    }

    #[test]
    fn attribute_tables_sized_by_anchor() {
        let mut m = triangle_mesh();
        let p = m.primitives_mut().get_mut(0).unwrap();
        p.attributes_mut(AttributeScope::Face)
            .create::<f64>("area")
            .unwrap()
            .assign([0.5, 0.5]);
        let err = validate(&m, m.primitives().get(0).unwrap()).unwrap_err();
        assert_eq!(
            err,
            MeshError::Cardinality {
                table: "face".into(),
                array: "area".into(),
                expected: 1,
                found: 2,
            }
        );
        let relaxed = ValidationOptions {
            check_attribute_cardinality: false,
            ..ValidationOptions::all()
        };
        assert!(validate_with(&m, m.primitives().get(0).unwrap(), &relaxed).is_ok());
    }

    #[test]
    fn loop_edges_walks_the_chain() {
        let m = triangle_mesh();
        let view = validate(&m, m.primitives().get(0).unwrap()).unwrap();
        assert_eq!(view.loop_edges(0).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(view.face_loops(0), 0..1);
    }
}
