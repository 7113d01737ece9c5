//! Builders that append well-formed faces to a polyhedron.
//!
//! Every builder checks its arguments before touching the mesh, so a rejected
//! call leaves the mesh unchanged. Builders that add points also extend the
//! point selection (with zero weights) and the point attribute table so the
//! mesh stays consistent.

use num_traits::AsPrimitive;

use crate::data::named_tables::NamedTables;
use crate::data::value::{Handle, Point3};
use crate::mesh::{Mesh, Primitive};
use crate::mesh_error::MeshError;

use super::{
    CLOCKWISE_EDGES, EDGE, EDGE_SELECTIONS, FACE, FACE_FIRST_LOOPS, FACE_LOOP_COUNTS,
    FACE_MATERIALS, FACE_SELECTIONS, FACE_SHELLS, KIND, LOOP, LOOP_FIRST_EDGES, SHELL,
    SHELL_TYPES, ShellType, VERTEX, VERTEX_POINTS, VERTEX_SELECTIONS,
};

/// Append a shell of `shell_type`, returning its index.
pub fn add_shell(mesh: &mut Mesh, primitive: usize, shell_type: ShellType) -> Result<u64, MeshError> {
    let shells = polyhedron_mut(mesh, primitive)?
        .structure_mut()
        .lookup_mut(SHELL)?
        .array_mut::<i32>(SHELL_TYPES)?;
    shells.push(shell_type as i32);
    Ok((shells.len() - 1).as_())
}

/// Append `vertices` as new points and a new single-shell polyhedron whose
/// faces are described by `counts` (vertices per face) and `indices` (into
/// `vertices`). Returns the primitive index.
///
/// # Errors
/// `InvalidArgument` if a face has fewer than three vertices, the index count
/// differs from the sum of `counts`, or an index is out of range.
pub fn create_from_polygons(
    mesh: &mut Mesh,
    vertices: &[Point3],
    counts: &[u64],
    indices: &[u64],
    material: Handle,
) -> Result<usize, MeshError> {
    if counts.iter().any(|&c| c < 3) {
        return Err(MeshError::InvalidArgument(
            "each face must have three or more vertices".into(),
        ));
    }
    let received: u64 = indices.len().as_();
    let expected = counts
        .iter()
        .try_fold(0u64, |total, &count| total.checked_add(count))
        .ok_or_else(|| MeshError::InvalidArgument("total vertex count overflows".into()))?;
    if received != expected {
        return Err(MeshError::InvalidArgument(format!(
            "expected {expected} vertex indices, received {received}"
        )));
    }
    let vertex_count: u64 = vertices.len().as_();
    if indices.iter().any(|&i| i >= vertex_count) {
        return Err(MeshError::InvalidArgument("vertex indices out of bounds".into()));
    }

    log::trace!("polyhedron: {} faces from polygons", counts.len());
    let offset = append_points(mesh, vertices);
    let index = super::create(mesh);
    add_shell(mesh, index, ShellType::Polygons)?;

    let mut writer = Writer::new(polyhedron_mut(mesh, index)?.structure_mut());
    let mut remaining = indices;
    for &count in counts {
        let (face, rest) = remaining.split_at(count.as_());
        remaining = rest;
        writer.push_face(0, 1, material)?;
        writer.push_loop(face.iter().map(|&i| offset + i))?;
    }
    Ok(index)
}

/// Append a triangle over existing points `vertices`.
pub fn add_triangle(
    mesh: &mut Mesh,
    primitive: usize,
    shell: u64,
    vertices: [u64; 3],
    material: Handle,
) -> Result<(), MeshError> {
    add_polygon(mesh, primitive, shell, &vertices, material)
}

/// Append a quadrilateral over existing points `vertices`.
pub fn add_quadrilateral(
    mesh: &mut Mesh,
    primitive: usize,
    shell: u64,
    vertices: [u64; 4],
    material: Handle,
) -> Result<(), MeshError> {
    add_polygon(mesh, primitive, shell, &vertices, material)
}

/// Append a single-loop face over existing points `vertices`.
pub fn add_polygon(
    mesh: &mut Mesh,
    primitive: usize,
    shell: u64,
    vertices: &[u64],
    material: Handle,
) -> Result<(), MeshError> {
    if vertices.len() < 3 {
        return Err(MeshError::InvalidArgument(format!(
            "a polygon needs three or more vertices, got {}",
            vertices.len()
        )));
    }
    let mut writer = Writer::new(polyhedron_mut(mesh, primitive)?.structure_mut());
    writer.require_shell(shell)?;
    writer.push_face(shell, 1, material)?;
    writer.push_loop(vertices.iter().copied())
}

/// Append a face with new points: an outer boundary plus optional holes.
///
/// # Errors
/// `InvalidArgument` if the boundary or any hole has fewer than two points,
/// or `shell` does not exist.
pub fn add_face(
    mesh: &mut Mesh,
    primitive: usize,
    shell: u64,
    vertices: &[Point3],
    holes: &[Vec<Point3>],
    material: Handle,
) -> Result<(), MeshError> {
    if vertices.len() < 2 || holes.iter().any(|h| h.len() < 2) {
        return Err(MeshError::InvalidArgument(
            "face boundaries and holes need two or more points".into(),
        ));
    }
    Writer::new(polyhedron_mut(mesh, primitive)?.structure_mut()).require_shell(shell)?;

    let mut offset = append_points(mesh, vertices);
    let mut loops = vec![(offset, vertices.len())];
    for hole in holes {
        offset = append_points(mesh, hole);
        loops.push((offset, hole.len()));
    }

    let mut writer = Writer::new(polyhedron_mut(mesh, primitive)?.structure_mut());
    writer.push_face(shell, loops.len().as_(), material)?;
    for (first, len) in loops {
        let len: u64 = len.as_();
        writer.push_loop(first..first + len)?;
    }
    Ok(())
}

/// Append a `rows` x `columns` grid of quadrilaterals.
///
/// `(rows + 1) * (columns + 1)` new points are added at the origin; callers
/// position them.
pub fn add_grid(
    mesh: &mut Mesh,
    primitive: usize,
    shell: u64,
    rows: u64,
    columns: u64,
    material: Handle,
) -> Result<(), MeshError> {
    if rows == 0 || columns == 0 {
        return Err(MeshError::InvalidArgument(
            "cannot create a grid with zero rows or columns".into(),
        ));
    }
    let lattice = Lattice {
        rows,
        columns,
        point_rows: rows.saturating_add(1),
        point_columns: columns.saturating_add(1),
    };
    add_lattice(mesh, primitive, shell, lattice, material)
}

/// Append a grid of quadrilaterals whose columns wrap around.
pub fn add_cylinder(
    mesh: &mut Mesh,
    primitive: usize,
    shell: u64,
    rows: u64,
    columns: u64,
    material: Handle,
) -> Result<(), MeshError> {
    if rows == 0 || columns < 2 {
        return Err(MeshError::InvalidArgument(
            "a cylinder needs at least one row and two columns".into(),
        ));
    }
    let lattice = Lattice {
        rows,
        columns,
        point_rows: rows.saturating_add(1),
        point_columns: columns,
    };
    add_lattice(mesh, primitive, shell, lattice, material)
}

/// Append a grid of quadrilaterals whose rows and columns both wrap around.
pub fn add_torus(
    mesh: &mut Mesh,
    primitive: usize,
    shell: u64,
    rows: u64,
    columns: u64,
    material: Handle,
) -> Result<(), MeshError> {
    if rows < 2 || columns < 2 {
        return Err(MeshError::InvalidArgument(
            "a torus needs at least two rows and two columns".into(),
        ));
    }
    let lattice = Lattice {
        rows,
        columns,
        point_rows: rows,
        point_columns: columns,
    };
    add_lattice(mesh, primitive, shell, lattice, material)
}

#[derive(Clone, Copy)]
struct Lattice {
    rows: u64,
    columns: u64,
    point_rows: u64,
    point_columns: u64,
}

fn add_lattice(
    mesh: &mut Mesh,
    primitive: usize,
    shell: u64,
    lattice: Lattice,
    material: Handle,
) -> Result<(), MeshError> {
    Writer::new(polyhedron_mut(mesh, primitive)?.structure_mut()).require_shell(shell)?;

    let Lattice {
        rows,
        columns,
        point_rows,
        point_columns,
    } = lattice;
    let point_count = point_rows
        .checked_mul(point_columns)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            MeshError::InvalidArgument(format!(
                "{point_rows} x {point_columns} lattice points overflow"
            ))
        })?;
    let new_points = vec![Point3::default(); point_count];
    let offset = append_points(mesh, &new_points);
    let point = |row: u64, column: u64| {
        offset + (row % point_rows) * point_columns + column % point_columns
    };

    let mut writer = Writer::new(polyhedron_mut(mesh, primitive)?.structure_mut());
    for row in 0..rows {
        for column in 0..columns {
            writer.push_face(shell, 1, material)?;
            writer.push_loop([
                point(row, column),
                point(row, column + 1),
                point(row + 1, column + 1),
                point(row + 1, column),
            ])?;
        }
    }
    Ok(())
}

fn polyhedron_mut(mesh: &mut Mesh, index: usize) -> Result<&mut Primitive, MeshError> {
    let primitive = mesh
        .primitives_mut()
        .get_mut(index)
        .ok_or_else(|| MeshError::NotFound(format!("primitive {index}")))?;
    if primitive.kind() != KIND {
        return Err(MeshError::InvalidArgument(format!(
            "primitive {index} is a `{}`, not a `{KIND}`",
            primitive.kind()
        )));
    }
    Ok(primitive)
}

fn append_points(mesh: &mut Mesh, vertices: &[Point3]) -> u64 {
    mesh.append_points(vertices).as_()
}

/// Appends rows to the face, loop, edge, and vertex tables.
struct Writer<'a> {
    structure: &'a mut NamedTables,
}

impl<'a> Writer<'a> {
    fn new(structure: &'a mut NamedTables) -> Self {
        Self { structure }
    }

    fn require_shell(&self, shell: u64) -> Result<(), MeshError> {
        let count = self.structure.lookup(SHELL)?.array::<i32>(SHELL_TYPES)?.len();
        if shell >= count.as_() {
            return Err(MeshError::InvalidArgument(format!(
                "shell {shell} does not exist ({count} shells)"
            )));
        }
        Ok(())
    }

    fn push_face(&mut self, shell: u64, loop_count: u64, material: Handle) -> Result<(), MeshError> {
        let first_loop = self.structure.lookup(LOOP)?.row_count();
        let face = self.structure.lookup_mut(FACE)?;
        face.array_mut::<u64>(FACE_SHELLS)?.push(shell);
        face.array_mut::<u64>(FACE_FIRST_LOOPS)?.push(first_loop.as_());
        face.array_mut::<u64>(FACE_LOOP_COUNTS)?.push(loop_count);
        face.array_mut::<f64>(FACE_SELECTIONS)?.push(0.0);
        face.array_mut::<Handle>(FACE_MATERIALS)?.push(material);
        Ok(())
    }

    /// One closed loop starting at `points[0]`.
    fn push_loop(&mut self, points: impl IntoIterator<Item = u64>) -> Result<(), MeshError> {
        let first_edge: u64 = self.structure.lookup(EDGE)?.row_count().as_();
        self.structure
            .lookup_mut(LOOP)?
            .array_mut::<u64>(LOOP_FIRST_EDGES)?
            .push(first_edge);

        let mut edge = first_edge;
        for point in points {
            let vertex = self.structure.lookup_mut(VERTEX)?;
            vertex.array_mut::<u64>(VERTEX_POINTS)?.push(point);
            vertex.array_mut::<f64>(VERTEX_SELECTIONS)?.push(0.0);
            let edges = self.structure.lookup_mut(EDGE)?;
            edges.array_mut::<u64>(CLOCKWISE_EDGES)?.push(edge + 1);
            edges.array_mut::<f64>(EDGE_SELECTIONS)?.push(0.0);
            edge += 1;
        }
        if let Some(last) = self
            .structure
            .lookup_mut(EDGE)?
            .array_mut::<u64>(CLOCKWISE_EDGES)?
            .last_mut()
        {
            *last = first_edge;
        }
        Ok(())
    }
}
