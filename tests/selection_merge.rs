use mesh_tables::data::{Handle, Point3};
use mesh_tables::difference;
use mesh_tables::mesh::selection::ALL;
use mesh_tables::mesh::{ComponentKind, Mesh, MeshSelection};
use mesh_tables::polyhedron;

fn point_cloud(n: usize) -> Mesh {
    let mut mesh = Mesh::new();
    mesh.create_points().unwrap();
    mesh.create_point_selection().unwrap();
    for i in 0..n {
        mesh.add_point(Point3::new(i as f64, 0.0, 0.0));
    }
    mesh
}

/// Two single-quad polyhedra over eight fresh points.
fn two_quads() -> Mesh {
    let mut mesh = Mesh::new();
    for _ in 0..2 {
        polyhedron::create_from_polygons(
            &mut mesh,
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[4],
            &[0, 1, 2, 3],
            Handle::NULL,
        )
        .unwrap();
    }
    mesh
}

fn structure_weights(mesh: &Mesh, primitive: usize, table: &str, array: &str) -> Vec<f64> {
    mesh.primitives()
        .get(primitive)
        .unwrap()
        .structure()
        .lookup(table)
        .unwrap()
        .array::<f64>(array)
        .unwrap()
        .as_slice()
        .to_vec()
}

#[test]
fn single_point_range_selects_exactly_one_point() {
    let mut mesh = point_cloud(20);
    let mut selection = MeshSelection::new();
    selection.append(ComponentKind::Point, 15, 16, 1.0);
    selection.merge_into(&mut mesh);

    let weights = mesh.point_selection().unwrap().as_slice();
    assert_eq!(weights[15], 1.0);
    assert_eq!(weights[16], 0.0);
    assert_eq!(weights.iter().filter(|w| **w != 0.0).count(), 1);
    assert_eq!(selection.weight_at(ComponentKind::Point, 0, 15), Some(1.0));
    assert_eq!(selection.weight_at(ComponentKind::Point, 0, 16), None);
}

#[test]
fn later_ranges_override_earlier_ones() {
    let mut mesh = point_cloud(10);
    let mut selection = MeshSelection::new();
    selection.append(ComponentKind::Point, 0, ALL, 1.0);
    selection.append(ComponentKind::Point, 2, 4, 0.0);
    selection.append(ComponentKind::Point, 3, 5, 0.25);
    selection.merge_into(&mut mesh);
    assert_eq!(
        mesh.point_selection().unwrap().as_slice(),
        &[1.0, 1.0, 0.0, 0.25, 0.25, 1.0, 1.0, 1.0, 1.0, 1.0]
    );
}

#[test]
fn merge_without_point_selection_leaves_mesh_untouched() {
    let mut mesh = Mesh::new();
    mesh.create_points().unwrap().push(Point3::default());
    let before = mesh.clone();
    MeshSelection::select_all(1.0).merge_into(&mut mesh);
    assert!(difference::test(&mesh, &before).is_equal());
}

#[test]
fn face_ranges_respect_primitive_ranges() {
    let mut mesh = two_quads();
    let mut selection = MeshSelection::new();
    selection.append_in_primitives(ComponentKind::Face, 1, 2, 0, ALL, 1.0);
    selection.merge_into(&mut mesh);

    assert_eq!(
        structure_weights(&mesh, 0, polyhedron::FACE, polyhedron::FACE_SELECTIONS),
        [0.0]
    );
    assert_eq!(
        structure_weights(&mesh, 1, polyhedron::FACE, polyhedron::FACE_SELECTIONS),
        [1.0]
    );
    assert_eq!(selection.weight_at(ComponentKind::Face, 0, 0), None);
    assert_eq!(selection.weight_at(ComponentKind::Face, 1, 0), Some(1.0));
}

#[test]
fn edge_and_vertex_ranges_reach_every_primitive() {
    let mut mesh = two_quads();
    let mut selection = MeshSelection::new();
    selection.append(ComponentKind::Edge, 1, 3, 0.5);
    selection.append(ComponentKind::Vertex, 3, 10, 1.0);
    selection.merge_into(&mut mesh);

    for primitive in 0..2 {
        assert_eq!(
            structure_weights(&mesh, primitive, polyhedron::EDGE, polyhedron::EDGE_SELECTIONS),
            [0.0, 0.5, 0.5, 0.0]
        );
        assert_eq!(
            structure_weights(&mesh, primitive, polyhedron::VERTEX, polyhedron::VERTEX_SELECTIONS),
            [0.0, 0.0, 0.0, 1.0]
        );
    }
    // Points are a separate component and stay unselected.
    assert!(mesh.point_selection().unwrap().iter().all(|w| *w == 0.0));
}

#[test]
fn select_all_then_deselect_everything() {
    let mut mesh = two_quads();
    MeshSelection::select_all(1.0).merge_into(&mut mesh);
    assert!(mesh.point_selection().unwrap().iter().all(|w| *w == 1.0));
    assert_eq!(
        structure_weights(&mesh, 1, polyhedron::FACE, polyhedron::FACE_SELECTIONS),
        [1.0]
    );

    MeshSelection::select_all(0.0).merge_into(&mut mesh);
    assert!(difference::test(&mesh, &two_quads()).is_equal());
}

#[test]
fn selections_round_trip_through_json() {
    let mut selection = MeshSelection::new();
    selection.append(ComponentKind::Point, 15, 16, 1.0);
    selection.append_in_primitives(ComponentKind::Face, 0, 1, 2, 4, 0.5);
    let json = serde_json::to_string(&selection).unwrap();
    let back: MeshSelection = serde_json::from_str(&json).unwrap();
    assert_eq!(back, selection);
    assert!(difference::test(&back, &selection).is_equal());
}
