use mesh_tables::data::{Handle, Point3, Table};
use mesh_tables::difference;
use mesh_tables::mesh::validation;
use mesh_tables::mesh::{AttributeScope, Mesh};
use mesh_tables::polyhedron;
use proptest::prelude::*;

fn point() -> impl Strategy<Value = Point3> {
    (-1.0e3f64..1.0e3, -1.0e3f64..1.0e3, -1.0e3f64..1.0e3).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

/// A polygon soup: points plus faces of 3..=6 vertices indexing into them.
fn soup() -> impl Strategy<Value = (Vec<Point3>, Vec<u64>, Vec<u64>)> {
    prop::collection::vec(point(), 3..24).prop_flat_map(|points| {
        let n = points.len() as u64;
        let faces = prop::collection::vec(prop::collection::vec(0..n, 3..=6), 1..8);
        (Just(points), faces).prop_map(|(points, faces)| {
            let counts = faces.iter().map(|f| f.len() as u64).collect();
            let indices = faces.into_iter().flatten().collect();
            (points, counts, indices)
        })
    })
}

fn build((points, counts, indices): &(Vec<Point3>, Vec<u64>, Vec<u64>)) -> Mesh {
    let mut mesh = Mesh::new();
    polyhedron::create_from_polygons(&mut mesh, points, counts, indices, Handle::NULL).unwrap();
    mesh
}

fn all_tables(mesh: &Mesh) -> Vec<(String, &Table)> {
    let mut out = vec![("point_attributes".to_string(), mesh.point_attributes())];
    for primitive in mesh.primitives().iter() {
        for (name, table) in primitive.structure().iter() {
            out.push((name.to_string(), table));
        }
        for (scope, table) in primitive.attribute_scopes() {
            out.push((scope.as_str().to_string(), table));
        }
    }
    out
}

proptest! {
    #[test]
    fn comparison_is_reflexive(s in soup()) {
        let mesh = build(&s);
        let acc = difference::test(&mesh, &mesh.clone());
        prop_assert!(acc.exact_min());
        prop_assert_eq!(acc.ulps_max(), 0.0);
    }

    #[test]
    fn any_coordinate_change_is_detected(s in soup(), which in 0usize..3, delta in 1.0e-3f64..1.0) {
        let a = build(&s);
        let mut b = a.clone();
        let p = b.points_mut().unwrap().get_mut(0).unwrap();
        p[which] += delta;
        let acc = difference::test(&a, &b);
        prop_assert!(!acc.is_equal());
        prop_assert!(acc.ulps_max() > 0.0);
    }

    #[test]
    fn appending_to_one_side_breaks_equality(s in soup(), extra in point()) {
        let a = build(&s);
        let mut b = a.clone();
        b.add_point(extra);
        prop_assert!(!difference::test(&a, &b).is_equal());
        prop_assert!(!difference::test(&b, &a).is_equal());

        let mut c = a.clone();
        let p = c.primitives().len() - 1;
        polyhedron::add_triangle(&mut c, p, 0, [0, 1, 2], Handle::NULL).unwrap();
        prop_assert!(!difference::test(&a, &c).is_equal());
    }

    #[test]
    fn tables_keep_equal_lengths(s in soup(), grid in (1u64..4, 1u64..4)) {
        let mut mesh = build(&s);
        mesh.point_attributes_mut().create::<f64>("temperature").unwrap();
        let point_count = mesh.point_count();
        mesh.point_attributes_mut().set_row_count(point_count);
        polyhedron::add_grid(&mut mesh, 0, 0, grid.0, grid.1, Handle::NULL).unwrap();
        mesh.primitives_mut()
            .get_mut(0)
            .unwrap()
            .attributes_mut(AttributeScope::Vertex)
            .create::<f64>("u")
            .unwrap();

        for (name, table) in all_tables(&mesh) {
            prop_assert!(table.validate_cardinality(&name).is_ok(), "{} is ragged", name);
        }
        prop_assert_eq!(mesh.point_attributes().row_count(), mesh.point_count());
        prop_assert_eq!(mesh.point_selection().unwrap().len(), mesh.point_count());
    }

    #[test]
    fn loops_close_after_their_edge_count(s in soup()) {
        let mesh = build(&s);
        validation::is_valid(&mesh).unwrap();
        let view = polyhedron::validate(&mesh, mesh.primitives().get(0).unwrap()).unwrap();
        for face in 0..view.face_count() {
            let expected = s.1[face];
            for l in view.face_loops(face) {
                let first = view.loop_first_edges[l];
                let mut edge = first;
                for step in 1..=expected {
                    edge = view.clockwise_edges[edge as usize];
                    prop_assert_eq!(edge == first, step == expected);
                }
            }
        }
    }
}
