use mesh_tables::context::{ChangeSet, OperationContext};
use mesh_tables::data::{Handle, Point3};
use mesh_tables::difference;
use mesh_tables::mesh::validation::ValidationOptions;
use mesh_tables::mesh::{ComponentKind, Mesh, MeshSelection};
use mesh_tables::mesh_error::MeshError;
use mesh_tables::polyhedron;

fn triangle() -> Mesh {
    let mut mesh = Mesh::new();
    polyhedron::create_from_polygons(
        &mut mesh,
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
    mesh
}

#[test]
fn cancel_restores_the_snapshot() -> Result<(), MeshError> {
    let mut mesh = triangle();
    let reference = mesh.clone();

    let mut change = ChangeSet::begin(&mut mesh);
    polyhedron::add_triangle(&mut change, 0, 0, [2, 1, 0], Handle(3))?;
    let mut selection = MeshSelection::new();
    selection.append(ComponentKind::Point, 0, 1, 1.0);
    selection.merge_into(&mut change);
    assert!(!difference::test(&*change, &reference).is_equal());
    change.cancel();

    assert!(difference::test(&mesh, &reference).is_equal());
    Ok(())
}

#[test]
fn commit_keeps_edits() -> Result<(), MeshError> {
    let mut mesh = triangle();
    let ctx = OperationContext::interactive();

    let mut change = ctx.begin(&mut mesh);
    let p = change.add_point(Point3::new(1.0, 1.0, 0.0));
    polyhedron::add_triangle(&mut change, 0, 0, [1, p as u64, 2], Handle::NULL)?;
    ctx.validate(&change)?;
    assert_eq!(change.commit("add triangle"), "add triangle");

    let view = polyhedron::validate(&mesh, mesh.primitives().get(0).unwrap())?;
    assert_eq!(view.face_count(), 2);
    assert_eq!(mesh.point_count(), 4);
    Ok(())
}

#[test]
fn failed_edit_is_rolled_back_on_drop() {
    let mut mesh = triangle();
    let reference = mesh.clone();

    let result: Result<(), MeshError> = (|| {
        let mut change = ChangeSet::begin(&mut mesh);
        change.add_point(Point3::new(5.0, 5.0, 5.0));
        polyhedron::add_triangle(&mut change, 0, 9, [0, 1, 2], Handle::NULL)?;
        change.commit("unreachable");
        Ok(())
    })();

    assert!(result.is_err());
    assert!(difference::test(&mesh, &reference).is_equal());
}

#[test]
fn context_options_drive_validation() -> Result<(), MeshError> {
    let mut mesh = triangle();
    *mesh
        .primitives_mut()
        .get_mut(0)
        .unwrap()
        .structure_mut()
        .lookup_mut(polyhedron::VERTEX)?
        .array_mut::<u64>(polyhedron::VERTEX_POINTS)?
        .get_mut(0)
        .unwrap() = 42;

    assert!(OperationContext::default().validate(&mesh).is_err());
    let lenient = OperationContext {
        interactive: false,
        validation: ValidationOptions::structure_only(),
    };
    lenient.validate(&mesh)?;
    Ok(())
}
