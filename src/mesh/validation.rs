//! Mesh validation: generic table checks plus per-kind validators.
//!
//! Generic checks apply to every mesh regardless of primitive kinds: point
//! data cardinality, per-table cardinality, and bounds of arrays tagged as
//! point indices. Kind-specific checks come from a process-wide registry keyed
//! by primitive kind name. The polyhedron validator is registered by default;
//! unknown kinds get the generic checks only.

use hashbrown::HashMap;
use num_traits::AsPrimitive;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::data::table::Table;
use crate::data::typed_array::{DOMAIN_KEY, POINT_INDICES_DOMAIN};
use crate::mesh::{FrozenMesh, Mesh, Primitive};
use crate::mesh_error::MeshError;
use crate::polyhedron;

/// Kind-specific check run on each primitive of that kind.
pub type Validator = fn(&Mesh, &Primitive, &ValidationOptions) -> Result<(), MeshError>;

/// Optional validation toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Check arrays tagged as point indices against the point count.
    pub check_point_indices: bool,
    /// Check attribute tables against the row counts of their anchors.
    pub check_attribute_cardinality: bool,
}

impl ValidationOptions {
    /// Enable all checks.
    pub fn all() -> Self {
        Self {
            check_point_indices: true,
            check_attribute_cardinality: true,
        }
    }

    /// Structure tables only; skip point-index bounds and attribute sizing.
    pub fn structure_only() -> Self {
        Self {
            check_point_indices: false,
            check_attribute_cardinality: false,
        }
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::all()
    }
}

static VALIDATORS: Lazy<RwLock<HashMap<String, Validator>>> = Lazy::new(|| {
    let mut map: HashMap<String, Validator> = HashMap::new();
    map.insert(polyhedron::KIND.to_string(), polyhedron::validate_primitive);
    RwLock::new(map)
});

/// Register (or replace) the validator for `kind`, returning the previous one.
pub fn register_validator(kind: &str, validator: Validator) -> Option<Validator> {
    log::debug!("validation: register validator for `{kind}`");
    VALIDATORS.write().insert(kind.to_string(), validator)
}

/// Remove the validator for `kind`.
pub fn unregister_validator(kind: &str) -> Option<Validator> {
    VALIDATORS.write().remove(kind)
}

fn validator_for(kind: &str) -> Option<Validator> {
    VALIDATORS.read().get(kind).copied()
}

/// Validate `mesh` with all checks enabled, stopping at the first error.
pub fn is_valid(mesh: &Mesh) -> Result<(), MeshError> {
    validate_with(mesh, &ValidationOptions::all())
}

/// Validate `mesh`, stopping at the first error.
///
/// # Errors
/// Mesh-level violations are returned as-is; primitive violations are wrapped
/// in `InvalidPrimitive` naming the primitive (see [`MeshError::root_cause`]).
pub fn validate_with(mesh: &Mesh, options: &ValidationOptions) -> Result<(), MeshError> {
    let mut first = None;
    walk(mesh, options, &mut |e| {
        first = Some(e);
        false
    });
    first.map_or(Ok(()), Err)
}

/// Every violation in `mesh`, in walk order. Empty means valid.
pub fn diagnostics(mesh: &Mesh) -> Vec<MeshError> {
    diagnostics_with(mesh, &ValidationOptions::all())
}

pub fn diagnostics_with(mesh: &Mesh, options: &ValidationOptions) -> Vec<MeshError> {
    let mut errors = Vec::new();
    walk(mesh, options, &mut |e| {
        log::error!("validation: {e}");
        errors.push(e);
        true
    });
    errors
}

/// Validate independent meshes, in parallel with the `rayon` feature.
pub fn validate_batch(meshes: &[FrozenMesh], options: &ValidationOptions) -> Vec<Result<(), MeshError>> {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        meshes.par_iter().map(|m| validate_with(m, options)).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        meshes.iter().map(|m| validate_with(m, options)).collect()
    }
}

// The sink returns `false` to stop the walk.
fn walk(mesh: &Mesh, options: &ValidationOptions, sink: &mut dyn FnMut(MeshError) -> bool) {
    let point_count = mesh.point_count();
    if let Some(selection) = mesh.point_selection() {
        if selection.len() != point_count {
            let e = MeshError::Cardinality {
                table: "mesh".into(),
                array: "point_selection".into(),
                expected: point_count,
                found: selection.len(),
            };
            if !sink(e) {
                return;
            }
        }
    }
    if options.check_attribute_cardinality && !mesh.point_attributes().is_empty() {
        if let Err(e) = mesh
            .point_attributes()
            .require_row_count("point_attributes", point_count)
        {
            if !sink(e) {
                return;
            }
        }
    }

    for (index, primitive) in mesh.primitives().iter().enumerate() {
        let result = check_tables(primitive, point_count, options).and_then(|()| {
            match validator_for(primitive.kind()) {
                Some(validator) => validator(mesh, primitive, options),
                None => Ok(()),
            }
        });
        if let Err(e) = result {
            if !sink(e.in_primitive(index, primitive.kind())) {
                return;
            }
        }
    }
}

fn check_tables(
    primitive: &Primitive,
    point_count: usize,
    options: &ValidationOptions,
) -> Result<(), MeshError> {
    for (name, table) in primitive.structure().iter() {
        table.validate_cardinality(name)?;
        if options.check_point_indices {
            check_point_indices(table, point_count)?;
        }
    }
    for (scope, table) in primitive.attribute_scopes() {
        table.validate_cardinality(scope.as_str())?;
        if options.check_point_indices {
            check_point_indices(table, point_count)?;
        }
    }
    Ok(())
}

/// Bounds-check every `u64` array whose domain metadata marks it as point indices.
pub(crate) fn check_point_indices(table: &Table, point_count: usize) -> Result<(), MeshError> {
    let bound: u64 = point_count.as_();
    for (name, array) in table.iter() {
        if array.metadata_value(DOMAIN_KEY).as_deref() != Some(POINT_INDICES_DOMAIN) {
            continue;
        }
        let Some(indices) = array.typed::<u64>() else {
            continue;
        };
        if let Some((index, &value)) = indices.iter().enumerate().find(|(_, v)| **v >= bound) {
            return Err(MeshError::IndexOutOfRange {
                array: name.to_string(),
                index,
                value,
                bound: point_count,
            });
        }
    }
    Ok(())
}
