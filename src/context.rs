//! Explicit operation context and change-set transactions.
//!
//! Operations receive an [`OperationContext`] instead of consulting global
//! mode switches. Edits that must be undoable run inside a [`ChangeSet`],
//! which snapshots the mesh on entry and restores it unless committed.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;
use crate::mesh::validation::{self, ValidationOptions};
use crate::mesh_error::MeshError;

/// Per-operation settings, passed explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationContext {
    /// The operation runs on behalf of a user and may be undone.
    pub interactive: bool,
    pub validation: ValidationOptions,
}

impl OperationContext {
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    /// Validate `mesh` with this context's options.
    pub fn validate(&self, mesh: &Mesh) -> Result<(), MeshError> {
        validation::validate_with(mesh, &self.validation)
    }

    /// Open a change set on `mesh`.
    pub fn begin<'m>(&self, mesh: &'m mut Mesh) -> ChangeSet<'m> {
        ChangeSet::begin(mesh)
    }
}

/// A pending set of edits on a mesh.
///
/// Dereferences to the mesh being edited. Dropping an uncommitted change set
/// restores the snapshot taken by [`ChangeSet::begin`].
#[derive(Debug)]
pub struct ChangeSet<'m> {
    mesh: &'m mut Mesh,
    snapshot: Option<Mesh>,
}

impl<'m> ChangeSet<'m> {
    pub fn begin(mesh: &'m mut Mesh) -> Self {
        let snapshot = Some(mesh.clone());
        log::trace!("change set opened");
        Self { mesh, snapshot }
    }

    /// Keep the edits; returns the label for the caller's history.
    pub fn commit(mut self, label: impl Into<String>) -> String {
        let label = label.into();
        self.snapshot = None;
        log::trace!("change set committed: {label}");
        label
    }

    /// Discard the edits, restoring the mesh as it was at [`begin`](Self::begin).
    pub fn cancel(mut self) {
        self.restore();
    }

    /// Snapshot taken when the change set was opened.
    pub fn original(&self) -> Option<&Mesh> {
        self.snapshot.as_ref()
    }

    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.mesh = snapshot;
            log::trace!("change set cancelled");
        }
    }
}

impl Deref for ChangeSet<'_> {
    type Target = Mesh;
    fn deref(&self) -> &Mesh {
        self.mesh
    }
}

impl DerefMut for ChangeSet<'_> {
    fn deref_mut(&mut self) -> &mut Mesh {
        self.mesh
    }
}

impl Drop for ChangeSet<'_> {
    fn drop(&mut self) {
        if self.snapshot.is_some() {
            log::warn!("change set dropped without commit; restoring mesh");
            self.restore();
        }
    }
}
