//! Construction-time invariant checks.
//!
//! Tables, typed arrays, and meshes are assembled incrementally, so their
//! structural invariants cannot be enforced on every push. Types implement
//! [`DebugInvariants`] to expose a fallible check; the [`debug_invariants!`]
//! macro turns a failed check into a panic in debug builds or when the
//! `check-invariants` feature is enabled, and compiles to nothing otherwise.

use crate::mesh_error::MeshError;

/// Run a fallible check and panic on error when invariant checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Trait for containers whose invariants are checked after construction.
pub trait DebugInvariants {
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshError>;

    /// Panic on a violated invariant in debug builds or under `check-invariants`.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "container invariant violated");
    }
}
