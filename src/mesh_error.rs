//! MeshError: Unified error type for mesh-tables public APIs
//!
//! Every fallible construction, lookup, and validation entry point returns
//! this type. Errors are raised synchronously at the point of violation or at
//! explicit validation time; the container never corrects data on its own.

use thiserror::Error;

use crate::data::kind::ValueKind;

/// Unified error type for mesh-tables operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// An array, table, or attribute scope with this name already exists.
    #[error("duplicate name `{0}`")]
    DuplicateName(String),
    /// A value or typed accessor does not match the array's declared kind.
    #[error("type mismatch for `{name}`: expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },
    /// No array, table, or primitive with this name.
    #[error("`{0}` not found")]
    NotFound(String),
    /// A create-once mesh array (points, point selection) was created twice.
    #[error("`{0}` already exists")]
    AlreadyExists(&'static str),
    /// Arrays in a table disagree on length, or a table disagrees with its anchor.
    #[error("cardinality mismatch in `{table}` for `{array}`: expected {expected}, found {found}")]
    Cardinality {
        table: String,
        array: String,
        expected: usize,
        found: usize,
    },
    /// A structure array references an index beyond its target.
    #[error("`{array}[{index}]` = {value} is out of range (bound {bound})")]
    IndexOutOfRange {
        array: String,
        index: usize,
        value: u64,
        bound: usize,
    },
    /// A polygon loop's clockwise-edge chain is malformed.
    #[error("topology error in `{primitive}` at loop {loop_index}: {reason}")]
    Topology {
        primitive: String,
        loop_index: usize,
        reason: String,
    },
    /// Required array metadata is absent or carries the wrong value.
    #[error("array `{array}` requires metadata {key} = {expected:?}, found {found:?}")]
    MetadataMismatch {
        array: String,
        key: String,
        expected: String,
        found: Option<String>,
    },
    /// A value-kind label that does not name a supported kind.
    #[error("unknown value kind `{0}`")]
    UnknownKind(String),
    /// Arguments rejected before any data was touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A validator rejected one primitive of a mesh.
    #[error("primitive {index} (`{kind}`) is invalid: {source}")]
    InvalidPrimitive {
        index: usize,
        kind: String,
        #[source]
        source: Box<MeshError>,
    },
    /// Two structures compared outside the accepted tolerance.
    #[error("structures differ (exact = {exact}, ulps_max = {ulps_max})\nactual:\n{actual}\nreference:\n{reference}")]
    NotSimilar {
        exact: bool,
        ulps_max: f64,
        actual: String,
        reference: String,
    },
}

impl MeshError {
    /// Wrap a kind validator's error with the primitive it was raised for.
    pub(crate) fn in_primitive(self, index: usize, kind: &str) -> Self {
        MeshError::InvalidPrimitive {
            index,
            kind: kind.to_string(),
            source: Box::new(self),
        }
    }

    /// Strip any [`MeshError::InvalidPrimitive`] wrappers.
    pub fn root_cause(&self) -> &MeshError {
        match self {
            MeshError::InvalidPrimitive { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
