//! TypedArray: a dense, homogeneously typed column with string metadata.
//!
//! A `TypedArray<T>` is the leaf storage of every table in a mesh. It is a
//! plain `Vec<T>` plus a small ordered metadata map. Metadata carries
//! schema-level annotations (for example "this array holds point indices" or
//! "this array holds selection weights") and participates in equality.

use std::collections::BTreeMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshError;

/// Metadata key naming the role an array plays in its primitive.
pub const ROLE_KEY: &str = "mesh:role";
/// Metadata role value marking selection-weight arrays.
pub const SELECTION_ROLE: &str = "selection";
/// Metadata key naming the index domain of an integer array.
pub const DOMAIN_KEY: &str = "mesh:domain";
/// Metadata domain value marking arrays of indices into the mesh point array.
pub const POINT_INDICES_DOMAIN: &str = "/points/indices()";

/// Ordered, append-only column of `T` with string metadata.
///
/// # Invariants
///
/// - Every element has the declared type `T`; there is no mixed storage.
/// - Metadata keys are unique; iteration over metadata is sorted by key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypedArray<T> {
    values: Vec<T>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

impl<T> Default for TypedArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypedArray<T> {
    /// Creates an empty array without metadata.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append one element.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Replace the entire contents, keeping metadata.
    pub fn assign(&mut self, values: impl IntoIterator<Item = T>) {
        self.values.clear();
        self.values.extend(values);
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.values.get_mut(index)
    }

    /// Last element, if any.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.values.last()
    }

    #[inline]
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.values.last_mut()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// All metadata pairs, sorted by key.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Returns the metadata value for `key`, if set.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Sets `key = value`, returning the previous value.
    pub fn set_metadata_value(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.metadata.insert(key.into(), value.into())
    }

    /// Replaces all metadata.
    pub fn set_metadata(&mut self, metadata: BTreeMap<String, String>) {
        self.metadata = metadata;
    }

    pub fn erase_metadata_value(&mut self, key: &str) -> Option<String> {
        self.metadata.remove(key)
    }

    /// Builder-style metadata assignment.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_metadata_value(key, value);
        self
    }

    /// Returns `Err(MetadataMismatch)` unless `key` is set to `expected`.
    pub fn require_metadata(&self, name: &str, key: &str, expected: &str) -> Result<(), MeshError> {
        match self.metadata_value(key) {
            Some(v) if v == expected => Ok(()),
            found => Err(MeshError::MetadataMismatch {
                array: name.to_string(),
                key: key.to_string(),
                expected: expected.to_string(),
                found: found.map(str::to_string),
            }),
        }
    }

    /// An empty array carrying the same metadata.
    pub fn clone_type(&self) -> Self {
        Self {
            values: Vec::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Consumes the array, returning its values.
    pub fn into_inner(self) -> Vec<T> {
        self.values
    }
}

impl<T: Clone> TypedArray<T> {
    /// Creates an array of `len` copies of `fill`.
    pub fn with_len(len: usize, fill: T) -> Self {
        Self {
            values: vec![fill; len],
            metadata: BTreeMap::new(),
        }
    }

    /// Resize to `new_len`, filling new cells with `fill`.
    pub fn resize(&mut self, new_len: usize, fill: T) {
        self.values.resize(new_len, fill);
    }

    /// Append `count` copies of `value`.
    pub fn extend_fill(&mut self, count: usize, value: T) {
        self.values.extend(std::iter::repeat_n(value, count));
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.values.extend_from_slice(values);
    }

    /// Copy of the half-open range `[begin, end)`, keeping metadata.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the range is reversed or exceeds `len()`.
    pub fn clone_range(&self, begin: usize, end: usize) -> Result<Self, MeshError> {
        let values = self.values.get(begin..end).ok_or_else(|| {
            MeshError::InvalidArgument(format!(
                "range {begin}..{end} outside array of length {}",
                self.values.len()
            ))
        })?;
        Ok(Self {
            values: values.to_vec(),
            metadata: self.metadata.clone(),
        })
    }
}

impl<T> From<Vec<T>> for TypedArray<T> {
    fn from(values: Vec<T>) -> Self {
        Self {
            values,
            metadata: BTreeMap::new(),
        }
    }
}

impl<T> FromIterator<T> for TypedArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T> Extend<T> for TypedArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

impl<T> Index<usize> for TypedArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.values[index]
    }
}

impl<'a, T> IntoIterator for &'a TypedArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
