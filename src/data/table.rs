//! Table: an ordered set of named, equal-length arrays.
//!
//! A `Table` is the unit of storage for one "quantity" of a primitive (its
//! faces, its edges, its per-vertex attributes). Columns keep insertion order,
//! which is also the order used by dumps and by the difference walk.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::data::array::{Array, ArrayValue};
use crate::data::kind::ValueKind;
use crate::data::typed_array::TypedArray;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;

/// One named column.
pub type Column = (String, Array);

/// Ordered mapping `name -> Array` whose arrays share one length.
///
/// # Invariants
///
/// - Column names are unique.
/// - Every column has the same length, the table's *cardinality*. This is
///   not enforced on each push (columns grow one at a time during
///   construction) but is checked by [`Table::validate_cardinality`] and by
///   mesh validation.
///
/// # Determinism
/// Iteration yields columns in insertion order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct Table {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty typed array named `name`.
    ///
    /// # Errors
    /// Returns `DuplicateName` if a column with that name already exists.
    pub fn create<T: ArrayValue>(&mut self, name: &str) -> Result<&mut TypedArray<T>, MeshError> {
        let array = self.insert(name, T::wrap(TypedArray::new()))?;
        array.try_typed_mut::<T>(name)
    }

    /// Create an empty array of a kind chosen at runtime.
    pub fn create_kind(&mut self, name: &str, kind: ValueKind) -> Result<&mut Array, MeshError> {
        self.insert(name, Array::empty(kind))
    }

    /// Add a prebuilt column.
    ///
    /// # Errors
    /// Returns `DuplicateName` if a column with that name already exists.
    pub fn insert(&mut self, name: &str, array: Array) -> Result<&mut Array, MeshError> {
        if self.index.contains_key(name) {
            return Err(MeshError::DuplicateName(name.to_string()));
        }
        log::trace!("table: create {} array `{name}`", array.kind());
        let slot = self.columns.len();
        self.index.insert(name.to_string(), slot);
        self.columns.push((name.to_string(), array));
        Ok(&mut self.columns[slot].1)
    }

    pub fn get(&self, name: &str) -> Option<&Array> {
        self.index.get(name).map(|&i| &self.columns[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Array> {
        self.index.get(name).map(|&i| &mut self.columns[i].1)
    }

    /// Look up a column by name.
    ///
    /// # Errors
    /// Returns `NotFound` if absent.
    pub fn lookup(&self, name: &str) -> Result<&Array, MeshError> {
        self.get(name)
            .ok_or_else(|| MeshError::NotFound(name.to_string()))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Array, MeshError> {
        self.get_mut(name)
            .ok_or_else(|| MeshError::NotFound(name.to_string()))
    }

    /// Typed read access to a column.
    ///
    /// # Errors
    /// `NotFound` if absent, `TypeMismatch` if the column holds another kind.
    pub fn array<T: ArrayValue>(&self, name: &str) -> Result<&TypedArray<T>, MeshError> {
        self.lookup(name)?.try_typed::<T>(name)
    }

    /// Typed write access to a column.
    pub fn array_mut<T: ArrayValue>(&mut self, name: &str) -> Result<&mut TypedArray<T>, MeshError> {
        self.lookup_mut(name)?.try_typed_mut::<T>(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Columns in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array)> {
        self.columns.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Array)> {
        self.columns.iter_mut().map(|(n, a)| (n.as_str(), a))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Cardinality: length of the first column, or 0 without columns.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |(_, a)| a.len())
    }

    /// Resize every column to `rows`, filling with each kind's default.
    pub fn set_row_count(&mut self, rows: usize) {
        for (_, array) in &mut self.columns {
            array.resize(rows);
        }
    }

    /// A table with the same columns (names, kinds, metadata) and no rows.
    pub fn clone_types(&self) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|(n, a)| (n.clone(), a.clone_type()))
            .collect();
        Table::from_columns_unchecked(columns)
    }

    /// Copy of rows `[begin, end)` of every column.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the range is outside any column.
    pub fn clone_range(&self, begin: usize, end: usize) -> Result<Table, MeshError> {
        let columns = self
            .columns
            .iter()
            .map(|(n, a)| Ok((n.clone(), a.clone_range(begin, end)?)))
            .collect::<Result<Vec<_>, MeshError>>()?;
        Ok(Table::from_columns_unchecked(columns))
    }

    /// Check that every column shares the first column's length.
    ///
    /// `table` names this table in the error.
    ///
    /// # Errors
    /// `Cardinality` naming the first disagreeing column.
    pub fn validate_cardinality(&self, table: &str) -> Result<(), MeshError> {
        let expected = self.row_count();
        for (name, array) in &self.columns {
            if array.len() != expected {
                return Err(MeshError::Cardinality {
                    table: table.to_string(),
                    array: name.clone(),
                    expected,
                    found: array.len(),
                });
            }
        }
        Ok(())
    }

    /// Check that this table has exactly `expected` rows.
    pub fn require_row_count(&self, table: &str, expected: usize) -> Result<(), MeshError> {
        self.validate_cardinality(table)?;
        match self.columns.first() {
            Some((name, array)) if array.len() != expected => Err(MeshError::Cardinality {
                table: table.to_string(),
                array: name.clone(),
                expected,
                found: array.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Caller guarantees unique names and equal lengths.
    pub(crate) fn from_columns_unchecked(columns: Vec<Column>) -> Table {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, (n, _))| (n.clone(), i))
            .collect();
        Table { columns, index }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl TryFrom<Vec<Column>> for Table {
    type Error = MeshError;

    fn try_from(columns: Vec<Column>) -> Result<Self, Self::Error> {
        let mut table = Table::new();
        for (name, array) in columns {
            table.insert(&name, array)?;
        }
        Ok(table)
    }
}

impl From<Table> for Vec<Column> {
    fn from(table: Table) -> Self {
        table.columns
    }
}

impl DebugInvariants for Table {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        if self.index.len() != self.columns.len() {
            return Err(MeshError::InvalidArgument(
                "table index out of sync with columns".into(),
            ));
        }
        self.validate_cardinality("")
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(0);
        let pad = " ".repeat(width);
        for (name, array) in &self.columns {
            write!(f, "{pad}array \"{name}\" {} [{}]", array.kind(), array.len())?;
            let metadata = array.metadata();
            if !metadata.is_empty() {
                f.write_str(" {")?;
                for (i, (k, v)) in metadata.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                f.write_str("}")?;
            }
            writeln!(f)?;
            for (i, value) in array.render_values().iter().enumerate() {
                writeln!(f, "{pad}  {i}: {value}")?;
            }
        }
        Ok(())
    }
}
