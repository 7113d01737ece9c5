//! Ordered collection of named tables; the structure section of a primitive.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::table::Table;
use crate::mesh_error::MeshError;

/// Ordered mapping `name -> Table`.
///
/// Unlike [`Table`], the member tables are free to have different row counts:
/// a polyhedron's `face` table and `edge` table are sized independently.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedTables {
    tables: Vec<(String, Table)>,
}

impl NamedTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caller guarantees unique names.
    pub(crate) fn from_tables_unchecked(tables: Vec<(String, Table)>) -> Self {
        Self { tables }
    }

    /// Add an empty table.
    ///
    /// # Errors
    /// Returns `DuplicateName` if `name` is taken.
    pub fn create(&mut self, name: &str) -> Result<&mut Table, MeshError> {
        if self.position(name).is_some() {
            return Err(MeshError::DuplicateName(name.to_string()));
        }
        log::trace!("structure: create table `{name}`");
        self.tables.push((name.to_string(), Table::new()));
        let last = self.tables.len() - 1;
        Ok(&mut self.tables[last].1)
    }

    /// Existing table `name`, or a newly created empty one.
    pub fn get_or_create(&mut self, name: &str) -> &mut Table {
        let slot = match self.position(name) {
            Some(i) => i,
            None => {
                self.tables.push((name.to_string(), Table::new()));
                self.tables.len() - 1
            }
        };
        &mut self.tables[slot].1
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.position(name).map(|i| &self.tables[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.position(name).map(|i| &mut self.tables[i].1)
    }

    /// # Errors
    /// Returns `NotFound` if absent.
    pub fn lookup(&self, name: &str) -> Result<&Table, MeshError> {
        self.get(name)
            .ok_or_else(|| MeshError::NotFound(name.to_string()))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Table, MeshError> {
        self.get_mut(name)
            .ok_or_else(|| MeshError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Tables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Table)> {
        self.tables.iter_mut().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    // A primitive has a handful of tables; linear search beats hashing here.
    fn position(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|(n, _)| n == name)
    }
}

impl fmt::Display for NamedTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(0);
        let pad = " ".repeat(width);
        for (name, table) in &self.tables {
            writeln!(f, "{pad}table \"{name}\" [{} rows]", table.row_count())?;
            write!(f, "{table:width$}", width = width + 2)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_lookup() {
        let mut s = NamedTables::new();
        s.create("face").unwrap().create::<u64>("face_first_loops").unwrap();
        assert!(s.lookup("face").unwrap().contains("face_first_loops"));
        assert_eq!(s.lookup("edge"), Err(MeshError::NotFound("edge".into())));
        assert_eq!(
            s.create("face").unwrap_err(),
            MeshError::DuplicateName("face".into())
        );
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut s = NamedTables::new();
        s.get_or_create("edge");
        s.get_or_create("edge");
        s.get_or_create("vertex");
        assert_eq!(s.iter().map(|(n, _)| n).collect::<Vec<_>>(), ["edge", "vertex"]);
    }
}
