//! Generic primitives: a kind name, structure tables, and scoped attributes.
//!
//! A primitive carries no behavior of its own. Its `kind` string selects the
//! schema that validators and algorithms apply; unknown kinds are stored and
//! compared like any other.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::named_tables::NamedTables;
use crate::data::table::Table;

/// Scope at which an attribute table varies over a primitive.
///
/// The derived `Ord` is the canonical scope order for dumps and differences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeScope {
    /// One value for the whole primitive.
    Constant,
    /// One value per primitive-specific unit (for example per patch).
    Uniform,
    /// One value per face.
    Face,
    /// One value per edge.
    Edge,
    /// One value per face-vertex (polygon corner).
    Vertex,
    /// Interpolated across parametric corners.
    Varying,
    /// One value per parameter-space corner.
    ParameterCorner,
}

impl AttributeScope {
    pub const ALL: [AttributeScope; 7] = [
        AttributeScope::Constant,
        AttributeScope::Uniform,
        AttributeScope::Face,
        AttributeScope::Edge,
        AttributeScope::Vertex,
        AttributeScope::Varying,
        AttributeScope::ParameterCorner,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeScope::Constant => "constant",
            AttributeScope::Uniform => "uniform",
            AttributeScope::Face => "face",
            AttributeScope::Edge => "edge",
            AttributeScope::Vertex => "vertex",
            AttributeScope::Varying => "varying",
            AttributeScope::ParameterCorner => "parameter_corner",
        }
    }
}

impl fmt::Display for AttributeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One geometric primitive stored inside a [`Mesh`](crate::mesh::Mesh).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    kind: String,
    structure: NamedTables,
    #[serde(default)]
    attributes: BTreeMap<AttributeScope, Table>,
}

impl Primitive {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            structure: NamedTables::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Kind name, e.g. `"polyhedron"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn structure(&self) -> &NamedTables {
        &self.structure
    }

    pub fn structure_mut(&mut self) -> &mut NamedTables {
        &mut self.structure
    }

    /// Attribute table for `scope`, or `None` if it was never created.
    pub fn attributes(&self, scope: AttributeScope) -> Option<&Table> {
        self.attributes.get(&scope)
    }

    /// Attribute table for `scope`, created empty on first access.
    pub fn attributes_mut(&mut self, scope: AttributeScope) -> &mut Table {
        self.attributes.entry(scope).or_default()
    }

    /// All attribute tables in canonical scope order.
    pub fn attribute_scopes(&self) -> impl Iterator<Item = (AttributeScope, &Table)> {
        self.attributes.iter().map(|(s, t)| (*s, t))
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(0);
        let pad = " ".repeat(width);
        writeln!(f, "{pad}primitive \"{}\"", self.kind)?;
        writeln!(f, "{pad}  structure:")?;
        write!(f, "{:w$}", self.structure, w = width + 4)?;
        for (scope, table) in &self.attributes {
            writeln!(f, "{pad}  {scope} attributes:")?;
            write!(f, "{table:w$}", w = width + 4)?;
        }
        Ok(())
    }
}

/// Ordered, append-only list of primitives.
///
/// Positions are stable: primitives are never removed or reordered, so an
/// index returned by [`Primitives::push`] stays valid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Primitives {
    items: Vec<Primitive>,
}

impl Primitives {
    /// Append an empty primitive of `kind` and return it for population.
    pub fn create(&mut self, kind: &str) -> &mut Primitive {
        log::trace!("mesh: create primitive {} `{kind}`", self.items.len());
        let index = self.push(Primitive::new(kind));
        &mut self.items[index]
    }

    /// Append a prebuilt primitive, returning its index.
    pub fn push(&mut self, primitive: Primitive) -> usize {
        self.items.push(primitive);
        self.items.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Primitive> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Primitive> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Primitive> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Primitive> {
        self.items.iter_mut()
    }

    /// Primitives whose kind is `kind`, with their indices.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = (usize, &'a Primitive)> + 'a {
        self.items
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a Primitives {
    type Item = &'a Primitive;
    type IntoIter = std::slice::Iter<'a, Primitive>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
