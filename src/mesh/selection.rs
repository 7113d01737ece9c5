//! Range-compressed selections and their merge into meshes.
//!
//! A [`MeshSelection`] records `(begin, end, weight)` ranges grouped by
//! component kind. Each group is a [`SelectionStorage`] holding one typed
//! column per range field; it serializes, dumps, and diffs as an ordinary
//! [`Table`] with one row per range.
//!
//! # Semantics
//!
//! - Ranges are half-open; `end <= begin` selects nothing.
//! - [`ALL`] as an `end` means "through the last element".
//! - Ranges apply in append order, so where they overlap the last one wins.
//! - Weight `0.0` means unselected.

use std::fmt;

use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::data::array::Array;
use crate::data::table::Table;
use crate::data::typed_array::{ROLE_KEY, SELECTION_ROLE, TypedArray};
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;

/// Range end meaning "to the end of the array".
pub const ALL: u64 = u64::MAX;

const PRIMITIVE_BEGIN: &str = "primitive_begin";
const PRIMITIVE_END: &str = "primitive_end";
const INDEX_BEGIN: &str = "index_begin";
const INDEX_END: &str = "index_end";
const WEIGHT: &str = "weight";

/// What a selection range indexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Mesh points (`Mesh::point_selection`).
    Point,
    /// Rows of each primitive's `edge` structure table.
    Edge,
    /// Rows of each primitive's `face` structure table.
    Face,
    /// Rows of each primitive's `vertex` structure table.
    Vertex,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Point,
        ComponentKind::Edge,
        ComponentKind::Face,
        ComponentKind::Vertex,
    ];

    /// Label; for primitive components also the structure table it targets.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Point => "point",
            ComponentKind::Edge => "edge",
            ComponentKind::Face => "face",
            ComponentKind::Vertex => "vertex",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded row of a [`SelectionStorage`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionRange {
    pub primitive_begin: u64,
    pub primitive_end: u64,
    pub begin: u64,
    pub end: u64,
    pub weight: f64,
}

impl SelectionRange {
    fn covers(&self, primitive: u64, index: u64) -> bool {
        (self.primitive_begin..self.primitive_end).contains(&primitive)
            && (self.begin..self.end).contains(&index)
    }
}

/// All ranges for one component kind, one column per range field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStorage", into = "RawStorage")]
pub struct SelectionStorage {
    component: ComponentKind,
    primitive_begin: TypedArray<u64>,
    primitive_end: TypedArray<u64>,
    index_begin: TypedArray<u64>,
    index_end: TypedArray<u64>,
    weight: TypedArray<f64>,
}

/// Wire form: the columns as an ordinary table.
#[derive(Serialize, Deserialize)]
struct RawStorage {
    component: ComponentKind,
    ranges: Table,
}

impl TryFrom<RawStorage> for SelectionStorage {
    type Error = MeshError;

    fn try_from(raw: RawStorage) -> Result<Self, MeshError> {
        raw.ranges.validate_cardinality("selection")?;
        let ranges = &raw.ranges;
        Ok(SelectionStorage {
            component: raw.component,
            primitive_begin: ranges.array::<u64>(PRIMITIVE_BEGIN)?.clone(),
            primitive_end: ranges.array::<u64>(PRIMITIVE_END)?.clone(),
            index_begin: ranges.array::<u64>(INDEX_BEGIN)?.clone(),
            index_end: ranges.array::<u64>(INDEX_END)?.clone(),
            weight: ranges.array::<f64>(WEIGHT)?.clone(),
        })
    }
}

impl From<SelectionStorage> for RawStorage {
    fn from(storage: SelectionStorage) -> Self {
        RawStorage {
            component: storage.component,
            ranges: storage.table(),
        }
    }
}

impl SelectionStorage {
    fn new(component: ComponentKind) -> Self {
        Self {
            component,
            primitive_begin: TypedArray::new(),
            primitive_end: TypedArray::new(),
            index_begin: TypedArray::new(),
            index_end: TypedArray::new(),
            weight: TypedArray::new(),
        }
    }

    pub fn component(&self) -> ComponentKind {
        self.component
    }

    /// The ranges as a table, one row per range.
    pub fn table(&self) -> Table {
        Table::from_columns_unchecked(vec![
            (PRIMITIVE_BEGIN.to_string(), Array::from_typed(self.primitive_begin.clone())),
            (PRIMITIVE_END.to_string(), Array::from_typed(self.primitive_end.clone())),
            (INDEX_BEGIN.to_string(), Array::from_typed(self.index_begin.clone())),
            (INDEX_END.to_string(), Array::from_typed(self.index_end.clone())),
            (WEIGHT.to_string(), Array::from_typed(self.weight.clone())),
        ])
    }

    pub fn len(&self) -> usize {
        self.weight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, range: SelectionRange) {
        self.primitive_begin.push(range.primitive_begin);
        self.primitive_end.push(range.primitive_end);
        self.index_begin.push(range.begin);
        self.index_end.push(range.end);
        self.weight.push(range.weight);
    }

    /// Ranges in append order.
    pub fn ranges(&self) -> impl Iterator<Item = SelectionRange> + '_ {
        self.primitive_begin
            .iter()
            .zip(self.primitive_end.iter())
            .zip(self.index_begin.iter())
            .zip(self.index_end.iter())
            .zip(self.weight.iter())
            .map(|((((&pb, &pe), &b), &e), &w)| SelectionRange {
                primitive_begin: pb,
                primitive_end: pe,
                begin: b,
                end: e,
                weight: w,
            })
    }
}

/// Ordered set of selection storages, at most one per component kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshSelection {
    storages: Vec<SelectionStorage>,
}

impl MeshSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A selection assigning `weight` to every component of every kind.
    pub fn select_all(weight: f64) -> Self {
        let mut selection = Self::new();
        for kind in ComponentKind::ALL {
            selection.append_all(kind, weight);
        }
        selection
    }

    pub fn storages(&self) -> &[SelectionStorage] {
        &self.storages
    }

    pub fn storage(&self, kind: ComponentKind) -> Option<&SelectionStorage> {
        self.storages.iter().find(|s| s.component == kind)
    }

    fn storage_mut(&mut self, kind: ComponentKind) -> &mut SelectionStorage {
        let slot = match self.storages.iter().position(|s| s.component == kind) {
            Some(i) => i,
            None => {
                self.storages.push(SelectionStorage::new(kind));
                self.storages.len() - 1
            }
        };
        &mut self.storages[slot]
    }

    /// Select `[begin, end)` of `kind` in every primitive.
    pub fn append(&mut self, kind: ComponentKind, begin: u64, end: u64, weight: f64) {
        self.append_in_primitives(kind, 0, ALL, begin, end, weight);
    }

    /// Select every component of `kind`.
    pub fn append_all(&mut self, kind: ComponentKind, weight: f64) {
        self.append(kind, 0, ALL, weight);
    }

    /// Select `[begin, end)` of `kind` in primitives `[primitive_begin, primitive_end)`.
    ///
    /// The primitive range is ignored for [`ComponentKind::Point`].
    pub fn append_in_primitives(
        &mut self,
        kind: ComponentKind,
        primitive_begin: u64,
        primitive_end: u64,
        begin: u64,
        end: u64,
        weight: f64,
    ) {
        self.storage_mut(kind).push(SelectionRange {
            primitive_begin,
            primitive_end,
            begin,
            end,
            weight,
        });
    }

    /// Weight the selection assigns to component `index` of `kind` in
    /// `primitive`, or `None` if no range covers it.
    ///
    /// Pass `primitive = 0` for points.
    pub fn weight_at(&self, kind: ComponentKind, primitive: u64, index: u64) -> Option<f64> {
        let storage = self.storage(kind)?;
        storage
            .ranges()
            .filter(|r| match kind {
                ComponentKind::Point => (r.begin..r.end).contains(&index),
                _ => r.covers(primitive, index),
            })
            .last()
            .map(|r| r.weight)
    }

    /// Write this selection's weights into `mesh`.
    ///
    /// Point ranges go to `point_selection` (skipped if the mesh has none).
    /// Edge, face, and vertex ranges go to every `f64` array carrying the
    /// selection role in the like-named structure table of each covered
    /// primitive. Ranges are clamped to the target array.
    pub fn merge_into(&self, mesh: &mut Mesh) {
        for storage in &self.storages {
            match storage.component {
                ComponentKind::Point => {
                    if let Some(weights) = mesh.point_selection.as_mut() {
                        for range in storage.ranges() {
                            fill(weights.as_mut_slice(), &range, "point_selection");
                        }
                    }
                }
                component => merge_primitive_ranges(storage, component, mesh),
            }
        }
    }
}

fn merge_primitive_ranges(storage: &SelectionStorage, component: ComponentKind, mesh: &mut Mesh) {
    let primitive_count: u64 = mesh.primitives.len().as_();
    for range in storage.ranges() {
        let first = range.primitive_begin.min(primitive_count);
        let last = range.primitive_end.max(first).min(primitive_count);
        for primitive in first..last {
            let index: usize = primitive.as_();
            let Some(table) = mesh
                .primitives
                .get_mut(index)
                .and_then(|p| p.structure_mut().get_mut(component.as_str()))
            else {
                continue;
            };
            for (name, array) in table.iter_mut() {
                if array.metadata_value(ROLE_KEY).as_deref() != Some(SELECTION_ROLE) {
                    continue;
                }
                match array.typed_mut::<f64>() {
                    Some(weights) => fill(weights.as_mut_slice(), &range, name),
                    None => log::warn!(
                        "selection: `{name}` has the selection role but holds {}",
                        array.kind()
                    ),
                }
            }
        }
    }
}

fn fill(weights: &mut [f64], range: &SelectionRange, target: &str) {
    let len: u64 = weights.len().as_();
    if range.end != ALL && range.end > len {
        log::warn!(
            "selection: range {}..{} clamped to {len} elements of `{target}`",
            range.begin,
            range.end
        );
    }
    let begin: usize = range.begin.min(len).as_();
    let end: usize = range.end.min(len).as_();
    if begin < end {
        weights[begin..end].fill(range.weight);
    }
}

impl fmt::Display for MeshSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for storage in &self.storages {
            writeln!(f, "{} [{} ranges]", storage.component, storage.len())?;
            write!(f, "{:2}", storage.table())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::value::Point3;

    fn mesh_with_points(n: usize) -> Mesh {
        let mut m = Mesh::new();
        m.create_points().unwrap();
        m.create_point_selection().unwrap();
        for i in 0..n {
            m.add_point(Point3::new(i as f64, 0.0, 0.0));
        }
        m
    }

    #[test]
    fn one_storage_per_kind() {
        let mut s = MeshSelection::new();
        s.append(ComponentKind::Face, 0, 2, 1.0);
        s.append(ComponentKind::Face, 4, 5, 1.0);
        s.append(ComponentKind::Point, 0, 1, 1.0);
        assert_eq!(s.storages().len(), 2);
        assert_eq!(s.storage(ComponentKind::Face).unwrap().len(), 2);
    }

    #[test]
    fn last_range_wins() {
        let mut s = MeshSelection::new();
        s.append(ComponentKind::Point, 0, 10, 1.0);
        s.append(ComponentKind::Point, 3, 5, 0.0);
        assert_eq!(s.weight_at(ComponentKind::Point, 0, 2), Some(1.0));
        assert_eq!(s.weight_at(ComponentKind::Point, 0, 4), Some(0.0));
        assert_eq!(s.weight_at(ComponentKind::Point, 0, 10), None);
        assert_eq!(s.weight_at(ComponentKind::Edge, 0, 0), None);
    }

    #[test]
    fn reversed_range_selects_nothing() {
        let mut m = mesh_with_points(4);
        let mut s = MeshSelection::new();
        s.append(ComponentKind::Point, 3, 1, 1.0);
        s.merge_into(&mut m);
        assert_eq!(m.point_selection().unwrap().as_slice(), &[0.0; 4]);
    }

    #[test]
    fn merge_clamps_to_point_count() {
        let mut m = mesh_with_points(3);
        let mut s = MeshSelection::new();
        s.append(ComponentKind::Point, 1, 100, 0.5);
        s.merge_into(&mut m);
        assert_eq!(m.point_selection().unwrap().as_slice(), &[0.0, 0.5, 0.5]);
    }

    #[test]
    fn select_all_reaches_every_point() {
        let mut m = mesh_with_points(2);
        MeshSelection::select_all(1.0).merge_into(&mut m);
        assert_eq!(m.point_selection().unwrap().as_slice(), &[1.0, 1.0]);
    }

    #[test]
    fn storage_deserialization_checks_columns() {
        let mut s = MeshSelection::new();
        s.append(ComponentKind::Edge, 0, 3, 1.0);
        let json = serde_json::to_value(&s).unwrap();
        let back: MeshSelection = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, s);

        let mut broken = json;
        broken[0]["ranges"].as_array_mut().unwrap().pop();
        assert!(serde_json::from_value::<MeshSelection>(broken).is_err());
    }

    #[test]
    fn every_range_lands_in_every_column() {
        let mut s = MeshSelection::new();
        s.append_in_primitives(ComponentKind::Face, 1, 3, 4, 9, 0.25);
        s.append(ComponentKind::Face, 0, ALL, 1.0);
        let storage = s.storage(ComponentKind::Face).unwrap();
        let table = storage.table();
        assert_eq!(table.row_count(), 2);
        table.validate_cardinality("selection").unwrap();
        assert_eq!(table.array::<u64>("primitive_begin").unwrap().as_slice(), &[1, 0]);
        assert_eq!(table.array::<u64>("index_end").unwrap().as_slice(), &[9, ALL]);
        assert_eq!(table.array::<f64>("weight").unwrap().as_slice(), &[0.25, 1.0]);
        assert_eq!(
            storage.ranges().next(),
            Some(SelectionRange {
                primitive_begin: 1,
                primitive_end: 3,
                begin: 4,
                end: 9,
                weight: 0.25,
            })
        );
    }

    #[test]
    fn storage_rejects_mistyped_column() {
        let mut s = MeshSelection::new();
        s.append(ComponentKind::Point, 0, 2, 1.0);
        let mut json = serde_json::to_value(&s).unwrap();
        let columns = json[0]["ranges"].as_array_mut().unwrap();
        let weight = columns.pop().unwrap();
        let mut renamed = weight.clone();
        renamed[0] = serde_json::Value::from("index_end");
        columns.retain(|c| c[0] != "index_end");
        columns.push(renamed);
        columns.push(weight);
        assert!(serde_json::from_value::<MeshSelection>(json).is_err());
    }
}
