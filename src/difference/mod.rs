//! Recursive, tolerance-aware structural comparison.
//!
//! [`Difference`] walks two values of the same type in lockstep and records
//! what it sees in an [`Accumulator`]:
//!
//! - exact kinds (integers, booleans, strings, handles, metadata, kind names)
//!   either match or record an infinite distance;
//! - floating-point kinds record their distance in ULPs (units in the last
//!   place), so bit-identical values are at distance 0;
//! - a substructure present on only one side, or arrays of different length,
//!   record an infinite distance and the walk continues with the siblings.
//!
//! Two structures are *equal* when [`Accumulator::exact_min`] stays `true`,
//! and *similar* within `n` ULPs when [`Accumulator::ulps_max`] is at most `n`.
//!
//! ```
//! use mesh_tables::data::Point3;
//! use mesh_tables::difference;
//! use mesh_tables::mesh::Mesh;
//!
//! let mut a = Mesh::new();
//! a.create_points().unwrap().push(Point3::new(1.0, 2.0, 3.0));
//! let mut b = Mesh::new();
//! b.create_points().unwrap().push(Point3::new(1.0, 2.0, 3.0000001));
//!
//! let result = difference::test(&a, &b);
//! assert!(!result.is_equal());
//! assert!(result.ulps_max() > 0.0 && result.ulps_max().is_finite());
//! ```

use std::fmt;

use crate::mesh::FrozenMesh;
use crate::mesh_error::MeshError;

mod impls;

/// One recorded inequality.
#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    /// Slash-separated location, e.g. `primitives/0/structure/edge/clockwise_edges/4`.
    pub path: String,
    /// Distance in ULPs; infinite for exact-kind or presence mismatches.
    pub ulps: f64,
}

#[derive(Clone, Debug)]
enum Segment {
    Name(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Running result of a comparison.
///
/// A fresh accumulator has `exact_min == true` and `ulps_max == 0`.
#[derive(Clone, Debug)]
pub struct Accumulator {
    exact_min: bool,
    ulps_max: f64,
    mismatches: Vec<Mismatch>,
    path: Vec<Segment>,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            exact_min: true,
            ulps_max: 0.0,
            mismatches: Vec::new(),
            path: Vec::new(),
        }
    }

    /// `true` while every comparison so far was exact.
    pub fn exact_min(&self) -> bool {
        self.exact_min
    }

    /// Largest distance seen so far, in ULPs.
    pub fn ulps_max(&self) -> f64 {
        self.ulps_max
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Structures are identical.
    pub fn is_equal(&self) -> bool {
        self.exact_min
    }

    /// Structures match up to `max_ulps` on every floating-point value.
    pub fn is_similar(&self, max_ulps: f64) -> bool {
        self.ulps_max <= max_ulps
    }

    /// Record an exact comparison.
    pub fn exact(&mut self, equal: bool) {
        if equal {
            return;
        }
        self.record(f64::INFINITY);
    }

    /// Record a floating-point comparison at `distance` ULPs.
    pub fn ulps(&mut self, distance: f64) {
        if distance == 0.0 {
            return;
        }
        self.record(distance);
    }

    /// Record a substructure present on only one side.
    pub fn missing(&mut self, what: &str) {
        self.scoped_name(what, |acc| acc.record(f64::INFINITY));
    }

    /// Run `f` with `name` appended to the current path.
    pub fn scoped_name<R>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(Segment::Name(name.to_string()));
        let result = f(self);
        self.path.pop();
        result
    }

    /// Run `f` with `index` appended to the current path.
    pub fn scoped_index<R>(&mut self, index: usize, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(Segment::Index(index));
        let result = f(self);
        self.path.pop();
        result
    }

    fn record(&mut self, ulps: f64) {
        self.exact_min = false;
        if ulps > self.ulps_max {
            self.ulps_max = ulps;
        }
        let path = self.current_path();
        log::debug!("difference: {path} differs by {ulps} ulps");
        self.mismatches.push(Mismatch { path, ulps });
    }

    fn current_path(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.path.iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            out.push_str(&segment.to_string());
        }
        out
    }
}

impl fmt::Display for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "exact = {}, ulps_max = {}, {} mismatches",
            self.exact_min,
            self.ulps_max,
            self.mismatches.len()
        )?;
        for m in &self.mismatches {
            writeln!(f, "  {}: {} ulps", m.path, m.ulps)?;
        }
        Ok(())
    }
}

/// Types that can be compared structurally.
pub trait Difference {
    /// Compare `self` (the actual value) against `other` (the reference).
    fn difference(&self, other: &Self, acc: &mut Accumulator);
}

/// Distance between two doubles in units in the last place.
///
/// Bit patterns are mapped onto a monotonic integer line so adjacent
/// representable values are 1 apart and `+0.0`/`-0.0` coincide. Two NaNs are
/// at distance 0; NaN against anything else is infinitely far.
pub fn ulps_between(a: f64, b: f64) -> f64 {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => return 0.0,
        (true, false) | (false, true) => return f64::INFINITY,
        _ => {}
    }
    let diff = i128::from(ordered_bits(a)) - i128::from(ordered_bits(b));
    diff.unsigned_abs() as f64
}

fn ordered_bits(x: f64) -> i64 {
    let bits = x.to_bits() as i64;
    if bits < 0 {
        i64::MIN.wrapping_sub(bits)
    } else {
        bits
    }
}

/// Compare `actual` against `reference`, accumulating into `acc`.
pub fn compare<T: Difference + ?Sized>(actual: &T, reference: &T, acc: &mut Accumulator) {
    actual.difference(reference, acc);
}

/// Compare with a fresh accumulator.
pub fn test<T: Difference + ?Sized>(actual: &T, reference: &T) -> Accumulator {
    let mut acc = Accumulator::new();
    compare(actual, reference, &mut acc);
    acc
}

/// Require `actual` to match `reference` within `max_ulps`.
///
/// # Errors
/// `NotSimilar` carrying dumps of both structures, for harnesses to print.
pub fn require_similar<T>(actual: &T, reference: &T, max_ulps: f64) -> Result<Accumulator, MeshError>
where
    T: Difference + fmt::Display + ?Sized,
{
    let acc = test(actual, reference);
    if acc.is_similar(max_ulps) {
        Ok(acc)
    } else {
        Err(MeshError::NotSimilar {
            exact: acc.exact_min(),
            ulps_max: acc.ulps_max(),
            actual: actual.to_string(),
            reference: reference.to_string(),
        })
    }
}

/// Compare independent `(actual, reference)` pairs, in parallel with the
/// `rayon` feature.
pub fn compare_batch(pairs: &[(FrozenMesh, FrozenMesh)]) -> Vec<Accumulator> {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        pairs.par_iter().map(|(a, b)| test(a, b)).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        pairs.iter().map(|(a, b)| test(a, b)).collect()
    }
}
