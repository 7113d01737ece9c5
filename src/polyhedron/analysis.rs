//! Derived lookups over a validated [`Polyhedron`] view.
//!
//! All helpers assume the invariants established by
//! [`validate`](super::validate) and index the view's slices directly.

use num_traits::AsPrimitive;

use crate::data::value::{Normal3, Point3};

use super::{Polyhedron, ShellType};

#[inline]
fn ix(value: u64) -> usize {
    value.as_()
}

impl Polyhedron<'_> {
    /// True if every face's outer loop has exactly three edges.
    pub fn is_triangles(&self) -> bool {
        (0..self.face_count()).all(|face| {
            let outer = ix(self.face_first_loops[face]);
            self.loop_edges(outer).count() == 3
        })
    }

    /// True if the first shell is a Catmull-Clark subdivision cage.
    pub fn is_sds(&self) -> bool {
        self.shell_types
            .first()
            .is_some_and(|&t| ShellType::from_i32(t) == Some(ShellType::CatmullClark))
    }

    /// True if every edge has an opposing companion edge (closed surface).
    pub fn is_solid(&self) -> bool {
        let (boundary, _) = self.edge_adjacency();
        !boundary.contains(&true)
    }

    /// For each edge, the edge whose clockwise successor it is.
    pub fn counterclockwise_edges(&self) -> Vec<u64> {
        let mut result = vec![0; self.edge_count()];
        for (edge, &next) in self.clockwise_edges.iter().enumerate() {
            result[ix(next)] = edge.as_();
        }
        result
    }

    /// Number of edges in each loop.
    pub fn loop_edge_counts(&self) -> Vec<u64> {
        (0..self.loop_count())
            .map(|l| self.loop_edges(l).count().as_())
            .collect()
    }

    /// For each edge, the face that owns it.
    pub fn edge_faces(&self) -> Vec<u64> {
        let mut result = vec![0; self.edge_count()];
        for face in 0..self.face_count() {
            for l in self.face_loops(face) {
                for edge in self.loop_edges(l) {
                    result[edge] = face.as_();
                }
            }
        }
        result
    }

    /// Number of edges starting at each point, for `point_count` points.
    pub fn point_valences(&self, point_count: usize) -> Vec<u64> {
        let mut result = vec![0u64; point_count];
        for &point in self.vertex_points {
            let point = ix(point);
            if point >= result.len() {
                result.resize(point + 1, 0);
            }
            result[point] += 1;
        }
        result
    }

    /// Boundary flags and companion edges.
    ///
    /// An edge `a -> b` is interior if some edge runs `b -> a`; that edge is
    /// its companion. Boundary edges are their own companion.
    pub fn edge_adjacency(&self) -> (Vec<bool>, Vec<u64>) {
        let edge_count = self.edge_count();
        let point_count = self
            .vertex_points
            .iter()
            .max()
            .map_or(0, |&p| ix(p) + 1);
        let mut out_edges: Vec<Vec<usize>> = vec![Vec::new(); point_count];
        for (edge, &point) in self.vertex_points.iter().enumerate() {
            out_edges[ix(point)].push(edge);
        }

        let mut boundary = vec![true; edge_count];
        let mut adjacent: Vec<u64> = (0..edge_count).map(|e| e.as_()).collect();
        for edge in 0..edge_count {
            let from = self.vertex_points[edge];
            let to = self.vertex_points[ix(self.clockwise_edges[edge])];
            let companion = out_edges[ix(to)]
                .iter()
                .copied()
                .find(|&c| self.vertex_points[ix(self.clockwise_edges[c])] == from);
            if let Some(companion) = companion {
                boundary[edge] = false;
                adjacent[edge] = companion.as_();
            }
        }
        (boundary, adjacent)
    }

    /// True for faces with at least one boundary edge.
    pub fn boundary_faces(&self) -> Vec<bool> {
        let (boundary, _) = self.edge_adjacency();
        (0..self.face_count())
            .map(|face| {
                self.face_loops(face)
                    .any(|l| self.loop_edges(l).any(|e| boundary[e]))
            })
            .collect()
    }

    /// Average of the points around the loop containing `edge`.
    ///
    /// `None` if `edge` or any point index on the loop is out of range.
    pub fn center(&self, edge: usize) -> Option<Point3> {
        let mut sum = [0.0; 3];
        let mut count = 0usize;
        for e in self.chain_from(edge)? {
            let p = self.position(e)?;
            for (s, c) in sum.iter_mut().zip(p.0) {
                *s += c;
            }
            count += 1;
        }
        let n: f64 = count.max(1).as_();
        Some(Point3(sum.map(|s| s / n)))
    }

    /// Newell normal of the loop containing `edge`; its length is the loop's area.
    ///
    /// `None` if `edge` or any point index on the loop is out of range.
    pub fn normal(&self, edge: usize) -> Option<Normal3> {
        let mut n = Normal3::default();
        for e in self.chain_from(edge)? {
            let i = self.position(e)?;
            let j = self.position(ix(self.clockwise_edges[e]))?;
            n[0] += (i[1] + j[1]) * (j[2] - i[2]);
            n[1] += (i[2] + j[2]) * (j[0] - i[0]);
            n[2] += (i[0] + j[0]) * (j[1] - i[1]);
        }
        Some(Normal3(n.0.map(|c| 0.5 * c)))
    }

    /// Normal of each face's outer loop, `None` on a dangling point index.
    pub fn face_normals(&self) -> Option<Vec<Normal3>> {
        (0..self.face_count())
            .map(|face| {
                let outer = ix(self.face_first_loops[face]);
                self.normal(ix(self.loop_first_edges[outer]))
            })
            .collect()
    }

    fn position(&self, edge: usize) -> Option<Point3> {
        self.points.get(ix(self.vertex_points[edge])).copied()
    }

    fn chain_from(&self, edge: usize) -> Option<impl Iterator<Item = usize> + '_> {
        if edge >= self.edge_count() {
            return None;
        }
        let first = edge;
        Some(std::iter::successors(Some(edge), move |&e| {
            let next = ix(self.clockwise_edges[e]);
            (next != first).then_some(next)
        }))
    }
}
