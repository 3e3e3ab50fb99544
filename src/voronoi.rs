//! Voronoi cells derived from a Delaunay triangulation.
//!
//! The cell of a point is the polygon of circumcenters of the triangles around it,
//! visited by walking the half-edges that end at the point.

use alloc::vec;
use alloc::vec::Vec;
use num_traits::float::Float;

use crate::delaunay::{next_halfedge, triangle_of_edge, Delaunator, EMPTY};

/// Iterates over the half-edges ending at a point, moving from triangle to adjacent triangle.
///
/// Produced by [`Delaunator::edges_around_point`].
pub struct EdgesAroundPoint<'a> {
    halfedges: &'a [usize],
    start: usize,
    cur: Option<usize>,
}

impl Iterator for EdgesAroundPoint<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let incoming = self.cur?;
        let next = self.halfedges[next_halfedge(incoming)];
        self.cur = (next != EMPTY && next != self.start).then_some(next);
        Some(incoming)
    }
}

/// A Voronoi cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoronoiCell<T> {
    /// The input point this cell belongs to.
    pub point: usize,
    /// Circumcenters of the triangles around the point, in traversal order.
    pub vertices: Vec<[T; 2]>,
    /// `false` for points on the convex hull, whose cells extend to infinity.
    /// Their `vertices` then only cover the finite part.
    pub bounded: bool,
}

impl<T: Float> VoronoiCell<T> {
    /// Doubled signed area of the cell polygon.
    fn cross_sum(&self) -> T {
        self.edges()
            .fold(T::zero(), |sum, (a, b)| sum + (a[0] * b[1] - b[0] * a[1]))
    }

    fn edges(&self) -> impl Iterator<Item = ([T; 2], [T; 2])> + '_ {
        let shifted = self.vertices.iter().cycle().skip(1);
        self.vertices.iter().copied().zip(shifted.copied())
    }

    pub fn area(&self) -> T {
        if self.vertices.len() < 3 {
            return T::zero();
        }
        (self.cross_sum() / (T::one() + T::one())).abs()
    }

    /// Area-weighted centroid of the cell polygon; `None` if it has no area.
    pub fn centroid(&self) -> Option<[T; 2]> {
        if self.vertices.len() < 3 {
            return None;
        }
        let (cx, cy, a) = self.edges().fold(
            (T::zero(), T::zero(), T::zero()),
            |(cx, cy, a), (p, q)| {
                let cross = p[0] * q[1] - q[0] * p[1];
                (cx + (p[0] + q[0]) * cross, cy + (p[1] + q[1]) * cross, a + cross)
            },
        );
        if a == T::zero() {
            return None;
        }
        let three = T::one() + T::one() + T::one();
        Some([cx / (three * a), cy / (three * a)])
    }
}

/// Lazily computes the cells of every point that is part of the triangulation.
///
/// Produced by [`Delaunator::voronoi_cells`].
pub struct VoronoiCells<'a, T> {
    delaunay: &'a Delaunator<T>,
    inedges: Vec<usize>,
    point: usize,
}

impl<T: Float> Iterator for VoronoiCells<'_, T> {
    type Item = VoronoiCell<T>;

    fn next(&mut self) -> Option<VoronoiCell<T>> {
        while let Some(&e) = self.inedges.get(self.point) {
            let point = self.point;
            self.point += 1;
            if e != EMPTY {
                return Some(self.delaunay.cell_around(point, e));
            }
        }
        None
    }
}

impl<T: Float> Delaunator<T> {
    /// One half-edge ending at each point, or [`EMPTY`] for points left out of the
    /// triangulation as duplicates.
    ///
    /// Points on the hull get their incoming hull edge, so walking around them from it
    /// visits every incident triangle.
    pub fn inedges(&self) -> Vec<usize> {
        let mut inedges = vec![EMPTY; self.points().len()];
        for (e, &twin) in self.halfedges.iter().enumerate() {
            let p = self.triangles[next_halfedge(e)];
            if twin == EMPTY || inedges[p] == EMPTY {
                inedges[p] = e;
            }
        }
        inedges
    }

    /// Half-edges ending at the same point as `start`, beginning with `start` itself.
    pub fn edges_around_point(&self, start: usize) -> EdgesAroundPoint<'_> {
        EdgesAroundPoint {
            halfedges: &self.halfedges,
            start,
            cur: (start != EMPTY).then_some(start),
        }
    }

    pub fn voronoi_cells(&self) -> VoronoiCells<'_, T> {
        VoronoiCells {
            delaunay: self,
            inedges: self.inedges(),
            point: 0,
        }
    }

    /// The cell of a single point, `None` if the point is not part of the triangulation.
    ///
    /// Each call scans all half-edges; use [`Delaunator::voronoi_cells`] for many cells.
    pub fn voronoi_cell(&self, point: usize) -> Option<VoronoiCell<T>> {
        let e = *self.inedges().get(point)?;
        (e != EMPTY).then(|| self.cell_around(point, e))
    }

    fn cell_around(&self, point: usize, inedge: usize) -> VoronoiCell<T> {
        VoronoiCell {
            point,
            vertices: self
                .edges_around_point(inedge)
                .map(|e| self.circumcenter(triangle_of_edge(e)))
                .collect(),
            bounded: self.halfedges[inedge] != EMPTY,
        }
    }
}
