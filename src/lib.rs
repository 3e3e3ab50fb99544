//! Polygon and point-set triangulation.
//!
//! - [`Earcut`] is a port of the [Earcut](https://github.com/mapbox/earcut) ear slicing
//!   algorithm for simple polygons with holes.
//! - [`Delaunator`](delaunay::Delaunator) is an incremental sweep-hull Delaunay
//!   triangulator in the style of [Delaunator](https://github.com/mapbox/delaunator),
//!   with [Voronoi cells](voronoi) derived from its half-edges.

#![no_std]

extern crate alloc;

mod earcut;
mod linked;
mod predicates;

pub mod delaunay;
pub mod utils3d;
pub mod voronoi;

use alloc::vec::Vec;
use num_traits::float::Float;

pub use delaunay::{DelaunayError, Delaunator, EMPTY};
pub use earcut::Earcut;
pub use voronoi::VoronoiCell;

use crate::earcut::{hole_ranges, sanitize_holes};
use crate::predicates::signed_area;

/// Index of a vertex
pub trait Index: Copy {
    fn into_usize(self) -> usize;
    fn from_usize(v: usize) -> Self;
}
impl Index for u32 {
    fn into_usize(self) -> usize {
        self as usize
    }
    fn from_usize(v: usize) -> Self {
        v as Self
    }
}
impl Index for u16 {
    fn into_usize(self) -> usize {
        self as usize
    }
    fn from_usize(v: usize) -> Self {
        v as Self
    }
}
impl Index for usize {
    fn into_usize(self) -> usize {
        self
    }
    fn from_usize(v: usize) -> Self {
        v as Self
    }
}

/// Returns a percentage difference between the polygon area and its triangulation area;
/// used to verify correctness of triangulation
pub fn deviation<T: Float, N: Index>(data: &[T], hole_indices: &[N], dim: usize, triangles: &[N]) -> T {
    if dim < 2 {
        return T::zero();
    }
    let data: Vec<[T; 2]> = data.chunks_exact(dim).map(|v| [v[0], v[1]]).collect();
    let mut holes = Vec::new();
    sanitize_holes(hole_indices, data.len(), &mut holes);
    let outer_len = holes.first().copied().unwrap_or(data.len());

    let polygon_area = hole_ranges(&holes, data.len()).fold(
        signed_area(&data[..outer_len]).abs(),
        |area, range| area - signed_area(&data[range]).abs(),
    );

    let triangles_area = triangles
        .chunks_exact(3)
        .filter_map(|t| {
            let [a, b, c] = [t[0], t[1], t[2]].map(|i| data.get(i.into_usize()));
            Some((*a?, *b?, *c?))
        })
        .fold(T::zero(), |sum, (a, b, c)| {
            sum + ((a[0] - c[0]) * (b[1] - a[1]) - (a[0] - b[0]) * (c[1] - a[1])).abs()
        });

    if polygon_area == T::zero() && triangles_area == T::zero() {
        T::zero()
    } else {
        ((polygon_area - triangles_area) / polygon_area).abs()
    }
}

/// Flattens nested rings (outer ring first, then holes) into the flat coordinate
/// and hole-offset form accepted by [`Earcut::earcut`].
///
/// ```
/// let (data, holes) = triangulum::flatten(&[
///     vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
///     vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]],
/// ]);
/// assert_eq!(data.len(), 16);
/// assert_eq!(holes, vec![4]);
/// ```
pub fn flatten<T: Copy, const D: usize, R: AsRef<[[T; D]]>>(rings: &[R]) -> (Vec<T>, Vec<usize>) {
    let mut data = Vec::with_capacity(rings.iter().map(|r| r.as_ref().len() * D).sum());
    let mut hole_indices = Vec::with_capacity(rings.len().saturating_sub(1));
    let mut offset = 0;
    for (k, ring) in rings.iter().enumerate() {
        if k > 0 {
            hole_indices.push(offset);
        }
        let ring = ring.as_ref();
        data.extend(ring.iter().flatten().copied());
        offset += ring.len();
    }
    (data, hole_indices)
}
