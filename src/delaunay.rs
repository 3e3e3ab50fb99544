//! Incremental sweep-hull Delaunay triangulation.
//!
//! Points are inserted in order of distance from the circumcenter of a seed triangle.
//! Each insertion fans new triangles out to the visible part of the convex hull and then
//! flips edges until the Delaunay condition holds again.
//!
//! ```
//! use triangulum::Delaunator;
//!
//! let d = Delaunator::from_points(&[[0., 0.], [1., 0.], [1., 1.], [0., 1.]]).unwrap();
//! assert_eq!(d.triangles, vec![0, 2, 1, 0, 3, 2]);
//! assert_eq!(d.hull, vec![0, 3, 2, 1]);
//! ```

use alloc::vec;
use alloc::vec::Vec;
use num_traits::float::Float;
use thiserror::Error;

use crate::predicates::{cast, circumcenter, circumradius2, dist2, in_circle, orient};

/// Marks a half-edge without a twin, i.e. an edge on the convex hull.
pub const EMPTY: usize = usize::MAX;

/// Initial capacity of the stack of edges waiting to be legalized. It grows on demand.
pub const EDGE_STACK_CAPACITY: usize = 512;

/// Points whose coordinates both differ by no more than this (twice the machine
/// epsilon) from the previously inserted point are skipped.
#[inline]
pub fn epsilon<T: Float>() -> T {
    T::epsilon() + T::epsilon()
}

/// Largest accepted coordinate magnitude.
///
/// The in-circle test multiplies four coordinate differences, so larger inputs would
/// overflow to infinity. About `1.4e76` for `f64` and `1.7e8` for `f32`.
#[inline]
pub fn max_coordinate<T: Float>() -> T {
    T::max_value().sqrt().sqrt() / cast(8.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelaunayError {
    /// Fewer than three points were given.
    #[error("at least 3 points are required, found {found}")]
    NotEnoughPoints { found: usize },

    /// No three points form a triangle with a finite circumcircle.
    #[error("all points are collinear or coincident")]
    Collinear,

    #[error("point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },

    /// A coordinate exceeds [`max_coordinate`] in magnitude.
    #[error("point {index} has a coordinate too large to triangulate")]
    CoordinateTooLarge { index: usize },
}

/// Next half-edge in the same triangle.
#[inline]
pub fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

/// Previous half-edge in the same triangle.
#[inline]
pub fn prev_halfedge(e: usize) -> usize {
    if e % 3 == 0 {
        e + 2
    } else {
        e - 1
    }
}

#[inline]
pub fn triangle_of_edge(e: usize) -> usize {
    e / 3
}

#[inline]
pub fn edges_of_triangle(t: usize) -> [usize; 3] {
    [3 * t, 3 * t + 1, 3 * t + 2]
}

/// Result of a Delaunay triangulation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delaunator<T> {
    points: Vec<[T; 2]>,

    /// Point indices, three per triangle. Half-edge `e` starts at point `triangles[e]`.
    pub triangles: Vec<usize>,

    /// Twin of each half-edge in the adjacent triangle, or [`EMPTY`] on the hull.
    pub halfedges: Vec<usize>,

    /// Point indices of the convex hull, starting from the last point that was added to it.
    pub hull: Vec<usize>,
}

impl<T: Float> Delaunator<T> {
    /// Triangulates flat `[x0, y0, x1, y1, ...]` coordinates.
    pub fn new(coords: &[T]) -> Result<Self, DelaunayError> {
        Self::build(coords.chunks_exact(2).map(|c| [c[0], c[1]]).collect())
    }

    pub fn from_points(points: &[[T; 2]]) -> Result<Self, DelaunayError> {
        Self::build(points.to_vec())
    }

    fn build(points: Vec<[T; 2]>) -> Result<Self, DelaunayError> {
        let n = points.len();
        if n < 3 {
            return Err(DelaunayError::NotEnoughPoints { found: n });
        }
        if let Some(index) = points
            .iter()
            .position(|&[x, y]| !(x.is_finite() && y.is_finite()))
        {
            return Err(DelaunayError::NonFiniteCoordinate { index });
        }
        let limit = max_coordinate::<T>();
        if let Some(index) = points
            .iter()
            .position(|&[x, y]| x.abs() > limit || y.abs() > limit)
        {
            return Err(DelaunayError::CoordinateTooLarge { index });
        }

        let [i0, i1, i2] = find_seed_triangle(&points).ok_or(DelaunayError::Collinear)?;
        let center = circumcenter(&points[i0], &points[i1], &points[i2]);

        // sort the points by distance from the seed triangle circumcenter
        let dists: Vec<T> = points.iter().map(|p| dist2(p, &center)).collect();
        let mut ids: Vec<usize> = (0..n).collect();
        quicksort(&mut ids, &dists, 0, n - 1);

        let mut hull = Hull::new(n, center, [i0, i1, i2], &points);
        let mut mesh = Mesh::with_capacity(n);
        mesh.add_triangle(i0, i1, i2, EMPTY, EMPTY, EMPTY);

        let eps = epsilon::<T>();
        let mut last: Option<[T; 2]> = None;
        let mut skipped = 0;

        for &i in &ids {
            let p = points[i];

            // skip near-duplicate points
            if let Some([xp, yp]) = last {
                if (p[0] - xp).abs() <= eps && (p[1] - yp).abs() <= eps {
                    skipped += 1;
                    continue;
                }
            }
            last = Some(p);

            // skip seed triangle points
            if i == i0 || i == i1 || i == i2 {
                continue;
            }

            // find a visible edge on the convex hull using edge hash
            let Some((mut e, walk_back)) = hull.find_visible_edge(&p, &points) else {
                // likely a near-duplicate point
                skipped += 1;
                continue;
            };

            // add the first triangle from the point
            let t = mesh.add_triangle(e, i, hull.next[e], EMPTY, EMPTY, hull.tri[e]);

            // flip triangles from the point until they satisfy the Delaunay condition
            let tri = mesh.legalize(t + 2, &points, &mut hull);
            hull.tri[i] = tri;
            hull.tri[e] = t; // keep track of boundary triangles on the hull

            // walk forward through the hull, adding more triangles and flipping
            let mut n = hull.next[e];
            loop {
                let q = hull.next[n];
                if !orient(&p, &points[n], &points[q]) {
                    break;
                }
                let t = mesh.add_triangle(n, i, q, hull.tri[i], EMPTY, hull.tri[n]);
                let tri = mesh.legalize(t + 2, &points, &mut hull);
                hull.tri[i] = tri;
                hull.remove(n);
                n = q;
            }

            // walk backward from the other side, adding more triangles and flipping
            if walk_back {
                loop {
                    let q = hull.prev[e];
                    if !orient(&p, &points[q], &points[e]) {
                        break;
                    }
                    let t = mesh.add_triangle(q, i, e, EMPTY, hull.tri[e], hull.tri[q]);
                    mesh.legalize(t + 2, &points, &mut hull);
                    hull.tri[q] = t;
                    hull.remove(e);
                    e = q;
                }
            }

            // update the hull indices
            hull.start = e;
            hull.prev[i] = e;
            hull.next[e] = i;
            hull.prev[n] = i;
            hull.next[i] = n;

            // save the two new edges in the hash table
            hull.hash_edge(&p, i);
            hull.hash_edge(&points[e], e);
        }

        if skipped > 0 {
            log::debug!("skipped {skipped} near-duplicate points out of {n}");
        }

        let hull = hull.points();
        let Mesh {
            mut triangles,
            mut halfedges,
            ..
        } = mesh;
        triangles.shrink_to_fit();
        halfedges.shrink_to_fit();

        Ok(Self {
            points,
            triangles,
            halfedges,
            hull,
        })
    }

    /// The number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The input points.
    pub fn points(&self) -> &[[T; 2]] {
        &self.points
    }

    pub fn points_of_triangle(&self, t: usize) -> [usize; 3] {
        edges_of_triangle(t).map(|e| self.triangles[e])
    }

    /// Triangles sharing an edge with triangle `t`.
    pub fn triangles_adjacent_to_triangle(&self, t: usize) -> impl Iterator<Item = usize> + '_ {
        edges_of_triangle(t).into_iter().filter_map(|e| {
            let opposite = self.halfedges[e];
            (opposite != EMPTY).then(|| triangle_of_edge(opposite))
        })
    }

    /// Circumcenter of triangle `t`, which is a vertex of the Voronoi diagram.
    pub fn circumcenter(&self, t: usize) -> [T; 2] {
        let [a, b, c] = self.points_of_triangle(t).map(|i| self.points[i]);
        circumcenter(&a, &b, &c)
    }
}

/// triangles and half-edges under construction
struct Mesh {
    triangles: Vec<usize>,
    halfedges: Vec<usize>,
    edge_stack: Vec<usize>,
}

impl Mesh {
    fn with_capacity(n: usize) -> Self {
        let max_triangles = (2 * n).saturating_sub(5).max(1);
        Self {
            triangles: Vec::with_capacity(max_triangles * 3),
            halfedges: Vec::with_capacity(max_triangles * 3),
            edge_stack: Vec::with_capacity(EDGE_STACK_CAPACITY),
        }
    }

    fn link(&mut self, a: usize, b: usize) {
        self.halfedges[a] = b;
        if b != EMPTY {
            self.halfedges[b] = a;
        }
    }

    fn add_triangle(&mut self, i0: usize, i1: usize, i2: usize, a: usize, b: usize, c: usize) -> usize {
        let t = self.triangles.len();
        self.triangles.extend([i0, i1, i2]);
        self.halfedges.extend([EMPTY; 3]);
        self.link(t, a);
        self.link(t + 1, b);
        self.link(t + 2, c);
        t
    }

    /// Flips edges starting from `a` until the triangles around it are locally Delaunay.
    ///
    /// Returns the half-edge that ends up opposite the inserted point on the hull side.
    fn legalize<T: Float>(&mut self, mut a: usize, points: &[[T; 2]], hull: &mut Hull<T>) -> usize {
        let mut ar;

        // if the pair of triangles doesn't satisfy the Delaunay condition
        // (p1 is inside the circumcircle of [p0, pl, pr]), flip them,
        // then do the same check/flip for the new pair of triangles
        //
        //           pl                    pl
        //          /||\                  /  \
        //       al/ || \bl            al/    \a
        //        /  ||  \              /      \
        //       /  a||b  \    flip    /___ar___\
        //     p0\   ||   /p1   =>   p0\---bl---/p1
        //        \  ||  /              \      /
        //       ar\ || /br             b\    /br
        //          \||/                  \  /
        //           pr                    pr
        //
        loop {
            let b = self.halfedges[a];
            let a0 = a - a % 3;
            ar = a0 + (a + 2) % 3;

            if b == EMPTY {
                // convex hull edge
                match self.edge_stack.pop() {
                    Some(e) => a = e,
                    None => break,
                }
                continue;
            }

            let b0 = b - b % 3;
            let al = a0 + (a + 1) % 3;
            let bl = b0 + (b + 2) % 3;

            let p0 = self.triangles[ar];
            let pr = self.triangles[a];
            let pl = self.triangles[al];
            let p1 = self.triangles[bl];

            if in_circle(&points[p0], &points[pr], &points[pl], &points[p1]) {
                self.triangles[a] = p1;
                self.triangles[b] = p0;

                let hbl = self.halfedges[bl];

                // edge swapped on the other side of the hull (rare); fix the halfedge reference
                if hbl == EMPTY {
                    hull.replace_tri(bl, a);
                }
                let har = self.halfedges[ar];
                self.link(a, hbl);
                self.link(b, har);
                self.link(ar, bl);

                self.edge_stack.push(b0 + (b + 1) % 3);
            } else {
                match self.edge_stack.pop() {
                    Some(e) => a = e,
                    None => break,
                }
            }
        }
        ar
    }
}

/// the advancing convex hull, as a doubly linked list over point indices
struct Hull<T> {
    prev: Vec<usize>,
    next: Vec<usize>,
    /// hull point to the half-edge of its boundary triangle
    tri: Vec<usize>,
    /// angular hash of hull points around `center`
    hash: Vec<usize>,
    start: usize,
    center: [T; 2],
}

impl<T: Float> Hull<T> {
    fn new(n: usize, center: [T; 2], [i0, i1, i2]: [usize; 3], points: &[[T; 2]]) -> Self {
        let hash_len = cast::<T, _>(n).sqrt().ceil().to_usize().unwrap_or(1).max(1);

        let mut hull = Self {
            prev: vec![0; n],
            next: vec![0; n],
            tri: vec![0; n],
            hash: vec![EMPTY; hash_len],
            start: i0,
            center,
        };

        hull.next[i0] = i1;
        hull.prev[i2] = i1;
        hull.next[i1] = i2;
        hull.prev[i0] = i2;
        hull.next[i2] = i0;
        hull.prev[i1] = i0;

        hull.tri[i0] = 0;
        hull.tri[i1] = 1;
        hull.tri[i2] = 2;

        for i in [i0, i1, i2] {
            hull.hash_edge(&points[i], i);
        }
        hull
    }

    /// mark as removed
    #[inline]
    fn remove(&mut self, i: usize) {
        self.next[i] = i;
    }

    fn hash_key(&self, p: &[T; 2]) -> usize {
        let len = self.hash.len();
        let angle = pseudo_angle(p[0] - self.center[0], p[1] - self.center[1]);
        (cast::<T, _>(len) * angle).floor().to_usize().unwrap_or(0) % len
    }

    fn hash_edge(&mut self, p: &[T; 2], i: usize) {
        let key = self.hash_key(p);
        self.hash[key] = i;
    }

    /// First hull edge visible from `p`, and whether the walk started right at it
    /// (in which case edges before it may be visible too).
    fn find_visible_edge(&self, p: &[T; 2], points: &[[T; 2]]) -> Option<(usize, bool)> {
        let len = self.hash.len();
        let key = self.hash_key(p);
        let start = (0..len)
            .map(|j| self.hash[(key + j) % len])
            .find(|&s| s != EMPTY && self.next[s] != s)
            .unwrap_or(self.start);

        let start = self.prev[start];
        let mut e = start;
        loop {
            let q = self.next[e];
            if orient(p, &points[e], &points[q]) {
                return Some((e, e == start));
            }
            e = q;
            if e == start {
                return None;
            }
        }
    }

    fn replace_tri(&mut self, old: usize, new: usize) {
        let mut e = self.start;
        loop {
            if self.tri[e] == old {
                self.tri[e] = new;
                return;
            }
            e = self.prev[e];
            if e == self.start {
                return;
            }
        }
    }

    fn points(&self) -> Vec<usize> {
        let mut hull = Vec::new();
        let mut e = self.start;
        loop {
            hull.push(e);
            e = self.next[e];
            if e == self.start {
                return hull;
            }
        }
    }
}

/// monotonically increases with real angle, but doesn't need expensive trigonometry
fn pseudo_angle<T: Float>(dx: T, dy: T) -> T {
    let p = dx / (dx.abs() + dy.abs());
    let four = cast::<T, _>(4.0);
    if dy > T::zero() {
        (cast::<T, _>(3.0) - p) / four
    } else {
        (T::one() + p) / four
    }
}

/// index of the first point closest to `target` among those accepted by `filter`
fn nearest<T: Float>(
    points: &[[T; 2]],
    target: &[T; 2],
    filter: impl Fn(usize, T) -> bool,
) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, dist2(target, p)))
        .filter(|&(i, d)| filter(i, d))
        .fold(None, |best: Option<(usize, T)>, (i, d)| match best {
            Some((_, min)) if !(d < min) => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

fn find_seed_triangle<T: Float>(points: &[[T; 2]]) -> Option<[usize; 3]> {
    let (&first, rest) = points.split_first()?;
    let [min_x, min_y, max_x, max_y] = rest.iter().fold(
        [first[0], first[1], first[0], first[1]],
        |[x0, y0, x1, y1], &[x, y]| [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
    );
    let two = T::one() + T::one();
    let center = [(min_x + max_x) / two, (min_y + max_y) / two];

    // pick a seed point close to the center
    let i0 = nearest(points, &center, |_, _| true)?;

    // find the point closest to the seed
    let i1 = nearest(points, &points[i0], |i, d| i != i0 && d > T::zero())?;

    // find the third point which forms the smallest circumcircle with the first two
    let (a, b) = (&points[i0], &points[i1]);
    let (i2, _) = points
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != i0 && i != i1)
        .map(|(i, p)| (i, circumradius2(a, b, p)))
        .fold((None, T::infinity()), |(best, min), (i, r)| {
            if r < min {
                (Some(i), r)
            } else {
                (best, min)
            }
        });
    let i2 = i2?;

    // swap the order of the seed points for counter-clockwise orientation
    if orient(a, b, &points[i2]) {
        Some([i0, i2, i1])
    } else {
        Some([i0, i1, i2])
    }
}

/// sorts `ids` by `dists[id]` in place, within `left..=right`
fn quicksort<T: Float>(ids: &mut [usize], dists: &[T], left: usize, right: usize) {
    if right - left <= 20 {
        for i in (left + 1)..=right {
            let temp = ids[i];
            let temp_dist = dists[temp];
            let mut j = i;
            while j > left && dists[ids[j - 1]] > temp_dist {
                ids[j] = ids[j - 1];
                j -= 1;
            }
            ids[j] = temp;
        }
        return;
    }

    let median = (left + right) >> 1;
    let mut i = left + 1;
    let mut j = right;
    ids.swap(median, i);
    if dists[ids[left]] > dists[ids[right]] {
        ids.swap(left, right);
    }
    if dists[ids[i]] > dists[ids[right]] {
        ids.swap(i, right);
    }
    if dists[ids[left]] > dists[ids[i]] {
        ids.swap(left, i);
    }

    let temp = ids[i];
    let temp_dist = dists[temp];
    loop {
        i += 1;
        while dists[ids[i]] < temp_dist {
            i += 1;
        }
        j -= 1;
        while dists[ids[j]] > temp_dist {
            j -= 1;
        }
        if j < i {
            break;
        }
        ids.swap(i, j);
    }
    ids[left + 1] = ids[j];
    ids[j] = temp;

    if right + 1 - i >= j - left {
        quicksort(ids, dists, i, right);
        quicksort(ids, dists, left, j - 1);
    } else {
        quicksort(ids, dists, left, j - 1);
        quicksort(ids, dists, i, right);
    }
}
