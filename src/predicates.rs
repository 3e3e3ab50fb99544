//! Orientation, containment and circle predicates shared by both triangulators.

use num_traits::float::Float;
use num_traits::ToPrimitive;

/// Anything carrying a planar position.
pub(crate) trait Coord<T> {
    fn x(&self) -> T;
    fn y(&self) -> T;
}

impl<T: Float> Coord<T> for [T; 2] {
    #[inline(always)]
    fn x(&self) -> T {
        self[0]
    }
    #[inline(always)]
    fn y(&self) -> T {
        self[1]
    }
}

/// Converts a primitive constant into `T`.
#[inline]
pub(crate) fn cast<T: Float, V: ToPrimitive>(v: V) -> T {
    T::from(v).unwrap_or_else(T::nan)
}

/// signed area of a triangle (doubled); negative for the winding earcut treats as convex
#[inline]
pub(crate) fn area<T: Float>(p: &impl Coord<T>, q: &impl Coord<T>, r: &impl Coord<T>) -> T {
    (q.y() - p.y()) * (r.x() - q.x()) - (q.x() - p.x()) * (r.y() - q.y())
}

/// doubled signed area of a closed ring
pub(crate) fn signed_area<T: Float>(ring: &[[T; 2]]) -> T {
    let Some(&[last_x, last_y]) = ring.last() else {
        return T::zero();
    };
    let (mut bx, mut by) = (last_x, last_y);
    let mut sum = T::zero();
    for &[ax, ay] in ring {
        sum = sum + (bx - ax) * (ay + by);
        (bx, by) = (ax, ay);
    }
    sum
}

/// check if a point lies within a convex triangle
#[inline]
pub(crate) fn point_in_triangle<T: Float>(
    a: &impl Coord<T>,
    b: &impl Coord<T>,
    c: &impl Coord<T>,
    p: &impl Coord<T>,
) -> bool {
    let (px, py) = (p.x(), p.y());
    (c.x() - px) * (a.y() - py) >= (a.x() - px) * (c.y() - py)
        && (a.x() - px) * (b.y() - py) >= (b.x() - px) * (a.y() - py)
        && (b.x() - px) * (c.y() - py) >= (c.x() - px) * (b.y() - py)
}

/// check if two points are equal
#[inline]
pub(crate) fn equals<T: Float>(p1: &impl Coord<T>, p2: &impl Coord<T>) -> bool {
    p1.x() == p2.x() && p1.y() == p2.y()
}

/// for collinear points p, q, r, check if point q lies on segment pr
#[inline]
fn on_segment<T: Float>(p: &impl Coord<T>, q: &impl Coord<T>, r: &impl Coord<T>) -> bool {
    q.x() <= p.x().max(r.x())
        && q.x() >= p.x().min(r.x())
        && q.y() <= p.y().max(r.y())
        && q.y() >= p.y().min(r.y())
}

#[inline]
fn sign<T: Float>(v: T) -> i32 {
    (v > T::zero()) as i32 - (v < T::zero()) as i32
}

/// check if two segments intersect
pub(crate) fn intersects<T: Float, P: Coord<T>>(p1: &P, q1: &P, p2: &P, q2: &P) -> bool {
    let o1 = sign(area(p1, q1, p2));
    let o2 = sign(area(p1, q1, q2));
    let o3 = sign(area(p2, q2, p1));
    let o4 = sign(area(p2, q2, q1));
    (o1 != o2 && o3 != o4) // general case
        || (o3 == 0 && on_segment(p2, p1, q2)) // p2, q2 and p1 are collinear and p1 lies on p2q2
        || (o4 == 0 && on_segment(p2, q1, q2)) // p2, q2 and q1 are collinear and q1 lies on p2q2
        || (o2 == 0 && on_segment(p1, q2, q1)) // p1, q1 and q2 are collinear and q2 lies on p1q1
        || (o1 == 0 && on_segment(p1, p2, q1)) // p1, q1 and p2 are collinear and p2 lies on p1q1
}

/// whether `r` is strictly to the visible side of the directed edge `p -> q`
#[inline]
pub(crate) fn orient<T: Float>(p: &[T; 2], q: &[T; 2], r: &[T; 2]) -> bool {
    area(p, q, r) < T::zero()
}

#[inline]
pub(crate) fn dist2<T: Float>(a: &[T; 2], b: &[T; 2]) -> T {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// offset of the circumcenter of `abc` from `a`
#[inline]
fn circumdelta<T: Float>(a: &[T; 2], b: &[T; 2], c: &[T; 2]) -> [T; 2] {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let ex = c[0] - a[0];
    let ey = c[1] - a[1];

    let bl = dx * dx + dy * dy;
    let cl = ex * ex + ey * ey;
    let d = cast::<T, _>(0.5) / (dx * ey - dy * ex);

    [(ey * bl - dy * cl) * d, (dx * cl - ex * bl) * d]
}

/// squared circumradius; infinite or NaN for collinear points
#[inline]
pub(crate) fn circumradius2<T: Float>(a: &[T; 2], b: &[T; 2], c: &[T; 2]) -> T {
    let [x, y] = circumdelta(a, b, c);
    x * x + y * y
}

#[inline]
pub(crate) fn circumcenter<T: Float>(a: &[T; 2], b: &[T; 2], c: &[T; 2]) -> [T; 2] {
    let [x, y] = circumdelta(a, b, c);
    [a[0] + x, a[1] + y]
}

/// whether `p` lies strictly inside the circumcircle of `abc`
#[inline]
pub(crate) fn in_circle<T: Float>(a: &[T; 2], b: &[T; 2], c: &[T; 2], p: &[T; 2]) -> bool {
    let dx = a[0] - p[0];
    let dy = a[1] - p[1];
    let ex = b[0] - p[0];
    let ey = b[1] - p[1];
    let fx = c[0] - p[0];
    let fy = c[1] - p[1];

    let ap = dx * dx + dy * dy;
    let bp = ex * ex + ey * ey;
    let cp = fx * fx + fy * fy;

    dx * (ey * cp - bp * fy) - dy * (ex * cp - bp * fx) + ap * (ex * fy - ey * fx) < T::zero()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_on_segment_uses_both_bounds() {
        // vertical segment: q.y must fall between the endpoints
        assert!(on_segment(&[0.0, 0.0], &[0.0, 1.0], &[0.0, 2.0]));
        assert!(!on_segment(&[0.0, 0.0], &[0.0, 3.0], &[0.0, 2.0]));
    }

    #[test]
    fn test_touching_segments_intersect() {
        assert!(intersects(&[0.0, 0.0], &[2.0, 0.0], &[1.0, 0.0], &[1.0, 1.0]));
        assert!(!intersects(&[0.0, 0.0], &[2.0, 0.0], &[0.0, 1.0], &[2.0, 1.0]));
    }

    #[test]
    fn test_circumcircle() {
        let (a, b, c) = ([0.0, 0.0], [2.0, 0.0], [0.0, 2.0]);
        assert_eq!(circumcenter(&a, &b, &c), [1.0, 1.0]);
        assert_eq!(circumradius2(&a, &b, &c), 2.0);
        assert!(!circumradius2(&a, &b, &[4.0, 0.0]).is_finite());
    }

    #[test]
    fn test_in_circle_is_strict() {
        let (a, b, c) = ([0.0, 1.0], [1.0, 1.0], [0.0, 0.0]);
        assert!(!in_circle(&a, &b, &c, &[1.0, 0.0]));
        assert!(in_circle(&a, &b, &c, &[0.9, 0.1]));
    }

    #[test]
    fn test_signed_area() {
        let ring = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert_eq!(signed_area(&ring).abs(), 2.0);
        assert_eq!(signed_area::<f64>(&[]), 0.0);
    }
}
