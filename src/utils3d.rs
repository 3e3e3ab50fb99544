//! Flattening of planar 3D rings so they can be triangulated in 2D.

use alloc::vec::Vec;
use num_traits::float::Float;

use crate::predicates::cast;
use crate::{Earcut, Index};

#[inline]
fn cross<T: Float>([ax, ay, az]: [T; 3], [bx, by, bz]: [T; 3]) -> [T; 3] {
    [ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx]
}

/// Newell normal of the ring made of vertices `start..end`, normalized.
///
/// Returns `None` for fewer than 3 vertices, `dim < 3`, or a ring whose normal vanishes.
pub fn normal<T: Float>(data: &[T], dim: usize, start: usize, end: usize) -> Option<[T; 3]> {
    if dim < 3 || end < start + 3 {
        // At least 3 vertices required
        return None;
    }
    let ring = data.get(start * dim..end * dim)?;
    let last = &ring[ring.len() - dim..];
    let last_point = [last[0], last[1], last[2]];

    let (sum, _) = ring.chunks_exact(dim).fold(
        ([T::zero(), T::zero(), T::zero()], last_point),
        |(acc, prev), v| {
            let (x, y, z) = (v[0], v[1], v[2]);
            let c = cross(
                [prev[0] - x, prev[1] - y, prev[2] - z],
                [prev[0] + x, prev[1] + y, prev[2] + z],
            );
            ([acc[0] + c[0], acc[1] + c[1], acc[2] + c[2]], [x, y, z])
        },
    );
    let d = (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt();
    if !(d >= cast(1e-30)) {
        return None;
    }
    Some([sum[0] / d, sum[1] / d, sum[2] / d])
}

/// Rotates the vertices of `data` so that the plane of the first `num_outer` vertices
/// becomes the xy-plane, writing the 2D result to `out_buf`.
///
/// Returns `false` (leaving `out_buf` empty) when that ring has no well-defined normal.
pub fn project3d_to_2d<T: Float>(
    data: &[T],
    dim: usize,
    num_outer: usize,
    out_buf: &mut Vec<[T; 2]>,
) -> bool {
    out_buf.clear();
    let Some([nx, ny, nz]) = normal(data, dim, 0, num_outer) else {
        return false;
    };
    let vertices = data.chunks_exact(dim);

    let dd = (nx * nx + ny * ny).sqrt();
    if dd < cast(1e-15) {
        if nz > T::zero() {
            // do nothing
            out_buf.extend(vertices.map(|v| [v[0], v[1]]))
        } else {
            // flip
            out_buf.extend(vertices.map(|v| [v[1], v[0]]))
        }
    } else {
        // rotate about the axis (-ny, nx, 0) by the angle whose cosine is nz
        let ax = -ny / dd;
        let ay = nx / dd;
        let (cost, sint) = (nz, dd);
        let s = ax * ay * (T::one() - cost);
        let m11 = ax * ax * (T::one() - cost) + cost;
        let m12 = s;
        let m13 = -ay * sint;
        let m21 = s;
        let m22 = ay * ay * (T::one() - cost) + cost;
        let m23 = ax * sint;
        out_buf.extend(vertices.map(|v| {
            let (x, y, z) = (v[0], v[1], v[2]);
            [x * m11 + y * m12 + z * m13, x * m21 + y * m22 + z * m23]
        }))
    }
    true
}

impl<T: Float> Earcut<T> {
    /// Triangulates a planar polygon lying anywhere in 3D space.
    ///
    /// `data` holds `dim >= 3` coordinates per vertex. The polygon is first rotated into
    /// the xy-plane using the normal of its outer ring. Returns `false` and emits no
    /// triangles when that normal is undefined.
    pub fn earcut3d<N: Index>(
        &mut self,
        data: &[T],
        hole_indices: &[N],
        dim: usize,
        triangles_out: &mut Vec<N>,
    ) -> bool {
        triangles_out.clear();
        if dim < 3 {
            return false;
        }
        let len = data.len() / dim;
        let num_outer = hole_indices
            .iter()
            .map(|h| h.into_usize())
            .find(|&h| h > 0 && h < len)
            .unwrap_or(len);
        if !project3d_to_2d(data, dim, num_outer, &mut self.data) {
            log::debug!("ring of {num_outer} vertices has no normal, skipping");
            return false;
        }
        self.triangulate(hole_indices, triangles_out);
        true
    }
}
