//! Ear slicing of a polygon with holes.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ops::Range;
use num_traits::float::Float;

use crate::linked::{Node, NodeIndex, Nodes, ZOrder};
use crate::predicates::{area, equals, intersects, point_in_triangle, signed_area};
use crate::Index;

/// Above this many vertices, ear tests only scan a z-order neighbourhood.
const Z_ORDER_THRESHOLD: usize = 80;

/// Instance of the earcut algorithm.
pub struct Earcut<T: Float> {
    pub(crate) data: Vec<[T; 2]>,
    nodes: Nodes<T>,
    holes: Vec<usize>,
    queue: Vec<NodeIndex>,
}

impl<T: Float> Default for Earcut<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Earcut<T> {
    /// Creates a new instance of the earcut algorithm.
    ///
    /// You can reuse a single instance for multiple triangulations to reduce memory allocations.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            nodes: Nodes::new(),
            holes: Vec::new(),
            queue: Vec::new(),
        }
    }

    /// Performs the earcut triangulation on a polygon.
    ///
    /// `data` holds `dim` coordinates per vertex, of which only the first two are used.
    /// `hole_indices` are the vertex offsets where each hole ring starts. The output
    /// indices refer to vertices of `data`.
    pub fn earcut<N: Index>(
        &mut self,
        data: &[T],
        hole_indices: &[N],
        dim: usize,
        triangles_out: &mut Vec<N>,
    ) {
        self.data.clear();
        triangles_out.clear();
        if dim < 2 {
            return;
        }
        self.data
            .extend(data.chunks_exact(dim).map(|v| [v[0], v[1]]));
        self.triangulate(hole_indices, triangles_out);
    }

    /// Triangulates the vertices already loaded into `self.data`.
    pub(crate) fn triangulate<N: Index>(&mut self, hole_indices: &[N], triangles_out: &mut Vec<N>) {
        triangles_out.clear();
        if self.data.len() < 3 {
            return;
        }
        sanitize_holes(hole_indices, self.data.len(), &mut self.holes);
        triangles_out.reserve(self.data.len() * 3);
        self.nodes.reset(self.data.len() * 3 / 2);

        let outer_len = self.holes.first().copied().unwrap_or(self.data.len());

        // create nodes
        let Some(mut outer_node_i) = linked_list(&mut self.nodes, &self.data, 0..outer_len, true)
        else {
            return;
        };
        let outer_node = &self.nodes[outer_node_i];
        if outer_node.next_i == outer_node.prev_i {
            return;
        }
        if !self.holes.is_empty() {
            outer_node_i = self.eliminate_holes(outer_node_i);
        }

        // if the shape is not too simple, we'll use z-order curve hash later
        let z_order = if self.data.len() > Z_ORDER_THRESHOLD {
            ZOrder::from_ring(&self.data[..outer_len])
        } else {
            None
        };

        earcut_linked(
            &mut self.nodes,
            outer_node_i,
            triangles_out,
            z_order.as_ref(),
            Pass::Initial,
        );
    }

    /// link every hole into the outer loop, producing a single-ring polygon without holes
    fn eliminate_holes(&mut self, mut outer_node_i: NodeIndex) -> NodeIndex {
        self.queue.clear();
        for range in hole_ranges(&self.holes, self.data.len()) {
            if let Some(list_i) = linked_list(&mut self.nodes, &self.data, range, false) {
                let list = &mut self.nodes[list_i];
                if list.next_i == list_i {
                    list.steiner = true;
                }
                self.queue.push(self.nodes.leftmost(list_i));
            }
        }

        let nodes = &self.nodes;
        self.queue.sort_unstable_by(|&a, &b| {
            let (a, b) = (&nodes[a], &nodes[b]);
            a.x.partial_cmp(&b.x)
                .and_then(|ord| Some(ord.then(a.y.partial_cmp(&b.y)?)))
                .unwrap_or(Ordering::Equal)
        });

        // process holes from left to right
        for &hole_i in &self.queue {
            outer_node_i = eliminate_hole(&mut self.nodes, hole_i, outer_node_i);
        }
        outer_node_i
    }
}

/// Keeps the hole offsets that are in range and strictly increasing.
pub(crate) fn sanitize_holes<N: Index>(hole_indices: &[N], len: usize, out: &mut Vec<usize>) {
    out.clear();
    let mut prev = 0;
    for start in hole_indices.iter().map(|h| h.into_usize()) {
        if start <= prev || start >= len {
            log::warn!("ignoring hole offset {start}: previous ring starts at {prev}, {len} vertices");
            continue;
        }
        out.push(start);
        prev = start;
    }
}

/// vertex ranges of the hole rings
pub(crate) fn hole_ranges(holes: &[usize], len: usize) -> impl Iterator<Item = Range<usize>> + '_ {
    holes
        .iter()
        .enumerate()
        .map(move |(k, &start)| start..holes.get(k + 1).copied().unwrap_or(len))
}

/// create a circular doubly linked list from polygon points in the specified winding order
fn linked_list<T: Float>(
    nodes: &mut Nodes<T>,
    data: &[[T; 2]],
    range: Range<usize>,
    clockwise: bool,
) -> Option<NodeIndex> {
    let start = range.start;
    let ring = data.get(range)?;
    let mut last_i = None;
    let vertices = ring.iter().enumerate();

    if clockwise == (signed_area(ring) > T::zero()) {
        for (k, &[x, y]) in vertices {
            last_i = Some(nodes.insert((start + k) as u32, x, y, last_i));
        }
    } else {
        for (k, &[x, y]) in vertices.rev() {
            last_i = Some(nodes.insert((start + k) as u32, x, y, last_i));
        }
    }

    let last_i = last_i?;
    let last = &nodes[last_i];
    if equals(last, &nodes[last.next_i]) {
        let (_, next_i) = nodes.remove(last_i);
        return Some(next_i);
    }
    Some(last_i)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Pass {
    Initial,
    Filtered,
    Cured,
}

/// main ear slicing loop which triangulates a polygon (given as a linked list)
fn earcut_linked<T: Float, N: Index>(
    nodes: &mut Nodes<T>,
    mut ear_i: NodeIndex,
    triangles: &mut Vec<N>,
    z_order: Option<&ZOrder<T>>,
    pass: Pass,
) {
    // interlink polygon nodes in z-order
    if let (Pass::Initial, Some(z_order)) = (pass, z_order) {
        nodes.index_curve(ear_i, z_order);
    }

    let mut stop_i = ear_i;

    // iterate through ears, slicing them one by one
    loop {
        let ear = &nodes[ear_i];
        if ear.prev_i == ear.next_i {
            break;
        }
        let (prev_i, next_i) = (ear.prev_i, ear.next_i);

        let clip = match z_order {
            Some(z_order) => is_ear_hashed(nodes, ear_i, z_order),
            None => is_ear(nodes, ear_i),
        };
        if clip {
            // cut off the triangle
            emit(triangles, [&nodes[prev_i], ear, &nodes[next_i]]);
            let next_next_i = nodes[next_i].next_i;
            nodes.remove(ear_i);

            // skipping the next vertex leads to less sliver triangles
            (ear_i, stop_i) = (next_next_i, next_next_i);
            continue;
        }

        ear_i = next_i;

        // if we looped through the whole remaining polygon and can't find any more ears
        if ear_i == stop_i {
            match pass {
                Pass::Initial => {
                    log::trace!("no ear left, filtering degenerate vertices");
                    let ear_i = nodes.filter_points(ear_i, None);
                    earcut_linked(nodes, ear_i, triangles, z_order, Pass::Filtered);
                }
                Pass::Filtered => {
                    log::trace!("no ear left, curing local self-intersections");
                    let filtered = nodes.filter_points(ear_i, None);
                    let ear_i = cure_local_intersections(nodes, filtered, triangles);
                    earcut_linked(nodes, ear_i, triangles, z_order, Pass::Cured);
                }
                Pass::Cured => {
                    log::trace!("no ear left, splitting the remaining polygon");
                    split_earcut(nodes, ear_i, triangles, z_order);
                }
            }
            return;
        }
    }
}

#[inline]
fn emit<T: Float, N: Index>(triangles: &mut Vec<N>, [a, b, c]: [&Node<T>; 3]) {
    triangles.extend([a.i, b.i, c.i].map(|i| N::from_usize(i as usize)));
}

#[inline]
fn triangle_bbox<T: Float>(a: &Node<T>, b: &Node<T>, c: &Node<T>) -> [T; 4] {
    [
        a.x.min(b.x.min(c.x)),
        a.y.min(b.y.min(c.y)),
        a.x.max(b.x.max(c.x)),
        a.y.max(b.y.max(c.y)),
    ]
}

/// whether `p` is a reflex vertex inside the candidate ear `abc`
#[inline]
fn blocks_ear<T: Float>(
    nodes: &Nodes<T>,
    p: &Node<T>,
    [a, b, c]: [&Node<T>; 3],
    [x0, y0, x1, y1]: [T; 4],
) -> bool {
    p.x >= x0
        && p.x <= x1
        && p.y >= y0
        && p.y <= y1
        && point_in_triangle(a, b, c, p)
        && area(&nodes[p.prev_i], p, &nodes[p.next_i]) >= T::zero()
}

/// check whether a polygon node forms a valid ear with adjacent nodes
fn is_ear<T: Float>(nodes: &Nodes<T>, ear_i: NodeIndex) -> bool {
    let b = &nodes[ear_i];
    let (a_i, c_i) = (b.prev_i, b.next_i);
    let (a, c) = (&nodes[a_i], &nodes[c_i]);

    if area(a, b, c) >= T::zero() {
        // reflex, can't be an ear
        return false;
    }

    // now make sure we don't have other points inside the potential ear
    let bbox = triangle_bbox(a, b, c);
    let mut p_i = c.next_i;
    while p_i != a_i {
        let p = &nodes[p_i];
        if blocks_ear(nodes, p, [a, b, c], bbox) {
            return false;
        }
        p_i = p.next_i;
    }
    true
}

fn is_ear_hashed<T: Float>(nodes: &Nodes<T>, ear_i: NodeIndex, z_order: &ZOrder<T>) -> bool {
    let b = &nodes[ear_i];
    let (a_i, c_i) = (b.prev_i, b.next_i);
    let (a, c) = (&nodes[a_i], &nodes[c_i]);

    if area(a, b, c) >= T::zero() {
        // reflex, can't be an ear
        return false;
    }

    let bbox = triangle_bbox(a, b, c);
    let [x0, y0, x1, y1] = bbox;

    // z-order range for the current triangle bbox
    let min_z = z_order.key(x0, y0);
    let max_z = z_order.key(x1, y1);

    let blocks = |p_i: NodeIndex| {
        p_i != a_i && p_i != c_i && blocks_ear(nodes, &nodes[p_i], [a, b, c], bbox)
    };
    let down = |p_i: NodeIndex| nodes[p_i].prev_z_i.filter(|&i| nodes[i].z >= min_z);
    let up = |n_i: NodeIndex| nodes[n_i].next_z_i.filter(|&i| nodes[i].z <= max_z);

    let mut o_p = down(ear_i);
    let mut o_n = up(ear_i);

    // look for points inside the triangle in both directions
    while let (Some(p_i), Some(n_i)) = (o_p, o_n) {
        if blocks(p_i) {
            return false;
        }
        o_p = down(p_i);
        if blocks(n_i) {
            return false;
        }
        o_n = up(n_i);
    }

    // look for remaining points in decreasing z-order
    while let Some(p_i) = o_p {
        if blocks(p_i) {
            return false;
        }
        o_p = down(p_i);
    }

    // look for remaining points in increasing z-order
    while let Some(n_i) = o_n {
        if blocks(n_i) {
            return false;
        }
        o_n = up(n_i);
    }

    true
}

/// go through all polygon nodes and cure small local self-intersections
fn cure_local_intersections<T: Float, N: Index>(
    nodes: &mut Nodes<T>,
    mut start_i: NodeIndex,
    triangles: &mut Vec<N>,
) -> NodeIndex {
    let mut p_i = start_i;
    loop {
        let p = &nodes[p_i];
        let p_next_i = p.next_i;
        let p_next = &nodes[p_next_i];
        let b_i = p_next.next_i;
        let (a, b) = (&nodes[p.prev_i], &nodes[b_i]);

        if !equals(a, b)
            && intersects(a, p, p_next, b)
            && locally_inside(nodes, a, b)
            && locally_inside(nodes, b, a)
        {
            emit(triangles, [a, p, b]);

            // remove two nodes involved
            nodes.remove(p_i);
            nodes.remove(p_next_i);

            (p_i, start_i) = (b_i, b_i);
        }

        p_i = nodes[p_i].next_i;
        if p_i == start_i {
            return nodes.filter_points(p_i, None);
        }
    }
}

/// try splitting polygon into two and triangulate them independently
fn split_earcut<T: Float, N: Index>(
    nodes: &mut Nodes<T>,
    start_i: NodeIndex,
    triangles: &mut Vec<N>,
    z_order: Option<&ZOrder<T>>,
) {
    // look for a valid diagonal that divides the polygon into two
    let mut a_i = start_i;
    loop {
        let a = &nodes[a_i];
        let mut b_i = nodes[a.next_i].next_i;
        while b_i != a.prev_i {
            let b = &nodes[b_i];
            if a.i != b.i && is_valid_diagonal(nodes, a_i, b_i) {
                // split the polygon in two by the diagonal
                let c_i = nodes.split(a_i, b_i);

                // filter colinear points around the cuts
                let end_i = nodes[a_i].next_i;
                let a_i = nodes.filter_points(a_i, Some(end_i));
                let end_i = nodes[c_i].next_i;
                let c_i = nodes.filter_points(c_i, Some(end_i));

                // run earcut on each half
                earcut_linked(nodes, a_i, triangles, z_order, Pass::Initial);
                earcut_linked(nodes, c_i, triangles, z_order, Pass::Initial);
                return;
            }
            b_i = b.next_i;
        }

        a_i = a.next_i;
        if a_i == start_i {
            log::debug!("no valid diagonal found, leaving {} vertices untriangulated", nodes.ring(a_i).count());
            return;
        }
    }
}

/// find a bridge between vertices that connects hole with an outer ring and link it
fn eliminate_hole<T: Float>(
    nodes: &mut Nodes<T>,
    hole_i: NodeIndex,
    outer_node_i: NodeIndex,
) -> NodeIndex {
    let Some(bridge_i) = find_hole_bridge(nodes, hole_i, outer_node_i) else {
        log::debug!("no bridge found for the hole at vertex {}", nodes[hole_i].i);
        return outer_node_i;
    };
    let bridge_reverse_i = nodes.split(bridge_i, hole_i);

    // filter collinear points around the cuts
    let end_i = nodes[bridge_reverse_i].next_i;
    nodes.filter_points(bridge_reverse_i, Some(end_i));
    let end_i = nodes[bridge_i].next_i;
    nodes.filter_points(bridge_i, Some(end_i))
}

/// David Eberly's algorithm for finding a bridge between hole and outer polygon
fn find_hole_bridge<T: Float>(
    nodes: &Nodes<T>,
    hole_i: NodeIndex,
    outer_node_i: NodeIndex,
) -> Option<NodeIndex> {
    let hole = &nodes[hole_i];
    let (hx, hy) = (hole.x, hole.y);
    let mut qx = T::neg_infinity();
    let mut m_i: Option<NodeIndex> = None;

    // find a segment intersected by a ray from the hole's leftmost point to the left;
    // segment's endpoint with lesser x will be potential connection point
    for p_i in nodes.ring(outer_node_i) {
        let p = &nodes[p_i];
        let p_next = &nodes[p.next_i];
        if hy <= p.y && hy >= p_next.y && p_next.y != p.y {
            let x = p.x + (hy - p.y) * (p_next.x - p.x) / (p_next.y - p.y);
            if x <= hx && x > qx {
                qx = x;
                m_i = Some(if p.x < p_next.x { p_i } else { p.next_i });
                if x == hx {
                    // hole touches outer segment; pick leftmost endpoint
                    return m_i;
                }
            }
        }
    }

    let mut m_i = m_i?;

    // look for points inside the triangle of hole point, segment intersection and endpoint;
    // if there are no points found, we have a valid connection;
    // otherwise choose the point of the minimum angle with the ray as connection point
    let stop_i = m_i;
    let (mx, my) = (nodes[m_i].x, nodes[m_i].y);
    let (t0, t2) = if hy < my {
        ([hx, hy], [qx, hy])
    } else {
        ([qx, hy], [hx, hy])
    };
    let mut tan_min = T::infinity();

    for p_i in nodes.ring(stop_i) {
        let p = &nodes[p_i];
        if hx >= p.x && p.x >= mx && hx != p.x && point_in_triangle(&t0, &[mx, my], &t2, p) {
            let tan = (hy - p.y).abs() / (hx - p.x);
            let m = &nodes[m_i];
            if locally_inside(nodes, p, hole)
                && (tan < tan_min
                    || (tan == tan_min
                        && (p.x > m.x || (p.x == m.x && sector_contains_sector(nodes, m, p)))))
            {
                m_i = p_i;
                tan_min = tan;
            }
        }
    }

    Some(m_i)
}

/// whether sector in vertex m contains sector in vertex p in the same coordinates
fn sector_contains_sector<T: Float>(nodes: &Nodes<T>, m: &Node<T>, p: &Node<T>) -> bool {
    area(&nodes[m.prev_i], m, &nodes[p.prev_i]) < T::zero()
        && area(&nodes[p.next_i], m, &nodes[m.next_i]) < T::zero()
}

/// check if a diagonal between two polygon nodes is valid (lies in polygon interior)
fn is_valid_diagonal<T: Float>(nodes: &Nodes<T>, a_i: NodeIndex, b_i: NodeIndex) -> bool {
    let (a, b) = (&nodes[a_i], &nodes[b_i]);
    let (a_prev, a_next) = (&nodes[a.prev_i], &nodes[a.next_i]);
    let (b_prev, b_next) = (&nodes[b.prev_i], &nodes[b.next_i]);

    // doesn't intersect other edges
    a_next.i != b.i
        && a_prev.i != b.i
        && !intersects_polygon(nodes, a_i, b_i)
        && (
            // locally visible
            (locally_inside(nodes, a, b)
                && locally_inside(nodes, b, a)
                && middle_inside(nodes, a_i, b_i)
                // does not create opposite-facing sectors
                && (area(a_prev, a, b_prev) != T::zero() || area(a, b_prev, b) != T::zero()))
                // special zero-length case
                || (equals(a, b)
                    && area(a_prev, a, a_next) > T::zero()
                    && area(b_prev, b, b_next) > T::zero())
        )
}

/// check if a polygon diagonal intersects any polygon segments
fn intersects_polygon<T: Float>(nodes: &Nodes<T>, a_i: NodeIndex, b_i: NodeIndex) -> bool {
    let (a, b) = (&nodes[a_i], &nodes[b_i]);
    nodes.ring(a_i).any(|p_i| {
        let p = &nodes[p_i];
        let p_next = &nodes[p.next_i];
        p.i != a.i
            && p.i != b.i
            && p_next.i != a.i
            && p_next.i != b.i
            && intersects(p, p_next, a, b)
    })
}

/// check if a polygon diagonal is locally inside the polygon
fn locally_inside<T: Float>(nodes: &Nodes<T>, a: &Node<T>, b: &Node<T>) -> bool {
    let (a_prev, a_next) = (&nodes[a.prev_i], &nodes[a.next_i]);
    if area(a_prev, a, a_next) < T::zero() {
        area(a, b, a_next) >= T::zero() && area(a, a_prev, b) >= T::zero()
    } else {
        area(a, b, a_prev) < T::zero() || area(a, a_next, b) < T::zero()
    }
}

/// check if the middle point of a polygon diagonal is inside the polygon
fn middle_inside<T: Float>(nodes: &Nodes<T>, a_i: NodeIndex, b_i: NodeIndex) -> bool {
    let (a, b) = (&nodes[a_i], &nodes[b_i]);
    let two = T::one() + T::one();
    let (px, py) = ((a.x + b.x) / two, (a.y + b.y) / two);
    nodes.ring(a_i).fold(false, |inside, p_i| {
        let p = &nodes[p_i];
        let q = &nodes[p.next_i];
        inside
            ^ ((p.y > py) != (q.y > py)
                && q.y != p.y
                && (px < (q.x - p.x) * (py - p.y) / (q.y - p.y) + p.x))
    })
}
