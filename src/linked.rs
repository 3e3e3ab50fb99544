//! Arena of polygon vertices linked into circular rings, plus the z-order overlay.

use alloc::vec::Vec;
use core::num::NonZeroU32;
use core::ops::{Index, IndexMut};
use num_traits::float::Float;

use crate::predicates::{area, cast, equals, Coord};

/// Slot 0 of the arena holds a dummy node, so real indices are never zero.
pub(crate) type NodeIndex = NonZeroU32;

pub(crate) struct Node<T: Float> {
    /// vertex index in coordinates array
    pub(crate) i: u32,
    /// z-order curve value
    pub(crate) z: i32,
    pub(crate) x: T,
    pub(crate) y: T,
    /// previous vertex nodes in a polygon ring
    pub(crate) prev_i: NodeIndex,
    /// next vertex nodes in a polygon ring
    pub(crate) next_i: NodeIndex,
    /// previous nodes in z-order
    pub(crate) prev_z_i: Option<NodeIndex>,
    /// next nodes in z-order
    pub(crate) next_z_i: Option<NodeIndex>,
    /// indicates whether this is a steiner point
    pub(crate) steiner: bool,
}

impl<T: Float> Node<T> {
    fn new(i: u32, x: T, y: T, link: NodeIndex) -> Self {
        Self {
            i,
            z: 0,
            x,
            y,
            prev_i: link,
            next_i: link,
            prev_z_i: None,
            next_z_i: None,
            steiner: false,
        }
    }
}

impl<T: Float> Coord<T> for Node<T> {
    #[inline(always)]
    fn x(&self) -> T {
        self.x
    }
    #[inline(always)]
    fn y(&self) -> T {
        self.y
    }
}

pub(crate) struct Nodes<T: Float> {
    nodes: Vec<Node<T>>,
}

impl<T: Float> Index<NodeIndex> for Nodes<T> {
    type Output = Node<T>;

    #[inline(always)]
    fn index(&self, index: NodeIndex) -> &Node<T> {
        debug_assert!((index.get() as usize) < self.nodes.len());
        // SAFETY: indices are only minted by `insert` and `split`, right before the node is pushed,
        // and the arena is only cleared between triangulations.
        unsafe { self.nodes.get_unchecked(index.get() as usize) }
    }
}

impl<T: Float> IndexMut<NodeIndex> for Nodes<T> {
    #[inline(always)]
    fn index_mut(&mut self, index: NodeIndex) -> &mut Node<T> {
        debug_assert!((index.get() as usize) < self.nodes.len());
        // SAFETY: see `Index`
        unsafe { self.nodes.get_unchecked_mut(index.get() as usize) }
    }
}

impl<T: Float> Nodes<T> {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn reset(&mut self, capacity: usize) {
        self.nodes.clear();
        self.nodes.reserve(capacity);
        self.nodes
            .push(Node::new(0, T::infinity(), T::infinity(), NodeIndex::MIN)); // dummy node
    }

    #[inline]
    fn next_index(&self) -> NodeIndex {
        debug_assert!(!self.nodes.is_empty());
        // SAFETY: the dummy node pushed by `reset` keeps the length above zero
        unsafe { NodeIndex::new_unchecked(self.nodes.len() as u32) }
    }

    /// Iterates over the node indices of the ring containing `start_i`, starting there.
    pub(crate) fn ring(&self, start_i: NodeIndex) -> Ring<'_, T> {
        Ring {
            nodes: self,
            start_i,
            cur: Some(start_i),
        }
    }

    /// create a node and optionally link it with previous one (in a circular doubly linked list)
    pub(crate) fn insert(&mut self, i: u32, x: T, y: T, last: Option<NodeIndex>) -> NodeIndex {
        let p_i = self.next_index();
        let mut p = Node::new(i, x, y, p_i);
        if let Some(last_i) = last {
            let last_next_i = self[last_i].next_i;
            (p.prev_i, p.next_i) = (last_i, last_next_i);
            self[last_next_i].prev_i = p_i;
            self[last_i].next_i = p_i;
        }
        self.nodes.push(p);
        p_i
    }

    /// unlink a node from both its ring and the z-order list; returns its former neighbours
    pub(crate) fn remove(&mut self, p_i: NodeIndex) -> (NodeIndex, NodeIndex) {
        let p = &self[p_i];
        let (prev_i, next_i) = (p.prev_i, p.next_i);
        let (prev_z_i, next_z_i) = (p.prev_z_i, p.next_z_i);

        self[next_i].prev_i = prev_i;
        self[prev_i].next_i = next_i;

        if let Some(i) = prev_z_i {
            self[i].next_z_i = next_z_i;
        }
        if let Some(i) = next_z_i {
            self[i].prev_z_i = prev_z_i;
        }
        (prev_i, next_i)
    }

    /// Links `a` and `b` with a bridge, duplicating both endpoints.
    ///
    /// If the vertices belong to the same ring, it is split in two; if one belongs to
    /// the outer ring and the other to a hole, the hole is merged into a single ring.
    /// Returns the duplicate of `b`, which sits on the other ring.
    pub(crate) fn split(&mut self, a_i: NodeIndex, b_i: NodeIndex) -> NodeIndex {
        let a2_i = self.next_index();
        let b2_i = a2_i.saturating_add(1);

        let (a, b) = (&self[a_i], &self[b_i]);
        let (an_i, bp_i) = (a.next_i, b.prev_i);
        let mut a2 = Node::new(a.i, a.x, a.y, b2_i);
        a2.next_i = an_i;
        let mut b2 = Node::new(b.i, b.x, b.y, bp_i);
        b2.next_i = a2_i;

        self[a_i].next_i = b_i;
        self[b_i].prev_i = a_i;
        self[an_i].prev_i = a2_i;
        self[bp_i].next_i = b2_i;

        self.nodes.extend([a2, b2]);
        b2_i
    }

    /// eliminate colinear or duplicate points
    pub(crate) fn filter_points(
        &mut self,
        start_i: NodeIndex,
        end_i: Option<NodeIndex>,
    ) -> NodeIndex {
        let mut end_i = end_i.unwrap_or(start_i);
        let mut p_i = start_i;
        loop {
            let p = &self[p_i];
            let p_next = &self[p.next_i];
            if !p.steiner && (equals(p, p_next) || area(&self[p.prev_i], p, p_next) == T::zero()) {
                let (prev_i, next_i) = self.remove(p_i);
                (p_i, end_i) = (prev_i, prev_i);
                if p_i == next_i {
                    return end_i;
                }
            } else {
                p_i = p.next_i;
                if p_i == end_i {
                    return end_i;
                }
            }
        }
    }

    /// find the leftmost node of a polygon ring
    pub(crate) fn leftmost(&self, start_i: NodeIndex) -> NodeIndex {
        self.ring(start_i).fold(start_i, |m_i, p_i| {
            let (m, p) = (&self[m_i], &self[p_i]);
            if p.x < m.x || (p.x == m.x && p.y < m.y) {
                p_i
            } else {
                m_i
            }
        })
    }

    /// interlink polygon nodes in z-order
    pub(crate) fn index_curve(&mut self, start_i: NodeIndex, z_order: &ZOrder<T>) {
        let mut p_i = start_i;
        loop {
            let p = &mut self[p_i];
            if p.z == 0 {
                p.z = z_order.key(p.x, p.y);
            }
            p.prev_z_i = Some(p.prev_i);
            p.next_z_i = Some(p.next_i);
            p_i = p.next_i;
            if p_i == start_i {
                break;
            }
        }

        if let Some(tail_i) = self[start_i].prev_z_i.take() {
            self[tail_i].next_z_i = None;
        }
        self.sort_linked(start_i);
    }

    /// Simon Tatham's linked list merge sort algorithm
    /// http://www.chiark.greenend.org.uk/~sgtatham/algorithms/listsort.html
    fn sort_linked(&mut self, list_i: NodeIndex) {
        let mut list = Some(list_i);
        let mut in_size = 1;

        loop {
            let mut p = list;
            list = None;
            let mut tail: Option<NodeIndex> = None;
            let mut num_merges = 0;

            while let Some(p_start) = p {
                num_merges += 1;
                let mut q = self[p_start].next_z_i;
                let mut p_size = 1;
                while p_size < in_size {
                    let Some(q_i) = q else { break };
                    p_size += 1;
                    q = self[q_i].next_z_i;
                }
                let mut q_size = in_size;

                loop {
                    let (e, from_p) = match (p, q) {
                        (Some(p_i), Some(q_i)) if p_size > 0 && q_size > 0 => {
                            if self[p_i].z <= self[q_i].z {
                                (p_i, true)
                            } else {
                                (q_i, false)
                            }
                        }
                        (Some(p_i), _) if p_size > 0 => (p_i, true),
                        (_, Some(q_i)) if q_size > 0 => (q_i, false),
                        _ => break,
                    };
                    let e_next = self[e].next_z_i;
                    if from_p {
                        p = e_next;
                        p_size -= 1;
                    } else {
                        q = e_next;
                        q_size -= 1;
                    }

                    self[e].prev_z_i = tail;
                    match tail {
                        Some(tail_i) => self[tail_i].next_z_i = Some(e),
                        None => list = Some(e),
                    }
                    tail = Some(e);
                }

                p = q;
            }

            if let Some(tail_i) = tail {
                self[tail_i].next_z_i = None;
            }
            if num_merges <= 1 {
                break;
            }
            in_size *= 2;
        }
    }
}

pub(crate) struct Ring<'a, T: Float> {
    nodes: &'a Nodes<T>,
    start_i: NodeIndex,
    cur: Option<NodeIndex>,
}

impl<T: Float> Iterator for Ring<'_, T> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let p_i = self.cur?;
        let next_i = self.nodes[p_i].next_i;
        self.cur = (next_i != self.start_i).then_some(next_i);
        Some(p_i)
    }
}

/// Maps coordinates inside the outer ring's bbox onto a 15-bit Morton curve.
pub(crate) struct ZOrder<T> {
    min_x: T,
    min_y: T,
    inv_size: T,
}

impl<T: Float> ZOrder<T> {
    /// `None` when the ring's bbox has no extent.
    pub(crate) fn from_ring(ring: &[[T; 2]]) -> Option<Self> {
        let (&[x, y], rest) = ring.split_first()?;
        let [min_x, min_y, max_x, max_y] =
            rest.iter().fold([x, y, x, y], |[x0, y0, x1, y1], &[x, y]| {
                [x0.min(x), y0.min(y), x1.max(x), y1.max(y)]
            });
        let size = (max_x - min_x).max(max_y - min_y);
        (size != T::zero()).then(|| Self {
            min_x,
            min_y,
            inv_size: cast::<T, _>(32767.0) / size,
        })
    }

    /// z-order of a point
    pub(crate) fn key(&self, x: T, y: T) -> i32 {
        // coords are transformed into non-negative 15-bit integer range
        let x = self.quantize(x - self.min_x);
        let y = self.quantize(y - self.min_y);
        let mut xy = ((x as i64) << 32) | y as i64;
        xy = (xy | (xy << 8)) & 0x00FF00FF00FF00FF;
        xy = (xy | (xy << 4)) & 0x0F0F0F0F0F0F0F0F;
        xy = (xy | (xy << 2)) & 0x3333333333333333;
        xy = (xy | (xy << 1)) & 0x5555555555555555;
        ((xy >> 32) | (xy << 1)) as i32
    }

    #[inline]
    fn quantize(&self, offset: T) -> u32 {
        (offset * self.inv_size).to_u32().unwrap_or(0).min(32767)
    }
}
