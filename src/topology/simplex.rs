//! The per-simplex record stored in each kernel.
//!
//! A record owns its boundary (ordered, orientation-carrying) and its
//! co-boundary (an ordered set, so iteration is deterministic). No topology
//! logic lives here: the [`IsMesh`](crate::mesh::IsMesh) orchestrator is the
//! only component that keeps records of different dimensions consistent.

use crate::topology::key::{EdgeKey, FaceKey, NodeKey, TetKey};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::convert::Infallible;

/// Generic simplex record.
///
/// * `B`: key type of the boundary entries (one dimension lower).
/// * `C`: key type of the co-boundary entries (one dimension higher).
/// * `P`: opaque payload carried for the caller.
///
/// `compact == true` means the co-boundary holds one representative per
/// connected component of the star instead of every incident co-face.
#[derive(Clone, Debug)]
pub struct Simplex<B, C, P> {
    boundary: Vec<B>,
    co_boundary: BTreeSet<C>,
    compact: bool,
    label: Cell<u32>,
    payload: P,
}

/// 0-simplex; it has no boundary.
pub type Node<P = ()> = Simplex<Infallible, EdgeKey, P>;
/// 1-simplex bounded by two nodes.
pub type Edge<P = ()> = Simplex<NodeKey, FaceKey, P>;
/// 2-simplex bounded by three edges.
pub type Face<P = ()> = Simplex<EdgeKey, TetKey, P>;
/// 3-simplex bounded by four faces; it has no co-boundary.
pub type Tetrahedron<P = ()> = Simplex<FaceKey, Infallible, P>;

impl<B, C, P: Default> Default for Simplex<B, C, P> {
    fn default() -> Self {
        Self::new(P::default(), false)
    }
}

impl<B, C, P> Simplex<B, C, P> {
    pub fn new(payload: P, compact: bool) -> Self {
        Self {
            boundary: Vec::new(),
            co_boundary: BTreeSet::new(),
            compact,
            label: Cell::new(0),
            payload,
        }
    }

    #[inline]
    pub fn boundary(&self) -> &[B] {
        &self.boundary
    }

    #[inline]
    pub fn co_boundary(&self) -> &BTreeSet<C> {
        &self.co_boundary
    }

    pub fn add_face(&mut self, key: B) {
        self.boundary.push(key);
    }

    /// Replace the whole boundary list, e.g. when restoring a snapshot.
    pub fn set_boundary_list(&mut self, boundary: Vec<B>) {
        self.boundary = boundary;
    }

    pub fn set_co_boundary_set(&mut self, co_boundary: BTreeSet<C>) {
        self.co_boundary = co_boundary;
    }

    pub(crate) fn boundary_mut(&mut self) -> &mut Vec<B> {
        &mut self.boundary
    }

    #[inline]
    pub fn is_compact(&self) -> bool {
        self.compact
    }

    pub fn set_compact(&mut self, compact: bool) {
        self.compact = compact;
    }

    #[inline]
    pub fn label(&self) -> u32 {
        self.label.get()
    }

    /// Labels are transient traversal state, so they are writable through `&self`.
    #[inline]
    pub fn set_label(&self, label: u32) {
        self.label.set(label);
    }

    #[inline]
    pub fn reset_label(&self) {
        self.label.set(0);
    }

    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    #[inline]
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }
}

impl<B: PartialEq, C, P> Simplex<B, C, P> {
    /// Remove the first occurrence of `key` from the boundary list.
    pub fn remove_face(&mut self, key: &B) -> bool {
        match self.boundary.iter().position(|b| b == key) {
            Some(pos) => {
                self.boundary.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Replace `old` by `new` in place, keeping its position (and therefore
    /// the orientation encoded by the boundary order).
    pub fn replace_face(&mut self, old: &B, new: B) -> bool {
        match self.boundary.iter_mut().find(|b| *b == old) {
            Some(slot) => {
                *slot = new;
                true
            }
            None => false,
        }
    }
}

impl<B, C: Ord, P> Simplex<B, C, P> {
    pub fn add_co_face(&mut self, key: C) -> bool {
        self.co_boundary.insert(key)
    }

    pub fn remove_co_face(&mut self, key: &C) -> bool {
        self.co_boundary.remove(key)
    }
}
