//! Adjacency snapshots for mark/undo/commit.
//!
//! The kernels only remember which records were created or erased since a
//! mark. What the records looked like is kept here: for every simplex named
//! by `set_undo_mark`, a copy of its boundary list, co-boundary set and
//! compaction flag taken at mark time.

use crate::topology::key::{EdgeKey, FaceKey, NodeKey, TetKey};
use crate::topology::simplex::Simplex;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::convert::Infallible;

/// Pre-mutation copy of one simplex's adjacency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot<B, C> {
    pub boundary: Vec<B>,
    pub co_boundary: BTreeSet<C>,
    pub compact: bool,
}

impl<B: Clone, C: Clone> Snapshot<B, C> {
    pub fn of<P>(simplex: &Simplex<B, C, P>) -> Self {
        Self {
            boundary: simplex.boundary().to_vec(),
            co_boundary: simplex.co_boundary().clone(),
            compact: simplex.is_compact(),
        }
    }

    /// Swap the recorded state back into `simplex`.
    pub fn restore<P>(self, simplex: &mut Simplex<B, C, P>) {
        simplex.set_boundary_list(self.boundary);
        simplex.set_co_boundary_set(self.co_boundary);
        simplex.set_compact(self.compact);
    }
}

/// Snapshots taken by one `set_undo_mark`.
#[derive(Clone, Debug, Default)]
pub struct UndoFrame {
    pub(crate) nodes: BTreeMap<NodeKey, Snapshot<Infallible, EdgeKey>>,
    pub(crate) edges: BTreeMap<EdgeKey, Snapshot<NodeKey, FaceKey>>,
    pub(crate) faces: BTreeMap<FaceKey, Snapshot<EdgeKey, TetKey>>,
    pub(crate) tetrahedra: BTreeMap<TetKey, Snapshot<FaceKey, Infallible>>,
    pub(crate) uncompressed: usize,
}

impl UndoFrame {
    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len() + self.faces.len() + self.tetrahedra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fold a newer frame into this one. Keys already recorded here keep
    /// their older snapshot, which is the state an undo of this frame must
    /// restore.
    fn absorb(&mut self, newer: UndoFrame) {
        for (k, s) in newer.nodes {
            self.nodes.entry(k).or_insert(s);
        }
        for (k, s) in newer.edges {
            self.edges.entry(k).or_insert(s);
        }
        for (k, s) in newer.faces {
            self.faces.entry(k).or_insert(s);
        }
        for (k, s) in newer.tetrahedra {
            self.tetrahedra.entry(k).or_insert(s);
        }
    }
}

/// Stack of undo frames, strictly nested.
#[derive(Clone, Debug, Default)]
pub struct UndoLog {
    frames: Vec<UndoFrame>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: UndoFrame) {
        self.frames.push(frame);
    }

    /// Remove the most recent frame so its snapshots can be restored.
    pub fn pop(&mut self) -> Option<UndoFrame> {
        self.frames.pop()
    }

    /// Drop the most recent frame, handing its snapshots to the enclosing
    /// one. Returns `false` when no frame is outstanding.
    pub fn commit(&mut self) -> bool {
        match self.frames.pop() {
            Some(frame) => {
                if let Some(parent) = self.frames.last_mut() {
                    parent.absorb(frame);
                }
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
