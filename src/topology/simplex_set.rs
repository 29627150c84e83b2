//! `SimplexSet`: the working-set currency passed between mesh operators.
//!
//! Four ordered key sets, one per dimension, with in-place set algebra. Sets
//! are ordered so that every operator built on top of them visits simplices
//! in a deterministic order.

use crate::topology::key::{AnyKey, Dim, EdgeKey, FaceKey, NodeKey, TetKey};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SimplexSet {
    nodes: BTreeSet<NodeKey>,
    edges: BTreeSet<EdgeKey>,
    faces: BTreeSet<FaceKey>,
    tetrahedra: BTreeSet<TetKey>,
}

impl SimplexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key of any dimension; returns `false` if it was present.
    pub fn insert(&mut self, key: impl Into<AnyKey>) -> bool {
        match key.into() {
            AnyKey::Node(k) => self.nodes.insert(k),
            AnyKey::Edge(k) => self.edges.insert(k),
            AnyKey::Face(k) => self.faces.insert(k),
            AnyKey::Tetrahedron(k) => self.tetrahedra.insert(k),
        }
    }

    pub fn remove(&mut self, key: impl Into<AnyKey>) -> bool {
        match key.into() {
            AnyKey::Node(k) => self.nodes.remove(&k),
            AnyKey::Edge(k) => self.edges.remove(&k),
            AnyKey::Face(k) => self.faces.remove(&k),
            AnyKey::Tetrahedron(k) => self.tetrahedra.remove(&k),
        }
    }

    pub fn contains(&self, key: impl Into<AnyKey>) -> bool {
        match key.into() {
            AnyKey::Node(k) => self.nodes.contains(&k),
            AnyKey::Edge(k) => self.edges.contains(&k),
            AnyKey::Face(k) => self.faces.contains(&k),
            AnyKey::Tetrahedron(k) => self.tetrahedra.contains(&k),
        }
    }

    /// In-place union.
    pub fn add(&mut self, other: &SimplexSet) {
        self.nodes.extend(other.nodes.iter().copied());
        self.edges.extend(other.edges.iter().copied());
        self.faces.extend(other.faces.iter().copied());
        self.tetrahedra.extend(other.tetrahedra.iter().copied());
    }

    /// In-place difference: drop every key that is also in `other`.
    pub fn difference(&mut self, other: &SimplexSet) {
        self.nodes.retain(|k| !other.nodes.contains(k));
        self.edges.retain(|k| !other.edges.contains(k));
        self.faces.retain(|k| !other.faces.contains(k));
        self.tetrahedra.retain(|k| !other.tetrahedra.contains(k));
    }

    /// In-place intersection.
    pub fn intersection(&mut self, other: &SimplexSet) {
        self.nodes.retain(|k| other.nodes.contains(k));
        self.edges.retain(|k| other.edges.contains(k));
        self.faces.retain(|k| other.faces.contains(k));
        self.tetrahedra.retain(|k| other.tetrahedra.contains(k));
    }

    /// Restrict to the simplices of one dimension.
    pub fn filter(&mut self, dim: Dim) {
        if dim != Dim::Node {
            self.nodes.clear();
        }
        if dim != Dim::Edge {
            self.edges.clear();
        }
        if dim != Dim::Face {
            self.faces.clear();
        }
        if dim != Dim::Tetrahedron {
            self.tetrahedra.clear();
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.faces.clear();
        self.tetrahedra.clear();
    }

    #[inline]
    pub fn size_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn size_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn size_faces(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn size_tetrahedra(&self) -> usize {
        self.tetrahedra.len()
    }

    pub fn size(&self, dim: Dim) -> usize {
        match dim {
            Dim::Node => self.size_nodes(),
            Dim::Edge => self.size_edges(),
            Dim::Face => self.size_faces(),
            Dim::Tetrahedron => self.size_tetrahedra(),
        }
    }

    pub fn len(&self) -> usize {
        self.size_nodes() + self.size_edges() + self.size_faces() + self.size_tetrahedra()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = NodeKey> + '_ {
        self.nodes.iter().copied()
    }

    pub fn edges(&self) -> impl DoubleEndedIterator<Item = EdgeKey> + '_ {
        self.edges.iter().copied()
    }

    pub fn faces(&self) -> impl DoubleEndedIterator<Item = FaceKey> + '_ {
        self.faces.iter().copied()
    }

    pub fn tetrahedra(&self) -> impl DoubleEndedIterator<Item = TetKey> + '_ {
        self.tetrahedra.iter().copied()
    }

    /// Keys of one dimension as [`AnyKey`]s.
    pub fn of_dim(&self, dim: Dim) -> Box<dyn Iterator<Item = AnyKey> + '_> {
        match dim {
            Dim::Node => Box::new(self.nodes().map(AnyKey::from)),
            Dim::Edge => Box::new(self.edges().map(AnyKey::from)),
            Dim::Face => Box::new(self.faces().map(AnyKey::from)),
            Dim::Tetrahedron => Box::new(self.tetrahedra().map(AnyKey::from)),
        }
    }

    /// Every key, lowest dimension first.
    pub fn iter(&self) -> impl Iterator<Item = AnyKey> + '_ {
        self.nodes()
            .map(AnyKey::from)
            .chain(self.edges().map(AnyKey::from))
            .chain(self.faces().map(AnyKey::from))
            .chain(self.tetrahedra().map(AnyKey::from))
    }
}

impl<K: Into<AnyKey>> FromIterator<K> for SimplexSet {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = SimplexSet::new();
        set.extend(iter);
        set
    }
}

impl<K: Into<AnyKey>> Extend<K> for SimplexSet {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.insert(k);
        }
    }
}
