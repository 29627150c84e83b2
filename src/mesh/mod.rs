//! [`IsMesh`]: the incidence simplicial mesh.
//!
//! Four kernels (nodes, edges, faces, tetrahedra) tied together by boundary
//! lists and co-boundary sets. Node and edge co-boundaries may be *compact*:
//! they then store one representative co-face per connected component of the
//! star, and the full co-boundary is recovered by [`IsMesh::star`].
//!
//! The impl is split by concern:
//! - this module: construction, lookup, safe insertion and removal
//! - [`queries`]: boundary, closure, star, link, vertices, is_boundary
//! - [`orientation`]: boundary-order bookkeeping
//! - [`compression`]: compress / uncompress / compress_all
//! - [`transaction`]: mark / undo / commit / garbage_collect
//! - [`validation`]: structural audits
//!
//! The composite operators (splits, collapse, retriangulations, vertex
//! insertion) live in [`crate::algs`].
//!
//! ```rust
//! use is_mesh::mesh::IsMesh;
//! # fn main() -> Result<(), is_mesh::mesh_error::IsMeshError> {
//! let mut mesh: IsMesh = IsMesh::new();
//! let n: Vec<_> = (0..4).map(|_| mesh.insert_node()).collect();
//! let e01 = mesh.insert_edge(n[0], n[1])?;
//! let e12 = mesh.insert_edge(n[1], n[2])?;
//! let e20 = mesh.insert_edge(n[2], n[0])?;
//! let f = mesh.insert_face(e01, e12, e20)?;
//! assert_eq!(mesh.vertices(f)?.len(), 3);
//! assert!(mesh.is_boundary(f)?);
//! # Ok(())
//! # }
//! ```

/// Evaluate `$body` with `$s` bound to the live record behind an [`AnyKey`].
macro_rules! with_simplex {
    ($mesh:expr, $key:expr, |$s:ident| $body:expr) => {
        match $key {
            $crate::topology::key::AnyKey::Node(k) => {
                let $s = $mesh.nodes.find(k)?;
                $body
            }
            $crate::topology::key::AnyKey::Edge(k) => {
                let $s = $mesh.edges.find(k)?;
                $body
            }
            $crate::topology::key::AnyKey::Face(k) => {
                let $s = $mesh.faces.find(k)?;
                $body
            }
            $crate::topology::key::AnyKey::Tetrahedron(k) => {
                let $s = $mesh.tets.find(k)?;
                $body
            }
        }
    };
}

pub mod compression;
pub mod orientation;
pub mod queries;
pub mod transaction;
pub(crate) mod traversal;
pub mod validation;

use crate::config::MeshConfig;
use crate::mesh_error::IsMeshError;
use crate::topology::bounds::Payload;
use crate::topology::kernel::Kernel;
use crate::topology::key::{AnyKey, EdgeKey, FaceKey, NodeKey, SimplexKey, TetKey};
use crate::topology::simplex::{Edge, Face, Node, Simplex, Tetrahedron};
use crate::topology::simplex_set::SimplexSet;
use crate::topology::undo::UndoLog;
use std::collections::BTreeMap;

/// Incidence simplicial mesh with per-dimension payloads `N`, `E`, `F`, `T`.
#[derive(Clone, Debug)]
pub struct IsMesh<N = (), E = (), F = (), T = ()> {
    pub(crate) nodes: Kernel<NodeKey, Node<N>>,
    pub(crate) edges: Kernel<EdgeKey, Edge<E>>,
    pub(crate) faces: Kernel<FaceKey, Face<F>>,
    pub(crate) tets: Kernel<TetKey, Tetrahedron<T>>,
    pub(crate) undo_log: UndoLog,
    /// Approximate number of non-compact nodes and edges.
    pub(crate) uncompressed: usize,
    pub(crate) config: MeshConfig,
}

impl<N, E, F, T> Default for IsMesh<N, E, F, T> {
    fn default() -> Self {
        Self::with_config(MeshConfig::default())
    }
}

/// Narrow an [`AnyKey`] produced by the mesh's own relations.
pub(crate) fn narrow<K: SimplexKey>(key: AnyKey) -> Result<K, IsMeshError> {
    K::from_any(key).ok_or_else(|| {
        IsMeshError::InvariantViolation(format!("{key} is not a {:?} key", K::DIM))
    })
}

impl<N, E, F, T> IsMesh<N, E, F, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            nodes: Kernel::new(),
            edges: Kernel::new(),
            faces: Kernel::new(),
            tets: Kernel::new(),
            undo_log: UndoLog::new(),
            uncompressed: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MeshConfig) {
        self.config = config;
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
        self.tets.len()
    }

    /// Approximate count of non-compact nodes and edges driving `compress_all`.
    #[inline]
    pub fn uncompressed_count(&self) -> usize {
        self.uncompressed
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node<N>)> + '_ {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge<E>)> + '_ {
        self.edges.iter()
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &Face<F>)> + '_ {
        self.faces.iter()
    }

    pub fn tetrahedra(&self) -> impl Iterator<Item = (TetKey, &Tetrahedron<T>)> + '_ {
        self.tets.iter()
    }

    /// Every live simplex, as one set.
    pub fn all_simplices(&self) -> SimplexSet {
        let mut set = SimplexSet::new();
        set.extend(self.nodes.keys());
        set.extend(self.edges.keys());
        set.extend(self.faces.keys());
        set.extend(self.tets.keys());
        set
    }

    pub fn node(&self, k: NodeKey) -> Result<&Node<N>, IsMeshError> {
        self.nodes.find(k)
    }

    pub fn edge(&self, k: EdgeKey) -> Result<&Edge<E>, IsMeshError> {
        self.edges.find(k)
    }

    pub fn face(&self, k: FaceKey) -> Result<&Face<F>, IsMeshError> {
        self.faces.find(k)
    }

    pub fn tetrahedron(&self, k: TetKey) -> Result<&Tetrahedron<T>, IsMeshError> {
        self.tets.find(k)
    }

    pub fn node_payload_mut(&mut self, k: NodeKey) -> Result<&mut N, IsMeshError> {
        Ok(self.nodes.find_mut(k)?.payload_mut())
    }

    pub fn edge_payload_mut(&mut self, k: EdgeKey) -> Result<&mut E, IsMeshError> {
        Ok(self.edges.find_mut(k)?.payload_mut())
    }

    pub fn face_payload_mut(&mut self, k: FaceKey) -> Result<&mut F, IsMeshError> {
        Ok(self.faces.find_mut(k)?.payload_mut())
    }

    pub fn tetrahedron_payload_mut(&mut self, k: TetKey) -> Result<&mut T, IsMeshError> {
        Ok(self.tets.find_mut(k)?.payload_mut())
    }

    /// Whether `k` refers to a live simplex.
    pub fn exists(&self, k: impl Into<AnyKey>) -> bool {
        match k.into() {
            AnyKey::Node(k) => self.nodes.is_valid(k),
            AnyKey::Edge(k) => self.edges.is_valid(k),
            AnyKey::Face(k) => self.faces.is_valid(k),
            AnyKey::Tetrahedron(k) => self.tets.is_valid(k),
        }
    }

    /// Drop every simplex and every undo mark.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.faces.clear();
        self.tets.clear();
        self.undo_log.clear();
        self.uncompressed = 0;
    }

    // ---------------------------------------------------------------------
    // Dimension-generic record access
    // ---------------------------------------------------------------------

    pub(crate) fn boundary_keys(&self, k: AnyKey) -> Result<Vec<AnyKey>, IsMeshError> {
        Ok(with_simplex!(self, k, |s| s
            .boundary()
            .iter()
            .map(|&b| AnyKey::from(b))
            .collect()))
    }

    /// The stored co-boundary; for a compact simplex only the representatives.
    pub(crate) fn co_boundary_keys(&self, k: AnyKey) -> Result<Vec<AnyKey>, IsMeshError> {
        Ok(with_simplex!(self, k, |s| s
            .co_boundary()
            .iter()
            .map(|&c| AnyKey::from(c))
            .collect()))
    }

    pub(crate) fn label_of(&self, k: AnyKey) -> Result<u32, IsMeshError> {
        Ok(with_simplex!(self, k, |s| s.label()))
    }

    pub(crate) fn set_label_of(&self, k: AnyKey, label: u32) -> Result<(), IsMeshError> {
        with_simplex!(self, k, |s| s.set_label(label));
        Ok(())
    }

    /// Reset labels, skipping keys that no longer exist.
    pub(crate) fn reset_labels(&self, keys: &[AnyKey]) {
        for &k in keys {
            match self.set_label_of(k, 0) {
                // Erased since it was labelled.
                Ok(()) | Err(IsMeshError::InvalidKey(_)) => {}
                Err(e) => log::warn!("could not reset the label of {k}: {e}"),
            }
        }
    }

    pub(crate) fn is_compact_of(&self, k: AnyKey) -> Result<bool, IsMeshError> {
        Ok(with_simplex!(self, k, |s| s.is_compact()))
    }

    pub(crate) fn set_boundary_of(
        &mut self,
        k: AnyKey,
        boundary: Vec<AnyKey>,
    ) -> Result<(), IsMeshError> {
        match k {
            AnyKey::Node(_) if boundary.is_empty() => {}
            AnyKey::Node(_) => {
                return Err(IsMeshError::InvariantViolation(format!(
                    "node {k} cannot have a boundary"
                )));
            }
            AnyKey::Edge(e) => {
                let list = boundary.into_iter().map(narrow).collect::<Result<Vec<_>, _>>()?;
                self.edges.find_mut(e)?.set_boundary_list(list);
            }
            AnyKey::Face(f) => {
                let list = boundary.into_iter().map(narrow).collect::<Result<Vec<_>, _>>()?;
                self.faces.find_mut(f)?.set_boundary_list(list);
            }
            AnyKey::Tetrahedron(t) => {
                let list = boundary.into_iter().map(narrow).collect::<Result<Vec<_>, _>>()?;
                self.tets.find_mut(t)?.set_boundary_list(list);
            }
        }
        Ok(())
    }

    pub(crate) fn add_co_face_of(&mut self, k: AnyKey, c: AnyKey) -> Result<bool, IsMeshError> {
        Ok(match (k, c) {
            (AnyKey::Node(n), AnyKey::Edge(e)) => self.nodes.find_mut(n)?.add_co_face(e),
            (AnyKey::Edge(e), AnyKey::Face(f)) => self.edges.find_mut(e)?.add_co_face(f),
            (AnyKey::Face(f), AnyKey::Tetrahedron(t)) => self.faces.find_mut(f)?.add_co_face(t),
            _ => return Err(not_a_co_face(k, c)),
        })
    }

    pub(crate) fn remove_co_face_of(&mut self, k: AnyKey, c: AnyKey) -> Result<bool, IsMeshError> {
        Ok(match (k, c) {
            (AnyKey::Node(n), AnyKey::Edge(e)) => self.nodes.find_mut(n)?.remove_co_face(&e),
            (AnyKey::Edge(e), AnyKey::Face(f)) => self.edges.find_mut(e)?.remove_co_face(&f),
            (AnyKey::Face(f), AnyKey::Tetrahedron(t)) => {
                self.faces.find_mut(f)?.remove_co_face(&t)
            }
            _ => return Err(not_a_co_face(k, c)),
        })
    }

    /// Swap `old` for `new` in the boundary of `k`, keeping its position.
    pub(crate) fn replace_face_of(
        &mut self,
        k: AnyKey,
        old: AnyKey,
        new: AnyKey,
    ) -> Result<bool, IsMeshError> {
        Ok(match k {
            AnyKey::Node(_) => false,
            AnyKey::Edge(e) => self
                .edges
                .find_mut(e)?
                .replace_face(&narrow(old)?, narrow(new)?),
            AnyKey::Face(f) => self
                .faces
                .find_mut(f)?
                .replace_face(&narrow(old)?, narrow(new)?),
            AnyKey::Tetrahedron(t) => self
                .tets
                .find_mut(t)?
                .replace_face(&narrow(old)?, narrow(new)?),
        })
    }

    /// Erase every simplex of `set`, highest dimension first, without
    /// repairing the co-boundaries that still point at them.
    pub(crate) fn remove_unchecked(&mut self, set: &SimplexSet) -> Result<(), IsMeshError> {
        for t in set.tetrahedra() {
            self.tets.erase(t)?;
        }
        for f in set.faces() {
            self.faces.erase(f)?;
        }
        for e in set.edges() {
            if !self.edges.find(e)?.is_compact() {
                self.uncompressed = self.uncompressed.saturating_sub(1);
            }
            self.edges.erase(e)?;
        }
        for n in set.nodes() {
            if !self.nodes.find(n)?.is_compact() {
                self.uncompressed = self.uncompressed.saturating_sub(1);
            }
            self.nodes.erase(n)?;
        }
        Ok(())
    }

    /// The edge joining `a` and `b`, if any.
    pub fn edge_between(&self, a: NodeKey, b: NodeKey) -> Result<Option<EdgeKey>, IsMeshError> {
        for e in self.full_co_boundary(a)? {
            let e: EdgeKey = narrow(e)?;
            if self.edges.find(e)?.boundary().contains(&b) {
                return Ok(Some(e));
            }
        }
        Ok(None)
    }

    /// Whether three edges close a triangle: three nodes, each used twice.
    fn closes_triangle(&self, edges: [EdgeKey; 3]) -> Result<bool, IsMeshError> {
        let mut count: BTreeMap<NodeKey, usize> = BTreeMap::new();
        for e in edges {
            let edge = self.edges.find(e)?;
            if edge.boundary().len() != 2 || edge.boundary()[0] == edge.boundary()[1] {
                return Ok(false);
            }
            for &n in edge.boundary() {
                *count.entry(n).or_default() += 1;
            }
        }
        Ok(count.len() == 3 && count.values().all(|&c| c == 2))
    }

    /// Whether four faces close a tetrahedron: six edges, each used twice.
    fn closes_tetrahedron(&self, faces: [FaceKey; 4]) -> Result<bool, IsMeshError> {
        let mut count: BTreeMap<EdgeKey, usize> = BTreeMap::new();
        for f in faces {
            for &e in self.faces.find(f)?.boundary() {
                *count.entry(e).or_default() += 1;
            }
        }
        Ok(count.len() == 6 && count.values().all(|&c| c == 2))
    }
}

fn not_a_co_face(k: AnyKey, c: AnyKey) -> IsMeshError {
    IsMeshError::InvariantViolation(format!("{c} cannot be a co-face of {k}"))
}

impl<N: Payload, E: Payload, F: Payload, T: Payload> IsMesh<N, E, F, T> {
    /// Insert an isolated node with a default payload.
    pub fn insert_node(&mut self) -> NodeKey {
        self.insert_node_with(N::default())
    }

    /// Insert an isolated node. New nodes start non-compact.
    pub fn insert_node_with(&mut self, payload: N) -> NodeKey {
        self.uncompressed += 1;
        self.nodes.create(Simplex::new(payload, false))
    }

    /// Insert the edge `n1 -> n2`.
    pub fn insert_edge(&mut self, n1: NodeKey, n2: NodeKey) -> Result<EdgeKey, IsMeshError> {
        self.nodes.find(n1)?;
        self.nodes.find(n2)?;
        if n1 == n2 {
            return Err(IsMeshError::MalformedBoundary {
                key: n1.into(),
                reason: "an edge needs two distinct nodes",
            });
        }
        if let Some(existing) = self.edge_between(n1, n2)? {
            return Err(IsMeshError::DuplicateSimplex(existing.into()));
        }
        self.uncompress(n1)?;
        self.uncompress(n2)?;
        self.insert_edge_unchecked(n1, n2)
    }

    /// Insert the face bounded by three edges closing a triangle.
    pub fn insert_face(
        &mut self,
        e1: EdgeKey,
        e2: EdgeKey,
        e3: EdgeKey,
    ) -> Result<FaceKey, IsMeshError> {
        let edges = [e1, e2, e3];
        if !self.closes_triangle(edges)? {
            return Err(IsMeshError::MalformedBoundary {
                key: e1.into(),
                reason: "edges do not close a triangle",
            });
        }
        for f in self.full_co_boundary(e1)? {
            let f: FaceKey = narrow(f)?;
            if edges.iter().all(|e| self.faces.find(f).is_ok_and(|s| s.boundary().contains(e))) {
                return Err(IsMeshError::DuplicateSimplex(f.into()));
            }
        }
        let closure = self.closure_set(&edges.into_iter().collect())?;
        self.uncompress_set(&closure)?;
        self.insert_face_unchecked(e1, e2, e3)
    }

    /// Insert the tetrahedron bounded by four faces closing a tetrahedron.
    pub fn insert_tetrahedron(
        &mut self,
        f1: FaceKey,
        f2: FaceKey,
        f3: FaceKey,
        f4: FaceKey,
    ) -> Result<TetKey, IsMeshError> {
        let faces = [f1, f2, f3, f4];
        for f in faces {
            if self.faces.find(f)?.co_boundary().len() >= 2 {
                return Err(IsMeshError::NonManifoldFace(f));
            }
        }
        if !self.closes_tetrahedron(faces)? {
            return Err(IsMeshError::MalformedBoundary {
                key: f1.into(),
                reason: "faces do not close a tetrahedron",
            });
        }
        for &t in self.faces.find(f1)?.co_boundary() {
            let tet = self.tets.find(t)?;
            if faces.iter().all(|f| tet.boundary().contains(f)) {
                return Err(IsMeshError::DuplicateSimplex(t.into()));
            }
        }
        let closure = self.closure_set(&faces.into_iter().collect())?;
        self.uncompress_set(&closure)?;
        self.insert_tetrahedron_unchecked(f1, f2, f3, f4)
    }

    /// Create an edge and wire both incidence directions. The nodes'
    /// co-boundaries are updated literally; callers make sure they are
    /// non-compact when that matters.
    pub(crate) fn insert_edge_unchecked(
        &mut self,
        n1: NodeKey,
        n2: NodeKey,
    ) -> Result<EdgeKey, IsMeshError> {
        self.nodes.find(n1)?;
        self.nodes.find(n2)?;
        let mut edge = Simplex::new(E::default(), false);
        edge.add_face(n1);
        edge.add_face(n2);
        let e = self.edges.create(edge);
        self.uncompressed += 1;
        self.nodes.find_mut(n1)?.add_co_face(e);
        self.nodes.find_mut(n2)?.add_co_face(e);
        Ok(e)
    }

    pub(crate) fn insert_face_unchecked(
        &mut self,
        e1: EdgeKey,
        e2: EdgeKey,
        e3: EdgeKey,
    ) -> Result<FaceKey, IsMeshError> {
        for e in [e1, e2, e3] {
            self.edges.find(e)?;
        }
        let mut face = Simplex::new(F::default(), true);
        for e in [e1, e2, e3] {
            face.add_face(e);
        }
        let f = self.faces.create(face);
        for e in [e1, e2, e3] {
            self.edges.find_mut(e)?.add_co_face(f);
        }
        Ok(f)
    }

    pub(crate) fn insert_tetrahedron_unchecked(
        &mut self,
        f1: FaceKey,
        f2: FaceKey,
        f3: FaceKey,
        f4: FaceKey,
    ) -> Result<TetKey, IsMeshError> {
        for f in [f1, f2, f3, f4] {
            self.faces.find(f)?;
        }
        let mut tet = Simplex::new(T::default(), true);
        for f in [f1, f2, f3, f4] {
            tet.add_face(f);
        }
        let t = self.tets.create(tet);
        for f in [f1, f2, f3, f4] {
            self.faces.find_mut(f)?.add_co_face(t);
        }
        Ok(t)
    }

    /// Remove `k` together with its whole star (a face cannot outlive its
    /// edges). Co-boundaries of the surviving neighbours are repaired.
    pub fn remove(&mut self, k: impl Into<AnyKey>) -> Result<(), IsMeshError> {
        let k = k.into();
        let mut interior = self.star(k)?;
        interior.insert(k);
        log::debug!("removing {k} with a star of {} simplices", interior.len() - 1);
        self.open_cavity(interior, false)?;
        self.maybe_compress_all()?;
        Ok(())
    }
}
