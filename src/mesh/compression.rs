//! Compact co-boundaries.
//!
//! A compact node or edge stores one co-face per connected component of its
//! star instead of all of them. [`IsMesh::uncompress`] expands the
//! co-boundary to the literal set, [`IsMesh::compress`] collapses it back.
//! Faces and tetrahedra are always compact and both calls ignore them.

use crate::mesh::IsMesh;
use crate::mesh::traversal::StarWalk;
use crate::mesh_error::IsMeshError;
use crate::topology::key::{AnyKey, Dim};
use crate::topology::simplex_set::SimplexSet;
use std::collections::BTreeSet;

impl<N, E, F, T> IsMesh<N, E, F, T> {
    /// Replace the representatives of a compact node or edge by its complete
    /// co-boundary. A no-op on anything already uncompressed.
    pub fn uncompress(&mut self, k: impl Into<AnyKey>) -> Result<(), IsMeshError> {
        let k = k.into();
        if !matches!(k.dim(), Dim::Node | Dim::Edge) || !self.is_compact_of(k)? {
            self.boundary_keys(k)?;
            return Ok(());
        }
        let star = self.star(k)?;
        match k {
            AnyKey::Node(n) => {
                let node = self.nodes.find_mut(n)?;
                node.set_co_boundary_set(star.edges().collect());
                node.set_compact(false);
            }
            AnyKey::Edge(e) => {
                let edge = self.edges.find_mut(e)?;
                edge.set_co_boundary_set(star.faces().collect());
                edge.set_compact(false);
            }
            _ => {}
        }
        self.uncompressed += 1;
        Ok(())
    }

    /// Uncompress every node and edge of `set`.
    pub fn uncompress_set(&mut self, set: &SimplexSet) -> Result<(), IsMeshError> {
        for e in set.edges() {
            self.uncompress(e)?;
        }
        for n in set.nodes() {
            self.uncompress(n)?;
        }
        Ok(())
    }

    /// Collapse the co-boundary of every non-compact node and edge of `set`
    /// to one representative per connected component of its star.
    pub fn compress(&mut self, set: &SimplexSet) -> Result<(), IsMeshError> {
        for n in set.nodes() {
            self.compress_one(n.into())?;
        }
        for e in set.edges() {
            self.compress_one(e.into())?;
        }
        Ok(())
    }

    fn compress_one(&mut self, k: AnyKey) -> Result<(), IsMeshError> {
        if self.is_compact_of(k)? {
            return Ok(());
        }
        let representatives = self.component_representatives(k)?;
        log::trace!("compressing {k}: {} component(s)", representatives.len());
        match k {
            AnyKey::Node(n) => {
                let reps = representatives
                    .into_iter()
                    .map(crate::mesh::narrow)
                    .collect::<Result<BTreeSet<_>, _>>()?;
                let node = self.nodes.find_mut(n)?;
                node.set_co_boundary_set(reps);
                node.set_compact(true);
            }
            AnyKey::Edge(e) => {
                let reps = representatives
                    .into_iter()
                    .map(crate::mesh::narrow)
                    .collect::<Result<BTreeSet<_>, _>>()?;
                let edge = self.edges.find_mut(e)?;
                edge.set_co_boundary_set(reps);
                edge.set_compact(true);
            }
            _ => return Ok(()),
        }
        self.uncompressed = self.uncompressed.saturating_sub(1);
        Ok(())
    }

    /// First co-face met in every connected component of `star(k)`.
    fn component_representatives(&self, k: AnyKey) -> Result<Vec<AnyKey>, IsMeshError> {
        let walk = StarWalk::new(self, k);
        let mut visited = Vec::new();
        let mut representatives = Vec::new();
        let mut label = 0;
        let mut outcome = Ok(());
        for c in self.co_boundary_keys(k)? {
            match self.label_of(c) {
                Ok(0) => {}
                Ok(_) => continue,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
            label += 1;
            representatives.push(c);
            if let Err(e) = walk.label_component(c, label, &mut visited) {
                outcome = Err(e);
                break;
            }
        }
        self.reset_labels(&visited);
        outcome.map(|_| representatives)
    }

    /// Compress every node and edge when more than
    /// `config.compress_threshold` of them are uncompressed. Returns whether
    /// the pass ran.
    pub fn compress_all(&mut self) -> Result<bool, IsMeshError> {
        let population = self.size_nodes() + self.size_edges();
        if (self.uncompressed as f64) <= self.config.compress_threshold * population as f64 {
            return Ok(false);
        }
        log::debug!(
            "compress_all: {} of {population} nodes and edges uncompressed",
            self.uncompressed
        );
        let mut everything = SimplexSet::new();
        everything.extend(self.nodes.keys());
        everything.extend(self.edges.keys());
        self.compress(&everything)?;
        self.uncompressed = 0;
        Ok(true)
    }

    /// [`compress_all`](Self::compress_all) when `config.auto_compress` is on.
    pub(crate) fn maybe_compress_all(&mut self) -> Result<(), IsMeshError> {
        if self.config.auto_compress {
            self.compress_all()?;
        }
        Ok(())
    }
}
