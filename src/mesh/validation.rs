//! Structural audits of an [`IsMesh`].

use crate::debug_invariants::DebugInvariants;
use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::key::{AnyKey, EdgeKey, FaceKey, TetKey};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

/// Optional validation toggles.
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    /// Boundary arity, liveness, and triangle/tetrahedron closure.
    pub check_boundaries: bool,
    /// Co-boundaries agree with the boundaries that point at them.
    pub check_co_boundaries: bool,
    /// No two simplices share the same boundary.
    pub check_duplicates: bool,
    /// No traversal label was left behind.
    pub check_labels: bool,
    /// What to do with faces bounding more than two tetrahedra.
    pub non_manifold: NonManifoldHandling,
}

impl ValidationOptions {
    /// Enable every check.
    pub fn all() -> Self {
        Self {
            check_boundaries: true,
            check_co_boundaries: true,
            check_duplicates: true,
            check_labels: true,
            non_manifold: NonManifoldHandling::Error,
        }
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Behavior for non-manifold detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonManifoldHandling {
    /// Skip non-manifold detection.
    Ignore,
    /// Log a warning on non-manifold faces.
    Warn,
    /// Return an error on non-manifold faces.
    Error,
}

fn violation(message: String) -> IsMeshError {
    IsMeshError::InvariantViolation(message)
}

/// Co-faces obtained by inverting every boundary list of one dimension.
fn invert<K: Ord + Copy, C: Ord + Copy>(
    records: impl Iterator<Item = (C, Vec<K>)>,
) -> BTreeMap<K, BTreeSet<C>> {
    let mut map: BTreeMap<K, BTreeSet<C>> = BTreeMap::new();
    for (c, boundary) in records {
        for k in boundary {
            map.entry(k).or_default().insert(c);
        }
    }
    map
}

impl<N, E, F, T> IsMesh<N, E, F, T> {
    /// Run the checks selected by `options` over all four dimensions.
    pub fn validate_with(&self, options: ValidationOptions) -> Result<(), IsMeshError> {
        self.validate_nodes_with(options)?;
        self.validate_edges_with(options)?;
        self.validate_faces_with(options)?;
        self.validate_tetrahedra_with(options)?;
        if options.check_labels {
            for k in self.all_simplices().iter() {
                let label = self.label_of(k)?;
                if label != 0 {
                    return Err(violation(format!("{k} kept traversal label {label}")));
                }
            }
        }
        Ok(())
    }

    pub fn validate_nodes(&self) -> Result<(), IsMeshError> {
        self.validate_nodes_with(ValidationOptions::all())
    }

    pub fn validate_edges(&self) -> Result<(), IsMeshError> {
        self.validate_edges_with(ValidationOptions::all())
    }

    pub fn validate_faces(&self) -> Result<(), IsMeshError> {
        self.validate_faces_with(ValidationOptions::all())
    }

    pub fn validate_tetrahedra(&self) -> Result<(), IsMeshError> {
        self.validate_tetrahedra_with(ValidationOptions::all())
    }

    fn validate_nodes_with(&self, options: ValidationOptions) -> Result<(), IsMeshError> {
        if !options.check_co_boundaries {
            return Ok(());
        }
        let literal = invert(self.edges.iter().map(|(e, s)| (e, s.boundary().to_vec())));
        for (n, node) in self.nodes.iter() {
            let expected = literal.get(&n).cloned().unwrap_or_default();
            self.check_co_boundary(n.into(), node.is_compact(), node.co_boundary(), &expected)?;
        }
        Ok(())
    }

    fn validate_edges_with(&self, options: ValidationOptions) -> Result<(), IsMeshError> {
        if options.check_boundaries {
            for (e, edge) in self.edges.iter() {
                match edge.boundary() {
                    [a, b] if a != b => {
                        self.nodes.find(*a)?;
                        self.nodes.find(*b)?;
                    }
                    _ => return Err(violation(format!("{e} does not join two distinct nodes"))),
                }
            }
        }
        if options.check_duplicates {
            let duplicate = self
                .edges
                .iter()
                .map(|(e, edge)| (e, edge.boundary().iter().copied().sorted().collect_vec()))
                .duplicates_by(|(_, nodes)| nodes.clone())
                .next();
            if let Some((e, _)) = duplicate {
                return Err(IsMeshError::DuplicateSimplex(e.into()));
            }
        }
        if options.check_co_boundaries {
            let literal = invert(self.faces.iter().map(|(f, s)| (f, s.boundary().to_vec())));
            for (e, edge) in self.edges.iter() {
                let expected = literal.get(&e).cloned().unwrap_or_default();
                self.check_co_boundary(e.into(), edge.is_compact(), edge.co_boundary(), &expected)?;
            }
        }
        Ok(())
    }

    fn validate_faces_with(&self, options: ValidationOptions) -> Result<(), IsMeshError> {
        if options.check_boundaries {
            for (f, face) in self.faces.iter() {
                let edges: [EdgeKey; 3] = face
                    .boundary()
                    .try_into()
                    .map_err(|_| violation(format!("{f} has {} edges", face.boundary().len())))?;
                if !self.closes_triangle(edges)? {
                    return Err(violation(format!("edges of {f} do not close a triangle")));
                }
            }
        }
        if options.check_duplicates {
            let duplicate = self
                .faces
                .iter()
                .map(|(f, face)| (f, face.boundary().iter().copied().sorted().collect_vec()))
                .duplicates_by(|(_, edges)| edges.clone())
                .next();
            if let Some((f, _)) = duplicate {
                return Err(IsMeshError::DuplicateSimplex(f.into()));
            }
        }
        let literal: BTreeMap<FaceKey, BTreeSet<TetKey>> =
            invert(self.tets.iter().map(|(t, s)| (t, s.boundary().to_vec())));
        for (f, face) in self.faces.iter() {
            if options.check_co_boundaries {
                if !face.is_compact() {
                    return Err(violation(format!("{f} is marked uncompressed")));
                }
                let expected = literal.get(&f).cloned().unwrap_or_default();
                if face.co_boundary() != &expected {
                    return Err(violation(format!(
                        "co-boundary of {f} is {:?}, boundaries say {expected:?}",
                        face.co_boundary()
                    )));
                }
            }
            let count = face.co_boundary().len();
            if count > 2 {
                match options.non_manifold {
                    NonManifoldHandling::Ignore => {}
                    NonManifoldHandling::Warn => {
                        log::warn!("non-manifold face {f} bounds {count} tetrahedra");
                    }
                    NonManifoldHandling::Error => return Err(IsMeshError::NonManifoldFace(f)),
                }
            }
        }
        Ok(())
    }

    fn validate_tetrahedra_with(&self, options: ValidationOptions) -> Result<(), IsMeshError> {
        if !options.check_boundaries {
            return Ok(());
        }
        for (t, tet) in self.tets.iter() {
            let faces: [FaceKey; 4] = tet
                .boundary()
                .try_into()
                .map_err(|_| violation(format!("{t} has {} faces", tet.boundary().len())))?;
            if !self.closes_tetrahedron(faces)? {
                return Err(violation(format!("faces of {t} do not close a tetrahedron")));
            }
        }
        Ok(())
    }

    /// A non-compact co-boundary must be the literal one. A compact one must
    /// only hold literal co-faces, and its star must reach all of them.
    fn check_co_boundary<C>(
        &self,
        k: AnyKey,
        compact: bool,
        stored: &BTreeSet<C>,
        literal: &BTreeSet<C>,
    ) -> Result<(), IsMeshError>
    where
        C: Ord + Copy + Into<AnyKey> + std::fmt::Debug,
    {
        if !compact {
            if stored != literal {
                return Err(violation(format!(
                    "co-boundary of {k} is {stored:?}, boundaries say {literal:?}"
                )));
            }
            return Ok(());
        }
        if let Some(c) = stored.difference(literal).next() {
            return Err(violation(format!("{k} lists {c:?} without being on its boundary")));
        }
        let star = self.star(k)?;
        if let Some(c) = literal.iter().find(|&&c| !star.contains(c)) {
            return Err(violation(format!(
                "{c:?} is not reachable from the representatives of {k}"
            )));
        }
        Ok(())
    }
}

impl<N, E, F, T> DebugInvariants for IsMesh<N, E, F, T> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "IsMesh invalid");
    }

    fn validate_invariants(&self) -> Result<(), IsMeshError> {
        self.validate_with(ValidationOptions::all())
    }
}
