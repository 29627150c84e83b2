//! Cavity surgery shared by the composite operators.
//!
//! Every operator follows the same choreography: pick an *interior* that is
//! closed under taking co-faces, open it (uncompress the surrounding shell,
//! orient, detach, erase), then fill the hole with new simplices wired
//! directly to the shell. The shell nodes and edges are uncompressed before
//! anything is detached, so every incidence the fill touches is literal.

use crate::debug_invariants::DebugInvariants;
use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::bounds::Payload;
use crate::topology::key::{AnyKey, Dim, EdgeKey, FaceKey, NodeKey, TetKey};
use crate::topology::simplex_set::SimplexSet;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An opened cavity: what was erased and what borders it.
#[derive(Clone, Debug, Default)]
pub(crate) struct Cavity {
    pub(crate) interior: SimplexSet,
    pub(crate) shell: SimplexSet,
}

impl<N, E, F, T> IsMesh<N, E, F, T> {
    /// Reject an interior that some outside simplex still builds on.
    pub(crate) fn check_cavity(&self, interior: &SimplexSet) -> Result<(), IsMeshError> {
        for k in interior.iter() {
            if k.dim() == Dim::Tetrahedron {
                self.boundary_keys(k)?;
                continue;
            }
            if let Some(c) = self.full_co_boundary(k)?.into_iter().find(|c| !interior.contains(*c)) {
                return Err(IsMeshError::InvalidRegion(format!(
                    "{c} lies outside the region but is built on {k}"
                )));
            }
        }
        Ok(())
    }

    /// Remove `interior` and leave the shell consistent on its own.
    ///
    /// With `orient`, every interior face and tetrahedron first induces the
    /// opposite orientation on its boundary, so a co-face later oriented
    /// opposite to a shell simplex inherits the orientation of what it
    /// replaces.
    pub(crate) fn open_cavity(
        &mut self,
        interior: SimplexSet,
        orient: bool,
    ) -> Result<Cavity, IsMeshError> {
        let mut shell = self.closure_set(&interior)?;
        shell.difference(&interior);
        self.uncompress_set(&shell)?;
        if orient {
            for f in interior.faces() {
                self.orient_faces_oppositely(f)?;
            }
            for t in interior.tetrahedra() {
                self.orient_faces_oppositely(t)?;
            }
        }
        self.repair_co_boundaries(&interior, &shell)?;
        self.remove_unchecked(&interior)?;
        Ok(Cavity { interior, shell })
    }

    /// Drop interior co-faces from every shell co-boundary. A compact shell
    /// simplex that lost entries is re-seeded with a shell co-face so it keeps
    /// at least one representative.
    pub(crate) fn repair_co_boundaries(
        &mut self,
        interior: &SimplexSet,
        shell: &SimplexSet,
    ) -> Result<(), IsMeshError> {
        let mut shell_co_faces: BTreeMap<AnyKey, AnyKey> = BTreeMap::new();
        for c in shell.edges().map(AnyKey::from).chain(shell.faces().map(AnyKey::from)) {
            for b in self.boundary_keys(c)? {
                shell_co_faces.entry(b).or_insert(c);
            }
        }
        let targets: Vec<AnyKey> = shell.iter().filter(|k| k.dim() != Dim::Tetrahedron).collect();
        for k in targets {
            let removed: Vec<AnyKey> = self
                .co_boundary_keys(k)?
                .into_iter()
                .filter(|c| interior.contains(*c))
                .collect();
            if removed.is_empty() {
                continue;
            }
            for c in removed {
                self.remove_co_face_of(k, c)?;
            }
            if self.is_compact_of(k)? && k.dim() != Dim::Face {
                if let Some(&c) = shell_co_faces.get(&k) {
                    self.add_co_face_of(k, c)?;
                }
            }
        }
        Ok(())
    }

    /// Orient new tetrahedra outwards from faces whose orientation is already
    /// settled, one layer at a time.
    pub(crate) fn orient_new_tetrahedra(
        &mut self,
        settled: impl IntoIterator<Item = FaceKey>,
        tets: impl IntoIterator<Item = TetKey>,
    ) -> Result<(), IsMeshError> {
        let mut settled: BTreeSet<FaceKey> = settled.into_iter().collect();
        let mut pending: Vec<TetKey> = tets.into_iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut rest = Vec::new();
            for t in std::mem::take(&mut pending) {
                let faces = self.tets.find(t)?.boundary().to_vec();
                match faces.iter().find(|f| settled.contains(f)) {
                    Some(&f) => {
                        self.orient_coface_oppositely(f, t)?;
                        self.orient_faces_consistently(t)?;
                        settled.extend(faces);
                    }
                    None => rest.push(t),
                }
            }
            if rest.len() == before {
                return Err(IsMeshError::InvariantViolation(format!(
                    "{before} new tetrahedra are not connected to the cavity shell"
                )));
            }
            pending = rest;
        }
        Ok(())
    }

    /// Post-operator housekeeping: the compression heuristic, then the audit
    /// requested by the configuration.
    pub(crate) fn finish_operator(&mut self) -> Result<(), IsMeshError> {
        self.maybe_compress_all()?;
        if self.config.check_invariants {
            self.validate_invariants()?;
        }
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }
}

impl<N: Payload, E: Payload, F: Payload, T: Payload> IsMesh<N, E, F, T> {
    /// Fill an opened cavity with the cone from one new node over its shell:
    /// an edge per shell node, a face per shell edge and a tetrahedron per
    /// shell face. Returns the apex and every simplex created.
    pub(crate) fn cone_fill(&mut self, shell: &SimplexSet) -> Result<(NodeKey, SimplexSet), IsMeshError> {
        let apex = self.insert_node();
        let mut created = SimplexSet::new();
        created.insert(apex);

        let mut spoke: BTreeMap<NodeKey, EdgeKey> = BTreeMap::new();
        for m in shell.nodes() {
            let e = self.insert_edge_unchecked(m, apex)?;
            spoke.insert(m, e);
            created.insert(e);
        }

        let mut fan: BTreeMap<EdgeKey, FaceKey> = BTreeMap::new();
        for e in shell.edges() {
            let [a, b] = self.edge_nodes(e)?;
            let (ea, eb) = (lookup(&spoke, a)?, lookup(&spoke, b)?);
            let f = self.insert_face_unchecked(e, ea, eb)?;
            self.orient_coface_oppositely(e, f)?;
            fan.insert(e, f);
            created.insert(f);
        }

        for f in shell.faces() {
            let mut sides = Vec::with_capacity(3);
            for e in self.faces.find(f)?.boundary().to_vec() {
                sides.push(lookup(&fan, e)?);
            }
            let t = self.insert_tetrahedron_unchecked(f, sides[0], sides[1], sides[2])?;
            self.orient_coface_oppositely(f, t)?;
            created.insert(t);
        }

        let mut hub = SimplexSet::new();
        hub.insert(apex);
        hub.extend(spoke.values().copied());
        self.compress(&hub)?;
        Ok((apex, created))
    }
}

/// Look up the simplex built over `k` while filling a cavity.
pub(crate) fn lookup<K: Ord + Copy + fmt::Debug, V: Copy>(
    map: &BTreeMap<K, V>,
    k: K,
) -> Result<V, IsMeshError> {
    map.get(&k)
        .copied()
        .ok_or_else(|| IsMeshError::InvariantViolation(format!("nothing was built over {k:?}")))
}

#[cfg(test)]
mod tests {
    use crate::algs::meshgen::build_from_tetrahedra;
    use crate::debug_invariants::DebugInvariants;
    use crate::mesh::IsMesh;
    use crate::mesh_error::IsMeshError;
    use crate::topology::simplex_set::SimplexSet;

    #[test]
    fn cavity_must_be_closed_under_co_faces() {
        let (mesh, n): (IsMesh, _) =
            build_from_tetrahedra(5, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
        let e = mesh.edge_between(n[1], n[2]).unwrap().unwrap();
        let only_edge: SimplexSet = [e].into_iter().collect();
        assert!(matches!(
            mesh.check_cavity(&only_edge),
            Err(IsMeshError::InvalidRegion(_))
        ));
        let mut star = mesh.star(e).unwrap();
        star.insert(e);
        assert_eq!(mesh.check_cavity(&star), Ok(()));
    }

    #[test]
    fn opening_repairs_the_shell() {
        let (mut mesh, n): (IsMesh, _) =
            build_from_tetrahedra(5, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
        mesh.compress_all().unwrap();
        let t = mesh.star(n[0]).unwrap().tetrahedra().next().unwrap();
        let cavity = mesh.open_cavity([t].into_iter().collect(), true).unwrap();
        assert_eq!(cavity.shell.len(), 4 + 6 + 4);
        assert!(!mesh.exists(t));
        assert!(mesh.nodes().all(|(k, node)| !cavity.shell.contains(k) || !node.is_compact()));
        assert_eq!(mesh.validate_invariants(), Ok(()));
    }

    #[test]
    fn cone_refills_a_single_tetrahedron() {
        let (mut mesh, _): (IsMesh, _) = build_from_tetrahedra(4, &[[0, 1, 2, 3]]).unwrap();
        let t = mesh.tets.keys().next().unwrap();
        let cavity = mesh.open_cavity([t].into_iter().collect(), true).unwrap();
        let (apex, created) = mesh.cone_fill(&cavity.shell).unwrap();
        assert_eq!(
            (created.size_nodes(), created.size_edges(), created.size_faces(), created.size_tetrahedra()),
            (1, 4, 6, 4)
        );
        assert_eq!(mesh.star(apex).unwrap().size_tetrahedra(), 4);
        assert_eq!(mesh.validate_invariants(), Ok(()));
    }
}
