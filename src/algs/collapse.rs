//! Edge collapse: merge the second node of an edge into the first.

use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::key::{AnyKey, EdgeKey, FaceKey, NodeKey};
use crate::topology::simplex_set::SimplexSet;
use std::collections::BTreeMap;

impl<N, E, F, T> IsMesh<N, E, F, T> {
    /// The link condition: `link(n1) ∩ link(n2) \ link(e)` holds no node,
    /// edge or face.
    pub fn edge_collapse_precond(&self, e: EdgeKey) -> Result<bool, IsMeshError> {
        let [n1, n2] = self.edge_nodes(e)?;
        let mut shared = self.link(n1)?;
        shared.intersection(&self.link(n2)?);
        shared.difference(&self.link(e)?);
        Ok(shared.size_nodes() == 0 && shared.size_edges() == 0 && shared.size_faces() == 0)
    }

    /// Collapse `e = (n1, n2)` onto `n1`. The star of `e` disappears, every
    /// simplex built on `n2` is rebuilt on `n1`, and the faces and edges that
    /// would become duplicates are merged. Returns `n1`.
    ///
    /// Fails with [`IsMeshError::LinkConditionViolated`] before touching the
    /// mesh when the collapse would change its topology.
    pub fn edge_collapse(&mut self, e: EdgeKey) -> Result<NodeKey, IsMeshError> {
        log::debug!("edge_collapse {e}");
        let [n1, n2] = self.edge_nodes(e)?;
        if !self.edge_collapse_precond(e)? {
            return Err(IsMeshError::LinkConditionViolated(e));
        }

        let star_e = self.star(e)?;
        let mut region = self.star(n2)?;
        region.insert(n2);
        let region = self.closure_set(&region)?;

        // Pair every simplex on n2 that merges with its twin on n1.
        let mut edge_map: BTreeMap<EdgeKey, EdgeKey> = BTreeMap::new();
        for f in star_e.faces() {
            let (mut on_n1, mut on_n2) = (None, None);
            for &b in self.faces.find(f)?.boundary() {
                if b == e {
                    continue;
                }
                let ends = self.edges.find(b)?.boundary();
                if ends.contains(&n1) {
                    on_n1 = Some(b);
                } else if ends.contains(&n2) {
                    on_n2 = Some(b);
                }
            }
            if let (Some(keep), Some(drop)) = (on_n1, on_n2) {
                edge_map.insert(drop, keep);
            }
        }
        let mut face_map: BTreeMap<FaceKey, FaceKey> = BTreeMap::new();
        for t in star_e.tetrahedra() {
            let (mut on_n1, mut on_n2) = (None, None);
            for &b in self.tets.find(t)?.boundary() {
                if star_e.contains(b) {
                    continue;
                }
                let nodes = self.node_set(b.into())?;
                if nodes.contains(&n1) {
                    on_n1 = Some(b);
                } else if nodes.contains(&n2) {
                    on_n2 = Some(b);
                }
            }
            if let (Some(keep), Some(drop)) = (on_n1, on_n2) {
                face_map.insert(drop, keep);
            }
        }

        self.uncompress_set(&region)?;
        let mut doomed = star_e.clone();
        doomed.insert(e);
        doomed.insert(n2);
        for t in star_e.tetrahedra() {
            self.detach(t.into())?;
        }
        for f in star_e.faces() {
            self.detach(f.into())?;
        }
        self.detach(e.into())?;

        for (&drop, &keep) in &face_map {
            for t in self.faces.find(drop)?.co_boundary().clone() {
                self.replace_face_of(t.into(), drop.into(), keep.into())?;
                self.add_co_face_of(keep.into(), t.into())?;
            }
            self.detach(drop.into())?;
            doomed.insert(drop);
        }
        for (&drop, &keep) in &edge_map {
            for f in self.edges.find(drop)?.co_boundary().clone() {
                self.replace_face_of(f.into(), drop.into(), keep.into())?;
                self.add_co_face_of(keep.into(), f.into())?;
            }
            self.detach(drop.into())?;
            doomed.insert(drop);
        }
        for c in self.nodes.find(n2)?.co_boundary().clone() {
            self.replace_face_of(c.into(), n2.into(), n1.into())?;
            self.add_co_face_of(n1.into(), c.into())?;
        }
        self.remove_unchecked(&doomed)?;
        self.finish_operator()?;
        Ok(n1)
    }

    /// Drop `k` from the co-boundary of each of its boundary entries.
    fn detach(&mut self, k: AnyKey) -> Result<(), IsMeshError> {
        for b in self.boundary_keys(k)? {
            self.remove_co_face_of(b, k)?;
        }
        Ok(())
    }
}

/// Collapsible edges in `set`, in key order.
pub fn collapsible_edges<N, E, F, T>(
    mesh: &IsMesh<N, E, F, T>,
    set: &SimplexSet,
) -> Result<Vec<EdgeKey>, IsMeshError> {
    let mut out = Vec::new();
    for e in set.edges() {
        if mesh.edge_collapse_precond(e)? {
            out.push(e);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::collapsible_edges;
    use crate::algs::meshgen::{build_from_tetrahedra, structured_block};
    use crate::debug_invariants::DebugInvariants;
    use crate::mesh::IsMesh;
    use crate::mesh_error::IsMeshError;

    fn euler(mesh: &IsMesh) -> i64 {
        mesh.size_nodes() as i64 - mesh.size_edges() as i64 + mesh.size_faces() as i64
            - mesh.size_tetrahedra() as i64
    }

    #[test]
    fn collapsing_a_split_edge_restores_the_counts() {
        let (mut mesh, n): (IsMesh, _) = build_from_tetrahedra(4, &[[0, 1, 2, 3]]).unwrap();
        let e = mesh.edge_between(n[0], n[1]).unwrap().unwrap();
        let m = mesh.split_edge(e).unwrap();
        let half = mesh.edge_between(n[0], m).unwrap().unwrap();
        let [keep, gone] = mesh.edge_nodes(half).unwrap();
        assert!(mesh.edge_collapse_precond(half).unwrap());
        assert_eq!(mesh.edge_collapse(half).unwrap(), keep);
        assert!(!mesh.exists(gone));
        assert!(mesh.exists(keep));
        assert_eq!(
            [mesh.size_nodes(), mesh.size_edges(), mesh.size_faces(), mesh.size_tetrahedra()],
            [4, 6, 4, 1]
        );
        assert_eq!(mesh.validate_invariants(), Ok(()));
    }

    #[test]
    fn link_condition_refuses_without_mutating() {
        // Nodes 0 and 4 both see the triangle (1, 2, 3), but the only
        // tetrahedron on the edge between them is (0, 4, 5, 6).
        let (mut mesh, n): (IsMesh, _) =
            build_from_tetrahedra(7, &[[0, 1, 2, 3], [4, 1, 2, 3], [0, 4, 5, 6]]).unwrap();
        let e = mesh.edge_between(n[0], n[4]).unwrap().unwrap();
        assert!(!mesh.edge_collapse_precond(e).unwrap());
        let before = mesh.all_simplices();
        assert_eq!(mesh.edge_collapse(e), Err(IsMeshError::LinkConditionViolated(e)));
        assert_eq!(mesh.all_simplices(), before);
        assert_eq!(mesh.validate_invariants(), Ok(()));
    }

    #[test]
    fn collapses_inside_a_block_keep_euler_characteristic() {
        let (mut mesh, _): (IsMesh, _) = structured_block(2, 2, 2).unwrap();
        let chi = euler(&mesh);
        let mut done = 0;
        while done < 5 {
            let all = mesh.all_simplices();
            let Some(&e) = collapsible_edges(&mesh, &all).unwrap().first() else {
                break;
            };
            let nodes = mesh.size_nodes();
            mesh.edge_collapse(e).unwrap();
            assert_eq!(mesh.size_nodes(), nodes - 1);
            assert_eq!(euler(&mesh), chi);
            assert_eq!(mesh.validate_invariants(), Ok(()));
            done += 1;
        }
        assert!(done > 0);
    }
}
