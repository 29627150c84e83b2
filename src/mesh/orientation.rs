//! Combinatorial orientation.
//!
//! A simplex is oriented by the order of its boundary list: entry `i` is
//! opposite vertex `i` (see [`IsMesh::vertices`]), so any transposition of
//! the list flips the orientation. A face `f` at position `p` in the
//! boundary of `s` is *consistent* with `s` when the vertex order of `f`,
//! read against the vertices of `s` with `vertices(s)[p]` removed, is a
//! permutation of parity `p mod 2`.

use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::key::{AnyKey, Dim};
use std::collections::BTreeMap;

impl<N, E, F, T> IsMesh<N, E, F, T> {
    /// Flip the orientation of `k` with one transposition of its boundary:
    /// entries 1 and 2 for faces and tetrahedra, 0 and 1 for edges. Nodes
    /// carry no orientation.
    pub fn invert_orientation(&mut self, k: impl Into<AnyKey>) -> Result<(), IsMeshError> {
        match k.into() {
            AnyKey::Node(n) => {
                self.nodes.find(n)?;
            }
            AnyKey::Edge(e) => self.edges.find_mut(e)?.boundary_mut().swap(0, 1),
            AnyKey::Face(f) => self.faces.find_mut(f)?.boundary_mut().swap(1, 2),
            AnyKey::Tetrahedron(t) => self.tets.find_mut(t)?.boundary_mut().swap(1, 2),
        }
        Ok(())
    }

    /// Whether `fk` inherits a consistent orientation from its co-face `sk`.
    pub fn is_consistently_oriented(
        &self,
        sk: impl Into<AnyKey>,
        fk: impl Into<AnyKey>,
    ) -> Result<bool, IsMeshError> {
        let (sk, fk) = (sk.into(), fk.into());
        let pos = self.position_in_boundary(sk, fk)?;
        let mut reference = self.vertices(sk)?;
        reference.remove(pos);
        let own = self.vertices(fk)?;
        let mut perm = Vec::with_capacity(own.len());
        for v in &own {
            match reference.iter().position(|r| r == v) {
                Some(i) => perm.push(i),
                None => {
                    return Err(IsMeshError::InvariantViolation(format!(
                        "{fk} has a vertex outside {sk}"
                    )));
                }
            }
        }
        Ok(permutation_is_odd(&perm) == (pos % 2 == 1))
    }

    pub fn orient_face_consistently(
        &mut self,
        sk: impl Into<AnyKey>,
        fk: impl Into<AnyKey>,
    ) -> Result<(), IsMeshError> {
        self.orient_face_helper(sk.into(), fk.into(), true)
    }

    pub fn orient_face_oppositely(
        &mut self,
        sk: impl Into<AnyKey>,
        fk: impl Into<AnyKey>,
    ) -> Result<(), IsMeshError> {
        self.orient_face_helper(sk.into(), fk.into(), false)
    }

    /// Induce a consistent orientation on every boundary entry of `sk`.
    pub fn orient_faces_consistently(&mut self, sk: impl Into<AnyKey>) -> Result<(), IsMeshError> {
        let sk = sk.into();
        for fk in self.boundary_keys(sk)? {
            self.orient_face_helper(sk, fk, true)?;
        }
        Ok(())
    }

    /// Induce the opposite orientation on every boundary entry of `sk`.
    pub fn orient_faces_oppositely(&mut self, sk: impl Into<AnyKey>) -> Result<(), IsMeshError> {
        let sk = sk.into();
        for fk in self.boundary_keys(sk)? {
            self.orient_face_helper(sk, fk, false)?;
        }
        Ok(())
    }

    /// Orient the co-face `cfk` so that its boundary entry `sk` is consistent.
    pub fn orient_coface_consistently(
        &mut self,
        sk: impl Into<AnyKey>,
        cfk: impl Into<AnyKey>,
    ) -> Result<(), IsMeshError> {
        self.orient_coface_helper(sk.into(), cfk.into(), true)
    }

    /// Orient the co-face `cfk` so that its boundary entry `sk` is opposite.
    pub fn orient_coface_oppositely(
        &mut self,
        sk: impl Into<AnyKey>,
        cfk: impl Into<AnyKey>,
    ) -> Result<(), IsMeshError> {
        self.orient_coface_helper(sk.into(), cfk.into(), false)
    }

    /// Invert every tetrahedron and re-induce its faces' orientation.
    pub fn invert_all(&mut self) -> Result<(), IsMeshError> {
        let tets: Vec<_> = self.tets.keys().collect();
        for t in tets {
            self.invert_orientation(t)?;
            self.orient_faces_consistently(t)?;
        }
        Ok(())
    }

    /// Whether every face between two tetrahedra is seen oppositely by them.
    pub fn is_coherently_oriented(&self) -> Result<bool, IsMeshError> {
        for (f, face) in self.faces.iter() {
            let mut sides = face.co_boundary().iter().copied();
            if let (Some(a), Some(b)) = (sides.next(), sides.next()) {
                if self.is_consistently_oriented(a, f)? == self.is_consistently_oriented(b, f)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn position_in_boundary(&self, sk: AnyKey, fk: AnyKey) -> Result<usize, IsMeshError> {
        self.boundary_keys(sk)?
            .iter()
            .position(|&b| b == fk)
            .ok_or_else(|| IsMeshError::InvariantViolation(format!("{fk} is not a face of {sk}")))
    }

    /// Rewrite the boundary of `fk` from its intersections with the other
    /// faces of `sk`, which leaves it consistent exactly when its position in
    /// `sk` is even, then flip it if that is the wrong answer.
    fn orient_face_helper(
        &mut self,
        sk: AnyKey,
        fk: AnyKey,
        consistently: bool,
    ) -> Result<(), IsMeshError> {
        // Nodes have nothing to reorder.
        if sk.dim().index() < Dim::Face.index() {
            self.position_in_boundary(sk, fk)?;
            return Ok(());
        }
        let siblings = self.boundary_keys(sk)?;
        let pos = self.position_in_boundary(sk, fk)?;
        let mut boundary = Vec::with_capacity(siblings.len() - 1);
        for b in siblings.into_iter().filter(|&b| b != fk) {
            let shared = self.get_intersection(fk, b)?.ok_or_else(|| {
                IsMeshError::InvariantViolation(format!("{fk} and {b} share no boundary entry"))
            })?;
            boundary.push(shared);
        }
        self.set_boundary_of(fk, boundary)?;
        if (pos % 2 == 1) == consistently {
            self.invert_orientation(fk)?;
        }
        Ok(())
    }

    /// Rewrite the boundary of `cfk` as `[sk, c(b0), c(b1), ..]` where `c(b)`
    /// is the other boundary entry of `cfk` that shares `b` with `sk`.
    fn orient_coface_helper(
        &mut self,
        sk: AnyKey,
        cfk: AnyKey,
        consistently: bool,
    ) -> Result<(), IsMeshError> {
        if sk.dim() == Dim::Node {
            return Err(IsMeshError::MalformedBoundary {
                key: sk,
                reason: "nodes carry no orientation",
            });
        }
        self.position_in_boundary(cfk, sk)?;
        let mut other_side = BTreeMap::new();
        for c in self.boundary_keys(cfk)? {
            if c == sk {
                continue;
            }
            let shared = self.get_intersection(sk, c)?.ok_or_else(|| {
                IsMeshError::InvariantViolation(format!("{sk} and {c} share no boundary entry"))
            })?;
            other_side.insert(shared, c);
        }
        let mut boundary = vec![sk];
        for b in self.boundary_keys(sk)? {
            let c = other_side.get(&b).copied().ok_or_else(|| {
                IsMeshError::InvariantViolation(format!("{b} of {sk} is not shared inside {cfk}"))
            })?;
            boundary.push(c);
        }
        self.set_boundary_of(cfk, boundary)?;
        if !consistently {
            self.invert_orientation(cfk)?;
        }
        Ok(())
    }
}

/// Parity of a permutation of `0..perm.len()`, by counting inversions.
pub(crate) fn permutation_is_odd(perm: &[usize]) -> bool {
    let mut inversions = 0;
    for i in 0..perm.len() {
        for j in i + 1..perm.len() {
            if perm[i] > perm[j] {
                inversions += 1;
            }
        }
    }
    inversions % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::permutation_is_odd;
    use crate::algs::meshgen::build_from_tetrahedra;
    use crate::mesh::IsMesh;

    #[test]
    fn parity_counts_inversions() {
        assert!(!permutation_is_odd(&[0, 1, 2]));
        assert!(permutation_is_odd(&[1, 0, 2]));
        assert!(!permutation_is_odd(&[1, 2, 0]));
    }

    #[test]
    fn faces_follow_their_tetrahedron() {
        let (mut mesh, _) = build_from_tetrahedra::<(), (), (), ()>(4, &[[0, 1, 2, 3]]).unwrap();
        let t = mesh.tets.keys().next().unwrap();
        mesh.orient_faces_consistently(t).unwrap();
        for f in mesh.boundary_keys(t.into()).unwrap() {
            assert!(mesh.is_consistently_oriented(t, f).unwrap());
        }
        mesh.orient_faces_oppositely(t).unwrap();
        for f in mesh.boundary_keys(t.into()).unwrap() {
            assert!(!mesh.is_consistently_oriented(t, f).unwrap());
        }
        mesh.invert_orientation(t).unwrap();
        for f in mesh.boundary_keys(t.into()).unwrap() {
            assert!(mesh.is_consistently_oriented(t, f).unwrap());
        }
    }

    #[test]
    fn coface_follows_its_face() {
        let (mut mesh, _) = build_from_tetrahedra::<(), (), (), ()>(4, &[[0, 1, 2, 3]]).unwrap();
        let t = mesh.tets.keys().next().unwrap();
        let f = mesh.tetrahedron(t).unwrap().boundary()[2];
        mesh.orient_coface_consistently(f, t).unwrap();
        assert_eq!(mesh.tetrahedron(t).unwrap().boundary()[0], f);
        assert!(mesh.is_consistently_oriented(t, f).unwrap());
        mesh.orient_coface_oppositely(f, t).unwrap();
        assert!(!mesh.is_consistently_oriented(t, f).unwrap());

        let e = mesh.face(f).unwrap().boundary()[1];
        mesh.orient_coface_oppositely(e, f).unwrap();
        assert!(!mesh.is_consistently_oriented(f, e).unwrap());
        let n = mesh.edge(e).unwrap().boundary()[0];
        assert!(mesh.orient_coface_consistently(n, e).is_err());
    }

    #[test]
    fn inverting_one_side_breaks_coherence() {
        let (mut mesh, _): (IsMesh, _) =
            build_from_tetrahedra(5, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
        assert!(mesh.is_coherently_oriented().unwrap());
        let t = mesh.tets.keys().next().unwrap();
        mesh.invert_orientation(t).unwrap();
        assert!(!mesh.is_coherently_oriented().unwrap());
        mesh.invert_all().unwrap();
        assert!(!mesh.is_coherently_oriented().unwrap());
        mesh.invert_orientation(t).unwrap();
        assert!(mesh.is_coherently_oriented().unwrap());
    }

    #[test]
    fn glued_tetrahedra_see_the_shared_face_oppositely() {
        let (mut mesh, _): (IsMesh, _) =
            build_from_tetrahedra(5, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
        let tets: Vec<_> = mesh.tets.keys().collect();
        let shared = mesh.get_intersection(tets[0], tets[1]).unwrap().unwrap();
        mesh.orient_faces_consistently(tets[0]).unwrap();
        mesh.orient_coface_oppositely(shared, tets[1]).unwrap();
        assert!(mesh.is_consistently_oriented(tets[0], shared).unwrap());
        assert!(!mesh.is_consistently_oriented(tets[1], shared).unwrap());

        mesh.invert_all().unwrap();
        for t in tets {
            for f in mesh.boundary_keys(t.into()).unwrap() {
                if f != shared {
                    assert!(mesh.is_consistently_oriented(t, f).unwrap());
                }
            }
        }
    }
}
