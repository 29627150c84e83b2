//! Edge-connected components of a multi-face.
//!
//! A multi-face is any set of faces, typically the faces an operator is
//! about to work on. Two of its faces are adjacent when they share an edge.

use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::key::FaceKey;
use crate::topology::simplex_set::SimplexSet;
use hashbrown::HashSet;
use std::collections::VecDeque;

impl<N, E, F, T> IsMesh<N, E, F, T> {
    /// The faces of `multi_face` reachable from `f` through shared edges,
    /// `f` included.
    pub fn find_connected_component(
        &self,
        f: FaceKey,
        multi_face: &SimplexSet,
    ) -> Result<SimplexSet, IsMeshError> {
        self.walk_multi_face(f, multi_face, &SimplexSet::new())
    }

    /// Like [`find_connected_component`](Self::find_connected_component),
    /// but the walk never crosses an edge of `feature_edges`.
    pub fn find_connected_component_avoiding(
        &self,
        f: FaceKey,
        multi_face: &SimplexSet,
        feature_edges: &SimplexSet,
    ) -> Result<SimplexSet, IsMeshError> {
        self.walk_multi_face(f, multi_face, feature_edges)
    }

    /// `f` together with the faces of `multi_face` sharing an edge with it.
    pub fn find_min_multi_face(
        &self,
        f: FaceKey,
        multi_face: &SimplexSet,
    ) -> Result<SimplexSet, IsMeshError> {
        self.check_seed(f, multi_face)?;
        let mut out = SimplexSet::new();
        out.insert(f);
        for &e in self.faces.find(f)?.boundary() {
            for g in self.typed_co_boundary::<FaceKey>(e.into())? {
                if multi_face.contains(g) {
                    out.insert(g);
                }
            }
        }
        Ok(out)
    }

    fn check_seed(&self, f: FaceKey, multi_face: &SimplexSet) -> Result<(), IsMeshError> {
        self.faces.find(f)?;
        if !multi_face.contains(f) {
            return Err(IsMeshError::InvalidRegion(format!("{f} is not in the multi-face")));
        }
        Ok(())
    }

    fn walk_multi_face(
        &self,
        f: FaceKey,
        multi_face: &SimplexSet,
        feature_edges: &SimplexSet,
    ) -> Result<SimplexSet, IsMeshError> {
        self.check_seed(f, multi_face)?;
        let mut seen: HashSet<FaceKey> = HashSet::new();
        let mut queue = VecDeque::from([f]);
        seen.insert(f);
        while let Some(g) = queue.pop_front() {
            for &e in self.faces.find(g)?.boundary() {
                if feature_edges.contains(e) {
                    continue;
                }
                for next in self.typed_co_boundary::<FaceKey>(e.into())? {
                    if multi_face.contains(next) && seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        Ok(seen.into_iter().collect())
    }
}
