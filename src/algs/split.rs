//! 1-to-N subdivisions: a new node replaces a tetrahedron, a face or an edge
//! together with its star, and is coned over what is left around it.

use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::bounds::Payload;
use crate::topology::key::{EdgeKey, FaceKey, NodeKey, TetKey};
use crate::topology::simplex_set::SimplexSet;

impl<N: Payload, E: Payload, F: Payload, T: Payload> IsMesh<N, E, F, T> {
    /// Replace `t` by four tetrahedra meeting at a new interior node.
    pub fn split_tetrahedron(&mut self, t: TetKey) -> Result<NodeKey, IsMeshError> {
        log::debug!("split_tetrahedron {t}");
        self.tets.find(t)?;
        let interior: SimplexSet = [t].into_iter().collect();
        let cavity = self.open_cavity(interior, true)?;
        let (n, _) = self.cone_fill(&cavity.shell)?;
        self.finish_operator()?;
        Ok(n)
    }

    /// Replace `f` by three faces meeting at a new node, and each tetrahedron
    /// of its star by three tetrahedra.
    pub fn split_face(&mut self, f: FaceKey) -> Result<NodeKey, IsMeshError> {
        log::debug!("split_face {f}");
        let mut interior = self.star(f)?;
        interior.insert(f);
        let cavity = self.open_cavity(interior, true)?;
        let (n, _) = self.cone_fill(&cavity.shell)?;
        self.finish_operator()?;
        Ok(n)
    }

    /// Split `e = (n1, n2)` at a new node `n`. The halves keep the direction
    /// of `e`: they run `n1 -> n` and `n -> n2`.
    pub fn split_edge(&mut self, e: EdgeKey) -> Result<NodeKey, IsMeshError> {
        log::debug!("split_edge {e}");
        let [n1, n2] = self.edge_nodes(e)?;
        let mut interior = self.star(e)?;
        interior.insert(e);
        let cavity = self.open_cavity(interior, true)?;
        let (n, _) = self.cone_fill(&cavity.shell)?;
        for (m, first) in [(n1, true), (n2, false)] {
            let half = self.edge_between(m, n)?.ok_or_else(|| {
                IsMeshError::InvariantViolation(format!("no half of {e} reaches {m}"))
            })?;
            let [a, _] = self.edge_nodes(half)?;
            if (a == m) != first {
                self.invert_orientation(half)?;
            }
        }
        self.finish_operator()?;
        Ok(n)
    }
}
