//! Vertex insertion: replace a patch of tetrahedra by the star of one new
//! node over the patch's hull.

use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::bounds::Payload;
use crate::topology::key::NodeKey;
use crate::topology::simplex_set::SimplexSet;

impl<N: Payload, E: Payload, F: Payload, T: Payload> IsMesh<N, E, F, T> {
    /// Remove the tetrahedra of `tets` together with everything strictly
    /// inside their hull, then cone a new node over the hull. Keys of other
    /// dimensions in `tets` are ignored. Returns the new node and every
    /// simplex created.
    pub fn vertex_insertion(
        &mut self,
        tets: &SimplexSet,
    ) -> Result<(NodeKey, SimplexSet), IsMeshError> {
        log::debug!("vertex_insertion over {} tetrahedra", tets.size_tetrahedra());
        let patch: SimplexSet = tets.tetrahedra().collect();
        if patch.is_empty() {
            return Err(IsMeshError::InvalidRegion("no tetrahedra to replace".to_string()));
        }
        let mut interior = self.closure_set(&patch)?;
        interior.difference(&self.boundary_3manifold(&patch)?);
        self.check_cavity(&interior)?;

        let cavity = self.open_cavity(interior, true)?;
        let (n, created) = self.cone_fill(&cavity.shell)?;
        self.finish_operator()?;
        Ok((n, created))
    }
}
