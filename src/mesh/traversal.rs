//! Worklist traversal of a restricted star.
//!
//! The walk starts at a co-face of the seed and moves through the Hasse
//! diagram of the mesh. Every discovered simplex schedules two moves: `Up`
//! through its (possibly compact) co-boundary and `Down` through its
//! boundary. Moving down is gated by a containment test so the walk never
//! leaves the star of the seed. Moving up needs no test: a co-face of a
//! simplex containing the seed contains the seed as well.
//!
//! Descending matters for compact co-boundaries: a compact edge only lists
//! one face per component, and the other faces of that component are found
//! by going up to a tetrahedron and back down.

use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::key::AnyKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Down,
    Up,
}

/// Labels the connected component of `star(seed)` reached from `start`.
pub(crate) struct StarWalk<'a, N, E, F, T> {
    mesh: &'a IsMesh<N, E, F, T>,
    seed: AnyKey,
}

impl<'a, N, E, F, T> StarWalk<'a, N, E, F, T> {
    pub(crate) fn new(mesh: &'a IsMesh<N, E, F, T>, seed: AnyKey) -> Self {
        Self { mesh, seed }
    }

    /// Give every simplex of the component containing `start` the label
    /// `label` and append it to `visited`. Simplices that already carry a
    /// non-zero label are treated as visited.
    ///
    /// The caller owns the labels: it must reset everything in `visited`
    /// once it is done with them.
    pub(crate) fn label_component(
        &self,
        start: AnyKey,
        label: u32,
        visited: &mut Vec<AnyKey>,
    ) -> Result<(), IsMeshError> {
        debug_assert!(label != 0);
        if self.mesh.label_of(start)? != 0 {
            return Ok(());
        }
        self.mesh.set_label_of(start, label)?;
        visited.push(start);
        let mut stack = vec![(start, Dir::Down), (start, Dir::Up)];

        while let Some((k, dir)) = stack.pop() {
            let next = match dir {
                Dir::Up => self.mesh.co_boundary_keys(k)?,
                // Boundary entries one dimension above the seed are reached
                // from below; only deeper simplices are worth descending.
                Dir::Down if k.dim().index() > self.seed.dim().index() + 1 => {
                    let mut inside = Vec::new();
                    for b in self.mesh.boundary_keys(k)? {
                        if self.mesh.in_boundary(self.seed, b)? {
                            inside.push(b);
                        }
                    }
                    inside
                }
                Dir::Down => Vec::new(),
            };
            for c in next {
                if self.mesh.label_of(c)? == 0 {
                    self.mesh.set_label_of(c, label)?;
                    visited.push(c);
                    stack.push((c, Dir::Down));
                    stack.push((c, Dir::Up));
                }
            }
        }
        Ok(())
    }
}
