//! Mesh builders: from a tetrahedron list, and structured blocks of cubes.

use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::bounds::Payload;
use crate::topology::key::{EdgeKey, FaceKey, NodeKey, TetKey};
use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;

type BuildResult<N, E, F, T> = Result<(IsMesh<N, E, F, T>, Vec<NodeKey>), IsMeshError>;

fn invalid_region(message: impl Into<String>) -> IsMeshError {
    IsMeshError::InvalidRegion(message.into())
}

/// Shared edges and faces met so far, keyed by sorted vertex indices.
struct Builder<'a, N, E, F, T> {
    mesh: &'a mut IsMesh<N, E, F, T>,
    nodes: &'a [NodeKey],
    edges: HashMap<[usize; 2], EdgeKey>,
    faces: HashMap<[usize; 3], FaceKey>,
}

impl<N: Payload, E: Payload, F: Payload, T: Payload> Builder<'_, N, E, F, T> {
    fn edge(&mut self, a: usize, b: usize) -> Result<EdgeKey, IsMeshError> {
        let id = if a < b { [a, b] } else { [b, a] };
        if let Some(&e) = self.edges.get(&id) {
            return Ok(e);
        }
        let e = self.mesh.insert_edge(self.nodes[id[0]], self.nodes[id[1]])?;
        self.edges.insert(id, e);
        Ok(e)
    }

    /// The face on three vertices, its edge `i` opposite vertex `i`.
    fn face(&mut self, a: usize, b: usize, c: usize) -> Result<FaceKey, IsMeshError> {
        let mut id = [a, b, c];
        id.sort_unstable();
        if let Some(&f) = self.faces.get(&id) {
            return Ok(f);
        }
        let [a, b, c] = id;
        let (bc, ac, ab) = (self.edge(b, c)?, self.edge(a, c)?, self.edge(a, b)?);
        let f = self.mesh.insert_face(bc, ac, ab)?;
        self.faces.insert(id, f);
        Ok(f)
    }
}

/// Reorder the boundary of every tetrahedron so that the two sides of each
/// shared face see it oppositely, walking outwards from the first
/// tetrahedron of each face-connected component. A non-orientable input is
/// left with one orientation per spanning tree and a warning.
fn orient_coherently<N, E, F, T>(mesh: &mut IsMesh<N, E, F, T>) -> Result<(), IsMeshError> {
    let mut seen: HashSet<TetKey> = HashSet::new();
    let mut clashes = 0usize;
    let seeds: Vec<TetKey> = mesh.tets.keys().collect();
    for seed in seeds {
        if !seen.insert(seed) {
            continue;
        }
        let mut queue = VecDeque::from([seed]);
        while let Some(t) = queue.pop_front() {
            for f in mesh.tets.find(t)?.boundary().to_vec() {
                let consistent = mesh.is_consistently_oriented(t, f)?;
                let across: Vec<TetKey> = mesh
                    .faces
                    .find(f)?
                    .co_boundary()
                    .iter()
                    .copied()
                    .filter(|&u| u != t)
                    .collect();
                for u in across {
                    if seen.insert(u) {
                        if consistent {
                            mesh.orient_coface_oppositely(f, u)?;
                        } else {
                            mesh.orient_coface_consistently(f, u)?;
                        }
                        queue.push_back(u);
                    } else if mesh.is_consistently_oriented(u, f)? == consistent {
                        clashes += 1;
                    }
                }
            }
        }
    }
    if clashes > 0 {
        // Each clash is met once from either side.
        log::warn!("mesh is not orientable: {} face(s) cannot be oriented coherently", clashes / 2);
    }
    Ok(())
}

/// Build a mesh with `node_count` nodes and one tetrahedron per entry of
/// `tets` (vertex indices into the node list). Shared edges and faces are
/// created once, and the tetrahedra are oriented coherently across shared
/// faces. Returns the mesh and its nodes in index order.
///
/// ```rust
/// use is_mesh::algs::meshgen::build_from_tetrahedra;
/// use is_mesh::mesh::IsMesh;
/// # fn main() -> Result<(), is_mesh::mesh_error::IsMeshError> {
/// let (mesh, nodes): (IsMesh, _) = build_from_tetrahedra(5, &[[0, 1, 2, 3], [1, 2, 3, 4]])?;
/// assert_eq!(nodes.len(), 5);
/// assert_eq!((mesh.size_edges(), mesh.size_faces(), mesh.size_tetrahedra()), (9, 7, 2));
/// # Ok(())
/// # }
/// ```
pub fn build_from_tetrahedra<N, E, F, T>(
    node_count: usize,
    tets: &[[usize; 4]],
) -> BuildResult<N, E, F, T>
where
    N: Payload,
    E: Payload,
    F: Payload,
    T: Payload,
{
    for (i, cell) in tets.iter().enumerate() {
        if let Some(v) = cell.iter().find(|&&v| v >= node_count) {
            return Err(invalid_region(format!("cell {i} references missing vertex {v}")));
        }
        let mut sorted = *cell;
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(invalid_region(format!("cell {i} repeats a vertex")));
        }
    }

    let mut mesh = IsMesh::new();
    let nodes: Vec<NodeKey> = (0..node_count).map(|_| mesh.insert_node()).collect();
    let mut builder = Builder {
        mesh: &mut mesh,
        nodes: &nodes,
        edges: HashMap::new(),
        faces: HashMap::new(),
    };
    for &[a, b, c, d] in tets {
        let faces = [
            builder.face(b, c, d)?,
            builder.face(a, c, d)?,
            builder.face(a, b, d)?,
            builder.face(a, b, c)?,
        ];
        builder
            .mesh
            .insert_tetrahedron(faces[0], faces[1], faces[2], faces[3])?;
    }
    orient_coherently(&mut mesh)?;
    log::debug!(
        "built mesh: {} nodes, {} tetrahedra",
        mesh.size_nodes(),
        mesh.size_tetrahedra()
    );
    Ok((mesh, nodes))
}

/// A block of `nx`×`ny`×`nz` unit cubes, each cut into six tetrahedra
/// around its main diagonal. Neighbouring cubes are cut the same way, so the
/// cuts agree on shared cube faces. Nodes are numbered `x` fastest.
pub fn structured_block<N, E, F, T>(nx: usize, ny: usize, nz: usize) -> BuildResult<N, E, F, T>
where
    N: Payload,
    E: Payload,
    F: Payload,
    T: Payload,
{
    if nx == 0 || ny == 0 || nz == 0 {
        return Err(invalid_region("nx, ny, and nz must be positive"));
    }
    let id = |i: usize, j: usize, k: usize| (k * (ny + 1) + j) * (nx + 1) + i;
    // Monotone paths from corner 000 to corner 111, one per axis order.
    const PATHS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    let mut cells = Vec::with_capacity(6 * nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                for path in PATHS {
                    let mut corner = [i, j, k];
                    let mut cell = [id(i, j, k), 0, 0, 0];
                    for (step, &axis) in path.iter().enumerate() {
                        corner[axis] += 1;
                        cell[step + 1] = id(corner[0], corner[1], corner[2]);
                    }
                    cells.push(cell);
                }
            }
        }
    }
    build_from_tetrahedra((nx + 1) * (ny + 1) * (nz + 1), &cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_invariants::DebugInvariants;

    #[test]
    fn single_cube_has_the_expected_counts() {
        let (mesh, nodes): (IsMesh, _) = structured_block(1, 1, 1).unwrap();
        assert_eq!(nodes.len(), 8);
        assert_eq!(
            [mesh.size_nodes(), mesh.size_edges(), mesh.size_faces(), mesh.size_tetrahedra()],
            [8, 19, 18, 6]
        );
        assert_eq!(mesh.validate_invariants(), Ok(()));
    }

    #[test]
    fn neighbouring_cubes_share_their_cut() {
        let (mesh, _): (IsMesh, _) = structured_block(2, 1, 1).unwrap();
        // 12 nodes, cube faces on the shared wall are not duplicated.
        assert_eq!(mesh.size_nodes(), 12);
        assert_eq!(mesh.size_tetrahedra(), 12);
        let euler = mesh.size_nodes() as i64 - mesh.size_edges() as i64
            + mesh.size_faces() as i64
            - mesh.size_tetrahedra() as i64;
        assert_eq!(euler, 1);
        assert_eq!(mesh.validate_invariants(), Ok(()));
    }

    #[test]
    fn blocks_come_out_coherently_oriented() {
        for dims in [(1, 1, 1), (2, 2, 1), (2, 2, 2)] {
            let (mesh, _): (IsMesh, _) = structured_block(dims.0, dims.1, dims.2).unwrap();
            assert!(mesh.is_coherently_oriented().unwrap(), "{dims:?}");
            for (f, face) in mesh.faces() {
                let sides: Vec<_> = face.co_boundary().iter().copied().collect();
                if let [a, b] = sides[..] {
                    assert_ne!(
                        mesh.is_consistently_oriented(a, f).unwrap(),
                        mesh.is_consistently_oriented(b, f).unwrap(),
                        "{f} between {a} and {b}"
                    );
                }
            }
        }
    }

    #[test]
    fn listed_cells_are_reoriented_to_agree() {
        // Both cells list the shared face (1, 2, 3) the same way round.
        let (mesh, _): (IsMesh, _) =
            build_from_tetrahedra(5, &[[0, 1, 2, 3], [4, 1, 2, 3]]).unwrap();
        assert!(mesh.is_coherently_oriented().unwrap());
    }

    #[test]
    fn bad_cells_are_rejected() {
        assert!(matches!(
            build_from_tetrahedra::<(), (), (), ()>(3, &[[0, 1, 2, 3]]),
            Err(IsMeshError::InvalidRegion(_))
        ));
        assert!(matches!(
            build_from_tetrahedra::<(), (), (), ()>(4, &[[0, 1, 1, 3]]),
            Err(IsMeshError::InvalidRegion(_))
        ));
        assert!(structured_block::<(), (), (), ()>(0, 1, 1).is_err());
    }
}
