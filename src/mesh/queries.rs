//! Read-only topological queries: boundary, closure, star, link and friends.

use crate::mesh::traversal::StarWalk;
use crate::mesh::{IsMesh, narrow};
use crate::mesh_error::IsMeshError;
use crate::topology::key::{AnyKey, Dim, EdgeKey, NodeKey};
use crate::topology::simplex_set::SimplexSet;
use std::collections::{BTreeMap, BTreeSet};

impl<N, E, F, T> IsMesh<N, E, F, T> {
    /// Whether `f` lies in the boundary closure of `s` (strictly lower).
    pub fn in_boundary(&self, f: impl Into<AnyKey>, s: impl Into<AnyKey>) -> Result<bool, IsMeshError> {
        let (f, s) = (f.into(), s.into());
        if f.dim() >= s.dim() {
            return Ok(false);
        }
        let boundary = self.boundary_keys(s)?;
        if f.dim().index() + 1 == s.dim().index() {
            return Ok(boundary.contains(&f));
        }
        for b in boundary {
            if self.in_boundary(f, b)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Strict boundary closure of `k`; empty for a node.
    pub fn boundary(&self, k: impl Into<AnyKey>) -> Result<SimplexSet, IsMeshError> {
        let k = k.into();
        let mut set = SimplexSet::new();
        let mut frontier = self.boundary_keys(k)?;
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for b in frontier {
                if set.insert(b) {
                    next.extend(self.boundary_keys(b)?);
                }
            }
            frontier = next;
        }
        Ok(set)
    }

    /// `boundary(k) ∪ {k}`.
    pub fn closure(&self, k: impl Into<AnyKey>) -> Result<SimplexSet, IsMeshError> {
        let k = k.into();
        let mut set = self.boundary(k)?;
        set.insert(k);
        Ok(set)
    }

    /// Union of the closures of every member, expanded one dimension at a
    /// time from the top so each lower simplex is inserted once per co-face
    /// rather than once per ancestor.
    pub fn closure_set(&self, input: &SimplexSet) -> Result<SimplexSet, IsMeshError> {
        let mut set = input.clone();
        let faces: Vec<_> = set.tetrahedra().collect();
        for t in faces {
            set.extend(self.tets.find(t)?.boundary().iter().copied());
        }
        let faces: Vec<_> = set.faces().collect();
        for f in faces {
            set.extend(self.faces.find(f)?.boundary().iter().copied());
        }
        let edges: Vec<_> = set.edges().collect();
        for e in edges {
            set.extend(self.edges.find(e)?.boundary().iter().copied());
        }
        for n in set.nodes() {
            self.nodes.find(n)?;
        }
        Ok(set)
    }

    /// The restricted star of `k`: every simplex having `k` in its boundary
    /// closure. `k` itself is not included.
    pub fn star(&self, k: impl Into<AnyKey>) -> Result<SimplexSet, IsMeshError> {
        let k = k.into();
        let mut visited = Vec::new();
        let walked = self.label_star(k, &mut visited);
        let set = visited.iter().copied().collect();
        self.reset_labels(&visited);
        walked.map(|_| set)
    }

    /// Label every component of `star(k)` with the same label 1.
    fn label_star(&self, k: AnyKey, visited: &mut Vec<AnyKey>) -> Result<(), IsMeshError> {
        let walk = StarWalk::new(self, k);
        for c in self.co_boundary_keys(k)? {
            walk.label_component(c, 1, visited)?;
        }
        Ok(())
    }

    /// Every co-face of `k`, whether or not its co-boundary is compact.
    pub fn full_co_boundary(&self, k: impl Into<AnyKey>) -> Result<Vec<AnyKey>, IsMeshError> {
        let k = k.into();
        if !self.is_compact_of(k)? || matches!(k.dim(), Dim::Face | Dim::Tetrahedron) {
            return self.co_boundary_keys(k);
        }
        let Some(up) = k.dim().up() else {
            return Ok(Vec::new());
        };
        Ok(self.star(k)?.of_dim(up).collect())
    }

    /// `closure(star(k)) \ star(k) \ closure(k)`.
    pub fn link(&self, k: impl Into<AnyKey>) -> Result<SimplexSet, IsMeshError> {
        let k = k.into();
        let star = self.star(k)?;
        let mut link = self.closure_set(&star)?;
        link.difference(&star);
        link.difference(&self.closure(k)?);
        Ok(link)
    }

    /// Manifold-boundary test: a face is boundary unless it bounds two
    /// tetrahedra; a node or edge is boundary if a face of its star is, or
    /// if it has no face at all. Tetrahedra are never boundary.
    pub fn is_boundary(&self, k: impl Into<AnyKey>) -> Result<bool, IsMeshError> {
        match k.into() {
            AnyKey::Tetrahedron(t) => {
                self.tets.find(t)?;
                Ok(false)
            }
            AnyKey::Face(f) => Ok(self.faces.find(f)?.co_boundary().len() != 2),
            k => {
                let star = self.star(k)?;
                if star.size_faces() == 0 {
                    return Ok(true);
                }
                for f in star.faces() {
                    if self.faces.find(f)?.co_boundary().len() != 2 {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Nodes of `k`, entry `i` being the node opposite boundary entry `i`.
    ///
    /// For an edge this is its boundary reversed; for faces and tetrahedra the
    /// order carries the orientation encoded by the boundary list.
    pub fn vertices(&self, k: impl Into<AnyKey>) -> Result<Vec<NodeKey>, IsMeshError> {
        let k = k.into();
        if let AnyKey::Node(n) = k {
            self.nodes.find(n)?;
            return Ok(vec![n]);
        }
        let all = self.node_set(k)?;
        let mut verts = Vec::with_capacity(all.len());
        for b in self.boundary_keys(k)? {
            let sub = self.node_set(b)?;
            let mut opposite = all.difference(&sub);
            match (opposite.next(), opposite.next()) {
                (Some(&v), None) => verts.push(v),
                _ => {
                    return Err(IsMeshError::InvariantViolation(format!(
                        "{b} does not miss exactly one node of {k}"
                    )));
                }
            }
        }
        Ok(verts)
    }

    /// Distinct nodes in the closure of `k`.
    pub(crate) fn node_set(&self, k: AnyKey) -> Result<BTreeSet<NodeKey>, IsMeshError> {
        Ok(match k {
            AnyKey::Node(n) => BTreeSet::from([n]),
            k => self.boundary(k)?.nodes().collect(),
        })
    }

    /// The edges along the rim of a face patch (used by exactly one face of
    /// the patch), together with their nodes.
    pub fn boundary_2manifold(&self, faces: &SimplexSet) -> Result<SimplexSet, IsMeshError> {
        let mut count: BTreeMap<EdgeKey, usize> = BTreeMap::new();
        for f in faces.faces() {
            for &e in self.faces.find(f)?.boundary() {
                *count.entry(e).or_default() += 1;
            }
        }
        let rim: SimplexSet = count
            .into_iter()
            .filter(|&(_, c)| c == 1)
            .map(|(e, _)| e)
            .collect();
        self.closure_set(&rim)
    }

    /// The faces used by exactly one tetrahedron of a patch, closed downwards.
    pub fn boundary_3manifold(&self, tets: &SimplexSet) -> Result<SimplexSet, IsMeshError> {
        let mut count = BTreeMap::new();
        for t in tets.tetrahedra() {
            for &f in self.tets.find(t)?.boundary() {
                *count.entry(f).or_insert(0usize) += 1;
            }
        }
        let hull: SimplexSet = count
            .into_iter()
            .filter(|&(_, c)| c == 1)
            .map(|(f, _)| f)
            .collect();
        self.closure_set(&hull)
    }

    /// The endpoints of an edge.
    pub(crate) fn edge_nodes(&self, e: EdgeKey) -> Result<[NodeKey; 2], IsMeshError> {
        match self.edges.find(e)?.boundary() {
            &[a, b] => Ok([a, b]),
            _ => Err(IsMeshError::InvariantViolation(format!("{e} has a partial boundary"))),
        }
    }

    /// The first boundary entry `a` and `b` share.
    pub fn get_intersection(
        &self,
        a: impl Into<AnyKey>,
        b: impl Into<AnyKey>,
    ) -> Result<Option<AnyKey>, IsMeshError> {
        let other = self.boundary_keys(b.into())?;
        Ok(self
            .boundary_keys(a.into())?
            .into_iter()
            .find(|k| other.contains(k)))
    }

    /// [`full_co_boundary`](Self::full_co_boundary), narrowed to `K`.
    pub(crate) fn typed_co_boundary<K: crate::topology::key::SimplexKey>(
        &self,
        k: AnyKey,
    ) -> Result<Vec<K>, IsMeshError> {
        self.full_co_boundary(k)?.into_iter().map(narrow).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::algs::meshgen::build_from_tetrahedra;
    use crate::topology::key::AnyKey;

    #[test]
    fn star_closure_and_link_of_a_tetrahedron_corner() {
        let (mesh, n) = build_from_tetrahedra::<(), (), (), ()>(4, &[[0, 1, 2, 3]]).unwrap();
        let st = mesh.star(n[0]).unwrap();
        assert_eq!(
            (st.size_nodes(), st.size_edges(), st.size_faces(), st.size_tetrahedra()),
            (0, 3, 3, 1)
        );
        let lk = mesh.link(n[0]).unwrap();
        assert_eq!((lk.size_nodes(), lk.size_edges(), lk.size_faces()), (3, 3, 1));
        let t = st.tetrahedra().next().unwrap();
        let cl = mesh.closure(t).unwrap();
        assert_eq!(cl.len(), 4 + 6 + 4 + 1);
        assert_eq!(mesh.boundary(n[0]).unwrap().len(), 0);
        assert!(mesh.in_boundary(n[0], t).unwrap());
        assert!(!mesh.in_boundary(t, n[0]).unwrap());
    }

    #[test]
    fn star_stays_inside_non_manifold_junctions() {
        // Two tetrahedra touching at node 0 only.
        let (mesh, n) =
            build_from_tetrahedra::<(), (), (), ()>(7, &[[0, 1, 2, 3], [0, 4, 5, 6]]).unwrap();
        let st = mesh.star(n[0]).unwrap();
        assert_eq!(st.size_tetrahedra(), 2);
        assert_eq!(st.size_edges(), 6);
        let e = mesh.edge_between(n[0], n[1]).unwrap().unwrap();
        let st_e = mesh.star(e).unwrap();
        assert_eq!((st_e.size_faces(), st_e.size_tetrahedra()), (2, 1));
        assert!(st_e.iter().all(|k| mesh.in_boundary(AnyKey::from(e), k).unwrap()));
    }

    #[test]
    fn vertices_are_opposite_boundary_entries() {
        let (mesh, n) = build_from_tetrahedra::<(), (), (), ()>(4, &[[0, 1, 2, 3]]).unwrap();
        let e = mesh.edge_between(n[0], n[1]).unwrap().unwrap();
        let b = mesh.edge(e).unwrap().boundary().to_vec();
        assert_eq!(mesh.vertices(e).unwrap(), vec![b[1], b[0]]);
        let (t, tet) = mesh.tetrahedra().next().unwrap();
        let verts = mesh.vertices(t).unwrap();
        for (i, &f) in tet.boundary().iter().enumerate() {
            assert!(!mesh.node_set(f.into()).unwrap().contains(&verts[i]));
        }
    }

    #[test]
    fn boundary_of_a_single_tetrahedron() {
        let (mesh, n) = build_from_tetrahedra::<(), (), (), ()>(4, &[[0, 1, 2, 3]]).unwrap();
        for (f, _) in mesh.faces() {
            assert!(mesh.is_boundary(f).unwrap());
        }
        assert!(mesh.is_boundary(n[2]).unwrap());
        let (t, _) = mesh.tetrahedra().next().unwrap();
        assert!(!mesh.is_boundary(t).unwrap());
        let patch = mesh.star(n[0]).unwrap();
        let hull = mesh.boundary_3manifold(&patch).unwrap();
        assert_eq!(hull.size_faces(), 4);
    }
}
