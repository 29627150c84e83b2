//! Edge removal and multi-face retriangulation.
//!
//! Both carve out a cavity that is a cone from one or two *apices* over a
//! polygon of nodes, and refill it from a new triangulation of that polygon.
//! The triangulation is described by its new edges (diagonals); the triangles
//! are recovered from the polygon sides and diagonals, and the description is
//! checked in full before the mesh is touched.

use crate::algs::cavity::lookup;
use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::bounds::Payload;
use crate::topology::key::{EdgeKey, FaceKey, NodeKey, TetKey};
use crate::topology::simplex_set::SimplexSet;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

type Pair = (NodeKey, NodeKey);

fn pair(a: NodeKey, b: NodeKey) -> Pair {
    if a <= b { (a, b) } else { (b, a) }
}

fn invalid(message: String) -> IsMeshError {
    IsMeshError::InvalidRegion(message)
}

/// Nodes around a cavity, in cyclic order.
#[derive(Clone, Debug)]
struct Polygon {
    nodes: Vec<NodeKey>,
    /// Edge from `nodes[i]` to `nodes[i + 1]`; `None` closes an open path.
    sides: Vec<Option<EdgeKey>>,
}

impl Polygon {
    fn pairs(&self) -> impl Iterator<Item = (Pair, Option<EdgeKey>)> + '_ {
        let k = self.nodes.len();
        (0..k).map(move |i| (pair(self.nodes[i], self.nodes[(i + 1) % k]), self.sides[i]))
    }

    /// Recover the triangles spanned by the sides and `diagonals`, which must
    /// form a triangulation of the polygon.
    fn triangulate(&self, diagonals: &[Pair]) -> Result<Vec<[NodeKey; 3]>, IsMeshError> {
        let k = self.nodes.len();
        if k < 3 {
            return Err(invalid(format!("a polygon of {k} nodes cannot be triangulated")));
        }
        if diagonals.len() != k - 3 {
            return Err(invalid(format!(
                "a polygon of {k} nodes needs {} new edges, got {}",
                k - 3,
                diagonals.len()
            )));
        }
        let sides: BTreeSet<Pair> = self.pairs().map(|(p, _)| p).collect();
        let corners: BTreeSet<NodeKey> = self.nodes.iter().copied().collect();
        let mut chords = BTreeSet::new();
        for &(a, b) in diagonals {
            if a == b || !corners.contains(&a) || !corners.contains(&b) {
                return Err(invalid(format!("new edge ({a}, {b}) does not join two polygon nodes")));
            }
            if sides.contains(&pair(a, b)) || !chords.insert(pair(a, b)) {
                return Err(invalid(format!("new edge ({a}, {b}) is given twice or is a side")));
            }
        }
        let spanned = |p: &Pair| sides.contains(p) || chords.contains(p);
        let triangles = self
            .nodes
            .iter()
            .copied()
            .tuple_combinations()
            .filter(|&(a, b, c)| [pair(a, b), pair(b, c), pair(a, c)].iter().all(spanned))
            .map(|(a, b, c)| [a, b, c])
            .collect_vec();
        let uses = |p: Pair| {
            triangles
                .iter()
                .filter(|t| t.contains(&p.0) && t.contains(&p.1))
                .count()
        };
        if triangles.len() != k - 2
            || sides.iter().any(|&p| uses(p) != 1)
            || chords.iter().any(|&p| uses(p) != 2)
        {
            return Err(invalid("the new edges do not triangulate the polygon".to_string()));
        }
        Ok(triangles)
    }
}

/// The edges from each apex to the polygon nodes, and the surviving face
/// over each polygon side, gathered before the cavity is opened.
struct ApexFans {
    spokes: Vec<BTreeMap<NodeKey, EdgeKey>>,
    fans: Vec<BTreeMap<EdgeKey, FaceKey>>,
}

/// A face patch together with the tetrahedra on either side of it.
struct Sandwich {
    apices: Vec<NodeKey>,
    interior: SimplexSet,
    rim: Vec<EdgeKey>,
}

impl<N, E, F, T> IsMesh<N, E, F, T> {
    /// Order `rim` into a polygon. An open path is accepted when
    /// `allow_open`; its ends are then joined by a side with no edge yet.
    fn trace_polygon(&self, rim: &[EdgeKey], allow_open: bool) -> Result<Polygon, IsMeshError> {
        let mut around: BTreeMap<NodeKey, Vec<(NodeKey, EdgeKey)>> = BTreeMap::new();
        for &e in rim {
            let [a, b] = self.edge_nodes(e)?;
            around.entry(a).or_default().push((b, e));
            around.entry(b).or_default().push((a, e));
        }
        let ends = around
            .iter()
            .filter(|(_, next)| next.len() == 1)
            .map(|(&n, _)| n)
            .collect_vec();
        let simple = around.values().all(|next| next.len() <= 2)
            && (ends.is_empty() || (allow_open && ends.len() == 2));
        if !simple {
            return Err(invalid("the rim is not a simple polygon".to_string()));
        }
        let start = ends
            .first()
            .or_else(|| around.keys().next())
            .copied()
            .ok_or_else(|| invalid("the rim is empty".to_string()))?;

        let mut nodes = vec![start];
        let mut sides = Vec::new();
        let (mut current, mut came_by) = (start, None);
        loop {
            let next = around
                .get(&current)
                .and_then(|next| next.iter().find(|&&(_, e)| Some(e) != came_by));
            match next {
                Some(&(m, e)) => {
                    sides.push(Some(e));
                    came_by = Some(e);
                    if m == start {
                        break;
                    }
                    nodes.push(m);
                    current = m;
                }
                None => {
                    sides.push(None);
                    break;
                }
            }
        }
        if sides.iter().flatten().count() != rim.len() {
            return Err(invalid("the rim is not connected".to_string()));
        }
        Ok(Polygon { nodes, sides })
    }

    fn apex_fans(
        &self,
        polygon: &Polygon,
        apices: &[NodeKey],
        interior: &SimplexSet,
    ) -> Result<ApexFans, IsMeshError> {
        let mut spokes = Vec::with_capacity(apices.len());
        let mut fans = Vec::with_capacity(apices.len());
        for &apex in apices {
            if polygon.nodes.contains(&apex) {
                return Err(invalid(format!("apex {apex} lies on the polygon")));
            }
            let mut spoke = BTreeMap::new();
            for &m in &polygon.nodes {
                let e = self
                    .edge_between(apex, m)?
                    .filter(|&e| !interior.contains(e))
                    .ok_or_else(|| invalid(format!("apex {apex} is not joined to {m}")))?;
                spoke.insert(m, e);
            }
            let mut fan = BTreeMap::new();
            for (i, side) in polygon.sides.iter().enumerate() {
                let Some(side) = *side else { continue };
                let a = polygon.nodes[i];
                let b = polygon.nodes[(i + 1) % polygon.nodes.len()];
                let wanted = [side, lookup(&spoke, a)?, lookup(&spoke, b)?];
                let mut over = None;
                for f in self.typed_co_boundary::<FaceKey>(side.into())? {
                    let edges = self.faces.find(f)?.boundary();
                    if wanted.iter().all(|e| edges.contains(e)) {
                        over = Some(f);
                    }
                }
                let f = over
                    .filter(|&f| !interior.contains(f))
                    .ok_or_else(|| invalid(format!("no face joins {side} to apex {apex}")))?;
                fan.insert(side, f);
            }
            spokes.push(spoke);
            fans.push(fan);
        }
        Ok(ApexFans { spokes, fans })
    }

    /// New edges must not exist already, unless the cavity swallows them.
    fn check_new_edges(&self, chords: &[Pair], interior: &SimplexSet) -> Result<(), IsMeshError> {
        for &(a, b) in chords {
            if let Some(e) = self.edge_between(a, b)? {
                if !interior.contains(e) {
                    return Err(IsMeshError::DuplicateSimplex(e.into()));
                }
            }
        }
        Ok(())
    }

    /// New triangles must not exist already, unless the cavity swallows them.
    fn check_new_faces(
        &self,
        triangles: &[[NodeKey; 3]],
        interior: &SimplexSet,
    ) -> Result<(), IsMeshError> {
        for &[a, b, c] in triangles {
            let (Some(ab), Some(bc), Some(ca)) = (
                self.edge_between(a, b)?,
                self.edge_between(b, c)?,
                self.edge_between(c, a)?,
            ) else {
                continue;
            };
            for f in self.typed_co_boundary::<FaceKey>(ab.into())? {
                let edges = self.faces.find(f)?.boundary();
                if edges.contains(&bc) && edges.contains(&ca) && !interior.contains(f) {
                    return Err(IsMeshError::DuplicateSimplex(f.into()));
                }
            }
        }
        Ok(())
    }

    /// Split the tetrahedra around a face patch into the cavity to carve
    /// out and what stays around it. Every face of the patch must see the
    /// same one or two apices.
    fn sandwich(&self, faces: &SimplexSet) -> Result<Sandwich, IsMeshError> {
        if faces.size_faces() == 0 {
            return Err(invalid("no faces to retriangulate".to_string()));
        }
        let mut tets = SimplexSet::new();
        let mut apices: Option<BTreeSet<NodeKey>> = None;
        for f in faces.faces() {
            let corners = self.node_set(f.into())?;
            let mut tips = BTreeSet::new();
            for &t in self.faces.find(f)?.co_boundary() {
                let tip = self.node_set(t.into())?.difference(&corners).copied().collect_vec();
                match tip.as_slice() {
                    [tip] => tips.insert(*tip),
                    _ => {
                        return Err(IsMeshError::InvariantViolation(format!(
                            "{t} does not have exactly one node off {f}"
                        )));
                    }
                };
                tets.insert(t);
            }
            match &apices {
                None => apices = Some(tips),
                Some(seen) if *seen == tips => {}
                Some(_) => {
                    return Err(invalid(format!(
                        "{f} does not see the same apices as the rest of the patch"
                    )));
                }
            }
        }
        let apices = apices.unwrap_or_default();
        if apices.is_empty() {
            return Err(invalid("the patch bounds no tetrahedron".to_string()));
        }

        let mut count: BTreeMap<FaceKey, usize> = BTreeMap::new();
        for t in tets.tetrahedra() {
            for &f in self.tets.find(t)?.boundary() {
                *count.entry(f).or_default() += 1;
            }
        }
        let hull: SimplexSet = count
            .into_iter()
            .filter(|&(f, c)| c == 1 && !faces.contains(f))
            .map(|(f, _)| f)
            .collect();
        let mut inner = tets;
        inner.add(faces);
        let mut interior = self.closure_set(&inner)?;
        interior.difference(&self.closure_set(&hull)?);
        self.check_cavity(&interior)?;

        let rim = self.boundary_2manifold(faces)?.edges().collect();
        Ok(Sandwich {
            apices: apices.into_iter().collect(),
            interior,
            rim,
        })
    }
}

impl<N: Payload, E: Payload, F: Payload, T: Payload> IsMesh<N, E, F, T> {
    /// Refill an opened cavity with one tetrahedron per apex over every
    /// triangle. Returns the triangles and everything created.
    fn fill_polygon(
        &mut self,
        polygon: &Polygon,
        chords: &[Pair],
        triangles: &[[NodeKey; 3]],
        apex_fans: ApexFans,
    ) -> Result<(Vec<FaceKey>, SimplexSet), IsMeshError> {
        let ApexFans { spokes, mut fans } = apex_fans;
        let settled = fans.iter().flat_map(|fan| fan.values().copied()).collect_vec();
        let mut created = SimplexSet::new();
        let mut edge_of: BTreeMap<Pair, EdgeKey> = polygon
            .pairs()
            .filter_map(|(p, side)| side.map(|e| (p, e)))
            .collect();

        for &(a, b) in chords {
            let e = self.insert_edge_unchecked(a, b)?;
            created.insert(e);
            edge_of.insert(pair(a, b), e);
            for (spoke, fan) in spokes.iter().zip(fans.iter_mut()) {
                let f = self.insert_face_unchecked(e, lookup(spoke, a)?, lookup(spoke, b)?)?;
                created.insert(f);
                fan.insert(e, f);
            }
        }

        let mut new_faces = Vec::with_capacity(triangles.len());
        let mut new_tets: Vec<TetKey> = Vec::new();
        for &[a, b, c] in triangles {
            let sides = [
                lookup(&edge_of, pair(a, b))?,
                lookup(&edge_of, pair(b, c))?,
                lookup(&edge_of, pair(c, a))?,
            ];
            let f = self.insert_face_unchecked(sides[0], sides[1], sides[2])?;
            created.insert(f);
            new_faces.push(f);
            for fan in &fans {
                let t = self.insert_tetrahedron_unchecked(
                    f,
                    lookup(fan, sides[0])?,
                    lookup(fan, sides[1])?,
                    lookup(fan, sides[2])?,
                )?;
                created.insert(t);
                new_tets.push(t);
            }
        }
        self.orient_new_tetrahedra(settled, new_tets)?;
        Ok((new_faces, created))
    }

    /// Remove `e` with its star and refill the cavity from the two ends of
    /// `e` over a triangulation of its link. `new_edges` lists the diagonals
    /// of that triangulation: none when the link is a triangle (the 3-2
    /// flip), `k - 3` for a link of `k` nodes. When `e` lies on the boundary
    /// its link is an open path, and the path ends are joined by one more
    /// new edge. Returns every simplex created.
    pub fn remove_edge(
        &mut self,
        e: EdgeKey,
        new_edges: &[(NodeKey, NodeKey)],
    ) -> Result<SimplexSet, IsMeshError> {
        log::debug!("remove_edge {e} with {} new edge(s)", new_edges.len());
        let [n1, n2] = self.edge_nodes(e)?;
        let mut interior = self.star(e)?;
        interior.insert(e);
        let mut rim = Vec::new();
        for m in self.link(e)?.edges() {
            let ends = self.edge_nodes(m)?;
            if !ends.contains(&n1) && !ends.contains(&n2) {
                rim.push(m);
            }
        }
        let polygon = self.trace_polygon(&rim, true)?;
        let triangles = polygon.triangulate(new_edges)?;
        let mut chords = new_edges.to_vec();
        chords.extend(polygon.pairs().filter(|(_, side)| side.is_none()).map(|(p, _)| p));
        self.check_new_edges(&chords, &interior)?;
        self.check_new_faces(&triangles, &interior)?;
        let fans = self.apex_fans(&polygon, &[n1, n2], &interior)?;

        self.open_cavity(interior, true)?;
        let (_, created) = self.fill_polygon(&polygon, &chords, &triangles, fans)?;
        self.finish_operator()?;
        Ok(created)
    }

    /// Retriangulate a patch of faces seen from the same one or two apices.
    /// The patch, the tetrahedra on it and everything strictly inside are
    /// replaced by the triangulation of its rim given by `new_edges`.
    /// Returns the new faces of the patch and every simplex created.
    pub fn multi_face_retriangulation(
        &mut self,
        faces: &SimplexSet,
        new_edges: &[(NodeKey, NodeKey)],
    ) -> Result<(Vec<FaceKey>, SimplexSet), IsMeshError> {
        log::debug!(
            "multi_face_retriangulation of {} face(s) with {} new edge(s)",
            faces.size_faces(),
            new_edges.len()
        );
        let sandwich = self.sandwich(faces)?;
        let polygon = self.trace_polygon(&sandwich.rim, false)?;
        let triangles = polygon.triangulate(new_edges)?;
        self.check_new_edges(new_edges, &sandwich.interior)?;
        self.check_new_faces(&triangles, &sandwich.interior)?;
        let fans = self.apex_fans(&polygon, &sandwich.apices, &sandwich.interior)?;

        self.open_cavity(sandwich.interior, true)?;
        let out = self.fill_polygon(&polygon, new_edges, &triangles, fans)?;
        self.finish_operator()?;
        Ok(out)
    }

    /// Replace a patch of faces between two apices by the edge joining the
    /// apices, with one tetrahedron around that edge per rim edge. For a
    /// single face this is the 2-3 flip. Returns every simplex created.
    pub fn multi_face_remove(&mut self, faces: &SimplexSet) -> Result<SimplexSet, IsMeshError> {
        log::debug!("multi_face_remove of {} face(s)", faces.size_faces());
        let sandwich = self.sandwich(faces)?;
        let &[top, bottom] = sandwich.apices.as_slice() else {
            return Err(invalid("removing a face patch needs a tetrahedron on both sides".to_string()));
        };
        if let Some(e) = self.edge_between(top, bottom)? {
            return Err(IsMeshError::DuplicateSimplex(e.into()));
        }
        let polygon = self.trace_polygon(&sandwich.rim, false)?;
        let ApexFans { spokes, fans } =
            self.apex_fans(&polygon, &sandwich.apices, &sandwich.interior)?;

        self.open_cavity(sandwich.interior, true)?;
        let mut created = SimplexSet::new();
        let axis = self.insert_edge_unchecked(top, bottom)?;
        created.insert(axis);
        let mut blades = BTreeMap::new();
        for &m in &polygon.nodes {
            let f = self.insert_face_unchecked(axis, lookup(&spokes[0], m)?, lookup(&spokes[1], m)?)?;
            created.insert(f);
            blades.insert(m, f);
        }
        let mut new_tets = Vec::with_capacity(polygon.nodes.len());
        for (i, side) in polygon.sides.iter().enumerate() {
            let Some(side) = *side else { continue };
            let a = polygon.nodes[i];
            let b = polygon.nodes[(i + 1) % polygon.nodes.len()];
            let t = self.insert_tetrahedron_unchecked(
                lookup(&fans[0], side)?,
                lookup(&fans[1], side)?,
                lookup(&blades, a)?,
                lookup(&blades, b)?,
            )?;
            created.insert(t);
            new_tets.push(t);
        }
        let settled = fans.iter().flat_map(|fan| fan.values().copied()).collect_vec();
        self.orient_new_tetrahedra(settled, new_tets)?;
        self.finish_operator()?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use crate::algs::meshgen::build_from_tetrahedra;
    use crate::debug_invariants::DebugInvariants;
    use crate::mesh::IsMesh;
    use crate::mesh_error::IsMeshError;
    use crate::topology::simplex_set::SimplexSet;

    fn counts(mesh: &IsMesh) -> [usize; 4] {
        [mesh.size_nodes(), mesh.size_edges(), mesh.size_faces(), mesh.size_tetrahedra()]
    }

    #[test]
    fn three_two_flip_and_back() {
        let (mut mesh, n): (IsMesh, _) =
            build_from_tetrahedra(5, &[[0, 1, 2, 3], [0, 1, 3, 4], [0, 1, 4, 2]]).unwrap();
        assert_eq!(counts(&mesh), [5, 10, 9, 3]);
        let e = mesh.edge_between(n[0], n[1]).unwrap().unwrap();
        let created = mesh.remove_edge(e, &[]).unwrap();
        assert_eq!(counts(&mesh), [5, 9, 7, 2]);
        assert_eq!((created.size_faces(), created.size_tetrahedra()), (1, 2));
        assert_eq!(mesh.validate_invariants(), Ok(()));
        assert!(mesh.is_coherently_oriented().unwrap());

        let f = created.faces().next().unwrap();
        let back = mesh.multi_face_remove(&[f].into_iter().collect()).unwrap();
        assert_eq!(counts(&mesh), [5, 10, 9, 3]);
        assert_eq!(back.size_edges(), 1);
        assert!(mesh.edge_between(n[0], n[1]).unwrap().is_some());
        assert_eq!(mesh.validate_invariants(), Ok(()));
        assert!(mesh.is_coherently_oriented().unwrap());
    }

    #[test]
    fn flip_onto_an_existing_face_is_refused() {
        // After a 1-4 split the link of a spoke is the old opposite face.
        let (mut mesh, n): (IsMesh, _) = build_from_tetrahedra(4, &[[0, 1, 2, 3]]).unwrap();
        let t = mesh.tets.keys().next().unwrap();
        let c = mesh.split_tetrahedron(t).unwrap();
        let spoke = mesh.edge_between(c, n[0]).unwrap().unwrap();
        let before = mesh.clone();

        let opposite = mesh
            .faces()
            .map(|(f, _)| f)
            .find(|&f| !mesh.node_set(f.into()).unwrap().contains(&c)
                && !mesh.node_set(f.into()).unwrap().contains(&n[0]))
            .unwrap();
        assert_eq!(
            mesh.remove_edge(spoke, &[]),
            Err(IsMeshError::DuplicateSimplex(opposite.into()))
        );
        assert_eq!(mesh.all_simplices(), before.all_simplices());
        assert!(mesh.exists(spoke));
        assert_eq!(counts(&mesh), [5, 10, 10, 4]);
        assert_eq!(mesh.validate_invariants(), Ok(()));
        assert!(mesh.is_coherently_oriented().unwrap());
    }

    #[test]
    fn square_link_needs_one_diagonal() {
        let (mut mesh, n): (IsMesh, _) = build_from_tetrahedra(
            6,
            &[[0, 1, 2, 3], [0, 1, 3, 4], [0, 1, 4, 5], [0, 1, 5, 2]],
        )
        .unwrap();
        let e = mesh.edge_between(n[0], n[1]).unwrap().unwrap();
        let before = mesh.all_simplices();
        assert!(matches!(mesh.remove_edge(e, &[]), Err(IsMeshError::InvalidRegion(_))));
        assert!(matches!(
            mesh.remove_edge(e, &[(n[2], n[3])]),
            Err(IsMeshError::InvalidRegion(_))
        ));
        assert_eq!(mesh.all_simplices(), before);

        let old = counts(&mesh);
        mesh.remove_edge(e, &[(n[2], n[4])]).unwrap();
        assert_eq!(counts(&mesh), [old[0], old[1], old[2], old[3]]);
        assert!(!mesh.exists(e));
        assert!(mesh.edge_between(n[2], n[4]).unwrap().is_some());
        assert_eq!(mesh.validate_invariants(), Ok(()));
        assert!(mesh.is_coherently_oriented().unwrap());
    }

    #[test]
    fn boundary_edge_closes_its_link() {
        let (mut mesh, n): (IsMesh, _) =
            build_from_tetrahedra(5, &[[0, 1, 2, 3], [0, 1, 3, 4]]).unwrap();
        let e = mesh.edge_between(n[0], n[1]).unwrap().unwrap();
        let before = counts(&mesh);
        mesh.remove_edge(e, &[]).unwrap();
        assert_eq!(counts(&mesh), before);
        assert!(mesh.edge_between(n[2], n[4]).unwrap().is_some());
        assert_eq!(mesh.validate_invariants(), Ok(()));
        assert!(mesh.is_coherently_oriented().unwrap());
    }

    #[test]
    fn boundary_patch_two_two_flip() {
        let (mut mesh, n): (IsMesh, _) =
            build_from_tetrahedra(5, &[[0, 1, 2, 4], [0, 2, 3, 4]]).unwrap();
        let patch: SimplexSet = mesh
            .faces()
            .map(|(f, _)| f)
            .filter(|&f| !mesh.node_set(f.into()).unwrap().contains(&n[4]))
            .collect();
        assert_eq!(patch.size_faces(), 2);
        let old = mesh.edge_between(n[0], n[2]).unwrap().unwrap();
        let (faces, _) = mesh.multi_face_retriangulation(&patch, &[(n[1], n[3])]).unwrap();
        assert_eq!(faces.len(), 2);
        assert!(!mesh.exists(old));
        assert!(mesh.edge_between(n[1], n[3]).unwrap().is_some());
        assert_eq!(counts(&mesh), [5, 9, 7, 2]);
        assert_eq!(mesh.validate_invariants(), Ok(()));
        assert!(mesh.is_coherently_oriented().unwrap());
    }

    #[test]
    fn patch_with_mixed_apices_is_rejected() {
        let (mut mesh, n): (IsMesh, _) =
            build_from_tetrahedra(6, &[[0, 1, 2, 4], [0, 2, 3, 5]]).unwrap();
        let patch: SimplexSet = mesh
            .faces()
            .map(|(f, _)| f)
            .filter(|&f| {
                let nodes = mesh.node_set(f.into()).unwrap();
                !nodes.contains(&n[4]) && !nodes.contains(&n[5])
            })
            .collect();
        assert!(matches!(
            mesh.multi_face_retriangulation(&patch, &[(n[1], n[3])]),
            Err(IsMeshError::InvalidRegion(_))
        ));
        assert!(matches!(mesh.multi_face_remove(&patch), Err(IsMeshError::InvalidRegion(_))));
    }
}
