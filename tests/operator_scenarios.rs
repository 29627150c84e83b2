use is_mesh::algs::collapsible_edges;
use is_mesh::prelude::*;

fn counts(mesh: &IsMesh) -> [usize; 4] {
    [
        mesh.size_nodes(),
        mesh.size_edges(),
        mesh.size_faces(),
        mesh.size_tetrahedra(),
    ]
}

fn euler(mesh: &IsMesh) -> i64 {
    let [n, e, f, t] = counts(mesh).map(|c| c as i64);
    n - e + f - t
}

fn checked_block(nx: usize, ny: usize, nz: usize) -> (IsMesh, Vec<NodeKey>) {
    let (mut mesh, nodes): (IsMesh, _) = structured_block(nx, ny, nz).unwrap();
    mesh.set_config(MeshConfig::checked());
    (mesh, nodes)
}

fn interior_face(mesh: &IsMesh) -> FaceKey {
    mesh.faces()
        .find(|(_, f)| f.co_boundary().len() == 2)
        .map(|(k, _)| k)
        .unwrap()
}

#[test]
fn single_tetrahedron_is_all_boundary() {
    let (mesh, n): (IsMesh, _) = build_from_tetrahedra(4, &[[0, 1, 2, 3]]).unwrap();
    assert_eq!(counts(&mesh), [4, 6, 4, 1]);
    for k in mesh.all_simplices().iter() {
        let expect = !matches!(k, AnyKey::Tetrahedron(_));
        assert_eq!(mesh.is_boundary(k).unwrap(), expect, "{k}");
    }
    let star = mesh.star(n[0]).unwrap();
    assert_eq!((star.size_edges(), star.size_faces(), star.size_tetrahedra()), (3, 3, 1));
    let link = mesh.link(n[0]).unwrap();
    assert_eq!((link.size_nodes(), link.size_edges(), link.size_faces()), (3, 3, 1));
    assert_eq!(mesh.validate_invariants(), Ok(()));
}

#[test]
fn glued_pair_shares_exactly_one_face() {
    let (mesh, n): (IsMesh, _) = build_from_tetrahedra(5, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
    assert_eq!(counts(&mesh), [5, 9, 7, 2]);
    let shared = interior_face(&mesh);
    assert!(!mesh.is_boundary(shared).unwrap());
    let mut verts = mesh.vertices(shared).unwrap();
    verts.sort();
    let mut expect = vec![n[1], n[2], n[3]];
    expect.sort();
    assert_eq!(verts, expect);
    assert!(mesh.edge_between(n[0], n[4]).unwrap().is_none());
}

#[test]
fn two_three_flip_and_back() {
    let (mut mesh, n): (IsMesh, _) = build_from_tetrahedra(5, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
    mesh.set_config(MeshConfig::checked());
    let shared = interior_face(&mesh);

    let created = mesh.multi_face_remove(&[shared].into_iter().collect()).unwrap();
    assert_eq!(counts(&mesh), [5, 10, 9, 3]);
    assert_eq!(created.size_tetrahedra(), 3);
    let axis = mesh.edge_between(n[0], n[4]).unwrap().unwrap();
    assert_eq!(mesh.star(axis).unwrap().size_tetrahedra(), 3);

    mesh.remove_edge(axis, &[]).unwrap();
    assert_eq!(counts(&mesh), [5, 9, 7, 2]);
    assert!(!mesh.exists(axis));
}

#[test]
fn every_split_keeps_the_block_valid() {
    let (mut mesh, n) = checked_block(2, 2, 2);
    let centre = n[13];
    assert!(!mesh.is_boundary(centre).unwrap());
    let chi = euler(&mesh);

    let t = mesh.star(centre).unwrap().tetrahedra().next().unwrap();
    let a = mesh.split_tetrahedron(t).unwrap();
    assert_eq!(mesh.star(a).unwrap().size_tetrahedra(), 4);

    let f = mesh.star(centre).unwrap().faces().next().unwrap();
    let b = mesh.split_face(f).unwrap();
    let star = mesh.star(b).unwrap();
    assert_eq!((star.size_edges(), star.size_faces(), star.size_tetrahedra()), (5, 9, 6));

    let e = mesh.star(centre).unwrap().edges().next().unwrap();
    let c = mesh.split_edge(e).unwrap();
    // Two halves plus one spoke per ring node.
    assert_eq!(mesh.star(c).unwrap().size_edges(), mesh.link(c).unwrap().size_nodes());

    assert_eq!(euler(&mesh), chi);
    assert_eq!(mesh.validate_invariants(), Ok(()));
}

#[test]
fn vertex_insertion_replaces_an_interior_node() {
    let (mut mesh, n) = checked_block(2, 2, 2);
    let before = counts(&mesh);
    let patch = mesh.star(n[13]).unwrap();
    let (fresh, created) = mesh.vertex_insertion(&patch).unwrap();
    assert!(!mesh.exists(n[13]));
    assert_eq!(counts(&mesh), before);
    assert_eq!(created.size_tetrahedra(), patch.size_tetrahedra());
    assert!(!mesh.is_boundary(fresh).unwrap());
}

#[test]
fn collapse_undoes_a_split() {
    let (mut mesh, _) = checked_block(1, 1, 1);
    let before = counts(&mesh);
    let e = mesh.edges().map(|(k, _)| k).next().unwrap();
    let [a, _] = <[NodeKey; 2]>::try_from(mesh.edge(e).unwrap().boundary()).unwrap();
    let m = mesh.split_edge(e).unwrap();
    let half = mesh.edge_between(a, m).unwrap().unwrap();
    assert_eq!(mesh.edge(half).unwrap().boundary(), &[a, m]);
    assert_eq!(mesh.edge_collapse(half).unwrap(), a);
    assert!(!mesh.exists(m));
    assert_eq!(counts(&mesh), before);
}

#[test]
fn boundary_collapse_undoes_a_boundary_split() {
    let (mut mesh, _) = checked_block(2, 2, 2);
    let before = counts(&mesh);
    let e = mesh
        .edges()
        .map(|(k, _)| k)
        .find(|&e| mesh.is_boundary(e).unwrap())
        .unwrap();
    let [a, b] = <[NodeKey; 2]>::try_from(mesh.edge(e).unwrap().boundary()).unwrap();
    let m = mesh.split_edge(e).unwrap();
    assert!(mesh.is_boundary(m).unwrap());
    let half = mesh.edge_between(a, m).unwrap().unwrap();
    assert!(mesh.is_boundary(half).unwrap());
    assert!(mesh.edge_collapse_precond(half).unwrap());

    assert_eq!(mesh.edge_collapse(half).unwrap(), a);
    assert!(!mesh.exists(m));
    assert_eq!(counts(&mesh), before);
    let rejoined = mesh.edge_between(a, b).unwrap().unwrap();
    assert!(mesh.is_boundary(rejoined).unwrap());
    assert!(mesh.is_coherently_oriented().unwrap());
    assert_eq!(mesh.validate_invariants(), Ok(()));
}

#[test]
fn operators_keep_the_orientation_coherent() {
    let (mut mesh, n) = checked_block(3, 3, 3);
    // The node at (1, 1, 1).
    let centre = n[21];
    assert!(!mesh.is_boundary(centre).unwrap());
    assert!(mesh.is_coherently_oriented().unwrap());

    let t = mesh.star(centre).unwrap().tetrahedra().next().unwrap();
    mesh.split_tetrahedron(t).unwrap();
    assert!(mesh.is_coherently_oriented().unwrap());

    let f = mesh.star(centre).unwrap().faces().next().unwrap();
    mesh.split_face(f).unwrap();
    assert!(mesh.is_coherently_oriented().unwrap());

    let e = mesh.star(centre).unwrap().edges().next().unwrap();
    mesh.split_edge(e).unwrap();
    assert!(mesh.is_coherently_oriented().unwrap());

    let patch = mesh.star(centre).unwrap();
    mesh.vertex_insertion(&patch).unwrap();
    assert!(mesh.is_coherently_oriented().unwrap());

    let all = mesh.all_simplices();
    let e = collapsible_edges(&mesh, &all)
        .unwrap()
        .into_iter()
        .find(|&e| !mesh.is_boundary(e).unwrap())
        .unwrap();
    mesh.edge_collapse(e).unwrap();
    assert!(mesh.is_coherently_oriented().unwrap());
    assert_eq!(mesh.validate_invariants(), Ok(()));
}

#[test]
fn flips_keep_the_orientation_coherent() {
    let (mut mesh, n): (IsMesh, _) = build_from_tetrahedra(5, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
    mesh.set_config(MeshConfig::checked());
    assert!(mesh.is_coherently_oriented().unwrap());

    let shared = interior_face(&mesh);
    mesh.multi_face_remove(&[shared].into_iter().collect()).unwrap();
    assert!(mesh.is_coherently_oriented().unwrap());

    let axis = mesh.edge_between(n[0], n[4]).unwrap().unwrap();
    mesh.remove_edge(axis, &[]).unwrap();
    assert!(mesh.is_coherently_oriented().unwrap());

    // A boundary edge of the pair: its link is an open path.
    let rim = mesh.edge_between(n[1], n[2]).unwrap().unwrap();
    mesh.remove_edge(rim, &[]).unwrap();
    assert!(mesh.is_coherently_oriented().unwrap());
}

#[test]
fn interior_collapse_keeps_the_topology() {
    let (mut mesh, _) = checked_block(3, 3, 3);
    let chi = euler(&mesh);
    let all = mesh.all_simplices();
    let e = collapsible_edges(&mesh, &all)
        .unwrap()
        .into_iter()
        .find(|&e| !mesh.is_boundary(e).unwrap())
        .unwrap();
    let nodes = mesh.size_nodes();
    mesh.edge_collapse(e).unwrap();
    assert_eq!(mesh.size_nodes(), nodes - 1);
    assert_eq!(euler(&mesh), chi);

    for e in mesh.all_simplices().edges() {
        if !mesh.edge_collapse_precond(e).unwrap() {
            let snapshot = mesh.all_simplices();
            assert_eq!(mesh.edge_collapse(e), Err(IsMeshError::LinkConditionViolated(e)));
            assert_eq!(mesh.all_simplices(), snapshot);
        }
    }
}

#[test]
fn boundary_components_split_on_node_contact() {
    let (mesh, n): (IsMesh, _) =
        build_from_tetrahedra(8, &[[0, 1, 2, 3], [1, 2, 3, 4], [0, 5, 6, 7]]).unwrap();
    let hull: SimplexSet = mesh
        .faces()
        .filter(|(_, f)| f.co_boundary().len() == 1)
        .map(|(k, _)| k)
        .collect();
    assert_eq!(hull.size_faces(), 10);
    let sizes: Vec<usize> = mesh
        .star(n[0])
        .unwrap()
        .faces()
        .filter(|&f| hull.contains(f))
        .map(|f| mesh.find_connected_component(f, &hull).unwrap().size_faces())
        .collect();
    assert_eq!(sizes.len(), 6);
    assert!(sizes.iter().all(|&s| s == 6 || s == 4));
    assert!(sizes.contains(&6) && sizes.contains(&4));
}

#[test]
fn stale_keys_are_reported() {
    let (mut mesh, _) = checked_block(1, 1, 1);
    let t = mesh.tetrahedra().map(|(k, _)| k).next().unwrap();
    mesh.split_tetrahedron(t).unwrap();
    assert!(!mesh.exists(t));
    assert_eq!(mesh.split_tetrahedron(t), Err(IsMeshError::InvalidKey(t.into())));
    assert_eq!(mesh.star(t), Err(IsMeshError::InvalidKey(t.into())));
}
