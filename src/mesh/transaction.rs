//! Mark / undo / commit over the incidence relations.
//!
//! A mark records two things: membership changes, kept by each kernel, and
//! the adjacency of the simplices the caller names, kept by the
//! [`UndoLog`](crate::topology::undo::UndoLog). `undo` reverts membership
//! first and then restores the snapshots, so the caller must name every
//! simplex whose boundary or co-boundary the following edits may rewrite.
//! The closure of an operator's region (plus its star) is always enough.

use crate::mesh::IsMesh;
use crate::mesh_error::IsMeshError;
use crate::topology::key::AnyKey;
use crate::topology::simplex_set::SimplexSet;
use crate::topology::undo::{Snapshot, UndoFrame};

impl<N, E, F, T> IsMesh<N, E, F, T> {
    /// Open a new mark covering the adjacency of every simplex in `region`.
    /// Fails without opening anything if a key is not live.
    pub fn set_undo_mark(&mut self, region: &SimplexSet) -> Result<(), IsMeshError> {
        let mut frame = UndoFrame {
            uncompressed: self.uncompressed,
            ..UndoFrame::default()
        };
        for k in region.iter() {
            match k {
                AnyKey::Node(n) => {
                    frame.nodes.insert(n, Snapshot::of(self.nodes.find(n)?));
                }
                AnyKey::Edge(e) => {
                    frame.edges.insert(e, Snapshot::of(self.edges.find(e)?));
                }
                AnyKey::Face(f) => {
                    frame.faces.insert(f, Snapshot::of(self.faces.find(f)?));
                }
                AnyKey::Tetrahedron(t) => {
                    frame.tetrahedra.insert(t, Snapshot::of(self.tets.find(t)?));
                }
            }
        }
        self.nodes.set_undo_mark();
        self.edges.set_undo_mark();
        self.faces.set_undo_mark();
        self.tets.set_undo_mark();
        self.undo_log.push(frame);
        Ok(())
    }

    /// Number of outstanding marks.
    #[inline]
    pub fn undo_depth(&self) -> usize {
        self.undo_log.depth()
    }

    /// Revert everything done since the most recent mark.
    pub fn undo(&mut self) -> Result<(), IsMeshError> {
        let frame = self.undo_log.pop().ok_or(IsMeshError::NoUndoMark)?;
        self.tets.undo()?;
        self.faces.undo()?;
        self.edges.undo()?;
        self.nodes.undo()?;
        // Snapshots absorbed from a committed inner mark may name simplices
        // created after this mark; those are gone now.
        for (k, snapshot) in frame.nodes {
            if let Ok(s) = self.nodes.find_mut(k) {
                snapshot.restore(s);
            }
        }
        for (k, snapshot) in frame.edges {
            if let Ok(s) = self.edges.find_mut(k) {
                snapshot.restore(s);
            }
        }
        for (k, snapshot) in frame.faces {
            if let Ok(s) = self.faces.find_mut(k) {
                snapshot.restore(s);
            }
        }
        for (k, snapshot) in frame.tetrahedra {
            if let Ok(s) = self.tets.find_mut(k) {
                snapshot.restore(s);
            }
        }
        self.uncompressed = frame.uncompressed;
        Ok(())
    }

    /// Accept everything done since the most recent mark. The snapshots are
    /// handed to the enclosing mark, if any.
    pub fn commit(&mut self) -> Result<(), IsMeshError> {
        if !self.undo_log.commit() {
            return Err(IsMeshError::NoUndoMark);
        }
        self.tets.commit()?;
        self.faces.commit()?;
        self.edges.commit()?;
        self.nodes.commit()?;
        Ok(())
    }

    pub fn undo_all(&mut self) -> Result<(), IsMeshError> {
        while self.undo_depth() > 0 {
            self.undo()?;
        }
        Ok(())
    }

    pub fn commit_all(&mut self) -> Result<(), IsMeshError> {
        while self.undo_depth() > 0 {
            self.commit()?;
        }
        Ok(())
    }

    /// Reclaim the slots of erased simplices. Outstanding marks cannot
    /// survive this and are dropped. Returns the number of reclaimed slots.
    pub fn garbage_collect(&mut self) -> usize {
        if self.undo_depth() > 0 {
            log::warn!(
                "garbage_collect discards {} outstanding undo mark(s)",
                self.undo_depth()
            );
            self.undo_log.clear();
        }
        let reclaimed = self.nodes.garbage_collect()
            + self.edges.garbage_collect()
            + self.faces.garbage_collect()
            + self.tets.garbage_collect();
        log::debug!("garbage_collect reclaimed {reclaimed} slot(s)");
        reclaimed
    }
}

#[cfg(test)]
mod tests {
    use crate::algs::meshgen::build_from_tetrahedra;
    use crate::mesh::IsMesh;
    use crate::mesh_error::IsMeshError;

    #[test]
    fn undo_without_mark_is_an_error() {
        let mut mesh: IsMesh = IsMesh::new();
        assert_eq!(mesh.undo(), Err(IsMeshError::NoUndoMark));
        assert_eq!(mesh.commit(), Err(IsMeshError::NoUndoMark));
    }

    #[test]
    fn undo_restores_a_removed_star() {
        let (mut mesh, n): (IsMesh, _) = build_from_tetrahedra(4, &[[0, 1, 2, 3]]).unwrap();
        let before = mesh.clone();
        mesh.set_undo_mark(&mesh.all_simplices()).unwrap();
        mesh.remove(n[0]).unwrap();
        assert_eq!(mesh.size_tetrahedra(), 0);
        mesh.undo().unwrap();
        assert_eq!(mesh.all_simplices(), before.all_simplices());
        for (e, edge) in before.edges() {
            assert_eq!(mesh.edge(e).unwrap().co_boundary(), edge.co_boundary());
        }
        assert_eq!(mesh.uncompressed_count(), before.uncompressed_count());
    }

    #[test]
    fn nested_commit_keeps_the_outer_snapshot() {
        let (mut mesh, n): (IsMesh, _) = build_from_tetrahedra(4, &[[0, 1, 2, 3]]).unwrap();
        let before = mesh.all_simplices();
        mesh.set_undo_mark(&mesh.all_simplices()).unwrap();
        let extra = mesh.insert_node();
        mesh.set_undo_mark(&mesh.all_simplices()).unwrap();
        mesh.remove(n[1]).unwrap();
        mesh.commit().unwrap();
        assert_eq!(mesh.undo_depth(), 1);
        mesh.undo().unwrap();
        assert!(!mesh.exists(extra));
        assert_eq!(mesh.all_simplices(), before);
    }

    #[test]
    fn garbage_collect_recycles_slots_and_drops_marks() {
        let (mut mesh, n): (IsMesh, _) = build_from_tetrahedra(4, &[[0, 1, 2, 3]]).unwrap();
        mesh.set_undo_mark(&mesh.all_simplices()).unwrap();
        mesh.remove(n[3]).unwrap();
        let reclaimed = mesh.garbage_collect();
        assert_eq!(reclaimed, 1 + 3 + 3 + 1);
        assert_eq!(mesh.undo_depth(), 0);
        let fresh = mesh.insert_node();
        assert!(!mesh.exists(n[3]));
        assert!(mesh.exists(fresh));
    }
}
