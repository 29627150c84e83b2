#![cfg_attr(docsrs, feature(doc_cfg))]
//! # is-mesh
//!
//! is-mesh is an Incidence Simplicial data structure for tetrahedral meshes:
//! a topological kernel holding nodes, edges, faces and tetrahedra with
//! explicit boundary and co-boundary relations, plus the local operators
//! deformable and progressive mesh algorithms are built from (splits, edge
//! collapse, edge removal, multi-face retriangulation, vertex insertion).
//!
//! ## Features
//! - Generational, dimension-tagged keys: a stale key is detected, never
//!   silently reused
//! - Compact co-boundaries: a node or edge may store one co-face per
//!   connected component of its star instead of all of them
//! - Mark / undo / commit over every incidence change made by the operators
//! - Full structural validation, optionally run after every operator
//!
//! ## Usage
//!
//! ```rust
//! use is_mesh::prelude::*;
//! # fn main() -> Result<(), IsMeshError> {
//! let (mut mesh, nodes): (IsMesh, _) = build_from_tetrahedra(5, &[[0, 1, 2, 3], [1, 2, 3, 4]])?;
//! let e = mesh.edge_between(nodes[1], nodes[2])?.expect("shared edge");
//!
//! mesh.set_undo_mark(&mesh.all_simplices())?;
//! let n = mesh.split_edge(e)?;
//! assert_eq!(mesh.star(n)?.size_tetrahedra(), 4);
//! mesh.undo()?;
//! assert!(!mesh.exists(n));
//! assert!(mesh.exists(e));
//! mesh.validate_invariants()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Invariant checking
//!
//! Operators never leave the mesh half-edited on a precondition failure.
//! Set [`MeshConfig::check_invariants`](config::MeshConfig) to audit the whole
//! mesh after each operator, or enable the `strict-invariants` /
//! `check-invariants` features to assert the invariants in release builds.

pub mod algs;
pub mod config;
pub mod debug_invariants;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::meshgen::{build_from_tetrahedra, structured_block};
    pub use crate::config::MeshConfig;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::mesh::IsMesh;
    pub use crate::mesh::validation::{NonManifoldHandling, ValidationOptions};
    pub use crate::mesh_error::IsMeshError;
    pub use crate::topology::bounds::Payload;
    pub use crate::topology::key::{AnyKey, Dim, EdgeKey, FaceKey, NodeKey, SimplexKey, TetKey};
    pub use crate::topology::simplex_set::SimplexSet;
}
