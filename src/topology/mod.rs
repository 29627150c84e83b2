//! Building blocks of the incidence simplicial mesh.
//!
//! - [`key`]: generational, dimension-tagged simplex handles
//! - [`simplex`]: the boundary / co-boundary record stored per simplex
//! - [`kernel`]: one arena per dimension with deferred slot reuse
//! - [`simplex_set`]: four-dimension key sets with set algebra
//! - [`undo`]: adjacency snapshots backing mark/undo/commit
//!
//! None of these types know about the other dimensions' records; keeping
//! them consistent is the job of [`IsMesh`](crate::mesh::IsMesh).

pub mod bounds;
pub mod kernel;
pub mod key;
pub mod simplex;
pub mod simplex_set;
pub mod undo;

pub use key::{AnyKey, Dim, EdgeKey, FaceKey, NodeKey, SimplexKey, TetKey};
pub use simplex::{Edge, Face, Node, Simplex, Tetrahedron};
pub use simplex_set::SimplexSet;
