//! Composite topological operators and mesh builders.
//!
//! The operators are inherent methods of [`IsMesh`](crate::mesh::IsMesh);
//! this module groups their implementations:
//! - `cavity`: the open-and-refill primitive every operator is built on
//! - [`split`]: `split_tetrahedron`, `split_face`, `split_edge`
//! - [`collapse`]: `edge_collapse` and its link-condition check
//! - [`retriangulate`]: `remove_edge`, `multi_face_remove`, `multi_face_retriangulation`
//! - [`insertion`]: `vertex_insertion`
//! - [`components`]: edge-connected components of a multi-face
//! - [`meshgen`]: meshes from tetrahedron lists and structured blocks

pub(crate) mod cavity;
pub mod collapse;
pub mod components;
pub mod insertion;
pub mod meshgen;
pub mod retriangulate;
pub mod split;

pub use collapse::collapsible_edges;
pub use meshgen::{build_from_tetrahedra, structured_block};
