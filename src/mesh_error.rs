//! IsMeshError: unified error type for the is-mesh public API.
//!
//! Every fallible operation on [`IsMesh`](crate::mesh::IsMesh), the kernels and
//! the undo log reports failure through this enum. Precondition failures are
//! always reported before the mesh is mutated.

use crate::topology::key::{AnyKey, EdgeKey, FaceKey};
use thiserror::Error;

/// Unified error type for is-mesh operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IsMeshError {
    /// The key is stale (erased, or its slot has been recycled) or out of range.
    #[error("key {0} does not refer to a live simplex")]
    InvalidKey(AnyKey),
    /// The boundary handed to a safe insertion does not describe a simplex.
    #[error("malformed boundary for {key}: {reason}")]
    MalformedBoundary { key: AnyKey, reason: &'static str },
    /// Attaching another tetrahedron would give the face more than two co-faces.
    #[error("face {0} already bounds two tetrahedra")]
    NonManifoldFace(FaceKey),
    /// A simplex with the same boundary already exists.
    #[error("a simplex with the same boundary as {0} already exists")]
    DuplicateSimplex(AnyKey),
    /// `link(n1) ∩ link(n2) \ link(e)` is not empty.
    #[error("collapsing edge {0} would violate the link condition")]
    LinkConditionViolated(EdgeKey),
    /// The region handed to a composite operator does not satisfy its precondition.
    #[error("invalid region: {0}")]
    InvalidRegion(String),
    /// `undo()` or `commit()` was called without a matching `set_undo_mark()`.
    #[error("no undo mark is outstanding")]
    NoUndoMark,
    /// A structural audit found an inconsistency.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
