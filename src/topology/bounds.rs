//! Common bound aliases used across the mesh code.
//!
//! Blanket impls make these zero-cost; they only shorten `where` clauses.

/// Bound on per-simplex payloads.
///
/// The mesh never reads or writes a payload. It default-constructs one for
/// every simplex an operator creates and drops it with the simplex.
pub trait Payload: Default {}
impl<T: Default> Payload for T {}
