//! Tunable behaviour of an [`IsMesh`](crate::mesh::IsMesh).

use serde::{Deserialize, Serialize};

/// Mesh-wide settings.
///
/// ```rust
/// use is_mesh::config::MeshConfig;
/// let cfg = MeshConfig { compress_threshold: 0.5, ..MeshConfig::default() };
/// assert!(cfg.auto_compress);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// `compress_all` runs once the number of uncompressed nodes and edges
    /// exceeds this fraction of `size_nodes() + size_edges()`.
    pub compress_threshold: f64,
    /// Run the `compress_all` heuristic at the end of `remove` and of every
    /// composite operator.
    pub auto_compress: bool,
    /// Audit the whole mesh after every composite operator.
    pub check_invariants: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            compress_threshold: 0.2,
            auto_compress: true,
            check_invariants: false,
        }
    }
}

impl MeshConfig {
    /// Settings used by the test-suite: every operator is followed by a full audit.
    pub fn checked() -> Self {
        Self {
            check_invariants: true,
            ..Self::default()
        }
    }
}
