//! Dimension-tagged generational handles for simplices.
//!
//! Every simplex lives in the arena ([`Kernel`](crate::topology::kernel::Kernel))
//! of its dimension and is addressed by a small `Copy` key made of a slot
//! index and a generation counter. The generation is bumped whenever a slot is
//! recycled, so a key held across an operator that deleted (and later
//! garbage-collected) its simplex is detected as stale instead of silently
//! aliasing a new simplex.
//!
//! The four key types are distinct so that the boundary of an edge can only
//! hold [`NodeKey`]s, the boundary of a face only [`EdgeKey`]s and so on.
//! [`AnyKey`] is the tagged union used where a routine is generic over the
//! dimension, and [`Dim`] replaces compile-time dimension dispatch with a
//! plain enum.

use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroU32};

/// The four simplex dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dim {
    Node,
    Edge,
    Face,
    Tetrahedron,
}

impl Dim {
    /// All dimensions, lowest first.
    pub const ALL: [Dim; 4] = [Dim::Node, Dim::Edge, Dim::Face, Dim::Tetrahedron];

    /// Topological dimension (0 for nodes, 3 for tetrahedra).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn from_index(i: usize) -> Option<Dim> {
        match i {
            0 => Some(Dim::Node),
            1 => Some(Dim::Edge),
            2 => Some(Dim::Face),
            3 => Some(Dim::Tetrahedron),
            _ => None,
        }
    }

    /// Dimension of the co-boundary, `None` for tetrahedra.
    #[inline]
    pub const fn up(self) -> Option<Dim> {
        Dim::from_index(self as usize + 1)
    }

    /// Dimension of the boundary, `None` for nodes.
    #[inline]
    pub const fn down(self) -> Option<Dim> {
        match self {
            Dim::Node => None,
            d => Dim::from_index(d as usize - 1),
        }
    }

    /// Fixed number of boundary entries of a fully constructed simplex.
    #[inline]
    pub const fn boundary_arity(self) -> usize {
        match self {
            Dim::Node => 0,
            d => d as usize + 1,
        }
    }
}

/// Bound shared by the four key types.
pub trait SimplexKey:
    Copy + Eq + Ord + std::hash::Hash + fmt::Debug + fmt::Display + Into<AnyKey>
{
    /// Dimension of the simplices this key addresses.
    const DIM: Dim;

    fn from_parts(index: u32, generation: NonZeroU32) -> Self;
    fn index(self) -> u32;
    fn generation(self) -> NonZeroU32;

    /// Narrow an [`AnyKey`] of the right dimension.
    fn from_any(key: AnyKey) -> Option<Self>;
}

macro_rules! simplex_key {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            index: u32,
            generation: NonZeroU32,
        }

        impl SimplexKey for $name {
            const DIM: Dim = Dim::$variant;

            #[inline]
            fn from_parts(index: u32, generation: NonZeroU32) -> Self {
                Self { index, generation }
            }

            #[inline]
            fn index(self) -> u32 {
                self.index
            }

            #[inline]
            fn generation(self) -> NonZeroU32 {
                self.generation
            }

            #[inline]
            fn from_any(key: AnyKey) -> Option<Self> {
                match key {
                    AnyKey::$variant(k) => Some(k),
                    _ => None,
                }
            }
        }

        impl From<$name> for AnyKey {
            #[inline]
            fn from(k: $name) -> AnyKey {
                AnyKey::$variant(k)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&self.index)
                    .field(&self.generation.get())
                    .finish()
            }
        }

        /// Prints as `<prefix><index>.<generation>`, e.g. `n3.1`.
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}.{}"), self.index, self.generation)
            }
        }
    };
}

simplex_key!(
    /// Handle of a node (0-simplex).
    NodeKey, Node, "n"
);
simplex_key!(
    /// Handle of an edge (1-simplex).
    EdgeKey, Edge, "e"
);
simplex_key!(
    /// Handle of a triangular face (2-simplex).
    FaceKey, Face, "f"
);
simplex_key!(
    /// Handle of a tetrahedron (3-simplex).
    TetKey, Tetrahedron, "t"
);

/// A key of any dimension.
///
/// Ordering sorts by dimension first, then by slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnyKey {
    Node(NodeKey),
    Edge(EdgeKey),
    Face(FaceKey),
    Tetrahedron(TetKey),
}

impl AnyKey {
    #[inline]
    pub fn dim(self) -> Dim {
        match self {
            AnyKey::Node(_) => Dim::Node,
            AnyKey::Edge(_) => Dim::Edge,
            AnyKey::Face(_) => Dim::Face,
            AnyKey::Tetrahedron(_) => Dim::Tetrahedron,
        }
    }

    #[inline]
    pub fn as_node(self) -> Option<NodeKey> {
        NodeKey::from_any(self)
    }

    #[inline]
    pub fn as_edge(self) -> Option<EdgeKey> {
        EdgeKey::from_any(self)
    }

    #[inline]
    pub fn as_face(self) -> Option<FaceKey> {
        FaceKey::from_any(self)
    }

    #[inline]
    pub fn as_tetrahedron(self) -> Option<TetKey> {
        TetKey::from_any(self)
    }
}

/// Lets code generic over the four records treat the absent node boundary
/// and tetrahedron co-boundary like any other key list.
impl From<std::convert::Infallible> for AnyKey {
    fn from(never: std::convert::Infallible) -> AnyKey {
        match never {}
    }
}

impl fmt::Display for AnyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyKey::Node(k) => fmt::Display::fmt(k, f),
            AnyKey::Edge(k) => fmt::Display::fmt(k, f),
            AnyKey::Face(k) => fmt::Display::fmt(k, f),
            AnyKey::Tetrahedron(k) => fmt::Display::fmt(k, f),
        }
    }
}
