//! Handle types for mesh elements.
//!
//! Every cross-reference inside the mesh (twin, next, prev, anchor, owning face
//! and edge) is one of these handles rather than a reference. A handle is a
//! slot number in the arena of its element kind; it stays the same for the
//! lifetime of the element and is never reused after the element is removed.
//!
//! Handles are generic over the underlying integer type so small meshes can
//! use `u16` slots and very large ones `u64`.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Trait for integer types that can back a mesh handle.
pub trait MeshIndex: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// The largest slot number representable.
    const MAX: Self;

    /// Sentinel used for "no element".
    const INVALID: Self;

    /// Convert from a slot number.
    ///
    /// # Panics
    /// Panics in debug builds if the value does not fit.
    fn from_usize(v: usize) -> Self;

    /// Convert to a slot number.
    fn to_usize(self) -> usize;

    /// Check if this is a valid (non-sentinel) index.
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

macro_rules! impl_mesh_index {
    ($($ty:ty),*) => {
        $(
            impl MeshIndex for $ty {
                const MAX: Self = <$ty>::MAX - 1;
                const INVALID: Self = <$ty>::MAX;

                #[inline]
                fn from_usize(v: usize) -> Self {
                    debug_assert!(
                        v <= <Self as MeshIndex>::MAX as usize,
                        "slot {} too large for {}",
                        v,
                        stringify!($ty)
                    );
                    v as $ty
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_mesh_index!(u16, u32, u64);

/// Common interface of element handles, used by the arena.
pub(crate) trait Handle: Copy + Eq + Ord + Hash + Debug {
    /// Build a handle for an arena slot.
    fn from_slot(slot: usize) -> Self;

    /// The arena slot this handle refers to.
    fn slot(self) -> usize;
}

/// Handle to a vertex.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// Handle to a half-edge.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

/// Handle to a triangular face.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

/// Handle to an undirected edge (a half-edge and its twin, if any).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId<I: MeshIndex = u32>(I);

macro_rules! impl_handle {
    ($name:ident, $display:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a handle from a raw slot number.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// The null handle.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// Raw slot number.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Check if this is a non-null handle. Says nothing about liveness.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0.is_valid()
            }

            /// `Some(self)` for a non-null handle.
            #[inline]
            pub fn valid(self) -> Option<Self> {
                self.is_valid().then_some(self)
            }
        }

        impl<I: MeshIndex> Handle for $name<I> {
            #[inline]
            fn from_slot(slot: usize) -> Self {
                Self::new(slot)
            }

            #[inline]
            fn slot(self) -> usize {
                self.index()
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.index())
                } else {
                    write!(f, "{}(null)", $display)
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

impl_handle!(VertexId, "V");
impl_handle!(HalfEdgeId, "HE");
impl_handle!(FaceId, "F");
impl_handle!(EdgeId, "E");
