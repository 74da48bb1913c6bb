//! # trimesh-topo
//!
//! Half-edge topology engine for triangle meshes.
//!
//! The crate turns an indexed triangle list into a [`HalfEdgeMesh`](mesh::HalfEdgeMesh)
//! with explicit adjacency, answers neighbourhood queries, splits the surface
//! into connected shells, and simplifies it by atomic edge collapses guided by
//! quadric error metrics.
//!
//! ## Features
//!
//! - **Half-edge data structure**: arena storage with type-safe handles that
//!   never move when other elements are removed
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Bounded traversal**: ring walks report corrupt neighbourhoods instead of
//!   looping
//! - **Atomic edge collapse**: link-condition screening and full rollback on
//!   failure
//! - **QEM decimation**: in place, deterministic, interruptible
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use trimesh_topo::prelude::*;
//! use nalgebra::Point3;
//!
//! // Define vertices and faces
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0usize, 2, 1], // bottom
//!     [0, 1, 3],      // front
//!     [1, 2, 3],      // right
//!     [2, 0, 3],      // left
//! ];
//!
//! // Build the mesh
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_faces(), 4);
//! assert!(mesh.is_closed());
//! ```
//!
//! ## Mesh Traversal
//!
//! Ring queries yield `Result`s: a neighbourhood that does not close within
//! the safety bound produces [`MeshError::InconsistentTopology`](error::MeshError::InconsistentTopology).
//!
//! ```
//! use trimesh_topo::prelude::*;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.5, 1.0, 0.0),
//! # ];
//! # let faces = vec![[0usize, 1, 2]];
//! # let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! // Iterate over neighbors of a vertex
//! let v = VertexId::new(0);
//! for neighbor in mesh.vertex_neighbors(v) {
//!     println!("Neighbor: {:?}", neighbor?);
//! }
//!
//! // Iterate over faces around a vertex
//! for face in mesh.vertex_faces(v) {
//!     println!("Adjacent face: {:?}", face?);
//! }
//!
//! // Get vertices of a face
//! let f = FaceId::new(0);
//! let [v0, v1, v2] = mesh.face_triangle(f);
//! # Ok::<(), MeshError>(())
//! ```
//!
//! ## Logging
//!
//! The library logs through the [`log`] facade and never installs a logger.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use trimesh_topo::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, RejectReason, Result};
    pub use crate::mesh::{
        build_from_triangles, build_manifold, check_link_condition, to_face_vertex, CollapseOutcome, EdgeId,
        Face, FaceId, HalfEdge, HalfEdgeId, HalfEdgeMesh, MeshIndex, TriangleSink, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
