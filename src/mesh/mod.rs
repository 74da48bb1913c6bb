//! Core mesh data structures.
//!
//! This module provides the half-edge mesh, its construction from indexed
//! triangles, lazy traversals, and the edge-collapse engine.
//!
//! # Overview
//!
//! [`HalfEdgeMesh`] stores vertices, half-edges, edges and faces in per-kind
//! arenas and links them with typed handles ([`VertexId`], [`HalfEdgeId`],
//! [`EdgeId`], [`FaceId`]). Removing an element tombstones its slot; handles of
//! other elements never move. The arenas themselves are internal to the
//! crate; elements are reached through the mesh and its handles.
//!
//! ```compile_fail
//! use trimesh_topo::mesh::Arena;
//! ```
//!
//! # Construction
//!
//! ```
//! use trimesh_topo::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0usize, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! ```

mod arena;
mod builder;
mod collapse;
mod halfedge;
mod index;
mod lookup;
mod sink;
mod traverse;

pub use builder::{build_from_triangles, build_manifold, build_with_report, to_face_vertex, BuildReport};
pub use collapse::{check_link_condition, CollapseOutcome};
pub use halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh, Vertex};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use lookup::{CoincidenceIndex, PairingIndex};
pub use sink::{AreaCounter, TriangleSink};
pub use traverse::VertexRing;
