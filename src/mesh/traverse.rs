//! Lazy traversals over the mesh.
//!
//! # Global sequences
//!
//! [`vertex_ids`](HalfEdgeMesh::vertex_ids), [`edge_ids`](HalfEdgeMesh::edge_ids),
//! [`face_ids`](HalfEdgeMesh::face_ids) and friends walk the arenas in insertion
//! order. Each call starts a fresh walk over the *current* state. Handles
//! collected from a walk are not updated by later edits: after a collapse, any
//! of them may refer to a removed element, and checking that is the caller's
//! job (see [`HalfEdgeMesh::contains_edge`] and the `try_*` accessors).
//!
//! # Vertex rings
//!
//! [`VertexRing`] rotates around a vertex starting from its anchor half-edge,
//! taking "twin, then next" at every step until it gets back to the start. On
//! an open fan it reaches a half-edge with no twin; it then walks the other
//! way ("prev, then twin") from the start until the fan's other open side.
//! Every step is checked against a safety bound so a non-manifold vertex
//! yields [`MeshError::InconsistentTopology`] instead of looping forever.

use nalgebra::Point3;

use super::halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh, Vertex};
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

impl<I: MeshIndex> HalfEdgeMesh<I> {
    // ==================== Global sequences ====================

    /// Iterate over all vertex handles.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices.handles()
    }

    /// Iterate over all vertices with their handles.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex<I>)> + '_ {
        self.vertices.iter()
    }

    /// Iterate over all half-edge handles.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedges.handles()
    }

    /// Iterate over all half-edges with their handles.
    pub fn halfedges(&self) -> impl Iterator<Item = (HalfEdgeId<I>, &HalfEdge<I>)> + '_ {
        self.halfedges.iter()
    }

    /// Iterate over all edge handles.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.edges.handles()
    }

    /// Iterate over all edges with their handles.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId<I>, &Edge<I>)> + '_ {
        self.edges.iter()
    }

    /// Iterate over edges that have only one adjacent face.
    pub fn open_edges(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.edges
            .iter()
            .filter(|(_, e)| self.is_open_halfedge(e.halfedge))
            .map(|(id, _)| id)
    }

    /// Iterate over all face handles.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces.handles()
    }

    /// Iterate over all faces with their handles.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &Face<I>)> + '_ {
        self.faces.iter()
    }

    /// Iterate over the corner positions of every face.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.faces.handles().map(|f| self.face_positions(f))
    }

    // ==================== Vertex rings ====================

    /// Rotate around a vertex, yielding one half-edge per incident edge.
    pub fn vertex_ring(&self, v: VertexId<I>) -> VertexRing<'_, I> {
        VertexRing::new(self, v)
    }

    /// Iterate over half-edges leaving a vertex, one per incident face.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> impl Iterator<Item = Result<HalfEdgeId<I>>> + '_ {
        self.vertex_ring(v)
            .filter(move |r| r.as_ref().map_or(true, |&he| self.tail(he) == v))
    }

    /// Iterate over edges incident to a vertex.
    pub fn vertex_edges(&self, v: VertexId<I>) -> impl Iterator<Item = Result<EdgeId<I>>> + '_ {
        self.vertex_ring(v).map(move |r| r.map(|he| self.edge_of(he)))
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = Result<VertexId<I>>> + '_ {
        self.vertex_ring(v).map(move |r| {
            r.map(|he| {
                let h = self.halfedge(he);
                if h.tail == v {
                    h.head
                } else {
                    h.tail
                }
            })
        })
    }

    /// Iterate over faces incident to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = Result<FaceId<I>>> + '_ {
        self.vertex_halfedges(v).map(move |r| r.map(|he| self.face_of(he)))
    }

    /// Number of edges incident to a vertex.
    pub fn valence(&self, v: VertexId<I>) -> Result<usize> {
        self.vertex_ring(v).try_fold(0, |n, r| r.map(|_| n + 1))
    }

    /// Whether a vertex lies on an open edge (or has no faces at all).
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> Result<bool> {
        if !self.vertex(v).halfedge.is_valid() {
            return Ok(true);
        }
        for he in self.vertex_ring(v) {
            if self.is_open_halfedge(he?) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether the faces around a vertex form a single fan.
    ///
    /// False for a vertex shared by several fans (two cones touching at a
    /// tip), which the ring walk cannot see past.
    pub fn is_manifold_vertex(&self, v: VertexId<I>) -> Result<bool> {
        let fan = self.vertex_faces(v).try_fold(0, |n, f| f.map(|_| n + 1))?;
        Ok(fan == self.vertex(v).face_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RingPhase {
    Forward,
    Backward,
    Done,
}

/// Iterator over the half-edges incident to a vertex.
///
/// Yields every outgoing half-edge of the fan. On an open fan it also yields
/// the single incoming half-edge on the far open side, so each incident edge
/// appears exactly once.
pub struct VertexRing<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    vertex: VertexId<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    phase: RingPhase,
    steps: usize,
    limit: usize,
    error: Option<MeshError>,
}

impl<'a, I: MeshIndex> VertexRing<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let anchor = mesh.vertex(v).halfedge;
        let mut ring = Self {
            mesh,
            vertex: v,
            start: anchor,
            current: anchor,
            phase: RingPhase::Forward,
            steps: 0,
            limit: mesh.num_halfedges() + 1,
            error: None,
        };

        match anchor.valid().and_then(|a| mesh.try_halfedge(a)) {
            None if !anchor.is_valid() => ring.phase = RingPhase::Done,
            Some(h) if h.tail == v => {}
            Some(h) if h.head == v => {
                ring.start = h.next;
                ring.current = h.next;
            }
            _ => {
                ring.error = Some(MeshError::inconsistent(format!(
                    "anchor {:?} of {:?} does not touch it",
                    anchor, v
                )));
            }
        }
        ring
    }

    fn fail(&mut self, context: String) -> Option<Result<HalfEdgeId<I>>> {
        self.phase = RingPhase::Done;
        Some(Err(MeshError::inconsistent(context)))
    }

    fn step(&mut self) -> bool {
        self.steps += 1;
        self.steps <= self.limit
    }
}

impl<'a, I: MeshIndex> Iterator for VertexRing<'a, I> {
    type Item = Result<HalfEdgeId<I>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.error.take() {
            self.phase = RingPhase::Done;
            return Some(Err(err));
        }

        match self.phase {
            RingPhase::Done => None,
            RingPhase::Forward => {
                let he = self.current;
                if !self.step() {
                    return self.fail(format!("ring around {:?} did not close", self.vertex));
                }
                match self.mesh.try_halfedge(he) {
                    Some(h) if h.tail == self.vertex => {}
                    Some(_) => return self.fail(format!("{:?} does not leave {:?}", he, self.vertex)),
                    None => return self.fail(format!("ring around {:?} reached dead {:?}", self.vertex, he)),
                }
                match self.mesh.twin(he) {
                    Some(t) => {
                        let n = self.mesh.next(t);
                        if n == self.start {
                            self.phase = RingPhase::Done;
                        } else {
                            self.current = n;
                        }
                    }
                    None => {
                        self.phase = RingPhase::Backward;
                        self.current = self.start;
                    }
                }
                Some(Ok(he))
            }
            RingPhase::Backward => {
                if !self.step() {
                    return self.fail(format!("ring around {:?} did not close", self.vertex));
                }
                let incoming = self.mesh.prev(self.current);
                match self.mesh.twin(incoming) {
                    Some(t) if t == self.start || self.mesh.tail(t) != self.vertex => {
                        self.fail(format!("fan around {:?} is not a disk", self.vertex))
                    }
                    Some(t) => {
                        self.current = t;
                        Some(Ok(t))
                    }
                    None => {
                        self.phase = RingPhase::Done;
                        Some(Ok(incoming))
                    }
                }
            }
        }
    }
}
