//! Half-edge mesh data structure.
//!
//! This module provides the element types and the [`HalfEdgeMesh`] container.
//!
//! # Structure
//!
//! - Every triangle owns three **half-edges** linked into a `next`/`prev`
//!   3-cycle. Each half-edge stores both its **tail** and **head** vertex.
//! - Two half-edges running in opposite directions between the same vertices
//!   are **twins** and share one undirected [`Edge`].
//! - A half-edge with no twin lies on an open or non-manifold edge. There are
//!   no face-less boundary half-edges: every half-edge belongs to a face.
//! - Each vertex stores an **anchor** half-edge that touches it (as tail or
//!   head); ring traversals start there.
//!
//! All elements live in per-kind arenas and refer to each other by handle.
//! The mesh also owns a [`CoincidenceIndex`] (position to vertex) and a
//! [`PairingIndex`] (directed vertex pair to half-edge), both kept current by
//! construction and by edge collapse.

use nalgebra::{Point3, Vector3};

use super::arena::Arena;
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use super::lookup::{CoincidenceIndex, PairingIndex};
use crate::error::{MeshError, Result};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Dense identifier in `0..num_vertices`.
    ///
    /// Assigned at construction and by [`HalfEdgeMesh::reindex_vertices`];
    /// collapses leave gaps until the next reindex.
    pub id: usize,

    /// A half-edge with this vertex as tail or head.
    pub halfedge: HalfEdgeId<I>,

    /// Number of faces with this vertex as a corner.
    pub(crate) face_count: usize,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            id: 0,
            halfedge: HalfEdgeId::invalid(),
            face_count: 0,
        }
    }

    /// Number of faces with this vertex as a corner.
    ///
    /// Equals the length of the vertex's face ring only when those faces
    /// form a single fan.
    pub fn face_count(&self) -> usize {
        self.face_count
    }
}

/// A directed half-edge owned by one face.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// Start vertex.
    pub tail: VertexId<I>,

    /// End vertex.
    pub head: VertexId<I>,

    /// Opposite half-edge, null on open or non-manifold edges.
    pub twin: HalfEdgeId<I>,

    /// Next half-edge around the face.
    pub next: HalfEdgeId<I>,

    /// Previous half-edge around the face.
    pub prev: HalfEdgeId<I>,

    /// Owning face.
    pub face: FaceId<I>,

    /// Owning undirected edge.
    pub edge: EdgeId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new unlinked half-edge.
    pub fn new(tail: VertexId<I>, head: VertexId<I>) -> Self {
        Self {
            tail,
            head,
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
            edge: EdgeId::invalid(),
        }
    }

    /// Whether this half-edge has no twin.
    #[inline]
    pub fn is_open(&self) -> bool {
        !self.twin.is_valid()
    }

    /// Whether `v` is the tail or head.
    #[inline]
    pub fn touches(&self, v: VertexId<I>) -> bool {
        self.tail == v || self.head == v
    }
}

/// An undirected edge.
#[derive(Debug, Clone, Copy)]
pub struct Edge<I: MeshIndex = u32> {
    /// One of the edge's half-edges; the other is its twin, if any.
    pub halfedge: HalfEdgeId<I>,
}

/// A triangular face.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge of the face's 3-cycle.
    pub halfedge: HalfEdgeId<I>,
}

/// A half-edge mesh data structure for triangle meshes.
///
/// Construct one with [`build_from_triangles`](super::build_from_triangles).
/// The mesh is a single mutable aggregate: readers must not overlap with
/// [`collapse_edge`](HalfEdgeMesh::collapse_edge).
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Arena<Vertex<I>, VertexId<I>>,
    pub(crate) halfedges: Arena<HalfEdge<I>, HalfEdgeId<I>>,
    pub(crate) edges: Arena<Edge<I>, EdgeId<I>>,
    pub(crate) faces: Arena<Face<I>, FaceId<I>>,
    pub(crate) coincidence: CoincidenceIndex<I>,
    pub(crate) pairing: PairingIndex<I>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Closed mesh: HE = 3F, E = 3F/2.
        let num_halfedges = num_faces * 3;
        Self {
            vertices: Arena::with_capacity(num_vertices),
            halfedges: Arena::with_capacity(num_halfedges),
            edges: Arena::with_capacity(num_halfedges / 2 + 1),
            faces: Arena::with_capacity(num_faces),
            coincidence: CoincidenceIndex::with_capacity(num_vertices),
            pairing: PairingIndex::with_capacity(num_halfedges),
        }
    }

    // ==================== Counts ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get the number of undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    // ==================== Element access ====================

    /// Get a vertex by handle.
    ///
    /// # Panics
    /// Panics if the handle is null or the vertex was removed.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id]
    }

    /// Get a vertex, or `None` for a stale handle.
    #[inline]
    pub fn try_vertex(&self, id: VertexId<I>) -> Option<&Vertex<I>> {
        self.vertices.get(id)
    }

    /// Get a half-edge by handle.
    ///
    /// # Panics
    /// Panics if the handle is null or the half-edge was removed.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id]
    }

    /// Get a half-edge, or `None` for a stale handle.
    #[inline]
    pub fn try_halfedge(&self, id: HalfEdgeId<I>) -> Option<&HalfEdge<I>> {
        self.halfedges.get(id)
    }

    /// Get an edge by handle.
    ///
    /// # Panics
    /// Panics if the handle is null or the edge was removed.
    #[inline]
    pub fn edge(&self, id: EdgeId<I>) -> &Edge<I> {
        &self.edges[id]
    }

    /// Get an edge, or `None` for a stale handle.
    #[inline]
    pub fn try_edge(&self, id: EdgeId<I>) -> Option<&Edge<I>> {
        self.edges.get(id)
    }

    /// Get a face by handle.
    ///
    /// # Panics
    /// Panics if the handle is null or the face was removed.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id]
    }

    /// Get a face, or `None` for a stale handle.
    #[inline]
    pub fn try_face(&self, id: FaceId<I>) -> Option<&Face<I>> {
        self.faces.get(id)
    }

    /// Whether the vertex handle is live.
    #[inline]
    pub fn contains_vertex(&self, id: VertexId<I>) -> bool {
        self.vertices.contains(id)
    }

    /// Whether the edge handle is live.
    #[inline]
    pub fn contains_edge(&self, id: EdgeId<I>) -> bool {
        self.edges.contains(id)
    }

    /// Whether the face handle is live.
    #[inline]
    pub fn contains_face(&self, id: FaceId<I>) -> bool {
        self.faces.contains(id)
    }

    /// Read-only view of the coincidence index.
    pub fn coincidence_index(&self) -> &CoincidenceIndex<I> {
        &self.coincidence
    }

    /// Read-only view of the twin-pairing index.
    pub fn pairing_index(&self) -> &PairingIndex<I> {
        &self.pairing
    }

    // ==================== Half-edge queries ====================

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Tail (start) vertex of a half-edge.
    #[inline]
    pub fn tail(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).tail
    }

    /// Head (end) vertex of a half-edge.
    #[inline]
    pub fn head(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).head
    }

    /// Twin half-edge, if any.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.halfedge(he).twin.valid()
    }

    /// Next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Owning face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Owning edge of a half-edge.
    #[inline]
    pub fn edge_of(&self, he: HalfEdgeId<I>) -> EdgeId<I> {
        self.halfedge(he).edge
    }

    /// Whether a half-edge has no twin.
    #[inline]
    pub fn is_open_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_open()
    }

    /// Half-edge running from `tail` to `head`, if one exists.
    pub fn find_halfedge(&self, tail: VertexId<I>, head: VertexId<I>) -> Option<HalfEdgeId<I>> {
        self.pairing
            .get(tail, head)
            .filter(|&he| self.halfedges.contains(he))
    }

    /// Edge connecting two vertices in either direction, if one exists.
    pub fn find_edge(&self, a: VertexId<I>, b: VertexId<I>) -> Option<EdgeId<I>> {
        self.find_halfedge(a, b)
            .or_else(|| self.find_halfedge(b, a))
            .map(|he| self.edge_of(he))
    }

    /// Vertex at exactly this position, if any.
    pub fn find_vertex(&self, position: &Point3<f64>) -> Option<VertexId<I>> {
        self.coincidence
            .get(position)
            .filter(|&v| self.vertices.contains(v))
    }

    // ==================== Edge queries ====================

    /// Representative half-edge of an edge.
    #[inline]
    pub fn edge_halfedge(&self, e: EdgeId<I>) -> HalfEdgeId<I> {
        self.edge(e).halfedge
    }

    /// Endpoints of an edge as `[tail, head]` of its representative half-edge.
    pub fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        let he = self.halfedge(self.edge_halfedge(e));
        [he.tail, he.head]
    }

    /// The (one or two) faces adjacent to an edge.
    pub fn edge_faces(&self, e: EdgeId<I>) -> (FaceId<I>, Option<FaceId<I>>) {
        let he = self.edge_halfedge(e);
        (self.face_of(he), self.twin(he).map(|t| self.face_of(t)))
    }

    /// Whether an edge has only one adjacent face.
    #[inline]
    pub fn is_open_edge(&self, e: EdgeId<I>) -> bool {
        self.is_open_halfedge(self.edge_halfedge(e))
    }

    // ==================== Face queries ====================

    /// The three half-edges of a face, starting at its representative.
    pub fn face_halfedges(&self, f: FaceId<I>) -> [HalfEdgeId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [he0, he1, he2]
    }

    /// Get the three vertices of a face.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        self.face_halfedges(f).map(|he| self.tail(he))
    }

    /// Get the positions of the three vertices of a face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        self.face_triangle(f).map(|v| *self.position(v))
    }

    /// Whether a face references vertex `v`.
    pub fn face_has_vertex(&self, f: FaceId<I>, v: VertexId<I>) -> bool {
        self.face_triangle(f).contains(&v)
    }

    // ==================== Geometry ====================

    /// Compute the unit normal of a face.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0).cross(&(p2 - p0)).normalize()
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, e: EdgeId<I>) -> f64 {
        let [a, b] = self.edge_vertices(e);
        (self.position(b) - self.position(a)).norm()
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, e: EdgeId<I>) -> Point3<f64> {
        let [a, b] = self.edge_vertices(e);
        Point3::from((self.position(a).coords + self.position(b).coords) * 0.5)
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut iter = self.vertices.iter().map(|(_, v)| v.position);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p))))
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.faces.handles().map(|f| self.face_area(f)).sum()
    }

    /// Signed volume enclosed by the faces (positive for outward winding).
    ///
    /// Only meaningful for closed meshes.
    pub fn volume(&self) -> f64 {
        self.faces
            .handles()
            .map(|f| {
                let [p0, p1, p2] = self.face_positions(f);
                p0.coords.dot(&p1.coords.cross(&p2.coords))
            })
            .sum::<f64>()
            / 6.0
    }

    // ==================== Editing ====================

    /// Move a vertex, keeping the coincidence index current.
    ///
    /// Fails with [`MeshError::InvalidHandle`] for a stale handle and with
    /// [`MeshError::InvalidParameter`] when `pos` is not finite or already
    /// belongs to another vertex. The mesh is unchanged on error.
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) -> Result<()> {
        let old = match self.vertices.get(v) {
            Some(vertex) => vertex.position,
            None => return Err(MeshError::InvalidHandle(format!("{:?}", v))),
        };
        if !pos.coords.iter().all(|c| c.is_finite()) {
            return Err(MeshError::invalid_param("position", pos, "must be finite"));
        }
        if matches!(self.coincidence.get(&pos), Some(owner) if owner != v) {
            return Err(MeshError::invalid_param("position", pos, "already belongs to another vertex"));
        }
        self.coincidence.remove_if(&old, v);
        self.coincidence.insert(&pos, v);
        self.vertices[v].position = pos;
        Ok(())
    }

    /// Reassign dense vertex identifiers in sequence order.
    pub fn reindex_vertices(&mut self) {
        for (i, (_, vertex)) in self.vertices.iter_mut().enumerate() {
            vertex.id = i;
        }
    }

    // ==================== Validation ====================

    /// Check invariants 1-3 and 5 of the half-edge structure.
    ///
    /// Open edges (no twin) are allowed; use [`is_closed`](Self::is_closed)
    /// for the manifold check. Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        for (fid, face) in self.faces.iter() {
            let he0 = face.halfedge;
            let mut he = he0;
            for _ in 0..3 {
                let h = self
                    .try_halfedge(he)
                    .ok_or_else(|| MeshError::inconsistent(format!("{:?} references dead {:?}", fid, he)))?;
                if h.face != fid {
                    return Err(MeshError::inconsistent(format!("{:?} is not owned by {:?}", he, fid)));
                }
                if self.try_halfedge(h.next).map(|n| n.prev) != Some(he) {
                    return Err(MeshError::inconsistent(format!("next/prev mismatch at {:?}", he)));
                }
                if self.try_halfedge(h.next).map(|n| n.tail) != Some(h.head) {
                    return Err(MeshError::inconsistent(format!("{:?} does not chain into next", he)));
                }
                he = h.next;
            }
            if he != he0 {
                return Err(MeshError::inconsistent(format!("{:?} is not a 3-cycle", fid)));
            }
        }

        let mut corners = vec![0usize; self.vertices.slot_count()];
        for (heid, h) in self.halfedges.iter() {
            if h.tail == h.head {
                return Err(MeshError::inconsistent(format!("{:?} is a self-loop", heid)));
            }
            for v in [h.tail, h.head] {
                if !self.vertices.contains(v) {
                    return Err(MeshError::inconsistent(format!("{:?} references dead {:?}", heid, v)));
                }
            }
            corners[h.tail.index()] += 1;
            if !self.faces.contains(h.face) {
                return Err(MeshError::inconsistent(format!("{:?} has no live face", heid)));
            }
            let edge = self
                .try_edge(h.edge)
                .ok_or_else(|| MeshError::inconsistent(format!("{:?} has no live edge", heid)))?;
            if let Some(t) = h.twin.valid() {
                let twin = self
                    .try_halfedge(t)
                    .ok_or_else(|| MeshError::inconsistent(format!("{:?} has dead twin", heid)))?;
                if twin.twin != heid || twin.tail != h.head || twin.head != h.tail {
                    return Err(MeshError::inconsistent(format!("twin mismatch at {:?}", heid)));
                }
                if twin.edge != h.edge {
                    return Err(MeshError::inconsistent(format!("twins of {:?} disagree on edge", heid)));
                }
            }
            if edge.halfedge != heid && edge.halfedge != h.twin {
                return Err(MeshError::inconsistent(format!("{:?} does not own {:?}", h.edge, heid)));
            }
        }

        let mut seen = std::collections::HashSet::with_capacity(self.edges.len());
        for (eid, edge) in self.edges.iter() {
            let h = self
                .try_halfedge(edge.halfedge)
                .ok_or_else(|| MeshError::inconsistent(format!("{:?} has dead half-edge", eid)))?;
            let key = if h.tail < h.head { (h.tail, h.head) } else { (h.head, h.tail) };
            if !seen.insert(key) {
                return Err(MeshError::inconsistent(format!("{:?} duplicates another edge", eid)));
            }
        }

        for (vid, v) in self.vertices.iter() {
            if let Some(anchor) = v.halfedge.valid() {
                match self.try_halfedge(anchor) {
                    Some(h) if h.touches(vid) => {}
                    _ => {
                        return Err(MeshError::inconsistent(format!(
                            "anchor {:?} of {:?} does not touch it",
                            anchor, vid
                        )))
                    }
                }
            }
            if v.face_count != corners[vid.index()] {
                return Err(MeshError::inconsistent(format!(
                    "{:?} counts {} faces but is a corner of {}",
                    vid,
                    v.face_count,
                    corners[vid.index()]
                )));
            }
        }

        Ok(())
    }

    /// Check if the mesh connectivity is consistent.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Whether every half-edge has a twin.
    pub fn is_closed(&self) -> bool {
        self.halfedges.iter().all(|(_, h)| !h.is_open())
    }

    // ==================== Internal construction ====================

    pub(crate) fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let mut vertex = Vertex::new(position);
        vertex.id = self.vertices.slot_count();
        let id = self.vertices.insert(vertex);
        self.coincidence.insert(&position, id);
        id
    }
}
