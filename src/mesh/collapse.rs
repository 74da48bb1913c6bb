//! Edge collapse.
//!
//! Collapsing edge `(keep, drop)` moves `keep` to a target position, removes
//! `drop`, the edge, and the one or two faces adjacent to the edge, then
//! re-pairs the two surviving sides of every removed face.
//!
//! A collapse is first screened by [`check_link_condition`], which never
//! mutates the mesh. The commit then runs inside a journaled transaction:
//! every element it touches is snapshotted before its first change and every
//! index update records the entry it displaced. If any step fails the journal
//! is replayed backwards and the mesh is left exactly as it was.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use nalgebra::Point3;

use super::arena::Arena;
use super::halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh, Vertex};
use super::index::{EdgeId, FaceId, HalfEdgeId, Handle, MeshIndex, VertexId};
use super::lookup::PositionKey;
use crate::error::{MeshError, RejectReason, Result};

/// What a committed collapse changed.
#[derive(Debug, Clone)]
pub struct CollapseOutcome<I: MeshIndex = u32> {
    /// The vertex that now sits at the target position.
    pub survivor: VertexId<I>,

    /// The vertex merged into the survivor.
    pub removed_vertex: VertexId<I>,

    /// The collapsed edge followed by one merged edge per removed face.
    pub removed_edges: Vec<EdgeId<I>>,

    /// The faces that were adjacent to the collapsed edge.
    pub removed_faces: Vec<FaceId<I>>,
}

/// Decide whether collapsing `e` keeps the surface a manifold.
///
/// Returns `Ok(None)` when the collapse is allowed and `Ok(Some(reason))`
/// when it must be refused. Errors are reserved for broken connectivity found
/// while walking the neighbourhood.
///
/// With `keep` and `drop` the endpoints and `a`, `b` the vertices opposite the
/// edge in its adjacent faces, the collapse is refused when:
///
/// - `a == b` (the two faces fold onto each other),
/// - a third face references both `keep` and `drop`,
/// - `keep` and `drop` share a neighbour other than `a` and `b`,
/// - the edge is interior but both endpoints lie on the boundary,
/// - an adjacent face has no twin on either remaining side,
/// - `keep`, `drop`, `a` or `b` is shared by more than one fan of faces,
/// - `a` or `b` would be left with fewer than three edges (two on the boundary).
pub fn check_link_condition<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    e: EdgeId<I>,
) -> Result<Option<RejectReason>> {
    let Some(edge) = mesh.try_edge(e) else {
        return Ok(Some(RejectReason::StaleEdge));
    };
    let h = edge.halfedge;
    let (keep, drop) = (mesh.tail(h), mesh.head(h));
    let twin = mesh.twin(h);

    let a = mesh.head(mesh.next(h));
    let b = twin.map(|t| mesh.head(mesh.next(t)));
    if b == Some(a) {
        return Ok(Some(RejectReason::TwoGon));
    }

    let face_a = mesh.face_of(h);
    let face_b = twin.map(|t| mesh.face_of(t));
    for f in mesh.vertex_faces(drop) {
        let f = f?;
        if f != face_a && Some(f) != face_b && mesh.face_has_vertex(f, keep) {
            return Ok(Some(RejectReason::SharedFace));
        }
    }

    let keep_ring: HashSet<VertexId<I>> = mesh.vertex_neighbors(keep).collect::<Result<_>>()?;
    for n in mesh.vertex_neighbors(drop) {
        let n = n?;
        if n != keep && keep_ring.contains(&n) && n != a && Some(n) != b {
            return Ok(Some(RejectReason::LinkCondition));
        }
    }

    if twin.is_some() && mesh.is_boundary_vertex(keep)? && mesh.is_boundary_vertex(drop)? {
        return Ok(Some(RejectReason::PinchedBoundary));
    }

    for side in std::iter::once(h).chain(twin) {
        if mesh.twin(mesh.next(side)).is_none() && mesh.twin(mesh.prev(side)).is_none() {
            return Ok(Some(RejectReason::DanglingFace));
        }
    }

    // Rings see a single fan. Faces in another fan would keep pointing at
    // `drop` after the relink and would hide from the valence guard.
    for v in [keep, drop, a].into_iter().chain(b) {
        if !mesh.is_manifold_vertex(v)? {
            return Ok(Some(RejectReason::NonManifoldVertex));
        }
    }

    for opposite in std::iter::once(a).chain(b) {
        let min = if mesh.is_boundary_vertex(opposite)? { 3 } else { 4 };
        if mesh.valence(opposite)? < min {
            return Ok(Some(RejectReason::LowValence));
        }
    }

    Ok(None)
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Collapse edge `e`, placing the surviving vertex at `position`.
    ///
    /// On success every handle other than the removed ones stays valid and
    /// both lookup indices reflect the new connectivity. On failure the mesh
    /// is unchanged:
    ///
    /// - [`MeshError::CollapseRejected`] when the link condition fails, when
    ///   `position` is taken by an unrelated vertex, or when twins could not be
    ///   re-paired,
    /// - [`MeshError::InconsistentTopology`] when the neighbourhood was already
    ///   broken.
    pub fn collapse_edge(&mut self, e: EdgeId<I>, position: Point3<f64>) -> Result<CollapseOutcome<I>> {
        if !(position.x.is_finite() && position.y.is_finite() && position.z.is_finite()) {
            return Err(MeshError::invalid_param(
                "position",
                format!("({}, {}, {})", position.x, position.y, position.z),
                "must be finite",
            ));
        }

        if let Some(reason) = check_link_condition(self, e)? {
            debug!("collapse of {:?} rejected: {}", e, reason);
            return Err(MeshError::rejected(reason));
        }

        let plan = CollapsePlan::gather(self, e)?;
        if let Some(owner) = self.find_vertex(&position) {
            if owner != plan.keep && owner != plan.drop {
                debug!("collapse of {:?} rejected: target owned by {:?}", e, owner);
                return Err(MeshError::rejected(RejectReason::PositionOccupied));
            }
        }

        let mut txn = Transaction::new(self);
        match txn.apply(&plan, position) {
            Ok(outcome) => {
                trace!(
                    "collapsed {:?}: {:?} into {:?}, {} faces removed",
                    e,
                    outcome.removed_vertex,
                    outcome.survivor,
                    outcome.removed_faces.len()
                );
                Ok(outcome)
            }
            Err(err) => {
                txn.rollback();
                debug!("collapse of {:?} rolled back: {}", e, err);
                Err(err)
            }
        }
    }
}

/// The two sides of a removed face that survive the collapse.
#[derive(Debug, Clone, Copy)]
struct Wing<I: MeshIndex> {
    /// Twin of the side touching `drop`.
    outer_drop: Option<HalfEdgeId<I>>,
    /// Twin of the side touching `keep`.
    outer_keep: Option<HalfEdgeId<I>>,
    drop_edge: EdgeId<I>,
    keep_edge: EdgeId<I>,
}

/// Everything the commit needs, gathered before the first mutation.
struct CollapsePlan<I: MeshIndex> {
    edge: EdgeId<I>,
    keep: VertexId<I>,
    drop: VertexId<I>,
    doomed: Vec<HalfEdgeId<I>>,
    faces: Vec<FaceId<I>>,
    wings: Vec<Wing<I>>,
    opposite: Vec<VertexId<I>>,
    /// Surviving half-edges that reference `drop`.
    relink: Vec<HalfEdgeId<I>>,
}

impl<I: MeshIndex> CollapsePlan<I> {
    fn gather(mesh: &HalfEdgeMesh<I>, e: EdgeId<I>) -> Result<Self> {
        let h = mesh.edge_halfedge(e);
        let (keep, drop) = (mesh.tail(h), mesh.head(h));

        let mut plan = Self {
            edge: e,
            keep,
            drop,
            doomed: Vec::with_capacity(6),
            faces: Vec::with_capacity(2),
            wings: Vec::with_capacity(2),
            opposite: Vec::with_capacity(2),
            relink: Vec::new(),
        };

        for side in std::iter::once(h).chain(mesh.twin(h)) {
            let (n, p) = (mesh.next(side), mesh.prev(side));
            let (drop_side, keep_side) = if mesh.halfedge(n).touches(drop) { (n, p) } else { (p, n) };
            plan.doomed.extend([side, n, p]);
            plan.faces.push(mesh.face_of(side));
            plan.opposite.push(mesh.head(n));
            plan.wings.push(Wing {
                outer_drop: mesh.twin(drop_side),
                outer_keep: mesh.twin(keep_side),
                drop_edge: mesh.edge_of(drop_side),
                keep_edge: mesh.edge_of(keep_side),
            });
        }

        let mut reached = 0;
        for f in mesh.vertex_faces(drop) {
            let f = f?;
            if plan.faces.contains(&f) {
                continue;
            }
            reached += 1;
            for he in mesh.face_halfedges(f) {
                if mesh.halfedge(he).touches(drop) {
                    plan.relink.push(he);
                }
            }
        }

        let expected = mesh.vertex(drop).face_count.checked_sub(plan.faces.len());
        if expected != Some(reached) {
            return Err(MeshError::inconsistent(format!(
                "ring around {:?} reached {} of its {} faces",
                drop,
                reached + plan.faces.len(),
                mesh.vertex(drop).face_count
            )));
        }

        Ok(plan)
    }

    fn outer_halfedges(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.wings.iter().flat_map(|w| [w.outer_drop, w.outer_keep]).flatten()
    }
}

/// Snapshot the value behind `id` unless it was already saved.
fn remember<T: Clone, H: Handle>(log: &mut HashMap<H, T>, arena: &Arena<T, H>, id: H) -> Result<()> {
    match arena.get(id) {
        Some(value) => {
            log.entry(id).or_insert_with(|| value.clone());
            Ok(())
        }
        None => Err(MeshError::inconsistent(format!("{:?} is not live", id))),
    }
}

fn revert<T, H: Handle>(arena: &mut Arena<T, H>, log: HashMap<H, T>) {
    for (id, value) in log {
        match arena.get_mut(id) {
            Some(slot) => *slot = value,
            None => {
                arena.restore(id, value);
            }
        }
    }
}

/// Journaled mutable view of a mesh.
struct Transaction<'m, I: MeshIndex> {
    mesh: &'m mut HalfEdgeMesh<I>,
    vertices: HashMap<VertexId<I>, Vertex<I>>,
    halfedges: HashMap<HalfEdgeId<I>, HalfEdge<I>>,
    edges: HashMap<EdgeId<I>, Edge<I>>,
    faces: HashMap<FaceId<I>, Face<I>>,
    pairing: Vec<((VertexId<I>, VertexId<I>), Option<HalfEdgeId<I>>)>,
    coincidence: Vec<(PositionKey, Option<VertexId<I>>)>,
}

impl<'m, I: MeshIndex> Transaction<'m, I> {
    fn new(mesh: &'m mut HalfEdgeMesh<I>) -> Self {
        Self {
            mesh,
            vertices: HashMap::new(),
            halfedges: HashMap::new(),
            edges: HashMap::new(),
            faces: HashMap::new(),
            pairing: Vec::new(),
            coincidence: Vec::new(),
        }
    }

    fn apply(&mut self, plan: &CollapsePlan<I>, position: Point3<f64>) -> Result<CollapseOutcome<I>> {
        let (keep, drop) = (plan.keep, plan.drop);

        let keep_at = *self.mesh.position(keep);
        let drop_at = *self.mesh.position(drop);
        self.unregister(&keep_at, keep);
        self.unregister(&drop_at, drop);
        self.register(&position, keep);
        self.vertex_mut(keep)?.position = position;

        for &he in &plan.doomed {
            let h = self.remove_halfedge(he)?;
            self.unpair(h.tail, h.head, he);
        }
        for &f in &plan.faces {
            self.remove_face(f)?;
        }
        self.remove_edge(plan.edge)?;

        // Each removed face had both endpoints as corners and one opposite vertex.
        let merged = self.mesh.vertex(keep).face_count + self.mesh.vertex(drop).face_count;
        self.vertex_mut(keep)?.face_count = merged
            .checked_sub(2 * plan.faces.len())
            .ok_or_else(|| MeshError::inconsistent(format!("{:?} lost more faces than it had", keep)))?;
        for &v in &plan.opposite {
            let vertex = self.vertex_mut(v)?;
            vertex.face_count = vertex
                .face_count
                .checked_sub(1)
                .ok_or_else(|| MeshError::inconsistent(format!("{:?} lost more faces than it had", v)))?;
        }
        self.remove_vertex(drop)?;

        for &he in &plan.relink {
            let h = *self.mesh.halfedge(he);
            self.unpair(h.tail, h.head, he);
            let tail = if h.tail == drop { keep } else { h.tail };
            let head = if h.head == drop { keep } else { h.head };
            let moved = self.halfedge_mut(he)?;
            moved.tail = tail;
            moved.head = head;
            self.pair(tail, head, he)?;
        }

        let mut removed_edges = Vec::with_capacity(1 + plan.wings.len());
        removed_edges.push(plan.edge);
        for wing in &plan.wings {
            removed_edges.push(self.mend(wing)?);
        }

        for &v in std::iter::once(&keep).chain(&plan.opposite) {
            let anchor = self.mesh.vertex(v).halfedge;
            if self.mesh.halfedges.contains(anchor) {
                continue;
            }
            let replacement = plan
                .outer_halfedges()
                .find(|&he| self.mesh.halfedge(he).touches(v))
                .ok_or_else(|| MeshError::inconsistent(format!("{:?} lost every face", v)))?;
            self.vertex_mut(v)?.halfedge = replacement;
        }

        Ok(CollapseOutcome {
            survivor: keep,
            removed_vertex: drop,
            removed_edges,
            removed_faces: plan.faces.clone(),
        })
    }

    /// Join the surviving sides of one removed face. Returns the edge that
    /// disappeared in the merge.
    fn mend(&mut self, wing: &Wing<I>) -> Result<EdgeId<I>> {
        match (wing.outer_drop, wing.outer_keep) {
            (Some(x), Some(y)) => {
                let hx = *self.mesh.halfedge(x);
                let hy = *self.mesh.halfedge(y);
                if self.mesh.pairing.get(hx.head, hx.tail) != Some(y)
                    || self.mesh.pairing.get(hy.head, hy.tail) != Some(x)
                {
                    return Err(MeshError::rejected(RejectReason::TwinRepair));
                }
                let merged = self.halfedge_mut(x)?;
                merged.twin = y;
                merged.edge = wing.keep_edge;
                self.halfedge_mut(y)?.twin = x;
                self.edge_mut(wing.keep_edge)?.halfedge = y;
                self.remove_edge(wing.drop_edge)?;
                Ok(wing.drop_edge)
            }
            (Some(x), None) => {
                self.reopen(x, wing.drop_edge)?;
                self.remove_edge(wing.keep_edge)?;
                Ok(wing.keep_edge)
            }
            (None, Some(y)) => {
                self.reopen(y, wing.keep_edge)?;
                self.remove_edge(wing.drop_edge)?;
                Ok(wing.drop_edge)
            }
            (None, None) => Err(MeshError::rejected(RejectReason::DanglingFace)),
        }
    }

    /// Leave `he` as the only half-edge of `edge`.
    fn reopen(&mut self, he: HalfEdgeId<I>, edge: EdgeId<I>) -> Result<()> {
        let h = *self.mesh.halfedge(he);
        if self.mesh.pairing.get(h.head, h.tail).is_some() {
            return Err(MeshError::rejected(RejectReason::TwinRepair));
        }
        self.halfedge_mut(he)?.twin = HalfEdgeId::invalid();
        self.edge_mut(edge)?.halfedge = he;
        Ok(())
    }

    fn rollback(self) {
        let Transaction {
            mesh,
            vertices,
            halfedges,
            edges,
            faces,
            pairing,
            coincidence,
        } = self;

        revert(&mut mesh.vertices, vertices);
        revert(&mut mesh.halfedges, halfedges);
        revert(&mut mesh.edges, edges);
        revert(&mut mesh.faces, faces);
        for (key, previous) in pairing.into_iter().rev() {
            mesh.pairing.set_raw(key, previous);
        }
        for (key, previous) in coincidence.into_iter().rev() {
            mesh.coincidence.set_raw(key, previous);
        }
    }

    // ==================== Journaled element access ====================

    fn vertex_mut(&mut self, id: VertexId<I>) -> Result<&mut Vertex<I>> {
        remember(&mut self.vertices, &self.mesh.vertices, id)?;
        Ok(&mut self.mesh.vertices[id])
    }

    fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> Result<&mut HalfEdge<I>> {
        remember(&mut self.halfedges, &self.mesh.halfedges, id)?;
        Ok(&mut self.mesh.halfedges[id])
    }

    fn edge_mut(&mut self, id: EdgeId<I>) -> Result<&mut Edge<I>> {
        remember(&mut self.edges, &self.mesh.edges, id)?;
        Ok(&mut self.mesh.edges[id])
    }

    fn remove_vertex(&mut self, id: VertexId<I>) -> Result<()> {
        remember(&mut self.vertices, &self.mesh.vertices, id)?;
        self.mesh.vertices.remove(id);
        Ok(())
    }

    fn remove_halfedge(&mut self, id: HalfEdgeId<I>) -> Result<HalfEdge<I>> {
        remember(&mut self.halfedges, &self.mesh.halfedges, id)?;
        self.mesh
            .halfedges
            .remove(id)
            .ok_or_else(|| MeshError::inconsistent(format!("{:?} removed twice", id)))
    }

    fn remove_edge(&mut self, id: EdgeId<I>) -> Result<()> {
        remember(&mut self.edges, &self.mesh.edges, id)?;
        self.mesh.edges.remove(id);
        Ok(())
    }

    fn remove_face(&mut self, id: FaceId<I>) -> Result<()> {
        remember(&mut self.faces, &self.mesh.faces, id)?;
        self.mesh.faces.remove(id);
        Ok(())
    }

    // ==================== Journaled index updates ====================

    fn pair(&mut self, tail: VertexId<I>, head: VertexId<I>, he: HalfEdgeId<I>) -> Result<()> {
        let key = (tail, head);
        let previous = self.mesh.pairing.raw(key);
        match previous {
            Some(owner) if owner != he => Err(MeshError::rejected(RejectReason::TwinRepair)),
            _ => {
                self.pairing.push((key, previous));
                self.mesh.pairing.set_raw(key, Some(he));
                Ok(())
            }
        }
    }

    fn unpair(&mut self, tail: VertexId<I>, head: VertexId<I>, he: HalfEdgeId<I>) {
        if self.mesh.pairing.remove_if(tail, head, he) {
            self.pairing.push(((tail, head), Some(he)));
        }
    }

    fn register(&mut self, p: &Point3<f64>, v: VertexId<I>) {
        let key = PositionKey::new(p);
        self.coincidence.push((key, self.mesh.coincidence.raw(key)));
        self.mesh.coincidence.set_raw(key, Some(v));
    }

    fn unregister(&mut self, p: &Point3<f64>, v: VertexId<I>) {
        if self.mesh.coincidence.remove_if(p, v).is_some() {
            self.coincidence.push((PositionKey::new(p), Some(v)));
        }
    }
}
