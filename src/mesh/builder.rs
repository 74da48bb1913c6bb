//! Mesh construction from indexed triangles.
//!
//! The input is an ordered list of positions and an ordered list of faces,
//! each face a slice of exactly three position indices. Construction:
//!
//! 1. validates every face (three in-range indices, finite positions),
//! 2. creates one vertex per distinct position, merging coincident points
//!    through the coincidence index,
//! 3. creates three half-edges and one face per triangle, registering every
//!    half-edge in the pairing index under `(tail, head)`,
//! 4. pairs each half-edge with the one registered under `(head, tail)` and
//!    creates one shared edge per pair, or an open edge when no partner exists.
//!
//! Open and non-manifold edges, and vertices whose faces form more than one
//! fan, are reported in a [`BuildReport`] rather than treated as errors; the
//! pairing index is kept for later collapses.

use log::warn;
use nalgebra::Point3;

use super::halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh};
use super::index::{EdgeId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Diagnostics gathered while building a mesh.
#[derive(Debug, Clone)]
pub struct BuildReport<I: MeshIndex = u32> {
    /// Edges that ended up without a twin.
    pub open_edges: Vec<EdgeId<I>>,

    /// Half-edges whose directed vertex pair was already used by another face.
    pub duplicate_halfedges: usize,

    /// Vertices whose faces do not form a single fan, such as the shared tip
    /// of two cones.
    pub non_manifold_vertices: Vec<VertexId<I>>,

    /// Input positions merged into an earlier identical position.
    pub merged_vertices: usize,

    /// Vertices not referenced by any face.
    pub isolated_vertices: usize,
}

impl<I: MeshIndex> Default for BuildReport<I> {
    fn default() -> Self {
        Self {
            open_edges: Vec::new(),
            duplicate_halfedges: 0,
            non_manifold_vertices: Vec::new(),
            merged_vertices: 0,
            isolated_vertices: 0,
        }
    }
}

impl<I: MeshIndex> BuildReport<I> {
    /// Whether the input formed a closed 2-manifold surface.
    pub fn is_manifold(&self) -> bool {
        self.open_edges.is_empty() && self.duplicate_halfedges == 0 && self.non_manifold_vertices.is_empty()
    }

    /// Turn a non-manifold report into [`MeshError::NonManifoldInput`].
    pub fn check_manifold(&self) -> Result<()> {
        if self.is_manifold() {
            Ok(())
        } else {
            Err(MeshError::NonManifoldInput {
                open_edges: self.open_edges.len() + self.duplicate_halfedges,
                non_manifold_vertices: self.non_manifold_vertices.len(),
            })
        }
    }
}

/// Build a half-edge mesh from positions and triangle faces.
///
/// Open or non-manifold input is accepted and logged; use
/// [`build_with_report`] to inspect it or [`build_manifold`] to reject it.
///
/// # Example
/// ```
/// use trimesh_topo::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0usize, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_edges(), 3);
/// ```
pub fn build_from_triangles<I, F>(positions: &[Point3<f64>], faces: &[F]) -> Result<HalfEdgeMesh<I>>
where
    I: MeshIndex,
    F: AsRef<[usize]>,
{
    let (mesh, report) = build_with_report(positions, faces)?;
    if !report.is_manifold() {
        warn!(
            "mesh has {} open edges, {} duplicate half-edges and {} non-manifold vertices",
            report.open_edges.len(),
            report.duplicate_halfedges,
            report.non_manifold_vertices.len()
        );
    }
    Ok(mesh)
}

/// Build a mesh and fail with [`MeshError::NonManifoldInput`] unless it is a
/// closed 2-manifold.
pub fn build_manifold<I, F>(positions: &[Point3<f64>], faces: &[F]) -> Result<HalfEdgeMesh<I>>
where
    I: MeshIndex,
    F: AsRef<[usize]>,
{
    let (mesh, report) = build_with_report(positions, faces)?;
    report.check_manifold()?;
    Ok(mesh)
}

/// Build a mesh and return it together with its [`BuildReport`].
pub fn build_with_report<I, F>(
    positions: &[Point3<f64>],
    faces: &[F],
) -> Result<(HalfEdgeMesh<I>, BuildReport<I>)>
where
    I: MeshIndex,
    F: AsRef<[usize]>,
{
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if face.len() != 3 {
            return Err(MeshError::malformed(fi, format!("expected 3 indices, got {}", face.len())));
        }
        for &pi in face {
            match positions.get(pi) {
                None => {
                    return Err(MeshError::malformed(
                        fi,
                        format!("index {} out of range for {} positions", pi, positions.len()),
                    ))
                }
                Some(p) if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) => {
                    return Err(MeshError::malformed(fi, format!("position {} is not finite", pi)))
                }
                Some(_) => {}
            }
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(positions.len(), faces.len());
    let mut report = BuildReport::default();

    // Coincident input points collapse onto the first vertex at that position.
    let vertex_of: Vec<VertexId<I>> = positions
        .iter()
        .map(|p| match mesh.find_vertex(p) {
            Some(v) => {
                report.merged_vertices += 1;
                v
            }
            None => mesh.add_vertex(*p),
        })
        .collect();

    let mut triangles = Vec::with_capacity(faces.len());
    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        let tri = [vertex_of[face[0]], vertex_of[face[1]], vertex_of[face[2]]];
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            return Err(MeshError::malformed(fi, "face repeats a vertex"));
        }
        triangles.push(tri);
    }

    for tri in &triangles {
        add_triangle(&mut mesh, *tri, &mut report);
    }

    link_twins(&mut mesh, &mut report);

    // A ring walk sees one fan; any faces beyond it belong to another.
    report.non_manifold_vertices = mesh
        .vertices
        .handles()
        .filter(|&v| !mesh.is_manifold_vertex(v).unwrap_or(false))
        .collect();

    report.isolated_vertices = mesh
        .vertices
        .iter()
        .filter(|(_, v)| !v.halfedge.is_valid())
        .count();
    mesh.reindex_vertices();

    if report.merged_vertices > 0 {
        warn!("merged {} coincident input positions", report.merged_vertices);
    }

    Ok((mesh, report))
}

/// Create the face and 3-cycle for one triangle.
fn add_triangle<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    tri: [VertexId<I>; 3],
    report: &mut BuildReport<I>,
) {
    let hes: [HalfEdgeId<I>; 3] =
        [0, 1, 2].map(|i| mesh.halfedges.insert(HalfEdge::new(tri[i], tri[(i + 1) % 3])));
    let face = mesh.faces.insert(Face { halfedge: hes[0] });

    for i in 0..3 {
        let he = &mut mesh.halfedges[hes[i]];
        he.next = hes[(i + 1) % 3];
        he.prev = hes[(i + 2) % 3];
        he.face = face;

        // Later faces overwrite earlier anchors; any touching half-edge will do.
        let corner = &mut mesh.vertices[tri[i]];
        corner.halfedge = hes[i];
        corner.face_count += 1;

        if mesh
            .pairing
            .try_insert(tri[i], tri[(i + 1) % 3], hes[i])
            .is_err()
        {
            report.duplicate_halfedges += 1;
        }
    }
}

/// Pair half-edges through the pairing index and create their edges.
fn link_twins<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, report: &mut BuildReport<I>) {
    let all: Vec<HalfEdgeId<I>> = mesh.halfedges.handles().collect();

    for he in all {
        if mesh.halfedges[he].edge.is_valid() {
            continue;
        }
        let HalfEdge { tail, head, .. } = mesh.halfedges[he];

        let partner = mesh.pairing.get(head, tail).filter(|&cand| {
            let c = &mesh.halfedges[cand];
            cand != he && !c.edge.is_valid() && c.tail == head && c.head == tail
        });

        let edge = mesh.edges.insert(Edge { halfedge: he });
        mesh.halfedges[he].edge = edge;
        match partner {
            Some(twin) => {
                mesh.halfedges[he].twin = twin;
                let t = &mut mesh.halfedges[twin];
                t.twin = he;
                t.edge = edge;
            }
            None => report.open_edges.push(edge),
        }
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Vertices are numbered densely in sequence order, so the output is valid
/// after collapses even before [`HalfEdgeMesh::reindex_vertices`].
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut dense = vec![usize::MAX; mesh.vertices.slot_count()];
    let mut vertices = Vec::with_capacity(mesh.num_vertices());
    for (vid, v) in mesh.vertices.iter() {
        dense[vid.index()] = vertices.len();
        vertices.push(v.position);
    }

    let faces = mesh
        .faces
        .handles()
        .map(|f| mesh.face_triangle(f).map(|v| dense[v.index()]))
        .collect();

    (vertices, faces)
}
