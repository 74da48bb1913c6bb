//! Quadric Error Metrics (QEM) decimation on the half-edge mesh.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, info};
use nalgebra::Point3;
use rayon::prelude::*;

use crate::algo::progress::Progress;
use crate::error::Result;
use crate::mesh::{EdgeId, FaceId, HalfEdgeMesh, MeshIndex, VertexId};

use super::{DecimateOptions, DecimateStats, Quadric, StopReason};

/// An edge candidate for collapse.
#[derive(Debug, Clone)]
struct EdgeCandidate<I: MeshIndex> {
    edge: EdgeId<I>,
    /// Position of the merged vertex.
    position: Point3<f64>,
    /// Error cost of this collapse.
    cost: f64,
    /// Version counter to detect stale entries.
    version: u32,
}

impl<I: MeshIndex> PartialEq for EdgeCandidate<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I: MeshIndex> Eq for EdgeCandidate<I> {}

impl<I: MeshIndex> PartialOrd for EdgeCandidate<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: MeshIndex> Ord for EdgeCandidate<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; lower edge handle wins ties.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.edge.cmp(&self.edge))
    }
}

/// Performs QEM decimation on a triangle mesh, in place.
///
/// Edges are collapsed cheapest first until the face count reaches the
/// target, the cheapest candidate exceeds `max_error`, no candidate is left,
/// or the stop token fires. Refused collapses are skipped and counted. Vertex
/// identifiers are reassigned densely when the run ends.
///
/// # Arguments
///
/// * `mesh` - The mesh to decimate (modified in place)
/// * `options` - Decimation parameters
///
/// # Errors
///
/// [`MeshError::InvalidParameter`](crate::error::MeshError::InvalidParameter)
/// for out-of-range options, and
/// [`MeshError::InconsistentTopology`](crate::error::MeshError::InconsistentTopology)
/// if the mesh was already corrupt. Rejected collapses are not errors.
pub fn qem_decimate<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &DecimateOptions) -> Result<DecimateStats> {
    qem_decimate_internal(mesh, options, None)
}

/// QEM decimation with progress reporting.
pub fn qem_decimate_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &DecimateOptions,
    progress: &Progress,
) -> Result<DecimateStats> {
    qem_decimate_internal(mesh, options, Some(progress))
}

fn qem_decimate_internal<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &DecimateOptions,
    progress: Option<&Progress>,
) -> Result<DecimateStats> {
    options.validate()?;

    let original_faces = mesh.num_faces();
    let target_faces = options.compute_target(original_faces);
    let mut stats = DecimateStats {
        original_faces,
        final_faces: original_faces,
        collapses: 0,
        rejected: 0,
        stop_reason: StopReason::TargetReached,
    };
    if original_faces <= target_faces {
        return Ok(stats);
    }

    info!("QEM decimation: {} faces, target {}", original_faces, target_faces);

    let mut quadrics = compute_vertex_quadrics(mesh, options);
    let mut versions = vec![0u32; mesh.edges.slot_count()];
    let mut heap: BinaryHeap<EdgeCandidate<I>> = BinaryHeap::with_capacity(mesh.num_edges());
    for e in mesh.edge_ids() {
        if let Some(candidate) = create_edge_candidate(mesh, &quadrics, e, 0, options) {
            heap.push(candidate);
        }
    }

    let to_remove = original_faces - target_faces;
    stats.stop_reason = loop {
        if mesh.num_faces() <= target_faces {
            break StopReason::TargetReached;
        }
        if options.is_stopped() {
            break StopReason::Interrupted;
        }

        let candidate = match heap.pop() {
            Some(c) => c,
            None => break StopReason::NoCandidates,
        };

        // Check if this entry is stale
        if !mesh.contains_edge(candidate.edge) || candidate.version != versions[candidate.edge.index()] {
            continue;
        }

        if let Some(max_error) = options.max_error {
            if candidate.cost > max_error {
                break StopReason::ErrorLimit;
            }
        }

        let outcome = match mesh.collapse_edge(candidate.edge, candidate.position) {
            Ok(outcome) => outcome,
            Err(err) if err.is_recoverable() => {
                stats.rejected += 1;
                continue;
            }
            Err(err) => return Err(err),
        };
        stats.collapses += 1;

        let keep = outcome.survivor;
        let merged = quadrics[keep.index()] + quadrics[outcome.removed_vertex.index()];
        quadrics[keep.index()] = merged;

        // Re-score every edge around the survivor.
        let around: Vec<EdgeId<I>> = mesh.vertex_edges(keep).collect::<Result<_>>()?;
        for e in around {
            let version = &mut versions[e.index()];
            *version = version.wrapping_add(1);
            if let Some(candidate) = create_edge_candidate(mesh, &quadrics, e, *version, options) {
                heap.push(candidate);
            }
        }

        if let Some(p) = progress {
            let removed = original_faces - mesh.num_faces();
            p.report(removed, to_remove, "QEM decimation");
        }
    };

    mesh.reindex_vertices();
    stats.final_faces = mesh.num_faces();
    if let Some(p) = progress {
        p.report(to_remove, to_remove, "QEM decimation");
    }
    info!("QEM decimation finished: {}", stats);
    Ok(stats)
}

/// Compute initial quadrics for each vertex, indexed by vertex slot.
///
/// Face planes may be computed in parallel; they are always summed in face
/// order so the result is identical either way.
fn compute_vertex_quadrics<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, options: &DecimateOptions) -> Vec<Quadric> {
    let faces: Vec<FaceId<I>> = mesh.face_ids().collect();
    let planes: Vec<([VertexId<I>; 3], Option<Quadric>)> = if options.parallel {
        faces.par_iter().map(|&f| face_plane(mesh, f)).collect()
    } else {
        faces.iter().map(|&f| face_plane(mesh, f)).collect()
    };

    let mut quadrics = vec![Quadric::zero(); mesh.vertices.slot_count()];
    let mut degenerate = 0;
    for (corners, plane) in planes {
        match plane {
            Some(q) => {
                for v in corners {
                    quadrics[v.index()] += q;
                }
            }
            None => degenerate += 1,
        }
    }
    if degenerate > 0 {
        debug!("{} degenerate faces contribute no plane", degenerate);
    }

    if options.boundary_weight > 0.0 {
        for e in mesh.open_edges() {
            let he = mesh.edge_halfedge(e);
            let (tail, head) = (mesh.tail(he), mesh.head(he));
            let normal = mesh.face_normal(mesh.face_of(he));
            if let Some(q) = Quadric::from_boundary_edge(
                mesh.position(tail),
                mesh.position(head),
                &normal,
                options.boundary_weight,
            ) {
                quadrics[tail.index()] += q;
                quadrics[head.index()] += q;
            }
        }
    }

    quadrics
}

fn face_plane<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, f: FaceId<I>) -> ([VertexId<I>; 3], Option<Quadric>) {
    let [p0, p1, p2] = mesh.face_positions(f);
    (mesh.face_triangle(f), Quadric::from_triangle(&p0, &p1, &p2))
}

/// Score an edge, or `None` if it is too long to be offered.
fn create_edge_candidate<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    quadrics: &[Quadric],
    e: EdgeId<I>,
    version: u32,
    options: &DecimateOptions,
) -> Option<EdgeCandidate<I>> {
    let length = mesh.edge_length(e);
    if options.max_edge_length.is_some_and(|max| length > max) {
        return None;
    }

    let [v0, v1] = mesh.edge_vertices(e);
    let q = quadrics[v0.index()] + quadrics[v1.index()];
    let midpoint = mesh.edge_midpoint(e);

    // Keep the optimum near the edge; far solutions come from nearly flat
    // neighbourhoods and are numerically meaningless.
    let position = match q.optimal_point(options.singular_threshold) {
        Some(p) if (p - midpoint).norm() < length * 2.0 => p,
        _ => midpoint,
    };

    Some(EdgeCandidate {
        edge: e,
        position,
        cost: q.evaluate(&position).max(0.0),
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::progress::StopToken;
    use crate::mesh::build_from_triangles;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    fn create_tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces: Vec<[usize; 3]> = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn create_octahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces: Vec<[usize; 3]> = vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces: Vec<[usize; 3]> = Vec::new();

        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }

        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = j * (n + 1) + i + 1;
                let v01 = (j + 1) * (n + 1) + i;
                let v11 = (j + 1) * (n + 1) + i + 1;

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_decimate_reduces_faces() {
        let mut mesh = create_octahedron();

        let stats = qem_decimate(&mut mesh, &DecimateOptions::with_target_ratio(0.5)).unwrap();

        assert!(mesh.num_faces() < 8);
        assert!(stats.was_decimated());
        assert_eq!(stats.final_faces, mesh.num_faces());
        assert!(mesh.validate().is_ok());
        assert!(mesh.is_closed());
    }

    #[test]
    fn test_decimate_target_faces() {
        let mut mesh = create_octahedron();

        let stats = qem_decimate(&mut mesh, &DecimateOptions::with_target_faces(6)).unwrap();

        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(stats.collapses, 1);
        assert_eq!(stats.stop_reason, StopReason::TargetReached);
        assert_eq!(mesh.num_edges(), 9);
        assert_eq!(mesh.num_vertices(), 5);
    }

    #[test]
    fn test_decimate_no_change_at_full_ratio() {
        let mut mesh = create_tetrahedron();

        let stats = qem_decimate(&mut mesh, &DecimateOptions::with_target_ratio(1.0)).unwrap();

        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_vertices(), 4);
        assert!(!stats.was_decimated());
    }

    #[test]
    fn test_tetrahedron_has_no_candidates() {
        let mut mesh = create_tetrahedron();

        let stats = qem_decimate(&mut mesh, &DecimateOptions::with_target_faces(0)).unwrap();

        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(stats.stop_reason, StopReason::NoCandidates);
        assert_eq!(stats.rejected, 6);
    }

    #[test]
    fn test_decimate_grid_mesh() {
        let mut mesh = create_grid_mesh(4);

        let stats = qem_decimate(&mut mesh, &DecimateOptions::with_target_ratio(0.5)).unwrap();

        assert!(stats.was_decimated());
        assert!(mesh.num_faces() < 32);
        assert!(mesh.validate().is_ok());
        // A flat grid stays flat.
        assert!(mesh.vertices().all(|(_, v)| v.position.z.abs() < 1e-9));
    }

    #[test]
    fn test_decimate_with_max_error() {
        let mut mesh = create_octahedron();

        // Every collapse on an octahedron bends the surface.
        let options = DecimateOptions::with_target_ratio(0.1).with_max_error(1e-10);
        let stats = qem_decimate(&mut mesh, &options).unwrap();

        assert_eq!(stats.stop_reason, StopReason::ErrorLimit);
        assert_eq!(mesh.num_faces(), 8);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_max_edge_length_blocks_collapses() {
        let mut mesh = create_grid_mesh(3);

        let options = DecimateOptions::with_target_ratio(0.1).with_max_edge_length(0.5);
        let stats = qem_decimate(&mut mesh, &options).unwrap();

        assert_eq!(stats.stop_reason, StopReason::NoCandidates);
        assert_eq!(mesh.num_faces(), 18);
    }

    #[test]
    fn test_stop_token_interrupts() {
        let mut mesh = create_grid_mesh(3);
        let stop = StopToken::new();
        stop.stop();

        let options = DecimateOptions::with_target_ratio(0.1).with_stop(stop);
        let stats = qem_decimate(&mut mesh, &options).unwrap();

        assert_eq!(stats.stop_reason, StopReason::Interrupted);
        assert_eq!(stats.collapses, 0);
        assert_eq!(mesh.num_faces(), 18);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let mut a = create_grid_mesh(4);
        let mut b = create_grid_mesh(4);

        qem_decimate(&mut a, &DecimateOptions::with_target_ratio(0.4)).unwrap();
        qem_decimate(&mut b, &DecimateOptions::with_target_ratio(0.4).with_parallel(false)).unwrap();

        let pa: Vec<_> = a.vertices().map(|(id, v)| (id, v.position)).collect();
        let pb: Vec<_> = b.vertices().map(|(id, v)| (id, v.position)).collect();
        assert_eq!(pa, pb);
        let fa: Vec<_> = a.face_ids().map(|f| a.face_triangle(f)).collect();
        let fb: Vec<_> = b.face_ids().map(|f| b.face_triangle(f)).collect();
        assert_eq!(fa, fb);
    }

    #[test]
    fn test_progress_reported() {
        let mut mesh = create_grid_mesh(3);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let progress = Progress::new(move |current, total, _| {
            assert!(current <= total);
            seen.fetch_add(1, AtomicOrdering::Relaxed);
        });

        qem_decimate_with_progress(&mut mesh, &DecimateOptions::with_target_ratio(0.5), &progress).unwrap();
        assert!(calls.load(AtomicOrdering::Relaxed) > 1);
    }

    #[test]
    fn test_invalid_options() {
        let mut mesh = create_octahedron();
        let options = DecimateOptions::default().with_max_edge_length(-1.0);
        assert!(qem_decimate(&mut mesh, &options).is_err());
        assert_eq!(mesh.num_faces(), 8);
    }
}
