//! End-to-end behaviour of construction, traversal, shells and collapse.

mod common;

use std::collections::HashSet;

use nalgebra::Point3;
use trimesh_topo::algo::decimate::{qem_decimate, DecimateOptions};
use trimesh_topo::algo::shells::{find_shells, stream_shell, stream_shells};
use trimesh_topo::mesh::AreaCounter;
use trimesh_topo::prelude::*;

use common::{
    bipyramid, cube, euler_characteristic, finned_tetrahedron, pillow, snapshot, sphere, touching_octahedra,
    triangle, two_cubes,
};

#[test]
fn reference_cube_counts() {
    let mesh = cube();
    assert_eq!(mesh.num_vertices(), 8);
    assert_eq!(mesh.num_faces(), 12);
    assert_eq!(mesh.num_edges(), 18);
    assert!(mesh.is_closed());
    assert_eq!(euler_characteristic(&mesh), 2);
}

#[test]
fn collapse_cube_edge_to_midpoint() {
    let mut mesh = cube();
    let keep = mesh.find_vertex(&Point3::new(1.0, -1.0, 1.0)).unwrap();
    let drop = mesh.find_vertex(&Point3::new(1.0, 1.0, 1.0)).unwrap();
    let e = mesh.find_edge(keep, drop).unwrap();
    let midpoint = mesh.edge_midpoint(e);
    assert_eq!(midpoint, Point3::new(1.0, 0.0, 1.0));

    let outcome = mesh.collapse_edge(e, midpoint).unwrap();

    assert_eq!(mesh.num_vertices(), 7);
    assert_eq!(mesh.num_faces(), 10);
    assert_eq!(mesh.num_edges(), 15);
    assert_eq!(*mesh.position(outcome.survivor), midpoint);
    assert_eq!(mesh.find_vertex(&midpoint), Some(outcome.survivor));
    for f in mesh.face_ids() {
        assert!(mesh.face_area(f) > 1e-12, "{:?} is degenerate", f);
    }
    assert!(mesh.validate().is_ok());
    assert!(mesh.is_closed());
}

#[test]
fn closed_mesh_has_three_halves_edges_per_face() {
    for mesh in [cube(), sphere(1), sphere(3)] {
        assert_eq!(mesh.num_edges() * 2, mesh.num_faces() * 3);
        assert_eq!(mesh.num_halfedges(), mesh.num_faces() * 3);
        for he in mesh.halfedge_ids() {
            let twin = mesh.twin(he).expect("closed mesh has every twin");
            assert_eq!(mesh.twin(twin), Some(he));
        }
    }
}

#[test]
fn successful_collapses_remove_one_vertex_three_edges_two_faces() {
    let mut mesh = sphere(2);
    let mut committed = 0;
    let edges: Vec<EdgeId> = mesh.edge_ids().collect();

    for e in edges {
        if !mesh.contains_edge(e) {
            continue;
        }
        let before = (mesh.num_vertices(), mesh.num_edges(), mesh.num_faces());
        let target = mesh.edge_midpoint(e);
        if mesh.collapse_edge(e, target).is_ok() {
            committed += 1;
            assert_eq!(mesh.num_vertices(), before.0 - 1);
            assert_eq!(mesh.num_edges(), before.1 - 3);
            assert_eq!(mesh.num_faces(), before.2 - 2);
            assert!(mesh.validate().is_ok());
            assert!(mesh.is_closed());
        } else {
            assert_eq!((mesh.num_vertices(), mesh.num_edges(), mesh.num_faces()), before);
        }
        if committed == 20 {
            break;
        }
    }

    assert!(committed >= 10, "only {} collapses committed", committed);
    assert_eq!(euler_characteristic(&mesh), 2);
}

#[test]
fn rejected_collapse_leaves_mesh_untouched() {
    let mut mesh = bipyramid();
    let before = snapshot(&mesh);

    // Equator vertices share the third equator vertex besides both poles.
    let e = mesh.find_edge(VertexId::new(0), VertexId::new(1)).unwrap();
    assert_eq!(check_link_condition(&mesh, e).unwrap(), Some(RejectReason::LinkCondition));

    let err = mesh.collapse_edge(e, mesh.edge_midpoint(e)).unwrap_err();
    assert_eq!(err.reject_reason(), Some(RejectReason::LinkCondition));
    assert!(err.is_recoverable());
    assert_eq!(snapshot(&mesh), before);
    assert_eq!(mesh.pairing_index().len(), 18);
    assert_eq!(mesh.coincidence_index().len(), 5);
    assert!(mesh.validate().is_ok());
}

/// Check the predicate's verdict for `e`, then make sure the collapse is
/// refused with the same reason and leaves nothing behind.
fn assert_refused(mesh: &mut HalfEdgeMesh, e: EdgeId, reason: RejectReason) {
    let before = snapshot(mesh);
    let pairs = mesh.pairing_index().len();
    let points = mesh.coincidence_index().len();

    assert_eq!(check_link_condition(mesh, e).unwrap(), Some(reason), "{:?}", e);
    let err = mesh.collapse_edge(e, mesh.edge_midpoint(e)).unwrap_err();
    assert_eq!(err.reject_reason(), Some(reason), "{:?}", e);
    assert!(err.is_recoverable());

    assert_eq!(snapshot(mesh), before);
    assert_eq!(mesh.pairing_index().len(), pairs);
    assert_eq!(mesh.coincidence_index().len(), points);
}

#[test]
fn fin_shares_a_face_with_the_tetrahedron_edge() {
    let mut mesh = finned_tetrahedron();
    assert_eq!(mesh.num_faces(), 5);
    assert_eq!(mesh.open_edges().count(), 3);

    // The fin's face sits in the ring of one endpoint and touches the other.
    let e = mesh.find_edge(VertexId::new(0), VertexId::new(1)).unwrap();
    assert!(!mesh.is_open_edge(e));
    assert_refused(&mut mesh, e, RejectReason::SharedFace);
}

#[test]
fn fin_sides_are_dangling() {
    let mut mesh = finned_tetrahedron();
    let open: Vec<EdgeId> = mesh.open_edges().collect();
    assert_eq!(open.len(), 3);
    for e in open {
        assert_refused(&mut mesh, e, RejectReason::DanglingFace);
    }
}

#[test]
fn lone_triangle_is_dangling() {
    let mut mesh = triangle();
    let edges: Vec<EdgeId> = mesh.edge_ids().collect();
    for e in edges {
        assert_refused(&mut mesh, e, RejectReason::DanglingFace);
    }
    assert!(mesh.validate().is_ok());
}

#[test]
fn pillow_edges_are_two_gons() {
    let mut mesh = pillow();
    assert!(mesh.is_closed());
    let edges: Vec<EdgeId> = mesh.edge_ids().collect();
    assert_eq!(edges.len(), 3);
    for e in edges {
        assert_refused(&mut mesh, e, RejectReason::TwoGon);
    }
    assert!(mesh.validate().is_ok());
}

#[test]
fn shared_tip_of_touching_octahedra_is_refused() {
    let mut mesh = touching_octahedra();
    let tip = mesh.find_vertex(&Point3::new(1.0, 0.0, 0.0)).unwrap();
    assert!(mesh.is_closed());
    assert!(!mesh.is_manifold_vertex(tip).unwrap());

    let at_tip: Vec<EdgeId> = mesh
        .edge_ids()
        .filter(|&e| mesh.edge_vertices(e).contains(&tip))
        .collect();
    assert_eq!(at_tip.len(), 8);
    for e in at_tip {
        assert_refused(&mut mesh, e, RejectReason::NonManifoldVertex);
    }

    // The tip still closes both surfaces, which meet at no edge.
    let mut counter = AreaCounter::default();
    assert_eq!(mesh.stream_triangles(&mut counter), 16);
    assert!(mesh.validate().is_ok());
    assert_eq!(find_shells(&mesh).face_counts(), vec![8, 8]);
}

#[test]
fn decimating_touching_octahedra_keeps_the_tip() {
    let mut mesh = touching_octahedra();
    let stats = qem_decimate(&mut mesh, &DecimateOptions::with_target_faces(0)).unwrap();

    assert_eq!(stats.final_faces, mesh.num_faces());
    assert!(mesh.validate().is_ok());
    assert!(mesh.is_closed());

    // Faces at the tip are never collapsed, so it stays put with both fans.
    let tip = mesh.find_vertex(&Point3::new(1.0, 0.0, 0.0)).unwrap();
    assert_eq!(mesh.vertex(tip).face_count(), 8);
    assert!(!mesh.is_manifold_vertex(tip).unwrap());
    for v in mesh.vertex_ids().filter(|&v| v != tip) {
        assert!(mesh.is_manifold_vertex(v).unwrap(), "{:?}", v);
    }
}

#[test]
fn two_disjoint_cubes_form_two_shells() {
    let mesh = two_cubes();
    let shells = find_shells(&mesh);

    assert_eq!(shells.len(), 2);
    assert_eq!(shells.face_counts(), vec![12, 12]);
    assert_eq!(shells.total_faces(), mesh.num_faces());

    let first = shells.shells()[0];
    let mut counter = AreaCounter::default();
    assert_eq!(stream_shell(&mesh, first.seed, &mut counter).unwrap(), 12);
    assert!((counter.area - 6.0).abs() < 1e-12);

    let mut soup: Vec<[Point3<f64>; 3]> = Vec::new();
    assert_eq!(stream_shells(&mesh, &shells, 1, &mut soup).unwrap(), 24);
    assert_eq!(soup.len(), 24);
    assert_eq!(stream_shells(&mesh, &shells, 13, &mut soup).unwrap(), 0);
}

#[test]
fn shells_survive_decimation() {
    let mut mesh = two_cubes();
    qem_decimate(&mut mesh, &DecimateOptions::with_target_faces(16)).unwrap();
    let shells = find_shells(&mesh);
    assert_eq!(shells.len(), 2);
    assert_eq!(shells.total_faces(), mesh.num_faces());
    assert!(mesh.validate().is_ok());
}

#[test]
fn decimation_is_deterministic() {
    let run = || {
        let mut mesh = sphere(2);
        let options = DecimateOptions::with_target_faces(40);
        let stats = qem_decimate(&mut mesh, &options).unwrap();
        let (positions, faces) = to_face_vertex(&mesh);
        let bits: Vec<[u64; 3]> = positions
            .iter()
            .map(|p| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()])
            .collect();
        (stats, bits, faces)
    };

    let (stats_a, positions_a, faces_a) = run();
    let (stats_b, positions_b, faces_b) = run();
    assert_eq!(stats_a, stats_b);
    assert_eq!(positions_a, positions_b);
    assert_eq!(faces_a, faces_b);
}

#[test]
fn fixed_collapse_order_is_deterministic() {
    let run = || {
        let mut mesh = sphere(1);
        let edges: Vec<EdgeId> = mesh.edge_ids().collect();
        for e in edges.into_iter().step_by(3) {
            if mesh.contains_edge(e) {
                let target = mesh.edge_midpoint(e);
                let _ = mesh.collapse_edge(e, target);
            }
        }
        snapshot(&mesh)
    };

    assert_eq!(run(), run());
}

#[test]
fn traversal_is_idempotent() {
    let mesh = sphere(2);
    let first: Vec<FaceId> = mesh.face_ids().collect();
    for _ in 0..3 {
        assert_eq!(mesh.face_ids().collect::<Vec<_>>(), first);
    }
    assert_eq!(first.len(), mesh.num_faces());

    for v in mesh.vertex_ids() {
        let ring: HashSet<FaceId> = mesh.vertex_faces(v).collect::<Result<_>>().unwrap();
        let again: HashSet<FaceId> = mesh.vertex_faces(v).collect::<Result<_>>().unwrap();
        assert_eq!(ring, again);
        assert_eq!(ring.len(), mesh.valence(v).unwrap());
    }
}

#[test]
fn streamed_triangles_match_face_count() {
    let mesh = sphere(2);
    let mut counter = AreaCounter::default();
    assert_eq!(mesh.stream_triangles(&mut counter), mesh.num_faces());
    assert_eq!(counter.triangles, mesh.num_faces());
    // Inscribed polyhedron area stays below the sphere's.
    assert!(counter.area < 4.0 * std::f64::consts::PI);
}
