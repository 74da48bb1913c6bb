//! Mesh fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};
use trimesh_topo::prelude::*;

/// Faces of the reference cube, outward winding.
pub const CUBE_FACES: [[usize; 3]; 12] = [
    [0, 3, 2],
    [0, 2, 1],
    [4, 5, 6],
    [4, 6, 7],
    [0, 1, 4],
    [1, 5, 4],
    [1, 2, 6],
    [1, 6, 5],
    [2, 3, 7],
    [2, 7, 6],
    [0, 4, 7],
    [0, 7, 3],
];

/// Corners of an axis-aligned cube with half-size `h` centred at `center`.
pub fn cube_corners(center: Vector3<f64>, h: f64) -> Vec<Point3<f64>> {
    [
        (-1.0, -1.0, -1.0),
        (1.0, -1.0, -1.0),
        (1.0, 1.0, -1.0),
        (-1.0, 1.0, -1.0),
        (-1.0, -1.0, 1.0),
        (1.0, -1.0, 1.0),
        (1.0, 1.0, 1.0),
        (-1.0, 1.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Point3::new(x * h, y * h, z * h) + center)
    .collect()
}

/// The reference cube spanning [-1, 1] on every axis.
pub fn cube() -> HalfEdgeMesh {
    build_manifold(&cube_corners(Vector3::zeros(), 1.0), &CUBE_FACES).unwrap()
}

/// Two unit cubes that share no vertex.
pub fn two_cubes() -> HalfEdgeMesh {
    let mut vertices = cube_corners(Vector3::new(0.5, 0.5, 0.5), 0.5);
    vertices.extend(cube_corners(Vector3::new(3.5, 0.5, 0.5), 0.5));
    let mut faces: Vec<[usize; 3]> = CUBE_FACES.to_vec();
    faces.extend(CUBE_FACES.iter().map(|f| f.map(|i| i + 8)));
    build_manifold(&vertices, &faces).unwrap()
}

/// Triangular bipyramid: three equator vertices and two poles.
pub fn bipyramid() -> HalfEdgeMesh {
    let s = 3f64.sqrt() / 2.0;
    let vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-0.5, s, 0.0),
        Point3::new(-0.5, -s, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces: Vec<[usize; 3]> = vec![[0, 1, 3], [1, 2, 3], [2, 0, 3], [1, 0, 4], [2, 1, 4], [0, 2, 4]];
    build_manifold(&vertices, &faces).unwrap()
}

/// Tetrahedron with a fin: a fifth face hung on edge (0, 1).
///
/// Built leniently; the fin's three sides stay open and vertices 0 and 1
/// each carry two fans.
pub fn finned_tetrahedron() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.5, -1.0, -1.0),
    ];
    let faces: Vec<[usize; 3]> = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3], [0, 1, 4]];
    build_from_triangles(&vertices, &faces).unwrap()
}

/// Two triangles glued back to back along all three edges.
pub fn pillow() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let faces: Vec<[usize; 3]> = vec![[0, 1, 2], [1, 0, 2]];
    build_manifold(&vertices, &faces).unwrap()
}

/// A lone triangle.
pub fn triangle() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    build_from_triangles(&vertices, &[[0usize, 1, 2]]).unwrap()
}

/// Two closed octahedra touching at (1, 0, 0).
pub fn touching_octahedra() -> HalfEdgeMesh {
    let mut vertices = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();
    for center in [Vector3::zeros(), Vector3::new(2.0, 0.0, 0.0)] {
        let base = vertices.len();
        vertices.extend(OCTAHEDRON_CORNERS.iter().map(|&(x, y, z)| Point3::new(x, y, z) + center));
        faces.extend(OCTAHEDRON_FACES.iter().map(|f| f.map(|i| i + base)));
    }
    build_from_triangles(&vertices, &faces).unwrap()
}

const OCTAHEDRON_CORNERS: [(f64, f64, f64); 6] = [
    (1.0, 0.0, 0.0),
    (-1.0, 0.0, 0.0),
    (0.0, 1.0, 0.0),
    (0.0, -1.0, 0.0),
    (0.0, 0.0, 1.0),
    (0.0, 0.0, -1.0),
];

const OCTAHEDRON_FACES: [[usize; 3]; 8] = [
    [0, 2, 4],
    [2, 1, 4],
    [1, 3, 4],
    [3, 0, 4],
    [2, 0, 5],
    [1, 2, 5],
    [3, 1, 5],
    [0, 3, 5],
];

/// Octahedron refined `levels` times, every new vertex pushed onto the unit sphere.
pub fn sphere(levels: usize) -> HalfEdgeMesh {
    let mut vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let mut faces: Vec<[usize; 3]> = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];

    for _ in 0..levels {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut refined = Vec::with_capacity(faces.len() * 4);
        for &[a, b, c] in &faces {
            let mut mid = |u: usize, v: usize| {
                *midpoints.entry((u.min(v), u.max(v))).or_insert_with(|| {
                    let p = nalgebra::center(&vertices[u], &vertices[v]);
                    vertices.push(Point3::from(p.coords.normalize()));
                    vertices.len() - 1
                })
            };
            let (ab, bc, ca) = (mid(a, b), mid(b, c), mid(c, a));
            refined.extend([[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]);
        }
        faces = refined;
    }

    build_manifold(&vertices, &faces).unwrap()
}

/// Everything observable about a mesh, in sequence order.
pub fn snapshot(mesh: &HalfEdgeMesh) -> (Vec<(VertexId, Point3<f64>)>, Vec<(FaceId, [VertexId; 3])>, Vec<EdgeId>) {
    let vertices = mesh.vertices().map(|(id, v)| (id, v.position)).collect();
    let faces = mesh.face_ids().map(|f| (f, mesh.face_triangle(f))).collect();
    let edges = mesh.edge_ids().collect();
    (vertices, faces, edges)
}

/// V - E + F.
pub fn euler_characteristic(mesh: &HalfEdgeMesh) -> i64 {
    mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64
}
