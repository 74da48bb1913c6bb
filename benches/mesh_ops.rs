//! Benchmarks for mesh operations.

use std::collections::HashMap;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use nalgebra::Point3;
use trimesh_topo::algo::decimate::{qem_decimate, DecimateOptions};
use trimesh_topo::algo::shells::find_shells;
use trimesh_topo::prelude::*;

fn grid_soup(n: usize, offset: f64) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64 + offset, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    (vertices, faces)
}

/// Octahedron refined `levels` times with midpoints pushed onto the unit sphere.
fn sphere_soup(levels: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
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

    (vertices, faces)
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (vertices, faces) = grid_soup(50, 0.0);
    c.bench_function("build_grid_50x50", |b| {
        b.iter(|| {
            let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
            mesh
        });
    });

    let (vertices, faces) = sphere_soup(4);
    c.bench_function("build_sphere_2048", |b| {
        b.iter(|| {
            let mesh: HalfEdgeMesh = build_manifold(&vertices, &faces).unwrap();
            mesh
        });
    });
}

fn bench_mesh_traversal(c: &mut Criterion) {
    let (vertices, faces) = grid_soup(50, 0.0);
    let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

    c.bench_function("valence_all", |b| {
        b.iter(|| {
            let mut total = 0;
            for v in mesh.vertex_ids() {
                total += mesh.valence(v).unwrap();
            }
            total
        });
    });

    c.bench_function("vertex_faces_all", |b| {
        b.iter(|| mesh.vertex_ids().map(|v| mesh.vertex_faces(v).count()).sum::<usize>());
    });
}

fn bench_shells(c: &mut Criterion) {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    for k in 0..8 {
        let (vs, fs) = grid_soup(20, k as f64 * 30.0);
        let base = vertices.len();
        vertices.extend(vs);
        faces.extend(fs.into_iter().map(|[a, b, c]| [a + base, b + base, c + base]));
    }
    let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

    c.bench_function("find_shells_8x800", |b| {
        b.iter(|| find_shells(&mesh).len());
    });
}

fn bench_decimation(c: &mut Criterion) {
    let (vertices, faces) = sphere_soup(4);
    let mesh: HalfEdgeMesh = build_manifold(&vertices, &faces).unwrap();

    c.bench_function("qem_decimate_sphere_half", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut mesh| qem_decimate(&mut mesh, &DecimateOptions::with_target_ratio(0.5)).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_mesh_construction, bench_mesh_traversal, bench_shells, bench_decimation);
criterion_main!(benches);
