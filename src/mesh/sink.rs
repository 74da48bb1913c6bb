//! Push-style triangle output.
//!
//! Exporters and isosurface writers consume triangles through [`TriangleSink`].
//! A sink receives each triangle once, in traversal order, and is never
//! rewound.

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::MeshIndex;

/// Receiver of a finite stream of triangles.
pub trait TriangleSink {
    /// Accept one triangle given by its corner positions.
    fn add_triangle(&mut self, p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>);
}

impl<F> TriangleSink for F
where
    F: FnMut(Point3<f64>, Point3<f64>, Point3<f64>),
{
    fn add_triangle(&mut self, p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>) {
        self(p0, p1, p2)
    }
}

impl TriangleSink for Vec<[Point3<f64>; 3]> {
    fn add_triangle(&mut self, p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>) {
        self.push([p0, p1, p2]);
    }
}

/// Counts triangles and accumulates their area without storing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaCounter {
    /// Triangles received.
    pub triangles: usize,
    /// Sum of their areas.
    pub area: f64,
}

impl TriangleSink for AreaCounter {
    fn add_triangle(&mut self, p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>) {
        self.triangles += 1;
        self.area += 0.5 * (p1 - p0).cross(&(p2 - p0)).norm();
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Push every face of the mesh into `sink`. Returns the number of triangles.
    pub fn stream_triangles<S: TriangleSink + ?Sized>(&self, sink: &mut S) -> usize {
        let mut count = 0;
        for [p0, p1, p2] in self.triangles() {
            sink.add_triangle(p0, p1, p2);
            count += 1;
        }
        count
    }
}
