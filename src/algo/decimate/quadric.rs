//! Quadric error matrices.

use std::ops::{Add, AddAssign};

use nalgebra::{Matrix3, Point3, Vector3};

/// A quadric error matrix (4x4 symmetric matrix).
///
/// Represents the sum of squared distances to a set of planes.
/// Stored as 10 unique elements since the matrix is symmetric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quadric {
    /// Upper triangular elements: [a, b, c, d, e, f, g, h, i, j]
    /// Matrix form:
    /// | a b c d |
    /// | b e f g |
    /// | c f h i |
    /// | d g i j |
    data: [f64; 10],
}

impl Quadric {
    /// Create a zero quadric.
    pub fn zero() -> Self {
        Self { data: [0.0; 10] }
    }

    /// Create a quadric from a plane equation ax + by + cz + d = 0.
    /// The plane should be normalized (a² + b² + c² = 1).
    pub fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            data: [
                a * a,
                a * b,
                a * c,
                a * d,
                b * b,
                b * c,
                b * d,
                c * c,
                c * d,
                d * d,
            ],
        }
    }

    /// Quadric of the plane through a triangle, or `None` for a degenerate one.
    pub fn from_triangle(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Option<Self> {
        let normal = (p1 - p0).cross(&(p2 - p0));
        let len = normal.norm();
        if len < 1e-12 {
            return None;
        }
        let n = normal / len;
        Some(Self::from_plane(n.x, n.y, n.z, -n.dot(&p0.coords)))
    }

    /// Weighted quadric of the plane that contains edge `p0 -> p1` and is
    /// perpendicular to the adjacent face with normal `face_normal`.
    ///
    /// Added to the endpoints of open edges so the decimator pays for moving
    /// them off the boundary.
    pub fn from_boundary_edge(
        p0: &Point3<f64>,
        p1: &Point3<f64>,
        face_normal: &Vector3<f64>,
        weight: f64,
    ) -> Option<Self> {
        let side = (p1 - p0).cross(face_normal);
        let len = side.norm();
        if len < 1e-12 || !len.is_finite() {
            return None;
        }
        let n = side / len;
        Some(Self::from_plane(n.x, n.y, n.z, -n.dot(&p0.coords)).scaled(weight))
    }

    /// Multiply every coefficient by `s`.
    pub fn scaled(mut self, s: f64) -> Self {
        for v in &mut self.data {
            *v *= s;
        }
        self
    }

    /// Evaluate the quadric error for a point.
    /// Returns v^T * Q * v where v = [x, y, z, 1].
    pub fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let [a, b, c, d, e, f, g, h, i, j] = self.data;
        let (x, y, z) = (p.x, p.y, p.z);

        a * x * x + 2.0 * b * x * y + 2.0 * c * x * z + 2.0 * d * x
            + e * y * y + 2.0 * f * y * z + 2.0 * g * y
            + h * z * z + 2.0 * i * z
            + j
    }

    /// The upper-left 3x3 block.
    fn linear_part(&self) -> Matrix3<f64> {
        let [a, b, c, _, e, f, _, h, _, _] = self.data;
        Matrix3::new(
            a, b, c,
            b, e, f,
            c, f, h,
        )
    }

    /// Find the point minimising the quadric error.
    ///
    /// Solves the 3x3 system `A x = -b`. Returns `None` when `|det A|` is
    /// below `singular_threshold` or the solution is not finite.
    pub fn optimal_point(&self, singular_threshold: f64) -> Option<Point3<f64>> {
        let m = self.linear_part();
        if m.determinant().abs() < singular_threshold {
            return None;
        }
        let rhs = -Vector3::new(self.data[3], self.data[6], self.data[8]);
        let x = m.lu().solve(&rhs)?;
        if x.iter().all(|v| v.is_finite()) {
            Some(Point3::from(x))
        } else {
            None
        }
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, other: Quadric) {
        for (lhs, rhs) in self.data.iter_mut().zip(other.data) {
            *lhs += rhs;
        }
    }
}

impl Add for Quadric {
    type Output = Quadric;

    fn add(mut self, other: Quadric) -> Quadric {
        self += other;
        self
    }
}
