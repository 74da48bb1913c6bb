//! Mesh decimation (simplification).
//!
//! Reduces the number of triangles by repeatedly collapsing the cheapest edge
//! in place, while keeping the surface a manifold.
//!
//! # Quadric Error Metrics (QEM)
//!
//! Each vertex carries a quadric that measures the squared distance to the
//! planes of its original incident faces. The cost of collapsing edge `(a, b)`
//! is the minimum of `Qa + Qb`, found by solving a 3x3 linear system; when the
//! system is singular the edge midpoint is used instead. Every collapse goes
//! through [`HalfEdgeMesh::collapse_edge`](crate::mesh::HalfEdgeMesh::collapse_edge),
//! so a refused collapse never touches the mesh.
//!
//! # Example
//!
//! ```
//! use trimesh_topo::prelude::*;
//! use trimesh_topo::algo::decimate::{qem_decimate, DecimateOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(-1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, -1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(0.0, 0.0, -1.0),
//! ];
//! let faces = vec![
//!     [0usize, 2, 4], [2, 1, 4], [1, 3, 4], [3, 0, 4],
//!     [2, 0, 5], [1, 2, 5], [3, 1, 5], [0, 3, 5],
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let stats = qem_decimate(&mut mesh, &DecimateOptions::with_target_faces(6)).unwrap();
//! assert_eq!(stats.final_faces, mesh.num_faces());
//! assert!(mesh.is_valid());
//! ```
//!
//! # References
//!
//! - Garland, M. & Heckbert, P. (1997). "Surface Simplification Using Quadric
//!   Error Metrics." SIGGRAPH '97.

mod qem;
mod quadric;

use std::fmt;

pub use qem::{qem_decimate, qem_decimate_with_progress};
pub use quadric::Quadric;

use crate::algo::progress::StopToken;
use crate::error::{MeshError, Result};

/// Options for mesh decimation.
#[derive(Debug, Clone)]
pub struct DecimateOptions {
    /// Target number of faces after decimation.
    /// If None, uses target_ratio instead.
    pub target_faces: Option<usize>,

    /// Target ratio of faces to keep (0.0 to 1.0).
    /// Only used if target_faces is None.
    pub target_ratio: f64,

    /// Edges longer than this are never offered for collapse.
    pub max_edge_length: Option<f64>,

    /// Maximum acceptable collapse cost.
    /// Decimation stops at the first candidate above it.
    pub max_error: Option<f64>,

    /// Weight of the quadric term added along open edges. 0 disables it.
    pub boundary_weight: f64,

    /// Determinant magnitude below which the optimal-position solve is
    /// treated as singular and the edge midpoint is used.
    pub singular_threshold: f64,

    /// Compute the initial per-face quadrics on the rayon thread pool.
    /// The result does not depend on this flag.
    pub parallel: bool,

    /// Checked between collapses; when set, decimation stops early.
    pub stop: Option<StopToken>,
}

impl Default for DecimateOptions {
    fn default() -> Self {
        Self {
            target_faces: None,
            target_ratio: 0.5,
            max_edge_length: None,
            max_error: None,
            boundary_weight: 1.0,
            singular_threshold: 1e-10,
            parallel: true,
            stop: None,
        }
    }
}

impl DecimateOptions {
    /// Create options to reduce to a target number of faces.
    pub fn with_target_faces(target: usize) -> Self {
        Self {
            target_faces: Some(target),
            ..Default::default()
        }
    }

    /// Create options to reduce to a ratio of the original face count.
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Set maximum error threshold for edge collapses.
    pub fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = Some(max_error);
        self
    }

    /// Never collapse edges longer than `length`.
    pub fn with_max_edge_length(mut self, length: f64) -> Self {
        self.max_edge_length = Some(length);
        self
    }

    /// Set the weight of the boundary quadric term.
    pub fn with_boundary_weight(mut self, weight: f64) -> Self {
        self.boundary_weight = weight;
        self
    }

    /// Set the determinant threshold of the optimal-position solve.
    pub fn with_singular_threshold(mut self, threshold: f64) -> Self {
        self.singular_threshold = threshold;
        self
    }

    /// Enable or disable parallel quadric setup.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Attach a stop token polled between collapses.
    pub fn with_stop(mut self, stop: StopToken) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Compute the target number of faces given the original count.
    pub fn compute_target(&self, original_faces: usize) -> usize {
        if let Some(target) = self.target_faces {
            target.min(original_faces)
        } else {
            ((original_faces as f64) * self.target_ratio).round() as usize
        }
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.target_ratio) {
            return Err(MeshError::invalid_param("target_ratio", self.target_ratio, "must be in [0, 1]"));
        }
        if let Some(length) = self.max_edge_length {
            if !(length > 0.0) {
                return Err(MeshError::invalid_param("max_edge_length", length, "must be positive"));
            }
        }
        if let Some(error) = self.max_error {
            if !(error >= 0.0) {
                return Err(MeshError::invalid_param("max_error", error, "must be non-negative"));
            }
        }
        if !(self.boundary_weight >= 0.0 && self.boundary_weight.is_finite()) {
            return Err(MeshError::invalid_param(
                "boundary_weight",
                self.boundary_weight,
                "must be finite and non-negative",
            ));
        }
        if !(self.singular_threshold >= 0.0) {
            return Err(MeshError::invalid_param(
                "singular_threshold",
                self.singular_threshold,
                "must be non-negative",
            ));
        }
        Ok(())
    }

    fn is_stopped(&self) -> bool {
        self.stop.as_ref().is_some_and(StopToken::is_stopped)
    }
}

/// Why decimation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The face count reached the target.
    TargetReached,
    /// No remaining edge could be collapsed.
    NoCandidates,
    /// The cheapest remaining collapse exceeded `max_error`.
    ErrorLimit,
    /// The stop token was triggered.
    Interrupted,
}

/// Summary of a decimation run.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimateStats {
    /// Faces before decimation.
    pub original_faces: usize,
    /// Faces after decimation.
    pub final_faces: usize,
    /// Collapses committed.
    pub collapses: usize,
    /// Collapses refused by the collapse engine.
    pub rejected: usize,
    /// Why the loop ended.
    pub stop_reason: StopReason,
}

impl DecimateStats {
    /// Final over original face count.
    pub fn reduction_ratio(&self) -> f64 {
        if self.original_faces == 0 {
            1.0
        } else {
            self.final_faces as f64 / self.original_faces as f64
        }
    }

    /// Whether any collapse was committed.
    pub fn was_decimated(&self) -> bool {
        self.collapses > 0
    }
}

impl fmt::Display for DecimateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} faces ({} collapses, {} rejected, {:?})",
            self.original_faces, self.final_faces, self.collapses, self.rejected, self.stop_reason
        )
    }
}
