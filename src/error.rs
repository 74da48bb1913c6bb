//! Error types for trimesh-topo.
//!
//! Construction errors ([`MeshError::MalformedFace`], [`MeshError::EmptyMesh`])
//! are fatal. [`MeshError::NonManifoldInput`] and [`MeshError::CollapseRejected`]
//! are recoverable: the mesh is left in a usable state and the caller decides
//! what to do next. [`MeshError::InconsistentTopology`] means an invariant was
//! already broken and should not be swallowed.

use std::fmt;

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Why an edge collapse was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// The edge handle no longer refers to a live edge.
    StaleEdge,
    /// A face other than the two adjacent to the edge references both endpoints.
    SharedFace,
    /// The endpoints share neighbours beyond the two opposite vertices.
    LinkCondition,
    /// Both adjacent faces have the same opposite vertex.
    TwoGon,
    /// An opposite vertex would be left with a degenerate fan.
    LowValence,
    /// An adjacent face has no neighbour across either remaining side.
    DanglingFace,
    /// An interior edge connects two boundary vertices.
    PinchedBoundary,
    /// An endpoint or opposite vertex is shared by more than one fan of faces.
    NonManifoldVertex,
    /// The target position is already owned by an unrelated vertex.
    PositionOccupied,
    /// Twins could not be re-paired after relinking; the collapse was rolled back.
    TwinRepair,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::StaleEdge => "edge is not part of the mesh",
            RejectReason::SharedFace => "a third face references both endpoints",
            RejectReason::LinkCondition => "endpoints share extra neighbours",
            RejectReason::TwoGon => "adjacent faces share their opposite vertex",
            RejectReason::LowValence => "opposite vertex would become degenerate",
            RejectReason::DanglingFace => "adjacent face would be left dangling",
            RejectReason::PinchedBoundary => "interior edge joins two boundary vertices",
            RejectReason::NonManifoldVertex => "vertex is shared by more than one fan",
            RejectReason::PositionOccupied => "target position belongs to another vertex",
            RejectReason::TwinRepair => "twin pairing could not be repaired",
        };
        f.write_str(text)
    }
}

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// An input face is not a valid triangle.
    #[error("face {face} is malformed: {reason}")]
    MalformedFace {
        /// Index of the face in the input sequence.
        face: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Construction left half-edges without a twin or vertices with several fans.
    #[error(
        "mesh is not a closed 2-manifold: {open_edges} open or non-manifold edges, \
         {non_manifold_vertices} non-manifold vertices"
    )]
    NonManifoldInput {
        /// Number of edges without a twin.
        open_edges: usize,
        /// Number of vertices whose faces do not form one fan.
        non_manifold_vertices: usize,
    },

    /// An edge collapse was refused; the mesh is unchanged.
    #[error("edge collapse rejected: {reason}")]
    CollapseRejected {
        /// Why the collapse was refused.
        reason: RejectReason,
    },

    /// The connectivity violates an invariant that should always hold.
    #[error("inconsistent topology: {context}")]
    InconsistentTopology {
        /// Description of the violation.
        context: String,
    },

    /// A handle does not refer to a live element.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: fmt::Display>(name: &'static str, value: T, reason: &'static str) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn malformed(face: usize, reason: impl Into<String>) -> Self {
        MeshError::MalformedFace {
            face,
            reason: reason.into(),
        }
    }

    pub(crate) fn rejected(reason: RejectReason) -> Self {
        MeshError::CollapseRejected { reason }
    }

    pub(crate) fn inconsistent(context: impl Into<String>) -> Self {
        MeshError::InconsistentTopology {
            context: context.into(),
        }
    }

    /// Returns the rejection reason if this is a [`MeshError::CollapseRejected`].
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            MeshError::CollapseRejected { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Whether the error leaves the mesh usable (the caller may continue).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MeshError::NonManifoldInput { .. } | MeshError::CollapseRejected { .. }
        )
    }
}
