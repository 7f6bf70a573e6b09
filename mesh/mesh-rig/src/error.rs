//! Error types for rig operations.

use thiserror::Error;

/// Errors that can occur while building or evaluating a skeleton.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RigError {
    /// A joint names a parent that does not exist.
    #[error("joint {joint} references parent {parent}, but the skeleton has {joint_count} joints")]
    InvalidParent {
        /// Index of the offending joint.
        joint: usize,
        /// The parent index it references.
        parent: usize,
        /// Number of joints in the skeleton.
        joint_count: usize,
    },

    /// The parent links form a cycle.
    #[error("joint hierarchy contains a cycle through joint {joint}")]
    CyclicHierarchy {
        /// A joint on the cycle.
        joint: usize,
    },

    /// Per-vertex weights do not line up with the mesh.
    #[error("mesh has {vertices} vertices but {weights} weight entries")]
    WeightCountMismatch {
        /// Number of vertices in the mesh.
        vertices: usize,
        /// Number of weight entries supplied.
        weights: usize,
    },

    /// A weight references a joint outside the skeleton.
    #[error("vertex {vertex} references joint {joint}, but the skeleton has {joint_count} joints")]
    JointOutOfRange {
        /// Index of the vertex.
        vertex: usize,
        /// Joint index it references.
        joint: usize,
        /// Number of joints in the skeleton.
        joint_count: usize,
    },
}

/// Result type for rig operations.
pub type RigResult<T> = Result<T, RigError>;
