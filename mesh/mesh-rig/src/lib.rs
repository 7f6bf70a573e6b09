//! Skeletons, pose scaling and linear-blend skinning.
//!
//! This crate models the joint hierarchy of a rigged character and the
//! operations needed to reshape it:
//!
//! - [`Skeleton`] - A joint hierarchy placed in the world by its armature transform
//! - [`Joint`] - Rest transform, pose scale and inverse bind matrix
//! - [`VertexWeights`] - Up to four joint influences per vertex
//! - [`skin_mesh`] - Bake the current pose into vertex positions and normals
//!
//! # Pose scale
//!
//! Each joint carries a per-axis pose scale applied in its local frame, on
//! top of its rest scale. Local Y runs along the bone, so scaling Y
//! lengthens a bone and scaling X/Z thickens it. Pose scale is inherited by
//! child joints through the hierarchy.
//!
//! # Example
//!
//! ```
//! use mesh_rig::{skin_mesh, Joint, JointTransform, Skeleton, VertexWeights};
//! use mesh_types::{unit_cube, MeshTopology};
//! use nalgebra::{Matrix4, Vector3};
//!
//! let mut skeleton = Skeleton::new(Matrix4::identity());
//! let root = skeleton.add_joint(Joint::new("pelvis", None, JointTransform::identity()));
//! skeleton.bind_at_rest().unwrap();
//! skeleton.scale_pose(root, Vector3::new(2.0, 1.0, 2.0));
//!
//! let cube = unit_cube();
//! let weights = vec![VertexWeights::single(0); cube.vertex_count()];
//! let matrices = skeleton.skinning_matrices().unwrap();
//! let baked = skin_mesh(&cube, &weights, &matrices, &Matrix4::identity()).unwrap();
//!
//! let x_extent = baked.mesh.vertices.iter().map(|v| v.position.x).fold(0.0, f64::max);
//! assert!((x_extent - 2.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod skeleton;
mod skinning;
mod transform;
mod weights;

pub use error::{RigError, RigResult};
pub use skeleton::{Joint, JointId, Pose, Skeleton};
pub use skinning::{SkinOutput, skin_mesh};
pub use transform::JointTransform;
pub use weights::VertexWeights;
