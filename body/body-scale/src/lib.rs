//! Reshape a rigged humanoid mesh to a target height and weight.
//!
//! The pipeline is linear:
//!
//! 1. [`ScaleFactors`] from height and weight, relative to a 170 cm / 60 kg
//!    reference body
//! 2. Load the base mesh into a fresh [`SceneContext`](mesh_scene::SceneContext)
//! 3. Resolve body regions to joints ([`RigMap`]) and apply the
//!    [`pose_plan`]: spine bones lengthen with height, pelvis and legs
//!    thicken with BMI, and the upper abdomen gets extra belly width and depth
//! 4. Optionally replace every material image with a new texture
//! 5. Bake the pose into the vertices and remove the armatures
//! 6. Export a single GLB
//!
//! Pose scale is applied in joint-local axes: X is width, Y runs along the
//! bone, Z is depth.
//!
//! # Example
//!
//! ```no_run
//! use body_scale::{scale_file, ScaleParams};
//! use std::path::Path;
//!
//! let out = scale_file(
//!     Path::new("base_models/female.glb"),
//!     Path::new("generated_models/alice/2024-05-01-12-00-00.glb"),
//!     &ScaleParams::new(165.0, 58.0),
//! )
//! .unwrap();
//! assert!(out.report.armatures_removed > 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod factors;
mod pipeline;
mod plan;
mod rig_map;
mod texture;

pub use error::{ScaleError, ScaleResult, TextureLoadError};
pub use factors::{
    BELLY_DEPTH, BELLY_WIDTH, BMI_EXPONENT, HEIGHT_EXPONENT, REFERENCE_HEIGHT_CM,
    REFERENCE_WEIGHT_KG, SPINE_LENGTH_EXPONENT, ScaleFactors, bmi,
};
pub use pipeline::{OutputMesh, ScaleParams, ScaleReport, scale_file, scale_scene};
pub use plan::{PlanOutcome, PoseEdit, apply_plan, pose_plan};
pub use rig_map::{BodyRegion, Gender, RigMap};
pub use texture::{load_texture, substitute_texture};
