//! An explicit, per-job scene context for rigged meshes.
//!
//! A [`SceneContext`] holds everything read from one asset file: armatures,
//! mesh objects, and the materials, textures and images they use. There is no
//! global state. Each job builds its own context, edits it, and hands it to
//! an exporter.
//!
//! Cross references are indices: a [`MeshObject`] names its material and
//! armature by position, a [`Material`] names textures, a [`Texture`] names
//! an image. [`SceneContext::validate`] checks them.
//!
//! # Example
//!
//! ```
//! use mesh_rig::{Joint, JointTransform, Skeleton, VertexWeights};
//! use mesh_scene::{Armature, MeshObject, SceneContext};
//! use mesh_types::{unit_cube, MeshTopology};
//!
//! let mut scene = SceneContext::new();
//! let mut skeleton = Skeleton::default();
//! skeleton.add_joint(Joint::new("pelvis", None, JointTransform::identity()));
//! let rig = scene.add_armature(Armature::new("rig", skeleton));
//!
//! let cube = unit_cube();
//! let weights = vec![VertexWeights::single(0); cube.vertex_count()];
//! scene.add_mesh(MeshObject::new("body", cube).with_skin(rig, weights));
//!
//! scene.bake_skins().unwrap();
//! scene.discard_armatures();
//! assert!(!scene.has_armature());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod material;
mod scene;

pub use error::{SceneError, SceneResult};
pub use material::{AlphaMode, Image, ImageFormat, Material, Texture, TextureRef, TextureRole};
pub use scene::{Armature, BakeReport, MeshObject, SceneContext, SkinBinding};
