//! Error types for scene operations.

use mesh_rig::RigError;
use thiserror::Error;

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors raised when a scene's cross references or rigs are inconsistent.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SceneError {
    /// A mesh's skin binding names an armature that does not exist.
    #[error("mesh {mesh:?} is bound to armature {armature}, but the scene has {count}")]
    MissingArmature {
        /// Name of the mesh object.
        mesh: String,
        /// Armature index it references.
        armature: usize,
        /// Number of armatures in the scene.
        count: usize,
    },

    /// A mesh references a material that does not exist.
    #[error("mesh {mesh:?} uses material {material}, but the scene has {count}")]
    MissingMaterial {
        /// Name of the mesh object.
        mesh: String,
        /// Material index it references.
        material: usize,
        /// Number of materials in the scene.
        count: usize,
    },

    /// A material or texture references a missing texture or image.
    #[error("{kind} {index} is referenced but the scene has {count}")]
    DanglingReference {
        /// What kind of item is missing (`"texture"` or `"image"`).
        kind: &'static str,
        /// The referenced index.
        index: usize,
        /// Number of items of that kind.
        count: usize,
    },

    /// Skinning failed for a mesh.
    #[error("failed to skin mesh {mesh:?}: {source}")]
    Skin {
        /// Name of the mesh object.
        mesh: String,
        /// Underlying rig error.
        #[source]
        source: RigError,
    },

    /// The skeleton itself is malformed.
    #[error(transparent)]
    Rig(#[from] RigError),
}
