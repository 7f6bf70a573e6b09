//! Translation-rotation-scale transforms for joints.

use nalgebra::{Matrix4, Quaternion, UnitQuaternion, Vector3};

/// A decomposed local transform: `T * R * S`.
///
/// This is the form glTF stores node transforms in, and the form in which
/// pose scale can be applied without disturbing rotation.
///
/// # Example
///
/// ```
/// use mesh_rig::JointTransform;
/// use nalgebra::Vector3;
///
/// let t = JointTransform::from_translation(Vector3::new(0.0, 1.0, 0.0));
/// let m = t.to_matrix();
/// assert_eq!(m[(1, 3)], 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTransform {
    /// Translation relative to the parent.
    pub translation: Vector3<f64>,
    /// Rotation relative to the parent.
    pub rotation: UnitQuaternion<f64>,
    /// Per-axis scale in the joint's own space.
    pub scale: Vector3<f64>,
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl JointTransform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// A pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Build from glTF-style arrays: translation, rotation `[x, y, z, w]`, scale.
    ///
    /// The quaternion is re-normalized.
    #[must_use]
    pub fn from_trs(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        let [x, y, z, w] = rotation.map(f64::from);
        Self {
            translation: Vector3::from(translation.map(f64::from)),
            rotation: UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
            scale: Vector3::from(scale.map(f64::from)),
        }
    }

    /// Rotation as glTF-ordered `[x, y, z, w]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rotation_xyzw(&self) -> [f32; 4] {
        let q = self.rotation.quaternion();
        [q.i as f32, q.j as f32, q.k as f32, q.w as f32]
    }

    /// Compose into a homogeneous matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix4<f64> {
        self.to_matrix_with_scale(&Vector3::new(1.0, 1.0, 1.0))
    }

    /// Compose into a matrix with an extra per-axis scale applied after the
    /// stored scale (in the joint's local frame).
    #[must_use]
    pub fn to_matrix_with_scale(&self, extra: &Vector3<f64>) -> Matrix4<f64> {
        Matrix4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale.component_mul(extra))
    }
}
