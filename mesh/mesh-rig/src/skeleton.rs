//! Joint hierarchy and pose evaluation.

use nalgebra::{Matrix4, Vector3};
use tracing::debug;

use crate::{JointTransform, RigError, RigResult};

/// Index of a joint within its [`Skeleton`].
///
/// Joint ids follow skin order: the same index addresses the joint, its
/// inverse bind matrix, and the joint slot used in vertex weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub usize);

impl JointId {
    /// The raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single named joint (bone).
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Joint name as authored in the source asset.
    pub name: String,
    /// Parent joint, or `None` for a root joint.
    pub parent: Option<JointId>,
    /// Rest-pose local transform.
    pub rest: JointTransform,
    /// Pose-space scale applied on top of the rest scale, per local axis.
    ///
    /// Starts at `(1, 1, 1)`. Local Y runs along the bone.
    pub pose_scale: Vector3<f64>,
    /// Inverse bind matrix: maps mesh bind space into this joint's space.
    pub inverse_bind: Matrix4<f64>,
}

impl Joint {
    /// Create a joint with an identity inverse bind matrix and no pose scale.
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<JointId>, rest: JointTransform) -> Self {
        Self {
            name: name.into(),
            parent,
            rest,
            pose_scale: Vector3::new(1.0, 1.0, 1.0),
            inverse_bind: Matrix4::identity(),
        }
    }

    /// Set the inverse bind matrix.
    #[must_use]
    pub const fn with_inverse_bind(mut self, inverse_bind: Matrix4<f64>) -> Self {
        self.inverse_bind = inverse_bind;
        self
    }

    /// Whether the pose scale differs from identity.
    #[must_use]
    pub fn is_posed(&self) -> bool {
        (self.pose_scale - Vector3::new(1.0, 1.0, 1.0)).amax() > f64::EPSILON
    }

    fn local_matrix(&self, pose: Pose) -> Matrix4<f64> {
        match pose {
            Pose::Rest => self.rest.to_matrix(),
            Pose::Current => self.rest.to_matrix_with_scale(&self.pose_scale),
        }
    }
}

/// Which pose to evaluate a skeleton in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    /// Rest transforms only; pose scale ignored.
    Rest,
    /// Rest transforms with pose scale applied.
    Current,
}

/// A joint hierarchy with a world placement.
///
/// # Example
///
/// ```
/// use mesh_rig::{Joint, JointTransform, Pose, Skeleton};
/// use nalgebra::{Matrix4, Vector3};
///
/// let mut skeleton = Skeleton::new(Matrix4::identity());
/// let root = skeleton.add_joint(Joint::new("pelvis", None, JointTransform::identity()));
/// let spine = skeleton.add_joint(Joint::new(
///     "spine_01",
///     Some(root),
///     JointTransform::from_translation(Vector3::new(0.0, 0.2, 0.0)),
/// ));
///
/// skeleton.scale_pose(root, Vector3::new(1.0, 2.0, 1.0));
/// let world = skeleton.world_matrices(Pose::Current).unwrap();
/// // child offset is stretched by the parent's Y scale
/// assert!((world[spine.index()][(1, 3)] - 0.4).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    joints: Vec<Joint>,
    /// World transform of the armature; parent of every root joint.
    pub transform: Matrix4<f64>,
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new(Matrix4::identity())
    }
}

impl Skeleton {
    /// Create an empty skeleton placed at `transform`.
    #[must_use]
    pub const fn new(transform: Matrix4<f64>) -> Self {
        Self {
            joints: Vec::new(),
            transform,
        }
    }

    /// Append a joint, returning its id.
    ///
    /// Parent links are validated lazily by [`Skeleton::validate`] and the
    /// evaluation methods, so joints may be added in any order.
    pub fn add_joint(&mut self, joint: Joint) -> JointId {
        self.joints.push(joint);
        JointId(self.joints.len() - 1)
    }

    /// Number of joints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Whether the skeleton has no joints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// All joints in id order.
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Look up a joint.
    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.0)
    }

    /// Look up a joint mutably.
    pub fn joint_mut(&mut self, id: JointId) -> Option<&mut Joint> {
        self.joints.get_mut(id.0)
    }

    /// Find the first joint with exactly this name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<JointId> {
        self.joints.iter().position(|j| j.name == name).map(JointId)
    }

    /// Replace a joint's pose scale. Returns `false` if the id is unknown.
    pub fn set_pose_scale(&mut self, id: JointId, scale: Vector3<f64>) -> bool {
        self.joint_mut(id).is_some_and(|joint| {
            joint.pose_scale = scale;
            true
        })
    }

    /// Multiply a joint's pose scale component-wise. Returns `false` if the
    /// id is unknown.
    pub fn scale_pose(&mut self, id: JointId, factor: Vector3<f64>) -> bool {
        self.joint_mut(id).is_some_and(|joint| {
            joint.pose_scale.component_mul_assign(&factor);
            true
        })
    }

    /// Check parent links for range errors and cycles.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::InvalidParent`] or [`RigError::CyclicHierarchy`].
    pub fn validate(&self) -> RigResult<()> {
        self.world_matrices(Pose::Rest).map(|_| ())
    }

    /// World matrix of every joint, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`RigError::InvalidParent`] if a parent index is out of
    /// range, or [`RigError::CyclicHierarchy`] if the parent links loop.
    pub fn world_matrices(&self, pose: Pose) -> RigResult<Vec<Matrix4<f64>>> {
        let count = self.joints.len();
        let mut world: Vec<Option<Matrix4<f64>>> = vec![None; count];

        for start in 0..count {
            if world[start].is_some() {
                continue;
            }

            // Walk up to the nearest resolved ancestor, then resolve downwards.
            let mut chain = Vec::new();
            let mut cursor = Some(start);
            while let Some(index) = cursor {
                if world[index].is_some() {
                    break;
                }
                if chain.contains(&index) {
                    return Err(RigError::CyclicHierarchy { joint: index });
                }
                chain.push(index);
                cursor = match self.joints[index].parent {
                    Some(JointId(parent)) if parent >= count => {
                        return Err(RigError::InvalidParent {
                            joint: index,
                            parent,
                            joint_count: count,
                        });
                    }
                    Some(JointId(parent)) => Some(parent),
                    None => None,
                };
            }

            for &index in chain.iter().rev() {
                let joint = &self.joints[index];
                let parent_world = match joint.parent {
                    Some(JointId(parent)) => world[parent].unwrap_or(self.transform),
                    None => self.transform,
                };
                world[index] = Some(parent_world * joint.local_matrix(pose));
            }
        }

        Ok(world
            .into_iter()
            .map(|m| m.unwrap_or(self.transform))
            .collect())
    }

    /// Skinning matrices for the current pose: `world * inverse_bind`.
    ///
    /// # Errors
    ///
    /// Propagates hierarchy errors from [`Skeleton::world_matrices`].
    pub fn skinning_matrices(&self) -> RigResult<Vec<Matrix4<f64>>> {
        let world = self.world_matrices(Pose::Current)?;
        let matrices: Vec<_> = world
            .iter()
            .zip(&self.joints)
            .map(|(w, joint)| w * joint.inverse_bind)
            .collect();

        debug!(
            joints = matrices.len(),
            posed = self.joints.iter().filter(|j| j.is_posed()).count(),
            "Computed skinning matrices"
        );

        Ok(matrices)
    }

    /// Set each joint's inverse bind matrix to the inverse of its current
    /// rest world matrix, binding the skeleton to meshes in world space.
    ///
    /// Joints whose world matrix is singular keep their previous value.
    ///
    /// # Errors
    ///
    /// Propagates hierarchy errors from [`Skeleton::world_matrices`].
    pub fn bind_at_rest(&mut self) -> RigResult<()> {
        let world = self.world_matrices(Pose::Rest)?;
        for (joint, matrix) in self.joints.iter_mut().zip(world) {
            if let Some(inverse) = matrix.try_inverse() {
                joint.inverse_bind = inverse;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn chain() -> (Skeleton, JointId, JointId, JointId) {
        let mut s = Skeleton::new(Matrix4::new_translation(&Vector3::new(0.0, 1.0, 0.0)));
        let a = s.add_joint(Joint::new("a", None, JointTransform::identity()));
        let b = s.add_joint(Joint::new(
            "b",
            Some(a),
            JointTransform::from_translation(Vector3::new(0.0, 0.5, 0.0)),
        ));
        let c = s.add_joint(Joint::new(
            "c",
            Some(b),
            JointTransform::from_translation(Vector3::new(0.0, 0.5, 0.0)),
        ));
        (s, a, b, c)
    }

    #[test]
    fn rest_world_includes_armature_transform() {
        let (s, _, _, c) = chain();
        let world = s.world_matrices(Pose::Rest).unwrap();
        let p = world[c.index()].transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn pose_scale_propagates_to_children() {
        let (mut s, a, _, c) = chain();
        assert!(s.scale_pose(a, Vector3::new(1.0, 2.0, 1.0)));

        let rest = s.world_matrices(Pose::Rest).unwrap();
        let posed = s.world_matrices(Pose::Current).unwrap();

        let rest_c = rest[c.index()].transform_point(&Point3::origin());
        let posed_c = posed[c.index()].transform_point(&Point3::origin());
        assert_relative_eq!(rest_c.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(posed_c.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn parents_may_follow_children() {
        let mut s = Skeleton::default();
        let child = s.add_joint(Joint::new(
            "child",
            Some(JointId(1)),
            JointTransform::from_translation(Vector3::new(1.0, 0.0, 0.0)),
        ));
        s.add_joint(Joint::new(
            "root",
            None,
            JointTransform::from_translation(Vector3::new(0.0, 0.0, 1.0)),
        ));

        let world = s.world_matrices(Pose::Rest).unwrap();
        let p = world[child.index()].transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(1.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn cycle_is_rejected() {
        let mut s = Skeleton::default();
        s.add_joint(Joint::new("a", Some(JointId(1)), JointTransform::identity()));
        s.add_joint(Joint::new("b", Some(JointId(0)), JointTransform::identity()));
        assert!(matches!(s.validate(), Err(RigError::CyclicHierarchy { .. })));
    }

    #[test]
    fn invalid_parent_is_rejected() {
        let mut s = Skeleton::default();
        s.add_joint(Joint::new("a", Some(JointId(7)), JointTransform::identity()));
        assert!(matches!(
            s.validate(),
            Err(RigError::InvalidParent { parent: 7, .. })
        ));
    }

    #[test]
    fn skinning_matrices_are_identity_after_bind_at_rest() {
        let (mut s, _, _, _) = chain();
        s.bind_at_rest().unwrap();
        for m in s.skinning_matrices().unwrap() {
            assert_relative_eq!(m, Matrix4::identity(), epsilon = 1e-12);
        }
    }

    #[test]
    fn find_and_pose() {
        let (mut s, _, b, _) = chain();
        assert_eq!(s.find("b"), Some(b));
        assert_eq!(s.find("missing"), None);

        assert!(s.set_pose_scale(b, Vector3::new(2.0, 2.0, 2.0)));
        assert!(s.joint(b).is_some_and(Joint::is_posed));
        assert_eq!(s.joints().iter().filter(|j| j.is_posed()).count(), 1);
        assert!(!s.set_pose_scale(JointId(99), Vector3::zeros()));
    }
}
