//! The pose edits that reshape a body.

use mesh_rig::Skeleton;
use nalgebra::Vector3;
use tracing::debug;

use crate::factors::{BELLY_DEPTH, BELLY_WIDTH};
use crate::{BodyRegion, RigMap, ScaleFactors};

/// One edit to a joint's pose scale, in joint-local axes
/// (X width, Y length, Z depth).
///
/// `set` components overwrite the current pose scale; `multiply` is applied
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEdit {
    /// Region whose joint is edited.
    pub region: BodyRegion,
    /// Per-axis values to assign, `None` to keep.
    pub set: [Option<f64>; 3],
    /// Per-axis multipliers.
    pub multiply: [f64; 3],
}

impl PoseEdit {
    const fn assign(region: BodyRegion, set: [Option<f64>; 3]) -> Self {
        Self {
            region,
            set,
            multiply: [1.0; 3],
        }
    }

    /// Apply to a pose scale.
    #[must_use]
    pub fn apply(&self, scale: Vector3<f64>) -> Vector3<f64> {
        Vector3::from_fn(|axis, _| self.set[axis].unwrap_or(scale[axis]) * self.multiply[axis])
    }
}

/// Build the ordered edit list for a set of factors.
///
/// Spine bones lengthen with height; pelvis and legs thicken with BMI; the
/// belly edit on `spine_03` runs last and compounds with the spine edit.
#[must_use]
pub fn pose_plan(factors: &ScaleFactors) -> Vec<PoseEdit> {
    let spine = factors.spine_length();
    let bmi = factors.bmi_scale;

    vec![
        PoseEdit::assign(BodyRegion::Spine02, [None, Some(spine), None]),
        PoseEdit::assign(BodyRegion::Spine03, [None, Some(spine), None]),
        PoseEdit::assign(BodyRegion::Pelvis, [Some(bmi), None, Some(bmi)]),
        PoseEdit::assign(BodyRegion::ThighL, [Some(bmi), Some(1.0), Some(bmi)]),
        PoseEdit::assign(BodyRegion::ThighR, [Some(bmi), Some(1.0), Some(bmi)]),
        PoseEdit::assign(BodyRegion::CalfL, [Some(bmi), Some(1.0), Some(bmi)]),
        PoseEdit::assign(BodyRegion::CalfR, [Some(bmi), Some(1.0), Some(bmi)]),
        PoseEdit {
            region: BodyRegion::Spine03,
            set: [None; 3],
            multiply: [bmi * BELLY_WIDTH, 1.0, bmi * BELLY_DEPTH],
        },
    ]
}

/// Outcome of applying a plan to one skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Joint names edited, once each, in first-edit order.
    pub scaled: Vec<String>,
    /// Joint names the skeleton lacks.
    pub skipped: Vec<String>,
}

/// Apply `plan` to `skeleton`, skipping regions `map` has no joint for.
pub fn apply_plan(skeleton: &mut Skeleton, map: &RigMap, plan: &[PoseEdit]) -> PlanOutcome {
    let mut outcome = PlanOutcome::default();

    for edit in plan {
        let name = edit.region.joint_name().to_string();
        let Some(joint) = map.get(edit.region).and_then(|id| skeleton.joint_mut(id)) else {
            if !outcome.skipped.contains(&name) {
                debug!(joint = %name, "Joint not in skeleton; skipping");
                outcome.skipped.push(name);
            }
            continue;
        };

        joint.pose_scale = edit.apply(joint.pose_scale);
        debug!(
            joint = %name,
            x = joint.pose_scale.x,
            y = joint.pose_scale.y,
            z = joint.pose_scale.z,
            "Scaled joint"
        );
        if !outcome.scaled.contains(&name) {
            outcome.scaled.push(name);
        }
    }

    outcome
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_rig::{Joint, JointTransform};

    fn full_rig() -> Skeleton {
        let mut s = Skeleton::default();
        let pelvis = s.add_joint(Joint::new("pelvis", None, JointTransform::identity()));
        let spine_02 = s.add_joint(Joint::new("spine_02", Some(pelvis), JointTransform::identity()));
        s.add_joint(Joint::new("spine_03", Some(spine_02), JointTransform::identity()));
        for side in ["l", "r"] {
            let thigh = s.add_joint(Joint::new(format!("thigh_{side}"), Some(pelvis), JointTransform::identity()));
            s.add_joint(Joint::new(format!("calf_{side}"), Some(thigh), JointTransform::identity()));
        }
        s
    }

    fn scale_of(s: &Skeleton, name: &str) -> Vector3<f64> {
        s.joint(s.find(name).unwrap()).unwrap().pose_scale
    }

    #[test]
    fn edit_sets_then_multiplies() {
        let edit = PoseEdit {
            region: BodyRegion::Pelvis,
            set: [Some(2.0), None, None],
            multiply: [1.5, 1.0, 3.0],
        };
        let out = edit.apply(Vector3::new(7.0, 0.5, 1.0));
        assert_relative_eq!(out, Vector3::new(3.0, 0.5, 3.0));
    }

    #[test]
    fn full_rig_gets_expected_scales() {
        let factors = ScaleFactors::new(180.0, 90.0).unwrap();
        let mut s = full_rig();
        let map = RigMap::resolve(&s);
        let outcome = apply_plan(&mut s, &map, &pose_plan(&factors));

        let b = factors.bmi_scale;
        let spine = factors.spine_length();
        assert_relative_eq!(scale_of(&s, "spine_02"), Vector3::new(1.0, spine, 1.0));
        assert_relative_eq!(
            scale_of(&s, "spine_03"),
            Vector3::new(b * 1.15, spine, b * 1.25),
            epsilon = 1e-12
        );
        assert_relative_eq!(scale_of(&s, "pelvis"), Vector3::new(b, 1.0, b));
        for leg in ["thigh_l", "thigh_r", "calf_l", "calf_r"] {
            assert_relative_eq!(scale_of(&s, leg), Vector3::new(b, 1.0, b));
        }
        assert_eq!(outcome.scaled.len(), 7);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn reference_body_still_shapes_belly() {
        // at the reference build bmi_scale is 1 but the belly multipliers remain
        let mut s = full_rig();
        let map = RigMap::resolve(&s);
        apply_plan(&mut s, &map, &pose_plan(&ScaleFactors::identity()));
        assert_relative_eq!(scale_of(&s, "spine_03"), Vector3::new(1.15, 1.0, 1.25));
        assert_relative_eq!(scale_of(&s, "pelvis"), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn missing_joints_are_skipped_once() {
        let mut s = Skeleton::default();
        s.add_joint(Joint::new("pelvis", None, JointTransform::identity()));
        let map = RigMap::resolve(&s);
        let outcome = apply_plan(&mut s, &map, &pose_plan(&ScaleFactors::identity()));

        assert_eq!(outcome.scaled, vec!["pelvis".to_string()]);
        assert_eq!(outcome.skipped.len(), 6);
        assert_eq!(
            outcome.skipped.iter().filter(|n| n.as_str() == "spine_03").count(),
            1
        );
    }
}
