//! Body regions and their joints.

use std::fmt;
use std::str::FromStr;

use mesh_rig::{JointId, Skeleton};
use serde::{Deserialize, Serialize};

/// Which base mesh to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// `male.glb`.
    Male,
    /// `female.glb`.
    Female,
}

impl Gender {
    /// Lowercase name used in file names and requests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// File name of the base mesh for this gender.
    #[must_use]
    pub fn base_model_file(self) -> String {
        format!("{}.glb", self.as_str())
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(format!("unknown gender {other:?}, expected male or female")),
        }
    }
}

/// A body region driven by one skeleton joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyRegion {
    /// Hips.
    Pelvis,
    /// Lower chest.
    Spine02,
    /// Upper abdomen; also carries the belly shaping.
    Spine03,
    /// Left upper leg.
    ThighL,
    /// Right upper leg.
    ThighR,
    /// Left lower leg.
    CalfL,
    /// Right lower leg.
    CalfR,
}

impl BodyRegion {
    /// Every region, in plan order.
    pub const ALL: [Self; 7] = [
        Self::Pelvis,
        Self::Spine02,
        Self::Spine03,
        Self::ThighL,
        Self::ThighR,
        Self::CalfL,
        Self::CalfR,
    ];

    /// Joint name in the base meshes' rig.
    #[must_use]
    pub const fn joint_name(self) -> &'static str {
        match self {
            Self::Pelvis => "pelvis",
            Self::Spine02 => "spine_02",
            Self::Spine03 => "spine_03",
            Self::ThighL => "thigh_l",
            Self::ThighR => "thigh_r",
            Self::CalfL => "calf_l",
            Self::CalfR => "calf_r",
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Body regions resolved to joints of one skeleton.
///
/// Built once after load; a region whose joint is absent maps to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RigMap {
    joints: [Option<JointId>; BodyRegion::ALL.len()],
}

impl RigMap {
    /// Look up every region's joint by name.
    #[must_use]
    pub fn resolve(skeleton: &Skeleton) -> Self {
        Self {
            joints: BodyRegion::ALL.map(|region| skeleton.find(region.joint_name())),
        }
    }

    /// The joint for a region, if the skeleton has one.
    #[must_use]
    pub const fn get(&self, region: BodyRegion) -> Option<JointId> {
        self.joints[region.slot()]
    }

    /// Regions with no joint in this skeleton.
    pub fn missing(&self) -> impl Iterator<Item = BodyRegion> + '_ {
        BodyRegion::ALL
            .into_iter()
            .filter(|region| self.get(*region).is_none())
    }
}
