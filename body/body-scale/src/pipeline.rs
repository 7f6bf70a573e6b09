//! The end-to-end scaling pipeline.

use std::path::{Path, PathBuf};

use mesh_scene::SceneContext;
use serde::Serialize;
use tracing::{info, warn};

use crate::plan::{apply_plan, pose_plan};
use crate::texture::substitute_texture;
use crate::{RigMap, ScaleError, ScaleFactors, ScaleResult};

/// Parameters for one scaling job.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleParams {
    /// Target height in centimeters.
    pub height_cm: f64,
    /// Target weight in kilograms.
    pub weight_kg: f64,
    /// Optional replacement texture.
    pub texture: Option<PathBuf>,
}

impl ScaleParams {
    /// Parameters with no texture replacement.
    #[must_use]
    pub const fn new(height_cm: f64, weight_kg: f64) -> Self {
        Self {
            height_cm,
            weight_kg,
            texture: None,
        }
    }

    /// Replace material images with the image at `path`, if it exists.
    #[must_use]
    pub fn with_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture = Some(path.into());
        self
    }

    /// Compute the scale factors.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::InvalidMeasurement`] for non-positive inputs.
    pub fn factors(&self) -> ScaleResult<ScaleFactors> {
        ScaleFactors::new(self.height_cm, self.weight_kg)
    }
}

/// What a scaling job did to a scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleReport {
    /// Factors used.
    pub factors: ScaleFactors,
    /// Joints whose pose scale changed.
    pub joints_scaled: Vec<String>,
    /// Target joints the skeleton lacked.
    pub joints_skipped: Vec<String>,
    /// Textures rebound to the replacement image.
    pub textures_replaced: usize,
    /// Meshes that were skinned and baked.
    pub meshes_baked: usize,
    /// Armatures removed after baking.
    pub armatures_removed: usize,
    /// Mesh objects in the result.
    pub meshes: usize,
    /// Vertices in the result.
    pub vertices: usize,
}

impl ScaleReport {
    /// Whether a replacement texture was applied.
    #[must_use]
    pub const fn texture_substituted(&self) -> bool {
        self.textures_replaced > 0
    }
}

/// A finished, skeleton-free mesh on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputMesh {
    /// Where the GLB was written.
    pub path: PathBuf,
    /// What was done to produce it.
    pub report: ScaleReport,
}

/// Reshape a loaded scene in place.
///
/// Every armature is posed with the same plan, every bound mesh is baked,
/// and all armatures are removed. Target joints a skeleton lacks are
/// skipped. A texture that cannot be loaded is logged and ignored.
///
/// `origin` names the scene in error messages.
///
/// # Errors
///
/// - [`ScaleError::InvalidMeasurement`] for non-positive height or weight.
/// - [`ScaleError::Geometry`] if the scene has no armature.
/// - [`ScaleError::Scene`] if skinning data is inconsistent.
pub fn scale_scene(
    scene: &mut SceneContext,
    params: &ScaleParams,
    origin: &str,
) -> ScaleResult<ScaleReport> {
    let factors = params.factors()?;
    if !scene.has_armature() {
        return Err(ScaleError::Geometry {
            origin: origin.to_string(),
        });
    }

    info!(
        height_cm = params.height_cm,
        weight_kg = params.weight_kg,
        bmi = factors.bmi,
        height_ratio = factors.height_ratio,
        bmi_scale = factors.bmi_scale,
        "Computed scale factors"
    );

    let plan = pose_plan(&factors);
    let mut joints_scaled: Vec<String> = Vec::new();
    let mut joints_skipped: Vec<String> = Vec::new();
    for armature in &mut scene.armatures {
        let map = RigMap::resolve(&armature.skeleton);
        let outcome = apply_plan(&mut armature.skeleton, &map, &plan);
        for name in outcome.scaled {
            if !joints_scaled.contains(&name) {
                joints_scaled.push(name);
            }
        }
        for name in outcome.skipped {
            if !joints_skipped.contains(&name) {
                joints_skipped.push(name);
            }
        }
    }
    joints_skipped.retain(|name| !joints_scaled.contains(name));
    if joints_scaled.is_empty() {
        warn!(origin, "No target joints found; output keeps base proportions");
    }

    let textures_replaced = params
        .texture
        .as_deref()
        .map_or(0, |path| substitute_texture(scene, path));

    let bake = scene.bake_skins()?;
    let armatures_removed = scene.discard_armatures();

    Ok(ScaleReport {
        factors,
        joints_scaled,
        joints_skipped,
        textures_replaced,
        meshes_baked: bake.meshes_baked,
        armatures_removed,
        meshes: scene.meshes.len(),
        vertices: scene.vertex_count(),
    })
}

/// Load `base`, reshape it, and write a skeleton-free GLB to `output`.
///
/// Parent directories of `output` are created. The file appears only when
/// the whole job succeeds.
///
/// # Errors
///
/// Any error from [`scale_scene`], plus [`ScaleError::Io`] if the base mesh
/// cannot be read or the output cannot be written.
///
/// # Example
///
/// ```no_run
/// use body_scale::{scale_file, ScaleParams};
///
/// let params = ScaleParams::new(180.0, 90.0).with_texture("clothes/denim.png");
/// let out = scale_file("base_models/male.glb".as_ref(), "out/bob.glb".as_ref(), &params).unwrap();
/// println!("{} vertices", out.report.vertices);
/// ```
pub fn scale_file(base: &Path, output: &Path, params: &ScaleParams) -> ScaleResult<OutputMesh> {
    // Reject bad measurements before touching the filesystem.
    params.factors()?;

    let mut scene = mesh_io::load_glb(base)?;
    let report = scale_scene(&mut scene, params, &base.display().to_string())?;
    mesh_io::save_glb(&scene, output)?;

    info!(
        output = %output.display(),
        joints = report.joints_scaled.len(),
        skipped = report.joints_skipped.len(),
        vertices = report.vertices,
        "Exported scaled mesh"
    );
    Ok(OutputMesh {
        path: output.to_path_buf(),
        report,
    })
}
