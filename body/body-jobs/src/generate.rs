//! The `/generate` contract: request in, public model URL out.

use body_scale::Gender;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::request::{owner_dir, reserve_output, resolve_texture};
use crate::{JobError, JobRequest, JobResult, JobRunner, ScalingRequest, ServerConfig};

/// Body of a model generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// `"male"` or `"female"`.
    pub gender: String,
    /// Height in centimeters.
    pub height: f64,
    /// Weight in kilograms.
    pub weight: f64,
    /// Age in years. Accepted but not used for scaling.
    #[serde(default)]
    pub age: u32,
    /// Optional texture file name under the clothes directory.
    #[serde(default)]
    pub texture: Option<String>,
    /// Owner the model is filed under.
    pub nickname: String,
}

impl TryFrom<&GenerateRequest> for ScalingRequest {
    type Error = JobError;

    fn try_from(request: &GenerateRequest) -> JobResult<Self> {
        let gender = request
            .gender
            .parse::<Gender>()
            .map_err(JobError::invalid_request)?;
        let scaling = Self {
            gender,
            height_cm: request.height,
            weight_kg: request.weight,
            texture: request.texture.clone(),
            owner_tag: request.nickname.clone(),
        };
        scaling.validate()?;
        Ok(scaling)
    }
}

/// Response to a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Where the model can be downloaded.
    pub glb_url: String,
}

/// Generate a model stamped with the current local time.
///
/// # Errors
///
/// See [`generate_at`].
pub fn generate(config: &ServerConfig, request: &GenerateRequest) -> JobResult<GenerateResponse> {
    generate_at(config, request, &Local::now())
}

/// Generate a model whose file name is stamped with `now`.
///
/// The output lands at `<output>/<owner>/<timestamp>.glb`, or a numbered
/// `<timestamp>-N.glb` when that name is already taken.
///
/// # Errors
///
/// - [`JobError::InvalidRequest`] or [`JobError::MissingIdentifier`] for a
///   bad request.
/// - Any error from [`JobRunner::run`].
pub fn generate_at(
    config: &ServerConfig,
    request: &GenerateRequest,
    now: &DateTime<Local>,
) -> JobResult<GenerateResponse> {
    let scaling = ScalingRequest::try_from(request)?;
    let owner = owner_dir(&scaling.owner_tag)?;
    let owner_path = config.output_path().join(&owner);
    std::fs::create_dir_all(&owner_path)?;
    let file_name = reserve_output(&owner_path, now)?;

    let job = JobRequest {
        base_mesh: config.base_model(scaling.gender),
        output: owner_path.join(&file_name),
        height_cm: scaling.height_cm,
        weight_kg: scaling.weight_kg,
        texture: resolve_texture(&config.clothes_path(), scaling.texture.as_deref()),
    };

    let mut runner = JobRunner::new(config.engine.clone());
    if let Some(limit) = config.timeout() {
        runner = runner.with_timeout(limit);
    }
    let outcome = runner.run(&job)?;

    let glb_url = config.public_url_for(&owner, &file_name);
    info!(
        owner = %owner,
        gender = %scaling.gender,
        age = request.age,
        output = %outcome.output.display(),
        url = %glb_url,
        "Generated model"
    );
    Ok(GenerateResponse { glb_url })
}
