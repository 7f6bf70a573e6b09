//! Job requests and output layout.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io;
use std::path::{Component, Path, PathBuf};

use body_scale::{Gender, ScaleFactors};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{JobError, JobResult};

/// Timestamp format of generated file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Numbered names tried after the plain timestamp is taken.
const MAX_NAME_SUFFIX: u32 = 999;

/// A validated request for one scaled body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingRequest {
    /// Base mesh to start from.
    pub gender: Gender,
    /// Target height in centimeters.
    pub height_cm: f64,
    /// Target weight in kilograms.
    pub weight_kg: f64,
    /// Replacement texture file name under the clothes directory.
    pub texture: Option<String>,
    /// Directory name the output is filed under.
    pub owner_tag: String,
}

impl ScalingRequest {
    /// Check measurements and owner tag.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidRequest`] for non-positive measurements or
    /// an owner tag that is not a directory name, and
    /// [`JobError::MissingIdentifier`] for a blank owner tag.
    pub fn validate(&self) -> JobResult<()> {
        ScaleFactors::new(self.height_cm, self.weight_kg)
            .map_err(|e| JobError::invalid_request(e.to_string()))?;
        owner_dir(&self.owner_tag)?;
        Ok(())
    }
}

/// One engine invocation: `base output height weight [texture]`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    /// Base mesh.
    pub base_mesh: PathBuf,
    /// Where the engine must write the GLB.
    pub output: PathBuf,
    /// Target height in centimeters.
    pub height_cm: f64,
    /// Target weight in kilograms.
    pub weight_kg: f64,
    /// Replacement texture, already resolved.
    pub texture: Option<PathBuf>,
}

impl JobRequest {
    /// Positional engine arguments.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let mut args = vec![
            self.base_mesh.clone().into_os_string(),
            self.output.clone().into_os_string(),
            self.height_cm.to_string().into(),
            self.weight_kg.to_string().into(),
        ];
        if let Some(texture) = &self.texture {
            args.push(texture.clone().into_os_string());
        }
        args
    }
}

/// Check that an owner tag can name its own output directory.
///
/// Accepted tags are used unchanged, so distinct owners never share a
/// directory. Any script is allowed; path separators, `:`, control
/// characters and the names `.` and `..` are not.
///
/// # Errors
///
/// Returns [`JobError::MissingIdentifier`] for a blank tag and
/// [`JobError::InvalidRequest`] for one that is not a single path component.
pub fn owner_dir(tag: &str) -> JobResult<String> {
    if tag.trim().is_empty() {
        return Err(JobError::MissingIdentifier);
    }
    if matches!(tag, "." | "..")
        || tag
            .chars()
            .any(|c| c.is_control() || matches!(c, '/' | '\\' | ':'))
    {
        return Err(JobError::invalid_request(format!(
            "owner {tag:?} is not a usable directory name"
        )));
    }
    Ok(tag.to_string())
}

/// File name for an output created at `now`.
#[must_use]
pub fn output_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}.glb", now.format(TIMESTAMP_FORMAT))
}

/// Claim an unused output file in `dir` for a job started at `now`.
///
/// Tries `<timestamp>.glb`, then `<timestamp>-1.glb`, `<timestamp>-2.glb`
/// and so on, creating each as an empty file with `create_new`. Two jobs
/// for one owner in the same second therefore never write the same file.
/// Returns the claimed file name.
///
/// # Errors
///
/// Returns [`JobError::Io`] if the directory is not writable or every
/// numbered name is taken.
pub fn reserve_output<Tz: TimeZone>(dir: &Path, now: &DateTime<Tz>) -> JobResult<String>
where
    Tz::Offset: std::fmt::Display,
{
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    for n in 0..=MAX_NAME_SUFFIX {
        let name = if n == 0 {
            format!("{stamp}.glb")
        } else {
            format!("{stamp}-{n}.glb")
        };
        match OpenOptions::new().write(true).create_new(true).open(dir.join(&name)) {
            Ok(_) => {
                debug!(dir = %dir.display(), name = %name, "Reserved output");
                return Ok(name);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free output name for {stamp} in {}", dir.display()),
    )
    .into())
}

/// Resolve a requested texture name under `clothes_dir`.
///
/// Blank names, names that are not a single plain file name, and files that
/// do not exist all resolve to `None`.
#[must_use]
pub fn resolve_texture(clothes_dir: &Path, name: Option<&str>) -> Option<PathBuf> {
    let name = name.map(str::trim).filter(|n| !n.is_empty())?;

    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single {
        debug!(name, "Rejected texture name");
        return None;
    }

    let candidate = clothes_dir.join(name);
    if candidate.is_file() {
        Some(candidate)
    } else {
        debug!(path = %candidate.display(), "Texture not found; generating without it");
        None
    }
}
