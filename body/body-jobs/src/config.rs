//! Server configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use body_scale::Gender;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::{JobError, JobResult};

/// Characters escaped inside one URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// How to launch the scaling engine.
///
/// The job's positional arguments (`base output height weight [texture]`)
/// are appended after `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Executable to run.
    pub program: PathBuf,
    /// Leading arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("bodyscale"),
            args: vec!["scale".to_string()],
        }
    }
}

impl EngineConfig {
    /// Run `program` with no leading arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Set the leading arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Directory layout and engine settings for model generation.
///
/// Relative directories are resolved against `base_dir`.
///
/// # Example
///
/// ```
/// use body_jobs::ServerConfig;
///
/// let config = ServerConfig::default().with_base_dir("/srv/models");
/// assert!(config.output_path().ends_with("generated_models"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root for the relative directories below.
    pub base_dir: PathBuf,
    /// Directory holding `male.glb` and `female.glb`.
    pub base_models_dir: PathBuf,
    /// Directory of replacement textures, addressed by file name.
    pub clothes_dir: PathBuf,
    /// Directory generated models are written under.
    pub output_dir: PathBuf,
    /// URL prefix under which `output_dir` is served.
    pub public_url: String,
    /// Engine launch settings.
    pub engine: EngineConfig,
    /// Kill the engine after this many seconds. `None` waits forever.
    pub timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            base_models_dir: PathBuf::from("base_models"),
            clothes_dir: PathBuf::from("base_models/clothes"),
            output_dir: PathBuf::from("generated_models"),
            public_url: "http://localhost:8000/models".to_string(),
            engine: EngineConfig::default(),
            timeout_secs: None,
        }
    }
}

impl ServerConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> JobResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| JobError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|e| JobError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Sets the base directory.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the public URL prefix.
    #[must_use]
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into();
        self
    }

    /// Sets the engine.
    #[must_use]
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Sets the engine timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Engine timeout as a duration.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Resolved base models directory.
    #[must_use]
    pub fn base_models_path(&self) -> PathBuf {
        self.base_dir.join(&self.base_models_dir)
    }

    /// Resolved clothes directory.
    #[must_use]
    pub fn clothes_path(&self) -> PathBuf {
        self.base_dir.join(&self.clothes_dir)
    }

    /// Resolved output directory.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.base_dir.join(&self.output_dir)
    }

    /// Base mesh for a gender.
    #[must_use]
    pub fn base_model(&self, gender: Gender) -> PathBuf {
        self.base_models_path().join(gender.base_model_file())
    }

    /// Public URL of a file under the output directory. Both segments are
    /// percent-encoded.
    #[must_use]
    pub fn public_url_for(&self, owner: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_url.trim_end_matches('/'),
            utf8_percent_encode(owner, PATH_SEGMENT),
            utf8_percent_encode(file_name, PATH_SEGMENT),
        )
    }
}
