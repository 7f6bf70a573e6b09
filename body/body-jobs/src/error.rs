//! Error types for scaling jobs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::status::EngineFailure;

/// Result type for scaling jobs.
pub type JobResult<T> = Result<T, JobError>;

/// Errors from preparing, running, or collecting a scaling job.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JobError {
    /// The request is malformed.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// What was wrong.
        reason: String,
    },

    /// The request has no usable owner tag.
    #[error("missing owner identifier")]
    MissingIdentifier,

    /// The engine could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that was launched.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The engine reported that the base mesh has no skeleton.
    #[error("base mesh has no skeleton: {stderr}")]
    Geometry {
        /// Tail of the engine's standard error.
        stderr: String,
    },

    /// The engine exited with a failure status.
    #[error("engine failed ({failure}): {stderr}")]
    ExternalProcess {
        /// Classified exit status.
        failure: EngineFailure,
        /// Tail of the engine's standard error.
        stderr: String,
    },

    /// The engine was killed by a signal.
    #[error("engine terminated by signal")]
    Terminated,

    /// The engine ran past its deadline and was killed.
    #[error("engine timed out after {}s", .limit.as_secs_f64())]
    Timeout {
        /// The deadline that was exceeded.
        limit: Duration,
    },

    /// The engine reported success but wrote nothing.
    #[error("engine reported success but {path} is missing")]
    MissingOutput {
        /// Expected output path.
        path: PathBuf,
    },

    /// The configuration file is unreadable or invalid.
    #[error("invalid configuration {path}: {reason}")]
    Config {
        /// Configuration file.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// Filesystem error around the job.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Create an `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Whether the caller sent a bad request, as opposed to a server-side failure.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. } | Self::MissingIdentifier)
    }
}
