//! Engine exit codes and their meaning.
//!
//! Both sides of the process boundary use these constants: the `bodyscale
//! scale` command exits with them and [`check_exit`] interprets them.

use std::fmt;

use crate::{JobError, JobResult};

/// The job succeeded and the output file exists.
pub const EXIT_OK: i32 = 0;
/// Unclassified failure.
pub const EXIT_FAILURE: i32 = 1;
/// Bad command line or measurements.
pub const EXIT_USAGE: i32 = 2;
/// The base mesh has no skeleton.
pub const EXIT_GEOMETRY: i32 = 3;
/// The base mesh could not be read or the output could not be written.
pub const EXIT_ASSET_IO: i32 = 4;

/// A non-zero engine exit, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFailure {
    /// [`EXIT_USAGE`].
    Usage,
    /// [`EXIT_GEOMETRY`].
    Geometry,
    /// [`EXIT_ASSET_IO`].
    AssetIo,
    /// Any other non-zero code.
    Other(i32),
}

impl EngineFailure {
    /// Classify a non-zero exit code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            EXIT_USAGE => Self::Usage,
            EXIT_GEOMETRY => Self::Geometry,
            EXIT_ASSET_IO => Self::AssetIo,
            other => Self::Other(other),
        }
    }

    /// The exit code this failure is reported with.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Usage => EXIT_USAGE,
            Self::Geometry => EXIT_GEOMETRY,
            Self::AssetIo => EXIT_ASSET_IO,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage => write!(f, "usage error, exit {EXIT_USAGE}"),
            Self::Geometry => write!(f, "geometry error, exit {EXIT_GEOMETRY}"),
            Self::AssetIo => write!(f, "asset I/O error, exit {EXIT_ASSET_IO}"),
            Self::Other(code) => write!(f, "exit {code}"),
        }
    }
}

/// Map an engine exit to a job result.
///
/// `code` is `None` when the process was killed by a signal. `stderr` is
/// attached to the error for diagnostics.
///
/// # Errors
///
/// - [`JobError::Terminated`] for a signal.
/// - [`JobError::Geometry`] for [`EXIT_GEOMETRY`].
/// - [`JobError::ExternalProcess`] for every other non-zero code.
pub fn check_exit(code: Option<i32>, stderr: String) -> JobResult<()> {
    match code {
        Some(EXIT_OK) => Ok(()),
        None => Err(JobError::Terminated),
        Some(EXIT_GEOMETRY) => Err(JobError::Geometry { stderr }),
        Some(code) => Err(JobError::ExternalProcess {
            failure: EngineFailure::from_code(code),
            stderr,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in [EXIT_USAGE, EXIT_GEOMETRY, EXIT_ASSET_IO, EXIT_FAILURE, 137] {
            assert_eq!(EngineFailure::from_code(code).code(), code);
        }
        assert_eq!(EngineFailure::from_code(EXIT_FAILURE), EngineFailure::Other(1));
    }

    #[test]
    fn exit_mapping() {
        assert!(check_exit(Some(0), String::new()).is_ok());
        assert!(matches!(check_exit(None, String::new()), Err(JobError::Terminated)));
        assert!(matches!(
            check_exit(Some(3), "no armature".into()),
            Err(JobError::Geometry { stderr }) if stderr == "no armature"
        ));
        assert!(matches!(
            check_exit(Some(4), String::new()),
            Err(JobError::ExternalProcess {
                failure: EngineFailure::AssetIo,
                ..
            })
        ));
        assert!(matches!(
            check_exit(Some(1), String::new()),
            Err(JobError::ExternalProcess {
                failure: EngineFailure::Other(1),
                ..
            })
        ));
    }
}
