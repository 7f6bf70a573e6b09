//! Error types for body scaling.

use std::path::PathBuf;

use mesh_io::IoError;
use mesh_scene::SceneError;
use thiserror::Error;

/// Result type for body scaling.
pub type ScaleResult<T> = Result<T, ScaleError>;

/// Fatal errors: no output file is produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScaleError {
    /// The base mesh has no skeleton to pose.
    #[error("no armature found in {origin}")]
    Geometry {
        /// Where the scene came from, for the message.
        origin: String,
    },

    /// A body measurement is not a positive finite number.
    #[error("{name} must be a positive number, got {value}")]
    InvalidMeasurement {
        /// Which measurement (`"height"` or `"weight"`).
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Reading the base mesh or writing the output failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// The loaded scene could not be posed or baked.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Why a replacement texture was not applied. Never fatal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TextureLoadError {
    /// The path does not exist.
    #[error("texture not found: {path}")]
    NotFound {
        /// The requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read texture {path}: {source}")]
    Read {
        /// The requested path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is neither PNG nor JPEG.
    #[error("texture {path} is not a PNG or JPEG image")]
    UnsupportedFormat {
        /// The requested path.
        path: PathBuf,
    },
}
