//! Error types for scene I/O operations.

use std::path::PathBuf;

use mesh_scene::SceneError;
use thiserror::Error;

/// Result type for scene I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur during scene I/O operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Invalid file content.
    #[error("invalid file content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// An image is stored in a way this crate cannot embed.
    #[error("image {index} is unsupported: {reason}")]
    UnsupportedImage {
        /// Image index in the source document.
        index: usize,
        /// Why it was rejected.
        reason: String,
    },

    /// The glTF document could not be parsed or written.
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    /// JSON serialization of the glTF document failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The scene is internally inconsistent.
    #[error("invalid scene: {0}")]
    Scene(#[from] SceneError),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    /// Create an `InvalidContent` error with the given message.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }

    /// Map an `open`/`read` failure, turning `NotFound` into [`IoError::FileNotFound`].
    pub(crate) fn from_open(error: std::io::Error, path: &std::path::Path) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(error)
        }
    }
}
