//! Replacement textures.

use std::path::Path;

use mesh_scene::{Image, SceneContext};
use tracing::{info, warn};

use crate::TextureLoadError;

/// Read an encoded PNG or JPEG image from disk.
///
/// # Errors
///
/// Returns a [`TextureLoadError`] if the file is missing, unreadable, or not
/// a supported image.
pub fn load_texture(path: &Path) -> Result<Image, TextureLoadError> {
    let data = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            TextureLoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            TextureLoadError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    Image::from_encoded(name, data).ok_or_else(|| TextureLoadError::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

/// Bind the image at `path` to every texture any material uses.
///
/// Failures are logged and leave the scene unchanged. Returns the number of
/// textures rebound.
pub fn substitute_texture(scene: &mut SceneContext, path: &Path) -> usize {
    match load_texture(path) {
        Ok(image) => {
            let rebound = scene.replace_material_images(image);
            info!(path = %path.display(), textures = rebound, "Substituted texture");
            rebound
        }
        Err(TextureLoadError::NotFound { .. }) => {
            info!(path = %path.display(), "Texture not found; keeping original materials");
            0
        }
        Err(e) => {
            warn!(error = %e, "Texture load failed; keeping original materials");
            0
        }
    }
}
