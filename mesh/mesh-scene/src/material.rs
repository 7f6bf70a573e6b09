//! Materials, textures and images.

/// Reference from a material slot to a scene texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRef {
    /// Index into [`crate::SceneContext::textures`].
    pub texture: usize,
    /// Which UV set the slot samples.
    pub tex_coord: u32,
}

impl TextureRef {
    /// Reference a texture through UV set 0.
    #[must_use]
    pub const fn new(texture: usize) -> Self {
        Self {
            texture,
            tex_coord: 0,
        }
    }
}

/// The role a texture plays within a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    /// Base color (albedo).
    BaseColor,
    /// Packed metallic (B) and roughness (G).
    MetallicRoughness,
    /// Tangent-space normal map.
    Normal,
    /// Ambient occlusion (R).
    Occlusion,
    /// Emission color.
    Emissive,
}

/// How alpha is interpreted when rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlphaMode {
    /// Alpha ignored.
    #[default]
    Opaque,
    /// Alpha thresholded by the material's cutoff.
    Mask,
    /// Alpha blended.
    Blend,
}

/// A metallic-roughness PBR material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name.
    pub name: Option<String>,
    /// Linear RGBA base color multiplier.
    pub base_color_factor: [f32; 4],
    /// Base color texture.
    pub base_color_texture: Option<TextureRef>,
    /// Metalness multiplier.
    pub metallic_factor: f32,
    /// Roughness multiplier.
    pub roughness_factor: f32,
    /// Metallic-roughness texture.
    pub metallic_roughness_texture: Option<TextureRef>,
    /// Normal map.
    pub normal_texture: Option<TextureRef>,
    /// Normal map strength.
    pub normal_scale: f32,
    /// Occlusion map.
    pub occlusion_texture: Option<TextureRef>,
    /// Occlusion strength.
    pub occlusion_strength: f32,
    /// Emissive map.
    pub emissive_texture: Option<TextureRef>,
    /// Linear RGB emission multiplier.
    pub emissive_factor: [f32; 3],
    /// Alpha interpretation.
    pub alpha_mode: AlphaMode,
    /// Cutoff used with [`AlphaMode::Mask`].
    pub alpha_cutoff: Option<f32>,
    /// Disable back-face culling.
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: [1.0; 4],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
            normal_texture: None,
            normal_scale: 1.0,
            occlusion_texture: None,
            occlusion_strength: 1.0,
            emissive_texture: None,
            emissive_factor: [0.0; 3],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: None,
            double_sided: false,
        }
    }
}

impl Material {
    /// Create a default material with a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the base color texture.
    #[must_use]
    pub const fn with_base_color_texture(mut self, texture: usize) -> Self {
        self.base_color_texture = Some(TextureRef::new(texture));
        self
    }

    /// Every texture slot in use, with its role.
    #[must_use]
    pub fn texture_slots(&self) -> Vec<(TextureRole, TextureRef)> {
        [
            (TextureRole::BaseColor, self.base_color_texture),
            (TextureRole::MetallicRoughness, self.metallic_roughness_texture),
            (TextureRole::Normal, self.normal_texture),
            (TextureRole::Occlusion, self.occlusion_texture),
            (TextureRole::Emissive, self.emissive_texture),
        ]
        .into_iter()
        .filter_map(|(role, slot)| slot.map(|r| (role, r)))
        .collect()
    }
}

/// A texture: an image plus sampling (sampling state is not modeled).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Texture name.
    pub name: Option<String>,
    /// Index into [`crate::SceneContext::images`].
    pub image: usize,
}

/// Encoded image formats a scene can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
}

impl ImageFormat {
    /// Identify the format from the leading bytes of encoded data.
    ///
    /// ```
    /// use mesh_scene::ImageFormat;
    ///
    /// assert_eq!(ImageFormat::sniff(b"\x89PNG\r\n\x1a\n...."), Some(ImageFormat::Png));
    /// assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
    /// ```
    #[must_use]
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    /// Parse a MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// MIME type as written to glTF.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Encoded image data held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Image name.
    pub name: Option<String>,
    /// Encoding of `data`.
    pub format: ImageFormat,
    /// Encoded bytes, embedded verbatim on export.
    pub data: Vec<u8>,
}

impl Image {
    /// Wrap encoded bytes, detecting the format from their signature.
    ///
    /// Returns `None` if the bytes are neither PNG nor JPEG.
    #[must_use]
    pub fn from_encoded(name: Option<String>, data: Vec<u8>) -> Option<Self> {
        ImageFormat::sniff(&data).map(|format| Self { name, format, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_slots_lists_only_used_slots() {
        let mut m = Material::named("skin").with_base_color_texture(2);
        m.normal_texture = Some(TextureRef {
            texture: 5,
            tex_coord: 1,
        });

        let slots = m.texture_slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0], (TextureRole::BaseColor, TextureRef::new(2)));
        assert_eq!(slots[1].0, TextureRole::Normal);
        assert_eq!(slots[1].1.tex_coord, 1);
    }

    #[test]
    fn sniff_jpeg_and_reject_short_data() {
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(&[0x89]), None);
        assert!(Image::from_encoded(None, b"not an image".to_vec()).is_none());
    }

    #[test]
    fn mime_round_trip() {
        for format in [ImageFormat::Png, ImageFormat::Jpeg] {
            assert_eq!(ImageFormat::from_mime(format.mime_type()), Some(format));
        }
        assert_eq!(ImageFormat::from_mime("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime("image/webp"), None);
    }
}
