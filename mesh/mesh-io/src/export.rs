//! Binary glTF export.
//!
//! All geometry, skins and images go into the single binary chunk.
//! Each [`MeshObject`](mesh_scene::MeshObject) becomes one mesh with one
//! triangle primitive on its own root node. Each armature becomes a node
//! hierarchy plus a skin, so rigged scenes survive a round trip.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gltf::binary::{Glb, Header};
use gltf::json::{
    self, Index,
    accessor::{ComponentType, GenericComponentType, Type},
    buffer::Target,
    mesh::{Mode, Semantic},
    validation::{Checked, USize64},
};
use mesh_scene::{AlphaMode, Armature, MeshObject, SceneContext, TextureRef};
use nalgebra::Matrix4;
use tracing::{debug, info, warn};

use crate::error::{IoError, IoResult};

/// Save a scene to a `.glb` file.
///
/// Parent directories are created as needed. The file is written to a
/// temporary sibling first and renamed into place, so a failure never leaves
/// a truncated file at `path`.
///
/// # Errors
///
/// Returns an error if the scene's cross references are invalid or the file
/// cannot be written.
///
/// # Example
///
/// ```no_run
/// use mesh_io::{load_glb, save_glb};
///
/// let scene = load_glb("in.glb").unwrap();
/// save_glb(&scene, "out/copy.glb").unwrap();
/// ```
pub fn save_glb<P: AsRef<Path>>(scene: &SceneContext, path: P) -> IoResult<()> {
    let path = path.as_ref();
    let bytes = write_glb(scene)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_sibling(path);
    let written = fs::write(&temp, &bytes).and_then(|()| fs::rename(&temp, path));
    if let Err(e) = written {
        // best-effort cleanup
        let _ = fs::remove_file(&temp);
        return Err(IoError::Io(e));
    }

    info!(path = %path.display(), bytes = bytes.len(), "Wrote GLB");
    Ok(())
}

/// Serialize a scene to GLB bytes.
///
/// # Errors
///
/// Returns an error if the scene's cross references are invalid or a buffer
/// exceeds the 4 GiB GLB limit.
pub fn write_glb(scene: &SceneContext) -> IoResult<Vec<u8>> {
    scene.validate()?;

    let mut builder = GlbBuilder::default();
    let mut roots = Vec::new();

    for image in &scene.images {
        let view = builder.view(&image.data, None)?;
        push(
            &mut builder.root.images,
            json::Image {
                buffer_view: Some(view),
                mime_type: Some(json::image::MimeType(image.format.mime_type().to_string())),
                name: image.name.clone(),
                uri: None,
                extensions: Default::default(),
                extras: Default::default(),
            },
        );
    }

    for texture in &scene.textures {
        push(
            &mut builder.root.textures,
            json::Texture {
                name: texture.name.clone(),
                sampler: None,
                source: index(texture.image),
                extensions: Default::default(),
                extras: Default::default(),
            },
        );
    }

    builder.root.materials = scene.materials.iter().map(material).collect();

    for armature in &scene.armatures {
        roots.push(builder.armature(armature)?);
    }

    for object in &scene.meshes {
        if let Some(node) = builder.mesh(object)? {
            roots.push(node);
        }
    }

    let scene_index = push(
        &mut builder.root.scenes,
        json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            nodes: roots,
        },
    );
    builder.root.scene = Some(scene_index);

    debug!(
        nodes = builder.root.nodes.len(),
        accessors = builder.root.accessors.len(),
        bin_bytes = builder.bin.len(),
        "Built glTF document"
    );
    builder.finish()
}

/// A sibling path in the same directory, so the final rename stays on one
/// filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "output".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn push<T>(items: &mut Vec<T>, item: T) -> Index<T> {
    items.push(item);
    index(items.len() - 1)
}

fn index<T>(i: usize) -> Index<T> {
    Index::new(u32::try_from(i).unwrap_or(u32::MAX))
}

#[allow(clippy::cast_possible_truncation)]
fn column_major(m: &Matrix4<f64>) -> [f32; 16] {
    let mut out = [0.0_f32; 16];
    for (dst, src) in out.iter_mut().zip(m.as_slice()) {
        *dst = *src as f32;
    }
    out
}

fn le_bytes<const N: usize>(items: &[[f32; N]]) -> Vec<u8> {
    items
        .iter()
        .flat_map(|item| item.iter().flat_map(|v| v.to_le_bytes()))
        .collect()
}

fn texture_info(r: TextureRef) -> json::texture::Info {
    json::texture::Info {
        index: index(r.texture),
        tex_coord: r.tex_coord,
        extensions: Default::default(),
        extras: Default::default(),
    }
}

fn material(m: &mesh_scene::Material) -> json::Material {
    use json::material::{
        AlphaCutoff, EmissiveFactor, NormalTexture, OcclusionTexture, PbrBaseColorFactor,
        PbrMetallicRoughness, StrengthFactor,
    };

    json::Material {
        alpha_cutoff: m.alpha_cutoff.map(AlphaCutoff),
        alpha_mode: Checked::Valid(match m.alpha_mode {
            AlphaMode::Opaque => json::material::AlphaMode::Opaque,
            AlphaMode::Mask => json::material::AlphaMode::Mask,
            AlphaMode::Blend => json::material::AlphaMode::Blend,
        }),
        double_sided: m.double_sided,
        name: m.name.clone(),
        pbr_metallic_roughness: PbrMetallicRoughness {
            base_color_factor: PbrBaseColorFactor(m.base_color_factor),
            base_color_texture: m.base_color_texture.map(texture_info),
            metallic_factor: StrengthFactor(m.metallic_factor),
            roughness_factor: StrengthFactor(m.roughness_factor),
            metallic_roughness_texture: m.metallic_roughness_texture.map(texture_info),
            ..PbrMetallicRoughness::default()
        },
        normal_texture: m.normal_texture.map(|r| NormalTexture {
            index: index(r.texture),
            scale: m.normal_scale,
            tex_coord: r.tex_coord,
            extensions: Default::default(),
            extras: Default::default(),
        }),
        occlusion_texture: m.occlusion_texture.map(|r| OcclusionTexture {
            index: index(r.texture),
            strength: StrengthFactor(m.occlusion_strength),
            tex_coord: r.tex_coord,
            extensions: Default::default(),
            extras: Default::default(),
        }),
        emissive_texture: m.emissive_texture.map(texture_info),
        emissive_factor: EmissiveFactor(m.emissive_factor),
        ..json::Material::default()
    }
}

#[derive(Default)]
struct GlbBuilder {
    root: json::Root,
    bin: Vec<u8>,
}

impl GlbBuilder {
    /// Append bytes to the binary chunk as a new 4-byte aligned view.
    fn view(&mut self, bytes: &[u8], target: Option<Target>) -> IoResult<Index<json::buffer::View>> {
        self.bin.resize(self.bin.len().next_multiple_of(4), 0);
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        if u32::try_from(self.bin.len()).is_err() {
            return Err(IoError::invalid_content("binary chunk exceeds 4 GiB"));
        }

        Ok(push(
            &mut self.root.buffer_views,
            json::buffer::View {
                buffer: Index::new(0),
                byte_length: USize64::from(bytes.len()),
                byte_offset: Some(USize64::from(offset)),
                byte_stride: None,
                name: None,
                target: target.map(Checked::Valid),
                extensions: Default::default(),
                extras: Default::default(),
            },
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn accessor(
        &mut self,
        bytes: &[u8],
        target: Option<Target>,
        count: usize,
        component: ComponentType,
        type_: Type,
        bounds: Option<([f32; 3], [f32; 3])>,
    ) -> IoResult<Index<json::Accessor>> {
        let view = self.view(bytes, target)?;
        let (min, max) = bounds.map_or((None, None), |(lo, hi)| {
            (
                Some(json::Value::from(lo.to_vec())),
                Some(json::Value::from(hi.to_vec())),
            )
        });

        Ok(push(
            &mut self.root.accessors,
            json::Accessor {
                buffer_view: Some(view),
                byte_offset: None,
                count: USize64::from(count),
                component_type: Checked::Valid(GenericComponentType(component)),
                extensions: Default::default(),
                extras: Default::default(),
                type_: Checked::Valid(type_),
                min,
                max,
                name: None,
                normalized: false,
                sparse: None,
            },
        ))
    }

    /// Emit joint nodes, an armature node above the roots, and a skin.
    /// Returns the armature node.
    fn armature(&mut self, armature: &Armature) -> IoResult<Index<json::Node>> {
        let skeleton = &armature.skeleton;
        let first = self.root.nodes.len();

        for joint in skeleton.joints() {
            let rest = &joint.rest;
            #[allow(clippy::cast_possible_truncation)]
            let vec3 = |v: &nalgebra::Vector3<f64>| [v.x as f32, v.y as f32, v.z as f32];
            self.root.nodes.push(json::Node {
                name: Some(joint.name.clone()),
                translation: Some(vec3(&rest.translation)),
                rotation: Some(json::scene::UnitQuaternion(rest.rotation_xyzw())),
                scale: Some(vec3(&rest.scale)),
                ..json::Node::default()
            });
        }

        let mut roots = Vec::new();
        for (i, joint) in skeleton.joints().iter().enumerate() {
            let node: Index<json::Node> = index(first + i);
            match joint.parent {
                Some(parent) => self.root.nodes[first + parent.index()]
                    .children
                    .get_or_insert_with(Vec::new)
                    .push(node),
                None => roots.push(node),
            }
        }

        let matrix = (skeleton.transform != Matrix4::identity())
            .then(|| column_major(&skeleton.transform));
        let armature_node = push(
            &mut self.root.nodes,
            json::Node {
                name: Some(armature.name.clone()),
                matrix,
                children: Some(roots),
                ..json::Node::default()
            },
        );

        let inverse_binds: Vec<[f32; 16]> = skeleton
            .joints()
            .iter()
            .map(|j| column_major(&j.inverse_bind))
            .collect();
        let inverse_bind_matrices = if inverse_binds.is_empty() {
            None
        } else {
            Some(self.accessor(
                &le_bytes(&inverse_binds),
                None,
                inverse_binds.len(),
                ComponentType::F32,
                Type::Mat4,
                None,
            )?)
        };

        push(
            &mut self.root.skins,
            json::Skin {
                extensions: Default::default(),
                extras: Default::default(),
                inverse_bind_matrices,
                joints: (first..first + skeleton.len()).map(index).collect(),
                name: Some(armature.name.clone()),
                skeleton: None,
            },
        );

        Ok(armature_node)
    }

    /// Emit one mesh with a single primitive and a node for it.
    #[allow(clippy::cast_possible_truncation)]
    fn mesh(&mut self, object: &MeshObject) -> IoResult<Option<Index<json::Node>>> {
        let mesh = &object.mesh;
        if mesh.vertices.is_empty() || mesh.faces.is_empty() {
            warn!(mesh = %object.name, "Skipping empty mesh");
            return Ok(None);
        }

        let count = mesh.vertices.len();
        let positions: Vec<[f32; 3]> = mesh
            .vertices
            .iter()
            .map(|v| [v.position.x as f32, v.position.y as f32, v.position.z as f32])
            .collect();
        let bounds = mesh.bounds();
        let lo: [f32; 3] = bounds.min.coords.map(|c| c as f32).into();
        let hi: [f32; 3] = bounds.max.coords.map(|c| c as f32).into();

        let mut attributes = BTreeMap::new();
        let position = self.accessor(
            &le_bytes(&positions),
            Some(Target::ArrayBuffer),
            count,
            ComponentType::F32,
            Type::Vec3,
            Some((lo, hi)),
        )?;
        attributes.insert(Checked::Valid(Semantic::Positions), position);

        if mesh.has_normals() {
            let normals: Vec<[f32; 3]> = mesh
                .vertices
                .iter()
                .map(|v| {
                    let n = v.attributes.normal.unwrap_or_else(nalgebra::Vector3::y);
                    [n.x as f32, n.y as f32, n.z as f32]
                })
                .collect();
            let accessor = self.accessor(
                &le_bytes(&normals),
                Some(Target::ArrayBuffer),
                count,
                ComponentType::F32,
                Type::Vec3,
                None,
            )?;
            attributes.insert(Checked::Valid(Semantic::Normals), accessor);
        }

        if mesh.has_uvs() {
            let uvs: Vec<[f32; 2]> = mesh
                .vertices
                .iter()
                .map(|v| v.attributes.uv.unwrap_or_default())
                .collect();
            let accessor = self.accessor(
                &le_bytes(&uvs),
                Some(Target::ArrayBuffer),
                count,
                ComponentType::F32,
                Type::Vec2,
                None,
            )?;
            attributes.insert(Checked::Valid(Semantic::TexCoords(0)), accessor);
        }

        if let Some(skin) = &object.skin {
            let joints: Vec<u8> = skin
                .weights
                .iter()
                .flat_map(|w| w.joints.iter().flat_map(|j| j.to_le_bytes()))
                .collect();
            let weights: Vec<[f32; 4]> = skin.weights.iter().map(|w| w.weights).collect();

            let accessor = self.accessor(
                &joints,
                Some(Target::ArrayBuffer),
                count,
                ComponentType::U16,
                Type::Vec4,
                None,
            )?;
            attributes.insert(Checked::Valid(Semantic::Joints(0)), accessor);
            let accessor = self.accessor(
                &le_bytes(&weights),
                Some(Target::ArrayBuffer),
                count,
                ComponentType::F32,
                Type::Vec4,
                None,
            )?;
            attributes.insert(Checked::Valid(Semantic::Weights(0)), accessor);
        }

        let indices: Vec<u8> = mesh
            .faces
            .iter()
            .flat_map(|f| f.iter().flat_map(|i| i.to_le_bytes()))
            .collect();
        let indices = self.accessor(
            &indices,
            Some(Target::ElementArrayBuffer),
            mesh.faces.len() * 3,
            ComponentType::U32,
            Type::Scalar,
            None,
        )?;

        let mesh_index = push(
            &mut self.root.meshes,
            json::Mesh {
                extensions: Default::default(),
                extras: Default::default(),
                name: Some(object.name.clone()),
                primitives: vec![json::mesh::Primitive {
                    attributes,
                    extensions: Default::default(),
                    extras: Default::default(),
                    indices: Some(indices),
                    material: object.material.map(index),
                    mode: Checked::Valid(Mode::Triangles),
                    targets: None,
                }],
                weights: None,
            },
        );

        let matrix =
            (object.transform != Matrix4::identity()).then(|| column_major(&object.transform));
        Ok(Some(push(
            &mut self.root.nodes,
            json::Node {
                name: Some(object.name.clone()),
                mesh: Some(mesh_index),
                skin: object.skin.as_ref().map(|s| index(s.armature)),
                matrix,
                ..json::Node::default()
            },
        )))
    }

    fn finish(mut self) -> IoResult<Vec<u8>> {
        self.bin.resize(self.bin.len().next_multiple_of(4), 0);
        if !self.bin.is_empty() {
            self.root.buffers.push(json::Buffer {
                byte_length: USize64::from(self.bin.len()),
                name: None,
                uri: None,
                extensions: Default::default(),
                extras: Default::default(),
            });
        }
        self.root.asset.generator = Some(format!("mesh-io {}", env!("CARGO_PKG_VERSION")));

        let json = serde_json::to_vec(&self.root)?;
        let length = 12 + 8 + json.len().next_multiple_of(4)
            + if self.bin.is_empty() { 0 } else { 8 + self.bin.len() };
        let length = u32::try_from(length)
            .map_err(|_| IoError::invalid_content("GLB exceeds 4 GiB"))?;

        let glb = Glb {
            header: Header {
                magic: *b"glTF",
                version: 2,
                length,
            },
            json: Cow::Owned(json),
            bin: (!self.bin.is_empty()).then_some(Cow::Owned(self.bin)),
        };
        Ok(glb.to_vec()?)
    }
}
