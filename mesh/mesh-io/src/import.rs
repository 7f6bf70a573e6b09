//! Binary glTF import.
//!
//! Every skin becomes an [`Armature`] whose joints follow the skin's joint
//! order, so `JOINTS_0` values index the skeleton directly. Every triangle
//! primitive reachable from the default scene becomes one [`MeshObject`].
//!
//! Images must be stored in a buffer view (the GLB norm) or as a relative
//! file URI next to the asset. Data URIs are rejected.

use std::collections::HashMap;
use std::path::Path;

use gltf::Document;
use gltf::buffer::Data;
use gltf::mesh::Mode;
use mesh_rig::{Joint, JointId, JointTransform, Skeleton, VertexWeights};
use mesh_scene::{
    AlphaMode, Armature, Image, Material, MeshObject, SceneContext, Texture, TextureRef,
};
use mesh_types::{IndexedMesh, Vertex};
use nalgebra::{Matrix4, Vector3};
use tracing::{debug, info, warn};

use crate::error::{IoError, IoResult};

/// Load a scene from a `.glb` file.
///
/// External buffer and image URIs are resolved relative to the file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The content is not valid glTF
/// - An image is stored as a data URI or is neither PNG nor JPEG
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_glb;
///
/// let scene = load_glb("base_models/male.glb").unwrap();
/// println!("{} armatures", scene.armatures.len());
/// ```
pub fn load_glb<P: AsRef<Path>>(path: P) -> IoResult<SceneContext> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| IoError::from_open(e, path))?;
    let scene = read_glb_with_base(&bytes, path.parent())?;

    info!(
        path = %path.display(),
        armatures = scene.armatures.len(),
        meshes = scene.meshes.len(),
        vertices = scene.vertex_count(),
        "Loaded GLB"
    );
    Ok(scene)
}

/// Parse a scene from in-memory GLB (or self-contained glTF JSON) bytes.
///
/// # Errors
///
/// Same as [`load_glb`], except that external URIs cannot be resolved.
pub fn read_glb(bytes: &[u8]) -> IoResult<SceneContext> {
    read_glb_with_base(bytes, None)
}

fn read_glb_with_base(bytes: &[u8], base: Option<&Path>) -> IoResult<SceneContext> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;

    let mut scene = SceneContext::new();
    scene.images = read_images(&document, &buffers, base)?;
    scene.textures = document
        .textures()
        .map(|t| Texture {
            name: t.name().map(str::to_string),
            image: t.source().index(),
        })
        .collect();
    scene.materials = document.materials().map(|m| read_material(&m)).collect();

    let world = NodeWorld::new(&document)?;
    scene.armatures = document
        .skins()
        .map(|skin| read_armature(&skin, &buffers, &world))
        .collect::<IoResult<_>>()?;

    for node in scene_nodes(&document) {
        let Some(mesh) = node.mesh() else { continue };
        let skin = node.skin().map(|s| s.index());
        let base_name = node
            .name()
            .or_else(|| mesh.name())
            .map_or_else(|| format!("mesh_{}", mesh.index()), str::to_string);
        let primitive_count = mesh.primitives().count();

        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                warn!(mesh = %base_name, mode = ?primitive.mode(), "Skipping non-triangle primitive");
                continue;
            }
            let name = if primitive_count > 1 {
                format!("{base_name}.{}", primitive.index())
            } else {
                base_name.clone()
            };
            let mut object = read_primitive(&primitive, &buffers, name, skin)?;
            object.transform = world.matrix(node.index());
            scene.add_mesh(object);
        }
    }

    scene.validate()?;
    Ok(scene)
}

/// Nodes of the default scene (or the first scene, or every node when the
/// document has no scenes), depth first.
fn scene_nodes(document: &Document) -> Vec<gltf::Node<'_>> {
    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        return document.nodes().collect();
    };
    let roots: Vec<gltf::Node<'_>> = scene.nodes().collect();

    let mut out = Vec::new();
    let mut stack: Vec<_> = roots.into_iter().rev().collect();
    let mut seen = vec![false; document.nodes().count()];
    while let Some(node) = stack.pop() {
        if std::mem::replace(&mut seen[node.index()], true) {
            continue;
        }
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
        out.push(node);
    }
    out
}

/// World matrices and parent links for every node in a document.
struct NodeWorld {
    parents: Vec<Option<usize>>,
    world: Vec<Matrix4<f64>>,
}

impl NodeWorld {
    fn new(document: &Document) -> IoResult<Self> {
        let count = document.nodes().count();
        let mut parents = vec![None; count];
        let mut locals = vec![Matrix4::identity(); count];
        for node in document.nodes() {
            locals[node.index()] = Matrix4::<f32>::from(node.transform().matrix()).cast::<f64>();
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
        }

        let mut world: Vec<Option<Matrix4<f64>>> = vec![None; count];
        for start in 0..count {
            let mut chain = Vec::new();
            let mut cursor = Some(start);
            while let Some(index) = cursor {
                if world[index].is_some() {
                    break;
                }
                if chain.contains(&index) {
                    return Err(IoError::invalid_content(format!(
                        "node hierarchy contains a cycle through node {index}"
                    )));
                }
                chain.push(index);
                cursor = parents[index];
            }
            for &index in chain.iter().rev() {
                let parent = parents[index]
                    .and_then(|p| world[p])
                    .unwrap_or_else(Matrix4::identity);
                world[index] = Some(parent * locals[index]);
            }
        }

        Ok(Self {
            parents,
            world: world
                .into_iter()
                .map(|m| m.unwrap_or_else(Matrix4::identity))
                .collect(),
        })
    }

    fn matrix(&self, node: usize) -> Matrix4<f64> {
        self.world.get(node).copied().unwrap_or_else(Matrix4::identity)
    }

    fn parent(&self, node: usize) -> Option<usize> {
        self.parents.get(node).copied().flatten()
    }
}

fn read_armature(skin: &gltf::Skin<'_>, buffers: &[Data], world: &NodeWorld) -> IoResult<Armature> {
    let joints: Vec<gltf::Node<'_>> = skin.joints().collect();
    let slot: HashMap<usize, usize> = joints
        .iter()
        .enumerate()
        .map(|(slot, node)| (node.index(), slot))
        .collect();

    let inverse_binds: Vec<Matrix4<f64>> = skin
        .reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()))
        .read_inverse_bind_matrices()
        .map(|iter| {
            iter.map(|m| Matrix4::<f32>::from(m).cast::<f64>())
                .collect()
        })
        .unwrap_or_default();

    // Root joints hang off the first root's parent node.
    let transform = joints
        .iter()
        .find(|n| world.parent(n.index()).is_none_or(|p| !slot.contains_key(&p)))
        .and_then(|n| world.parent(n.index()))
        .map_or_else(Matrix4::identity, |p| world.matrix(p));

    let mut skeleton = Skeleton::new(transform);
    for (i, node) in joints.iter().enumerate() {
        let (translation, rotation, scale) = node.transform().decomposed();
        let parent = world
            .parent(node.index())
            .and_then(|p| slot.get(&p).copied())
            .map(JointId);
        let name = node
            .name()
            .map_or_else(|| format!("joint_{}", node.index()), str::to_string);
        let joint = Joint::new(name, parent, JointTransform::from_trs(translation, rotation, scale))
            .with_inverse_bind(
                inverse_binds
                    .get(i)
                    .copied()
                    .unwrap_or_else(Matrix4::identity),
            );
        skeleton.add_joint(joint);
    }
    skeleton.validate().map_err(mesh_scene::SceneError::from)?;

    let name = skin
        .name()
        .map_or_else(|| format!("Armature.{:03}", skin.index()), str::to_string);
    debug!(armature = %name, joints = skeleton.len(), "Read skin");
    Ok(Armature::new(name, skeleton))
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[Data],
    name: String,
    skin: Option<usize>,
) -> IoResult<MeshObject> {
    let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| IoError::invalid_content(format!("primitive of {name} has no POSITION")))?
        .collect();
    let count = positions.len();

    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
    let uvs: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|t| t.into_f32().collect());
    check_len(&name, "NORMAL", normals.as_ref().map(Vec::len), count)?;
    check_len(&name, "TEXCOORD_0", uvs.as_ref().map(Vec::len), count)?;

    let mut mesh = IndexedMesh::with_capacity(count, count / 3);
    for (i, p) in positions.iter().enumerate() {
        let mut vertex = Vertex::from(*p);
        vertex.attributes.normal = normals
            .as_ref()
            .map(|n| Vector3::from(n[i].map(f64::from)));
        vertex.attributes.uv = uvs.as_ref().map(|t| t[i]);
        mesh.vertices.push(vertex);
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..u32::try_from(count).map_err(|_| IoError::invalid_content("too many vertices"))?)
            .collect(),
    };
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
        return Err(IoError::invalid_content(format!(
            "primitive of {name} references vertex {bad} of {count}"
        )));
    }
    mesh.faces = indices
        .chunks_exact(3)
        .map(|f| [f[0], f[1], f[2]])
        .collect();

    let mut object = MeshObject::new(name, mesh);
    object.material = primitive.material().index();

    if let Some(armature) = skin {
        let joints = reader.read_joints(0).map(|j| j.into_u16().collect::<Vec<_>>());
        let weights = reader.read_weights(0).map(|w| w.into_f32().collect::<Vec<_>>());
        if let (Some(joints), Some(weights)) = (joints, weights) {
            check_len(&object.name, "JOINTS_0", Some(joints.len()), count)?;
            check_len(&object.name, "WEIGHTS_0", Some(weights.len()), count)?;
            let weights = joints
                .into_iter()
                .zip(weights)
                .map(|(j, w)| VertexWeights::new(j, w))
                .collect();
            object = object.with_skin(armature, weights);
        } else {
            warn!(mesh = %object.name, "Skinned node without JOINTS_0/WEIGHTS_0; treating as static");
        }
    }

    Ok(object)
}

fn check_len(mesh: &str, attribute: &str, len: Option<usize>, expected: usize) -> IoResult<()> {
    match len {
        Some(len) if len != expected => Err(IoError::invalid_content(format!(
            "{mesh}: {attribute} has {len} entries, POSITION has {expected}"
        ))),
        _ => Ok(()),
    }
}

fn read_material(material: &gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let info = |i: gltf::texture::Info<'_>| TextureRef {
        texture: i.texture().index(),
        tex_coord: i.tex_coord(),
    };

    Material {
        name: material.name().map(str::to_string),
        base_color_factor: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(info),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        metallic_roughness_texture: pbr.metallic_roughness_texture().map(info),
        normal_texture: material.normal_texture().map(|n| TextureRef {
            texture: n.texture().index(),
            tex_coord: n.tex_coord(),
        }),
        normal_scale: material.normal_texture().map_or(1.0, |n| n.scale()),
        occlusion_texture: material.occlusion_texture().map(|o| TextureRef {
            texture: o.texture().index(),
            tex_coord: o.tex_coord(),
        }),
        occlusion_strength: material.occlusion_texture().map_or(1.0, |o| o.strength()),
        emissive_texture: material.emissive_texture().map(info),
        emissive_factor: material.emissive_factor(),
        alpha_mode: match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask,
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        },
        alpha_cutoff: material.alpha_cutoff(),
        double_sided: material.double_sided(),
    }
}

fn read_images(document: &Document, buffers: &[Data], base: Option<&Path>) -> IoResult<Vec<Image>> {
    document
        .images()
        .map(|image| {
            let index = image.index();
            let unsupported = |reason: String| IoError::UnsupportedImage { index, reason };

            let data = match image.source() {
                gltf::image::Source::View { view, .. } => {
                    let start = view.offset();
                    buffers
                        .get(view.buffer().index())
                        .and_then(|b| b.0.get(start..start + view.length()))
                        .ok_or_else(|| unsupported("buffer view out of range".to_string()))?
                        .to_vec()
                }
                gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
                    return Err(unsupported("data URIs are not supported".to_string()));
                }
                gltf::image::Source::Uri { uri, .. } => {
                    let base = base.ok_or_else(|| {
                        unsupported(format!("external image {uri} needs a base directory"))
                    })?;
                    let path = base.join(uri);
                    std::fs::read(&path).map_err(|e| IoError::from_open(e, &path))?
                }
            };

            Image::from_encoded(image.name().map(str::to_string), data)
                .ok_or_else(|| unsupported("not a PNG or JPEG image".to_string()))
        })
        .collect()
}
