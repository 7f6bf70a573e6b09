//! The scene context and its objects.

use std::collections::BTreeSet;

use mesh_rig::{Skeleton, VertexWeights, skin_mesh};
use mesh_types::{IndexedMesh, MeshTopology};
use nalgebra::Matrix4;
use tracing::{debug, info};

use crate::{Image, Material, SceneError, SceneResult, Texture};

/// A named skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Armature {
    /// Armature name (the skin's or the root node's).
    pub name: String,
    /// The joint hierarchy.
    pub skeleton: Skeleton,
}

impl Armature {
    /// Create an armature.
    #[must_use]
    pub fn new(name: impl Into<String>, skeleton: Skeleton) -> Self {
        Self {
            name: name.into(),
            skeleton,
        }
    }
}

/// Binding of a mesh object to an armature.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinBinding {
    /// Index into [`SceneContext::armatures`].
    pub armature: usize,
    /// One entry per mesh vertex.
    pub weights: Vec<VertexWeights>,
}

/// One drawable triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshObject {
    /// Object name.
    pub name: String,
    /// Geometry. Skinned meshes are in bind space.
    pub mesh: IndexedMesh,
    /// World transform. Ignored for skinned vertices, applied to unweighted ones.
    pub transform: Matrix4<f64>,
    /// Index into [`SceneContext::materials`].
    pub material: Option<usize>,
    /// Skeleton binding, if the mesh is rigged.
    pub skin: Option<SkinBinding>,
}

impl MeshObject {
    /// A static mesh with an identity transform.
    #[must_use]
    pub fn new(name: impl Into<String>, mesh: IndexedMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform: Matrix4::identity(),
            material: None,
            skin: None,
        }
    }

    /// Assign a material.
    #[must_use]
    pub const fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    /// Bind to an armature.
    #[must_use]
    pub fn with_skin(mut self, armature: usize, weights: Vec<VertexWeights>) -> Self {
        self.skin = Some(SkinBinding { armature, weights });
        self
    }

    /// Whether the mesh is bound to an armature.
    #[must_use]
    pub const fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }
}

/// Statistics from [`SceneContext::bake_skins`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BakeReport {
    /// Mesh objects whose pose was baked.
    pub meshes_baked: usize,
    /// Total vertices transformed.
    pub vertices: usize,
    /// Vertices with no joint influence.
    pub unweighted_vertices: usize,
    /// Largest displacement of any vertex from its unposed placement.
    pub max_displacement: f64,
}

/// Everything loaded from one asset, owned by one job.
///
/// All cross references are plain indices into the vectors below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneContext {
    /// Skeletons.
    pub armatures: Vec<Armature>,
    /// Drawable meshes.
    pub meshes: Vec<MeshObject>,
    /// Materials referenced by meshes.
    pub materials: Vec<Material>,
    /// Textures referenced by materials.
    pub textures: Vec<Texture>,
    /// Encoded images referenced by textures.
    pub images: Vec<Image>,
}

impl SceneContext {
    /// An empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an armature, returning its index.
    pub fn add_armature(&mut self, armature: Armature) -> usize {
        self.armatures.push(armature);
        self.armatures.len() - 1
    }

    /// Add a mesh object, returning its index.
    pub fn add_mesh(&mut self, mesh: MeshObject) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Add a material, returning its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add a texture, returning its index.
    pub fn add_texture(&mut self, texture: Texture) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    /// Add an image, returning its index.
    pub fn add_image(&mut self, image: Image) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    /// Whether the scene has at least one armature.
    #[must_use]
    pub fn has_armature(&self) -> bool {
        !self.armatures.is_empty()
    }

    /// Indices of meshes bound to `armature`.
    pub fn bound_meshes(&self, armature: usize) -> impl Iterator<Item = usize> + '_ {
        self.meshes
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.skin.as_ref().is_some_and(|s| s.armature == armature))
            .map(|(i, _)| i)
    }

    /// Total vertex count across all mesh objects.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.vertex_count()).sum()
    }

    /// Total triangle count across all mesh objects.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.face_count()).sum()
    }

    /// Textures referenced by any material slot, in index order.
    #[must_use]
    pub fn referenced_textures(&self) -> BTreeSet<usize> {
        self.materials
            .iter()
            .flat_map(Material::texture_slots)
            .map(|(_, r)| r.texture)
            .collect()
    }

    /// Check every cross reference and skeleton hierarchy.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> SceneResult<()> {
        for armature in &self.armatures {
            armature.skeleton.validate()?;
        }

        for mesh in &self.meshes {
            if let Some(skin) = mesh.skin.as_ref().filter(|s| s.armature >= self.armatures.len()) {
                return Err(SceneError::MissingArmature {
                    mesh: mesh.name.clone(),
                    armature: skin.armature,
                    count: self.armatures.len(),
                });
            }
            if let Some(material) = mesh.material.filter(|&m| m >= self.materials.len()) {
                return Err(SceneError::MissingMaterial {
                    mesh: mesh.name.clone(),
                    material,
                    count: self.materials.len(),
                });
            }
        }

        if let Some(&index) = self
            .referenced_textures()
            .iter()
            .find(|&&t| t >= self.textures.len())
        {
            return Err(SceneError::DanglingReference {
                kind: "texture",
                index,
                count: self.textures.len(),
            });
        }

        if let Some(texture) = self.textures.iter().find(|t| t.image >= self.images.len()) {
            return Err(SceneError::DanglingReference {
                kind: "image",
                index: texture.image,
                count: self.images.len(),
            });
        }

        Ok(())
    }

    /// Point every texture used by a material at `image`.
    ///
    /// The image is added to the scene only if at least one texture is
    /// rebound. Images left unreferenced are pruned. Returns the number of
    /// textures rebound.
    pub fn replace_material_images(&mut self, image: Image) -> usize {
        let targets: Vec<usize> = self
            .referenced_textures()
            .into_iter()
            .filter(|&t| t < self.textures.len())
            .collect();
        if targets.is_empty() {
            debug!("No material textures to replace");
            return 0;
        }

        let index = self.add_image(image);
        for &t in &targets {
            self.textures[t].image = index;
        }
        let pruned = self.prune_images();
        debug!(textures = targets.len(), pruned, "Replaced material images");
        targets.len()
    }

    /// Remove images no texture references, remapping texture indices.
    ///
    /// Returns the number of images removed.
    pub fn prune_images(&mut self) -> usize {
        let used: BTreeSet<usize> = self.textures.iter().map(|t| t.image).collect();
        let mut remap = vec![None; self.images.len()];
        let mut kept = Vec::with_capacity(used.len());

        for (old, image) in std::mem::take(&mut self.images).into_iter().enumerate() {
            if used.contains(&old) {
                remap[old] = Some(kept.len());
                kept.push(image);
            }
        }

        let removed = remap.len() - kept.len();
        self.images = kept;
        for texture in &mut self.textures {
            if let Some(Some(new)) = remap.get(texture.image) {
                texture.image = *new;
            }
        }
        removed
    }

    /// Apply every armature's current pose to its bound meshes permanently.
    ///
    /// Baked meshes end up in world space with an identity transform and no
    /// skin binding. Armatures are left in place; see
    /// [`SceneContext::discard_armatures`].
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MissingArmature`] for a dangling binding,
    /// [`SceneError::Rig`] for a malformed skeleton, or [`SceneError::Skin`]
    /// if weights do not match the mesh or skeleton.
    pub fn bake_skins(&mut self) -> SceneResult<BakeReport> {
        let matrices = self
            .armatures
            .iter()
            .map(|a| a.skeleton.skinning_matrices())
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = BakeReport::default();
        for object in &mut self.meshes {
            let Some(skin) = &object.skin else {
                continue;
            };
            let joint_matrices =
                matrices
                    .get(skin.armature)
                    .ok_or_else(|| SceneError::MissingArmature {
                        mesh: object.name.clone(),
                        armature: skin.armature,
                        count: matrices.len(),
                    })?;

            let out = skin_mesh(&object.mesh, &skin.weights, joint_matrices, &object.transform)
                .map_err(|source| SceneError::Skin {
                    mesh: object.name.clone(),
                    source,
                })?;

            report.meshes_baked += 1;
            report.vertices += out.mesh.vertex_count();
            report.unweighted_vertices += out.unweighted_vertices;
            report.max_displacement = report.max_displacement.max(out.max_displacement);

            object.mesh = out.mesh;
            object.transform = Matrix4::identity();
            object.skin = None;
        }

        info!(
            meshes = report.meshes_baked,
            vertices = report.vertices,
            max_displacement = report.max_displacement,
            "Baked skinned meshes"
        );
        Ok(report)
    }

    /// Detach every mesh from its armature and remove all armatures.
    ///
    /// Meshes still bound at this point keep their bind-space geometry.
    /// Returns the number of armatures removed.
    pub fn discard_armatures(&mut self) -> usize {
        for object in &mut self.meshes {
            object.skin = None;
        }
        let removed = self.armatures.len();
        self.armatures.clear();
        debug!(removed, "Discarded armatures");
        removed
    }
}
