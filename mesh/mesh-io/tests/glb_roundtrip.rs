//! GLB round trips through the filesystem.
//!
//! Fixtures are built in code and written with `save_glb`, so no binary
//! assets live in the repository.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use approx::assert_relative_eq;
use mesh_io::{IoError, load_glb, read_glb, save_glb, write_glb};
use mesh_rig::{Joint, JointTransform, Skeleton, VertexWeights};
use mesh_scene::{
    AlphaMode, Armature, Image, ImageFormat, Material, MeshObject, SceneContext, Texture,
};
use mesh_types::{IndexedMesh, MeshTopology, Vertex};
use nalgebra::{Matrix4, Point3, Vector3};
use tempfile::tempdir;

fn png_bytes(tag: u8) -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend_from_slice(&[0, 0, 0, 13, tag]);
    data
}

/// A quad standing on the ground, bound to a two-joint spine.
fn rigged_scene() -> SceneContext {
    let mut scene = SceneContext::new();

    let mut skeleton = Skeleton::new(Matrix4::new_translation(&Vector3::new(0.0, 0.0, 0.5)));
    let pelvis = skeleton.add_joint(Joint::new(
        "pelvis",
        None,
        JointTransform::from_translation(Vector3::new(0.0, 1.0, 0.0)),
    ));
    skeleton.add_joint(Joint::new(
        "spine_02",
        Some(pelvis),
        JointTransform::from_translation(Vector3::new(0.0, 0.5, 0.0)),
    ));
    skeleton.bind_at_rest().unwrap();
    let rig = scene.add_armature(Armature::new("Armature", skeleton));

    let mut mesh = IndexedMesh::new();
    for (x, y, u, v) in [
        (-0.5, 0.0, 0.0, 1.0),
        (0.5, 0.0, 1.0, 1.0),
        (0.5, 2.0, 1.0, 0.0),
        (-0.5, 2.0, 0.0, 0.0),
    ] {
        mesh.vertices.push(
            Vertex::with_normal(Point3::new(x, y, 0.5), Vector3::z()).with_uv([u, v]),
        );
    }
    mesh.faces.push([0, 1, 2]);
    mesh.faces.push([0, 2, 3]);

    let weights = vec![
        VertexWeights::single(0),
        VertexWeights::single(0),
        VertexWeights::new([1, 0, 0, 0], [0.75, 0.25, 0.0, 0.0]),
        VertexWeights::single(1),
    ];

    let image = scene.add_image(Image::from_encoded(Some("skin".into()), png_bytes(7)).unwrap());
    let texture = scene.add_texture(Texture {
        name: Some("skin_tex".into()),
        image,
    });
    let mut material = Material::named("Body").with_base_color_texture(texture);
    material.alpha_mode = AlphaMode::Mask;
    material.alpha_cutoff = Some(0.5);
    material.double_sided = true;
    material.roughness_factor = 0.25;
    let material = scene.add_material(material);

    scene.add_mesh(
        MeshObject::new("Body", mesh)
            .with_material(material)
            .with_skin(rig, weights),
    );
    scene
}

#[test]
fn rigged_scene_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rigged.glb");
    let original = rigged_scene();
    save_glb(&original, &path).unwrap();

    let loaded = load_glb(&path).unwrap();
    assert_eq!(loaded.armatures.len(), 1);
    assert_eq!(loaded.meshes.len(), 1);

    let skeleton = &loaded.armatures[0].skeleton;
    assert_eq!(loaded.armatures[0].name, "Armature");
    assert_eq!(skeleton.len(), 2);
    assert_eq!(skeleton.joints()[0].name, "pelvis");
    assert_eq!(skeleton.joints()[1].parent, skeleton.find("pelvis"));
    assert_relative_eq!(skeleton.transform[(2, 3)], 0.5, epsilon = 1e-6);
    for (a, b) in skeleton
        .joints()
        .iter()
        .zip(original.armatures[0].skeleton.joints())
    {
        assert_relative_eq!(a.inverse_bind, b.inverse_bind, epsilon = 1e-6);
        assert_relative_eq!(a.rest.translation, b.rest.translation, epsilon = 1e-6);
    }

    let body = &loaded.meshes[0];
    assert_eq!(body.name, "Body");
    assert_eq!(body.mesh.faces, original.meshes[0].mesh.faces);
    assert!(body.mesh.has_normals());
    assert_eq!(body.mesh.vertices[2].uv(), Some([1.0, 0.0]));
    let skin = body.skin.as_ref().unwrap();
    assert_eq!(skin.armature, 0);
    assert_eq!(skin.weights, original.meshes[0].skin.as_ref().unwrap().weights);
}

#[test]
fn materials_and_images_are_preserved() {
    let bytes = write_glb(&rigged_scene()).unwrap();
    let loaded = read_glb(&bytes).unwrap();

    let material = &loaded.materials[loaded.meshes[0].material.unwrap()];
    assert_eq!(material.name.as_deref(), Some("Body"));
    assert_eq!(material.alpha_mode, AlphaMode::Mask);
    assert_eq!(material.alpha_cutoff, Some(0.5));
    assert!(material.double_sided);
    assert_relative_eq!(material.roughness_factor, 0.25);

    let texture = &loaded.textures[material.base_color_texture.unwrap().texture];
    let image = &loaded.images[texture.image];
    assert_eq!(image.format, ImageFormat::Png);
    assert_eq!(image.data, png_bytes(7));
}

#[test]
fn rest_pose_bake_after_load_matches_bind_geometry() {
    let bytes = write_glb(&rigged_scene()).unwrap();
    let mut loaded = read_glb(&bytes).unwrap();
    let before: Vec<_> = loaded.meshes[0]
        .mesh
        .vertices
        .iter()
        .map(|v| v.position)
        .collect();

    loaded.bake_skins().unwrap();
    for (p, v) in before.iter().zip(&loaded.meshes[0].mesh.vertices) {
        assert_relative_eq!(*p, v.position, epsilon = 1e-5);
    }
}

#[test]
fn baked_scene_exports_without_skins() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("owner").join("static.glb");

    let mut scene = rigged_scene();
    let spine = scene.armatures[0].skeleton.find("spine_02").unwrap();
    scene.armatures[0]
        .skeleton
        .scale_pose(spine, Vector3::new(1.0, 2.0, 1.0));
    scene.bake_skins().unwrap();
    scene.discard_armatures();
    save_glb(&scene, &path).unwrap();

    let loaded = load_glb(&path).unwrap();
    assert!(loaded.armatures.is_empty());
    assert!(loaded.meshes.iter().all(|m| !m.is_skinned()));
    assert_eq!(loaded.meshes[0].mesh.vertex_count(), 4);
    // top vertex sits 0.5 above the spine joint at y = 1.5; doubled to 1.0
    assert_relative_eq!(loaded.meshes[0].mesh.vertices[3].position.y, 2.5, epsilon = 1e-5);

    // no temporary files left next to the output
    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn static_mesh_keeps_node_transform() {
    let mut scene = SceneContext::new();
    let mut mesh = IndexedMesh::new();
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
    mesh.faces.push([0, 1, 2]);
    let mut object = MeshObject::new("hat", mesh);
    object.transform = Matrix4::new_translation(&Vector3::new(0.0, 3.0, 0.0));
    scene.add_mesh(object);

    let loaded = read_glb(&write_glb(&scene).unwrap()).unwrap();
    assert_relative_eq!(loaded.meshes[0].transform[(1, 3)], 3.0, epsilon = 1e-6);
    assert!(!loaded.meshes[0].mesh.has_normals());
    assert!(!loaded.has_armature());
}

#[test]
fn data_uri_images_are_rejected() {
    let json = br#"{
        "asset": { "version": "2.0" },
        "images": [ { "uri": "data:image/png;base64,iVBORw0KGgo=" } ]
    }"#;
    assert!(matches!(
        read_glb(json),
        Err(IoError::UnsupportedImage { index: 0, .. })
    ));
}

#[test]
fn garbage_is_a_gltf_error() {
    assert!(matches!(read_glb(b"not a glb"), Err(IoError::Gltf(_))));
}
