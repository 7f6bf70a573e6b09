//! Scaling base meshes written to disk.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use body_scale::{ScaleError, ScaleParams, scale_file};
use mesh_io::{load_glb, save_glb};
use mesh_rig::{Joint, JointTransform, Skeleton, VertexWeights};
use mesh_scene::{Armature, Image, ImageFormat, Material, MeshObject, SceneContext, Texture};
use mesh_types::{IndexedMesh, Vertex};
use nalgebra::{Matrix4, Point3, Vector3};
use tempfile::{TempDir, tempdir};

const PELVIS_VERTEX: usize = 0;
const SPINE_VERTEX: usize = 1;
const BELLY_VERTEX: usize = 2;
const CALF_VERTEX: usize = 3;

fn png_bytes() -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend_from_slice(&[0, 0, 0, 13, 1]);
    data
}

fn translated(name: &str, parent: Option<usize>, offset: [f64; 3]) -> Joint {
    Joint::new(
        name,
        parent.map(mesh_rig::JointId),
        JointTransform::from_translation(Vector3::from(offset)),
    )
}

/// Pelvis at y = 1 with two spine bones above and two legs below.
fn humanoid(with_torso: bool) -> Skeleton {
    let mut skeleton = Skeleton::new(Matrix4::identity());
    skeleton.add_joint(translated("pelvis", None, [0.0, 1.0, 0.0]));
    if with_torso {
        skeleton.add_joint(translated("spine_02", Some(0), [0.0, 0.2, 0.0]));
        skeleton.add_joint(translated("spine_03", Some(1), [0.0, 0.2, 0.0]));
        skeleton.add_joint(translated("thigh_l", Some(0), [0.1, 0.0, 0.0]));
        skeleton.add_joint(translated("calf_l", Some(3), [0.0, -0.5, 0.0]));
        skeleton.add_joint(translated("thigh_r", Some(0), [-0.1, 0.0, 0.0]));
        skeleton.add_joint(translated("calf_r", Some(5), [0.0, -0.5, 0.0]));
    }
    skeleton.bind_at_rest().unwrap();
    skeleton
}

fn body_mesh() -> IndexedMesh {
    let mut mesh = IndexedMesh::new();
    for p in [
        [0.1, 1.0, 0.05],
        [0.0, 1.5, 0.0],
        [0.2, 1.5, 0.1],
        [0.1, 0.3, 0.0],
    ] {
        mesh.vertices
            .push(Vertex::with_normal(Point3::from(p), Vector3::z()));
    }
    mesh.faces.push([0, 1, 2]);
    mesh.faces.push([0, 2, 3]);
    mesh
}

fn textured(scene: &mut SceneContext) -> usize {
    let image = scene.add_image(Image::from_encoded(Some("skin".into()), png_bytes()).unwrap());
    let texture = scene.add_texture(Texture {
        name: Some("skin".into()),
        image,
    });
    scene.add_material(Material::named("Body").with_base_color_texture(texture))
}

fn rigged_scene() -> SceneContext {
    let mut scene = SceneContext::new();
    let rig = scene.add_armature(Armature::new("Armature", humanoid(true)));
    let material = textured(&mut scene);
    let weights = vec![
        VertexWeights::single(0),
        VertexWeights::single(2),
        VertexWeights::single(2),
        VertexWeights::single(4),
    ];
    scene.add_mesh(
        MeshObject::new("Body", body_mesh())
            .with_material(material)
            .with_skin(rig, weights),
    );
    scene
}

struct Fixture {
    dir: TempDir,
    base: PathBuf,
}

impl Fixture {
    fn new(scene: &SceneContext) -> Self {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base_models").join("male.glb");
        save_glb(scene, &base).unwrap();
        Self { dir, base }
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("generated").join("bob").join("out.glb")
    }
}

fn position(scene: &SceneContext, vertex: usize) -> Point3<f64> {
    scene.meshes[0].mesh.vertices[vertex].position
}

#[test]
fn reference_body_only_widens_belly() {
    let fixture = Fixture::new(&rigged_scene());
    let out = scale_file(&fixture.base, &fixture.output(), &ScaleParams::new(170.0, 60.0)).unwrap();
    let scene = load_glb(&out.path).unwrap();

    assert_relative_eq!(position(&scene, PELVIS_VERTEX), Point3::new(0.1, 1.0, 0.05), epsilon = 1e-5);
    assert_relative_eq!(position(&scene, SPINE_VERTEX), Point3::new(0.0, 1.5, 0.0), epsilon = 1e-5);
    assert_relative_eq!(position(&scene, CALF_VERTEX), Point3::new(0.1, 0.3, 0.0), epsilon = 1e-5);
    assert_relative_eq!(
        position(&scene, BELLY_VERTEX),
        Point3::new(0.2 * 1.15, 1.5, 0.1 * 1.25),
        epsilon = 1e-5
    );
}

#[test]
fn tall_heavy_body_grows_torso_and_hips() {
    let fixture = Fixture::new(&rigged_scene());
    let out = scale_file(&fixture.base, &fixture.output(), &ScaleParams::new(180.0, 90.0)).unwrap();
    let scene = load_glb(&out.path).unwrap();

    let b = out.report.factors.bmi_scale;
    let s = out.report.factors.spine_length();
    assert!(b > 1.0 && s > 1.0);

    assert_relative_eq!(
        position(&scene, PELVIS_VERTEX),
        Point3::new(0.1 * b, 1.0, 0.05 * b),
        epsilon = 1e-5
    );
    // spine_03 sits 0.2 above spine_02, which sits 0.2 above the pelvis;
    // both bones are stretched by s along their length
    let y = 1.2 + 0.2 * s + 0.1 * s * s;
    assert_relative_eq!(position(&scene, SPINE_VERTEX), Point3::new(0.0, y, 0.0), epsilon = 1e-5);
    assert!(position(&scene, BELLY_VERTEX).x > 0.2 * 1.15);
}

#[test]
fn output_has_no_skeleton() {
    let fixture = Fixture::new(&rigged_scene());
    let out = scale_file(&fixture.base, &fixture.output(), &ScaleParams::new(165.0, 70.0)).unwrap();

    assert_eq!(out.report.armatures_removed, 1);
    assert_eq!(out.report.meshes_baked, 1);
    assert_eq!(out.report.joints_scaled.len(), 7);
    assert!(out.report.joints_skipped.is_empty());

    let scene = load_glb(&out.path).unwrap();
    assert!(scene.armatures.is_empty());
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.vertex_count(), 4);
    assert!(!scene.meshes[0].is_skinned());
}

#[test]
fn missing_joints_are_skipped() {
    let mut scene = SceneContext::new();
    let rig = scene.add_armature(Armature::new("Armature", humanoid(false)));
    scene.add_mesh(MeshObject::new("Body", body_mesh()).with_skin(rig, vec![VertexWeights::single(0); 4]));
    let fixture = Fixture::new(&scene);

    let out = scale_file(&fixture.base, &fixture.output(), &ScaleParams::new(180.0, 90.0)).unwrap();
    assert_eq!(out.report.joints_scaled, vec!["pelvis".to_string()]);
    assert_eq!(out.report.joints_skipped.len(), 6);
    assert!(out.report.joints_skipped.contains(&"spine_03".to_string()));
    assert!(out.path.exists());
}

#[test]
fn scene_without_armature_fails_without_output() {
    let mut scene = SceneContext::new();
    scene.add_mesh(MeshObject::new("Prop", body_mesh()));
    let fixture = Fixture::new(&scene);
    let output = fixture.output();

    let err = scale_file(&fixture.base, &output, &ScaleParams::new(170.0, 60.0)).unwrap_err();
    assert!(matches!(err, ScaleError::Geometry { .. }));
    assert!(!output.exists());
}

#[test]
fn bad_measurement_fails_before_loading() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.glb");
    let err = scale_file(
        Path::new("/no/such/base.glb"),
        &output,
        &ScaleParams::new(0.0, 60.0),
    )
    .unwrap_err();

    assert!(matches!(err, ScaleError::InvalidMeasurement { name: "height", .. }));
    assert!(!output.exists());
}

#[test]
fn missing_base_mesh_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = scale_file(
        &dir.path().join("missing.glb"),
        &dir.path().join("out.glb"),
        &ScaleParams::new(170.0, 60.0),
    )
    .unwrap_err();
    assert!(matches!(err, ScaleError::Io(_)));
}

#[test]
fn nonexistent_texture_keeps_materials() {
    let fixture = Fixture::new(&rigged_scene());
    let params = ScaleParams::new(170.0, 60.0).with_texture(fixture.dir.path().join("nope.png"));
    let out = scale_file(&fixture.base, &fixture.output(), &params).unwrap();

    assert!(!out.report.texture_substituted());
    let scene = load_glb(&out.path).unwrap();
    assert_eq!(scene.materials.len(), 1);
    assert_eq!(scene.images.len(), 1);
    assert_eq!(scene.images[0].data, png_bytes());
}

#[test]
fn texture_replaces_material_images() {
    let fixture = Fixture::new(&rigged_scene());
    let texture = fixture.dir.path().join("denim.jpg");
    std::fs::write(&texture, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();

    let params = ScaleParams::new(170.0, 60.0).with_texture(&texture);
    let out = scale_file(&fixture.base, &fixture.output(), &params).unwrap();

    assert_eq!(out.report.textures_replaced, 1);
    let scene = load_glb(&out.path).unwrap();
    assert_eq!(scene.images.len(), 1);
    assert_eq!(scene.images[0].format, ImageFormat::Jpeg);
    assert_eq!(scene.materials[0].base_color_texture.map(|t| t.texture), Some(0));
}

#[test]
fn report_serializes() {
    let fixture = Fixture::new(&rigged_scene());
    let out = scale_file(&fixture.base, &fixture.output(), &ScaleParams::new(170.0, 60.0)).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["report"]["meshes"], 1);
    assert!(json["path"].as_str().unwrap().ends_with("out.glb"));
}
