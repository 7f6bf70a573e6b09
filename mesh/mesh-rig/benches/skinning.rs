//! Benchmarks for pose evaluation and skinning.
//!
//! Run with: cargo bench -p mesh-rig

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mesh_rig::{Joint, JointTransform, Skeleton, VertexWeights, skin_mesh};
use mesh_types::{IndexedMesh, Vertex};
use nalgebra::{Matrix4, Vector3};

// =============================================================================
// Fixtures
// =============================================================================

/// A vertical chain of `count` joints, one unit apart.
fn chain(count: usize) -> Skeleton {
    let mut skeleton = Skeleton::default();
    let mut parent = None;
    for i in 0..count {
        let offset = if i == 0 { 0.0 } else { 1.0 };
        parent = Some(skeleton.add_joint(Joint::new(
            format!("bone_{i}"),
            parent,
            JointTransform::from_translation(Vector3::new(0.0, offset, 0.0)),
        )));
    }
    skeleton.bind_at_rest().expect("chain is acyclic");
    skeleton
}

/// A `side` x `side` vertex grid standing in the XY plane, blended between
/// the two joints nearest each row.
fn grid(side: u32, joints: usize) -> (IndexedMesh, Vec<VertexWeights>) {
    let mut mesh = IndexedMesh::new();
    let mut weights = Vec::new();
    let height = (joints - 1) as f64;

    for row in 0..side {
        let y = f64::from(row) / f64::from(side - 1) * height;
        let lower = (y.floor() as usize).min(joints - 1);
        let upper = (lower + 1).min(joints - 1);
        let t = (y - lower as f64) as f32;
        for col in 0..side {
            mesh.vertices
                .push(Vertex::from_coords(f64::from(col) / f64::from(side), y, 0.0));
            weights.push(VertexWeights::new(
                [lower as u16, upper as u16, 0, 0],
                [1.0 - t, t, 0.0, 0.0],
            ));
        }
    }
    for row in 0..side - 1 {
        for col in 0..side - 1 {
            let i = row * side + col;
            mesh.faces.push([i, i + 1, i + side]);
            mesh.faces.push([i + 1, i + side + 1, i + side]);
        }
    }
    (mesh, weights)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_skinning(c: &mut Criterion) {
    let mut group = c.benchmark_group("Skinning");

    let mut skeleton = chain(8);
    for i in 0..8 {
        skeleton.set_pose_scale(mesh_rig::JointId(i), Vector3::new(1.3, 1.1, 1.2));
    }
    let matrices = skeleton.skinning_matrices().expect("valid skeleton");

    // below and well above the parallel threshold
    for side in [20_u32, 200] {
        let (mesh, weights) = grid(side, 8);
        group.throughput(Throughput::Elements(mesh.vertices.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("skin_mesh", mesh.vertices.len()),
            &(mesh, weights),
            |b, (mesh, weights)| {
                b.iter(|| skin_mesh(black_box(mesh), weights, &matrices, &Matrix4::identity()));
            },
        );
    }

    group.bench_function("world_matrices_64", |b| {
        let skeleton = chain(64);
        b.iter(|| black_box(&skeleton).skinning_matrices());
    });

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_skinning);
criterion_main!(benches);
