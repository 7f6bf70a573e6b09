//! Linear-blend skinning.

use mesh_types::{IndexedMesh, Vertex};
use nalgebra::{Matrix3, Matrix4};
use rayon::prelude::*;
use tracing::debug;

use crate::{RigError, RigResult, VertexWeights};

/// Vertex count above which skinning runs in parallel.
const PARALLEL_THRESHOLD: usize = 1000;

/// Result of skinning a mesh.
#[derive(Debug, Clone)]
pub struct SkinOutput {
    /// The deformed mesh, in the space the skinning matrices map into.
    pub mesh: IndexedMesh,
    /// Vertices that carried at least one positive weight.
    pub weighted_vertices: usize,
    /// Vertices that fell back to the static transform.
    pub unweighted_vertices: usize,
    /// Largest distance any vertex moved relative to the fallback placement.
    pub max_displacement: f64,
}

/// Deform `mesh` by blending `matrices` with per-vertex `weights`.
///
/// Each weighted vertex is transformed by `Σ wᵢ · Mᵢ`, where the weights are
/// normalized first. Normals go through the inverse transpose of the same
/// blended matrix and are renormalized. Vertices with no positive weight are
/// transformed by `fallback` instead.
///
/// Face indices, texture coordinates and vertex order are preserved.
///
/// # Errors
///
/// - [`RigError::WeightCountMismatch`] if `weights` and vertices differ in length.
/// - [`RigError::JointOutOfRange`] if a weighted slot names a joint with no matrix.
///
/// # Example
///
/// ```
/// use mesh_rig::{skin_mesh, VertexWeights};
/// use mesh_types::{unit_cube, MeshTopology};
/// use nalgebra::{Matrix4, Vector3};
///
/// let cube = unit_cube();
/// let weights = vec![VertexWeights::single(0); cube.vertex_count()];
/// let lift = Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0));
///
/// let out = skin_mesh(&cube, &weights, &[lift], &Matrix4::identity()).unwrap();
/// assert!((out.mesh.vertices[0].position.y - 2.0).abs() < 1e-12);
/// ```
pub fn skin_mesh(
    mesh: &IndexedMesh,
    weights: &[VertexWeights],
    matrices: &[Matrix4<f64>],
    fallback: &Matrix4<f64>,
) -> RigResult<SkinOutput> {
    if weights.len() != mesh.vertices.len() {
        return Err(RigError::WeightCountMismatch {
            vertices: mesh.vertices.len(),
            weights: weights.len(),
        });
    }

    for (vertex, w) in weights.iter().enumerate() {
        if let Some((joint, _)) = w.influences().find(|(j, _)| *j >= matrices.len()) {
            return Err(RigError::JointOutOfRange {
                vertex,
                joint,
                joint_count: matrices.len(),
            });
        }
    }

    let fallback_normal = normal_matrix(fallback);
    let skin_one = |(vertex, w): (&Vertex, &VertexWeights)| -> (Vertex, f64) {
        let (matrix, normals) = blended(w, matrices)
            .map_or((*fallback, fallback_normal), |m| (m, normal_matrix(&m)));

        let position = matrix.transform_point(&vertex.position);
        let displacement = (position - fallback.transform_point(&vertex.position)).norm();

        let mut out = vertex.clone();
        out.position = position;
        out.attributes.normal = vertex
            .attributes
            .normal
            .map(|n| (normals * n).try_normalize(f64::EPSILON).unwrap_or(n));
        (out, displacement)
    };

    let skinned: Vec<(Vertex, f64)> = if mesh.vertices.len() > PARALLEL_THRESHOLD {
        mesh.vertices.par_iter().zip(weights.par_iter()).map(skin_one).collect()
    } else {
        mesh.vertices.iter().zip(weights.iter()).map(skin_one).collect()
    };

    let weighted_vertices = weights.iter().filter(|w| w.is_weighted()).count();
    let max_displacement = skinned.iter().map(|(_, d)| *d).fold(0.0, f64::max);
    let vertices = skinned.into_iter().map(|(v, _)| v).collect();

    debug!(
        vertices = mesh.vertices.len(),
        weighted = weighted_vertices,
        max_displacement,
        "Skinned mesh"
    );

    Ok(SkinOutput {
        mesh: IndexedMesh::from_parts(vertices, mesh.faces.clone()),
        weighted_vertices,
        unweighted_vertices: mesh.vertices.len() - weighted_vertices,
        max_displacement,
    })
}

/// Weighted sum of joint matrices, or `None` for an unweighted vertex.
fn blended(weights: &VertexWeights, matrices: &[Matrix4<f64>]) -> Option<Matrix4<f64>> {
    let weights = weights.normalized();
    if !weights.is_weighted() {
        return None;
    }
    Some(
        weights
            .influences()
            .fold(Matrix4::zeros(), |acc, (joint, w)| acc + matrices[joint] * w),
    )
}

/// Inverse transpose of the linear part, for transforming normals.
///
/// Singular matrices fall back to the plain linear part.
fn normal_matrix(matrix: &Matrix4<f64>) -> Matrix3<f64> {
    let linear = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map_or(linear, |inverse| inverse.transpose())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{MeshTopology, Point3, unit_cube};
    use nalgebra::Vector3;

    #[test]
    fn weight_count_must_match() {
        let cube = unit_cube();
        let result = skin_mesh(&cube, &[], &[Matrix4::identity()], &Matrix4::identity());
        assert!(matches!(result, Err(RigError::WeightCountMismatch { .. })));
    }

    #[test]
    fn out_of_range_joint_is_rejected() {
        let cube = unit_cube();
        let weights = vec![VertexWeights::single(4); cube.vertex_count()];
        let result = skin_mesh(&cube, &weights, &[Matrix4::identity()], &Matrix4::identity());
        assert!(matches!(
            result,
            Err(RigError::JointOutOfRange { joint: 4, .. })
        ));
    }

    #[test]
    fn blends_between_two_joints() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        let weights = [VertexWeights::new([0, 1, 0, 0], [0.5, 0.5, 0.0, 0.0])];
        let matrices = [
            Matrix4::identity(),
            Matrix4::new_translation(&Vector3::new(2.0, 0.0, 0.0)),
        ];

        let out = skin_mesh(&mesh, &weights, &matrices, &Matrix4::identity()).unwrap();
        assert_relative_eq!(
            out.mesh.vertices[0].position,
            Point3::new(1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(out.max_displacement, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn unweighted_vertices_use_fallback() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        let fallback = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 5.0));

        let out = skin_mesh(
            &mesh,
            &[VertexWeights::none()],
            &[Matrix4::new_scaling(3.0)],
            &fallback,
        )
        .unwrap();
        assert_relative_eq!(
            out.mesh.vertices[0].position,
            Point3::new(1.0, 0.0, 5.0),
            epsilon = 1e-12
        );
        assert_eq!(out.unweighted_vertices, 1);
        assert_eq!(out.weighted_vertices, 0);
    }

    #[test]
    fn normals_use_inverse_transpose() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::with_normal(
            Point3::origin(),
            Vector3::new(1.0, 1.0, 0.0).normalize(),
        ));
        // stretch X by 2: a 45° normal tilts towards Y
        let stretch = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));

        let out = skin_mesh(&mesh, &[VertexWeights::single(0)], &[stretch], &Matrix4::identity())
            .unwrap();
        let n = out.mesh.vertices[0].normal().unwrap_or_else(Vector3::zeros);
        let expected = Vector3::new(0.5, 1.0, 0.0).normalize();
        assert_relative_eq!(n, expected, epsilon = 1e-12);
    }

    #[test]
    fn large_mesh_matches_serial_result() {
        let mut mesh = IndexedMesh::new();
        for i in 0..2000 {
            mesh.vertices.push(Vertex::from_coords(f64::from(i), 0.0, 0.0));
        }
        let weights = vec![VertexWeights::single(0); mesh.vertices.len()];
        let scale = Matrix4::new_scaling(0.5);

        let out = skin_mesh(&mesh, &weights, &[scale], &Matrix4::identity()).unwrap();
        assert_eq!(out.mesh.vertex_count(), 2000);
        assert_relative_eq!(out.mesh.vertices[1999].position.x, 999.5, epsilon = 1e-9);
    }
}
