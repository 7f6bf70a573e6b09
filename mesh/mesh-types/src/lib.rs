//! Geometry shared by the rig, scene and GLB crates.
//!
//! - [`Vertex`] - position plus the optional shading attributes a skinned
//!   glTF primitive carries (normal, first UV set)
//! - [`IndexedMesh`] - vertices and triangle index triples
//! - [`Aabb`] - bounds, written as accessor `min`/`max` on export
//!
//! Positions are `f64` so that posing, baking and exporting do not stack
//! `f32` rounding. Coordinates follow glTF: right-handed, +Y up, meters.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, MeshTopology, Point3, Vertex};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(1.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(0.0, 1.0, 0.0)));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert_eq!(mesh.bounds().max, Point3::new(1.0, 1.0, 0.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod mesh;
mod traits;
mod vertex;

pub use bounds::Aabb;
pub use mesh::{IndexedMesh, unit_cube};
pub use traits::MeshTopology;
pub use vertex::{Vertex, VertexAttributes};

pub use nalgebra::{Matrix4, Point3, Vector3};
