//! Vertices.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-vertex shading data that survives a bake.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexAttributes {
    /// Unit normal (`NORMAL`).
    pub normal: Option<Vector3<f64>>,
    /// First texture coordinate set (`TEXCOORD_0`).
    pub uv: Option<[f32; 2]>,
}

impl VertexAttributes {
    /// Whether neither attribute is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.normal.is_none() && self.uv.is_none()
    }
}

/// A mesh vertex.
///
/// # Example
///
/// ```
/// use mesh_types::{Point3, Vector3, Vertex};
///
/// let v = Vertex::with_normal(Point3::new(0.0, 1.0, 0.0), Vector3::y()).with_uv([0.5, 0.5]);
/// assert_eq!(v.normal(), Some(Vector3::y()));
/// assert_eq!(v.uv(), Some([0.5, 0.5]));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Position.
    pub position: Point3<f64>,
    /// Optional normal and UV.
    pub attributes: VertexAttributes,
}

impl Vertex {
    /// A vertex with no attributes.
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            attributes: VertexAttributes {
                normal: None,
                uv: None,
            },
        }
    }

    /// A vertex at `(x, y, z)`.
    #[must_use]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// A vertex with a normal.
    #[must_use]
    pub const fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            attributes: VertexAttributes {
                normal: Some(normal),
                uv: None,
            },
        }
    }

    /// Attach texture coordinates.
    #[must_use]
    pub const fn with_uv(mut self, uv: [f32; 2]) -> Self {
        self.attributes.uv = Some(uv);
        self
    }

    /// The normal, if any.
    #[must_use]
    pub const fn normal(&self) -> Option<Vector3<f64>> {
        self.attributes.normal
    }

    /// The texture coordinates, if any.
    #[must_use]
    pub const fn uv(&self) -> Option<[f32; 2]> {
        self.attributes.uv
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from(p: [f64; 3]) -> Self {
        Self::new(Point3::from(p))
    }
}

impl From<[f32; 3]> for Vertex {
    fn from(p: [f32; 3]) -> Self {
        Self::new(Point3::from(p.map(f64::from)))
    }
}
