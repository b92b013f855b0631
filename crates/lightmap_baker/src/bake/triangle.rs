//! Canonical triangle input for the rasterizer
//!
//! Mesh buffers come in several vertex layouts (with or without tangents).
//! They are normalized here, before reaching the rasterizer, into one
//! [`TriangleSample`] so the bake core never branches on vertex format.

use serde::{Deserialize, Serialize};

use crate::bake::error::BakeError;
use crate::foundation::math::{safe_normalize, Mat4, Point3, Vec2, Vec3};

/// One triangle's bake attributes. Read-only for one rasterization call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleSample {
    /// World-space positions
    pub positions: [Vec3; 3],
    /// Lightmap UVs
    pub uvs: [Vec2; 3],
    /// World-space normals
    pub normals: [Vec3; 3],
    /// World-space tangents
    pub tangents: [Vec3; 3],
}

impl Default for TriangleSample {
    fn default() -> Self {
        Self {
            positions: [Vec3::zeros(); 3],
            uvs: [Vec2::zeros(); 3],
            normals: [Vec3::zeros(); 3],
            tangents: [Vec3::zeros(); 3],
        }
    }
}

impl TriangleSample {
    /// Create a triangle from its attribute arrays
    pub fn new(positions: [Vec3; 3], uvs: [Vec2; 3], normals: [Vec3; 3], tangents: [Vec3; 3]) -> Self {
        Self { positions, uvs, normals, tangents }
    }

    /// Build from three vertices of any supported layout.
    ///
    /// Missing tangents are derived from the UV gradient of the triangle.
    pub fn from_vertices<V: LightmapVertex>(vertices: [&V; 3]) -> Self {
        let positions = vertices.map(|v| v.position());
        let uvs = vertices.map(|v| v.lightmap_uv());
        let normals = vertices.map(|v| safe_normalize(&v.normal()));

        let face_tangent = uv_tangent(&positions, &uvs);
        let tangents = [0, 1, 2].map(|i| {
            vertices[i]
                .tangent()
                .map(|t| safe_normalize(&t))
                .filter(|t| t.norm_squared() > 0.0)
                .unwrap_or_else(|| orthogonalize(&face_tangent, &normals[i]))
        });

        Self { positions, uvs, normals, tangents }
    }

    /// Apply a world transform to positions and rotate the direction attributes
    pub fn transformed(&self, transform: &Mat4) -> Self {
        Self {
            positions: self.positions.map(|p| transform.transform_point(&Point3::from(p)).coords),
            uvs: self.uvs,
            normals: self.normals.map(|n| safe_normalize(&transform.transform_vector(&n))),
            tangents: self.tangents.map(|t| safe_normalize(&transform.transform_vector(&t))),
        }
    }

    /// Interpolate the attributes at barycentric weights.
    ///
    /// Returns position, normal, tangent and binormal (normal x tangent).
    pub fn interpolate(&self, weights: &[f32; 3]) -> InterpolatedSurface {
        let blend = |v: &[Vec3; 3]| v[0] * weights[0] + v[1] * weights[1] + v[2] * weights[2];
        let normal = safe_normalize(&blend(&self.normals));
        let tangent = safe_normalize(&blend(&self.tangents));
        InterpolatedSurface {
            position: blend(&self.positions),
            normal,
            tangent,
            binormal: safe_normalize(&normal.cross(&tangent)),
        }
    }
}

/// Surface frame at a point inside a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedSurface {
    /// World position
    pub position: Vec3,
    /// Unit normal
    pub normal: Vec3,
    /// Unit tangent
    pub tangent: Vec3,
    /// Unit binormal
    pub binormal: Vec3,
}

/// Vertex layouts the baker can consume
pub trait LightmapVertex {
    /// Object-space position
    fn position(&self) -> Vec3;
    /// Lightmap (second) UV channel
    fn lightmap_uv(&self) -> Vec2;
    /// Object-space normal
    fn normal(&self) -> Vec3;
    /// Object-space tangent, if the layout carries one
    fn tangent(&self) -> Option<Vec3>;
}

/// Vertex with position, normal and lightmap UV
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StandardVertex {
    /// Position in 3D space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Lightmap texture coordinates
    pub lightmap_uv: [f32; 2],
}

/// Vertex carrying a tangent frame
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TangentVertex {
    /// Position in 3D space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Lightmap texture coordinates
    pub lightmap_uv: [f32; 2],
    /// Tangent vector
    pub tangent: [f32; 3],
}

impl LightmapVertex for StandardVertex {
    fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
    fn lightmap_uv(&self) -> Vec2 {
        Vec2::from(self.lightmap_uv)
    }
    fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }
    fn tangent(&self) -> Option<Vec3> {
        None
    }
}

impl LightmapVertex for TangentVertex {
    fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
    fn lightmap_uv(&self) -> Vec2 {
        Vec2::from(self.lightmap_uv)
    }
    fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }
    fn tangent(&self) -> Option<Vec3> {
        Some(Vec3::from(self.tangent))
    }
}

/// Collect world-space triangles from an indexed vertex buffer.
///
/// A trailing partial triangle is ignored; an index outside the vertex
/// buffer is an error.
pub fn triangles_from_indexed<V: LightmapVertex>(
    vertices: &[V],
    indices: &[u32],
    transform: &Mat4,
) -> Result<Vec<TriangleSample>, BakeError> {
    indices
        .chunks_exact(3)
        .map(|tri| {
            let fetch = |i: u32| {
                vertices.get(i as usize).ok_or_else(|| {
                    BakeError::InvalidInput(format!(
                        "Index {i} out of range for {} vertices",
                        vertices.len()
                    ))
                })
            };
            let corners = [fetch(tri[0])?, fetch(tri[1])?, fetch(tri[2])?];
            Ok(TriangleSample::from_vertices(corners).transformed(transform))
        })
        .collect()
}

/// Tangent along +U derived from the triangle's UV mapping
fn uv_tangent(positions: &[Vec3; 3], uvs: &[Vec2; 3]) -> Vec3 {
    let e1 = positions[1] - positions[0];
    let e2 = positions[2] - positions[0];
    let d1 = uvs[1] - uvs[0];
    let d2 = uvs[2] - uvs[0];
    let det = d1.x * d2.y - d2.x * d1.y;
    if det.abs() <= f32::EPSILON {
        return Vec3::zeros();
    }
    (e1 * d2.y - e2 * d1.y) / det
}

/// Gram-Schmidt `tangent` against `normal`, picking any perpendicular axis
/// when the tangent is degenerate
pub(crate) fn orthogonalize(tangent: &Vec3, normal: &Vec3) -> Vec3 {
    let t = safe_normalize(&(tangent - normal * normal.dot(tangent)));
    if t.norm_squared() > 0.0 {
        return t;
    }
    let axis = if normal.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    safe_normalize(&normal.cross(&axis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn standard(position: [f32; 3], uv: [f32; 2]) -> StandardVertex {
        StandardVertex {
            position,
            normal: [0.0, 0.0, 1.0],
            lightmap_uv: uv,
        }
    }

    #[test]
    fn test_derived_tangent_follows_u() {
        let a = standard([0.0, 0.0, 0.0], [0.0, 0.0]);
        let b = standard([2.0, 0.0, 0.0], [1.0, 0.0]);
        let c = standard([0.0, 2.0, 0.0], [0.0, 1.0]);
        let tri = TriangleSample::from_vertices([&a, &b, &c]);
        for t in tri.tangents {
            assert_relative_eq!(t, Vec3::x(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_degenerate_uvs_still_give_perpendicular_tangent() {
        let a = standard([0.0, 0.0, 0.0], [0.5, 0.5]);
        let b = standard([1.0, 0.0, 0.0], [0.5, 0.5]);
        let c = standard([0.0, 1.0, 0.0], [0.5, 0.5]);
        let tri = TriangleSample::from_vertices([&a, &b, &c]);
        for (t, n) in tri.tangents.iter().zip(tri.normals.iter()) {
            assert_relative_eq!(t.norm(), 1.0, epsilon = 1e-6);
            assert_relative_eq!(t.dot(n), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_explicit_tangent_is_kept() {
        let v = |p: [f32; 3], uv: [f32; 2]| TangentVertex {
            position: p,
            normal: [0.0, 1.0, 0.0],
            lightmap_uv: uv,
            tangent: [0.0, 0.0, 3.0],
        };
        let (a, b, c) = (v([0.0; 3], [0.0, 0.0]), v([1.0, 0.0, 0.0], [1.0, 0.0]), v([0.0, 0.0, 1.0], [0.0, 1.0]));
        let tri = TriangleSample::from_vertices([&a, &b, &c]);
        assert_relative_eq!(tri.tangents[0], Vec3::z());
    }

    #[test]
    fn test_interpolate_binormal() {
        let tri = TriangleSample::new(
            [Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            [Vec2::zeros(), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            [Vec3::z(); 3],
            [Vec3::x(); 3],
        );
        let s = tri.interpolate(&[0.5, 0.25, 0.25]);
        assert_relative_eq!(s.position, Vec3::new(0.25, 0.25, 0.0));
        assert_relative_eq!(s.binormal, Vec3::y());
    }

    #[test]
    fn test_indexed_triangles_with_transform() {
        let vertices = [
            standard([0.0, 0.0, 0.0], [0.0, 0.0]),
            standard([1.0, 0.0, 0.0], [1.0, 0.0]),
            standard([0.0, 1.0, 0.0], [0.0, 1.0]),
        ];
        let transform = Mat4::new_translation(&Vec3::new(0.0, 0.0, 5.0));
        let tris = triangles_from_indexed(&vertices, &[0, 1, 2, 0], &transform).unwrap();
        assert_eq!(tris.len(), 1);
        assert_relative_eq!(tris[0].positions[1], Vec3::new(1.0, 0.0, 5.0));
        assert_relative_eq!(tris[0].normals[0], Vec3::z());
    }

    #[test]
    fn test_indexed_out_of_range() {
        let vertices = [standard([0.0; 3], [0.0, 0.0])];
        let result = triangles_from_indexed(&vertices, &[0, 0, 3], &Mat4::identity());
        assert!(matches!(result, Err(BakeError::InvalidInput(_))));
    }
}
