//! Math utilities and types
//!
//! Provides the vector types used for world space (3D) and lightmap pixel
//! space (2D), plus the handful of scalar helpers the rasterizer needs.

pub use nalgebra::{Vector2, Vector3, Vector4, Matrix4};

/// 2D vector type (lightmap UV / pixel space)
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Integer texel coordinate in the lightmap
pub type IVec2 = Vector2<i32>;

/// 2D pseudo cross product (z component of the 3D cross product)
#[inline]
pub fn cross2(a: &Vec2, b: &Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Clamp to `[0, 1]`
#[inline]
pub fn saturate(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Wrap a UV component into the unit range.
///
/// Components already in `[0, 1]` are kept as-is so that a UV of exactly
/// `1.0` still addresses the last texel column/row.
#[inline]
pub fn wrap_unit(value: f32) -> f32 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        value.rem_euclid(1.0)
    }
}

/// Normalize a vector, returning zero for degenerate input instead of NaN
#[inline]
pub fn safe_normalize(v: &Vec3) -> Vec3 {
    v.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros)
}
