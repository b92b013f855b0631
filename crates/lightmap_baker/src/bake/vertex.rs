//! Per-vertex indirect lighting
//!
//! Dense meshes that don't get a lightmap chart still receive baked light
//! as vertex colors. The frames come straight from the vertex buffer
//! instead of the rasterizer, and go through the same sampler and tone
//! curve as lightmap texels.

use crate::bake::error::BakeError;
use crate::bake::flush::tone_map;
use crate::bake::sampler::{evaluate_in_batches, IrradianceSampler, SampleBuffers};
use crate::bake::sh9::Sh9;
use crate::bake::triangle::{orthogonalize, LightmapVertex};
use crate::foundation::math::{safe_normalize, Mat4, Point3, Vec3};

/// Distance a vertex sample is pushed along its normal, in world units
pub const VERTEX_SURFACE_BIAS: f32 = 0.02;

/// Bake `count` vertices starting at `begin`.
///
/// Writes each vertex's SH into `sh` and its RGBA color into `colors`, both
/// indexed like `vertices`. `count` is clamped to the vertices remaining
/// after `begin`. Returns the number of vertices baked.
pub fn bake_vertex_range<V, S>(
    vertices: &[V],
    transform: &Mat4,
    begin: usize,
    count: usize,
    sampler: &mut S,
    max_batch: usize,
    colors: &mut [[u8; 4]],
    sh: &mut [Sh9],
) -> Result<usize, BakeError>
where
    V: LightmapVertex,
    S: IrradianceSampler + ?Sized,
{
    if colors.len() < vertices.len() || sh.len() < vertices.len() {
        return Err(BakeError::InvalidInput(format!(
            "Output buffers ({} colors, {} SH) shorter than {} vertices",
            colors.len(),
            sh.len(),
            vertices.len()
        )));
    }

    let remaining = vertices.len().saturating_sub(begin);
    if remaining == 0 {
        log::warn!("Vertex bake skipped: nothing after index {} of {}", begin, vertices.len());
        return Ok(0);
    }
    let count = count.min(remaining);
    let range = begin..begin + count;

    let mut frames = SampleBuffers::with_capacity(count);
    for vertex in &vertices[range.clone()] {
        let normal = safe_normalize(&transform.transform_vector(&vertex.normal()));
        let tangent = vertex
            .tangent()
            .map(|t| safe_normalize(&transform.transform_vector(&t)))
            .filter(|t| t.norm_squared() > 0.0)
            .unwrap_or_else(|| orthogonalize(&Vec3::zeros(), &normal));
        let binormal = safe_normalize(&normal.cross(&tangent));
        let position = transform.transform_point(&Point3::from(vertex.position())).coords
            + normal * VERTEX_SURFACE_BIAS;
        frames.push(position, normal, tangent, binormal);
    }

    let batch = frames.as_batch();
    let results = evaluate_in_batches(sampler, &batch, max_batch)?;

    for (offset, result) in results.into_iter().enumerate() {
        let i = range.start + offset;
        let [r, g, b] = tone_map(&result.irradiance(&batch.normals[offset]));
        sh[i] = result;
        colors[i] = [r, g, b, 255];
    }

    log::debug!("Baked vertices {}..{}", range.start, range.end);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bake::sampler::SampleBatch;
    use crate::bake::triangle::TangentVertex;
    use approx::assert_relative_eq;

    /// Returns the sample position's height as uniform light and records frames
    #[derive(Default)]
    struct HeightSampler {
        positions: Vec<Vec3>,
        binormals: Vec<Vec3>,
    }

    impl IrradianceSampler for HeightSampler {
        fn evaluate(&mut self, batch: &SampleBatch<'_>) -> Result<Vec<Sh9>, BakeError> {
            self.positions.extend_from_slice(batch.positions);
            self.binormals.extend_from_slice(batch.binormals);
            Ok(batch
                .positions
                .iter()
                .map(|p| {
                    let mut sh = Sh9::zero();
                    sh.coefficients[0] = Vec3::repeat(p.y);
                    sh
                })
                .collect())
        }
    }

    fn vertex(y: f32) -> TangentVertex {
        TangentVertex {
            position: [0.0, y, 0.0],
            normal: [0.0, 1.0, 0.0],
            lightmap_uv: [0.0, 0.0],
            tangent: [1.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_range_is_clamped_and_biased() {
        let vertices: Vec<_> = (0..5).map(|i| vertex(i as f32)).collect();
        let mut colors = vec![[0u8; 4]; 5];
        let mut sh = vec![Sh9::zero(); 5];
        let mut sampler = HeightSampler::default();
        let transform = Mat4::new_translation(&Vec3::new(0.0, 1.0, 0.0));

        let baked =
            bake_vertex_range(&vertices, &transform, 3, 10, &mut sampler, 1, &mut colors, &mut sh).unwrap();

        assert_eq!(baked, 2);
        assert_relative_eq!(sampler.positions[0], Vec3::new(0.0, 4.0 + VERTEX_SURFACE_BIAS, 0.0));
        assert_relative_eq!(sampler.binormals[0], -Vec3::z());
        assert_eq!(colors[0], [0, 0, 0, 0]);
        assert_eq!(colors[3][3], 255);
        assert_relative_eq!(sh[4].coefficients[0].x, 5.0 + VERTEX_SURFACE_BIAS);
        assert_eq!(colors[4], {
            let [r, g, b] = tone_map(&sh[4].irradiance(&Vec3::y()));
            [r, g, b, 255]
        });
    }

    #[test]
    fn test_nothing_left_to_bake() {
        let vertices = vec![vertex(0.0); 2];
        let mut colors = vec![[0u8; 4]; 2];
        let mut sh = vec![Sh9::zero(); 2];
        let mut sampler = HeightSampler::default();
        let baked =
            bake_vertex_range(&vertices, &Mat4::identity(), 2, 4, &mut sampler, 8, &mut colors, &mut sh).unwrap();
        assert_eq!(baked, 0);
        assert!(sampler.positions.is_empty());
    }

    #[test]
    fn test_short_outputs_rejected() {
        let vertices = vec![vertex(0.0); 3];
        let mut colors = vec![[0u8; 4]; 2];
        let mut sh = vec![Sh9::zero(); 3];
        let mut sampler = HeightSampler::default();
        let result = bake_vertex_range(&vertices, &Mat4::identity(), 0, 3, &mut sampler, 8, &mut colors, &mut sh);
        assert!(matches!(result, Err(BakeError::InvalidInput(_))));
    }
}
