//! Shared fixtures for the bake scenarios

use crate::bake::error::BakeError;
use crate::bake::pass::RasterPass;
use crate::bake::rasterizer::BakeContext;
use crate::bake::sampler::{IrradianceSampler, SampleBatch};
use crate::bake::sh9::Sh9;
use crate::bake::triangle::TriangleSample;
use crate::foundation::math::{Vec2, Vec3};

/// Light that varies smoothly with world position, so neighboring texels
/// are sometimes close enough to interpolate and sometimes not
#[derive(Default)]
pub struct GradientSampler {
    pub frames: usize,
}

impl IrradianceSampler for GradientSampler {
    fn evaluate(&mut self, batch: &SampleBatch<'_>) -> Result<Vec<Sh9>, BakeError> {
        self.frames += batch.len();
        Ok(batch
            .positions
            .iter()
            .map(|p| {
                let mut sh = Sh9::zero();
                sh.coefficients[0] = Vec3::new(0.2 + 0.6 * p.x, 0.5, 0.2 + 0.6 * p.z);
                sh.coefficients[2] = Vec3::repeat(0.1 * (p.x * 9.0).sin());
                sh
            })
            .collect())
    }
}

/// Flat triangle on the XZ plane whose positions mirror its UVs
pub fn planar_triangle(uvs: [Vec2; 3]) -> TriangleSample {
    TriangleSample::new(
        uvs.map(|uv| Vec3::new(uv.x, 0.0, uv.y)),
        uvs,
        [Vec3::y(); 3],
        [Vec3::x(); 3],
    )
}

/// A few triangles sharing edges, plus one sliver
pub fn scene() -> Vec<TriangleSample> {
    vec![
        planar_triangle([Vec2::new(0.05, 0.05), Vec2::new(0.6, 0.05), Vec2::new(0.05, 0.6)]),
        planar_triangle([Vec2::new(0.6, 0.05), Vec2::new(0.6, 0.6), Vec2::new(0.05, 0.6)]),
        planar_triangle([Vec2::new(0.7, 0.7), Vec2::new(0.95, 0.72), Vec2::new(0.71, 0.95)]),
        planar_triangle([Vec2::new(0.65, 0.1), Vec2::new(0.67, 0.1), Vec2::new(0.66, 0.55)]),
    ]
}

/// Walk one pass of `triangle`, flushing at `batch_size` and at the end
pub fn run_pass<S: IrradianceSampler>(
    ctx: &mut BakeContext,
    triangle: &TriangleSample,
    pass: RasterPass,
    sampler: &mut S,
    batch_size: usize,
) {
    let partition = ctx.partition();
    let mut pixel = ctx.set_triangle(triangle, pass);
    while !ctx.is_finished(&pixel) {
        ctx.sampling_triangle_position(&pixel);
        if ctx.pending_len() >= batch_size {
            ctx.sample_pending(sampler, batch_size, partition).unwrap();
        }
        ctx.move_next_pixel(&mut pixel);
    }
    ctx.sample_pending(sampler, batch_size, partition).unwrap();
}
