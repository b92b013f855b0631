//! Resolving sampled irradiance into lightmap colors
//!
//! Every pending texel is independent of the others once its SH result is
//! known, so the batch is split into fixed-size chunks and tone mapped on
//! the rayon pool. Writes are gathered first and scattered afterwards, which
//! keeps the output independent of how the work was partitioned.

use rayon::prelude::*;

use crate::bake::error::BakeError;
use crate::bake::rasterizer::BakeContext;
use crate::bake::sh9::Sh9;
use crate::foundation::math::{saturate, Vec3};

/// How a flush splits the pending queue across worker threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPartition {
    chunk_size: usize,
}

impl FlushPartition {
    /// Partition into chunks of `chunk_size` texels (at least one)
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Everything in one task
    pub fn sequential() -> Self {
        Self { chunk_size: usize::MAX }
    }

    /// Texels per task
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for FlushPartition {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Map irradiance to an 8-bit color.
///
/// Darker texels are lifted before the fixed 1/3 exposure so shadows keep
/// some detail.
pub fn tone_map(irradiance: &Vec3) -> [u8; 3] {
    let luminance = saturate(0.21 * irradiance.x + 0.72 * irradiance.y + 0.07 * irradiance.z);
    let darkness = 1.0 - luminance;
    let lift = 1.0 + 1.5 * darkness * darkness * darkness;
    let color = irradiance * (lift / 3.0);

    [
        (saturate(color.x) * 255.0) as u8,
        (saturate(color.y) * 255.0) as u8,
        (saturate(color.z) * 255.0) as u8,
    ]
}

impl BakeContext {
    /// Consume one SH result per pending texel, in queue order, and write
    /// the tone-mapped colors. Returns the number of texels written.
    ///
    /// On a length mismatch nothing is written and the queue is kept.
    pub fn flush_pixel(&mut self, results: &[Sh9]) -> Result<usize, BakeError> {
        let partition = self.partition;
        self.flush_pixel_with(results, partition)
    }

    /// [`Self::flush_pixel`] with an explicit partition
    pub fn flush_pixel_with(&mut self, results: &[Sh9], partition: FlushPartition) -> Result<usize, BakeError> {
        if results.len() != self.pending.len() {
            return Err(BakeError::BatchSizeMismatch {
                expected: self.pending.len(),
                actual: results.len(),
            });
        }

        if self.pending.is_empty() {
            return Ok(0);
        }

        let width = self.width as usize;
        let chunk = partition.chunk_size().min(self.pending.len());

        let writes: Vec<(usize, [u8; 3])> = self
            .pending
            .par_chunks(chunk)
            .zip(results.par_chunks(chunk))
            .flat_map_iter(|(texels, samples)| {
                texels.iter().zip(samples).map(move |(texel, sample)| {
                    let sh = texel.sh + *sample;
                    (texel.index(width), tone_map(&sh.irradiance(&texel.normal)))
                })
            })
            .collect();

        for (index, color) in writes {
            self.lightmap[index] = color;
        }

        let flushed = self.pending.len();
        self.pending.clear();
        log::debug!("Flushed {} texels ({} per task)", flushed, chunk);
        Ok(flushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bake::pass::RasterPass;
    use crate::bake::triangle::TriangleSample;
    use crate::core::config::BakeConfig;
    use crate::foundation::math::Vec2;
    use std::f32::consts::PI;

    fn uniform(radiance: f32) -> Sh9 {
        let mut sh = Sh9::zero();
        sh.coefficients[0] = Vec3::repeat(radiance * 0.282_095 * 4.0 * PI);
        sh
    }

    /// Context with every texel of one Space4A pass queued
    fn queued_context() -> BakeContext {
        let mut ctx = BakeContext::new(&BakeConfig::new(16, 16)).unwrap();
        let tri = TriangleSample::new(
            [Vec3::zeros(), Vec3::x(), Vec3::z()],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            [Vec3::y(); 3],
            [Vec3::x(); 3],
        );
        let mut pixel = ctx.set_triangle(&tri, RasterPass::Space4A);
        loop {
            ctx.sampling_triangle_position(&pixel);
            if !ctx.move_next_pixel(&mut pixel) {
                break;
            }
        }
        ctx
    }

    fn varied_results(count: usize) -> Vec<Sh9> {
        (0..count).map(|i| uniform(0.05 * (i % 17) as f32)).collect()
    }

    #[test]
    fn test_tone_map_black_and_white() {
        assert_eq!(tone_map(&Vec3::zeros()), [0, 0, 0]);
        assert_eq!(tone_map(&Vec3::repeat(10.0)), [255, 255, 255]);
    }

    #[test]
    fn test_tone_map_lifts_shadows() {
        // L = 0.3, darkness 0.7, lift 1 + 1.5 * 0.343
        let c = tone_map(&Vec3::repeat(0.3));
        let expected = (0.3 * (1.0 + 1.5 * 0.343) / 3.0 * 255.0) as u8;
        assert_eq!(c, [expected; 3]);
    }

    #[test]
    fn test_flush_writes_and_clears() {
        let mut ctx = queued_context();
        let count = ctx.pending_len();
        assert!(count > 0);

        let results = vec![uniform(0.6); count];
        assert_eq!(ctx.flush_pixel(&results).unwrap(), count);
        assert!(ctx.pending().is_empty());

        let expected = tone_map(&uniform(0.6).irradiance(&Vec3::y()));
        assert_eq!(ctx.texel(0, 0), Some(expected));
    }

    #[test]
    fn test_flush_is_partition_independent() {
        let mut a = queued_context();
        let mut b = a.clone();
        let mut c = a.clone();
        let results = varied_results(a.pending_len());

        a.flush_pixel_with(&results, FlushPartition::sequential()).unwrap();
        b.flush_pixel_with(&results, FlushPartition::new(1)).unwrap();
        c.flush_pixel_with(&results, FlushPartition::new(3)).unwrap();

        assert_eq!(a.lightmap(), b.lightmap());
        assert_eq!(a.lightmap(), c.lightmap());
    }

    #[test]
    fn test_flush_length_mismatch_changes_nothing() {
        let mut ctx = queued_context();
        let before = ctx.clone();
        let results = varied_results(ctx.pending_len() + 1);

        let err = ctx.flush_pixel(&results).unwrap_err();
        assert!(matches!(err, BakeError::BatchSizeMismatch { actual, .. } if actual == results.len()));
        assert_eq!(ctx.pending(), before.pending());
        assert_eq!(ctx.lightmap(), before.lightmap());
    }

    #[test]
    fn test_empty_flush() {
        let mut ctx = BakeContext::new(&BakeConfig::new(4, 4)).unwrap();
        assert_eq!(ctx.flush_pixel(&[]).unwrap(), 0);
        assert_eq!(ctx.texel(0, 0), Some([0, 0, 0]));
        assert!(!ctx.is_baked(0, 0));
    }
}
