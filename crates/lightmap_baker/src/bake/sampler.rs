//! Irradiance sampler seam and the drivers built on it
//!
//! Computing a GI sample is the renderer's job. The baker hands it batches
//! of surface frames through [`IrradianceSampler`] and gets one [`Sh9`]
//! per frame back, in order.

use std::ops::{AddAssign, Range};

use crate::bake::error::BakeError;
use crate::bake::flush::FlushPartition;
use crate::bake::pass::RasterPass;
use crate::bake::rasterizer::{BakeContext, PendingTexel, TexelOutcome};
use crate::bake::sh9::Sh9;
use crate::bake::triangle::TriangleSample;
use crate::foundation::math::{safe_normalize, Vec3};

/// Borrowed surface frames to sample, all slices the same length
#[derive(Debug, Clone, Copy)]
pub struct SampleBatch<'a> {
    /// World positions
    pub positions: &'a [Vec3],
    /// Unit normals
    pub normals: &'a [Vec3],
    /// Unit tangents
    pub tangents: &'a [Vec3],
    /// Unit binormals
    pub binormals: &'a [Vec3],
}

impl<'a> SampleBatch<'a> {
    /// Create a batch, checking that every slice has the same length
    pub fn new(
        positions: &'a [Vec3],
        normals: &'a [Vec3],
        tangents: &'a [Vec3],
        binormals: &'a [Vec3],
    ) -> Result<Self, BakeError> {
        let n = positions.len();
        if normals.len() != n || tangents.len() != n || binormals.len() != n {
            return Err(BakeError::InvalidInput(format!(
                "Sample batch slices differ in length: {} positions, {} normals, {} tangents, {} binormals",
                n,
                normals.len(),
                tangents.len(),
                binormals.len()
            )));
        }
        Ok(Self { positions, normals, tangents, binormals })
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sub-batch over `range`
    pub fn slice(&self, range: Range<usize>) -> SampleBatch<'a> {
        SampleBatch {
            positions: &self.positions[range.clone()],
            normals: &self.normals[range.clone()],
            tangents: &self.tangents[range.clone()],
            binormals: &self.binormals[range],
        }
    }
}

/// Owned storage for a [`SampleBatch`]
#[derive(Debug, Clone, Default)]
pub struct SampleBuffers {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
    binormals: Vec<Vec3>,
}

impl SampleBuffers {
    /// Empty buffers with room for `capacity` frames
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            normals: Vec::with_capacity(capacity),
            tangents: Vec::with_capacity(capacity),
            binormals: Vec::with_capacity(capacity),
        }
    }

    /// Frames of the pending queue, in queue order
    pub fn from_pending(pending: &[PendingTexel]) -> Self {
        let mut buffers = Self::with_capacity(pending.len());
        for texel in pending {
            buffers.push(texel.position, texel.normal, texel.tangent, texel.binormal);
        }
        buffers
    }

    /// Append one frame
    pub fn push(&mut self, position: Vec3, normal: Vec3, tangent: Vec3, binormal: Vec3) {
        self.positions.push(position);
        self.normals.push(normal);
        self.tangents.push(tangent);
        self.binormals.push(binormal);
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether no frames were pushed
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Borrow as a batch
    pub fn as_batch(&self) -> SampleBatch<'_> {
        SampleBatch {
            positions: &self.positions,
            normals: &self.normals,
            tangents: &self.tangents,
            binormals: &self.binormals,
        }
    }
}

/// External GI sampler.
///
/// Must return exactly one result per frame, in batch order.
pub trait IrradianceSampler {
    /// Evaluate incoming irradiance for every frame of `batch`
    fn evaluate(&mut self, batch: &SampleBatch<'_>) -> Result<Vec<Sh9>, BakeError>;
}

/// Evaluate `batch` in chunks of at most `max_batch` frames.
///
/// The last chunk may be short. A chunk whose result count differs from its
/// frame count fails the whole call.
pub fn evaluate_in_batches<S: IrradianceSampler + ?Sized>(
    sampler: &mut S,
    batch: &SampleBatch<'_>,
    max_batch: usize,
) -> Result<Vec<Sh9>, BakeError> {
    let max_batch = max_batch.max(1);
    let mut results = Vec::with_capacity(batch.len());

    let mut start = 0;
    while start < batch.len() {
        let end = (start + max_batch).min(batch.len());
        let chunk = batch.slice(start..end);
        let sh = sampler.evaluate(&chunk)?;
        if sh.len() != chunk.len() {
            return Err(BakeError::BatchSizeMismatch {
                expected: chunk.len(),
                actual: sh.len(),
            });
        }
        results.extend(sh);
        start = end;
    }

    Ok(results)
}

/// Bake light probes at `positions`.
///
/// Probes have no surface, so every probe uses normal +Y and tangent +X.
pub fn bake_probes<S: IrradianceSampler + ?Sized>(
    sampler: &mut S,
    positions: &[Vec3],
    max_batch: usize,
) -> Result<Vec<Sh9>, BakeError> {
    let normal = Vec3::y();
    let tangent = Vec3::x();
    let binormal = safe_normalize(&normal.cross(&tangent));

    let normals = vec![normal; positions.len()];
    let tangents = vec![tangent; positions.len()];
    let binormals = vec![binormal; positions.len()];

    let batch = SampleBatch::new(positions, &normals, &tangents, &binormals)?;
    let probes = evaluate_in_batches(sampler, &batch, max_batch)?;
    log::info!("Baked {} light probes", probes.len());
    Ok(probes)
}

/// Texel counts from one [`bake_triangle`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangleBakeStats {
    /// Texels resolved by the irradiance sampler
    pub sampled: usize,
    /// Texels filled from neighbors
    pub interpolated: usize,
}

impl TriangleBakeStats {
    /// Texels baked in total
    pub fn baked(&self) -> usize {
        self.sampled + self.interpolated
    }
}

impl AddAssign for TriangleBakeStats {
    fn add_assign(&mut self, other: Self) {
        self.sampled += other.sampled;
        self.interpolated += other.interpolated;
    }
}

impl BakeContext {
    /// Evaluate the pending queue with `sampler` and flush the results.
    /// Returns the number of texels flushed.
    pub fn sample_pending<S: IrradianceSampler + ?Sized>(
        &mut self,
        sampler: &mut S,
        batch_size: usize,
        partition: FlushPartition,
    ) -> Result<usize, BakeError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let buffers = SampleBuffers::from_pending(&self.pending);
        let results = evaluate_in_batches(sampler, &buffers.as_batch(), batch_size)?;
        self.flush_pixel_with(&results, partition)
    }
}

/// Run all seven passes over one triangle.
///
/// The queue is flushed whenever it reaches `batch_size` and at the end of
/// every pass, so later passes always interpolate from final colors.
pub fn bake_triangle<S: IrradianceSampler + ?Sized>(
    ctx: &mut BakeContext,
    triangle: &TriangleSample,
    sampler: &mut S,
    batch_size: usize,
) -> Result<TriangleBakeStats, BakeError> {
    let batch_size = batch_size.max(1);
    let partition = ctx.partition();

    // Texels queued by a previous caller belong to an earlier pass.
    ctx.sample_pending(sampler, batch_size, partition)?;

    let mut stats = TriangleBakeStats::default();
    for pass in RasterPass::ALL {
        let mut pass_stats = TriangleBakeStats::default();
        let mut pixel = ctx.set_triangle(triangle, pass);

        while !ctx.is_finished(&pixel) {
            match ctx.sample_texel(&pixel) {
                TexelOutcome::Queued => pass_stats.sampled += 1,
                TexelOutcome::Interpolated => pass_stats.interpolated += 1,
                TexelOutcome::Skipped => {}
            }

            if ctx.pending_len() >= batch_size {
                ctx.sample_pending(sampler, batch_size, partition)?;
            }

            ctx.move_next_pixel(&mut pixel);
        }

        ctx.sample_pending(sampler, batch_size, partition)?;

        log::debug!(
            "{:?}: {} sampled, {} interpolated",
            pass,
            pass_stats.sampled,
            pass_stats.interpolated
        );
        stats += pass_stats;
    }

    Ok(stats)
}
