//! Conservative triangle rasterizer and progressive pass walker
//!
//! [`BakeContext`] owns every buffer of one bake session. The caller sets a
//! triangle and a pass, walks the pass's texel grid with
//! [`BakeContext::move_next_pixel`], and calls
//! [`BakeContext::sampling_triangle_position`] for each texel. Texels that
//! cannot be interpolated from already-baked neighbors are queued as
//! [`PendingTexel`]s for the external irradiance sampler.
//!
//! The walk is strictly sequential: whether a texel may be interpolated
//! depends on the texels baked before it.

use crate::bake::clipper::{clip_polygon, polygon_area, polygon_centroid, to_barycentric, ClipScratch};
use crate::bake::error::BakeError;
use crate::bake::flush::FlushPartition;
use crate::bake::pass::{InterpolateAxes, RasterPass};
use crate::bake::sh9::Sh9;
use crate::bake::triangle::TriangleSample;
use crate::core::config::BakeConfig;
use crate::foundation::math::{wrap_unit, IVec2, Vec2, Vec3};

/// A texel waiting for an irradiance sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTexel {
    /// Lightmap texel coordinate
    pub pixel: IVec2,
    /// World position at the texel's coverage centroid
    pub position: Vec3,
    /// Unit surface normal
    pub normal: Vec3,
    /// Unit tangent
    pub tangent: Vec3,
    /// Unit binormal (normal x tangent)
    pub binormal: Vec3,
    /// Irradiance accumulated for this texel
    pub sh: Sh9,
}

impl PendingTexel {
    /// Linear index of the texel in a buffer of the given width
    #[inline]
    pub fn index(&self, width: usize) -> usize {
        self.pixel.y as usize * width + self.pixel.x as usize
    }
}

/// What happened to a texel visited by the walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelOutcome {
    /// Already baked, outside the walk, or not covered by the triangle
    Skipped,
    /// Filled from the average of its baked neighbors
    Interpolated,
    /// Queued for an irradiance sample
    Queued,
}

/// State of one lightmap bake: buffers, current triangle, pass and queue
#[derive(Debug, Clone)]
pub struct BakeContext {
    pub(super) width: i32,
    pub(super) height: i32,
    pub(super) interpolation_threshold: f32,
    pub(super) batch_size: usize,
    pub(super) partition: FlushPartition,

    pub(super) pass: RasterPass,
    pub(super) bbox_min: IVec2,
    pub(super) bbox_max: IVec2,
    pub(super) triangle: TriangleSample,
    pub(super) uv_pixels: [Vec2; 3],
    pub(super) debug_color: [u8; 3],

    pub(super) pending: Vec<PendingTexel>,
    pub(super) baked: Vec<bool>,
    pub(super) lightmap: Vec<[u8; 3]>,
    pub(super) debug: Vec<[u8; 3]>,

    scratch: ClipScratch,
}

impl BakeContext {
    /// Allocate a context for the lightmap described by `config`
    pub fn new(config: &BakeConfig) -> Result<Self, BakeError> {
        config.validate()?;
        let width = i32::try_from(config.width).map_err(|_| BakeError::InvalidDimensions {
            width: config.width,
            height: config.height,
        })?;
        let height = i32::try_from(config.height).map_err(|_| BakeError::InvalidDimensions {
            width: config.width,
            height: config.height,
        })?;

        log::info!(
            "Creating bake context {}x{} (threshold {}, batch {})",
            width,
            height,
            config.interpolation_threshold,
            config.batch_size
        );

        Ok(Self::with_buffers(width, height, config))
    }

    pub(super) fn with_buffers(width: i32, height: i32, config: &BakeConfig) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            interpolation_threshold: config.interpolation_threshold,
            batch_size: config.batch_size,
            partition: config.flush.partition(),
            pass: RasterPass::Space4A,
            bbox_min: IVec2::zeros(),
            bbox_max: IVec2::new(-1, -1),
            triangle: TriangleSample::default(),
            uv_pixels: [Vec2::zeros(); 3],
            debug_color: [0; 3],
            pending: Vec::new(),
            baked: vec![false; size],
            lightmap: vec![[0; 3]; size],
            debug: vec![[0; 3]; size],
            scratch: ClipScratch::new(),
        }
    }

    /// Clear every buffer and the pending queue for a fresh bake
    pub fn reset_bake(&mut self) {
        self.baked.fill(false);
        self.lightmap.fill([0; 3]);
        self.debug.fill([0; 3]);
        self.pending.clear();
        self.pass = RasterPass::Space4A;
        self.bbox_min = IVec2::zeros();
        self.bbox_max = IVec2::new(-1, -1);
        self.triangle = TriangleSample::default();
        self.uv_pixels = [Vec2::zeros(); 3];
        self.debug_color = [0; 3];
        log::info!("Bake reset ({}x{})", self.width, self.height);
    }

    /// Set the triangle and pass to walk; returns the first texel of the pass
    pub fn set_triangle(&mut self, triangle: &TriangleSample, pass: RasterPass) -> IVec2 {
        self.triangle = *triangle;
        self.pass = pass;
        self.update_uv_pixels();

        self.debug_color = debug_color(&self.triangle);

        self.bbox_min + pass.offset()
    }

    /// Recompute pixel-space UVs and the bbox from the stored triangle
    pub(super) fn update_uv_pixels(&mut self) {
        let size = Vec2::new(self.width as f32, self.height as f32);
        self.uv_pixels = self.triangle.uvs.map(|uv| {
            Vec2::new(wrap_unit(uv.x) * size.x, wrap_unit(uv.y) * size.y)
        });

        let mut min = self.uv_pixels[0];
        let mut max = self.uv_pixels[0];
        for p in &self.uv_pixels[1..] {
            min = min.inf(p);
            max = max.sup(p);
        }

        // Expand by one texel so partially covered border texels are visited.
        self.bbox_min = IVec2::new(
            (min.x.floor() as i32 - 1).max(0),
            (min.y.floor() as i32 - 1).max(0),
        );
        self.bbox_max = IVec2::new(
            (max.x.floor() as i32 + 1).min(self.width - 1),
            (max.y.floor() as i32 + 1).min(self.height - 1),
        );
    }

    /// Advance the cursor to the next texel of the current pass
    pub fn move_next_pixel(&self, pixel: &mut IVec2) -> bool {
        let stride = self.pass.stride();
        pixel.x += stride;

        if pixel.x > self.bbox_max.x {
            pixel.x = self.bbox_min.x + self.pass.offset().x;
            pixel.y += stride;
        }

        !self.is_finished(pixel)
    }

    /// Whether the cursor has left the triangle's bbox
    pub fn is_finished(&self, pixel: &IVec2) -> bool {
        self.pass == RasterPass::Done || pixel.y > self.bbox_max.y
    }

    /// Decide a texel: skip, interpolate, or queue a sample.
    ///
    /// Returns `true` when the texel was baked by this call.
    pub fn sampling_triangle_position(&mut self, pixel: &IVec2) -> bool {
        self.sample_texel(pixel) != TexelOutcome::Skipped
    }

    /// Same as [`Self::sampling_triangle_position`] but reports how the
    /// texel was resolved
    pub fn sample_texel(&mut self, pixel: &IVec2) -> TexelOutcome {
        if self.is_finished(pixel) {
            return TexelOutcome::Skipped;
        }

        let Some(index) = self.texel_index(pixel.x, pixel.y) else {
            return TexelOutcome::Skipped;
        };

        if self.baked[index] {
            return TexelOutcome::Skipped;
        }

        let Some(weights) = self.coverage_weights(pixel) else {
            return TexelOutcome::Skipped;
        };

        self.baked[index] = true;

        if self.pass.can_interpolate() {
            if let Some(color) = self.try_interpolate(pixel) {
                self.lightmap[index] = color;
                self.debug[index] = self.debug_color.map(|c| c / 2);
                return TexelOutcome::Interpolated;
            }
        }

        let surface = self.triangle.interpolate(&weights);
        self.pending.push(PendingTexel {
            pixel: *pixel,
            position: surface.position,
            normal: surface.normal,
            tangent: surface.tangent,
            binormal: surface.binormal,
            sh: Sh9::zero(),
        });
        self.debug[index] = self.debug_color;

        TexelOutcome::Queued
    }

    /// Barycentric weights of the texel's coverage centroid, or `None` when
    /// the triangle does not cover the texel
    fn coverage_weights(&mut self, pixel: &IVec2) -> Option<[f32; 3]> {
        let fx = pixel.x as f32;
        let fy = pixel.y as f32;
        let square = [
            Vec2::new(fx, fy),
            Vec2::new(fx + 1.0, fy),
            Vec2::new(fx + 1.0, fy + 1.0),
            Vec2::new(fx, fy + 1.0),
        ];

        let overlap = clip_polygon(&square, &self.uv_pixels, &mut self.scratch);
        if overlap.is_empty() || polygon_area(overlap) <= 0.0 {
            return None;
        }

        let centroid = polygon_centroid(overlap)?;
        let weights = to_barycentric(&self.uv_pixels[0], &self.uv_pixels[1], &self.uv_pixels[2], &centroid);
        if weights.iter().all(|w| w.is_finite()) {
            Some(weights)
        } else {
            None
        }
    }

    /// Average of the pass's required neighbors, if all are baked and none
    /// deviates from the average by more than the threshold
    fn try_interpolate(&self, pixel: &IVec2) -> Option<[u8; 3]> {
        let axes = self.pass.interpolate_axes();
        let d = self.pass.neighbor_distance();

        let mut neighbors = [[0u8; 3]; 4];
        let mut count = 0;
        for (axis, dx, dy) in [(InterpolateAxes::X, d, 0), (InterpolateAxes::Y, 0, d)] {
            if !axes.contains(axis) {
                continue;
            }
            for sign in [-1, 1] {
                let index = self.texel_index(pixel.x + sign * dx, pixel.y + sign * dy)?;
                if !self.baked[index] {
                    return None;
                }
                neighbors[count] = self.lightmap[index];
                count += 1;
            }
        }

        let neighbors = &neighbors[..count];
        if neighbors.is_empty() {
            return None;
        }

        let mut average = [0.0f32; 3];
        for n in neighbors {
            for c in 0..3 {
                average[c] += f32::from(n[c]);
            }
        }
        let inv = 1.0 / neighbors.len() as f32;
        for a in &mut average {
            *a *= inv;
        }

        let within_threshold = neighbors.iter().all(|n| {
            (0..3).all(|c| (f32::from(n[c]) - average[c]).abs() <= self.interpolation_threshold)
        });

        within_threshold.then(|| average.map(|a| a.round().clamp(0.0, 255.0) as u8))
    }

    /// Linear index for a texel, `None` outside the lightmap
    #[inline]
    pub(super) fn texel_index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    /// Lightmap width in texels
    pub fn width(&self) -> u32 {
        self.width as u32
    }

    /// Lightmap height in texels
    pub fn height(&self) -> u32 {
        self.height as u32
    }

    /// Current pass
    pub fn pass(&self) -> RasterPass {
        self.pass
    }

    /// Inclusive texel bbox of the current triangle
    pub fn bbox(&self) -> (IVec2, IVec2) {
        (self.bbox_min, self.bbox_max)
    }

    /// Current triangle
    pub fn triangle(&self) -> &TriangleSample {
        &self.triangle
    }

    /// Interpolation threshold in byte units
    pub fn interpolation_threshold(&self) -> f32 {
        self.interpolation_threshold
    }

    /// Pending texels per sampler batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Flush partition used by [`Self::flush_pixel`]
    pub fn partition(&self) -> FlushPartition {
        self.partition
    }

    /// Texels waiting for samples, in queue order
    pub fn pending(&self) -> &[PendingTexel] {
        &self.pending
    }

    /// Number of texels waiting for samples
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Baked flags, row-major
    pub fn baked(&self) -> &[bool] {
        &self.baked
    }

    /// Whether the texel has been baked; `false` outside the lightmap
    pub fn is_baked(&self, x: i32, y: i32) -> bool {
        self.texel_index(x, y).is_some_and(|i| self.baked[i])
    }

    /// Number of baked texels
    pub fn baked_count(&self) -> usize {
        self.baked.iter().filter(|b| **b).count()
    }

    /// Final RGB per texel, row-major
    pub fn lightmap(&self) -> &[[u8; 3]] {
        &self.lightmap
    }

    /// Final RGB as a flat byte slice
    pub fn lightmap_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.lightmap)
    }

    /// Color of one texel; `None` outside the lightmap
    pub fn texel(&self, x: i32, y: i32) -> Option<[u8; 3]> {
        self.texel_index(x, y).map(|i| self.lightmap[i])
    }

    /// Diagnostic colors per texel, row-major
    pub fn debug(&self) -> &[[u8; 3]] {
        &self.debug
    }

    /// Diagnostic colors as a flat byte slice
    pub fn debug_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.debug)
    }

    /// Write a texel color directly, e.g. when seeding from a previous bake.
    /// Marks the texel baked.
    pub fn set_texel(&mut self, x: i32, y: i32, color: [u8; 3]) -> Result<(), BakeError> {
        let index = self.texel_index(x, y).ok_or_else(|| {
            BakeError::InvalidInput(format!(
                "Texel ({x}, {y}) outside {}x{} lightmap",
                self.width, self.height
            ))
        })?;
        self.baked[index] = true;
        self.lightmap[index] = color;
        Ok(())
    }
}

/// Per-triangle diagnostic color in the 96..=223 range, hashed from the
/// triangle's positions and UVs so it is stable across resumed bakes
pub(super) fn debug_color(triangle: &TriangleSample) -> [u8; 3] {
    let bits = triangle
        .positions
        .iter()
        .flat_map(|p| p.iter())
        .chain(triangle.uvs.iter().flat_map(|uv| uv.iter()))
        .map(|v| v.to_bits());

    let mut h = 0x811C_9DC5u32;
    for b in bits {
        h = (h ^ b).wrapping_mul(0x0100_0193);
    }
    h ^= h >> 15;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    [
        96 + (h & 0x7F) as u8,
        96 + ((h >> 8) & 0x7F) as u8,
        96 + ((h >> 16) & 0x7F) as u8,
    ]
}
