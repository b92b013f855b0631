//! Checkpoint persistence for resumable bakes
//!
//! The layout is a flat little-endian stream with no header:
//!
//! ```text
//! i32 width, height, pass, bbox_min.x, bbox_min.y, bbox_max.x, bbox_max.y
//! 3 x { f32x3 position, f32x2 uv, f32x3 normal, f32x3 tangent }
//! u32 pending_count
//! pending_count x { i32 x, i32 y, f32x3 position, normal, tangent, binormal, 9 x f32x3 sh }
//! u8  baked[width * height]       (0 or 1)
//! u8  debug[width * height * 3]
//! u8  lightmap[width * height * 3]
//! ```
//!
//! A checkpoint is only meaningful at a pass or triangle boundary, after the
//! pending queue has been flushed; a non-empty queue is still stored so the
//! state round-trips exactly.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::bake::error::CheckpointError;
use crate::bake::pass::RasterPass;
use crate::bake::rasterizer::{BakeContext, PendingTexel};
use crate::bake::sh9::{Sh9, SH9_COEFFICIENTS};
use crate::bake::triangle::TriangleSample;
use crate::core::config::BakeConfig;
use crate::foundation::math::{IVec2, Vec2, Vec3};

impl BakeContext {
    /// Write the complete bake state to `writer`
    pub fn save<W: Write>(&self, writer: W) -> Result<(), CheckpointError> {
        let mut out = CheckpointWriter { inner: writer };

        out.i32(self.width)?;
        out.i32(self.height)?;
        out.i32(self.pass.id())?;
        out.ivec2(&self.bbox_min)?;
        out.ivec2(&self.bbox_max)?;

        let tri = &self.triangle;
        for i in 0..3 {
            out.vec3(&tri.positions[i])?;
            out.vec2(&tri.uvs[i])?;
            out.vec3(&tri.normals[i])?;
            out.vec3(&tri.tangents[i])?;
        }

        let count = u32::try_from(self.pending.len()).map_err(|_| CheckpointError::CountOverflow)?;
        out.u32(count)?;
        for texel in &self.pending {
            out.ivec2(&texel.pixel)?;
            out.vec3(&texel.position)?;
            out.vec3(&texel.normal)?;
            out.vec3(&texel.tangent)?;
            out.vec3(&texel.binormal)?;
            for c in &texel.sh.coefficients {
                out.vec3(c)?;
            }
        }

        let baked: Vec<u8> = self.baked.iter().map(|b| u8::from(*b)).collect();
        out.bytes(&baked)?;
        out.bytes(bytemuck::cast_slice(&self.debug))?;
        out.bytes(bytemuck::cast_slice(&self.lightmap))?;
        out.inner.flush()?;

        log::debug!(
            "Saved checkpoint {}x{} at {:?} ({} pending)",
            self.width,
            self.height,
            self.pass,
            self.pending.len()
        );
        Ok(())
    }

    /// Restore a bake state with default tunables
    pub fn load<R: Read>(reader: R) -> Result<Self, CheckpointError> {
        Self::load_with_config(reader, &BakeConfig::default())
    }

    /// Restore a bake state, taking threshold, batch size and flush
    /// partition from `config`. The stored dimensions always win.
    pub fn load_with_config<R: Read>(reader: R, config: &BakeConfig) -> Result<Self, CheckpointError> {
        let mut input = CheckpointReader { inner: reader };

        let width = input.i32()?;
        let height = input.i32()?;
        if width <= 0 || height <= 0 {
            return Err(CheckpointError::InvalidDimensions { width, height });
        }
        let texels = (width as usize)
            .checked_mul(height as usize)
            .ok_or(CheckpointError::InvalidDimensions { width, height })?;
        let color_bytes = texels
            .checked_mul(3)
            .ok_or(CheckpointError::InvalidDimensions { width, height })?;

        let pass_id = input.i32()?;
        let pass = RasterPass::from_id(pass_id).ok_or(CheckpointError::InvalidPass(pass_id))?;
        let bbox_min = input.ivec2()?;
        let bbox_max = input.ivec2()?;

        let mut triangle = TriangleSample::default();
        for i in 0..3 {
            triangle.positions[i] = input.vec3()?;
            triangle.uvs[i] = input.vec2()?;
            triangle.normals[i] = input.vec3()?;
            triangle.tangents[i] = input.vec3()?;
        }

        let count = input.u32()? as usize;
        // Grow as records arrive; a corrupt count must not trigger a huge allocation.
        let mut pending = Vec::with_capacity(count.min(texels));
        for _ in 0..count {
            let pixel = input.ivec2()?;
            if pixel.x < 0 || pixel.y < 0 || pixel.x >= width || pixel.y >= height {
                return Err(CheckpointError::PendingOutOfBounds { x: pixel.x, y: pixel.y });
            }
            let position = input.vec3()?;
            let normal = input.vec3()?;
            let tangent = input.vec3()?;
            let binormal = input.vec3()?;
            let mut sh = Sh9::zero();
            for c in 0..SH9_COEFFICIENTS {
                sh.coefficients[c] = input.vec3()?;
            }
            pending.push(PendingTexel { pixel, position, normal, tangent, binormal, sh });
        }

        let baked = input
            .bytes(texels)?
            .into_iter()
            .map(|b| match b {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(CheckpointError::InvalidBool(other)),
            })
            .collect::<Result<Vec<bool>, _>>()?;
        let debug = bytemuck::cast_slice::<u8, [u8; 3]>(&input.bytes(color_bytes)?).to_vec();
        let lightmap = bytemuck::cast_slice::<u8, [u8; 3]>(&input.bytes(color_bytes)?).to_vec();

        let mut ctx = Self::with_buffers(width, height, config);
        ctx.pass = pass;
        ctx.triangle = triangle;
        ctx.update_uv_pixels();
        ctx.bbox_min = bbox_min;
        ctx.bbox_max = bbox_max;
        ctx.debug_color = crate::bake::rasterizer::debug_color(&triangle);
        ctx.pending = pending;
        ctx.baked = baked;
        ctx.debug = debug;
        ctx.lightmap = lightmap;

        log::info!(
            "Loaded checkpoint {}x{} at {:?} ({} baked, {} pending)",
            width,
            height,
            pass,
            ctx.baked_count(),
            ctx.pending.len()
        );
        Ok(ctx)
    }

    /// Save to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path.as_ref())?;
        self.save(BufWriter::new(file))
    }

    /// Load from a file with the given tunables
    pub fn load_from_file<P: AsRef<Path>>(path: P, config: &BakeConfig) -> Result<Self, CheckpointError> {
        let file = File::open(path.as_ref())?;
        Self::load_with_config(BufReader::new(file), config)
    }
}

struct CheckpointWriter<W> {
    inner: W,
}

impl<W: Write> CheckpointWriter<W> {
    fn i32(&mut self, v: i32) -> std::io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    fn u32(&mut self, v: u32) -> std::io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    fn f32(&mut self, v: f32) -> std::io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    fn ivec2(&mut self, v: &IVec2) -> std::io::Result<()> {
        self.i32(v.x)?;
        self.i32(v.y)
    }

    fn vec2(&mut self, v: &Vec2) -> std::io::Result<()> {
        self.f32(v.x)?;
        self.f32(v.y)
    }

    fn vec3(&mut self, v: &Vec3) -> std::io::Result<()> {
        self.f32(v.x)?;
        self.f32(v.y)?;
        self.f32(v.z)
    }

    fn bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(bytes)
    }
}

struct CheckpointReader<R> {
    inner: R,
}

impl<R: Read> CheckpointReader<R> {
    fn word(&mut self) -> std::io::Result<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn i32(&mut self) -> std::io::Result<i32> {
        self.word().map(i32::from_le_bytes)
    }

    fn u32(&mut self) -> std::io::Result<u32> {
        self.word().map(u32::from_le_bytes)
    }

    fn f32(&mut self) -> std::io::Result<f32> {
        self.word().map(f32::from_le_bytes)
    }

    fn ivec2(&mut self) -> std::io::Result<IVec2> {
        Ok(IVec2::new(self.i32()?, self.i32()?))
    }

    fn vec2(&mut self) -> std::io::Result<Vec2> {
        Ok(Vec2::new(self.f32()?, self.f32()?))
    }

    fn vec3(&mut self) -> std::io::Result<Vec3> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    /// Read exactly `len` bytes. The buffer grows with the data actually
    /// read, so a corrupt length fails as a short read.
    fn bytes(&mut self, len: usize) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, stream ended after {}", len, buf.len()),
            ));
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial_bake() -> BakeContext {
        let mut ctx = BakeContext::new(&BakeConfig::new(16, 8)).unwrap();
        let tri = TriangleSample::new(
            [Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0)],
            [Vec2::new(0.05, 0.1), Vec2::new(0.9, 0.1), Vec2::new(0.05, 0.95)],
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
        // Neighboring samples differ strongly so the next pass cannot interpolate.
        let results: Vec<Sh9> = (0..ctx.pending_len())
            .map(|i| {
                let mut sh = Sh9::zero();
                sh.coefficients[0] = Vec3::repeat(0.5 * (i % 4) as f32);
                sh
            })
            .collect();
        ctx.flush_pixel(&results).unwrap();

        // Leave a few texels queued so the pending records are exercised.
        let mut pixel = ctx.set_triangle(&tri, RasterPass::Space2BX);
        for _ in 0..3 {
            ctx.sampling_triangle_position(&pixel);
            ctx.move_next_pixel(&mut pixel);
        }
        for texel in &mut ctx.pending {
            texel.sh.coefficients[4] = Vec3::new(1.5, -2.0, 0.25);
        }
        ctx
    }

    fn assert_same_state(a: &BakeContext, b: &BakeContext) {
        assert_eq!(a.width(), b.width());
        assert_eq!(a.height(), b.height());
        assert_eq!(a.pass(), b.pass());
        assert_eq!(a.bbox(), b.bbox());
        assert_eq!(a.triangle(), b.triangle());
        assert_eq!(a.pending(), b.pending());
        assert_eq!(a.baked(), b.baked());
        assert_eq!(a.lightmap(), b.lightmap());
        assert_eq!(a.debug(), b.debug());
    }

    #[test]
    fn test_round_trip_partial_bake() {
        let ctx = partial_bake();
        assert!(ctx.pending_len() > 0);

        let mut bytes = Vec::new();
        ctx.save(&mut bytes).unwrap();
        let loaded = BakeContext::load(bytes.as_slice()).unwrap();
        assert_same_state(&ctx, &loaded);

        let mut again = Vec::new();
        loaded.save(&mut again).unwrap();
        assert_eq!(bytes, again);
    }

    #[test]
    fn test_layout_size() {
        let ctx = partial_bake();
        let mut bytes = Vec::new();
        ctx.save(&mut bytes).unwrap();

        let header = 7 * 4 + 3 * 11 * 4 + 4;
        let record = 2 * 4 + 4 * 12 + 9 * 12;
        let buffers = 16 * 8 * 7;
        assert_eq!(bytes.len(), header + ctx.pending_len() * record + buffers);
    }

    #[test]
    fn test_load_applies_config() {
        let ctx = partial_bake();
        let mut bytes = Vec::new();
        ctx.save(&mut bytes).unwrap();

        let config = BakeConfig::new(1, 1).with_interpolation_threshold(7.5).with_batch_size(3);
        let loaded = BakeContext::load_with_config(bytes.as_slice(), &config).unwrap();
        assert_eq!(loaded.width(), 16);
        assert_eq!(loaded.interpolation_threshold(), 7.5);
        assert_eq!(loaded.batch_size(), 3);
    }

    #[test]
    fn test_truncated_stream() {
        let ctx = partial_bake();
        let mut bytes = Vec::new();
        ctx.save(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(BakeContext::load(bytes.as_slice()), Err(CheckpointError::Io(_))));
    }

    #[test]
    fn test_invalid_dimensions() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&4i32.to_le_bytes());
        assert!(matches!(
            BakeContext::load(bytes.as_slice()),
            Err(CheckpointError::InvalidDimensions { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_oversized_dimensions_fail_without_allocating() {
        let mut bytes = Vec::new();
        for v in [i32::MAX, i32::MAX, 0, 0, 0, 0, 0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&[0u8; 3 * 11 * 4]);
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let err = BakeContext::load(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, CheckpointError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_invalid_pass() {
        let mut bytes = Vec::new();
        for v in [2i32, 2, 9] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert!(matches!(BakeContext::load(bytes.as_slice()), Err(CheckpointError::InvalidPass(9))));
    }

    #[test]
    fn test_invalid_baked_flag() {
        let ctx = BakeContext::new(&BakeConfig::new(2, 2)).unwrap();
        let mut bytes = Vec::new();
        ctx.save(&mut bytes).unwrap();
        let baked_start = 7 * 4 + 3 * 11 * 4 + 4;
        bytes[baked_start + 1] = 2;
        assert!(matches!(BakeContext::load(bytes.as_slice()), Err(CheckpointError::InvalidBool(2))));
    }

    #[test]
    fn test_pending_texel_outside_lightmap() {
        let ctx = partial_bake();
        let mut bytes = Vec::new();
        ctx.save(&mut bytes).unwrap();
        let first_record = 7 * 4 + 3 * 11 * 4 + 4;
        bytes[first_record..first_record + 4].copy_from_slice(&16i32.to_le_bytes());
        assert!(matches!(
            BakeContext::load(bytes.as_slice()),
            Err(CheckpointError::PendingOutOfBounds { x: 16, .. })
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let ctx = partial_bake();
        let path = std::env::temp_dir().join(format!("lightmap_checkpoint_{}.bin", std::process::id()));
        ctx.save_to_file(&path).unwrap();
        let loaded = BakeContext::load_from_file(&path, &BakeConfig::default()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_same_state(&ctx, &loaded);
    }
}
