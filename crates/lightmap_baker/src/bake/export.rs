//! Lightmap export
//!
//! Hands the finished RGB8 buffer to the `image` crate for PNG encoding, or
//! expands it to RGBA for upload as a lighting texture.

use std::path::Path;

use crate::bake::error::BakeError;
use crate::bake::rasterizer::BakeContext;
use crate::core::config::ExportConfig;

/// Tightly packed RGB8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightmapImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Row-major RGB bytes
    pub rgb: Vec<u8>,
}

impl LightmapImage {
    /// Copy of the context's final lightmap
    pub fn from_lightmap(ctx: &BakeContext) -> Self {
        Self {
            width: ctx.width(),
            height: ctx.height(),
            rgb: ctx.lightmap_bytes().to_vec(),
        }
    }

    /// Copy of the context's diagnostic buffer
    pub fn from_debug(ctx: &BakeContext) -> Self {
        Self {
            width: ctx.width(),
            height: ctx.height(),
            rgb: ctx.debug_bytes().to_vec(),
        }
    }

    /// RGBA8 bytes with opaque alpha, for GPU upload
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.rgb.len() / 3 * 4);
        for pixel in self.rgb.chunks_exact(3) {
            data.extend_from_slice(pixel);
            data.push(255);
        }
        data
    }

    /// Encode as PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), BakeError> {
        let path_ref = path.as_ref();

        let img = image::RgbImage::from_raw(self.width, self.height, self.rgb.clone()).ok_or_else(|| {
            BakeError::Export(format!(
                "Buffer of {} bytes does not match {}x{} RGB",
                self.rgb.len(),
                self.width,
                self.height
            ))
        })?;

        img.save(path_ref)
            .map_err(|e| BakeError::Export(format!("Failed to write {:?}: {}", path_ref, e)))?;

        log::info!("Wrote lightmap {}x{} to {:?}", self.width, self.height, path_ref);
        Ok(())
    }

    /// Decode a PNG written by [`Self::save_png`]
    pub fn load_png<P: AsRef<Path>>(path: P) -> Result<Self, BakeError> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref)
            .map_err(|e| BakeError::Export(format!("Failed to read {:?}: {}", path_ref, e)))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            rgb: img.into_raw(),
        })
    }
}

/// Finish a bake as `config` describes: optional dilation, then the
/// lightmap PNG and optionally the debug PNG. Returns the number of texels
/// filled by dilation.
pub fn export_lightmap(ctx: &mut BakeContext, config: &ExportConfig) -> Result<usize, BakeError> {
    let filled = if config.dilate { ctx.image_dilate() } else { 0 };

    LightmapImage::from_lightmap(ctx).save_png(&config.output_path)?;
    if config.write_debug {
        LightmapImage::from_debug(ctx).save_png(config.debug_path())?;
    }

    Ok(filled)
}
