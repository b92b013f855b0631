//! Lightmap baking core
//!
//! Projects static triangles into a lightmap atlas, decides per texel
//! whether to request a GI sample or interpolate from baked neighbors, and
//! turns the returned SH irradiance into final colors.
//!
//! A typical bake:
//!
//! ```no_run
//! use lightmap_baker::bake::{bake_triangle, BakeContext, IrradianceSampler, LightmapImage};
//! # use lightmap_baker::bake::{BakeError, SampleBatch, Sh9, TriangleSample};
//! # struct Sky;
//! # impl IrradianceSampler for Sky {
//! #     fn evaluate(&mut self, batch: &SampleBatch<'_>) -> Result<Vec<Sh9>, BakeError> {
//! #         Ok(vec![Sh9::zero(); batch.len()])
//! #     }
//! # }
//! # fn run(triangles: &[TriangleSample]) -> Result<(), BakeError> {
//! use lightmap_baker::core::config::BakeConfig;
//!
//! let config = BakeConfig::new(256, 256);
//! let mut ctx = BakeContext::new(&config)?;
//! let mut sampler = Sky;
//! for triangle in triangles {
//!     bake_triangle(&mut ctx, triangle, &mut sampler, config.batch_size)?;
//! }
//! ctx.image_dilate();
//! LightmapImage::from_lightmap(&ctx).save_png("lightmap.png")?;
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod clipper;
pub mod dilate;
pub mod error;
pub mod export;
pub mod flush;
pub mod pass;
pub mod rasterizer;
pub mod sampler;
pub mod sh9;
pub mod triangle;
pub mod vertex;

#[cfg(test)]
mod tests;

pub use clipper::{clip_polygon, ClipScratch, MAX_CLIP_VERTICES};
pub use error::{BakeError, CheckpointError};
pub use export::{export_lightmap, LightmapImage};
pub use flush::{tone_map, FlushPartition};
pub use pass::{InterpolateAxes, RasterPass};
pub use rasterizer::{BakeContext, PendingTexel, TexelOutcome};
pub use sampler::{
    bake_probes, bake_triangle, evaluate_in_batches, IrradianceSampler, SampleBatch, SampleBuffers,
    TriangleBakeStats,
};
pub use sh9::Sh9;
pub use triangle::{triangles_from_indexed, LightmapVertex, StandardVertex, TangentVertex, TriangleSample};
pub use vertex::{bake_vertex_range, VERTEX_SURFACE_BIAS};
