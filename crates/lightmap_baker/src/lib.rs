//! # Lightmap Baker
//!
//! The lightmap baking rasterizer of the engine's offline lighting tools.
//!
//! ## Features
//!
//! - **Conservative Rasterization**: exact texel/triangle overlap by polygon clipping
//! - **Progressive Passes**: seven sweeps that interpolate wherever neighbors agree
//! - **SH Irradiance**: order-3 spherical harmonics from an external GI sampler
//! - **Parallel Flush**: tone mapping over rayon with an explicit partition
//! - **Checkpoints**: bit-exact save/resume at pass boundaries
//! - **Export**: seam dilation and PNG output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lightmap_baker::prelude::*;
//!
//! struct FlatSky;
//!
//! impl IrradianceSampler for FlatSky {
//!     fn evaluate(&mut self, batch: &SampleBatch<'_>) -> Result<Vec<Sh9>, BakeError> {
//!         let mut sh = Sh9::zero();
//!         sh.coefficients[0] = Vec3::new(0.8, 0.8, 0.9);
//!         Ok(vec![sh; batch.len()])
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LightmapperConfig::load_from_file("lightmap.toml")?;
//!     lightmap_baker::foundation::logging::init_with_level(&config.logging);
//!
//!     let vertices: Vec<TangentVertex> = Vec::new();
//!     let indices: Vec<u32> = Vec::new();
//!     let triangles = triangles_from_indexed(&vertices, &indices, &Mat4::identity())?;
//!
//!     let mut ctx = BakeContext::new(&config.bake)?;
//!     for triangle in &triangles {
//!         bake_triangle(&mut ctx, triangle, &mut FlatSky, config.bake.batch_size)?;
//!     }
//!     export_lightmap(&mut ctx, &config.export)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]

// Core modules
pub mod core;
pub mod foundation;
pub mod config;

// Baking
pub mod bake;

/// Common imports for baker users
pub mod prelude {
    pub use crate::{
        bake::{
            bake_probes, bake_triangle, bake_vertex_range, export_lightmap, triangles_from_indexed,
            BakeContext, BakeError, CheckpointError, FlushPartition, IrradianceSampler, LightmapImage,
            LightmapVertex, RasterPass, SampleBatch, Sh9, StandardVertex, TangentVertex, TriangleSample,
        },
        core::config::{BakeConfig, Config, ExportConfig, LightmapperConfig},
        foundation::math::{Mat4, Vec2, Vec3},
    };
}
