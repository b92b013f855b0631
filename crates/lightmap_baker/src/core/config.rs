//! # Bake Configuration
//!
//! All tunables for a lightmap bake session in one place. Everything here is
//! serializable so a bake can be described by a TOML or RON file next to the
//! scene it belongs to.
//!
//! ## Configuration Categories
//!
//! - **Bake Config**: lightmap size, interpolation threshold, sample batching
//! - **Flush Config**: partitioning of the data-parallel flush
//! - **Export Config**: where and what to write once the bake finishes
//! - **Logging Config**: default log filter

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};
use crate::bake::flush::FlushPartition;

/// Default interpolation threshold in byte units (0..255 per channel)
pub const DEFAULT_INTERPOLATION_THRESHOLD: f32 = 2.0;

/// Default number of texels handed to the irradiance sampler per batch
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// # Flush Configuration
///
/// Controls how a returned sample batch is split across worker threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushConfig {
    /// Pending texels handled by one parallel task
    pub chunk_size: usize,
}

impl FlushConfig {
    /// Create a flush configuration with the given chunk size
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Partition used by the flush
    pub fn partition(&self) -> FlushPartition {
        FlushPartition::new(self.chunk_size)
    }
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self::new(64)
    }
}

/// # Bake Configuration
///
/// Size of the lightmap atlas and the knobs of the progressive rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeConfig {
    /// Lightmap width in texels
    pub width: u32,
    /// Lightmap height in texels
    pub height: u32,
    /// Maximum per-channel deviation (byte units) a neighbor may have from
    /// the neighbor average before interpolation is rejected
    pub interpolation_threshold: f32,
    /// Pending texels collected before the sampler is invoked
    /// (normally the sampler's worker count)
    pub batch_size: usize,
    /// Flush partitioning
    #[serde(default)]
    pub flush: FlushConfig,
}

impl BakeConfig {
    /// Create a bake configuration for a `width x height` lightmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            interpolation_threshold: DEFAULT_INTERPOLATION_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            flush: FlushConfig::default(),
        }
    }

    /// Set the interpolation threshold
    pub fn with_interpolation_threshold(mut self, threshold: f32) -> Self {
        self.interpolation_threshold = threshold;
        self
    }

    /// Set the sampler batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the flush chunk size
    pub fn with_flush_chunk_size(mut self, chunk_size: usize) -> Self {
        self.flush = FlushConfig::new(chunk_size);
        self
    }

    /// Number of texels in the lightmap
    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Lightmap size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        if i32::try_from(self.width).is_err() || i32::try_from(self.height).is_err() {
            return Err(ConfigError::Invalid("Lightmap size exceeds i32 range".to_string()));
        }

        if !self.interpolation_threshold.is_finite() || self.interpolation_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Interpolation threshold must be a non-negative number, got {}",
                self.interpolation_threshold
            )));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("Batch size must be at least 1".to_string()));
        }

        if self.flush.chunk_size == 0 {
            return Err(ConfigError::Invalid("Flush chunk size must be at least 1".to_string()));
        }

        Ok(())
    }
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self::new(512, 512)
    }
}

/// # Export Configuration
///
/// What happens to the finished lightmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// PNG path for the final lightmap
    pub output_path: String,
    /// Also write the diagnostic buffer next to the lightmap
    pub write_debug: bool,
    /// Run one seam dilation pass before export
    pub dilate: bool,
}

impl ExportConfig {
    /// Create an export configuration writing to `output_path`
    pub fn new(output_path: impl Into<String>) -> Self {
        Self {
            output_path: output_path.into(),
            write_debug: false,
            dilate: true,
        }
    }

    /// Enable or disable the debug image
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.write_debug = enabled;
        self
    }

    /// Enable or disable dilation before export
    pub fn with_dilate(mut self, enabled: bool) -> Self {
        self.dilate = enabled;
        self
    }

    /// Path of the debug image derived from the output path
    pub fn debug_path(&self) -> String {
        match self.output_path.strip_suffix(".png") {
            Some(stem) => format!("{stem}_debug.png"),
            None => format!("{}_debug.png", self.output_path),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::new("lightmap.png")
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `env_logger` filter string, e.g. `info` or `lightmap_baker=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// # Complete Lightmapper Configuration
///
/// Top-level configuration that applications load from disk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LightmapperConfig {
    /// Rasterizer and batching configuration
    pub bake: BakeConfig,
    /// Output configuration
    #[serde(default)]
    pub export: ExportConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LightmapperConfig {
    /// Create a configuration for a `width x height` lightmap with defaults
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            bake: BakeConfig::new(width, height),
            ..Default::default()
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bake.validate()?;
        if self.export.output_path.is_empty() {
            return Err(ConfigError::Invalid("Export path cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Config for LightmapperConfig {}
