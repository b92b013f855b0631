//! Error types for the bake core

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by bake operations
#[derive(Error, Debug)]
pub enum BakeError {
    /// Lightmap dimensions are zero or out of range
    #[error("Invalid lightmap dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// The sampler returned a different number of results than were queued
    #[error("Sample batch size mismatch: expected {expected} results, got {actual}")]
    BatchSizeMismatch {
        /// Number of queued samples
        expected: usize,
        /// Number of results supplied
        actual: usize,
    },

    /// Failure reported by the irradiance sampler
    #[error("Irradiance sampler failed: {0}")]
    Sampler(String),

    /// Caller supplied inconsistent input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Texture export failed
    #[error("Export failed: {0}")]
    Export(String),

    /// Checkpoint could not be written or read
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while reading or writing a checkpoint
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// IO error, including a truncated stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored dimensions are not positive
    #[error("Invalid checkpoint dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Stored width
        width: i32,
        /// Stored height
        height: i32,
    },

    /// Stored pass id is not a known pass
    #[error("Invalid pass id: {0}")]
    InvalidPass(i32),

    /// A pending texel lies outside the stored lightmap
    #[error("Pending texel ({x}, {y}) is outside the lightmap")]
    PendingOutOfBounds {
        /// Texel x
        x: i32,
        /// Texel y
        y: i32,
    },

    /// A baked flag byte other than 0 or 1
    #[error("Invalid baked flag byte: {0}")]
    InvalidBool(u8),

    /// A length does not fit the on-disk integer width
    #[error("Count does not fit the checkpoint format")]
    CountOverflow,
}
