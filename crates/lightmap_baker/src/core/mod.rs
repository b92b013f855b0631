//! # Core Module
//!
//! Shared configuration for the baker and re-exports of the foundation
//! layer that every subsystem depends on.

pub mod config;

pub use crate::foundation;

pub use config::{
    BakeConfig,
    ExportConfig,
    FlushConfig,
    LightmapperConfig,
    LoggingConfig,
    Config,
    ConfigError,
};
