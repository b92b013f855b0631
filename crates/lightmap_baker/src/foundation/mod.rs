//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the baker:
//! - Math types and 2D helpers for lightmap space
//! - Logging utilities

pub mod math;
pub mod logging;
