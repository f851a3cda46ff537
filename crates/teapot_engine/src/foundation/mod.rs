//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the projection/view helpers the renderers rely on
//! - Frame timing and FPS reporting
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
