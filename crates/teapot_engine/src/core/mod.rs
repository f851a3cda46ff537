//! # Core Engine Module
//!
//! Shared configuration types used by every subsystem and by the platform
//! glue that constructs the engine.

pub mod config;

pub use config::{
    ApplicationConfig,
    AssetConfig,
    CameraConfig,
    EngineConfig,
    RendererConfig,
    ShaderConfig,
};
