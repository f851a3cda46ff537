//! # Unified Configuration System
//!
//! This module consolidates the settings for every subsystem into a single
//! serializable tree. Each section has sensible defaults so a partial file (or
//! no file at all) still yields a runnable configuration.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging, swap interval, clear colour, FPS reporting
//! - **Render Config**: shader paths, cube-map mip chain, lighting, roughness
//! - **Asset Config**: asset root and cube-map colour space
//! - **Camera Config**: gesture axis flip and pinch scaling

use serde::{Serialize, Deserialize};
use crate::config::{Config, ConfigError};

/// # Shader Configuration
///
/// Vertex and fragment source paths for one shader program. Paths are
/// resolved against the asset root; when a file is missing the built-in
/// source for that program is used instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader source
    pub vertex_shader_path: String,
    /// Path to the fragment shader source
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Default sources for the teapot program
    pub fn teapot() -> Self {
        Self::new("shaders/teapot.vert", "shaders/teapot.frag")
    }

    /// Default sources for the skybox program
    pub fn skybox() -> Self {
        Self::new("shaders/skybox.vert", "shaders/skybox.frag")
    }

    /// Validate that both paths are set
    pub fn validate(&self) -> Result<(), String> {
        if self.vertex_shader_path.trim().is_empty() {
            return Err("Vertex shader path cannot be empty".to_string());
        }
        if self.fragment_shader_path.trim().is_empty() {
            return Err("Fragment shader path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// # Renderer Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Teapot shader program sources
    pub teapot_shaders: ShaderConfig,
    /// Skybox shader program sources
    pub skybox_shaders: ShaderConfig,
    /// Mip levels loaded into the teapot's environment cube map (128x128 down to 1x1)
    pub teapot_mip_levels: u32,
    /// World-space position of the dynamic light
    pub light_position: [f32; 3],
    /// Roughness applied before the user touches the slider, 0..=1
    pub initial_roughness: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            teapot_shaders: ShaderConfig::teapot(),
            skybox_shaders: ShaderConfig::skybox(),
            teapot_mip_levels: 8,
            light_position: [200.0, -200.0, -200.0],
            initial_roughness: 0.0,
        }
    }
}

impl RendererConfig {
    /// Validate the renderer configuration
    pub fn validate(&self) -> Result<(), String> {
        self.teapot_shaders.validate()?;
        self.skybox_shaders.validate()?;

        if self.teapot_mip_levels == 0 {
            return Err("Teapot mip levels must be at least 1".to_string());
        }
        if self.light_position.iter().any(|c| !c.is_finite()) {
            return Err(format!("Light position must be finite: {:?}", self.light_position));
        }
        if !(0.0..=1.0).contains(&self.initial_roughness) {
            return Err(format!("Initial roughness must be within 0..=1, got {}", self.initial_roughness));
        }
        Ok(())
    }
}

/// # Engine Configuration
///
/// Core behavior shared by the whole frame loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Swap interval requested from the device context (0 = uncapped benchmark mode)
    pub swap_interval: u32,
    /// Colour the frame buffer is cleared to each frame
    pub clear_color: [f32; 4],
    /// Seconds between FPS reports to the UI layer
    pub fps_report_interval: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            swap_interval: 0,
            clear_color: [0.5, 0.5, 0.5, 1.0],
            fps_report_interval: 1.0,
        }
    }
}

impl EngineConfig {
    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// # Asset Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory that cube-map face names and shader paths resolve against
    pub assets_dir: String,
    /// Upload cube-map faces as sRGB
    pub srgb_cubemaps: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
            srgb_cubemaps: false,
        }
    }
}

impl AssetConfig {
    /// Set assets directory
    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into();
        self
    }
}

/// # Camera Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Per-axis sign applied to gesture input
    pub flip: [f32; 3],
    /// Per-axis scale applied to pinch translation
    pub pinch_transform_factor: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            flip: [1.0, -1.0, -1.0],
            pinch_transform_factor: [2.0, 2.0, 8.0],
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Rendering system configuration
    pub renderer: RendererConfig,
    /// Asset system configuration
    pub assets: AssetConfig,
    /// Camera controller configuration
    pub camera: CameraConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.renderer.validate().map_err(ConfigError::Invalid)?;

        let interval = self.engine.fps_report_interval;
        if !(interval.is_finite() && interval > 0.0) {
            return Err(ConfigError::Invalid(format!("FPS report interval must be positive, got {interval}")));
        }
        if self.assets.assets_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("Assets directory cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}
