//! # Teapot Engine
//!
//! Render-resource lifecycle and frame pipeline for a cube-map-lit teapot
//! inside a skybox, with switchable materials and environments.
//!
//! ## Features
//!
//! - **Renderables**: teapot and skybox behind one `Renderable` trait, with
//!   idempotent Init/Unload and independent cube-map replacement
//! - **Scene Coordinator**: surface lifecycle state machine, fixed-order frame
//!   pipeline and full resource rebuild on surface loss
//! - **Thread-Safe Requests**: material, stage and roughness changes handed
//!   over from UI threads through atomics and applied at frame start
//! - **Backends**: headless recording device for tests and tooling, and an
//!   OpenGL device on `glow` behind the `gl` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use teapot_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let loader = FileCubemapLoader::from_config(&config.assets);
//!     let mut engine = Engine::new(config, HeadlessContext::new(), Box::new(loader))?;
//!
//!     engine.on_surface_available(HeadlessSurface::new(800, 600))?;
//!     engine.on_focus_gained();
//!     engine.requests().stage.cycle();
//!     engine.draw_frame()?;
//!     engine.terminate();
//!     Ok(())
//! }
//! ```

#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod assets;
pub mod camera;
pub mod config;
pub mod core;
pub mod foundation;
pub mod gpu;
pub mod platform;
pub mod render;
pub mod scene;

pub use scene::{DisplayState, Engine, EngineError, FrameOutcome};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Engine, EngineError, FrameOutcome, DisplayState,
        assets::{CubemapLoader, FileCubemapLoader, FaceLoadFlags},
        camera::{CameraController, GestureEvent, OrbitCamera, SharedCamera},
        config::Config,
        core::ApplicationConfig,
        foundation::math::{Mat4, Vec2, Vec3},
        gpu::{GpuDevice, RecordingDevice},
        platform::{DeviceContext, HeadlessContext, HeadlessSurface, LogUi, SurfaceStatus, UiLayer},
        render::{EnvironmentReport, Renderable, Skybox, Teapot},
        scene::{RequestHandle, Stage, StageLibrary},
    };
}
