//! Platform collaborators
//!
//! The engine never talks to a window system directly. A [`DeviceContext`]
//! owns the GPU context, the drawing surface and the swap chain; a
//! [`UiLayer`] shows the material/stage buttons and the FPS readout. Both are
//! supplied by the platform glue that constructs the engine.

pub mod headless;

pub use headless::{HeadlessContext, HeadlessSurface};

use thiserror::Error;

use crate::gpu::GpuDevice;
use crate::scene::RequestHandle;

/// Result of resuming onto a surface or presenting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    /// Surface and context are usable
    Ok,
    /// The surface went away and was recreated; GPU resources must be rebuilt
    Lost,
    /// The context itself was lost; every GPU object is gone
    ContextLost,
}

impl SurfaceStatus {
    /// Whether the status requires the Unload/Init recovery cycle
    pub fn needs_recovery(self) -> bool {
        !matches!(self, Self::Ok)
    }
}

/// Device context errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The context could not be created for the surface
    #[error("Device context initialization failed: {0}")]
    InitFailed(String),
}

/// GPU context, surface and swap chain
pub trait DeviceContext {
    /// Platform surface handed over when a window becomes available
    type Surface;

    /// Command surface used by the renderers
    type Device: GpuDevice;

    /// Create the context on the first surface
    fn init(&mut self, surface: Self::Surface) -> Result<(), DeviceError>;

    /// Reattach to a new surface after a suspend
    fn resume(&mut self, surface: Self::Surface) -> SurfaceStatus;

    /// Detach from the surface; the context may survive
    fn suspend(&mut self);

    /// Present the frame
    fn swap(&mut self) -> SurfaceStatus;

    /// Hint that GPU memory may be reclaimed; the next resume may report a lost context
    fn invalidate(&mut self);

    /// Surface width in pixels
    fn screen_width(&self) -> i32;

    /// Surface height in pixels
    fn screen_height(&self) -> i32;

    /// The command surface for the current context
    fn device(&mut self) -> &mut Self::Device;

    /// Request a swap interval (0 = present immediately)
    fn set_swap_interval(&mut self, _interval: u32) {}

    /// Stop delivering sensor and input events
    fn suspend_input(&mut self) {}

    /// Resume delivering sensor and input events
    fn resume_input(&mut self) {}
}

/// On-screen controls and readouts
///
/// Button callbacks must not touch the engine; they write into the
/// [`RequestHandle`] passed to [`UiLayer::build`].
pub trait UiLayer {
    /// Create the controls with their initial labels
    fn build(&mut self, material_label: &str, stage_label: &str, requests: RequestHandle);

    /// Show the latest averaged frame rate
    fn update_fps(&mut self, fps: f32);

    /// The material changed
    fn set_material_label(&mut self, label: &str);

    /// The stage changed
    fn set_stage_label(&mut self, label: &str);

    /// The surface went away
    fn suspend(&mut self) {}

    /// The surface came back
    fn resume(&mut self) {}
}

/// UI layer that only logs
#[derive(Debug, Default)]
pub struct LogUi;

impl UiLayer for LogUi {
    fn build(&mut self, material_label: &str, stage_label: &str, _requests: RequestHandle) {
        log::info!("UI ready: material '{}', stage '{}'", material_label, stage_label);
    }

    fn update_fps(&mut self, fps: f32) {
        log::info!("{:.2} FPS", fps);
    }

    fn set_material_label(&mut self, label: &str) {
        log::info!("Material: {}", label);
    }

    fn set_stage_label(&mut self, label: &str) {
        log::info!("Stage: {}", label);
    }
}
