//! # Scene Coordinator
//!
//! [`Engine`] owns the teapot and skybox, the shared camera, the stage table
//! and the platform collaborators, and turns platform lifecycle events into
//! renderer lifecycle calls.
//!
//! ## Display States
//!
//! ```text
//! Uninitialized ──surface──► DisplayActive ◄──surface── Suspended
//!                                 │                        ▲
//!                                 └────surface destroyed───┘
//!                 terminate (from any state) ──► Terminated
//! ```
//!
//! ## Frame Pipeline
//!
//! Frames are drawn only while the engine is ready (display active and input
//! focus held). Each frame:
//!
//! 1. Report FPS to the UI when the monitor's interval elapses
//! 2. Drain the request block: reload, stage, material, roughness
//! 3. Advance the camera, then update every renderable
//! 4. Clear, render the teapot, render the skybox
//! 5. Swap; a lost surface triggers the full Unload/Init recovery
//!
//! Requests from UI callbacks are only ever applied in step 2, never mid-frame.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::assets::CubemapLoader;
use crate::camera::{GestureEvent, OrbitCamera, SharedCamera, share};
use crate::config::ConfigError;
use crate::core::ApplicationConfig;
use crate::foundation::time::{PerfMonitor, Timer};
use crate::gpu::{ClearFlags, GpuDevice, RenderState, Viewport};
use crate::platform::{DeviceContext, DeviceError, UiLayer};
use crate::render::{EnvironmentReport, RenderError, Renderable, Skybox, Teapot};

use super::{FrameRequests, RequestHandle, Stage, StageLibrary};

/// Surface lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// No surface has been seen yet
    Uninitialized,
    /// Context and resources are live
    DisplayActive,
    /// The surface is gone; resources are kept
    Suspended,
    /// Resources released; the engine accepts no more events
    Terminated,
}

/// What happened to a frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Drawn and presented
    Presented,
    /// Drawn, but the swap reported a lost surface and resources were rebuilt
    Recovered,
    /// Not drawn (not ready)
    Skipped,
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A renderer failed to initialise or load
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// The device context failed
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// The configuration is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An event arrived in a state that cannot handle it
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

fn renderables<'a>(teapot: &'a mut Teapot, skybox: &'a mut Skybox) -> [&'a mut dyn Renderable; 2] {
    [teapot, skybox]
}

/// Scene coordinator over a platform device context
pub struct Engine<C: DeviceContext> {
    config: ApplicationConfig,
    context: C,
    loader: Box<dyn CubemapLoader>,
    ui: Option<Box<dyn UiLayer>>,
    camera: SharedCamera,
    teapot: Teapot,
    skybox: Skybox,
    stages: StageLibrary,
    requests: RequestHandle,
    state: DisplayState,
    has_focus: bool,
    timer: Timer,
    perf: PerfMonitor,
    last_environment: EnvironmentReport,
    recoveries: u32,
}

impl<C: DeviceContext> Engine<C> {
    /// Create an engine; no GPU work happens until the first surface arrives
    pub fn new(config: ApplicationConfig, context: C, loader: Box<dyn CubemapLoader>) -> Result<Self, EngineError> {
        config.validate()?;

        let assets_dir = PathBuf::from(&config.assets.assets_dir);
        let teapot = Teapot::new(&config.renderer, assets_dir.clone());
        let skybox = Skybox::new(&config.renderer, assets_dir);
        let stages = StageLibrary::default();
        let requests = Arc::new(FrameRequests::new(teapot.materials().len(), stages.len()));
        let camera = share(OrbitCamera::from_config(&config.camera));
        let perf = PerfMonitor::new(config.engine.fps_report_interval);

        log::info!("Engine created with {} stages", stages.len());
        Ok(Self {
            config,
            context,
            loader,
            ui: None,
            camera,
            teapot,
            skybox,
            stages,
            requests,
            state: DisplayState::Uninitialized,
            has_focus: false,
            timer: Timer::new(),
            perf,
            last_environment: EnvironmentReport::default(),
            recoveries: 0,
        })
    }

    /// Attach a UI layer
    pub fn with_ui(mut self, ui: Box<dyn UiLayer>) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Replace the camera controller
    pub fn with_camera(mut self, camera: SharedCamera) -> Self {
        self.camera = camera;
        self
    }

    /// Replace the stage table; must be called before the first surface
    pub fn with_stages(mut self, stages: StageLibrary) -> Self {
        self.requests = Arc::new(FrameRequests::new(self.teapot.materials().len(), stages.len()));
        self.stages = stages;
        self
    }

    /// Handle for UI callbacks on any thread
    pub fn requests(&self) -> RequestHandle {
        Arc::clone(&self.requests)
    }

    /// Current display state
    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Display active and input focus held
    pub fn is_ready(&self) -> bool {
        self.has_focus && self.state == DisplayState::DisplayActive
    }

    /// The teapot renderer
    pub fn teapot(&self) -> &Teapot {
        &self.teapot
    }

    /// The skybox renderer
    pub fn skybox(&self) -> &Skybox {
        &self.skybox
    }

    /// The current stage
    pub fn current_stage(&self) -> &Stage {
        self.stages.current()
    }

    /// The shared camera
    pub fn camera(&self) -> &SharedCamera {
        &self.camera
    }

    /// The device context
    pub fn context(&self) -> &C {
        &self.context
    }

    /// The device context, mutably
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Aggregate report of the most recent environment load
    pub fn last_environment(&self) -> EnvironmentReport {
        self.last_environment
    }

    /// Unload/Init recovery cycles performed so far
    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    /// The configuration the engine was built with
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// A surface became available (window created or shown again)
    ///
    /// The first surface creates the context and every resource; later ones
    /// resume the context and rebuild resources only if it was lost. One frame
    /// is drawn immediately.
    pub fn on_surface_available(&mut self, surface: C::Surface) -> Result<FrameOutcome, EngineError> {
        match self.state {
            DisplayState::Uninitialized => {
                log::info!("Initializing display");
                self.context.init(surface)?;
                self.context.set_swap_interval(self.config.engine.swap_interval);
                self.build_ui();
                self.state = DisplayState::DisplayActive;
                self.init_display();
                self.load_resources()?;
            }
            DisplayState::Suspended | DisplayState::DisplayActive => {
                log::info!("Resuming display");
                let status = self.context.resume(surface);
                self.state = DisplayState::DisplayActive;
                if let Some(ui) = self.ui.as_mut() {
                    ui.resume();
                }
                if status.needs_recovery() {
                    log::warn!("Context did not resume cleanly ({:?}), rebuilding resources", status);
                    self.recover()?;
                } else {
                    self.init_display();
                }
            }
            DisplayState::Terminated => {
                return Err(EngineError::InvalidState("surface available after termination".to_string()));
            }
        }

        let now = self.timer.elapsed_secs();
        self.render_frame(now)
    }

    /// The surface is going away
    pub fn on_surface_destroyed(&mut self) {
        if self.state != DisplayState::DisplayActive {
            log::debug!("Surface destroyed in state {:?}, ignoring", self.state);
            return;
        }
        log::info!("Suspending display");
        self.context.suspend();
        self.context.suspend_input();
        if let Some(ui) = self.ui.as_mut() {
            ui.suspend();
        }
        self.has_focus = false;
        self.state = DisplayState::Suspended;
    }

    /// The platform is short on memory
    pub fn on_low_memory(&mut self) {
        log::info!("Trimming memory");
        self.context.invalidate();
    }

    /// Input focus gained: resume input and start drawing
    pub fn on_focus_gained(&mut self) {
        self.context.resume_input();
        self.has_focus = true;
    }

    /// Input focus lost: stop input and draw one last frame
    pub fn on_focus_lost(&mut self) -> Result<FrameOutcome, EngineError> {
        self.context.suspend_input();
        self.has_focus = false;
        let now = self.timer.elapsed_secs();
        self.render_frame(now)
    }

    /// Forward a gesture, in surface pixels, to the camera
    pub fn handle_gesture(&mut self, gesture: GestureEvent) {
        let normalized = gesture.normalized(self.context.screen_width(), self.context.screen_height());
        match self.camera.try_borrow_mut() {
            Ok(mut camera) => camera.handle_gesture(normalized),
            Err(_) => log::warn!("Camera busy, dropping {:?}", gesture),
        }
    }

    /// Draw a frame at the engine clock's current time
    pub fn draw_frame(&mut self) -> Result<FrameOutcome, EngineError> {
        let now = self.timer.elapsed_secs();
        self.draw_frame_at(now)
    }

    /// Draw a frame at `time` seconds, if ready
    pub fn draw_frame_at(&mut self, time: f64) -> Result<FrameOutcome, EngineError> {
        if !self.is_ready() {
            return Ok(FrameOutcome::Skipped);
        }
        self.render_frame(time)
    }

    /// Tear down and rebuild every renderer resource now
    pub fn reload_resources(&mut self) -> Result<(), EngineError> {
        if self.state != DisplayState::DisplayActive {
            return Err(EngineError::InvalidState(format!("cannot reload resources in state {:?}", self.state)));
        }
        self.recover()
    }

    /// Release every resource and stop accepting events
    pub fn terminate(&mut self) {
        if self.state == DisplayState::Terminated {
            return;
        }
        log::info!("Terminating engine");
        if self.state != DisplayState::Uninitialized {
            self.unload_resources();
            self.context.suspend();
        }
        self.state = DisplayState::Terminated;
    }

    fn build_ui(&mut self) {
        let requests = self.requests();
        let material = self.teapot.material_name().to_string();
        let stage = self.stages.current().name.clone();
        if let Some(ui) = self.ui.as_mut() {
            ui.build(&material, &stage, requests);
        }
    }

    /// Render state, viewport, and projection refresh for the current surface size
    fn init_display(&mut self) {
        let width = self.context.screen_width();
        let height = self.context.screen_height();
        let gpu = self.context.device();
        gpu.apply_render_state(&RenderState::default());
        gpu.set_viewport(Viewport::from_size(width, height));
        for renderable in renderables(&mut self.teapot, &mut self.skybox) {
            renderable.update_viewport(gpu);
        }
        log::debug!("Display initialized at {}x{}", width, height);
    }

    /// Init and bind every renderable, then load the current stage
    ///
    /// Every renderable is attempted even if an earlier one fails; the first
    /// failure is returned after the stage has been applied.
    fn load_resources(&mut self) -> Result<(), EngineError> {
        let gpu = self.context.device();
        let mut first_error = None;
        for renderable in renderables(&mut self.teapot, &mut self.skybox) {
            if let Err(e) = renderable.init(gpu) {
                log::error!("Failed to initialize {}: {}", renderable.name(), e);
                first_error.get_or_insert(e);
            }
            renderable.bind(&self.camera);
        }

        self.apply_stage();
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }

    fn unload_resources(&mut self) {
        let gpu = self.context.device();
        for renderable in renderables(&mut self.teapot, &mut self.skybox) {
            renderable.unload(gpu);
        }
    }

    fn recover(&mut self) -> Result<(), EngineError> {
        self.recoveries += 1;
        log::warn!("Rebuilding GPU resources (recovery #{})", self.recoveries);
        self.unload_resources();
        let loaded = self.load_resources();
        self.init_display();
        loaded
    }

    fn apply_stage(&mut self) {
        let stage = self.stages.current().clone();
        log::info!("Loading stage '{}'", stage.name);

        let gpu = self.context.device();
        let mut report = EnvironmentReport::default();
        for renderable in renderables(&mut self.teapot, &mut self.skybox) {
            match renderable.switch_environment(gpu, self.loader.as_mut(), &stage.pattern) {
                Ok(r) => report = report.merge(r),
                Err(e) => log::error!("{} could not switch to stage '{}': {}", renderable.name(), stage.name, e),
            }
        }
        self.last_environment = report;
    }

    fn apply_requests(&mut self) -> Result<(), EngineError> {
        if self.requests.take_reload() {
            self.recover()?;
        }

        if let Some(index) = self.requests.stage.take() {
            self.stages.select(index);
            self.apply_stage();
            let label = self.stages.current().name.clone();
            if let Some(ui) = self.ui.as_mut() {
                ui.set_stage_label(&label);
            }
        }

        if let Some(index) = self.requests.material.take() {
            self.teapot.set_material(index);
            let label = self.teapot.material_name().to_string();
            if let Some(ui) = self.ui.as_mut() {
                ui.set_material_label(&label);
            }
        }

        if let Some(roughness) = self.requests.roughness.take() {
            self.teapot.set_roughness(roughness);
        }
        Ok(())
    }

    fn render_frame(&mut self, time: f64) -> Result<FrameOutcome, EngineError> {
        if self.state != DisplayState::DisplayActive {
            return Ok(FrameOutcome::Skipped);
        }

        if let Some(fps) = self.perf.update(time) {
            if let Some(ui) = self.ui.as_mut() {
                ui.update_fps(fps);
            }
        }

        self.apply_requests()?;

        let now = self.perf.current_time();
        match self.camera.try_borrow_mut() {
            Ok(mut camera) => camera.update(now),
            Err(_) => log::warn!("Camera busy, skipping camera update"),
        }

        let clear_color = self.config.engine.clear_color;
        let gpu: &mut dyn GpuDevice = self.context.device();
        for renderable in renderables(&mut self.teapot, &mut self.skybox) {
            renderable.update(now);
        }
        gpu.clear(clear_color, ClearFlags::COLOR | ClearFlags::DEPTH);
        for renderable in renderables(&mut self.teapot, &mut self.skybox) {
            renderable.render(gpu);
        }

        let status = self.context.swap();
        if status.needs_recovery() {
            log::warn!("Swap reported {:?}, rebuilding resources", status);
            self.recover()?;
            return Ok(FrameOutcome::Recovered);
        }
        Ok(FrameOutcome::Presented)
    }
}

impl<C: DeviceContext> Drop for Engine<C> {
    fn drop(&mut self) {
        self.terminate();
    }
}
