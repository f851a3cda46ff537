//! GLFW window with an OpenGL 3.3 core context
//!
//! [`GlfwContext`] is the engine's device context on the desktop. The GL
//! context lives as long as the window, so suspend/resume (iconify) keeps
//! every GPU object; only an explicit memory trim makes the next resume
//! report a lost context.

use teapot_engine::gpu::GlowDevice;
use teapot_engine::platform::{DeviceContext, DeviceError, SurfaceStatus};
use thiserror::Error;

use glfw::Context as _;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("GLFW initialization failed")]
    InitializationFailed,

    #[error("Window creation failed")]
    CreationFailed,

    #[error("OpenGL device creation failed: {0}")]
    Device(String),
}

/// Framebuffer size handed to the engine when the window is (re)shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferSize {
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

/// Event stream of the window
pub type Events = glfw::GlfwReceiver<(f64, glfw::WindowEvent)>;

/// Device context over a GLFW window
pub struct GlfwContext {
    // Dropped before the window so GL objects go while the context is alive
    device: GlowDevice,
    window: glfw::PWindow,
    size: FramebufferSize,
    lost: bool,
}

impl GlfwContext {
    /// Create the window, make its context current and load GL
    pub fn create(title: &str, width: u32, height: u32) -> Result<(glfw::Glfw, Self, Events), WindowError> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::DepthBits(Some(24)));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.make_current();
        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_iconify_polling(true);
        window.set_focus_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_scroll_polling(true);

        let gl = unsafe { glow::Context::from_loader_function(|name| window.get_proc_address(name) as *const _) };
        let device = unsafe { GlowDevice::new(gl) }.map_err(|e| WindowError::Device(e.to_string()))?;

        let (fb_width, fb_height) = window.get_framebuffer_size();
        let context = Self {
            device,
            window,
            size: FramebufferSize { width: fb_width, height: fb_height },
            lost: false,
        };
        Ok((glfw, context, events))
    }

    /// The window
    pub fn window(&self) -> &glfw::PWindow {
        &self.window
    }

    /// The window, mutably
    pub fn window_mut(&mut self) -> &mut glfw::PWindow {
        &mut self.window
    }

    /// Current framebuffer size
    pub fn framebuffer_size(&self) -> FramebufferSize {
        let (width, height) = self.window.get_framebuffer_size();
        FramebufferSize { width, height }
    }
}

impl DeviceContext for GlfwContext {
    type Surface = FramebufferSize;
    type Device = GlowDevice;

    fn init(&mut self, surface: FramebufferSize) -> Result<(), DeviceError> {
        if surface.width <= 0 || surface.height <= 0 {
            return Err(DeviceError::InitFailed(format!(
                "framebuffer is {}x{}",
                surface.width, surface.height
            )));
        }
        self.size = surface;
        Ok(())
    }

    fn resume(&mut self, surface: FramebufferSize) -> SurfaceStatus {
        self.size = surface;
        self.window.make_current();
        if std::mem::take(&mut self.lost) {
            SurfaceStatus::ContextLost
        } else {
            SurfaceStatus::Ok
        }
    }

    fn suspend(&mut self) {
        log::debug!("Window hidden, keeping GL context");
    }

    fn swap(&mut self) -> SurfaceStatus {
        self.window.swap_buffers();
        SurfaceStatus::Ok
    }

    fn invalidate(&mut self) {
        self.lost = true;
    }

    fn screen_width(&self) -> i32 {
        self.size.width
    }

    fn screen_height(&self) -> i32 {
        self.size.height
    }

    fn device(&mut self) -> &mut GlowDevice {
        &mut self.device
    }

    fn set_swap_interval(&mut self, interval: u32) {
        let mode = if interval == 0 {
            glfw::SwapInterval::None
        } else {
            glfw::SwapInterval::Sync(interval)
        };
        self.window.glfw.set_swap_interval(mode);
    }
}
