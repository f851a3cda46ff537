//! Device context without a window
//!
//! Pairs a [`RecordingDevice`] with a scripted surface: tests queue the
//! statuses that `swap` and `resume` should report next, and `invalidate`
//! makes the following resume report a lost context.

use std::collections::VecDeque;

use super::{DeviceContext, DeviceError, SurfaceStatus};
use crate::gpu::RecordingDevice;

/// Size of the off-screen surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessSurface {
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl HeadlessSurface {
    /// A surface of the given size
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Scriptable off-screen context
#[derive(Debug)]
pub struct HeadlessContext {
    device: RecordingDevice,
    surface: Option<HeadlessSurface>,
    initialized: bool,
    invalidated: bool,
    input_active: bool,
    swap_interval: u32,
    swap_script: VecDeque<SurfaceStatus>,
    resume_script: VecDeque<SurfaceStatus>,
    frames_presented: u64,
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessContext {
    /// Create a context with no surface yet
    pub fn new() -> Self {
        Self {
            device: RecordingDevice::new(0, 0),
            surface: None,
            initialized: false,
            invalidated: false,
            input_active: false,
            swap_interval: 1,
            swap_script: VecDeque::new(),
            resume_script: VecDeque::new(),
            frames_presented: 0,
        }
    }

    /// Status the next `swap` calls report, in order
    pub fn queue_swap_status(&mut self, status: SurfaceStatus) {
        self.swap_script.push_back(status);
    }

    /// Status the next `resume` calls report, in order
    pub fn queue_resume_status(&mut self, status: SurfaceStatus) {
        self.resume_script.push_back(status);
    }

    /// Frames presented successfully
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Whether sensor/input delivery is on
    pub fn input_active(&self) -> bool {
        self.input_active
    }

    /// Whether `init` succeeded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a surface is attached
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Last requested swap interval
    pub fn swap_interval(&self) -> u32 {
        self.swap_interval
    }

    /// Read-only access to the recording device
    pub fn recorder(&self) -> &RecordingDevice {
        &self.device
    }
}

impl DeviceContext for HeadlessContext {
    type Surface = HeadlessSurface;
    type Device = RecordingDevice;

    fn init(&mut self, surface: HeadlessSurface) -> Result<(), DeviceError> {
        if surface.width <= 0 || surface.height <= 0 {
            return Err(DeviceError::InitFailed(format!(
                "surface must have a positive size, got {}x{}",
                surface.width, surface.height
            )));
        }
        self.surface = Some(surface);
        self.initialized = true;
        Ok(())
    }

    fn resume(&mut self, surface: HeadlessSurface) -> SurfaceStatus {
        self.surface = Some(surface);
        let scripted = self.resume_script.pop_front();
        if std::mem::take(&mut self.invalidated) {
            return SurfaceStatus::ContextLost;
        }
        scripted.unwrap_or(SurfaceStatus::Ok)
    }

    fn suspend(&mut self) {
        self.surface = None;
    }

    fn swap(&mut self) -> SurfaceStatus {
        let status = self.swap_script.pop_front().unwrap_or(SurfaceStatus::Ok);
        if status == SurfaceStatus::Ok {
            self.frames_presented += 1;
        }
        status
    }

    fn invalidate(&mut self) {
        self.invalidated = true;
    }

    fn screen_width(&self) -> i32 {
        self.surface.map_or(0, |s| s.width)
    }

    fn screen_height(&self) -> i32 {
        self.surface.map_or(0, |s| s.height)
    }

    fn device(&mut self) -> &mut RecordingDevice {
        &mut self.device
    }

    fn set_swap_interval(&mut self, interval: u32) {
        self.swap_interval = interval;
    }

    fn suspend_input(&mut self) {
        self.input_active = false;
    }

    fn resume_input(&mut self) {
        self.input_active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_surface() {
        let mut context = HeadlessContext::new();
        assert!(context.init(HeadlessSurface::new(0, 600)).is_err());
        assert!(context.init(HeadlessSurface::new(800, 600)).is_ok());
        assert_eq!((context.screen_width(), context.screen_height()), (800, 600));
    }

    #[test]
    fn test_scripted_swaps_then_ok() {
        let mut context = HeadlessContext::new();
        context.queue_swap_status(SurfaceStatus::Lost);
        assert_eq!(context.swap(), SurfaceStatus::Lost);
        assert_eq!(context.swap(), SurfaceStatus::Ok);
        assert_eq!(context.frames_presented(), 1);
    }

    #[test]
    fn test_invalidate_loses_context_on_resume() {
        let mut context = HeadlessContext::new();
        context.init(HeadlessSurface::new(10, 10)).expect("init");
        context.suspend();
        context.invalidate();
        assert_eq!(context.resume(HeadlessSurface::new(10, 10)), SurfaceStatus::ContextLost);
        assert_eq!(context.resume(HeadlessSurface::new(10, 10)), SurfaceStatus::Ok);
    }
}
