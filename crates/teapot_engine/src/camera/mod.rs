//! Camera controllers
//!
//! A camera controller accumulates gesture input into two matrices that the
//! renderables fold into their view transform:
//!
//! ```text
//! view = transform * base_view * rotation * model
//! ```
//!
//! The engine owns the controller and advances it once per frame; renderables
//! hold only a weak association and read it during their own update.

pub mod gesture;
pub mod orbit;

pub use gesture::{GestureEvent, normalize_screen_point};
pub use orbit::OrbitCamera;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::foundation::math::Mat4;

/// Source of the camera transform and rotation
pub trait CameraController {
    /// Advance any time-based motion to `time` (seconds)
    fn update(&mut self, time: f64);

    /// Translation applied after the base view
    fn transform_matrix(&self) -> Mat4;

    /// Rotation applied between the base view and the model placement
    fn rotation_matrix(&self) -> Mat4;

    /// Feed a normalised gesture; controllers that ignore input keep the default
    fn handle_gesture(&mut self, _gesture: GestureEvent) {}
}

/// Camera shared between the engine and the renderables bound to it
pub type SharedCamera = Rc<RefCell<dyn CameraController>>;

/// Non-owning association held by a renderable
pub type CameraLink = Weak<RefCell<dyn CameraController>>;

/// Wrap a controller for sharing
pub fn share<C: CameraController + 'static>(camera: C) -> SharedCamera {
    Rc::new(RefCell::new(camera))
}

/// Camera that never moves
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCamera;

impl CameraController for FixedCamera {
    fn update(&mut self, _time: f64) {}

    fn transform_matrix(&self) -> Mat4 {
        Mat4::identity()
    }

    fn rotation_matrix(&self) -> Mat4 {
        Mat4::identity()
    }
}
