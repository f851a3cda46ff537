//! # Orbit Camera
//!
//! Arcball-style controller driven by gestures. A drag rotates the scene
//! around the origin by mapping the pointer onto a virtual unit sphere; a
//! pinch translates it, with the change in pointer spacing moving along the
//! view axis. After a drag ends the last rotation step keeps spinning and
//! decays a little on every update.
//!
//! ## Coordinate Notes
//!
//! Gesture positions arrive normalised to -1..1 with +Y pointing down the
//! screen. The configured flip corrects axis signs: the default `(1, -1, -1)`
//! makes upward drags tilt the scene up and spreading two fingers bring it
//! toward the viewer.

use nalgebra::UnitQuaternion;

use super::{CameraController, GestureEvent};
use crate::core::CameraConfig;
use crate::foundation::math::{Mat4, Vec2, Vec3};

/// World units per normalised unit of pinch movement
const PINCH_WORLD_SCALE: f32 = 100.0;

/// Fraction of the spin kept on every update after a drag ends
const MOMENTUM_DECAY: f32 = 0.9;

/// Spin below this angle (radians) stops
const MOMENTUM_EPSILON: f32 = 1.0e-4;

#[derive(Debug, Clone, Copy)]
struct DragState {
    start: Vec3,
    rotation_at_start: UnitQuaternion<f32>,
    last_step: UnitQuaternion<f32>,
    last_rotation: UnitQuaternion<f32>,
}

#[derive(Debug, Clone, Copy)]
struct PinchState {
    center: Vec2,
    distance: f32,
    translation_at_start: Vec3,
}

/// Gesture-driven orbit camera
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    flip: Vec3,
    pinch_factor: Vec3,
    rotation: UnitQuaternion<f32>,
    translation: Vec3,
    momentum: Option<UnitQuaternion<f32>>,
    drag: Option<DragState>,
    pinch: Option<PinchState>,
    last_update: Option<f64>,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl OrbitCamera {
    /// Create a camera with the given axis flip and pinch scaling
    pub fn new(flip: Vec3, pinch_factor: Vec3) -> Self {
        Self {
            flip,
            pinch_factor,
            rotation: UnitQuaternion::identity(),
            translation: Vec3::zeros(),
            momentum: None,
            drag: None,
            pinch: None,
            last_update: None,
        }
    }

    /// Create a camera from the camera section of the application config
    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(Vec3::from(config.flip), Vec3::from(config.pinch_transform_factor))
    }

    /// Drop all accumulated rotation, translation and spin
    pub fn reset(&mut self) {
        log::debug!("Camera reset");
        self.rotation = UnitQuaternion::identity();
        self.translation = Vec3::zeros();
        self.momentum = None;
        self.drag = None;
        self.pinch = None;
    }

    /// Current orientation
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.rotation
    }

    /// Current translation in view space
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn arcball_vector(&self, point: Vec2) -> Vec3 {
        let x = point.x * self.flip.x;
        let y = point.y * self.flip.y;
        let d2 = x * x + y * y;
        if d2 <= 1.0 {
            Vec3::new(x, y, (1.0 - d2).sqrt())
        } else {
            Vec3::new(x, y, 0.0).normalize()
        }
    }

    fn begin_drag(&mut self, point: Vec2) {
        self.momentum = None;
        self.drag = Some(DragState {
            start: self.arcball_vector(point),
            rotation_at_start: self.rotation,
            last_step: UnitQuaternion::identity(),
            last_rotation: self.rotation,
        });
    }

    fn drag_to(&mut self, point: Vec2) {
        let current = self.arcball_vector(point);
        let Some(drag) = self.drag.as_mut() else {
            return;
        };

        let delta = UnitQuaternion::rotation_between(&drag.start, &current).unwrap_or_else(UnitQuaternion::identity);
        let rotation = delta * drag.rotation_at_start;
        drag.last_step = rotation * drag.last_rotation.inverse();
        drag.last_rotation = rotation;
        self.rotation = rotation;
    }

    fn end_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            if drag.last_step.angle() > MOMENTUM_EPSILON {
                self.momentum = Some(drag.last_step);
            }
        }
    }

    fn begin_pinch(&mut self, a: Vec2, b: Vec2) {
        self.drag = None;
        self.momentum = None;
        self.pinch = Some(PinchState {
            center: (a + b) * 0.5,
            distance: (a - b).norm(),
            translation_at_start: self.translation,
        });
    }

    fn pinch_to(&mut self, a: Vec2, b: Vec2) {
        let Some(pinch) = self.pinch else {
            return;
        };

        let center = (a + b) * 0.5;
        let spread = pinch.distance - (a - b).norm();
        let offset = Vec3::new(
            (center.x - pinch.center.x) * self.pinch_factor.x * self.flip.x,
            (center.y - pinch.center.y) * self.pinch_factor.y * self.flip.y,
            spread * self.pinch_factor.z * self.flip.z,
        );
        self.translation = pinch.translation_at_start + offset * PINCH_WORLD_SCALE;
    }
}

impl CameraController for OrbitCamera {
    fn update(&mut self, time: f64) {
        let previous = self.last_update.replace(time);
        if self.drag.is_some() || previous.is_some_and(|t| t >= time) {
            return;
        }

        if let Some(step) = self.momentum {
            self.rotation = step * self.rotation;
            let decayed = step.scaled_axis() * MOMENTUM_DECAY;
            self.momentum = (decayed.norm() > MOMENTUM_EPSILON).then(|| UnitQuaternion::from_scaled_axis(decayed));
        }
    }

    fn transform_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
    }

    fn rotation_matrix(&self) -> Mat4 {
        self.rotation.to_homogeneous()
    }

    fn handle_gesture(&mut self, gesture: GestureEvent) {
        match gesture {
            GestureEvent::DoubleTap => self.reset(),
            GestureEvent::DragStart(p) => self.begin_drag(p),
            GestureEvent::DragMove(p) => self.drag_to(p),
            GestureEvent::DragEnd => self.end_drag(),
            GestureEvent::PinchStart(a, b) => self.begin_pinch(a, b),
            GestureEvent::PinchMove(a, b) => self.pinch_to(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_at_rest() {
        let camera = OrbitCamera::default();
        assert_relative_eq!(camera.transform_matrix(), Mat4::identity());
        assert_relative_eq!(camera.rotation_matrix(), Mat4::identity());
    }

    #[test]
    fn test_horizontal_drag_rotates_about_y() {
        let mut camera = OrbitCamera::default();
        camera.handle_gesture(GestureEvent::DragStart(Vec2::new(0.0, 0.0)));
        camera.handle_gesture(GestureEvent::DragMove(Vec2::new(0.5, 0.0)));

        let axis = camera.rotation().axis().expect("non-zero rotation");
        assert_relative_eq!(axis.into_inner(), Vec3::y(), epsilon = 1e-5);
        assert!(camera.is_dragging());
    }

    #[test]
    fn test_spread_pinch_moves_toward_viewer() {
        let mut camera = OrbitCamera::default();
        camera.handle_gesture(GestureEvent::PinchStart(Vec2::new(-0.1, 0.0), Vec2::new(0.1, 0.0)));
        camera.handle_gesture(GestureEvent::PinchMove(Vec2::new(-0.3, 0.0), Vec2::new(0.3, 0.0)));
        assert!(camera.translation().z > 0.0);
        assert_relative_eq!(camera.translation().x, 0.0);
    }

    #[test]
    fn test_double_tap_resets() {
        let mut camera = OrbitCamera::default();
        camera.handle_gesture(GestureEvent::DragStart(Vec2::new(0.0, 0.0)));
        camera.handle_gesture(GestureEvent::DragMove(Vec2::new(0.2, 0.3)));
        camera.handle_gesture(GestureEvent::DoubleTap);
        assert_relative_eq!(camera.rotation_matrix(), Mat4::identity());
        assert!(!camera.is_dragging());
    }

    #[test]
    fn test_momentum_decays_to_rest() {
        let mut camera = OrbitCamera::default();
        camera.handle_gesture(GestureEvent::DragStart(Vec2::new(0.0, 0.0)));
        camera.handle_gesture(GestureEvent::DragMove(Vec2::new(0.1, 0.0)));
        camera.handle_gesture(GestureEvent::DragEnd);

        let after_drag = camera.rotation().angle();
        for frame in 0..200 {
            camera.update(f64::from(frame) / 60.0);
        }
        let settled = camera.rotation();
        camera.update(10.0);
        assert!(camera.rotation().angle() > after_drag);
        assert_relative_eq!(camera.rotation(), settled, epsilon = 1e-4);
    }

    #[test]
    fn test_update_is_deterministic_without_input() {
        let mut a = OrbitCamera::default();
        let mut b = OrbitCamera::default();
        a.update(1.0);
        b.update(1.0);
        assert_eq!(a.rotation_matrix(), b.rotation_matrix());
        assert_eq!(a.transform_matrix(), b.transform_matrix());
    }
}
