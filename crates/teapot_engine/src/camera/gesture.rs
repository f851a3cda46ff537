//! Touch-style gestures fed to the camera controller

use crate::foundation::math::Vec2;

/// A recognised gesture
///
/// Platforms report positions in surface pixels; [`GestureEvent::normalized`]
/// maps them onto -1..1 before they reach a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Double tap: reset the camera
    DoubleTap,
    /// Single pointer pressed
    DragStart(Vec2),
    /// Single pointer moved
    DragMove(Vec2),
    /// Single pointer released
    DragEnd,
    /// Two pointers pressed
    PinchStart(Vec2, Vec2),
    /// Two pointers moved
    PinchMove(Vec2, Vec2),
}

/// Map a pixel position onto -1..1 on both axes (`2 * v / size - 1`)
pub fn normalize_screen_point(point: Vec2, width: i32, height: i32) -> Vec2 {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    Vec2::new(2.0 * point.x / w - 1.0, 2.0 * point.y / h - 1.0)
}

impl GestureEvent {
    /// The same gesture with every position normalised to a `width` x `height` surface
    pub fn normalized(self, width: i32, height: i32) -> Self {
        let n = |p: Vec2| normalize_screen_point(p, width, height);
        match self {
            Self::DoubleTap => Self::DoubleTap,
            Self::DragStart(p) => Self::DragStart(n(p)),
            Self::DragMove(p) => Self::DragMove(n(p)),
            Self::DragEnd => Self::DragEnd,
            Self::PinchStart(a, b) => Self::PinchStart(n(a), n(b)),
            Self::PinchMove(a, b) => Self::PinchMove(n(a), n(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_corners_and_centre() {
        let tl = normalize_screen_point(Vec2::new(0.0, 0.0), 800, 600);
        let c = normalize_screen_point(Vec2::new(400.0, 300.0), 800, 600);
        let br = normalize_screen_point(Vec2::new(800.0, 600.0), 800, 600);
        assert_relative_eq!(tl, Vec2::new(-1.0, -1.0));
        assert_relative_eq!(c, Vec2::new(0.0, 0.0));
        assert_relative_eq!(br, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_normalized_keeps_variant() {
        let g = GestureEvent::PinchMove(Vec2::new(0.0, 600.0), Vec2::new(800.0, 0.0)).normalized(800, 600);
        assert_eq!(g, GestureEvent::PinchMove(Vec2::new(-1.0, 1.0), Vec2::new(1.0, -1.0)));
        assert_eq!(GestureEvent::DoubleTap.normalized(1, 1), GestureEvent::DoubleTap);
    }
}
