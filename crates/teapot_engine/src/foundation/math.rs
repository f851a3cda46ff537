//! Math utilities and types
//!
//! Provides the matrix and vector aliases used by the renderers, plus the
//! handful of transform builders the teapot and skybox need. All matrices are
//! column-vector, right-handed, and produce OpenGL clip space (z in -1..1).

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 3, the tilt applied to the scene's model placement
    pub const THIRD_PI: f32 = PI / 3.0;
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a perspective projection from the near-plane extents
    ///
    /// `width` and `height` are the size of the view volume at unit distance
    /// scaled by two, so `(1.0, 1.0)` maps the wider axis onto -1..1.
    fn frustum_perspective(width: f32, height: f32, near: f32, far: f32) -> Mat4;

    /// Create a look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn frustum_perspective(width: f32, height: f32, near: f32, far: f32) -> Mat4 {
        let n2 = 2.0 * near;
        let rcp_near_minus_far = 1.0 / (near - far);

        let mut result = Mat4::zeros();
        result[(0, 0)] = n2 / width;
        result[(1, 1)] = n2 / height;
        result[(2, 2)] = (far + near) * rcp_near_minus_far;
        result[(2, 3)] = far * rcp_near_minus_far * n2;
        result[(3, 2)] = -1.0;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }
}

/// Flatten a matrix into the column-major array GL uniform uploads expect
pub fn to_column_major(matrix: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(matrix.as_slice());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frustum_perspective_unit_extents() {
        let p = Mat4::frustum_perspective(1.0, 1.0, 5.0, 10000.0);
        assert_relative_eq!(p[(0, 0)], 10.0);
        assert_relative_eq!(p[(1, 1)], 10.0);
        assert_relative_eq!(p[(3, 2)], -1.0);
        assert_relative_eq!(p[(3, 3)], 0.0);
    }

    #[test]
    fn test_frustum_maps_near_and_far_planes() {
        let p = Mat4::frustum_perspective(1.0, 1.0, 5.0, 10000.0);
        let near = p * Vec4::new(0.0, 0.0, -5.0, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -10000.0, 1.0);
        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-4);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let view = Mat4::look_at(
            Vec3::new(0.0, 0.0, 700.0),
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let eye = view * Vec4::new(0.0, 0.0, 700.0, 1.0);
        assert_relative_eq!(eye, Vec4::new(0.0, 0.0, 0.0, 1.0), epsilon = 1e-4);

        let origin = view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin.z, -700.0, epsilon = 1e-3);
    }

    #[test]
    fn test_column_major_layout() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let flat = to_column_major(&m);
        assert_eq!(&flat[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(flat[15], 1.0);
    }
}
