use std::f32::consts::PI;

use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};

const MOUSE_SENSITIVITY: f32 = 0.5;

/// Vertical field of view of the clock camera.
pub(crate) const FIELD_OF_VIEW: f32 = PI / 4.0;
pub(crate) const Z_NEAR: f32 = 0.1;
pub(crate) const Z_FAR: f32 = 100.0;

/// Perspective projection with wgpu's `0..1` clip depth.
pub(crate) fn perspective(aspect: f32, fovy: f32, znear: f32, zfar: f32) -> Matrix4<f32> {
    #[rustfmt::skip]
    let opengl_to_wgpu = Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    );
    opengl_to_wgpu * Matrix4::new_perspective(aspect, fovy, znear, zfar)
}

/// Camera pulled back along `+z`, looking at the origin.
pub(crate) fn view_matrix(distance: f32) -> Matrix4<f32> {
    Matrix4::new_translation(&Vector3::new(0.0, 0.0, -distance))
}

fn drag_angle(delta: f32) -> f32 {
    delta * MOUSE_SENSITIVITY * 0.01
}

/// Turns the object by a pointer drag of `delta_x`, `delta_y` pixels.
///
/// Horizontal drag spins about the screen's vertical axis and vertical drag
/// tips about its horizontal axis. The rotation is applied in screen space,
/// so it composes on the left of the current orientation.
pub(crate) fn drag_rotation(orientation: &Matrix4<f32>, delta_x: f32, delta_y: f32) -> Matrix4<f32> {
    let yaw = Rotation3::from_axis_angle(&Vector3::y_axis(), drag_angle(delta_x));
    let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), drag_angle(delta_y));
    orthonormalize(&((pitch * yaw).to_homogeneous() * orientation))
}

/// Rolls the object about the view axis by a horizontal drag.
pub(crate) fn roll_rotation(orientation: &Matrix4<f32>, delta_x: f32) -> Matrix4<f32> {
    let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), -drag_angle(delta_x));
    orthonormalize(&(roll.to_homogeneous() * orientation))
}

/// Snaps a drifted rotation matrix back onto the nearest rotation.
fn orthonormalize(matrix: &Matrix4<f32>) -> Matrix4<f32> {
    let linear: Matrix3<f32> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    Rotation3::from_matrix(&linear).to_homogeneous()
}

/// Inverse-transpose of the model's linear part, padded for a `mat4x4` uniform.
pub(crate) fn normal_matrix(model: &Matrix4<f32>) -> Matrix4<f32> {
    let linear: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Matrix3::identity)
        .to_homogeneous()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::assert_close;

    fn is_rotation(matrix: &Matrix4<f32>) -> bool {
        let linear: Matrix3<f32> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        (linear.transpose() * linear - Matrix3::identity()).norm() < 1e-4
            && (linear.determinant() - 1.0).abs() < 1e-4
    }

    #[test]
    fn horizontal_drag_spins_about_the_vertical_axis() {
        let turned = drag_rotation(&Matrix4::identity(), 100.0, 0.0);
        let twelve = turned.transform_vector(&Vector3::y());
        assert_close(twelve.y, 1.0, 1e-5);
        let three = turned.transform_vector(&Vector3::x());
        assert!(three.z < 0.0, "dragging right turns the right side away");
    }

    #[test]
    fn vertical_drag_tips_about_the_horizontal_axis() {
        let turned = drag_rotation(&Matrix4::identity(), 0.0, 100.0);
        assert_close(turned.transform_vector(&Vector3::x()).x, 1.0, 1e-5);
        assert!(turned.transform_vector(&Vector3::y()).z > 0.0);
    }

    #[test]
    fn long_drags_stay_rotations() {
        let mut orientation = Matrix4::identity();
        for step in 0..2000 {
            orientation = drag_rotation(&orientation, 3.7, (step % 7) as f32 - 2.5);
            orientation = roll_rotation(&orientation, 1.3);
        }
        assert!(is_rotation(&orientation));
    }

    #[test]
    fn view_pulls_the_camera_back() {
        let view = view_matrix(4.0);
        let origin = view.transform_point(&nalgebra::Point3::origin());
        assert_close(origin.z, -4.0, 1e-6);
    }

    #[test]
    fn normal_matrix_of_a_rotation_is_the_rotation() {
        let orientation = drag_rotation(&Matrix4::identity(), 40.0, -25.0);
        let normals = normal_matrix(&orientation);
        assert!((normals - orientation).norm() < 1e-5);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));
        let normal = normal_matrix(&model).transform_vector(&Vector3::new(1.0, 1.0, 0.0));
        assert_close(normal.x, 0.5, 1e-6);
        assert_close(normal.y, 1.0, 1e-6);
    }

    #[test]
    fn perspective_uses_zero_to_one_depth() {
        let projection = perspective(1.0, FIELD_OF_VIEW, Z_NEAR, Z_FAR);
        let near = projection * nalgebra::Vector4::new(0.0, 0.0, -Z_NEAR, 1.0);
        let far = projection * nalgebra::Vector4::new(0.0, 0.0, -Z_FAR, 1.0);
        assert_close(near.z / near.w, 0.0, 1e-4);
        assert_close(far.z / far.w, 1.0, 1e-4);
    }
}
