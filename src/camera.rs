use nalgebra::{Matrix4, Vector3};

use crate::math::{self, FIELD_OF_VIEW, Z_FAR, Z_NEAR};

const ZOOM_SENSITIVITY: f32 = 0.25;
const MIN_DISTANCE: f32 = 2.5;
const MAX_DISTANCE: f32 = 12.0;
pub(crate) const DEFAULT_DISTANCE: f32 = 6.0;

/// Direction the scene light travels, in world space.
const LIGHT_DIRECTION: [f32; 3] = [-0.4, -0.6, -1.0];

/// Camera on the `+z` axis looking at the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Camera {
    pub(crate) distance: f32,
}

impl Camera {
    pub(crate) fn new() -> Self {
        Self {
            distance: DEFAULT_DISTANCE,
        }
    }

    pub(crate) fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta * ZOOM_SENSITIVITY).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub(crate) fn eye(&self) -> Vector3<f32> {
        Vector3::new(0.0, 0.0, self.distance)
    }

    pub(crate) fn build_view_matrix(&self) -> Matrix4<f32> {
        math::view_matrix(self.distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Projection {
    pub(crate) aspect: f32,
    pub(crate) fovy: f32,
    pub(crate) znear: f32,
    pub(crate) zfar: f32,
}

impl Projection {
    pub(crate) fn new(aspect: f32) -> Self {
        Self {
            aspect,
            fovy: FIELD_OF_VIEW,
            znear: Z_NEAR,
            zfar: Z_FAR,
        }
    }

    /// Tracks the widget's aspect ratio; empty bounds are ignored.
    pub(crate) fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub(crate) fn build_projection_matrix(&self) -> Matrix4<f32> {
        math::perspective(self.aspect, self.fovy, self.znear, self.zfar)
    }
}

/// Per-frame uniform shared by every shape.
///
/// Lighting and reflections are evaluated in world space, after the model
/// rotation; `eye` is the camera position in that space.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct FrameUniform {
    pub(crate) model: [[f32; 4]; 4],
    pub(crate) view_proj: [[f32; 4]; 4],
    pub(crate) normal_matrix: [[f32; 4]; 4],
    pub(crate) eye: [f32; 4],
    pub(crate) light_direction: [f32; 4],
}

impl FrameUniform {
    pub(crate) fn new(orientation: &Matrix4<f32>, camera: &Camera, projection: &Projection) -> Self {
        let view_proj = projection.build_projection_matrix() * camera.build_view_matrix();
        let light = Vector3::from(LIGHT_DIRECTION).normalize();
        Self {
            model: (*orientation).into(),
            view_proj: view_proj.into(),
            normal_matrix: math::normal_matrix(orientation).into(),
            eye: camera.eye().push(1.0).into(),
            light_direction: light.push(0.0).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::assert_close;

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::new();
        camera.zoom(1000.0);
        assert_eq!(camera.distance, MIN_DISTANCE);
        camera.zoom(-1000.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn scrolling_up_moves_closer() {
        let mut camera = Camera::new();
        camera.zoom(1.0);
        assert!(camera.distance < DEFAULT_DISTANCE);
    }

    #[test]
    fn empty_bounds_keep_the_aspect() {
        let mut projection = Projection::new(1.0);
        projection.resize(0.0, 300.0);
        assert_eq!(projection.aspect, 1.0);
        projection.resize(800.0, 400.0);
        assert_eq!(projection.aspect, 2.0);
    }

    #[test]
    fn frame_uniform_is_std140_friendly() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 3 * 64 + 2 * 16);

        let uniform = FrameUniform::new(&Matrix4::identity(), &Camera::new(), &Projection::new(1.0));
        assert_eq!(uniform.eye, [0.0, 0.0, DEFAULT_DISTANCE, 1.0]);
        let light = Vector3::new(
            uniform.light_direction[0],
            uniform.light_direction[1],
            uniform.light_direction[2],
        );
        assert_close(light.norm(), 1.0, 1e-6);
        assert_eq!(uniform.light_direction[3], 0.0);
    }
}
